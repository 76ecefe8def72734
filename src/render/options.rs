//! Output configuration shared by the box and classification paths.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Page selection for synthesis and classification output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Keep all pages
    #[default]
    All,
    /// Keep a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Keep specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.binary_search(&page).is_ok(),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let (start, end) = parse_range(s, start, end)?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = parse_range(s, start, end)?;
                pages.extend(start..=end);
            } else {
                pages.push(parse_page(s, part)?);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(input: &str, part: &str) -> Result<u32> {
    match part.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(Error::InvalidPageRange(input.to_string())),
        Ok(page) => Ok(page),
    }
}

fn parse_range(input: &str, start: &str, end: &str) -> Result<(u32, u32)> {
    let start = parse_page(input, start)?;
    let end = parse_page(input, end)?;
    if start > end {
        return Err(Error::InvalidPageRange(input.to_string()));
    }
    Ok((start, end))
}
