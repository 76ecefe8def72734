//! Semantic classification results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Semantic role of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Title,
    SectionHeader,
    SubsectionHeader,
    Paragraph,
    Footnote,
    Emphasis,
    Unknown,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Title => "title",
            ElementType::SectionHeader => "section_header",
            ElementType::SubsectionHeader => "subsection_header",
            ElementType::Paragraph => "paragraph",
            ElementType::Footnote => "footnote",
            ElementType::Emphasis => "emphasis",
            ElementType::Unknown => "unknown",
        }
    }

    /// Whether this role is a heading of any level.
    pub fn is_heading(self) -> bool {
        matches!(
            self,
            ElementType::Title | ElementType::SectionHeader | ElementType::SubsectionHeader
        )
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font metrics of the span a line was classified by.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FontInfo {
    pub font: String,
    pub size: f64,
    pub flags: u32,
}

/// A classified line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Concatenated, trimmed span text
    pub text: String,
    /// `[x0, y0, x1, y1]`, origin top-left
    pub bbox: [f64; 4],
    pub font_info: FontInfo,
}

/// Classified elements of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageElements {
    pub page: u32,
    pub elements: Vec<SemanticElement>,
}

impl PageElements {
    /// Count elements per type.
    pub fn type_counts(&self) -> BTreeMap<ElementType, usize> {
        let mut counts = BTreeMap::new();
        for element in &self.elements {
            *counts.entry(element.element_type).or_insert(0) += 1;
        }
        counts
    }
}
