//! Rendered page text layout (blocks → lines → spans).
//!
//! This mirrors the structure produced by PDF text introspection tools: each
//! page holds text blocks, each block holds lines, and each line holds spans
//! that share a single font. Coordinates are PDF page space with the origin
//! at the top-left and y increasing downward.

use serde::{Deserialize, Serialize};

use crate::units::PageSize;

/// Span flag bit for italic text.
pub const FLAG_ITALIC: u32 = 1 << 1;

/// Span flag bit for bold text.
pub const FLAG_BOLD: u32 = 1 << 4;

/// A run of text in a single font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<u32>,
    #[serde(default)]
    pub bbox: [f64; 4],
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub font: String,
    /// Font size in points
    pub size: f64,
    /// Style bitmask (see [`FLAG_BOLD`], [`FLAG_ITALIC`])
    #[serde(default)]
    pub flags: u32,
    /// sRGB color as `0xRRGGBB`
    #[serde(default)]
    pub color: u32,
}

impl LayoutSpan {
    /// Create a span with the given text and font metrics.
    pub fn new(text: impl Into<String>, font: impl Into<String>, size: f64, flags: u32) -> Self {
        Self {
            span_id: None,
            bbox: [0.0; 4],
            text: text.into(),
            font: font.into(),
            size,
            flags,
            color: 0,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.flags & FLAG_BOLD != 0
    }

    pub fn is_italic(&self) -> bool {
        self.flags & FLAG_ITALIC != 0
    }
}

/// A line of spans sharing a baseline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<u32>,
    #[serde(default)]
    pub bbox: [f64; 4],
    #[serde(default)]
    pub spans: Vec<LayoutSpan>,
}

impl LayoutLine {
    /// Create a line from spans.
    pub fn new(bbox: [f64; 4], spans: Vec<LayoutSpan>) -> Self {
        Self {
            line_id: None,
            bbox,
            spans,
        }
    }

    /// Concatenated span text, untrimmed.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// The span whose metrics represent the line.
    pub fn first_span(&self) -> Option<&LayoutSpan> {
        self.spans.first()
    }
}

/// A text block. Image blocks carry no lines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<u32>,
    #[serde(default)]
    pub bbox: [f64; 4],
    #[serde(default)]
    pub lines: Vec<LayoutLine>,
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-indexed page number
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<LayoutPageSize>,
    #[serde(default)]
    pub blocks: Vec<LayoutBlock>,
}

/// Page size as written in layout files (`{"width", "height"}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPageSize {
    pub width: f64,
    pub height: f64,
}

impl From<LayoutPageSize> for PageSize {
    fn from(size: LayoutPageSize) -> Self {
        PageSize::new(size.width, size.height)
    }
}

impl PageLayout {
    /// Create an empty page.
    pub fn new(page: u32) -> Self {
        Self {
            page,
            page_size: None,
            blocks: Vec::new(),
        }
    }

    /// Add a block to the page.
    pub fn add_block(&mut self, block: LayoutBlock) {
        self.blocks.push(block);
    }

    /// All lines on the page in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &LayoutLine> {
        self.blocks.iter().flat_map(|b| b.lines.iter())
    }
}
