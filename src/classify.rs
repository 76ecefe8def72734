//! Semantic line classification from font metrics.
//!
//! Each line is classified by its first span alone. The rules below are
//! evaluated top-down and the first match wins; thresholds are strict.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::model::{
    ElementType, FontInfo, LayoutLine, LayoutSpan, PageElements, PageLayout, SemanticElement,
};
use crate::parser::ParseOptions;
use crate::render::PageSelection;

/// Font size above which any line is a title.
pub const TITLE_MIN_SIZE: f64 = 16.0;

/// Font size above which a bold line is a section header.
pub const SECTION_MIN_SIZE: f64 = 12.0;

/// Font size above which a bold line is a subsection header.
pub const SUBSECTION_MIN_SIZE: f64 = 10.0;

/// Font size below which a line is a footnote.
pub const FOOTNOTE_MAX_SIZE: f64 = 9.0;

struct Rule {
    matches: fn(&LayoutSpan) -> bool,
    element_type: ElementType,
}

fn is_title(span: &LayoutSpan) -> bool {
    span.size > TITLE_MIN_SIZE
}

fn is_section_header(span: &LayoutSpan) -> bool {
    span.size > SECTION_MIN_SIZE && span.is_bold()
}

fn is_subsection_header(span: &LayoutSpan) -> bool {
    span.size > SUBSECTION_MIN_SIZE && span.is_bold()
}

fn is_footnote(span: &LayoutSpan) -> bool {
    span.size < FOOTNOTE_MAX_SIZE
}

fn is_emphasis(span: &LayoutSpan) -> bool {
    span.is_italic()
}

static RULES: [Rule; 5] = [
    Rule {
        matches: is_title,
        element_type: ElementType::Title,
    },
    Rule {
        matches: is_section_header,
        element_type: ElementType::SectionHeader,
    },
    Rule {
        matches: is_subsection_header,
        element_type: ElementType::SubsectionHeader,
    },
    Rule {
        matches: is_footnote,
        element_type: ElementType::Footnote,
    },
    Rule {
        matches: is_emphasis,
        element_type: ElementType::Emphasis,
    },
];

/// Classify a single span.
pub fn classify_span(span: &LayoutSpan) -> ElementType {
    RULES
        .iter()
        .find(|rule| (rule.matches)(span))
        .map(|rule| rule.element_type)
        .unwrap_or(ElementType::Paragraph)
}

/// Classify a line by its first span. A line without spans is `Unknown`.
pub fn classify_line(line: &LayoutLine) -> ElementType {
    line.first_span()
        .map(classify_span)
        .unwrap_or(ElementType::Unknown)
}

/// Classify every non-empty line of a page.
pub fn classify_page(page: &PageLayout) -> PageElements {
    let elements = page
        .lines()
        .filter_map(|line| {
            let text = line.text();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let font_info = line
                .first_span()
                .map(|span| FontInfo {
                    font: span.font.clone(),
                    size: span.size,
                    flags: span.flags,
                })
                .unwrap_or_default();
            Some(SemanticElement {
                element_type: classify_line(line),
                text: text.to_string(),
                bbox: line.bbox,
                font_info,
            })
        })
        .collect();

    PageElements {
        page: page.page,
        elements,
    }
}

/// Classifies whole layout documents.
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    pages: PageSelection,
    parallel: bool,
}

impl LineClassifier {
    /// Create a classifier honoring page selection and parallelism.
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            pages: options.pages.clone(),
            parallel: options.parallel,
        }
    }

    /// Classify all selected pages, preserving input order.
    pub fn classify(&self, pages: &[PageLayout]) -> Vec<PageElements> {
        let selected: Vec<&PageLayout> = pages
            .iter()
            .filter(|p| self.pages.includes(p.page))
            .collect();

        let classified: Vec<PageElements> = if self.parallel {
            selected.par_iter().map(|p| classify_page(p)).collect()
        } else {
            selected.iter().map(|p| classify_page(p)).collect()
        };
        log::debug!(
            "Classified {} elements on {} pages",
            classified.iter().map(|p| p.elements.len()).sum::<usize>(),
            classified.len()
        );
        classified
    }
}

/// Element counts per type across pages.
pub fn summarize_elements(pages: &[PageElements]) -> BTreeMap<ElementType, usize> {
    let mut totals = BTreeMap::new();
    for page in pages {
        for (element_type, count) in page.type_counts() {
            *totals.entry(element_type).or_insert(0) += count;
        }
    }
    totals
}
