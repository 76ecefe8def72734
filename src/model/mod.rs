//! Data model for marker streams, synthesized boxes and classified layout.
//!
//! Position records and boxes describe geometry recovered from the marker
//! stream. Layout pages and semantic elements describe the rendered output.
//! The two sides carry no cross-reference key.

mod diagnostic;
mod layout;
mod marked_box;
mod record;
mod semantic;

pub use diagnostic::{Diagnostic, GroupFailure, Severity};
pub use layout::{
    LayoutBlock, LayoutLine, LayoutPageSize, LayoutSpan, PageLayout, FLAG_BOLD, FLAG_ITALIC,
};
pub use marked_box::{sort_boxes, MarkedBox, PointRect};
pub use record::{Confidence, Edge, PageSource, PositionRecord};
pub use semantic::{ElementType, FontInfo, PageElements, SemanticElement};
