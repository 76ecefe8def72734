//! Rendering module for boxes, semantic elements and reports.

mod json;
mod options;
mod output;
mod text;

pub use json::{to_json, JsonFormat};
pub use options::PageSelection;
pub use output::{with_suffix, write_atomic};
pub use text::{render_box_summary, render_report};
