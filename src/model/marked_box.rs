//! Synthesized bounding boxes.

use serde::{Deserialize, Serialize};

use super::{Diagnostic, PageSource};
use crate::units::{pt_to_mm, round2, UnitScale};

/// Unrounded box geometry in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A bounding box for one `(id, page)` element.
///
/// Point values are canonical; millimeter and pixel values are derived from
/// the unrounded point geometry. Every value is rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkedBox {
    pub id: String,
    pub page: u32,
    pub page_source: PageSource,

    pub x_pt: f64,
    pub y_pt: f64,
    pub w_pt: f64,
    pub h_pt: f64,

    pub x_mm: f64,
    pub y_mm: f64,
    pub w_mm: f64,
    pub h_mm: f64,

    pub x_px: f64,
    pub y_px: f64,
    pub w_px: f64,
    pub h_px: f64,

    /// Informational notes raised while synthesizing this box
    #[serde(skip)]
    pub notes: Vec<Diagnostic>,
}

impl MarkedBox {
    /// Build a box from point geometry, deriving the other unit systems.
    pub fn from_points(
        id: impl Into<String>,
        page: u32,
        page_source: PageSource,
        rect: PointRect,
        scale: &UnitScale,
    ) -> Self {
        Self {
            id: id.into(),
            page,
            page_source,
            x_pt: round2(rect.x),
            y_pt: round2(rect.y),
            w_pt: round2(rect.w),
            h_pt: round2(rect.h),
            x_mm: round2(pt_to_mm(rect.x)),
            y_mm: round2(pt_to_mm(rect.y)),
            w_mm: round2(pt_to_mm(rect.w)),
            h_mm: round2(pt_to_mm(rect.h)),
            x_px: round2(scale.pt_to_px(rect.x)),
            y_px: round2(scale.pt_to_px(rect.y)),
            w_px: round2(scale.pt_to_px(rect.w)),
            h_px: round2(scale.pt_to_px(rect.h)),
            notes: Vec::new(),
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: Diagnostic) -> Self {
        self.notes.push(note);
        self
    }

    /// Area in square points.
    pub fn area_pt(&self) -> f64 {
        self.w_pt * self.h_pt
    }

    /// Whether both extents are strictly positive.
    pub fn is_well_formed(&self) -> bool {
        self.w_pt > 0.0 && self.h_pt > 0.0
    }

    /// Sort key for serialized output.
    pub fn sort_key(&self) -> (u32, &str) {
        (self.page, &self.id)
    }
}

/// Sort boxes by `(page, id)`.
pub fn sort_boxes(boxes: &mut [MarkedBox]) {
    boxes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
