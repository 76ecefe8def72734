//! Coordinate unit conversion.
//!
//! Three coordinate spaces are in play: TeX scaled points (`sp`) as emitted
//! by the marker macros, points (`pt`, the canonical output unit), and the
//! derived millimeter and pixel spaces used by overlay consumers.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scaled points per point (TeX internal resolution).
pub const SP_PER_PT: f64 = 65536.0;

/// Millimeters per point.
pub const MM_PER_PT: f64 = 0.352778;

/// Reference DPI at which one point maps to one pixel.
pub const REFERENCE_DPI: f64 = 72.0;

/// Convert scaled points to points at the standard TeX resolution.
pub fn sp_to_pt(sp: f64) -> f64 {
    sp / SP_PER_PT
}

/// Convert points to millimeters.
pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_PT
}

/// Convert millimeters to points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm / MM_PER_PT
}

/// Convert points to pixels at the given DPI.
pub fn pt_to_px(pt: f64, dpi: f64) -> f64 {
    pt * (dpi / REFERENCE_DPI)
}

/// Convert pixels at the given DPI back to points.
pub fn px_to_pt(px: f64, dpi: f64) -> f64 {
    px * (REFERENCE_DPI / dpi)
}

/// Round to two decimal digits for stable serialization.
///
/// Ties go to the even hundredth, so 0.125 becomes 0.12.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Scale factors for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitScale {
    /// Scaled units per point
    pub sp_per_pt: f64,
    /// Output pixel density
    pub dpi: f64,
}

impl UnitScale {
    /// Create a scale with explicit factors.
    pub fn new(sp_per_pt: f64, dpi: f64) -> Self {
        Self { sp_per_pt, dpi }
    }

    /// Convert scaled units to points.
    pub fn sp_to_pt(&self, sp: f64) -> f64 {
        sp / self.sp_per_pt
    }

    /// Convert points to pixels at this scale's DPI.
    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt_to_px(pt, self.dpi)
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::new(SP_PER_PT, REFERENCE_DPI)
    }
}

/// TeX points per inch.
const TEX_PT_PER_INCH: f64 = 72.27;

/// Physical page size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// Create a page size from width and height in points.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    /// A4 as reported by TeX (`\the\paperwidth` x `\the\paperheight`).
    fn default() -> Self {
        Self::new(597.50787, 845.04684)
    }
}

fn dimension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+))\s*(pt|bp|mm|cm|in|sp|px)?\s*$").unwrap()
    })
}

/// Parse a TeX dimension such as `"597.50787pt"` into points.
///
/// A bare number is taken as points. `px` is read at the reference DPI.
pub fn parse_dimension(input: &str) -> Result<f64> {
    let caps = dimension_regex()
        .captures(input)
        .ok_or_else(|| Error::InvalidDimension(input.to_string()))?;
    let value: f64 = caps[1]
        .parse()
        .map_err(|_| Error::InvalidDimension(input.to_string()))?;

    let points = match caps.get(2).map(|m| m.as_str()) {
        None | Some("pt") => value,
        Some("sp") => value / SP_PER_PT,
        Some("bp") | Some("px") => value * TEX_PT_PER_INCH / 72.0,
        Some("in") => value * TEX_PT_PER_INCH,
        Some("cm") => value * TEX_PT_PER_INCH / 2.54,
        Some("mm") => value * TEX_PT_PER_INCH / 25.4,
        Some(other) => return Err(Error::InvalidDimension(format!("unknown unit {}", other))),
    };
    Ok(points)
}

/// A point/pixel pair in image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

/// Map a page point (origin bottom-left, y up) onto a rendered page image
/// (origin top-left, y down).
///
/// `image_width`/`image_height` are the raster size in pixels.
pub fn page_point_to_image(
    x_pt: f64,
    y_pt: f64,
    page: PageSize,
    image_width: f64,
    image_height: f64,
) -> ImagePoint {
    ImagePoint {
        x: x_pt * (image_width / page.width),
        y: image_height - y_pt * (image_height / page.height),
    }
}
