//! Parsing options and configuration.

use crate::render::PageSelection;
use crate::units::{PageSize, UnitScale, REFERENCE_DPI, SP_PER_PT};

/// Options for reading marker streams and synthesizing boxes.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Scale factors (scaled units per point, output DPI)
    pub scale: UnitScale,

    /// Page size assumed when a record carries no `pw`/`ph`
    pub default_page_size: PageSize,

    /// Whether to use parallel processing
    pub parallel: bool,

    /// Page selection (which pages to emit)
    pub pages: PageSelection,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output pixel density.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.scale.dpi = dpi;
        self
    }

    /// Set the number of scaled units per point.
    pub fn with_sp_per_pt(mut self, sp_per_pt: f64) -> Self {
        self.scale.sp_per_pt = sp_per_pt;
        self
    }

    /// Set the fallback page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            scale: UnitScale::new(SP_PER_PT, REFERENCE_DPI),
            default_page_size: PageSize::default(),
            parallel: true,
            pages: PageSelection::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_dpi(300.0)
            .with_sp_per_pt(1000.0)
            .with_pages(PageSelection::Range(2..=4))
            .sequential();

        assert_eq!(options.scale.dpi, 300.0);
        assert_eq!(options.scale.sp_per_pt, 1000.0);
        assert!(options.pages.includes(3));
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.scale, UnitScale::default());
        assert_eq!(options.default_page_size, PageSize::default());
        assert!(options.parallel);
        assert_eq!(options.pages, PageSelection::All);
    }
}
