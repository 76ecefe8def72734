//! # geommark
//!
//! Bounding boxes for marked LaTeX elements, recovered from the positional
//! markers a TeX run writes while typesetting.
//!
//! Each marked element emits a start and an end record carrying coordinates
//! in scaled points. This library pairs those records, synthesizes one box
//! per element and page in points, millimeters and pixels, and scores how
//! far the attached page numbers can be trusted. A separate classifier
//! assigns semantic roles to lines of a rendered text layout.
//!
//! ## Quick Start
//!
//! ```no_run
//! use geommark::{convert_file, analyze_file};
//!
//! fn main() -> geommark::Result<()> {
//!     // Writes paper-texpos-marked-boxes.json next to the input
//!     let output = convert_file("paper-texpos.ndjson", None::<&str>)?;
//!     println!("Wrote {}", output.display());
//!
//!     let report = analyze_file("paper-texpos.ndjson")?;
//!     println!("Verdict: {}", report.verdict);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Tolerant input**: malformed lines are reported and skipped
//! - **Deterministic output**: boxes sorted by page, then id
//! - **Page-source reliability**: verdicts, notes and flagged elements
//! - **Aux import**: position labels straight from a `.aux` file
//! - **Parallel processing**: Uses Rayon across groups and pages

pub mod classify;
pub mod error;
pub mod model;
pub mod parser;
pub mod reliability;
pub mod render;
pub mod synth;
pub mod units;

// Re-export commonly used types
pub use classify::{classify_line, classify_page, classify_span, LineClassifier};
pub use error::{Error, Result};
pub use model::{
    Confidence, Diagnostic, ElementType, GroupFailure, MarkedBox, PageElements, PageLayout,
    PageSource, PositionRecord, SemanticElement, Severity,
};
pub use parser::{
    parse_aux_file, read_records, read_records_from_str, AuxOptions, ParseOptions, RecordSet,
    RecordStream,
};
pub use reliability::{analyze_records, ReliabilityAnalyzer, ReportOptions, SourceReport, Verdict};
pub use render::{JsonFormat, PageSelection};
pub use synth::{synthesize, BoxSynthesizer, ElementPairer, SynthesisOutput};
pub use units::{PageSize, UnitScale};

use std::path::{Path, PathBuf};

/// Suffix of the default box output file.
pub const BOXES_SUFFIX: &str = "-marked-boxes.json";

/// Suffix of the default classification output file.
pub const SEMANTIC_SUFFIX: &str = "-semantic.json";

/// Default box output path for a record stream: `<stem>-marked-boxes.json`
/// beside the input.
pub fn default_boxes_path<P: AsRef<Path>>(input: P) -> PathBuf {
    render::with_suffix(input, BOXES_SUFFIX)
}

/// Default classification output path: `<stem>-semantic.json` beside the input.
pub fn default_semantic_path<P: AsRef<Path>>(input: P) -> PathBuf {
    render::with_suffix(input, SEMANTIC_SUFFIX)
}

/// Convert a record stream into a JSON array of marked boxes.
///
/// The output is written only after every group has been synthesized, so
/// a failure never leaves a partial file behind. Returns the output path.
///
/// # Example
///
/// ```no_run
/// use geommark::convert_file;
///
/// let path = convert_file("paper-texpos.ndjson", Some("boxes.json")).unwrap();
/// assert_eq!(path.to_str(), Some("boxes.json"));
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Option<Q>) -> Result<PathBuf> {
    let input = input.as_ref();
    let output = match output {
        Some(path) => path.as_ref().to_path_buf(),
        None => default_boxes_path(input),
    };
    Geommark::new().parse(input)?.write_boxes(&output)?;
    Ok(output)
}

/// Read a record stream and analyze its page-source reliability.
///
/// # Example
///
/// ```no_run
/// use geommark::analyze_file;
///
/// let report = analyze_file("paper-texpos.ndjson").unwrap();
/// for issue in &report.issues {
///     println!("{}", issue);
/// }
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<SourceReport> {
    Ok(Geommark::new().parse(path)?.report())
}

/// Read a layout document (a JSON array of pages).
pub fn read_layout<P: AsRef<Path>>(path: P) -> Result<Vec<PageLayout>> {
    let file = std::fs::File::open(path)?;
    let pages = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(pages)
}

/// Classify every line of a layout document.
///
/// # Example
///
/// ```no_run
/// use geommark::classify_file;
///
/// let pages = classify_file("layout.json").unwrap();
/// println!("{} pages classified", pages.len());
/// ```
pub fn classify_file<P: AsRef<Path>>(path: P) -> Result<Vec<PageElements>> {
    classify_file_with_options(path, &ParseOptions::default())
}

/// Classify a layout document honoring page selection and parallelism.
pub fn classify_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> Result<Vec<PageElements>> {
    let pages = read_layout(path)?;
    Ok(LineClassifier::new(options).classify(&pages))
}

/// Builder for reading records and producing boxes or reports.
///
/// # Example
///
/// ```no_run
/// use geommark::{Geommark, JsonFormat, PageSelection};
///
/// let json = Geommark::new()
///     .with_dpi(150.0)
///     .with_pages(PageSelection::parse("1-3")?)
///     .parse("paper-texpos.ndjson")?
///     .to_json(JsonFormat::Compact)?;
/// # Ok::<(), geommark::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Geommark {
    parse_options: ParseOptions,
    report_options: ReportOptions,
}

impl Geommark {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pixel resolution.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.parse_options = self.parse_options.with_dpi(dpi);
        self
    }

    /// Set the scaled-point to point ratio.
    pub fn with_sp_per_pt(mut self, sp_per_pt: f64) -> Self {
        self.parse_options = self.parse_options.with_sp_per_pt(sp_per_pt);
        self
    }

    /// Set the page size used when records carry none.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.parse_options = self.parse_options.with_page_size(size);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse_options = self.parse_options.with_pages(pages);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parse_options = self.parse_options.sequential();
        self
    }

    /// Set reliability thresholds.
    pub fn with_report_options(mut self, options: ReportOptions) -> Self {
        self.report_options = options;
        self
    }

    /// Read a record stream from disk.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<GeommarkResult> {
        let set = read_records(path)?;
        Ok(self.wrap(set))
    }

    /// Read a record stream from a string.
    pub fn parse_str(self, input: &str) -> GeommarkResult {
        self.wrap(read_records_from_str(input))
    }

    /// Import position labels from a LaTeX aux file.
    pub fn parse_aux<P: AsRef<Path>>(self, path: P, options: &AuxOptions) -> Result<GeommarkResult> {
        let set = parse_aux_file(path, options)?;
        Ok(self.wrap(set))
    }

    fn wrap(self, set: RecordSet) -> GeommarkResult {
        GeommarkResult {
            records: set.records,
            diagnostics: set.diagnostics,
            parse_options: self.parse_options,
            report_options: self.report_options,
        }
    }
}

/// Records read by [`Geommark`], ready for synthesis or analysis.
#[derive(Debug, Clone)]
pub struct GeommarkResult {
    /// Well-formed records in input order
    pub records: Vec<PositionRecord>,
    /// Diagnostics raised while reading
    pub diagnostics: Vec<Diagnostic>,
    parse_options: ParseOptions,
    report_options: ReportOptions,
}

impl GeommarkResult {
    /// Synthesize boxes. Read diagnostics precede synthesis diagnostics.
    pub fn boxes(&self) -> SynthesisOutput {
        let mut output = synthesize(self.records.iter().cloned(), &self.parse_options);
        let mut diagnostics = self.diagnostics.clone();
        diagnostics.append(&mut output.diagnostics);
        output.diagnostics = diagnostics;
        output
    }

    /// Analyze page-source reliability.
    pub fn report(&self) -> SourceReport {
        ReliabilityAnalyzer::with_options(self.report_options.clone()).analyze(&self.records)
    }

    /// Serialize the synthesized boxes.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.boxes().boxes, format)
    }

    /// Synthesize and atomically write the boxes as pretty JSON.
    pub fn write_boxes<P: AsRef<Path>>(&self, path: P) -> Result<SynthesisOutput> {
        self.write_boxes_with_format(path, JsonFormat::Pretty)
    }

    /// Synthesize and atomically write the boxes.
    pub fn write_boxes_with_format<P: AsRef<Path>>(
        &self,
        path: P,
        format: JsonFormat,
    ) -> Result<SynthesisOutput> {
        let output = self.boxes();
        let json = render::to_json(&output.boxes, format)?;
        render::write_atomic(path, json.as_bytes())?;
        Ok(output)
    }
}
