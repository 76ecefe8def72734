//! Page-source reliability analysis.
//!
//! A read-only pass over a record set that scores how trustworthy the page
//! numbers are, flags problematic elements and suggests fixes. It uses the
//! same [`Confidence`] tiers as the box synthesizer's per-box notes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Confidence, Edge, GroupFailure, MarkedBox, PageSource, PositionRecord};
use crate::synth::{pair_records, resolve_pair};

/// Thresholds for the accuracy assessment, as fractions in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Minimum accurate fraction for a `Good` verdict
    pub good_threshold: f64,
    /// Minimum accurate fraction for a `Fair` verdict
    pub fair_threshold: f64,
    /// Inaccurate fraction above which the inaccuracy note is "high"
    pub high_inaccuracy_threshold: f64,
    /// Inaccurate fraction above which recompiling is recommended
    pub recommend_recompile_threshold: f64,
    /// Unknown fraction above which a note is raised
    pub unknown_warning_threshold: f64,
    /// Unknown fraction above which updating the macros is recommended
    pub unknown_recommend_threshold: f64,
    /// Accurate fraction below which stronger references are recommended
    pub low_accuracy_recommend_threshold: f64,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inaccurate fraction that triggers the recompile advice.
    pub fn with_recompile_threshold(mut self, fraction: f64) -> Self {
        self.recommend_recompile_threshold = fraction;
        self
    }

    /// Set the verdict thresholds.
    pub fn with_verdict_thresholds(mut self, good: f64, fair: f64) -> Self {
        self.good_threshold = good;
        self.fair_threshold = fair;
        self
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            good_threshold: 0.80,
            fair_threshold: 0.50,
            high_inaccuracy_threshold: 0.20,
            recommend_recompile_threshold: 0.10,
            unknown_warning_threshold: 0.50,
            unknown_recommend_threshold: 0.20,
            low_accuracy_recommend_threshold: 0.70,
        }
    }
}

/// Qualitative accuracy verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Good,
    Fair,
    Poor,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Good => "good",
            Verdict::Fair => "fair",
            Verdict::Poor => "poor",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observations that accompany the verdict. Values are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum AccuracyNote {
    HighInaccuracy(f64),
    SomeInaccuracy(f64),
    MostlyUnknown(f64),
}

impl std::fmt::Display for AccuracyNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccuracyNote::HighInaccuracy(p) => {
                write!(f, "HIGH: {:.1}% potentially inaccurate sources", p)
            }
            AccuracyNote::SomeInaccuracy(p) => {
                write!(f, "SOME: {:.1}% potentially inaccurate sources", p)
            }
            AccuracyNote::MostlyUnknown(p) => write!(
                f,
                "UNKNOWN: {:.1}% sources - consider updating TeX macros",
                p
            ),
        }
    }
}

/// Suggested remedies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    RecompileToStabilize,
    UseFloatMarker,
    UpdateMarkerMacros,
    RegenerateDocument,
    UseZrefSavepos,
    AddLabels,
}

impl Recommendation {
    pub fn text(self) -> &'static str {
        match self {
            Recommendation::RecompileToStabilize => {
                "Run LaTeX 2-3 times to stabilize page references"
            }
            Recommendation::UseFloatMarker => "Use \\geommarkfloat{} for floating elements",
            Recommendation::UpdateMarkerMacros => {
                "Update to latest geom-marks.tex for better diagnostics"
            }
            Recommendation::RegenerateDocument => {
                "Regenerate document to get page source information"
            }
            Recommendation::UseZrefSavepos => "Consider using zref-savepos package",
            Recommendation::AddLabels => "Add \\label{} commands for critical elements",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Source counts for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBreakdown {
    pub page: u32,
    pub total: usize,
    pub sources: BTreeMap<PageSource, usize>,
}

/// What is wrong with a flagged element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// The `(id, page)` group does not hold exactly two records
    WrongRecordCount { count: usize },
    /// The group has no start or no end record
    MissingStartOrEnd { failure: GroupFailure },
    /// The element's start and end are on different pages
    CrossPageSpan { start_page: u32, end_page: u32 },
    /// Page came from the counter fallback
    LowConfidenceSource { role: String },
    /// Page came from the live counter, wrong for floats
    FloatSensitiveSource { role: String },
}

/// A flagged element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub page: u32,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            IssueKind::WrongRecordCount { count } => {
                write!(f, "{} (page {}): {} records (expected 2)", self.id, self.page, count)
            }
            IssueKind::MissingStartOrEnd { failure } => {
                write!(f, "{} (page {}): {}", self.id, self.page, failure)
            }
            IssueKind::CrossPageSpan {
                start_page,
                end_page,
            } => write!(f, "{}: spans pages {}-{}", self.id, start_page, end_page),
            IssueKind::LowConfidenceSource { role } => write!(
                f,
                "{} ({}): fell back to page counter (page {})",
                self.id, role, self.page
            ),
            IssueKind::FloatSensitiveSource { role } => write!(
                f,
                "{} ({}): uses page counter (page {})",
                self.id, role, self.page
            ),
        }
    }
}

/// Aggregate page-source diagnostics for a record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    /// Records analyzed, duplicates included
    pub total_records: usize,
    /// Records per page source
    pub sources: BTreeMap<PageSource, usize>,
    /// Records per confidence tier
    pub confidence: BTreeMap<Confidence, usize>,
    /// Fraction of high-confidence records
    pub accurate_fraction: f64,
    /// Fraction of medium- and low-confidence records
    pub inaccurate_fraction: f64,
    /// Fraction of unscored records
    pub unknown_fraction: f64,
    pub verdict: Verdict,
    pub notes: Vec<AccuracyNote>,
    pub recommendations: Vec<Recommendation>,
    pub pages: Vec<PageBreakdown>,
    pub issues: Vec<Issue>,
    pub generated_at: DateTime<Utc>,
}

impl SourceReport {
    /// Whether any element was flagged.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Issues of the low-confidence kind.
    pub fn low_confidence_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| matches!(i.kind, IssueKind::LowConfidenceSource { .. }))
    }

    /// Count for one source.
    pub fn count(&self, source: PageSource) -> usize {
        self.sources.get(&source).copied().unwrap_or(0)
    }
}

/// Scores page-source reliability.
#[derive(Debug, Clone, Default)]
pub struct ReliabilityAnalyzer {
    options: ReportOptions,
}

impl ReliabilityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Analyze a record set.
    pub fn analyze(&self, records: &[PositionRecord]) -> SourceReport {
        let total = records.len();
        let mut sources: BTreeMap<PageSource, usize> = BTreeMap::new();
        let mut confidence: BTreeMap<Confidence, usize> = BTreeMap::new();
        let mut per_page: BTreeMap<u32, BTreeMap<PageSource, usize>> = BTreeMap::new();

        for record in records {
            *sources.entry(record.page_source).or_insert(0) += 1;
            *confidence.entry(record.page_source.confidence()).or_insert(0) += 1;
            *per_page
                .entry(record.page)
                .or_default()
                .entry(record.page_source)
                .or_insert(0) += 1;
        }

        let fraction = |tiers: &[Confidence]| -> f64 {
            if total == 0 {
                return 0.0;
            }
            let n: usize = tiers
                .iter()
                .map(|t| confidence.get(t).copied().unwrap_or(0))
                .sum();
            n as f64 / total as f64
        };
        let accurate = fraction(&[Confidence::High]);
        let inaccurate = fraction(&[Confidence::Medium, Confidence::Low]);
        let unknown = fraction(&[Confidence::Unscored]);

        let verdict = self.verdict(accurate);
        let notes = self.notes(inaccurate, unknown);
        let recommendations = if total == 0 {
            Vec::new()
        } else {
            self.recommendations(accurate, inaccurate, unknown)
        };

        let pages = per_page
            .into_iter()
            .map(|(page, sources)| PageBreakdown {
                page,
                total: sources.values().sum(),
                sources,
            })
            .collect();

        let report = SourceReport {
            total_records: total,
            sources,
            confidence,
            accurate_fraction: accurate,
            inaccurate_fraction: inaccurate,
            unknown_fraction: unknown,
            verdict,
            notes,
            recommendations,
            pages,
            issues: find_issues(records),
            generated_at: Utc::now(),
        };
        log::debug!(
            "Analyzed {} records: {} ({:.1}% accurate, {} issues)",
            report.total_records,
            report.verdict,
            report.accurate_fraction * 100.0,
            report.issues.len()
        );
        report
    }

    fn verdict(&self, accurate: f64) -> Verdict {
        if accurate >= self.options.good_threshold {
            Verdict::Good
        } else if accurate >= self.options.fair_threshold {
            Verdict::Fair
        } else {
            Verdict::Poor
        }
    }

    fn notes(&self, inaccurate: f64, unknown: f64) -> Vec<AccuracyNote> {
        let mut notes = Vec::new();
        if inaccurate > self.options.high_inaccuracy_threshold {
            notes.push(AccuracyNote::HighInaccuracy(inaccurate * 100.0));
        } else if inaccurate > 0.0 {
            notes.push(AccuracyNote::SomeInaccuracy(inaccurate * 100.0));
        }
        if unknown > self.options.unknown_warning_threshold {
            notes.push(AccuracyNote::MostlyUnknown(unknown * 100.0));
        }
        notes
    }

    fn recommendations(&self, accurate: f64, inaccurate: f64, unknown: f64) -> Vec<Recommendation> {
        let mut recs = Vec::new();
        if inaccurate > self.options.recommend_recompile_threshold {
            recs.push(Recommendation::RecompileToStabilize);
            recs.push(Recommendation::UseFloatMarker);
        }
        if unknown > self.options.unknown_recommend_threshold {
            recs.push(Recommendation::UpdateMarkerMacros);
            recs.push(Recommendation::RegenerateDocument);
        }
        if accurate < self.options.low_accuracy_recommend_threshold {
            recs.push(Recommendation::UseZrefSavepos);
            recs.push(Recommendation::AddLabels);
        }
        recs
    }
}

/// Analyze with default thresholds.
pub fn analyze_records(records: &[PositionRecord]) -> SourceReport {
    ReliabilityAnalyzer::new().analyze(records)
}

fn find_issues(records: &[PositionRecord]) -> Vec<Issue> {
    let paired = pair_records(records.iter().cloned());
    let mut issues = Vec::new();

    for (key, group) in paired.groups() {
        if let Err(failure) = resolve_pair(group) {
            let kind = match failure {
                GroupFailure::WrongRecordCount(count) => IssueKind::WrongRecordCount { count },
                failure => IssueKind::MissingStartOrEnd { failure },
            };
            issues.push(Issue {
                id: key.id.clone(),
                page: key.page,
                kind,
            });
        }
    }

    // First start and first end page per id, in input order.
    let mut spans: BTreeMap<&str, (Option<u32>, Option<u32>)> = BTreeMap::new();
    for record in records {
        let entry = spans.entry(record.id.as_str()).or_default();
        match record.edge() {
            Some(Edge::Start) if entry.0.is_none() => entry.0 = Some(record.page),
            Some(Edge::End) if entry.1.is_none() => entry.1 = Some(record.page),
            _ => {}
        }
    }
    for (id, pages) in spans {
        if let (Some(start_page), Some(end_page)) = pages {
            if start_page != end_page {
                issues.push(Issue {
                    id: id.to_string(),
                    page: start_page,
                    kind: IssueKind::CrossPageSpan {
                        start_page,
                        end_page,
                    },
                });
            }
        }
    }

    for record in paired.records() {
        let kind = match record.page_source {
            PageSource::CounterFallback => IssueKind::LowConfidenceSource {
                role: record.role.clone(),
            },
            PageSource::Counter => IssueKind::FloatSensitiveSource {
                role: record.role.clone(),
            },
            _ => continue,
        };
        issues.push(Issue {
            id: record.id.clone(),
            page: record.page,
            kind,
        });
    }

    issues
}

/// Per-page box counts by source, for summarizing synthesized output.
pub fn summarize_boxes(boxes: &[MarkedBox]) -> Vec<PageBreakdown> {
    let mut per_page: BTreeMap<u32, BTreeMap<PageSource, usize>> = BTreeMap::new();
    for b in boxes {
        *per_page
            .entry(b.page)
            .or_default()
            .entry(b.page_source)
            .or_insert(0) += 1;
    }
    per_page
        .into_iter()
        .map(|(page, sources)| PageBreakdown {
            page,
            total: sources.values().sum(),
            sources,
        })
        .collect()
}
