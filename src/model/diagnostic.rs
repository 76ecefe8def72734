//! Recoverable events reported while processing a marker stream.

use serde::{Deserialize, Serialize};

use super::PageSource;

/// How loudly a diagnostic should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// Why a `(id, page)` group produced no box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "count", rename_all = "snake_case")]
pub enum GroupFailure {
    /// The group did not hold exactly one start and one end record
    WrongRecordCount(usize),
    /// No `-start` record in the group
    MissingStart,
    /// No `-end` record in the group
    MissingEnd,
}

impl std::fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupFailure::WrongRecordCount(n) => {
                write!(f, "expected 2 records (start/end), got {}", n)
            }
            GroupFailure::MissingStart => f.write_str("missing start record"),
            GroupFailure::MissingEnd => f.write_str("missing end record"),
        }
    }
}

/// A recoverable event. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An input line could not be parsed and was dropped.
    MalformedLine { line: usize, reason: String },

    /// An exact `(id, page, role)` repeat was dropped.
    DuplicateRecord { id: String, page: u32, role: String },

    /// A group could not be resolved into a box.
    UnresolvedGroup {
        id: String,
        page: u32,
        failure: GroupFailure,
    },

    /// Start and end markers landed on different pages.
    CrossPageSpan {
        id: String,
        start_page: u32,
        end_page: u32,
    },

    /// A page number came from the page counter instead of a reference.
    CounterPageSource {
        id: String,
        page: u32,
        source: PageSource,
    },
}

impl Diagnostic {
    /// Severity of this event.
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::MalformedLine { .. } | Diagnostic::UnresolvedGroup { .. } => {
                Severity::Warning
            }
            Diagnostic::CounterPageSource { source, .. } => {
                if *source == PageSource::CounterFallback {
                    Severity::Warning
                } else {
                    Severity::Info
                }
            }
            Diagnostic::DuplicateRecord { .. } | Diagnostic::CrossPageSpan { .. } => {
                Severity::Info
            }
        }
    }

    /// Element id the event refers to, if any.
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Diagnostic::MalformedLine { .. } => None,
            Diagnostic::DuplicateRecord { id, .. }
            | Diagnostic::UnresolvedGroup { id, .. }
            | Diagnostic::CrossPageSpan { id, .. }
            | Diagnostic::CounterPageSource { id, .. } => Some(id),
        }
    }

    /// Forward this event to the `log` facade at its severity.
    pub fn emit(&self) {
        match self.severity() {
            Severity::Warning => log::warn!("{}", self),
            Severity::Info => log::info!("{}", self),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MalformedLine { line, reason } => {
                write!(f, "skipping malformed line {}: {}", line, reason)
            }
            Diagnostic::DuplicateRecord { id, page, role } => write!(
                f,
                "skipping duplicate record for {} on page {} (role: {})",
                id, page, role
            ),
            Diagnostic::UnresolvedGroup { id, page, failure } => {
                write!(f, "skipping {} (page {}): {}", id, page, failure)
            }
            Diagnostic::CrossPageSpan {
                id,
                start_page,
                end_page,
            } => write!(f, "{} spans multiple pages ({} to {})", id, start_page, end_page),
            Diagnostic::CounterPageSource { id, source, .. } => match source {
                PageSource::CounterFallback => write!(
                    f,
                    "{} fell back to page counter - consider running LaTeX again",
                    id
                ),
                _ => write!(f, "{} uses page counter (may be inaccurate for floats)", id),
            },
        }
    }
}
