//! Marker-to-box synthesis: pairing followed by geometry.

mod bbox;
mod pairer;

pub use bbox::{BoxSynthesizer, SynthesisOutput};
pub use pairer::{pair_records, resolve_pair, ElementPairer, GroupKey, PairedRecords};

use crate::model::PositionRecord;
use crate::parser::ParseOptions;

/// Group, deduplicate and synthesize boxes in one pass.
///
/// Duplicate-record diagnostics come first, followed by per-group ones.
pub fn synthesize<I>(records: I, options: &ParseOptions) -> SynthesisOutput
where
    I: IntoIterator<Item = PositionRecord>,
{
    let paired = pair_records(records);
    let mut output = BoxSynthesizer::new(options).synthesize(&paired);

    let mut diagnostics = paired.diagnostics().to_vec();
    diagnostics.append(&mut output.diagnostics);
    output.diagnostics = diagnostics;
    output
}
