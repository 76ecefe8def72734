//! Grouping of position records into start/end pairs.

use std::collections::{BTreeMap, HashSet};

use crate::model::{Diagnostic, Edge, GroupFailure, PositionRecord};

/// Composite group key. Orders by page, then id, which is also the output
/// order of synthesized boxes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub page: u32,
    pub id: String,
}

impl GroupKey {
    pub fn new(id: impl Into<String>, page: u32) -> Self {
        Self {
            page,
            id: id.into(),
        }
    }
}

/// Records grouped by `(id, page)` with exact repeats removed.
#[derive(Debug, Clone, Default)]
pub struct PairedRecords {
    groups: BTreeMap<GroupKey, Vec<PositionRecord>>,
    diagnostics: Vec<Diagnostic>,
    input_count: usize,
}

impl PairedRecords {
    /// All groups in `(page, id)` order.
    pub fn groups(&self) -> &BTreeMap<GroupKey, Vec<PositionRecord>> {
        &self.groups
    }

    /// Records of one group.
    pub fn get(&self, id: &str, page: u32) -> Option<&[PositionRecord]> {
        self.groups.get(&GroupKey::new(id, page)).map(Vec::as_slice)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Records seen, duplicates included.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Records kept after deduplication.
    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Iterate over kept records in group order.
    pub fn records(&self) -> impl Iterator<Item = &PositionRecord> {
        self.groups.values().flatten()
    }

    /// Duplicate-record diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Accumulates records into `(id, page)` groups.
///
/// A record whose `(id, page, role)` was already seen is dropped and
/// reported as [`Diagnostic::DuplicateRecord`]; the first occurrence wins.
#[derive(Debug, Default)]
pub struct ElementPairer {
    seen: HashSet<(String, u32, String)>,
    paired: PairedRecords,
}

impl ElementPairer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record. Returns `false` if it was dropped as a duplicate.
    pub fn push(&mut self, record: PositionRecord) -> bool {
        self.paired.input_count += 1;

        let dedup_key = (record.id.clone(), record.page, record.role.clone());
        if !self.seen.insert(dedup_key) {
            let diagnostic = Diagnostic::DuplicateRecord {
                id: record.id,
                page: record.page,
                role: record.role,
            };
            diagnostic.emit();
            self.paired.diagnostics.push(diagnostic);
            return false;
        }

        let key = GroupKey::new(record.id.clone(), record.page);
        self.paired.groups.entry(key).or_default().push(record);
        true
    }

    /// Finish grouping.
    pub fn finish(self) -> PairedRecords {
        log::debug!(
            "Found {} unique ID-page combinations",
            self.paired.groups.len()
        );
        self.paired
    }
}

impl Extend<PositionRecord> for ElementPairer {
    fn extend<I: IntoIterator<Item = PositionRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

/// Group a materialized record sequence.
pub fn pair_records<I>(records: I) -> PairedRecords
where
    I: IntoIterator<Item = PositionRecord>,
{
    let mut pairer = ElementPairer::new();
    pairer.extend(records);
    pairer.finish()
}

/// Identify the start and end record of a group.
///
/// A group must hold exactly two records, one of each edge. Groups with
/// more records are rejected rather than reconciled.
pub fn resolve_pair(
    records: &[PositionRecord],
) -> Result<(&PositionRecord, &PositionRecord), GroupFailure> {
    if records.len() != 2 {
        return Err(GroupFailure::WrongRecordCount(records.len()));
    }

    let mut start = None;
    let mut end = None;
    for record in records {
        match record.edge() {
            Some(Edge::Start) => start = Some(record),
            Some(Edge::End) => end = Some(record),
            None => {}
        }
    }

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        (None, _) => Err(GroupFailure::MissingStart),
        (_, None) => Err(GroupFailure::MissingEnd),
    }
}
