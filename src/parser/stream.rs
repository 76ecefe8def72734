//! Line-delimited position record stream.
//!
//! Each non-blank line holds one JSON record. Lines that fail to decode are
//! dropped and reported as [`Diagnostic::MalformedLine`]; only a failing
//! reader ends the stream with an error.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Diagnostic, PositionRecord};

/// Parse a single record line.
pub fn parse_record(line: &str) -> Result<PositionRecord> {
    serde_json::from_str(line.trim()).map_err(|e| Error::InvalidRecord(e.to_string()))
}

/// Lazy, forward-only iterator over the records of a marker stream.
///
/// Yields `Err` only for I/O failures, after which the stream is exhausted.
pub struct RecordStream<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    diagnostics: Vec<Diagnostic>,
    done: bool,
}

impl RecordStream<BufReader<File>> {
    /// Open a marker stream file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordStream<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            diagnostics: Vec::new(),
            done: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// Diagnostics for lines dropped so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the remaining records into a [`RecordSet`].
    pub fn read_all(mut self) -> Result<RecordSet> {
        let mut records = Vec::new();
        for record in self.by_ref() {
            records.push(record?);
        }
        Ok(RecordSet {
            records,
            diagnostics: self.diagnostics,
        })
    }

    fn decode_line(&self) -> std::result::Result<Option<PositionRecord>, String> {
        let line = std::str::from_utf8(&self.buf).map_err(|e| format!("invalid UTF-8: {}", e))?;
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        parse_record(line).map(Some).map_err(|e| e.to_string())
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<PositionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_number += 1;
                    match self.decode_line() {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => {}
                        Err(reason) => {
                            let diagnostic = Diagnostic::MalformedLine {
                                line: self.line_number,
                                reason,
                            };
                            diagnostic.emit();
                            self.diagnostics.push(diagnostic);
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

/// A fully read marker stream.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    /// Records in input order
    pub records: Vec<PositionRecord>,
    /// Dropped-line and import diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read every record from a marker stream file.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<RecordSet> {
    let path = path.as_ref();
    log::debug!("Reading position records from {}", path.display());
    let set = RecordStream::open(path)?.read_all()?;
    log::debug!(
        "Parsed {} records ({} lines dropped)",
        set.records.len(),
        set.diagnostics.len()
    );
    Ok(set)
}

/// Read every record from an in-memory marker stream.
pub fn read_records_from_str(input: &str) -> RecordSet {
    // Reading from a byte slice cannot fail.
    RecordStream::new(input.as_bytes())
        .read_all()
        .unwrap_or_default()
}
