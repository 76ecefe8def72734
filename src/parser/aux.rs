//! Position import from LaTeX `.aux` files.
//!
//! The marker macros write zref labels of the form
//! `\zref@newlabel{gm:<id>:<role>}{\posx{X}\posy{Y}\page{P}}`. Reading these
//! directly recovers positions from the last compilation pass, which is more
//! reliable than a stream written during shipout.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::stream::RecordSet;
use crate::error::{Error, Result};
use crate::model::{Diagnostic, PageSource, PositionRecord};
use crate::units::{PageSize, SP_PER_PT};

/// Column and page metrics attached to imported records.
///
/// The `.aux` labels carry only a position and a page, so everything else is
/// configured here.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxOptions {
    /// Column width in scaled points
    pub cwsp: f64,
    /// Text width in scaled points
    pub twsp: f64,
    /// Column separation in scaled points
    pub colsep: f64,
    /// Whether the document is set in two columns
    pub twocolumn: bool,
    /// x position (points) beyond which a marker is in the right column
    pub column_split_pt: f64,
    /// Physical page size
    pub page_size: PageSize,
}

impl AuxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take column metrics from a previously written record.
    pub fn with_columns_from(mut self, record: &PositionRecord) -> Self {
        if let Some(cwsp) = record.cwsp {
            self.cwsp = cwsp;
        }
        if let Some(twsp) = record.twsp {
            self.twsp = twsp;
        }
        if let Some(colsep) = record.colsep {
            self.colsep = colsep;
        }
        if let Some(twocolumn) = record.twocolumn {
            self.twocolumn = twocolumn;
        }
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the right-column threshold in points.
    pub fn with_column_split(mut self, x_pt: f64) -> Self {
        self.column_split_pt = x_pt;
        self
    }

    fn column_of(&self, xsp: f64) -> u32 {
        if xsp / SP_PER_PT > self.column_split_pt {
            1
        } else {
            0
        }
    }
}

impl Default for AuxOptions {
    fn default() -> Self {
        Self {
            cwsp: 15_456_563.0,
            twsp: 31_699_558.0,
            colsep: 786_432.0,
            twocolumn: true,
            column_split_pt: 300.0,
            page_size: PageSize::default(),
        }
    }
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\\zref@newlabel\{gm:([^:}]+):([^}]+)\}\{\\posx\{(-?\d+)\}\\posy\{(-?\d+)\}\\page\{(\d+)\}\}",
        )
        .unwrap()
    })
}

/// Import positions from an `.aux` reader.
///
/// A repeated `(id, role, page)` label replaces the earlier one, since later
/// lines come from later passes.
pub fn parse_aux<R: BufRead>(mut reader: R, options: &AuxOptions) -> Result<RecordSet> {
    let re = label_regex();
    let mut slots: Vec<Option<PositionRecord>> = Vec::new();
    let mut index: HashMap<(String, String, u32), usize> = HashMap::new();
    let mut diagnostics = Vec::new();

    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        // Labels are ASCII; other entries may carry the document's 8-bit encoding.
        let line = String::from_utf8_lossy(&buf);
        for caps in re.captures_iter(&line) {
            let page: u32 = match caps[5].parse() {
                Ok(page) if page > 0 => page,
                _ => {
                    let diagnostic = Diagnostic::MalformedLine {
                        line: line_no,
                        reason: format!("invalid page {:?}", &caps[5]),
                    };
                    diagnostic.emit();
                    diagnostics.push(diagnostic);
                    continue;
                }
            };
            let (Ok(xsp), Ok(ysp)) = (caps[3].parse::<f64>(), caps[4].parse::<f64>()) else {
                let diagnostic = Diagnostic::MalformedLine {
                    line: line_no,
                    reason: "position out of range".to_string(),
                };
                diagnostic.emit();
                diagnostics.push(diagnostic);
                continue;
            };
            if xsp < 0.0 || ysp < 0.0 {
                let diagnostic = Diagnostic::MalformedLine {
                    line: line_no,
                    reason: format!("negative position ({}, {})", xsp, ysp),
                };
                diagnostic.emit();
                diagnostics.push(diagnostic);
                continue;
            }

            let id = caps[1].to_string();
            let role = caps[2].to_string();
            let record = build_record(id.clone(), role.clone(), page, xsp, ysp, options);

            let key = (id, role, page);
            if let Some(previous) = index.get(&key).copied() {
                slots[previous] = None;
                let diagnostic = Diagnostic::DuplicateRecord {
                    id: key.0.clone(),
                    page,
                    role: key.1.clone(),
                };
                diagnostic.emit();
                diagnostics.push(diagnostic);
            }
            index.insert(key, slots.len());
            slots.push(Some(record));
        }
    }

    let records: Vec<PositionRecord> = slots.into_iter().flatten().collect();
    log::debug!(
        "Found {} position records in aux file (duplicates removed)",
        records.len()
    );
    Ok(RecordSet {
        records,
        diagnostics,
    })
}

/// Import positions from an `.aux` file.
///
/// Fails with [`Error::NoRecords`] if the file holds no marker labels.
pub fn parse_aux_file<P: AsRef<Path>>(path: P, options: &AuxOptions) -> Result<RecordSet> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let set = parse_aux(BufReader::new(file), options)?;
    if set.is_empty() {
        return Err(Error::NoRecords(path.display().to_string()));
    }
    Ok(set)
}

fn build_record(
    id: String,
    role: String,
    page: u32,
    xsp: f64,
    ysp: f64,
    options: &AuxOptions,
) -> PositionRecord {
    let mut record = PositionRecord::new(id, page, role, xsp, ysp)
        .with_source(PageSource::Zref)
        .with_widths(Some(options.cwsp), Some(options.twsp))
        .with_column(options.column_of(xsp))
        .with_page_size(options.page_size.width, options.page_size.height);
    record.colsep = Some(options.colsep);
    record.twocolumn = Some(options.twocolumn);
    record
}

/// Write records as one JSON object per line.
pub fn write_ndjson<W: Write>(records: &[PositionRecord], mut writer: W) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::stream::read_records_from_str;

    const AUX: &str = r"\relax
\zref@newlabel{gm:sec-p-002:P-start}{\posx{3729359}\posy{30964035}\page{1}}
\zref@newlabel{gm:sec-p-002:P-end}{\posx{24000000}\posy{29000000}\page{1}}
\newlabel{sec:intro}{{1}{1}}
\zref@newlabel{gm:sec-p-002:P-start}{\posx{3800000}\posy{30964035}\page{1}}
";

    #[test]
    fn test_parse_aux_keeps_last_occurrence() {
        let set = parse_aux(AUX.as_bytes(), &AuxOptions::default()).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].role, "P-end");
        assert_eq!(set.records[1].role, "P-start");
        assert_eq!(set.records[1].xsp, 3_800_000.0);
        assert_eq!(set.diagnostics.len(), 1);
        assert!(matches!(
            set.diagnostics[0],
            Diagnostic::DuplicateRecord { .. }
        ));
    }

    #[test]
    fn test_imported_records_carry_metrics() {
        let set = parse_aux(AUX.as_bytes(), &AuxOptions::default()).unwrap();
        let end = &set.records[0];

        assert_eq!(end.page_source, PageSource::Zref);
        assert_eq!(end.cwsp, Some(15_456_563.0));
        // 24000000sp is ~366pt, right of the split
        assert_eq!(end.col, Some(1));
        assert_eq!(set.records[1].col, Some(0));
        assert_eq!(end.pw, Some(597.50787));
    }

    #[test]
    fn test_with_columns_from_record() {
        let record = PositionRecord::new("a", 1, "P-start", 0.0, 0.0)
            .with_widths(Some(100.0), None);
        let options = AuxOptions::default().with_columns_from(&record);
        assert_eq!(options.cwsp, 100.0);
        assert_eq!(options.twsp, 31_699_558.0);
    }

    #[test]
    fn test_write_ndjson_round_trips_through_stream() {
        let set = parse_aux(AUX.as_bytes(), &AuxOptions::default()).unwrap();
        let mut out = Vec::new();
        write_ndjson(&set.records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        let reread = read_records_from_str(&text);
        assert_eq!(reread.records, set.records);
    }

    #[test]
    fn test_non_utf8_lines_do_not_abort_import() {
        let mut aux = Vec::new();
        aux.extend_from_slice(b"\\zref@newlabel{gm:a:P-start}{\\posx{100}\\posy{200}\\page{1}}\n");
        aux.extend_from_slice(b"\\@writefile{toc}{\\contentsline{section}{Caf\xe9}{1}}\n");
        aux.extend_from_slice(b"\\zref@newlabel{gm:a:P-end}{\\posx{300}\\posy{100}\\page{1}}\n");

        let set = parse_aux(aux.as_slice(), &AuxOptions::default()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.diagnostics.is_empty());
        assert_eq!(set.records[1].role, "P-end");
    }

    #[test]
    fn test_negative_position_is_reported() {
        let aux = r"\zref@newlabel{gm:x:P-start}{\posx{-5}\posy{2}\page{1}}";
        let set = parse_aux(aux.as_bytes(), &AuxOptions::default()).unwrap();
        assert!(set.is_empty());
        assert!(matches!(
            set.diagnostics[0],
            Diagnostic::MalformedLine { line: 1, .. }
        ));
    }

    #[test]
    fn test_zero_page_is_reported() {
        let aux = r"\zref@newlabel{gm:x:P-start}{\posx{1}\posy{2}\page{0}}";
        let set = parse_aux(aux.as_bytes(), &AuxOptions::default()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.diagnostics.len(), 1);
    }
}
