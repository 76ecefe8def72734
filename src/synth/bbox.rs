//! Bounding box synthesis from resolved start/end pairs.

use rayon::prelude::*;

use super::pairer::{resolve_pair, GroupKey, PairedRecords};
use crate::model::{sort_boxes, Diagnostic, GroupFailure, MarkedBox, PointRect, PositionRecord};
use crate::parser::ParseOptions;
use crate::render::PageSelection;
use crate::units::{PageSize, UnitScale};

/// Boxes and diagnostics from one synthesis run.
#[derive(Debug, Clone, Default)]
pub struct SynthesisOutput {
    /// Boxes sorted by `(page, id)`
    pub boxes: Vec<MarkedBox>,
    /// Everything reported along the way, in group order
    pub diagnostics: Vec<Diagnostic>,
}

impl SynthesisOutput {
    /// Groups that produced no box.
    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedGroup { .. }))
    }
}

/// Turns `(id, page)` groups into [`MarkedBox`]es.
#[derive(Debug, Clone)]
pub struct BoxSynthesizer {
    scale: UnitScale,
    default_page_size: PageSize,
    pages: PageSelection,
    parallel: bool,
}

impl BoxSynthesizer {
    /// Create a synthesizer from parse options.
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            scale: options.scale,
            default_page_size: options.default_page_size,
            pages: options.pages.clone(),
            parallel: options.parallel,
        }
    }

    /// Synthesize the box for a single group.
    ///
    /// The box takes its id, page and page source from the start record.
    pub fn synthesize_group(&self, records: &[PositionRecord]) -> Result<MarkedBox, GroupFailure> {
        let (start, end) = resolve_pair(records)?;

        let x1 = self.scale.sp_to_pt(start.xsp);
        let y1 = self.scale.sp_to_pt(start.ysp);
        let x2 = self.scale.sp_to_pt(end.xsp);
        let y2 = self.scale.sp_to_pt(end.ysp);

        let mut w = (x2 - x1).abs();
        let h = (y2 - y1).abs();

        // Single-point markers have no extent of their own.
        if w == 0.0 {
            w = if start.col == end.col {
                self.column_width(start)
            } else if x2 > x1 {
                x2 - x1
            } else {
                self.text_width(start)
            };
        }

        let rect = PointRect {
            x: x1.min(x2),
            y: y1.min(y2),
            w,
            h,
        };
        let mut marked = MarkedBox::from_points(
            start.id.clone(),
            start.page,
            start.page_source,
            rect,
            &self.scale,
        );

        if start.page != end.page {
            marked = marked.with_note(Diagnostic::CrossPageSpan {
                id: start.id.clone(),
                start_page: start.page,
                end_page: end.page,
            });
        }

        let weakest = [start.page_source, end.page_source]
            .into_iter()
            .filter(|s| s.is_counter_based())
            .min_by_key(|s| s.confidence());
        if let Some(source) = weakest {
            marked = marked.with_note(Diagnostic::CounterPageSource {
                id: start.id.clone(),
                page: start.page,
                source,
            });
        }

        Ok(marked)
    }

    /// Synthesize boxes for every selected group.
    pub fn synthesize(&self, paired: &PairedRecords) -> SynthesisOutput {
        let groups: Vec<(&GroupKey, &Vec<PositionRecord>)> = paired
            .groups()
            .iter()
            .filter(|(key, _)| self.pages.includes(key.page))
            .collect();

        let results: Vec<Result<MarkedBox, GroupFailure>> = if self.parallel {
            groups
                .par_iter()
                .map(|(_, records)| self.synthesize_group(records))
                .collect()
        } else {
            groups
                .iter()
                .map(|(_, records)| self.synthesize_group(records))
                .collect()
        };

        let mut output = SynthesisOutput::default();
        for ((key, _), result) in groups.into_iter().zip(results) {
            match result {
                Ok(marked) => {
                    for note in &marked.notes {
                        note.emit();
                        output.diagnostics.push(note.clone());
                    }
                    output.boxes.push(marked);
                }
                Err(failure) => {
                    let diagnostic = Diagnostic::UnresolvedGroup {
                        id: key.id.clone(),
                        page: key.page,
                        failure,
                    };
                    diagnostic.emit();
                    output.diagnostics.push(diagnostic);
                }
            }
        }

        sort_boxes(&mut output.boxes);
        log::debug!("Generated {} marked boxes", output.boxes.len());
        output
    }

    fn column_width(&self, record: &PositionRecord) -> f64 {
        match record.cwsp {
            Some(cwsp) => self.scale.sp_to_pt(cwsp),
            None => self.text_width(record),
        }
    }

    fn text_width(&self, record: &PositionRecord) -> f64 {
        match record.twsp {
            Some(twsp) => self.scale.sp_to_pt(twsp),
            None => record.page_size_or(self.default_page_size).width,
        }
    }
}

impl Default for BoxSynthesizer {
    fn default() -> Self {
        Self::new(&ParseOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageSource;
    use crate::synth::pair_records;

    fn pair(start: PositionRecord, end: PositionRecord) -> Vec<PositionRecord> {
        vec![start, end]
    }

    #[test]
    fn test_basic_box() {
        let records = pair(
            PositionRecord::new("fig1", 3, "figure-start", 655360.0, 1310720.0)
                .with_source(PageSource::Label)
                .with_widths(Some(1966080.0), None),
            PositionRecord::new("fig1", 3, "figure-end", 1310720.0, 655360.0)
                .with_source(PageSource::Label),
        );
        let b = BoxSynthesizer::default().synthesize_group(&records).unwrap();

        assert_eq!((b.x_pt, b.y_pt, b.w_pt, b.h_pt), (10.0, 10.0, 10.0, 10.0));
        assert_eq!(b.page, 3);
        assert_eq!(b.page_source, PageSource::Label);
        assert!(b.notes.is_empty());
    }

    #[test]
    fn test_zero_width_same_column_uses_column_width() {
        let records = pair(
            PositionRecord::new("eq1", 1, "eq-start", 655360.0, 655360.0)
                .with_widths(Some(65536.0 * 200.0), Some(65536.0 * 400.0))
                .with_column(0),
            PositionRecord::new("eq1", 1, "eq-end", 655360.0, 65536.0 * 30.0).with_column(0),
        );
        let b = BoxSynthesizer::default().synthesize_group(&records).unwrap();
        assert_eq!(b.w_pt, 200.0);
        assert_eq!(b.h_pt, 20.0);
    }

    #[test]
    fn test_zero_width_different_columns_uses_text_width() {
        let records = pair(
            PositionRecord::new("p1", 1, "P-start", 655360.0, 0.0)
                .with_widths(Some(65536.0 * 200.0), Some(65536.0 * 400.0))
                .with_column(0),
            PositionRecord::new("p1", 1, "P-end", 655360.0, 655360.0).with_column(1),
        );
        let b = BoxSynthesizer::default().synthesize_group(&records).unwrap();
        assert_eq!(b.w_pt, 400.0);
    }

    #[test]
    fn test_zero_width_without_metrics_uses_page_width() {
        let records = pair(
            PositionRecord::new("p1", 1, "P-start", 0.0, 0.0).with_page_size(500.0, 700.0),
            PositionRecord::new("p1", 1, "P-end", 0.0, 655360.0),
        );
        let b = BoxSynthesizer::default().synthesize_group(&records).unwrap();
        assert_eq!(b.w_pt, 500.0);
    }

    #[test]
    fn test_counter_source_note_uses_weakest() {
        let records = pair(
            PositionRecord::new("f", 2, "figure-start", 0.0, 0.0).with_source(PageSource::Counter),
            PositionRecord::new("f", 2, "figure-end", 655360.0, 655360.0)
                .with_source(PageSource::CounterFallback),
        );
        let b = BoxSynthesizer::default().synthesize_group(&records).unwrap();

        assert_eq!(b.page_source, PageSource::Counter);
        assert_eq!(
            b.notes,
            vec![Diagnostic::CounterPageSource {
                id: "f".to_string(),
                page: 2,
                source: PageSource::CounterFallback,
            }]
        );
    }

    #[test]
    fn test_cross_page_pair_uses_start_page() {
        let records = pair(
            PositionRecord::new("f", 2, "figure-start", 0.0, 0.0),
            PositionRecord::new("f", 3, "figure-end", 655360.0, 655360.0),
        );
        let b = BoxSynthesizer::default().synthesize_group(&records).unwrap();
        assert_eq!(b.page, 2);
        assert!(matches!(
            b.notes[0],
            Diagnostic::CrossPageSpan {
                start_page: 2,
                end_page: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_synthesize_skips_unresolved_groups() {
        let paired = pair_records(vec![
            PositionRecord::new("ok", 1, "P-start", 0.0, 0.0),
            PositionRecord::new("ok", 1, "P-end", 655360.0, 655360.0),
            PositionRecord::new("lonely", 1, "P-start", 0.0, 0.0),
        ]);
        let output = BoxSynthesizer::default().synthesize(&paired);

        assert_eq!(output.boxes.len(), 1);
        assert_eq!(output.boxes[0].id, "ok");
        assert_eq!(output.skipped().count(), 1);
    }

    #[test]
    fn test_synthesize_respects_page_selection() {
        let paired = pair_records(vec![
            PositionRecord::new("a", 1, "P-start", 0.0, 0.0),
            PositionRecord::new("a", 1, "P-end", 655360.0, 655360.0),
            PositionRecord::new("a", 2, "P-start", 0.0, 0.0),
            PositionRecord::new("a", 2, "P-end", 655360.0, 655360.0),
        ]);
        let options = ParseOptions::new().with_pages(PageSelection::Pages(vec![2]));
        let output = BoxSynthesizer::new(&options).synthesize(&paired);

        assert_eq!(output.boxes.len(), 1);
        assert_eq!(output.boxes[0].page, 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let records: Vec<PositionRecord> = (0..200)
            .flat_map(|i| {
                let id = format!("el{:03}", i);
                let page = i % 7 + 1;
                [
                    PositionRecord::new(id.clone(), page, "P-start", (i * 1000) as f64, 0.0),
                    PositionRecord::new(id, page, "P-end", (i * 3000) as f64, 65536.0),
                ]
            })
            .collect();
        let paired = pair_records(records);

        let parallel = BoxSynthesizer::new(&ParseOptions::new()).synthesize(&paired);
        let sequential = BoxSynthesizer::new(&ParseOptions::new().sequential()).synthesize(&paired);
        assert_eq!(parallel.boxes, sequential.boxes);
        assert_eq!(parallel.diagnostics, sequential.diagnostics);
    }
}
