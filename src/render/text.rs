//! Plain-text rendering of diagnostic reports.

use std::fmt::Write;

use crate::model::{Confidence, PageSource};
use crate::reliability::{PageBreakdown, SourceReport};

fn status(source: PageSource) -> &'static str {
    match source.confidence() {
        Confidence::High => "[ok]",
        Confidence::Medium => "[~~]",
        Confidence::Low => "[!!]",
        Confidence::Unscored => "[??]",
    }
}

/// Render a page-source report as human-readable text.
pub fn render_report(report: &SourceReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &SourceReport) -> std::fmt::Result {
    writeln!(out, "Total records analyzed: {}", report.total_records)?;
    writeln!(out)?;

    writeln!(out, "Page Source Statistics:")?;
    let mut sources: Vec<(&PageSource, &usize)> = report.sources.iter().collect();
    sources.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (source, count) in sources {
        let percent = if report.total_records == 0 {
            0.0
        } else {
            *count as f64 / report.total_records as f64 * 100.0
        };
        writeln!(
            out,
            "  {} {:<16} {:>4} ({:>5.1}%)",
            status(*source),
            source.as_str(),
            count,
            percent
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Accuracy Assessment:")?;
    writeln!(
        out,
        "  {}: {:.1}% accurate sources",
        report.verdict.as_str().to_uppercase(),
        report.accurate_fraction * 100.0
    )?;
    for note in &report.notes {
        writeln!(out, "  {}", note)?;
    }

    if !report.recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "Recommendations:")?;
        for rec in &report.recommendations {
            writeln!(out, "  - {}", rec)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Page-by-Page Breakdown:")?;
    write_pages(out, &report.pages, "elements")?;

    writeln!(out)?;
    writeln!(out, "Issue Detection:")?;
    if report.issues.is_empty() {
        writeln!(out, "  No significant issues detected")?;
    }
    for issue in &report.issues {
        writeln!(out, "  {}", issue)?;
    }
    Ok(())
}

fn write_pages(out: &mut String, pages: &[PageBreakdown], noun: &str) -> std::fmt::Result {
    for page in pages {
        writeln!(out, "  Page {:>2}: {:>2} {}", page.page, page.total, noun)?;
        for (source, count) in &page.sources {
            writeln!(
                out,
                "    {} {:<16} {:>2}",
                status(*source),
                source.as_str(),
                count
            )?;
        }
    }
    Ok(())
}

/// Render a per-page summary of synthesized boxes.
pub fn render_box_summary(pages: &[PageBreakdown]) -> String {
    let mut out = String::new();
    let total: usize = pages.iter().map(|p| p.total).sum();
    let _ = writeln!(out, "Generated {} marked boxes", total);
    let _ = writeln!(out, "Page summary:");
    let _ = write_pages(&mut out, pages, "boxes");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PositionRecord;
    use crate::reliability::{analyze_records, summarize_boxes};
    use crate::synth::synthesize;

    fn records() -> Vec<PositionRecord> {
        let mut records = Vec::new();
        for i in 0..9 {
            let id = format!("p{}", i);
            records.push(
                PositionRecord::new(id, 1, "P-start", 0.0, 0.0).with_source(PageSource::Label),
            );
        }
        records.push(
            PositionRecord::new("fig", 2, "figure-start", 0.0, 0.0)
                .with_source(PageSource::CounterFallback),
        );
        records
    }

    #[test]
    fn test_render_report_sections() {
        let text = render_report(&analyze_records(&records()));

        assert!(text.contains("Total records analyzed: 10"));
        assert!(text.contains("[ok] label"));
        assert!(text.contains("( 90.0%)"));
        assert!(text.contains("GOOD: 90.0% accurate sources"));
        assert!(text.contains("SOME: 10.0% potentially inaccurate sources"));
        assert!(text.contains("Page  2:  1 elements"));
        assert!(text.contains("fig (figure-start): fell back to page counter (page 2)"));
    }

    #[test]
    fn test_render_report_without_issues() {
        let records = vec![
            PositionRecord::new("a", 1, "P-start", 0.0, 0.0).with_source(PageSource::Zref),
            PositionRecord::new("a", 1, "P-end", 65536.0, 65536.0).with_source(PageSource::Zref),
        ];
        let text = render_report(&analyze_records(&records));
        assert!(text.contains("No significant issues detected"));
        assert!(!text.contains("Recommendations:"));
    }

    #[test]
    fn test_render_box_summary() {
        let records = vec![
            PositionRecord::new("a", 1, "P-start", 0.0, 0.0).with_source(PageSource::Zref),
            PositionRecord::new("a", 1, "P-end", 65536.0, 65536.0).with_source(PageSource::Zref),
        ];
        let output = synthesize(records, &Default::default());
        let text = render_box_summary(&summarize_boxes(&output.boxes));

        assert!(text.starts_with("Generated 1 marked boxes"));
        assert!(text.contains("Page  1:  1 boxes"));
        assert!(text.contains("[ok] zref"));
    }
}
