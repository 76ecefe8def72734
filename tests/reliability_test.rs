//! Integration tests for page-source reliability reports.

use geommark::model::{PageSource, PositionRecord};
use geommark::reliability::{IssueKind, Recommendation};
use geommark::render::render_report;
use geommark::{analyze_file, analyze_records, Geommark, ReportOptions, Verdict};
use tempfile::NamedTempFile;

fn labelled_set() -> Vec<PositionRecord> {
    let mut records: Vec<PositionRecord> = (0..9)
        .map(|i| {
            PositionRecord::new(format!("p{}", i), 1 + i / 3, "P-start", 0.0, 0.0)
                .with_source(PageSource::Label)
        })
        .collect();
    records.push(
        PositionRecord::new("fig2", 4, "figure-start", 0.0, 0.0)
            .with_source(PageSource::CounterFallback),
    );
    records
}

#[test]
fn test_nine_labels_one_fallback_is_good() {
    let report = analyze_records(&labelled_set());

    assert_eq!(report.total_records, 10);
    assert_eq!(report.verdict, Verdict::Good);
    assert!((report.accurate_fraction - 0.9).abs() < 1e-9);

    let low: Vec<_> = report.low_confidence_issues().collect();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, "fig2");
    assert_eq!(low[0].page, 4);
    assert_eq!(
        low[0].kind,
        IssueKind::LowConfidenceSource {
            role: "figure-start".to_string()
        }
    );
}

#[test]
fn test_fallback_share_at_threshold_does_not_recommend_recompile() {
    // 10% inaccurate does not exceed the default 10% threshold.
    let report = analyze_records(&labelled_set());
    assert!(!report
        .recommendations
        .contains(&Recommendation::RecompileToStabilize));
    assert_eq!(report.count(PageSource::CounterFallback), 1);
}

#[test]
fn test_custom_thresholds() {
    let options = ReportOptions::new().with_verdict_thresholds(0.95, 0.85);
    let report = Geommark::new()
        .with_report_options(options)
        .parse_str(
            &labelled_set()
                .iter()
                .map(|r| serde_json::to_string(r).unwrap())
                .collect::<Vec<_>>()
                .join("\n"),
        )
        .report();
    assert_eq!(report.verdict, Verdict::Fair);
}

#[test]
fn test_percentages_include_duplicates() {
    let record = PositionRecord::new("a", 1, "P-start", 0.0, 0.0).with_source(PageSource::Counter);
    let records = vec![
        record.clone(),
        record,
        PositionRecord::new("a", 1, "P-end", 0.0, 0.0).with_source(PageSource::Label),
    ];
    let report = analyze_records(&records);

    assert_eq!(report.total_records, 3);
    assert_eq!(report.count(PageSource::Counter), 2);
    // Issues are found on deduplicated records.
    let float_sensitive = report
        .issues
        .iter()
        .filter(|i| matches!(i.kind, IssueKind::FloatSensitiveSource { .. }))
        .count();
    assert_eq!(float_sensitive, 1);
}

#[test]
fn test_analyze_file_and_render() {
    let mut file = NamedTempFile::new().unwrap();
    for record in labelled_set() {
        use std::io::Write;
        writeln!(file, "{}", serde_json::to_string(&record).unwrap()).unwrap();
    }

    let report = analyze_file(file.path()).unwrap();
    let text = render_report(&report);

    assert!(text.contains("GOOD: 90.0% accurate sources"));
    assert!(text.contains("Page  4:  1 elements"));
    assert!(text.contains("fig2 (figure-start): fell back to page counter (page 4)"));
}
