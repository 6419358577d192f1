//! Formatted terminal output.
//!
//! Formatting lives in one place so the pipeline stays free of presentation
//! details and output changes are localized.

use crate::domain::{ClassifiedResult, Confidence, ReportedRow};
use crate::report::RunSummary;

const ADDRESS_WIDTH: usize = 40;

/// Column header plus underline, each terminated by a newline.
pub fn format_table_header() -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>5} {:<width$} {:<6} {:<7} {:<7} {:<16} {:<11}",
            "#",
            "address",
            "single",
            "exact",
            "precise",
            "status",
            "confidence",
            width = ADDRESS_WIDTH,
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format_table_rule());
    out
}

pub fn format_table_rule() -> String {
    let mut out = format!(
        "{:-<5} {:-<width$} {:-<6} {:-<7} {:-<7} {:-<16} {:-<11}",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        width = ADDRESS_WIDTH,
    );
    out.push('\n');
    out
}

/// One table line for an emitted row.
pub fn format_row(row: &ReportedRow) -> String {
    let r = &row.result;
    let mut out = format!(
        "{:>5} {:<width$} {:<6} {:<7} {:<7} {:<16} {:<11}",
        row.index,
        truncate(&r.address, ADDRESS_WIDTH),
        r.is_single_match(),
        r.is_exact_match(),
        r.is_precise_location(),
        truncate(&r.status, 16),
        r.confidence().label(),
        width = ADDRESS_WIDTH,
    )
    .trim_end()
    .to_string();
    out.push('\n');
    out
}

/// Human-readable classification of a single response (used by `classify`).
pub fn format_classification(result: &ClassifiedResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("status:           {}\n", result.status));
    out.push_str(&format!("single match:     {}\n", result.is_single_match()));
    out.push_str(&format!("exact match:      {}\n", result.is_exact_match()));
    out.push_str(&format!("precise location: {}\n", result.is_precise_location()));
    out.push_str(&format!("confidence:       {}\n", result.confidence().label()));
    if let Some(loc) = result.location {
        out.push_str(&format!("location:         {:.7}, {:.7}\n", loc.lat, loc.lng));
    }
    if let Some(addr) = &result.formatted_address {
        out.push_str(&format!("formatted:        {addr}\n"));
    }
    out
}

/// End-of-run summary block.
pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("\n=== geobatch run summary ===\n");
    out.push_str(&format!(
        "Addresses: {} | rows: {} | calls: {} | rate-limit retries: {}\n",
        summary.total, summary.emitted, summary.calls, summary.retries
    ));
    let parts: Vec<String> = Confidence::ALL
        .iter()
        .map(|c| format!("{}={}", c.label(), summary.count(*c)))
        .collect();
    out.push_str(&format!("Confidence: {}\n", parts.join(" ")));

    let elapsed = summary.finished_at - summary.started_at;
    out.push_str(&format!(
        "Started: {} | finished: {} | elapsed: {:.1}s\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.finished_at.format("%H:%M:%S"),
        elapsed.num_milliseconds() as f64 / 1000.0
    ));
    if summary.cancelled {
        out.push_str(&format!(
            "Cancelled: {} addresses were not processed.\n",
            summary.total.saturating_sub(summary.emitted)
        ));
    }

    out
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, Local};

    use super::*;
    use crate::domain::{QualitySignals, STATUS_OK};

    #[test]
    fn row_line_shows_signals_and_confidence() {
        let row = ReportedRow {
            index: 7,
            result: ClassifiedResult {
                address: "221B Baker Street, London".to_string(),
                signals: QualitySignals {
                    single_match: true,
                    exact_match: true,
                    precise_location: false,
                },
                status: STATUS_OK.to_string(),
                location: None,
                formatted_address: None,
            },
        };
        let line = format_row(&row);
        assert!(line.trim_start().starts_with("7 221B Baker Street, London"));
        assert!(line.contains("true   true    false   OK"));
        assert!(line.trim_end().ends_with("partial"));
    }

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("short", 10), "short");
        let t = truncate("a very long address line", 10);
        assert_eq!(t.chars().count(), 10);
        assert!(t.ends_with('…'));
    }

    #[test]
    fn summary_mentions_cancellation() {
        let started_at = Local::now();
        let summary = RunSummary {
            total: 5,
            emitted: 2,
            calls: 3,
            retries: 1,
            cancelled: true,
            by_confidence: HashMap::from([(Confidence::High, 2)]),
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
        };
        let text = format_run_summary(&summary);
        assert!(text.contains("high=2 partial=0 unconfirmed=0 failed=0"));
        assert!(text.contains("elapsed: 1.5s"));
        assert!(text.contains("3 addresses were not processed"));
    }
}
