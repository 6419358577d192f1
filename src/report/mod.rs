//! Presentation of classified rows: the sink seam, a plain terminal table,
//! and the end-of-run summary.

use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Local};

use crate::domain::{Confidence, ReportedRow};

pub mod format;

pub use format::*;

/// Receives rows as they are emitted and the loading indicator toggles.
///
/// Fire-and-forget: sinks never fail the run.
pub trait ResultSink {
    fn append_row(&mut self, row: &ReportedRow);
    fn set_loading(&mut self, visible: bool);
}

/// Prints a header when loading starts, then one line per row.
pub struct TerminalTable<W: Write> {
    out: W,
}

impl<W: Write> TerminalTable<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_str(&mut self, s: &str) {
        if let Err(e) = self.out.write_all(s.as_bytes()).and_then(|_| self.out.flush()) {
            log::warn!("Failed to write table output: {e}");
        }
    }
}

impl<W: Write> ResultSink for TerminalTable<W> {
    fn append_row(&mut self, row: &ReportedRow) {
        let line = format_row(row);
        self.write_str(&line);
    }

    fn set_loading(&mut self, visible: bool) {
        let text = if visible { format_table_header() } else { format_table_rule() };
        self.write_str(&text);
    }
}

/// Counts and timings for one completed (or cancelled) run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub emitted: usize,
    pub calls: u64,
    pub retries: u64,
    pub cancelled: bool,
    pub by_confidence: HashMap<Confidence, usize>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunSummary {
    pub fn count(&self, confidence: Confidence) -> usize {
        self.by_confidence.get(&confidence).copied().unwrap_or(0)
    }
}

/// Tally rows by confidence tier.
pub fn tally(rows: &[ReportedRow]) -> HashMap<Confidence, usize> {
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.result.confidence()).or_insert(0) += 1;
    }
    counts
}
