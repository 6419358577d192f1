//! Shared pipeline logic used by both the plain CLI and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! addresses -> throttled geocoding -> classified rows -> sink
//!
//! The front-ends then only differ in which `ResultSink` they pass in.

use std::time::Duration;

use chrono::Local;

use crate::domain::{AddressRecord, ReportedRow};
use crate::geocode::Geocoder;
use crate::report::{ResultSink, RunSummary, tally};
use crate::throttle::{self, CancelToken};

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows: Vec<ReportedRow>,
    pub summary: RunSummary,
}

/// Run the pipeline, sleeping for real between calls.
pub fn run_pipeline<G, K>(
    addresses: &[AddressRecord],
    geocoder: &G,
    sink: &mut K,
    delay: Duration,
    cancel: &CancelToken,
) -> RunOutput
where
    G: Geocoder + ?Sized,
    K: ResultSink + ?Sized,
{
    run_pipeline_with_sleep(addresses, geocoder, sink, delay, cancel, std::thread::sleep)
}

/// Run the pipeline with an injected sleep function.
pub fn run_pipeline_with_sleep<G, K, S>(
    addresses: &[AddressRecord],
    geocoder: &G,
    sink: &mut K,
    delay: Duration,
    cancel: &CancelToken,
    sleep: S,
) -> RunOutput
where
    G: Geocoder + ?Sized,
    K: ResultSink + ?Sized,
    S: FnMut(Duration),
{
    let started_at = Local::now();
    log::info!(
        "Geocoding {} addresses, {}ms between calls",
        addresses.len(),
        delay.as_millis()
    );

    sink.set_loading(true);
    let mut rows = Vec::with_capacity(addresses.len());
    let report = throttle::drive(addresses, geocoder, delay, cancel, sleep, |row| {
        sink.append_row(&row);
        rows.push(row);
    });
    sink.set_loading(false);

    let summary = RunSummary {
        total: addresses.len(),
        emitted: report.emitted,
        calls: report.calls,
        retries: report.retries,
        cancelled: report.cancelled,
        by_confidence: tally(&rows),
        started_at,
        finished_at: Local::now(),
    };
    log::info!(
        "Finished: {} rows from {} calls ({} rate-limit retries){}",
        summary.emitted,
        summary.calls,
        summary.retries,
        if summary.cancelled { ", cancelled" } else { "" }
    );

    RunOutput { rows, summary }
}
