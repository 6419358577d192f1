//! Sequential, delayed processing of an address list.
//!
//! `Throttler` is the state machine: it owns the cursor and decides, after each
//! call, whether to retry the same address or advance. `drive` runs the machine
//! against a `Geocoder`, sleeping the fixed delay before every call so that at
//! most one call is ever outstanding.
//!
//! ```text
//! Idle --start--> Waiting --delay--> InFlight --RateLimited--> Waiting (same cursor)
//!                    |                   \--Resolved/Failed--> Waiting (cursor + 1)
//!                    \--cursor == len or cancelled--> Done
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::domain::{AddressRecord, GeocodeOutcome, ReportedRow};
use crate::geocode::{Geocoder, classify_outcome, invoke};

/// Fixed pause before every call, including retries.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleState {
    Idle,
    Waiting,
    InFlight,
    Done,
}

/// Cursor plus state for one run over `len` addresses.
#[derive(Debug, Clone)]
pub struct Throttler {
    len: usize,
    cursor: usize,
    state: ThrottleState,
    retries: u64,
}

impl Throttler {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            cursor: 0,
            state: ThrottleState::Idle,
            retries: 0,
        }
    }

    pub fn state(&self) -> ThrottleState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn retries(&self) -> u64 {
        self.retries
    }

    /// `Idle` -> `Waiting` (or straight to `Done` for an empty list).
    pub fn start(&mut self) -> ThrottleState {
        if self.state == ThrottleState::Idle {
            self.begin_wait();
        }
        self.state
    }

    /// `Waiting` -> `InFlight`. Returns the position to call for.
    pub fn dispatch(&mut self) -> Option<usize> {
        if self.state != ThrottleState::Waiting {
            return None;
        }
        self.state = ThrottleState::InFlight;
        Some(self.cursor)
    }

    /// Stop before the next call. No row is emitted for `Done`.
    pub fn cancel(&mut self) {
        self.state = ThrottleState::Done;
    }

    /// `InFlight` -> `Waiting`/`Done`, applying the call's outcome.
    ///
    /// Terminal outcomes advance the cursor and return the row to emit, indexed
    /// by the cursor after the advance. `RateLimited` leaves the cursor on the
    /// same address and returns `None`.
    pub fn complete(&mut self, address: &str, outcome: &GeocodeOutcome) -> Option<ReportedRow> {
        if self.state != ThrottleState::InFlight {
            return None;
        }

        let row = match classify_outcome(address, outcome) {
            Some(result) => {
                self.cursor = (self.cursor + 1).min(self.len);
                Some(ReportedRow {
                    index: self.cursor,
                    result,
                })
            }
            None => {
                // Undo-then-advance: the cursor stays on the rate-limited address.
                self.retries += 1;
                None
            }
        };

        self.begin_wait();
        row
    }

    fn begin_wait(&mut self) {
        self.state = if self.cursor >= self.len {
            ThrottleState::Done
        } else {
            ThrottleState::Waiting
        };
    }
}

/// Shared flag that stops a run at its next `Waiting` -> `InFlight` edge.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleReport {
    pub emitted: usize,
    pub retries: u64,
    pub calls: u64,
    pub cancelled: bool,
}

/// Run the state machine to completion.
///
/// `sleep` is called with the fixed delay before every call; `on_row` receives
/// each terminal row in emission order.
pub fn drive<G, S, F>(
    addresses: &[AddressRecord],
    geocoder: &G,
    delay: Duration,
    cancel: &CancelToken,
    mut sleep: S,
    mut on_row: F,
) -> ThrottleReport
where
    G: Geocoder + ?Sized,
    S: FnMut(Duration),
    F: FnMut(ReportedRow),
{
    let mut machine = Throttler::new(addresses.len());
    let mut report = ThrottleReport::default();

    machine.start();
    while machine.state() == ThrottleState::Waiting {
        sleep(delay);

        if cancel.is_cancelled() {
            log::info!(
                "Run cancelled with {} of {} addresses processed",
                machine.cursor(),
                addresses.len()
            );
            machine.cancel();
            report.cancelled = true;
            break;
        }

        let Some(position) = machine.dispatch() else {
            break;
        };
        let record = &addresses[position];
        log::debug!("Geocoding #{position}: {}", record.text);

        let outcome = invoke(geocoder, &record.text);
        report.calls += 1;

        match machine.complete(&record.text, &outcome) {
            Some(row) => {
                report.emitted += 1;
                on_row(row);
            }
            None => log::warn!(
                "Rate limited on '{}', retrying after {}ms (retry #{})",
                record.text,
                delay.as_millis(),
                machine.retries()
            ),
        }
    }

    report.retries = machine.retries();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeocodeResponse, LocationType, STATUS_OK, STATUS_OVER_QUERY_LIMIT};
    use crate::geocode::classify::fixtures::entry;
    use crate::geocode::testing::ScriptedGeocoder;

    fn addresses(texts: &[&str]) -> Vec<AddressRecord> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| AddressRecord::new(i, *t))
            .collect()
    }

    fn ok_rooftop() -> GeocodeResponse {
        GeocodeResponse {
            results: vec![entry(LocationType::Rooftop, false)],
            status: STATUS_OK.to_string(),
            error_message: None,
        }
    }

    fn quota() -> GeocodeResponse {
        GeocodeResponse::status_only(STATUS_OVER_QUERY_LIMIT)
    }

    fn run(
        list: &[AddressRecord],
        geocoder: &ScriptedGeocoder,
        cancel: &CancelToken,
    ) -> (ThrottleReport, Vec<ReportedRow>, Vec<Duration>) {
        let mut rows = Vec::new();
        let mut sleeps = Vec::new();
        let report = drive(
            list,
            geocoder,
            DEFAULT_DELAY,
            cancel,
            |d| sleeps.push(d),
            |row| rows.push(row),
        );
        (report, rows, sleeps)
    }

    #[test]
    fn empty_list_is_done_immediately() {
        let mut m = Throttler::new(0);
        assert_eq!(m.start(), ThrottleState::Done);
        assert_eq!(m.dispatch(), None);
    }

    #[test]
    fn terminal_outcome_advances_by_one() {
        let mut m = Throttler::new(2);
        m.start();
        assert_eq!(m.dispatch(), Some(0));
        assert_eq!(m.state(), ThrottleState::InFlight);

        let outcome = GeocodeOutcome::Failed {
            status: "ZERO_RESULTS".to_string(),
        };
        let row = m.complete("A", &outcome).unwrap();
        assert_eq!(row.index, 1);
        assert_eq!(m.cursor(), 1);
        assert_eq!(m.state(), ThrottleState::Waiting);

        assert_eq!(m.dispatch(), Some(1));
        m.complete("B", &outcome).unwrap();
        assert_eq!(m.cursor(), 2);
        assert_eq!(m.state(), ThrottleState::Done);
    }

    #[test]
    fn rate_limit_keeps_cursor() {
        let mut m = Throttler::new(1);
        m.start();
        let before = m.dispatch().unwrap();
        assert!(m.complete("A", &GeocodeOutcome::RateLimited).is_none());
        assert_eq!(m.cursor(), before);
        assert_eq!(m.retries(), 1);
        assert_eq!(m.state(), ThrottleState::Waiting);
        assert_eq!(m.dispatch(), Some(before));
    }

    #[test]
    fn complete_outside_in_flight_is_ignored() {
        let mut m = Throttler::new(1);
        m.start();
        let outcome = GeocodeOutcome::Failed {
            status: "X".to_string(),
        };
        assert!(m.complete("A", &outcome).is_none());
        assert_eq!(m.cursor(), 0);
    }

    #[test]
    fn cursor_never_exceeds_len() {
        let list = addresses(&["A", "B", "C"]);
        let geocoder = ScriptedGeocoder::new(vec![
            ok_rooftop(),
            GeocodeResponse::status_only("ZERO_RESULTS"),
            ok_rooftop(),
        ]);
        let (report, rows, _) = run(&list, &geocoder, &CancelToken::new());
        assert_eq!(report.emitted, 3);
        let indices: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(indices.iter().all(|&i| i <= list.len()));
    }

    #[test]
    fn rate_limited_address_is_retried_with_same_delay() {
        let list = addresses(&["A", "B"]);
        let geocoder = ScriptedGeocoder::new(vec![quota(), quota(), ok_rooftop(), ok_rooftop()]);
        let (report, rows, sleeps) = run(&list, &geocoder, &CancelToken::new());

        assert_eq!(geocoder.calls(), vec!["A", "A", "A", "B"]);
        assert_eq!(report.retries, 2);
        assert_eq!(report.calls, 4);
        assert_eq!(rows.len(), 2);
        assert_eq!(sleeps, vec![DEFAULT_DELAY; 4]);
    }

    #[test]
    fn retries_do_not_shift_row_indices() {
        // The emitted index is the cursor after advancing. A retry leaves the
        // cursor where it was, so an address at position i is reported as i + 1
        // whether or not an earlier address was rate limited.
        let list = addresses(&["A", "B", "C"]);
        let geocoder = ScriptedGeocoder::new(vec![
            quota(),
            ok_rooftop(),
            quota(),
            quota(),
            ok_rooftop(),
            ok_rooftop(),
        ]);
        let (_, rows, _) = run(&list, &geocoder, &CancelToken::new());
        for (row, record) in rows.iter().zip(&list) {
            assert_eq!(row.result.address, record.text);
            assert_eq!(row.index, record.position + 1);
        }
    }

    #[test]
    fn cancelled_run_makes_no_calls() {
        let list = addresses(&["A"]);
        let geocoder = ScriptedGeocoder::new(Vec::new());
        let cancel = CancelToken::new();
        cancel.cancel();
        let (report, rows, sleeps) = run(&list, &geocoder, &cancel);
        assert!(report.cancelled);
        assert!(rows.is_empty());
        assert!(geocoder.calls().is_empty());
        assert_eq!(sleeps.len(), 1);
    }

    #[test]
    fn cancel_between_calls_stops_at_next_dispatch() {
        let list = addresses(&["A", "B", "C"]);
        let geocoder = ScriptedGeocoder::new(vec![ok_rooftop(), ok_rooftop(), ok_rooftop()]);
        let cancel = CancelToken::new();
        let mut rows = Vec::new();
        let report = drive(
            &list,
            &geocoder,
            Duration::ZERO,
            &cancel,
            |_| {},
            |row| {
                rows.push(row);
                cancel.cancel();
            },
        );
        assert!(report.cancelled);
        assert_eq!(rows.len(), 1);
        assert_eq!(geocoder.calls(), vec!["A"]);
    }
}
