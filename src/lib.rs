//! `geobatch` library crate.
//!
//! The binary (`geobatch`) is a thin wrapper around this library so that:
//!
//! - the throttled pipeline is testable without network access or a terminal
//! - front-ends (plain table, TUI) share one implementation of the run

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod geocode;
pub mod io;
pub mod report;
pub mod throttle;
pub mod tui;
