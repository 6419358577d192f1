//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - ingested input rows (`AddressRecord`)
//! - the external service's response shape (`GeocodeResponse`, `MatchEntry`)
//! - normalized call outcomes (`GeocodeOutcome`)
//! - classified per-address reports (`ClassifiedResult`, `Confidence`)

pub mod types;

pub use types::*;
