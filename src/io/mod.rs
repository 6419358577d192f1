//! Input/output helpers.
//!
//! - CSV ingest of address lists (`ingest`)
//! - CSV export of classified rows (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
