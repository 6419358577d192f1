//! Export classified rows to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::ReportedRow;
use crate::error::AppError;

/// Column names, written even when there are no rows.
const EXPORT_HEADER: [&str; 10] = [
    "index",
    "address",
    "single_match",
    "exact_match",
    "precise_location",
    "status",
    "confidence",
    "lat",
    "lng",
    "formatted_address",
];

#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    index: usize,
    address: &'a str,
    single_match: bool,
    exact_match: bool,
    precise_location: bool,
    status: &'a str,
    confidence: &'static str,
    lat: Option<f64>,
    lng: Option<f64>,
    formatted_address: Option<&'a str>,
}

impl<'a> From<&'a ReportedRow> for ExportRecord<'a> {
    fn from(row: &'a ReportedRow) -> Self {
        let r = &row.result;
        Self {
            index: row.index,
            address: &r.address,
            single_match: r.is_single_match(),
            exact_match: r.is_exact_match(),
            precise_location: r.is_precise_location(),
            status: &r.status,
            confidence: r.confidence().label(),
            lat: r.location.map(|l| l.lat),
            lng: r.location.map(|l| l.lng),
            formatted_address: r.formatted_address.as_deref(),
        }
    }
}

/// Write rows to a CSV file.
pub fn write_results_csv(path: &Path, rows: &[ReportedRow]) -> Result<(), AppError> {
    let file = std::fs::File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, rows)?;
    log::info!("Wrote {} rows to '{}'", rows.len(), path.display());
    Ok(())
}

/// Write rows as CSV to any writer.
pub fn write_results<W: Write>(writer: W, rows: &[ReportedRow]) -> Result<(), AppError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(EXPORT_HEADER)
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;
    for row in rows {
        wtr.serialize(ExportRecord::from(row))
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
