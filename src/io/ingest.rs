//! CSV ingest.
//!
//! Turns an uploaded address list into an ordered sequence of
//! `AddressRecord`s. The file must have a header row with an address column
//! (default `Address`, matched case-insensitively). Address text is passed
//! through untouched: whatever the service makes of it is reported per row.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::AddressRecord;
use crate::error::AppError;

pub const DEFAULT_ADDRESS_COLUMN: &str = "Address";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: records in file order plus rows that could not be read.
#[derive(Debug, Clone)]
pub struct IngestedAddresses {
    pub records: Vec<AddressRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Open and ingest a CSV file.
pub fn load_addresses(path: &Path, column: &str) -> Result<IngestedAddresses, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let ingested = read_addresses(file, column)?;
    if ingested.records.is_empty() {
        return Err(AppError::empty(format!(
            "No addresses found in '{}'.",
            path.display()
        )));
    }

    log::info!(
        "Read {} addresses from '{}' ({} rows skipped)",
        ingested.records.len(),
        path.display(),
        ingested.row_errors.len()
    );
    Ok(ingested)
}

/// Ingest CSV data from any reader.
pub fn read_addresses<R: Read>(reader: R, column: &str) -> Result<IngestedAddresses, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        // Address cells are passed to the service exactly as written.
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let column_idx = *header_map
        .get(&normalize_header_name(column))
        .ok_or_else(|| AppError::input(format!("Missing required column: `{column}`")))?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        match result {
            Ok(record) => {
                let text = record.get(column_idx).unwrap_or("");
                records.push(AddressRecord::new(records.len(), text));
            }
            Err(e) => {
                log::warn!("Skipping CSV line {line}: {e}");
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
            }
        }
    }

    Ok(IngestedAddresses {
        records,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins on duplicate headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_addresses_in_file_order() {
        let data = "Name,Address\nHolmes,\"221B Baker Street, London\"\nNobody,Nowhere\n";
        let ingested = read_addresses(data.as_bytes(), DEFAULT_ADDRESS_COLUMN).unwrap();
        assert_eq!(
            ingested.records,
            vec![
                AddressRecord::new(0, "221B Baker Street, London"),
                AddressRecord::new(1, "Nowhere"),
            ]
        );
        assert_eq!(ingested.rows_read, 2);
        assert!(ingested.row_errors.is_empty());
    }

    #[test]
    fn header_match_is_case_insensitive_and_strips_bom() {
        let data = "\u{feff}address\n10 Downing Street\n";
        let ingested = read_addresses(data.as_bytes(), "Address").unwrap();
        assert_eq!(ingested.records[0].text, "10 Downing Street");
    }

    #[test]
    fn address_cells_keep_surrounding_whitespace() {
        let data = "Name , Address \nPM,  10 Downing St  \nQuoted,\" 221B Baker St \"\n";
        let ingested = read_addresses(data.as_bytes(), DEFAULT_ADDRESS_COLUMN).unwrap();
        assert_eq!(ingested.records[0].text, "  10 Downing St  ");
        assert_eq!(ingested.records[1].text, " 221B Baker St ");
    }

    #[test]
    fn custom_column_name() {
        let data = "id,street\n1,Main St 1\n";
        let ingested = read_addresses(data.as_bytes(), "Street").unwrap();
        assert_eq!(ingested.records[0].text, "Main St 1");
    }

    #[test]
    fn missing_address_column_is_input_error() {
        let data = "Name,City\nA,B\n";
        let err = read_addresses(data.as_bytes(), DEFAULT_ADDRESS_COLUMN).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("Address"));
    }

    #[test]
    fn short_rows_yield_empty_address() {
        // No validation: an empty cell is still an address to look up.
        let data = "Name,Address\nOnlyName\nX,Real Street 1\n";
        let ingested = read_addresses(data.as_bytes(), DEFAULT_ADDRESS_COLUMN).unwrap();
        assert_eq!(ingested.records.len(), 2);
        assert_eq!(ingested.records[0].text, "");
        assert_eq!(ingested.records[1].position, 1);
    }
}
