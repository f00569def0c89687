use csv::ReaderBuilder;
use log::{debug, warn};
use std::io::Read;
use std::path::Path;

use crate::error::VolatilityError;

/// Close column identifier as written by the source export, trailing space included.
pub const DEFAULT_CLOSE_COLUMN: &str = "Close ";

/// Reads the close column of a headed CSV, in file order.
///
/// Header names are compared with surrounding whitespace trimmed on both sides,
/// so `"Close "` and `"Close"` locate the same column. Row numbers in errors count
/// data rows from 1.
pub fn load_close_prices<R: Read>(reader: R, column: &str) -> Result<Vec<f64>, VolatilityError> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| VolatilityError::MalformedData(format!("unreadable header row: {}", e)))?;

    let wanted = column.trim();
    let index = headers
        .iter()
        .position(|h| h.trim() == wanted)
        .ok_or_else(|| {
            VolatilityError::MalformedData(format!("missing required column {:?}", column))
        })?;

    let mut prices = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let row = row + 1;
        let record = record
            .map_err(|e| VolatilityError::MalformedData(format!("row {}: {}", row, e)))?;

        let raw = record.get(index).unwrap_or("").trim();
        let price = raw.parse::<f64>().map_err(|_| {
            VolatilityError::MalformedData(format!(
                "row {}: close value {:?} is not a number",
                row, raw
            ))
        })?;

        if !price.is_finite() || price <= 0.0 {
            return Err(VolatilityError::MalformedData(format!(
                "row {}: close value {} must be positive and finite",
                row, price
            )));
        }

        prices.push(price);
    }

    debug!("Loaded {} close prices from column {:?}", prices.len(), wanted);

    Ok(prices)
}

/// Reads a server-local CSV file. Any failure to read it counts as not found.
pub async fn load_close_prices_from_path(
    path: &str,
    column: &str,
) -> Result<Vec<f64>, VolatilityError> {
    let bytes = tokio::fs::read(Path::new(path)).await.map_err(|e| {
        warn!("Failed to read dataset {}: {}", path, e);
        VolatilityError::DatasetNotFound {
            path: path.to_string(),
        }
    })?;

    load_close_prices(bytes.as_slice(), column)
}
