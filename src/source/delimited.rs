//! CSV recordings: one header row, one sample per row.

use crate::error::SourceError;

const FORMAT: &str = "csv";

/// Decode the numeric `column` of a CSV document.
pub fn decode_column(data: &[u8], column: &str) -> Result<Vec<f64>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| SourceError::Malformed {
            format: FORMAT,
            message: format!("reading headers: {e}"),
        })?
        .clone();

    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| SourceError::ColumnNotFound {
            column: column.to_string(),
            available: headers.iter().map(str::to_string).collect(),
        })?;

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| SourceError::Malformed {
            format: FORMAT,
            message: format!("row {row}: {e}"),
        })?;

        let cell = record.get(index).unwrap_or("");
        if cell.is_empty() {
            return Err(SourceError::NullValue {
                column: column.to_string(),
                row,
            });
        }

        let value = cell.parse::<f64>().map_err(|_| SourceError::Malformed {
            format: FORMAT,
            message: format!("row {row}: '{cell}' in column '{column}' is not a number"),
        })?;
        samples.push(value);
    }

    Ok(samples)
}
