//! Parquet recordings.
//!
//! Works with files written by Pandas (`df.to_parquet()`) and Polars
//! (`df.write_parquet()`): any integer or floating point column can serve as
//! the sample column.

use crate::error::SourceError;
use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use std::path::Path;
use std::sync::Arc;

const FORMAT: &str = "parquet";

fn malformed(e: impl std::fmt::Display) -> SourceError {
    SourceError::Malformed {
        format: FORMAT,
        message: e.to_string(),
    }
}

/// Decode `column` from an in-memory Parquet file.
pub fn decode_column(bytes: Bytes, column: &str) -> Result<Vec<f64>, SourceError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(malformed)?;

    let schema = builder.schema().clone();
    let index = schema.index_of(column).map_err(|_| SourceError::ColumnNotFound {
        column: column.to_string(),
        available: schema.fields().iter().map(|f| f.name().clone()).collect(),
    })?;

    let data_type = schema.field(index).data_type();
    if !data_type.is_numeric() {
        return Err(SourceError::NonNumericColumn {
            column: column.to_string(),
            data_type: data_type.to_string(),
        });
    }

    let mask = ProjectionMask::roots(builder.parquet_schema(), [index]);
    let reader = builder.with_projection(mask).build().map_err(malformed)?;

    let mut samples = Vec::new();
    for batch in reader {
        let batch = batch.map_err(malformed)?;
        append_values(batch.column(0), column, &mut samples)?;
    }

    Ok(samples)
}

/// Widen one batch of a numeric column to `f64` and append it.
fn append_values(array: &ArrayRef, column: &str, out: &mut Vec<f64>) -> Result<(), SourceError> {
    if array.null_count() > 0 {
        let first_null = (0..array.len()).find(|&i| array.is_null(i)).unwrap_or(0);
        return Err(SourceError::NullValue {
            column: column.to_string(),
            row: out.len() + first_null,
        });
    }

    let widened = arrow::compute::cast(array, &DataType::Float64).map_err(malformed)?;
    out.extend(widened.as_primitive::<Float64Type>().values().iter().copied());
    Ok(())
}

/// Write equally long `f64` columns to a Parquet file.
///
/// Column names must be distinct; readers resolve a column by name.
pub fn write_columns(path: &Path, columns: &[(&str, &[f64])]) -> Result<(), SourceError> {
    for (i, (name, _)) in columns.iter().enumerate() {
        if columns[..i].iter().any(|(earlier, _)| earlier == name) {
            return Err(SourceError::Unsupported(format!("duplicate column name '{name}'")));
        }
    }

    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, _)| Field::new(*name, DataType::Float64, false))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|(_, values)| Arc::new(Float64Array::from(values.to_vec())) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).map_err(malformed)?;

    let io_error = |e: std::io::Error| SourceError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = std::fs::File::create(path).map_err(io_error)?;

    let mut writer = ArrowWriter::try_new(file, schema, None).map_err(malformed)?;
    writer.write(&batch).map_err(malformed)?;
    writer.close().map_err(malformed)?;
    Ok(())
}
