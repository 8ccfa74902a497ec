// src/process/coerce.rs

use crate::error::{PipelineError, Result, Stage};
use crate::process::{date_parser::parse_date32, utils::set_column};
use arrow::{
    array::{new_null_array, Array, ArrayRef, AsArray, Date32Builder},
    datatypes::DataType,
    record_batch::RecordBatch,
    util::display::{ArrayFormatter, FormatOptions},
};
use std::sync::Arc;
use tracing::{debug, instrument};

pub const ORDER_DATE: &str = "order_date";

/// Replace the text column `column` with a Date32 column. Values must be exactly
/// `YYYY-MM-DD`; nulls stay null. A column that is already Date32 is left as is.
#[instrument(level = "info", skip(batch), fields(rows = batch.num_rows()))]
pub fn coerce_date_column(batch: &RecordBatch, column: &str) -> Result<RecordBatch> {
    let col = batch
        .column_by_name(column)
        .ok_or_else(|| PipelineError::schema(Stage::Coerce, column, "column is missing"))?;

    let text = match col.data_type() {
        DataType::Date32 => return Ok(batch.clone()),
        DataType::Utf8 => col.as_string::<i32>(),
        _ => return reject_non_text(batch, col, column),
    };

    let mut b = Date32Builder::with_capacity(text.len());
    for (row, value) in text.iter().enumerate() {
        match value {
            None => b.append_null(),
            Some(raw) => {
                let days = parse_date32(raw).ok_or_else(|| {
                    PipelineError::format(
                        Stage::Coerce,
                        format!("column `{column}` row {row}"),
                        format!("`{raw}` does not match YYYY-MM-DD"),
                    )
                })?;
                b.append_value(days);
            }
        }
    }

    let out = set_column(batch, column, Arc::new(b.finish()))
        .map_err(|e| PipelineError::schema(Stage::Coerce, column, e))?;
    debug!(column, "converted to date");
    Ok(out)
}

/// A non-text column (e.g. `20230501` inferred as Int64) cannot hold `YYYY-MM-DD`
/// values: report its first value. An all-null column becomes an all-null date column.
fn reject_non_text(batch: &RecordBatch, col: &ArrayRef, column: &str) -> Result<RecordBatch> {
    let Some(row) = (0..col.len()).find(|&i| col.is_valid(i)) else {
        return set_column(batch, column, new_null_array(&DataType::Date32, col.len()))
            .map_err(|e| PipelineError::schema(Stage::Coerce, column, e));
    };
    let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
        .map_err(|e| PipelineError::schema(Stage::Coerce, column, e))?;
    Err(PipelineError::format(
        Stage::Coerce,
        format!("column `{column}` row {row}"),
        format!(
            "`{}` ({}) does not match YYYY-MM-DD",
            formatter.value(row),
            col.data_type()
        ),
    ))
}
