// src/process/inspect.rs

use crate::error::{PipelineError, Result, Stage};
use arrow::{
    array::Array,
    record_batch::RecordBatch,
    util::{display::ArrayFormatter, display::FormatOptions, pretty::pretty_format_batches},
};
use std::collections::HashSet;

/// Distinct values of `column` rendered as text, in first-seen order; nulls as `None`.
pub fn distinct_values(batch: &RecordBatch, column: &str) -> Result<Vec<Option<String>>> {
    let col = batch
        .column_by_name(column)
        .ok_or_else(|| PipelineError::schema(Stage::Load, column, "column is missing"))?;
    let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
        .map_err(|e| PipelineError::schema(Stage::Load, column, e))?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in 0..col.len() {
        let value = col.is_valid(row).then(|| formatter.value(row).to_string());
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    Ok(out)
}

/// Pretty-printed table of the first `rows` rows.
pub fn preview(batch: &RecordBatch, rows: usize) -> Result<String> {
    let head = batch.slice(0, rows.min(batch.num_rows()));
    pretty_format_batches(&[head])
        .map(|table| table.to_string())
        .map_err(|e| PipelineError::format(Stage::Load, "preview", e))
}
