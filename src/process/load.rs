// src/process/load.rs

use crate::error::{PipelineError, Result, Stage};
use crate::process::{
    convert::typed_column,
    utils::{is_null_marker, normalize_column_name},
};
use arrow::{
    array::ArrayRef,
    datatypes::{Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use csv::ReaderBuilder;
use std::{collections::HashSet, fs::File, path::Path, sync::Arc};
use tracing::{debug, info, instrument};

/// Read a comma-delimited file with a header row into a typed batch.
///
/// Empty fields and the [`NULL_MARKERS`](crate::process::utils::NULL_MARKERS) become
/// nulls, column types are inferred from the remaining values, and column names are
/// normalized before returning.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let path = path.as_ref();
    let input = path.display().to_string();

    let file = File::open(path).map_err(|e| PipelineError::format(Stage::Load, &input, e))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PipelineError::format(Stage::Load, &input, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(PipelineError::format(Stage::Load, &input, "missing header row"));
    }

    // Column-major buffers, one per header
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            PipelineError::format(Stage::Load, format!("{input} at record {}", idx + 1), e)
        })?;
        for (col, raw) in columns.iter_mut().zip(record.iter()) {
            col.push(if is_null_marker(raw) {
                None
            } else {
                Some(raw.to_string())
            });
        }
    }
    let num_rows = columns.first().map_or(0, Vec::len);
    debug!(rows = num_rows, columns = headers.len(), "parsed delimited file");

    let arrays: Vec<ArrayRef> = columns.iter().map(|c| typed_column(c)).collect();
    let fields: Vec<Field> = headers
        .iter()
        .zip(&arrays)
        .map(|(name, arr)| Field::new(name, arr.data_type().clone(), true))
        .collect();
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
        .map_err(|e| PipelineError::format(Stage::Load, &input, e))?;

    let batch = normalize_column_names(&batch)?;
    info!(rows = batch.num_rows(), columns = batch.num_columns(), "loaded and normalized");
    Ok(batch)
}

/// Rename every column via [`normalize_column_name`]. Two headers that collapse onto
/// the same name are rejected.
pub fn normalize_column_names(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut seen = HashSet::with_capacity(batch.num_columns());
    let mut fields = Vec::with_capacity(batch.num_columns());
    for field in batch.schema().fields() {
        let name = normalize_column_name(field.name());
        if !seen.insert(name.clone()) {
            return Err(PipelineError::schema(
                Stage::Load,
                name,
                format!("`{}` normalizes to a name that is already taken", field.name()),
            ));
        }
        fields.push(field.as_ref().clone().with_name(name));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        batch.columns().to_vec(),
        &options,
    )
    .map_err(|e| PipelineError::schema(Stage::Load, "*", e))
}
