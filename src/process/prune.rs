// src/process/prune.rs

use crate::error::{PipelineError, Result, Stage};
use arrow::record_batch::RecordBatch;
use tracing::{info, instrument};

/// Remove `columns` from the batch. Every name must exist; nothing is dropped
/// unless all of them do.
#[instrument(level = "info", skip(batch))]
pub fn drop_columns<S: AsRef<str> + std::fmt::Debug>(
    batch: &RecordBatch,
    columns: &[S],
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut doomed = Vec::with_capacity(columns.len());
    for name in columns {
        let name = name.as_ref();
        let idx = schema.index_of(name).map_err(|_| {
            PipelineError::schema(Stage::Project, name, "cannot drop a column that does not exist")
        })?;
        doomed.push(idx);
    }

    let keep: Vec<usize> = (0..batch.num_columns())
        .filter(|i| !doomed.contains(i))
        .collect();
    let out = batch
        .project(&keep)
        .map_err(|e| PipelineError::schema(Stage::Project, "*", e))?;
    info!(dropped = doomed.len(), remaining = out.num_columns(), "columns dropped");
    Ok(out)
}
