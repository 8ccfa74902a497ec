// src/pipeline.rs

use crate::config::PipelineConfig;
use crate::duck::load_to_table;
use crate::error::Result;
use crate::extract::extract_archive;
use crate::process::{
    add_calculated_columns, coerce_date_column, drop_columns,
    inspect::{distinct_values, preview},
    load_csv, ORDER_DATE,
};
use arrow::record_batch::RecordBatch;
use std::{path::PathBuf, time::Instant};
use tracing::{debug, info, instrument};

const SHIP_MODE: &str = "ship_mode";
const PREVIEW_ROWS: usize = 5;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub extracted: Vec<PathBuf>,
    pub rows_loaded: usize,
    /// Columns of the persisted table, in order.
    pub columns: Vec<String>,
}

/// Derive, coerce `order_date`, then drop `drop`.
pub fn transform<S: AsRef<str> + std::fmt::Debug>(
    batch: RecordBatch,
    drop: &[S],
) -> Result<RecordBatch> {
    let batch = add_calculated_columns(&batch)?;
    log_preview("calculated columns added", &batch);

    let batch = coerce_date_column(&batch, ORDER_DATE)?;
    info!("order_date converted to date");

    let batch = drop_columns(&batch, drop)?;
    log_preview("columns dropped", &batch);
    Ok(batch)
}

/// Unpack → load → transform → persist. The first failure aborts the run.
#[instrument(level = "info", skip_all, fields(archive = %cfg.archive_path.display(), table = %cfg.table_name))]
pub fn run(cfg: &PipelineConfig) -> Result<PipelineReport> {
    let start = Instant::now();

    // ─── 1) unpack ───────────────────────────────────────────────────
    let extracted = extract_archive(&cfg.archive_path, &cfg.extract_dir, cfg.overwrite_extracted)?;

    // ─── 2) load & normalize ─────────────────────────────────────────
    let batch = load_csv(cfg.source_path())?;
    match distinct_values(&batch, SHIP_MODE) {
        Ok(modes) => {
            let modes: Vec<&str> = modes.iter().map(|m| m.as_deref().unwrap_or("<null>")).collect();
            info!(?modes, "unique shipping modes");
        }
        Err(e) => debug!("skipping unique shipping modes: {e}"),
    }
    log_preview("loaded", &batch);

    // ─── 3–5) derive, coerce, drop ───────────────────────────────────
    let batch = transform(batch, &cfg.drop_columns)?;

    // ─── 6) persist ──────────────────────────────────────────────────
    let rows_loaded = load_to_table(&batch, &cfg.table_name, &cfg.connection, cfg.insert_policy)?;
    info!(
        rows = rows_loaded,
        policy = %cfg.insert_policy,
        elapsed = ?start.elapsed(),
        "pipeline finished"
    );

    Ok(PipelineReport {
        extracted,
        rows_loaded,
        columns: batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect(),
    })
}

fn log_preview(step: &str, batch: &RecordBatch) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    match preview(batch, PREVIEW_ROWS) {
        Ok(table) => debug!("{step}:\n{table}"),
        Err(e) => debug!("{step}: preview unavailable: {e}"),
    }
}
