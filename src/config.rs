// src/config.rs

use crate::duck::{ConnectionDescriptor, InsertPolicy};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// File the binary reads its settings from, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "orders_etl.yaml";

/// Columns that are folded into the derived ones and not persisted.
pub const DEFAULT_DROP_COLUMNS: [&str; 3] = ["list_price", "cost_price", "discount_percent"];

/// Everything one pipeline run needs. Every field has a default, so a partial
/// YAML file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub archive_path: PathBuf,
    pub extract_dir: PathBuf,
    /// Relative paths are resolved against `extract_dir`.
    pub source_file: PathBuf,
    pub table_name: String,
    pub connection: ConnectionDescriptor,
    pub insert_policy: InsertPolicy,
    /// Whether extraction may replace files already present in `extract_dir`.
    pub overwrite_extracted: bool,
    pub drop_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from("orders.csv.zip"),
            extract_dir: PathBuf::from("."),
            source_file: PathBuf::from("orders.csv"),
            table_name: "df_orders".into(),
            connection: ConnectionDescriptor::default(),
            insert_policy: InsertPolicy::default(),
            overwrite_extracted: true,
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let cfg: PipelineConfig =
            serde_yaml::from_str(&text).map_err(|e| PipelineError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        cfg.validate(path)?;
        Ok(cfg)
    }

    /// Like [`PipelineConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        info!(config = %path.display(), "config file not found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self, origin: &Path) -> Result<()> {
        let invalid = |reason: &str| PipelineError::Config {
            path: origin.to_path_buf(),
            reason: reason.to_string(),
        };
        if self.table_name.trim().is_empty() {
            return Err(invalid("table_name must not be empty"));
        }
        if self.connection.database.trim().is_empty() {
            return Err(invalid("connection.database must not be empty"));
        }
        if self.source_file.as_os_str().is_empty() {
            return Err(invalid("source_file must not be empty"));
        }
        Ok(())
    }

    /// Location of the delimited file once the archive has been unpacked.
    pub fn source_path(&self) -> PathBuf {
        if self.source_file.is_absolute() {
            self.source_file.clone()
        } else {
            self.extract_dir.join(&self.source_file)
        }
    }
}
