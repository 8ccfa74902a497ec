// src/error.rs

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Pipeline stage an error was raised in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Unpack,
    Load,
    Derive,
    Coerce,
    Project,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &str {
        match self {
            Stage::Config => "config",
            Stage::Unpack => "unpack",
            Stage::Load => "load",
            Stage::Derive => "derive",
            Stage::Coerce => "coerce",
            Stage::Project => "project",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure aborts the run; nothing here is retried.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Archive missing, corrupt, or not extractable into the destination
    #[error("[unpack] archive error: {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    /// Input that cannot be parsed (delimited file, date value)
    #[error("[{stage}] format error in {input}: {reason}")]
    Format {
        stage: Stage,
        input: String,
        reason: String,
    },

    /// Missing, duplicated or mistyped column
    #[error("[{stage}] schema error on column `{column}`: {reason}")]
    Schema {
        stage: Stage,
        column: String,
        reason: String,
    },

    /// Connection, schema mismatch or constraint failure in the target store
    #[error("[persist] persistence error on table `{table}`: {reason}")]
    Persistence { table: String, reason: String },

    /// Invalid configuration file
    #[error("[config] configuration error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Archive { .. } => Stage::Unpack,
            PipelineError::Format { stage, .. } | PipelineError::Schema { stage, .. } => *stage,
            PipelineError::Persistence { .. } => Stage::Persist,
            PipelineError::Config { .. } => Stage::Config,
        }
    }

    pub(crate) fn format(stage: Stage, input: impl Into<String>, reason: impl fmt::Display) -> Self {
        PipelineError::Format {
            stage,
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn schema(stage: Stage, column: impl Into<String>, reason: impl fmt::Display) -> Self {
        PipelineError::Schema {
            stage,
            column: column.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn persistence(table: impl Into<String>, reason: impl fmt::Display) -> Self {
        PipelineError::Persistence {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_stage_and_column() {
        let err = PipelineError::schema(Stage::Project, "list_price", "column does not exist");
        assert_eq!(err.stage(), Stage::Project);
        assert_eq!(
            err.to_string(),
            "[project] schema error on column `list_price`: column does not exist"
        );
    }

    #[test]
    fn archive_errors_belong_to_unpack() {
        let err = PipelineError::Archive {
            path: PathBuf::from("orders.csv.zip"),
            reason: "not found".into(),
        };
        assert_eq!(err.stage(), Stage::Unpack);
        assert!(err.to_string().starts_with("[unpack]"));
    }
}
