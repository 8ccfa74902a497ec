// src/duck/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do when the target table already holds rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPolicy {
    /// Keep existing rows and add the new ones, creating the table if needed.
    #[default]
    Append,
    /// Drop and recreate the table before inserting.
    Replace,
}

impl InsertPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            InsertPolicy::Append => "append",
            InsertPolicy::Replace => "replace",
        }
    }
}

impl fmt::Display for InsertPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database engines the loader can talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    DuckDb,
}

/// Where the output table lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionDescriptor {
    pub driver: Driver,
    /// Server host or instance; embedded engines take none.
    pub host: Option<String>,
    /// Database file path, or `:memory:`.
    pub database: String,
}

impl ConnectionDescriptor {
    pub const IN_MEMORY: &'static str = ":memory:";

    pub fn in_memory() -> Self {
        Self {
            database: Self::IN_MEMORY.into(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == Self::IN_MEMORY
    }
}

impl Default for ConnectionDescriptor {
    fn default() -> Self {
        Self {
            driver: Driver::DuckDb,
            host: None,
            database: "orders.duckdb".into(),
        }
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let driver = match self.driver {
            Driver::DuckDb => "duckdb",
        };
        match &self.host {
            Some(host) => write!(f, "{driver}://{host}/{}", self.database),
            None => write!(f, "{driver}:{}", self.database),
        }
    }
}
