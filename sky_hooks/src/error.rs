use std::path::PathBuf;

use thiserror::Error;

use crate::table::TableKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("{table} index {index} out of bounds (table holds {len} entries)")]
    OutOfRange {
        table: TableKind,
        index: i32,
        len: usize,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config json {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
