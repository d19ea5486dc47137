//! FILENAME: app/src/error.rs
// PURPOSE: Error type for host-side failures (configuration, files, lookups).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid JSON in {path:?}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Schema(#[from] grid_engine::SchemaError),

    #[error("Lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cannot resolve lookup endpoint '{0}'")]
    Endpoint(String),

    #[error("Lookup returned status {0}")]
    Status(u16),

    #[error("Grid state lock poisoned")]
    Poisoned,

    #[error("Logging error: {0}")]
    Logging(String),
}
