//! Error types for the data schema registry

use std::path::PathBuf;

use thiserror::Error;

/// Result type for data schema operations
pub type Result<T> = std::result::Result<T, DataSchemaError>;

/// Data schema registry errors
#[derive(Error, Debug)]
pub enum DataSchemaError {
    #[error("Definition has no model name (view: {})", view.as_deref().unwrap_or("<none>"))]
    MissingModel { view: Option<String> },

    #[error("Invalid view pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid definition manifest {}: {reason}", path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
