//! Crate-level error for callers that drive several stages at once.

use std::path::PathBuf;

use crate::compile::CompileError;
use crate::config::SettingsError;
use crate::result::FormatError;
use crate::schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
