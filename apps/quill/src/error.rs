//! Errors of the command line layer.

use quill_core::QuillError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] QuillError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database already exists at {} (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("no database at {} (run `quill init` first)", .0.display())]
    MissingDatabase(PathBuf),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
