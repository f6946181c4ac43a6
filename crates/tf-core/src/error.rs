//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `TfError` as one
//! variant where they surface configuration or parse failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TfError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `tf-core`.
pub type TfResult<T> = Result<T, TfError>;
