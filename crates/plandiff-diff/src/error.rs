//! Error types for the diff crate.

use plandiff_model::ModelError;

/// Errors that can occur during diff operations.
///
/// Matching itself never fails: ambiguous or missing matches degrade to
/// added/removed nodes. Errors come only from bad input or configuration.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Diff configuration could not be read or contained unknown settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// An input tree could not be serialized or reconstructed.
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
