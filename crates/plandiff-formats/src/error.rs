use plandiff_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("no registered format accepts source: {0}")]
    Unrecognized(String),

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("{format} cannot parse {source_name}: {message}")]
    Parse {
        format: String,
        source_name: String,
        message: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FormatResult<T> = Result<T, FormatError>;
