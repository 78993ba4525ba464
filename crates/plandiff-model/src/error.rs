use thiserror::Error;

/// Errors produced by model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Dict-form input did not have the shape of a schedule or task.
    #[error("malformed schedule data: {message}")]
    Shape { message: String },

    #[error("unknown field name: {0}")]
    UnknownField(String),
}

impl ModelError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::shape(err.to_string())
    }
}

/// Convenience alias for model results.
pub type ModelResult<T> = Result<T, ModelError>;
