/// Convenience result type used across the keyer engine.
pub type DskResult<T> = Result<T, DskError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Scene-level failures that callers treat as a plain "did not happen"
/// (unknown scene on add/switch, unknown transition template) are reported as
/// `bool`/`None` by the operations themselves and never surface here.
#[derive(thiserror::Error, Debug)]
pub enum DskError {
    /// Invalid caller-provided data (duplicate keyer name, channel out of range).
    #[error("validation error: {0}")]
    Validation(String),

    /// A keyer or output addressed by name does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Errors when serializing or deserializing persisted state.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DskError {
    /// Build a [`DskError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DskError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`DskError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for DskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
