/// Convenience result type used across flipcut.
pub type FlipcutResult<T> = Result<T, FlipcutError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Component-local conditions (no source image, empty sequence, degenerate
/// drag geometry) are not errors; those degrade to no-ops or placeholder
/// output. `FlipcutError` covers genuinely invalid input and encoder/IO
/// failures.
#[derive(thiserror::Error, Debug)]
pub enum FlipcutError {
    /// Invalid user-provided parameter or document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors in the cutout processing pipeline.
    #[error("processing error: {0}")]
    Processing(String),

    /// Errors while compositing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while spawning or driving the video encoder.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipcutError {
    /// Build a [`FlipcutError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlipcutError::Processing`] value.
    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing(msg.into())
    }

    /// Build a [`FlipcutError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FlipcutError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
