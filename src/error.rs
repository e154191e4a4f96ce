//! Error types for Biotrace

use thiserror::Error;

/// Errors that can occur at the capture pipeline boundaries
///
/// The capture core itself fails soft (unmatched key-ups are dropped, empty
/// aggregates degrade to zero defaults) and never produces an error; these
/// variants only surface when parsing, validating, or encoding recorded data.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to parse recorded session: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid capture session: {0}")]
    InvalidSession(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Baseline store error: {0}")]
    BaselineError(String),
}
