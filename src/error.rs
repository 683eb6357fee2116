//! Error types for the verification engine

use thiserror::Error;

/// Errors raised inside the engine. None of them escape `Verifier::verify`,
/// which converts every one into the fallback trust score.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Latitude or longitude out of range, or not finite
    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Persistent store or motion source failure
    #[error("store error: {0}")]
    Store(String),

    /// A collaborator call did not finish in time
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// Two consecutive history records with no time between them
    #[error("non-positive elapsed time between history records: {0} µs")]
    NonPositiveElapsed(i64),

    /// A verification step panicked
    #[error("internal error: {0}")]
    Internal(String),

    /// Payload could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<sqlx::Error> for VerifyError {
    fn from(err: sqlx::Error) -> Self {
        VerifyError::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
