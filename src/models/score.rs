use serde::Serialize;
use std::fmt;

/// Confidence in [0, 1] that a reported location is genuine.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct TrustScore(f64);

impl TrustScore {
    /// Clamp `value` into [0, 1]. Non-finite values map to `fallback`.
    pub fn clamped(value: f64, fallback: TrustScore) -> Self {
        if value.is_finite() {
            TrustScore(value.clamp(0.0, 1.0))
        } else {
            fallback
        }
    }

    /// Build a score from a configured constant, clamping it into range.
    pub fn constant(value: f64) -> Self {
        Self::clamped(value, TrustScore(0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<TrustScore> for f64 {
    fn from(score: TrustScore) -> f64 {
        score.0
    }
}
