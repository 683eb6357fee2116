use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VerifyError;

/// Identifier of the user submitting position reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A WGS84 coordinate with optional horizontal accuracy in meters.
///
/// Coordinates are range-checked on construction, so a `Position` that
/// exists is always inside lat [-90, 90] and lng [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    lat: f64,
    lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    accuracy: Option<f64>,
}

#[derive(Deserialize)]
struct RawPosition {
    lat: f64,
    lng: f64,
    #[serde(default)]
    accuracy: Option<f64>,
}

impl TryFrom<RawPosition> for Position {
    type Error = VerifyError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        let position = Position::new(raw.lat, raw.lng)?;
        Ok(position.with_accuracy(raw.accuracy))
    }
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Result<Self, VerifyError> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lng_ok = lng.is_finite() && (-180.0..=180.0).contains(&lng);
        if !lat_ok || !lng_ok {
            return Err(VerifyError::InvalidCoordinate { lat, lng });
        }
        Ok(Self {
            lat,
            lng,
            accuracy: None,
        })
    }

    pub fn with_accuracy(mut self, accuracy: Option<f64>) -> Self {
        // A negative or NaN accuracy carries no information
        self.accuracy = accuracy.filter(|a| a.is_finite() && *a >= 0.0);
        self
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }
}
