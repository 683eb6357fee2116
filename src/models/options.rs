use serde::{Deserialize, Serialize};

/// Per-call verification settings supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationOptions {
    /// Minutes between client checks. Informational; scoring does not use it.
    pub interval_minutes: f64,
    pub require_movement: bool,
    pub min_speed_kmh: Option<f64>,
    pub max_speed_kmh: Option<f64>,
    /// Accepted for compatibility; reports carry no elevation to check.
    pub check_elevation: bool,
    pub require_motion: bool,
    pub is_offline: bool,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            interval_minutes: 5.0,
            require_movement: false,
            min_speed_kmh: None,
            max_speed_kmh: None,
            check_elevation: false,
            require_motion: false,
            is_offline: false,
        }
    }
}

impl VerificationOptions {
    pub fn offline() -> Self {
        Self {
            is_offline: true,
            ..Self::default()
        }
    }

    pub fn with_speed_bounds(min_kmh: Option<f64>, max_kmh: Option<f64>) -> Self {
        Self {
            require_movement: true,
            min_speed_kmh: min_kmh,
            max_speed_kmh: max_kmh,
            ..Self::default()
        }
    }
}
