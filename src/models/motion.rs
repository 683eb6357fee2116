use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Linear acceleration in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Rotation rate in degrees per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotationRate {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// One device-motion reading as reported by the client.
///
/// `interval` is transported as milliseconds, matching the browser
/// `DeviceMotionEvent.interval` the clients forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub acceleration: Acceleration,
    pub rotation: RotationRate,
    #[serde(
        serialize_with = "serialize_interval_ms",
        deserialize_with = "deserialize_interval_ms"
    )]
    pub interval: Duration,
}

fn serialize_interval_ms<S>(interval: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(interval.as_secs_f64() * 1000.0)
}

fn deserialize_interval_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = f64::deserialize(deserializer)?;
    if !ms.is_finite() || ms < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "interval must be a non-negative number of milliseconds, got {}",
            ms
        )));
    }
    Duration::try_from_secs_f64(ms / 1000.0).map_err(serde::de::Error::custom)
}

/// What the engine knows about device motion for one record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MotionEvidence {
    /// The caller did not ask for motion checks.
    #[default]
    NotRequested,
    /// Motion checks were requested but the source had no fresh sample.
    Missing,
    Present(MotionSample),
}

impl MotionEvidence {
    pub fn sample(&self) -> Option<&MotionSample> {
        match self {
            MotionEvidence::Present(sample) => Some(sample),
            _ => None,
        }
    }
}

impl From<Option<MotionSample>> for MotionEvidence {
    fn from(sample: Option<MotionSample>) -> Self {
        match sample {
            Some(sample) => MotionEvidence::Present(sample),
            None => MotionEvidence::Missing,
        }
    }
}
