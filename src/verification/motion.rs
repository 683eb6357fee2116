use async_trait::async_trait;

use crate::error::Result;
use crate::models::{MotionSample, UserId};

/// Where the latest device-motion reading for a user comes from.
#[async_trait]
pub trait MotionSource: Send + Sync {
    /// The most recent sample, or `None` if the device has reported nothing
    /// fresh.
    async fn latest_motion_sample(&self, user: UserId) -> Result<Option<MotionSample>>;
}

/// Bounds for motion a person carrying a handheld device can produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPolicy {
    /// m/s², applied to the x and y axes
    pub max_accel_xy: f64,
    /// m/s², z carries gravity so it gets more headroom
    pub max_accel_z: f64,
    /// deg/s, applied to alpha, beta and gamma
    pub max_rotation: f64,
}

impl Default for MotionPolicy {
    fn default() -> Self {
        Self {
            max_accel_xy: 20.0,
            max_accel_z: 30.0,
            max_rotation: 720.0,
        }
    }
}

impl MotionPolicy {
    /// True when every axis is within bounds. Bounds are inclusive; a
    /// non-finite reading is never plausible.
    pub fn is_plausible(&self, sample: &MotionSample) -> bool {
        let within = |value: f64, limit: f64| value.is_finite() && value.abs() <= limit;

        let accel = &sample.acceleration;
        if !within(accel.x, self.max_accel_xy)
            || !within(accel.y, self.max_accel_xy)
            || !within(accel.z, self.max_accel_z)
        {
            return false;
        }

        let rot = &sample.rotation;
        within(rot.alpha, self.max_rotation)
            && within(rot.beta, self.max_rotation)
            && within(rot.gamma, self.max_rotation)
    }
}
