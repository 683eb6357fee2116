//! Implied-speed and device-motion checks between consecutive history records.

use crate::error::{Result, VerifyError};
use crate::models::{LocationRecord, MotionEvidence, VerificationOptions};

use super::geometry::distance_meters;
use super::motion::MotionPolicy;

/// Relative slack on speed bounds so a value equal to a bound is not
/// rejected over float rounding in the distance calculation.
const BOUND_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anomaly {
    TooSlow { speed_kmh: f64, min_kmh: f64 },
    TooFast { speed_kmh: f64, max_kmh: f64 },
    ImplausibleMotion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementCheck {
    /// Movement checks not requested, or not enough history to compare.
    Skipped,
    Plausible { speed_kmh: f64 },
    Anomaly(Anomaly),
}

/// Speed implied by moving from `previous` to `current`, in km/h.
pub fn implied_speed_kmh(previous: &LocationRecord, current: &LocationRecord) -> Result<f64> {
    let elapsed = current.timestamp - previous.timestamp;
    // Microsecond count overflows only for gaps of ~292k years
    let elapsed_us = elapsed
        .num_microseconds()
        .unwrap_or_else(|| elapsed.num_milliseconds().saturating_mul(1000));
    if elapsed_us <= 0 {
        return Err(VerifyError::NonPositiveElapsed(elapsed_us));
    }

    let distance = distance_meters(&previous.position, &current.position);
    let elapsed_hours = elapsed_us as f64 / 3_600_000_000.0;
    Ok((distance / 1000.0) / elapsed_hours)
}

/// Evaluate the newest history record against the one before it.
///
/// `recent` is the tail of the user's history, oldest first. Only runs when
/// `require_movement` is set and at least two records exist.
pub fn check_movement(
    recent: &[LocationRecord],
    options: &VerificationOptions,
    motion_policy: &MotionPolicy,
) -> Result<MovementCheck> {
    if !options.require_movement {
        return Ok(MovementCheck::Skipped);
    }
    let [.., previous, current] = recent else {
        return Ok(MovementCheck::Skipped);
    };

    let speed_kmh = implied_speed_kmh(previous, current)?;

    if let Some(min_kmh) = options.min_speed_kmh {
        if speed_kmh < min_kmh * (1.0 - BOUND_TOLERANCE) {
            return Ok(MovementCheck::Anomaly(Anomaly::TooSlow { speed_kmh, min_kmh }));
        }
    }
    if let Some(max_kmh) = options.max_speed_kmh {
        if speed_kmh > max_kmh * (1.0 + BOUND_TOLERANCE) {
            return Ok(MovementCheck::Anomaly(Anomaly::TooFast { speed_kmh, max_kmh }));
        }
    }

    if options.require_motion {
        if let MotionEvidence::Present(sample) = &current.motion {
            if !motion_policy.is_plausible(sample) {
                return Ok(MovementCheck::Anomaly(Anomaly::ImplausibleMotion));
            }
        }
    }

    Ok(MovementCheck::Plausible { speed_kmh })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Acceleration, MotionSample, Position, RotationRate};
    use crate::verification::geometry::EARTH_RADIUS_M;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    /// Latitude delta in degrees covering `meters` along a meridian.
    fn lat_delta(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    fn rec(lat: f64, minutes: i64, motion: MotionEvidence) -> LocationRecord {
        LocationRecord::live(
            Position::new(lat, 0.0).unwrap(),
            t0() + Duration::minutes(minutes),
            motion,
        )
    }

    fn pair_one_km_one_hour() -> Vec<LocationRecord> {
        vec![
            rec(0.0, 0, MotionEvidence::NotRequested),
            rec(lat_delta(1000.0), 60, MotionEvidence::NotRequested),
        ]
    }

    #[test]
    fn test_skipped_without_require_movement() {
        let opts = VerificationOptions::default();
        let check = check_movement(&pair_one_km_one_hour(), &opts, &MotionPolicy::default());
        assert_eq!(check.unwrap(), MovementCheck::Skipped);
    }

    #[test]
    fn test_skipped_with_single_record() {
        let opts = VerificationOptions::with_speed_bounds(None, Some(1.0));
        let one = vec![rec(0.0, 0, MotionEvidence::NotRequested)];
        let check = check_movement(&one, &opts, &MotionPolicy::default());
        assert_eq!(check.unwrap(), MovementCheck::Skipped);
    }

    #[test]
    fn test_speed_equal_to_bounds_accepted() {
        let opts = VerificationOptions::with_speed_bounds(Some(1.0), Some(20.0));
        let check = check_movement(&pair_one_km_one_hour(), &opts, &MotionPolicy::default());
        match check.unwrap() {
            MovementCheck::Plausible { speed_kmh } => assert!((speed_kmh - 1.0).abs() < 1e-6),
            other => panic!("expected plausible, got {:?}", other),
        }

        let opts = VerificationOptions::with_speed_bounds(Some(0.5), Some(1.0));
        let check = check_movement(&pair_one_km_one_hour(), &opts, &MotionPolicy::default());
        assert!(matches!(check.unwrap(), MovementCheck::Plausible { .. }));
    }

    #[test]
    fn test_too_slow_and_too_fast() {
        let slow = VerificationOptions::with_speed_bounds(Some(2.0), None);
        let check = check_movement(&pair_one_km_one_hour(), &slow, &MotionPolicy::default());
        assert!(matches!(check.unwrap(), MovementCheck::Anomaly(Anomaly::TooSlow { .. })));

        let fast = VerificationOptions::with_speed_bounds(None, Some(0.9));
        let check = check_movement(&pair_one_km_one_hour(), &fast, &MotionPolicy::default());
        assert!(matches!(check.unwrap(), MovementCheck::Anomaly(Anomaly::TooFast { .. })));
    }

    #[test]
    fn test_zero_elapsed_is_error() {
        let opts = VerificationOptions::with_speed_bounds(None, Some(20.0));
        let same_time = vec![
            rec(0.0, 5, MotionEvidence::NotRequested),
            rec(0.01, 5, MotionEvidence::NotRequested),
        ];
        let err = check_movement(&same_time, &opts, &MotionPolicy::default()).unwrap_err();
        assert!(matches!(err, VerifyError::NonPositiveElapsed(0)));
    }

    #[test]
    fn test_sub_millisecond_gap_is_measured() {
        let previous = rec(0.0, 0, MotionEvidence::NotRequested);
        let mut current = rec(0.1, 0, MotionEvidence::NotRequested);
        current.timestamp = previous.timestamp + Duration::microseconds(500);

        let speed = implied_speed_kmh(&previous, &current).unwrap();
        assert!(speed > 1e6, "got {}", speed);

        let opts = VerificationOptions::with_speed_bounds(None, Some(20.0));
        let check = check_movement(&[previous, current], &opts, &MotionPolicy::default());
        assert!(matches!(check.unwrap(), MovementCheck::Anomaly(Anomaly::TooFast { .. })));
    }

    #[test]
    fn test_implausible_motion_is_anomaly() {
        let shaking = MotionSample {
            acceleration: Acceleration { x: 45.0, y: 0.0, z: 9.8 },
            rotation: RotationRate::default(),
            interval: std::time::Duration::from_millis(16),
        };
        let recent = vec![
            rec(0.0, 0, MotionEvidence::NotRequested),
            rec(lat_delta(1000.0), 60, MotionEvidence::Present(shaking)),
        ];
        let mut opts = VerificationOptions::with_speed_bounds(None, Some(20.0));
        opts.require_motion = true;

        let check = check_movement(&recent, &opts, &MotionPolicy::default()).unwrap();
        assert_eq!(check, MovementCheck::Anomaly(Anomaly::ImplausibleMotion));
    }

    #[test]
    fn test_missing_motion_not_penalised() {
        let recent = vec![
            rec(0.0, 0, MotionEvidence::NotRequested),
            rec(lat_delta(1000.0), 60, MotionEvidence::Missing),
        ];
        let mut opts = VerificationOptions::with_speed_bounds(None, Some(20.0));
        opts.require_motion = true;

        let check = check_movement(&recent, &opts, &MotionPolicy::default()).unwrap();
        assert!(matches!(check, MovementCheck::Plausible { .. }));
    }
}
