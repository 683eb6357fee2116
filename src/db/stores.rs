use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use tracing::warn;

use super::{queries, DbPool};
use crate::error::Result;
use crate::models::{MotionSample, Position, UserId};
use crate::verification::{ActivityStore, MotionSource};

/// Known activity locations read from the application database.
#[derive(Clone)]
pub struct PgActivityStore {
    pool: DbPool,
}

impl PgActivityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    async fn recent_activity_locations(
        &self,
        user: UserId,
        since_days: u32,
    ) -> Result<Vec<Position>> {
        let days = i32::try_from(since_days).unwrap_or(i32::MAX);
        let rows = sqlx::query(queries::SELECT_RECENT_ACTIVITY_LOCATIONS)
            .bind(user.0)
            .bind(days)
            .fetch_all(&self.pool)
            .await?;

        let mut locations = Vec::with_capacity(rows.len());
        for row in rows {
            let lat: f64 = row.try_get("latitude")?;
            let lng: f64 = row.try_get("longitude")?;
            match Position::new(lat, lng) {
                Ok(position) => locations.push(position),
                Err(e) => warn!(user_id = %user, "Skipping stored activity location: {}", e),
            }
        }
        Ok(locations)
    }
}

/// Latest device-motion reading kept on the user's device row.
#[derive(Clone)]
pub struct PgMotionSource {
    pool: DbPool,
    max_age: Duration,
}

impl PgMotionSource {
    pub fn new(pool: DbPool, max_age: Duration) -> Self {
        Self { pool, max_age }
    }
}

/// Decode a stored sample if it was updated within `max_age` of `now`.
pub fn fresh_sample(
    motion_json: Option<&str>,
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Result<Option<MotionSample>> {
    let (Some(json), Some(updated)) = (motion_json, last_updated) else {
        return Ok(None);
    };
    if now - updated >= max_age {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(json)?))
}

#[async_trait]
impl MotionSource for PgMotionSource {
    async fn latest_motion_sample(&self, user: UserId) -> Result<Option<MotionSample>> {
        let row = sqlx::query(queries::SELECT_DEVICE_MOTION)
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let motion_data: Option<String> = row.try_get("motion_data")?;
        let last_updated: Option<DateTime<Utc>> = row.try_get("last_updated")?;

        fresh_sample(motion_data.as_deref(), last_updated, Utc::now(), self.max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{"acceleration":{"x":0.1,"y":0.2,"z":9.7},
                             "rotation":{"alpha":1,"beta":2,"gamma":3},
                             "interval":16}"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 29, 6, 15, 15).unwrap()
    }

    #[test]
    fn test_fresh_sample_decoded() {
        let updated = now() - Duration::seconds(60);
        let sample = fresh_sample(Some(SAMPLE), Some(updated), now(), Duration::seconds(300))
            .unwrap()
            .unwrap();
        assert_eq!(sample.acceleration.z, 9.7);
    }

    #[test]
    fn test_stale_sample_is_absent() {
        let updated = now() - Duration::seconds(300);
        let sample =
            fresh_sample(Some(SAMPLE), Some(updated), now(), Duration::seconds(300)).unwrap();
        assert!(sample.is_none());
    }

    #[test]
    fn test_missing_columns_are_absent() {
        assert!(fresh_sample(None, Some(now()), now(), Duration::seconds(300))
            .unwrap()
            .is_none());
        assert!(fresh_sample(Some(SAMPLE), None, now(), Duration::seconds(300))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let err = fresh_sample(Some("{not json"), Some(now()), now(), Duration::seconds(300))
            .unwrap_err();
        assert!(matches!(err, VerifyError::Decode(_)));
    }
}
