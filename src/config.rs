use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::verification::{MotionPolicy, ProximityPolicy, ScorePolicy, VerificationPolicy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub kafka_bootstrap_servers: String,
    pub kafka_topic: String,
    pub kafka_group_id: String,
    pub kafka_auto_offset_reset: String,
    pub kafka_sasl_mechanism: String,
    pub kafka_username: String,
    pub kafka_password: String,
    pub kafka_security_protocol: String,
    pub kafka_max_retries: u32,
    pub kafka_circuit_breaker_cooldown: u64,
    pub database_url: String,
    pub log_level: String,
    pub reap_interval: Duration,
    pub verification: VerificationPolicy,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let kafka_bootstrap_servers =
            env::var("KAFKA_BOOTSTRAP_SERVERS").unwrap_or_else(|_| "localhost:9092".to_string());
        let kafka_topic = env::var("KAFKA_TOPIC").unwrap_or_else(|_| "location-pings".to_string());
        let kafka_group_id =
            env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| "trail-verify".to_string());
        let kafka_auto_offset_reset =
            env::var("KAFKA_AUTO_OFFSET_RESET").unwrap_or_else(|_| "latest".to_string());
        let kafka_sasl_mechanism =
            env::var("KAFKA_SASL_MECHANISM").unwrap_or_else(|_| "SCRAM-SHA-256".to_string());
        let kafka_username = env::var("KAFKA_USERNAME").unwrap_or_default();
        let kafka_password = env::var("KAFKA_PASSWORD").unwrap_or_default();
        let kafka_security_protocol =
            env::var("KAFKA_SECURITY_PROTOCOL").unwrap_or_else(|_| "SASL_PLAINTEXT".to_string());
        let kafka_max_retries = env_or("KAFKA_MAX_RETRIES", 5);
        let kafka_circuit_breaker_cooldown = env_or("KAFKA_CIRCUIT_BREAKER_COOLDOWN", 300);

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "trailquest".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "trailquest".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "trailquest".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let reap_interval = Duration::from_secs(env_or("VERIFY_REAP_INTERVAL_SECS", 300u64).max(1));

        Ok(Self {
            kafka_bootstrap_servers,
            kafka_topic,
            kafka_group_id,
            kafka_auto_offset_reset,
            kafka_sasl_mechanism,
            kafka_username,
            kafka_password,
            kafka_security_protocol,
            kafka_max_retries,
            kafka_circuit_breaker_cooldown,
            database_url,
            log_level,
            reap_interval,
            verification: Self::load_policy(),
        })
    }

    /// Verification tunables. Unset or unparsable values keep their defaults.
    fn load_policy() -> VerificationPolicy {
        let defaults = VerificationPolicy::default();
        let motion = MotionPolicy::default();
        let proximity = ProximityPolicy::default();

        VerificationPolicy {
            scores: ScorePolicy::default(),
            motion: MotionPolicy {
                max_accel_xy: env_or("VERIFY_MAX_ACCEL_XY", motion.max_accel_xy),
                max_accel_z: env_or("VERIFY_MAX_ACCEL_Z", motion.max_accel_z),
                max_rotation: env_or("VERIFY_MAX_ROTATION", motion.max_rotation),
            },
            proximity: ProximityPolicy {
                decay_meters: env_or("VERIFY_PROXIMITY_DECAY_METERS", proximity.decay_meters),
                lookback_days: env_or("VERIFY_LOOKBACK_DAYS", proximity.lookback_days),
            },
            history_window: chrono::Duration::hours(env_or("VERIFY_HISTORY_WINDOW_HOURS", 24)),
            offline_queue_max: env_or("VERIFY_OFFLINE_QUEUE_MAX", defaults.offline_queue_max),
            store_timeout: Duration::from_millis(env_or("VERIFY_STORE_TIMEOUT_MS", 2000)),
            motion_max_age: chrono::Duration::seconds(env_or("VERIFY_MOTION_MAX_AGE_SECS", 300)),
            user_idle: Duration::from_secs(env_or("VERIFY_USER_IDLE_SECS", 3600)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("TRAIL_VERIFY_TEST_NUMBER", "not-a-number");
        assert_eq!(env_or("TRAIL_VERIFY_TEST_NUMBER", 7u32), 7);
        env::set_var("TRAIL_VERIFY_TEST_NUMBER", " 12 ");
        assert_eq!(env_or("TRAIL_VERIFY_TEST_NUMBER", 7u32), 12);
        assert_eq!(env_or("TRAIL_VERIFY_TEST_UNSET", 2.5f64), 2.5);
    }
}
