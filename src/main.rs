use std::sync::Arc;
use tracing::{debug, info};

use trail_verify::config::AppConfig;
use trail_verify::db::{self, PgActivityStore, PgMotionSource};
use trail_verify::kafka;
use trail_verify::verification::Verifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting Trail Verify location verification service...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");

    let policy = config.verification.clone();
    let verifier = Arc::new(Verifier::new(
        Arc::new(PgActivityStore::new(pool.clone())),
        Arc::new(PgMotionSource::new(pool, policy.motion_max_age)),
        policy,
    ));

    // Reap idle per-user state
    let reaper = verifier.clone();
    let reap_interval = config.reap_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reap_interval);
        loop {
            ticker.tick().await;
            let stats = reaper.reap_idle().await;
            debug!(
                "Reaped {} idle lock slots, {} expired histories, {} stale offline entries",
                stats.slots, stats.histories, stats.queued
            );
        }
    });

    // Start Kafka
    kafka::start_kafka_consumer(&config, verifier).await?;

    Ok(())
}
