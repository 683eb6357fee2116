use crate::config::AppConfig;
use crate::processor::message_processor;
use crate::verification::Verifier;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Counts consecutive broker failures and trips after `max_failures`.
#[derive(Debug)]
pub struct CircuitBreaker {
    max_failures: u32,
    consecutive_failures: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(max_failures: u32, cooldown: Duration) -> Self {
        Self {
            max_failures: max_failures.max(1),
            consecutive_failures: 0,
            cooldown,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Returns the new failure count.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    pub fn is_tripped(&self) -> bool {
        self.consecutive_failures >= self.max_failures
    }

    /// Sleep out the cooldown, then close the breaker again.
    pub async fn cool_down(&mut self) {
        warn!(
            "Circuit breaker tripped ({} consecutive failures)! Sleeping for {:?}...",
            self.consecutive_failures, self.cooldown
        );
        tokio::time::sleep(self.cooldown).await;
        self.consecutive_failures = 0;
        info!("Circuit breaker reset. Resuming consumption.");
    }
}

fn build_consumer(config: &AppConfig) -> anyhow::Result<StreamConsumer> {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &config.kafka_bootstrap_servers)
        .set("group.id", &config.kafka_group_id)
        .set("auto.offset.reset", &config.kafka_auto_offset_reset)
        // SASL Configuration
        .set("security.protocol", &config.kafka_security_protocol)
        .set("sasl.mechanism", &config.kafka_sasl_mechanism)
        .set("sasl.username", &config.kafka_username)
        .set("sasl.password", &config.kafka_password);

    Ok(client_config.create()?)
}

/// Consume location pings and score each one on its own task.
pub async fn start_kafka_consumer(
    config: &AppConfig,
    verifier: Arc<Verifier>,
) -> anyhow::Result<()> {
    info!("Initializing ping consumer for topic: {}", config.kafka_topic);

    let consumer = build_consumer(config)?;
    consumer.subscribe(&[&config.kafka_topic])?;
    info!("Subscribed to topic: {}", config.kafka_topic);

    let mut breaker = CircuitBreaker::new(
        config.kafka_max_retries,
        Duration::from_secs(config.kafka_circuit_breaker_cooldown),
    );

    loop {
        if breaker.is_tripped() {
            breaker.cool_down().await;
        }

        match consumer.recv().await {
            Ok(m) => {
                breaker.record_success();

                let Some(payload) = m.payload() else {
                    warn!("Received empty ping payload");
                    continue;
                };

                let verifier = verifier.clone();
                let payload = payload.to_vec();

                // Per-user ordering is enforced inside the verifier
                tokio::spawn(async move {
                    if let Err(e) = message_processor::process_message(&verifier, &payload).await {
                        error!("Error processing ping: {}", e);
                    }
                });
            }
            Err(e) => {
                let failures = breaker.record_failure();
                error!(
                    "Kafka error: {}. Failure count ({} / {})",
                    e, failures, config.kafka_max_retries
                );

                // Avoid a tight loop on transient network glitches
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }
}
