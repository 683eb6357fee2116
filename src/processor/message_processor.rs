use crate::models::message::PingMessage;
use crate::models::TrustScore;
use crate::verification::Verifier;
use tracing::{info, warn};

/// Decode one ping payload and score it. Malformed payloads and invalid
/// coordinates are input errors: they are logged and skipped, never scored.
pub async fn process_message(
    verifier: &Verifier,
    payload: &[u8],
) -> anyhow::Result<Option<TrustScore>> {
    // 1. Parse JSON
    let message: PingMessage = match serde_json::from_slice(payload) {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to parse ping: {}", e);
            return Ok(None);
        }
    };

    // 2. Validate coordinates
    let correlation_id = message.correlation_id();
    let position = match message.position() {
        Ok(p) => p,
        Err(e) => {
            warn!(user_id = %message.user_id, %correlation_id, "Rejecting ping: {}", e);
            return Ok(None);
        }
    };

    // 3. Score
    let verdict = verifier
        .verify_detailed(message.user_id, position, &message.options)
        .await;

    info!(
        user_id = %message.user_id,
        %correlation_id,
        score = %verdict.score,
        offline = message.options.is_offline,
        "Location verified"
    );

    Ok(Some(verdict.score))
}
