use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::motion::MotionEvidence;
use super::position::Position;

/// How a position fix was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    #[default]
    Gps,
    Network,
    Manual,
}

/// A position accepted into a user's history. Never mutated after append.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub position: Position,
    pub timestamp: DateTime<Utc>,
    pub source: LocationSource,
    pub is_offline: bool,
    pub motion: MotionEvidence,
}

impl LocationRecord {
    pub fn live(position: Position, timestamp: DateTime<Utc>, motion: MotionEvidence) -> Self {
        Self {
            position,
            timestamp,
            source: LocationSource::Gps,
            is_offline: false,
            motion,
        }
    }

    /// Record a backlog entry that was captured while the client was offline.
    pub fn replayed(entry: &OfflineQueueEntry) -> Self {
        Self {
            position: entry.position.with_accuracy(entry.metadata.accuracy),
            timestamp: entry.timestamp,
            source: entry.metadata.source,
            is_offline: true,
            motion: MotionEvidence::NotRequested,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QueueMetadata {
    pub accuracy: Option<f64>,
    pub source: LocationSource,
}

/// A ping submitted while disconnected, waiting for the next online call.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineQueueEntry {
    pub position: Position,
    pub timestamp: DateTime<Utc>,
    pub metadata: QueueMetadata,
}

impl OfflineQueueEntry {
    pub fn new(position: Position, timestamp: DateTime<Utc>) -> Self {
        Self {
            position,
            timestamp,
            metadata: QueueMetadata {
                accuracy: position.accuracy(),
                source: LocationSource::Gps,
            },
        }
    }
}
