pub mod message;
pub mod motion;
pub mod options;
pub mod position;
pub mod record;
pub mod score;

pub use motion::{Acceleration, MotionEvidence, MotionSample, RotationRate};
pub use options::VerificationOptions;
pub use position::{Position, UserId};
pub use record::{LocationRecord, LocationSource, OfflineQueueEntry, QueueMetadata};
pub use score::TrustScore;
