//! Location-integrity verification: the validators, the per-user working
//! sets they read from, and the orchestrator that sequences them.

pub mod clock;
pub mod geometry;
pub mod history;
pub mod locks;
pub mod motion;
pub mod offline_queue;
pub mod orchestrator;
pub mod policy;
pub mod proximity;
pub mod speed;

pub use clock::{Clock, SystemClock};
pub use geometry::distance_meters;
pub use history::{HistoryStore, InMemoryHistoryStore};
pub use motion::{MotionPolicy, MotionSource};
pub use offline_queue::{InMemoryOfflineQueue, OfflineQueue};
pub use orchestrator::{Outcome, ReapStats, Verdict, Verifier};
pub use policy::{ScorePolicy, VerificationPolicy};
pub use proximity::{ActivityStore, ProximityPolicy, ProximityScorer};
pub use speed::{Anomaly, MovementCheck};
