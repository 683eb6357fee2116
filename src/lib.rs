//! Trail Verify
//!
//! Scores how likely a GPS position report from an outdoor-activity client
//! is genuine, as a trust value in [0, 1].
//!
//! ## Modules
//!
//! - [`models`] - Positions, history records, options, trust scores, ping payloads
//! - [`verification`] - Validators, per-user history and offline queue, orchestrator
//! - [`db`] - PostgreSQL-backed activity store and motion source
//! - [`config`] - Environment configuration
//! - [`kafka`] / [`processor`] - Ping ingestion

pub mod config;
pub mod db;
pub mod error;
pub mod kafka;
pub mod models;
pub mod processor;
pub mod verification;

pub use error::{Result, VerifyError};
pub use models::{MotionSample, Position, TrustScore, UserId, VerificationOptions};
pub use verification::{VerificationPolicy, Verifier};
