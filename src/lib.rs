//! Biotrace - On-device behavioral biometric capture engine
//!
//! Biotrace turns the raw pointer and keyboard events of a login attempt
//! into a compact behavioral fingerprint through a deterministic pipeline:
//! event capture → feature derivation → summary encoding → baseline
//! verification.
//!
//! ## Modules
//!
//! - **Live capture**: [`tracker::BiometricTracker`] attached to an
//!   [`tracker::InputBus`] accumulates a session and yields summaries on
//!   demand
//! - **Offline replay**: [`pipeline::replay_to_summary`] and
//!   [`pipeline::BiometricProcessor`] process recorded session logs and
//!   score them against per-user baselines

pub mod baseline;
pub mod capture;
pub mod encoder;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod schema;
pub mod tracker;
pub mod types;
pub mod verdict;

pub use capture::CaptureSession;
pub use error::CaptureError;
pub use pipeline::{replay_to_summary, BiometricProcessor};
pub use tracker::{BiometricTracker, InputBus, Subscription};

// Schema exports
pub use schema::{InputEvent, RecordedSession, SCHEMA_VERSION};

// Wire-format exports
pub use types::{BiometricSummary, EnvironmentInfo};
pub use verdict::{LoginAttempt, LoginVerdict};

/// Biotrace version embedded in CLI output
pub const BIOTRACE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI output
pub const PRODUCER_NAME: &str = "biotrace";
