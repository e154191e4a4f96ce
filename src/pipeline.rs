//! Pipeline orchestration
//!
//! The public API for offline processing: replay a recorded session into a
//! wire summary, and optionally score it against per-user baselines with the
//! stateful [`BiometricProcessor`].

use crate::baseline::{BiometricBaselineStore, VerificationOutcome};
use crate::capture::CaptureSession;
use crate::encoder::SummaryEncoder;
use crate::error::CaptureError;
use crate::schema::{parse_session, RecordedSession};
use crate::types::{BiometricSummary, EnvironmentInfo};

/// Replay a recorded session into its biometric summary
///
/// The summary is stamped at the last event's timestamp (the recording start
/// when the log is empty), so replaying the same log always yields the same
/// summary.
pub fn replay_summary(session: &RecordedSession) -> BiometricSummary {
    // Stage 1: rebuild the accumulators by feeding every event through a
    // fresh capture session
    let mut capture = CaptureSession::begin_at(session.started_at);
    for event in &session.events {
        capture.record(event);
    }

    // Stage 2: encode with the recorded environment
    let environment = EnvironmentInfo::new(
        session.user_agent.clone(),
        session.screen_width,
        session.screen_height,
    );
    let now = session
        .events
        .last()
        .map(|event| event.timestamp)
        .unwrap_or(session.started_at);

    SummaryEncoder::new(environment).encode_at(&capture, now)
}

/// Convert recorded-session JSON to summary JSON (stateless, one-shot)
pub fn replay_to_summary(session_json: &str) -> Result<String, CaptureError> {
    let session = parse_session(session_json)?;
    let summary = replay_summary(&session);
    serde_json::to_string_pretty(&summary).map_err(CaptureError::JsonError)
}

/// A replayed attempt with its baseline verification outcome
#[derive(Debug, Clone, serde::Serialize)]
pub struct AttemptAnalysis {
    pub summary: BiometricSummary,
    pub outcome: VerificationOutcome,
}

/// Stateful processor maintaining per-user baselines across attempts
pub struct BiometricProcessor {
    baselines: BiometricBaselineStore,
}

impl Default for BiometricProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl BiometricProcessor {
    /// Create a processor with the default per-user baseline window
    pub fn new() -> Self {
        Self {
            baselines: BiometricBaselineStore::default(),
        }
    }

    /// Create a processor with a specific per-user window size
    pub fn with_baseline_window(summaries: usize) -> Self {
        Self {
            baselines: BiometricBaselineStore::new(summaries),
        }
    }

    /// Replay a recorded session and verify it against the user's baseline
    pub fn process(
        &mut self,
        username: &str,
        session_json: &str,
    ) -> Result<AttemptAnalysis, CaptureError> {
        let session = parse_session(session_json)?;
        let summary = replay_summary(&session);
        let outcome = self.baselines.verify_and_update(username, &summary);
        Ok(AttemptAnalysis { summary, outcome })
    }

    /// Save baseline state to JSON for persistence
    pub fn save_baselines(&self) -> Result<String, CaptureError> {
        self.baselines
            .to_json()
            .map_err(|e| CaptureError::EncodingError(e.to_string()))
    }

    /// Load baseline state from JSON
    pub fn load_baselines(&mut self, json: &str) -> Result<(), CaptureError> {
        self.baselines = BiometricBaselineStore::from_json(json)
            .map_err(|e| CaptureError::BaselineError(e.to_string()))?;
        Ok(())
    }

    /// Number of users with a stored baseline profile
    pub fn profile_count(&self) -> usize {
        self.baselines.profile_count()
    }

    /// Number of summaries in one user's rolling window
    pub fn session_count(&self, username: &str) -> usize {
        self.baselines.session_count(username)
    }

    /// Drop all baseline data
    pub fn clear_baselines(&mut self) {
        self.baselines.clear();
    }
}
