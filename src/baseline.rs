//! Per-user biometric baselines
//!
//! Manages rolling baselines of the four model-facing features and scores a
//! fresh summary against a user's history: per-feature relative similarity
//! under a tolerance, combined into a weighted acceptance score. The first
//! observation for a user enrolls it as the baseline; only accepted attempts
//! update the rolling window afterwards, so rejected attempts cannot drift a
//! profile toward an imposter.

use crate::types::BiometricSummary;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Default rolling window in summaries per user
pub const DEFAULT_BASELINE_WINDOW: usize = 10;

/// Default weighted-score threshold for acceptance
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.7;

/// Allowed relative deviation for the mouse features
pub const MOUSE_SIMILARITY_TOLERANCE: f64 = 0.25;

/// Allowed relative deviation for the keyboard features
pub const KEYBOARD_SIMILARITY_TOLERANCE: f64 = 0.35;

/// The four behavioral features the verdict model consumes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Average pointer velocity (pixels/second)
    pub mouse_velocity: f64,
    /// Total pointer distance (pixels)
    pub mouse_distance: f64,
    /// Average keystroke dwell time (milliseconds)
    pub keystroke_dwell: f64,
    /// Average keystroke flight time (milliseconds)
    pub keystroke_flight: f64,
}

impl From<&BiometricSummary> for FeatureVector {
    fn from(summary: &BiometricSummary) -> Self {
        Self {
            mouse_velocity: summary.mouse.avg_velocity,
            mouse_distance: summary.mouse.total_distance,
            keystroke_dwell: summary.keyboard.avg_dwell_time,
            keystroke_flight: summary.keyboard.avg_flight_time,
        }
    }
}

/// Relative weight of each feature in the acceptance score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub mouse_velocity: f64,
    pub mouse_distance: f64,
    pub keystroke_dwell: f64,
    pub keystroke_flight: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            mouse_velocity: 0.3,
            mouse_distance: 0.3,
            keystroke_dwell: 0.2,
            keystroke_flight: 0.2,
        }
    }
}

/// Per-feature similarity plus the weighted total
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityScore {
    pub mouse_velocity: f64,
    pub mouse_distance: f64,
    pub keystroke_dwell: f64,
    pub keystroke_flight: f64,
    /// Weighted combination of the per-feature similarities (0-1)
    pub weighted: f64,
    /// Whether the weighted score met the acceptance threshold
    pub accepted: bool,
}

/// Outcome of verifying one summary against a user's profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum VerificationOutcome {
    /// First observation for this user: stored as the baseline and accepted
    Enrolled,
    /// Scored against an existing baseline
    Scored(SimilarityScore),
}

impl VerificationOutcome {
    pub fn accepted(&self) -> bool {
        match self {
            VerificationOutcome::Enrolled => true,
            VerificationOutcome::Scored(score) => score.accepted,
        }
    }
}

/// Similarity of a current value to a historical one under a tolerance
///
/// `1 - min(|current - historical| / historical / tolerance, 1)`: identical
/// values score 1.0, a relative deviation at or beyond the tolerance scores
/// 0.0. A zero historical value scores 1.0 (nothing to deviate from yet).
pub fn relative_similarity(current: f64, historical: f64, tolerance: f64) -> f64 {
    if historical == 0.0 {
        return 1.0;
    }
    let deviation = (current - historical).abs() / historical;
    1.0 - (deviation / tolerance).min(1.0)
}

/// Rolling per-user baseline store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricBaselineStore {
    /// Rolling feature vectors per user
    profiles: HashMap<String, VecDeque<FeatureVector>>,
    /// Maximum window size (number of summaries per user)
    window_size: usize,
    /// Feature weights for the acceptance score
    weights: FeatureWeights,
    /// Weighted-score threshold for acceptance
    accept_threshold: f64,
}

impl Default for BiometricBaselineStore {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_WINDOW)
    }
}

impl BiometricBaselineStore {
    /// Create a store with the specified per-user window size
    pub fn new(window_size: usize) -> Self {
        Self {
            profiles: HashMap::new(),
            window_size,
            weights: FeatureWeights::default(),
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
        }
    }

    /// Override the acceptance threshold
    pub fn with_accept_threshold(mut self, threshold: f64) -> Self {
        self.accept_threshold = threshold;
        self
    }

    /// Override the feature weights
    pub fn with_weights(mut self, weights: FeatureWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Verify a summary against the user's baseline, updating the profile
    ///
    /// No profile yet: the summary enrolls as the baseline and the attempt
    /// is accepted. Otherwise the summary is scored against the rolling mean
    /// and appended to the window only when accepted.
    pub fn verify_and_update(
        &mut self,
        username: &str,
        summary: &BiometricSummary,
    ) -> VerificationOutcome {
        let current = FeatureVector::from(summary);

        let Some(baseline) = self.baseline_for(username) else {
            self.push(username, current);
            return VerificationOutcome::Enrolled;
        };

        let score = self.score_against(current, baseline);
        if score.accepted {
            self.push(username, current);
        }
        VerificationOutcome::Scored(score)
    }

    /// Score a summary without touching the stored profile
    pub fn score(&self, username: &str, summary: &BiometricSummary) -> Option<SimilarityScore> {
        let baseline = self.baseline_for(username)?;
        Some(self.score_against(FeatureVector::from(summary), baseline))
    }

    /// Rolling mean of the user's stored feature vectors
    pub fn baseline_for(&self, username: &str) -> Option<FeatureVector> {
        let window = self.profiles.get(username)?;
        if window.is_empty() {
            return None;
        }
        let n = window.len() as f64;
        Some(FeatureVector {
            mouse_velocity: window.iter().map(|v| v.mouse_velocity).sum::<f64>() / n,
            mouse_distance: window.iter().map(|v| v.mouse_distance).sum::<f64>() / n,
            keystroke_dwell: window.iter().map(|v| v.keystroke_dwell).sum::<f64>() / n,
            keystroke_flight: window.iter().map(|v| v.keystroke_flight).sum::<f64>() / n,
        })
    }

    /// Number of users with a stored profile
    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    /// Number of summaries in one user's rolling window
    pub fn session_count(&self, username: &str) -> usize {
        self.profiles.get(username).map_or(0, VecDeque::len)
    }

    /// Drop every stored profile
    pub fn clear(&mut self) {
        self.profiles.clear();
    }

    /// Load a store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn push(&mut self, username: &str, vector: FeatureVector) {
        let window = self.profiles.entry(username.to_string()).or_default();
        window.push_back(vector);
        while window.len() > self.window_size {
            window.pop_front();
        }
    }

    fn score_against(&self, current: FeatureVector, baseline: FeatureVector) -> SimilarityScore {
        let mouse_velocity = relative_similarity(
            current.mouse_velocity,
            baseline.mouse_velocity,
            MOUSE_SIMILARITY_TOLERANCE,
        );
        let mouse_distance = relative_similarity(
            current.mouse_distance,
            baseline.mouse_distance,
            MOUSE_SIMILARITY_TOLERANCE,
        );
        let keystroke_dwell = relative_similarity(
            current.keystroke_dwell,
            baseline.keystroke_dwell,
            KEYBOARD_SIMILARITY_TOLERANCE,
        );
        let keystroke_flight = relative_similarity(
            current.keystroke_flight,
            baseline.keystroke_flight,
            KEYBOARD_SIMILARITY_TOLERANCE,
        );

        let weighted = self.weights.mouse_velocity * mouse_velocity
            + self.weights.mouse_distance * mouse_distance
            + self.weights.keystroke_dwell * keystroke_dwell
            + self.weights.keystroke_flight * keystroke_flight;

        SimilarityScore {
            mouse_velocity,
            mouse_distance,
            keystroke_dwell,
            keystroke_flight,
            weighted,
            accepted: weighted >= self.accept_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeyboardMetrics, MouseMetrics};

    fn make_summary(velocity: f64, distance: f64, dwell: f64, flight: f64) -> BiometricSummary {
        BiometricSummary {
            session_duration: 10_000.0,
            mouse: MouseMetrics {
                movement_count: 40,
                avg_velocity: velocity,
                total_distance: distance,
                movement_pattern: Vec::new(),
            },
            keyboard: KeyboardMetrics {
                keystroke_count: 12,
                avg_dwell_time: dwell,
                avg_flight_time: flight,
                keys_pressed: Vec::new(),
            },
            user_agent: "test".to_string(),
            screen_resolution: "1920x1080".to_string(),
            timestamp: "2024-01-15T14:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_relative_similarity_bounds() {
        // Identical values are a perfect match.
        assert_eq!(relative_similarity(200.0, 200.0, 0.25), 1.0);

        // No history yet: nothing to deviate from.
        assert_eq!(relative_similarity(150.0, 0.0, 0.25), 1.0);

        // Deviation at or beyond the tolerance bottoms out at 0.
        assert_eq!(relative_similarity(250.0, 200.0, 0.25), 0.0);
        assert_eq!(relative_similarity(400.0, 200.0, 0.25), 0.0);

        // Half the tolerance scores 0.5.
        let half = relative_similarity(225.0, 200.0, 0.25);
        assert!((half - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_first_observation_enrolls() {
        let mut store = BiometricBaselineStore::default();
        let outcome = store.verify_and_update("alice", &make_summary(200.0, 3000.0, 110.0, 180.0));

        assert_eq!(outcome, VerificationOutcome::Enrolled);
        assert!(outcome.accepted());
        assert_eq!(store.session_count("alice"), 1);
        assert_eq!(store.profile_count(), 1);
    }

    #[test]
    fn test_matching_attempt_accepted_and_stored() {
        let mut store = BiometricBaselineStore::default();
        store.verify_and_update("alice", &make_summary(200.0, 3000.0, 110.0, 180.0));

        let outcome = store.verify_and_update("alice", &make_summary(205.0, 3100.0, 112.0, 175.0));
        let VerificationOutcome::Scored(score) = outcome else {
            panic!("expected a scored outcome");
        };
        assert!(score.accepted);
        assert!(score.weighted > 0.7);
        assert_eq!(store.session_count("alice"), 2);
    }

    #[test]
    fn test_divergent_attempt_rejected_and_not_stored() {
        let mut store = BiometricBaselineStore::default();
        store.verify_and_update("alice", &make_summary(200.0, 3000.0, 110.0, 180.0));

        // Every feature far outside its tolerance.
        let outcome = store.verify_and_update("alice", &make_summary(900.0, 12000.0, 400.0, 700.0));
        let VerificationOutcome::Scored(score) = outcome else {
            panic!("expected a scored outcome");
        };
        assert!(!score.accepted);
        assert_eq!(score.weighted, 0.0);
        // The rejected vector did not poison the profile.
        assert_eq!(store.session_count("alice"), 1);
    }

    #[test]
    fn test_weighted_score_honors_weights() {
        let mut store = BiometricBaselineStore::default();
        store.verify_and_update("alice", &make_summary(200.0, 3000.0, 110.0, 180.0));

        // Only mouse velocity fully off: its 0.3 weight drops out.
        let score = store
            .score("alice", &make_summary(900.0, 3000.0, 110.0, 180.0))
            .unwrap();
        assert_eq!(score.mouse_velocity, 0.0);
        assert!((score.weighted - 0.7).abs() < 1e-9);

        // Only keystroke dwell fully off: its 0.2 weight drops out.
        let score = store
            .score("alice", &make_summary(200.0, 3000.0, 400.0, 180.0))
            .unwrap();
        assert_eq!(score.keystroke_dwell, 0.0);
        assert!((score.weighted - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_unknown_user_is_none() {
        let store = BiometricBaselineStore::default();
        assert!(store
            .score("nobody", &make_summary(200.0, 3000.0, 110.0, 180.0))
            .is_none());
    }

    #[test]
    fn test_rolling_window_caps_profile() {
        let mut store = BiometricBaselineStore::new(3);

        for velocity in [100.0, 110.0, 120.0, 130.0, 140.0] {
            store.verify_and_update("alice", &make_summary(velocity, 3000.0, 110.0, 180.0));
        }

        assert_eq!(store.session_count("alice"), 3);
        // Only 120, 130, 140 remain in the window.
        let baseline = store.baseline_for("alice").unwrap();
        assert!((baseline.mouse_velocity - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_profiles_are_independent() {
        let mut store = BiometricBaselineStore::default();
        store.verify_and_update("alice", &make_summary(200.0, 3000.0, 110.0, 180.0));
        store.verify_and_update("bob", &make_summary(50.0, 800.0, 240.0, 400.0));

        assert_eq!(store.profile_count(), 2);

        // Alice's pattern scored against Bob's profile fails.
        let score = store
            .score("bob", &make_summary(200.0, 3000.0, 110.0, 180.0))
            .unwrap();
        assert!(!score.accepted);
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut store = BiometricBaselineStore::new(5).with_accept_threshold(0.8);
        store.verify_and_update("alice", &make_summary(200.0, 3000.0, 110.0, 180.0));

        let json = store.to_json().unwrap();
        let loaded = BiometricBaselineStore::from_json(&json).unwrap();

        assert_eq!(loaded.session_count("alice"), 1);
        assert_eq!(loaded.baseline_for("alice"), store.baseline_for("alice"));

        // Threshold survives the round trip.
        let score = loaded
            .score("alice", &make_summary(215.0, 3200.0, 118.0, 195.0))
            .unwrap();
        assert_eq!(score.accepted, score.weighted >= 0.8);
    }

    #[test]
    fn test_clear_drops_profiles() {
        let mut store = BiometricBaselineStore::default();
        store.verify_and_update("alice", &make_summary(200.0, 3000.0, 110.0, 180.0));
        store.clear();

        assert_eq!(store.profile_count(), 0);
        assert!(store.baseline_for("alice").is_none());
    }
}
