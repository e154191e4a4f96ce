//! Core types for the Biotrace capture pipeline
//!
//! This module defines the data that flows through each stage of a capture:
//! raw accumulator entries (pointer samples, keystroke records), the derived
//! aggregate metrics, and the wire-format summary consumed by the verdict
//! service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single pointer position appended while tracking is active
///
/// Insertion order is significant: the sample list defines the pointer path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// Viewport x coordinate (pixels)
    pub x: f64,
    /// Viewport y coordinate (pixels)
    pub y: f64,
    /// Document x coordinate (pixels, includes scroll offset)
    pub page_x: f64,
    /// Document y coordinate (pixels, includes scroll offset)
    pub page_y: f64,
    /// Milliseconds since the session started
    pub elapsed_ms: f64,
}

/// Transient record of a key-down awaiting its matching key-up
///
/// At most one marker is live at a time; each qualifying key-down overwrites
/// the previous one, and the matching key-up consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeydownMarker {
    /// When the key went down
    pub pressed_at: DateTime<Utc>,
    /// Key identifier (e.g. "a")
    pub key: String,
    /// Physical key code (e.g. "KeyA")
    pub code: String,
}

/// A completed keystroke: a matched key-down/key-up pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeRecord {
    /// Key identifier
    pub key: String,
    /// How long the key was held down (milliseconds, never negative)
    pub dwell_ms: f64,
    /// Gap since the previous record was captured (milliseconds, 0 for the
    /// first record of a session)
    pub flight_ms: f64,
    /// When the key-up landed; the canonical basis for flight time
    pub captured_at: DateTime<Utc>,
}

/// One step of the pointer path between two consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementStep {
    /// Horizontal delta (pixels)
    pub dx: f64,
    /// Vertical delta (pixels)
    pub dy: f64,
    /// Time delta (seconds)
    pub dt: f64,
    /// Instantaneous velocity (pixels/second, 0 when `dt` is 0)
    pub velocity: f64,
}

/// Mouse aggregate metrics
///
/// Serialized in camelCase because the verdict service reads the summary
/// that way (`biometrics.mouse.avgVelocity`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseMetrics {
    /// Number of pointer samples recorded since the last reset
    pub movement_count: u32,
    /// Mean of the instantaneous velocities across all steps (pixels/second)
    pub avg_velocity: f64,
    /// Sum of pairwise Euclidean distances (pixels)
    pub total_distance: f64,
    /// Ordered per-step deltas and velocities
    pub movement_pattern: Vec<MovementStep>,
}

impl Default for MouseMetrics {
    fn default() -> Self {
        Self {
            movement_count: 0,
            avg_velocity: 0.0,
            total_distance: 0.0,
            movement_pattern: Vec::new(),
        }
    }
}

/// Keyboard aggregate metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardMetrics {
    /// Number of completed keystrokes since the last reset
    pub keystroke_count: u32,
    /// Mean dwell time (milliseconds, 0 when no keystrokes)
    pub avg_dwell_time: f64,
    /// Mean flight time over records after the first (milliseconds, 0 when
    /// fewer than two keystrokes)
    pub avg_flight_time: f64,
    /// Key identifiers in capture order
    pub keys_pressed: Vec<String>,
}

impl Default for KeyboardMetrics {
    fn default() -> Self {
        Self {
            keystroke_count: 0,
            avg_dwell_time: 0.0,
            avg_flight_time: 0.0,
            keys_pressed: Vec::new(),
        }
    }
}

/// Host environment facts stamped onto each summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// User agent string of the hosting surface
    pub user_agent: String,
    /// Screen width (pixels)
    pub screen_width: u32,
    /// Screen height (pixels)
    pub screen_height: u32,
}

impl EnvironmentInfo {
    pub fn new(user_agent: impl Into<String>, screen_width: u32, screen_height: u32) -> Self {
        Self {
            user_agent: user_agent.into(),
            screen_width,
            screen_height,
        }
    }

    /// Resolution in the `"{width}x{height}"` wire form
    pub fn screen_resolution(&self) -> String {
        format!("{}x{}", self.screen_width, self.screen_height)
    }
}

/// The behavioral fingerprint of one login attempt
///
/// Derived, immutable snapshot: computed on demand from the session
/// accumulators and never mutated afterwards. Forwarded verbatim inside the
/// login request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricSummary {
    /// Elapsed session duration (milliseconds)
    pub session_duration: f64,
    /// Mouse aggregates
    pub mouse: MouseMetrics,
    /// Keyboard aggregates
    pub keyboard: KeyboardMetrics,
    /// User agent string
    pub user_agent: String,
    /// Screen resolution as `"{width}x{height}"`
    pub screen_resolution: String,
    /// RFC 3339 capture timestamp
    pub timestamp: String,
}
