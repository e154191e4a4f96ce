//! Summary encoding
//!
//! Assembles the wire-format [`BiometricSummary`] from a capture session's
//! accumulators plus the host environment. Encoding is a pure read of the
//! session: the same state and the same instant always produce the same
//! summary, and tracking never has to stop for a summary to be taken.

use crate::capture::CaptureSession;
use crate::error::CaptureError;
use crate::features::{derive_keyboard_metrics, derive_mouse_metrics};
use crate::types::{BiometricSummary, EnvironmentInfo};
use chrono::{DateTime, Utc};

/// Encoder binding a host environment to the summaries it produces
#[derive(Debug, Clone)]
pub struct SummaryEncoder {
    environment: EnvironmentInfo,
}

impl SummaryEncoder {
    /// Create an encoder for the given host environment
    pub fn new(environment: EnvironmentInfo) -> Self {
        Self { environment }
    }

    /// The environment stamped onto each summary
    pub fn environment(&self) -> &EnvironmentInfo {
        &self.environment
    }

    /// Encode a summary stamped with the current time
    pub fn encode(&self, session: &CaptureSession) -> BiometricSummary {
        self.encode_at(session, Utc::now())
    }

    /// Encode a summary at an explicit instant
    pub fn encode_at(&self, session: &CaptureSession, now: DateTime<Utc>) -> BiometricSummary {
        BiometricSummary {
            session_duration: session.elapsed_ms_at(now),
            mouse: derive_mouse_metrics(session.pointer_samples()),
            keyboard: derive_keyboard_metrics(session.keystrokes()),
            user_agent: self.environment.user_agent.clone(),
            screen_resolution: self.environment.screen_resolution(),
            timestamp: now.to_rfc3339(),
        }
    }

    /// Encode to a pretty JSON string
    pub fn encode_to_json(
        &self,
        session: &CaptureSession,
        now: DateTime<Utc>,
    ) -> Result<String, CaptureError> {
        let summary = self.encode_at(session, now);
        serde_json::to_string_pretty(&summary).map_err(CaptureError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InputEvent, PointerData};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
    }

    fn encoder() -> SummaryEncoder {
        SummaryEncoder::new(EnvironmentInfo::new("Mozilla/5.0 (test)", 1920, 1080))
    }

    fn populated_session() -> CaptureSession {
        let mut session = CaptureSession::begin_at(t0());
        session.record_pointer_move(t0(), &PointerData { x: 0.0, y: 0.0, page_x: 0.0, page_y: 0.0 });
        session.record_pointer_move(
            t0() + Duration::milliseconds(1000),
            &PointerData { x: 3.0, y: 4.0, page_x: 3.0, page_y: 4.0 },
        );
        session.record(&InputEvent::key_down(
            t0() + Duration::milliseconds(1200),
            "a",
            "KeyA",
            false,
        ));
        session.record(&InputEvent::key_up(
            t0() + Duration::milliseconds(1320),
            "a",
            "KeyA",
        ));
        session
    }

    #[test]
    fn test_encode_populated_session() {
        let session = populated_session();
        let now = t0() + Duration::milliseconds(2000);

        let summary = encoder().encode_at(&session, now);

        assert_eq!(summary.session_duration, 2000.0);
        assert_eq!(summary.mouse.movement_count, 2);
        assert_eq!(summary.mouse.avg_velocity, 5.0);
        assert_eq!(summary.keyboard.keystroke_count, 1);
        assert_eq!(summary.keyboard.avg_dwell_time, 120.0);
        assert_eq!(summary.user_agent, "Mozilla/5.0 (test)");
        assert_eq!(summary.screen_resolution, "1920x1080");
        assert_eq!(summary.timestamp, now.to_rfc3339());
    }

    #[test]
    fn test_encode_is_repeatable_and_non_mutating() {
        let session = populated_session();
        let now = t0() + Duration::milliseconds(2000);
        let enc = encoder();

        let first = enc.encode_at(&session, now);
        let second = enc.encode_at(&session, now);
        assert_eq!(first, second);

        // Encoding read nothing destructively.
        assert_eq!(session.pointer_samples().len(), 2);
        assert_eq!(session.keystrokes().len(), 1);
    }

    #[test]
    fn test_encode_fresh_session_yields_zero_defaults() {
        let session = CaptureSession::begin_at(t0());
        let summary = encoder().encode_at(&session, t0());

        assert_eq!(summary.session_duration, 0.0);
        assert_eq!(summary.mouse.movement_count, 0);
        assert_eq!(summary.mouse.avg_velocity, 0.0);
        assert_eq!(summary.keyboard.keystroke_count, 0);
        assert!(summary.keyboard.keys_pressed.is_empty());
    }

    #[test]
    fn test_reset_then_encode_reads_fresh_state() {
        let mut session = populated_session();
        let later = t0() + Duration::milliseconds(3000);
        session.reset_at(later);

        let summary = encoder().encode_at(&session, later);
        assert_eq!(summary.mouse.movement_count, 0);
        assert_eq!(summary.keyboard.keystroke_count, 0);
        assert_eq!(summary.session_duration, 0.0);
    }

    #[test]
    fn test_encode_to_json_wire_shape() {
        let session = populated_session();
        let now = t0() + Duration::milliseconds(2000);

        let json = encoder().encode_to_json(&session, now).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mouse"]["movementCount"], 2);
        assert_eq!(value["keyboard"]["avgDwellTime"], 120.0);
        assert_eq!(value["sessionDuration"], 2000.0);
    }
}
