//! auth.capture_session.v1 schema definition
//!
//! The recorded-session format: raw interaction events logged by a hosting
//! surface so a capture can be replayed, validated, and summarized offline.
//! Live capture feeds the same [`InputEvent`] values through an
//! [`crate::tracker::InputBus`].

use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current input schema version
pub const SCHEMA_VERSION: &str = "auth.capture_session.v1";

/// Interaction event types captured from a login surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEventType {
    PointerMove,
    KeyDown,
    KeyUp,
}

/// Pointer event data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerData {
    /// Viewport x coordinate (pixels)
    pub x: f64,
    /// Viewport y coordinate (pixels)
    pub y: f64,
    /// Document x coordinate (pixels)
    #[serde(default)]
    pub page_x: f64,
    /// Document y coordinate (pixels)
    #[serde(default)]
    pub page_y: f64,
}

/// Key event data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyData {
    /// Key identifier ("a", "Shift", "Enter", ...)
    pub key: String,
    /// Physical key code ("KeyA", "ShiftLeft", ...)
    #[serde(default)]
    pub code: String,
    /// Whether the event is an auto-repeat of a held key
    #[serde(default)]
    pub repeat: bool,
}

/// An interaction event with timestamp and type-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: InputEventType,
    /// Pointer data (present when event_type is PointerMove)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<PointerData>,
    /// Key data (present when event_type is KeyDown or KeyUp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyData>,
}

impl InputEvent {
    /// Build a pointer-move event
    pub fn pointer_move(timestamp: DateTime<Utc>, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            event_type: InputEventType::PointerMove,
            pointer: Some(PointerData {
                x,
                y,
                page_x: x,
                page_y: y,
            }),
            key: None,
        }
    }

    /// Build a key-down event
    pub fn key_down(
        timestamp: DateTime<Utc>,
        key: impl Into<String>,
        code: impl Into<String>,
        repeat: bool,
    ) -> Self {
        Self {
            timestamp,
            event_type: InputEventType::KeyDown,
            pointer: None,
            key: Some(KeyData {
                key: key.into(),
                code: code.into(),
                repeat,
            }),
        }
    }

    /// Build a key-up event
    pub fn key_up(
        timestamp: DateTime<Utc>,
        key: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            event_type: InputEventType::KeyUp,
            pointer: None,
            key: Some(KeyData {
                key: key.into(),
                code: code.into(),
                repeat: false,
            }),
        }
    }

    /// Check that the payload matches the declared event type
    pub fn validate(&self) -> Result<(), CaptureError> {
        match self.event_type {
            InputEventType::PointerMove => {
                if self.pointer.is_none() {
                    return Err(CaptureError::MissingField(
                        "pointer payload on pointer_move event".to_string(),
                    ));
                }
            }
            InputEventType::KeyDown | InputEventType::KeyUp => match &self.key {
                None => {
                    return Err(CaptureError::MissingField(
                        "key payload on key event".to_string(),
                    ));
                }
                Some(data) if data.key.is_empty() => {
                    return Err(CaptureError::MissingField(
                        "key identifier on key event".to_string(),
                    ));
                }
                Some(_) => {}
            },
        }
        Ok(())
    }
}

/// A recorded capture session: environment plus the raw event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedSession {
    /// Schema version tag
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Unique capture identifier
    pub capture_id: String,
    /// User agent of the recording surface
    pub user_agent: String,
    /// Screen width (pixels)
    pub screen_width: u32,
    /// Screen height (pixels)
    pub screen_height: u32,
    /// When tracking started
    pub started_at: DateTime<Utc>,
    /// Events in arrival order
    pub events: Vec<InputEvent>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl RecordedSession {
    /// Start an empty recording with a fresh capture id
    pub fn new(
        user_agent: impl Into<String>,
        screen_width: u32,
        screen_height: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            capture_id: Uuid::new_v4().to_string(),
            user_agent: user_agent.into(),
            screen_width,
            screen_height,
            started_at,
            events: Vec::new(),
        }
    }
}

/// Parse a recorded session from a JSON document
pub fn parse_session(json: &str) -> Result<RecordedSession, CaptureError> {
    serde_json::from_str(json)
        .map_err(|e| CaptureError::ParseError(format!("Failed to parse recorded session: {}", e)))
}

/// Parse events from newline-delimited JSON (one event per line)
pub fn parse_ndjson(data: &str) -> Result<Vec<InputEvent>, CaptureError> {
    let mut events = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: InputEvent = serde_json::from_str(trimmed).map_err(|e| {
            CaptureError::ParseError(format!("Line {}: {}", line_no + 1, e))
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Parse events from a JSON array
pub fn parse_array(data: &str) -> Result<Vec<InputEvent>, CaptureError> {
    serde_json::from_str(data)
        .map_err(|e| CaptureError::ParseError(format!("Failed to parse event array: {}", e)))
}

/// A single validation failure, pointing at the offending event
#[derive(Debug, Serialize)]
pub struct ValidationFailure {
    /// Index of the event in the input
    pub index: usize,
    /// What was wrong with it
    pub error: String,
}

/// Validate every event, collecting failures instead of stopping at the first
pub fn validate_events(events: &[InputEvent]) -> Vec<ValidationFailure> {
    events
        .iter()
        .enumerate()
        .filter_map(|(index, event)| {
            event.validate().err().map(|e| ValidationFailure {
                index,
                error: e.to_string(),
            })
        })
        .collect()
}
