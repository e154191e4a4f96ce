//! Capture session accumulators
//!
//! One [`CaptureSession`] lives for one login attempt. Event feed methods
//! append minimal per-event samples; nothing here computes aggregates (see
//! [`crate::features`]) and nothing here fails: events that do not qualify
//! are dropped silently, because a partial fingerprint is still a valid
//! signal for the verdict service.

use crate::schema::{InputEvent, InputEventType, KeyData, PointerData};
use crate::types::{KeydownMarker, KeystrokeRecord, PointerSample};
use chrono::{DateTime, Utc};

/// Mutable accumulator state for a single login attempt
#[derive(Debug, Clone)]
pub struct CaptureSession {
    started_at: DateTime<Utc>,
    pointer_samples: Vec<PointerSample>,
    keystrokes: Vec<KeystrokeRecord>,
    pending_key: Option<KeydownMarker>,
}

impl CaptureSession {
    /// Start a fresh session clocked from now
    pub fn begin() -> Self {
        Self::begin_at(Utc::now())
    }

    /// Start a fresh session clocked from an explicit instant
    pub fn begin_at(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            pointer_samples: Vec::new(),
            keystrokes: Vec::new(),
            pending_key: None,
        }
    }

    /// Clear all accumulators and restart the clock from now
    pub fn reset(&mut self) {
        self.reset_at(Utc::now());
    }

    /// Clear all accumulators and restart the clock from an explicit instant
    pub fn reset_at(&mut self, started_at: DateTime<Utc>) {
        self.started_at = started_at;
        self.pointer_samples.clear();
        self.keystrokes.clear();
        self.pending_key = None;
    }

    /// Feed one event, dispatching on its type
    ///
    /// Events whose payload does not match their type are dropped.
    pub fn record(&mut self, event: &InputEvent) {
        match event.event_type {
            InputEventType::PointerMove => {
                if let Some(pointer) = &event.pointer {
                    self.record_pointer_move(event.timestamp, pointer);
                }
            }
            InputEventType::KeyDown => {
                if let Some(key) = &event.key {
                    self.record_key_down(event.timestamp, key);
                }
            }
            InputEventType::KeyUp => {
                if let Some(key) = &event.key {
                    self.record_key_up(event.timestamp, key);
                }
            }
        }
    }

    /// Append a pointer sample stamped with elapsed time since start
    pub fn record_pointer_move(&mut self, at: DateTime<Utc>, pointer: &PointerData) {
        self.pointer_samples.push(PointerSample {
            x: pointer.x,
            y: pointer.y,
            page_x: pointer.page_x,
            page_y: pointer.page_y,
            elapsed_ms: ms_between(self.started_at, at).max(0.0),
        });
    }

    /// Store a pending key-down marker, overwriting any unmatched one
    ///
    /// Auto-repeats, empty identifiers, and multi-character identifiers
    /// (control keys like "Shift" or "Enter") carry no timing signal and are
    /// ignored.
    pub fn record_key_down(&mut self, at: DateTime<Utc>, key: &KeyData) {
        if !qualifies_for_timing(key) {
            return;
        }
        self.pending_key = Some(KeydownMarker {
            pressed_at: at,
            key: key.key.clone(),
            code: key.code.clone(),
        });
    }

    /// Complete a keystroke from the pending marker
    ///
    /// A key-up with no pending marker, or whose key differs from the
    /// marker's, produces no record; a mismatch leaves the marker in place
    /// for the key-up that does match it.
    pub fn record_key_up(&mut self, at: DateTime<Utc>, key: &KeyData) {
        let matches = self
            .pending_key
            .as_ref()
            .is_some_and(|marker| marker.key == key.key);
        if !matches {
            return;
        }

        let Some(marker) = self.pending_key.take() else {
            return;
        };
        let dwell_ms = ms_between(marker.pressed_at, at).max(0.0);
        let flight_ms = match self.keystrokes.last() {
            Some(previous) => ms_between(previous.captured_at, at).max(0.0),
            None => 0.0,
        };

        self.keystrokes.push(KeystrokeRecord {
            key: marker.key,
            dwell_ms,
            flight_ms,
            captured_at: at,
        });
    }

    /// When the session started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Milliseconds elapsed between start and `now`
    pub fn elapsed_ms_at(&self, now: DateTime<Utc>) -> f64 {
        ms_between(self.started_at, now).max(0.0)
    }

    /// Pointer samples in capture order
    pub fn pointer_samples(&self) -> &[PointerSample] {
        &self.pointer_samples
    }

    /// Completed keystrokes in capture order
    pub fn keystrokes(&self) -> &[KeystrokeRecord] {
        &self.keystrokes
    }

    /// The unmatched key-down, if one is pending
    pub fn pending_key(&self) -> Option<&KeydownMarker> {
        self.pending_key.as_ref()
    }
}

/// Whether a key-down carries usable dwell/flight timing
fn qualifies_for_timing(key: &KeyData) -> bool {
    !key.repeat && !key.key.is_empty() && key.key.chars().count() == 1
}

/// Signed milliseconds from `a` to `b`
fn ms_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64
}
