//! Live tracking: event dispatch and session ownership
//!
//! The original surface wired global listeners straight onto the window and
//! trusted every code path to unhook them. Here the subscription is an owned
//! value: [`InputBus::subscribe`] hands back a [`Subscription`] that detaches
//! on [`Subscription::release`] or on drop, so teardown on any exit path
//! releases the listener and repeated login attempts can never stack
//! duplicates.
//!
//! Everything in this module is single-threaded by design: one tracker is
//! exclusively owned by the login surface that created it, and all dispatch
//! happens on that surface's event thread. Listeners must not call back into
//! the bus they are registered on.

use crate::capture::CaptureSession;
use crate::encoder::SummaryEncoder;
use crate::schema::InputEvent;
use crate::types::{BiometricSummary, EnvironmentInfo};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener = Box<dyn FnMut(&InputEvent)>;

#[derive(Default)]
struct BusInner {
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

/// Single-threaded dispatcher for raw interaction events
///
/// The hosting surface owns one bus per screen and feeds every pointer and
/// key event through [`InputBus::dispatch`]. Cloning the bus clones a handle
/// to the same listener set.
#[derive(Clone, Default)]
pub struct InputBus {
    inner: Rc<RefCell<BusInner>>,
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning the owned handle that detaches it
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, listener));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Fan one event out to every live listener
    pub fn dispatch(&self, event: &InputEvent) {
        let mut inner = self.inner.borrow_mut();
        for (_, listener) in inner.listeners.iter_mut() {
            listener(event);
        }
    }

    /// Number of currently attached listeners
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Owned handle to a bus registration
///
/// Detaches its listener when released or dropped. Releasing after the bus
/// itself is gone is a no-op.
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: u64,
}

impl Subscription {
    /// Detach explicitly; equivalent to dropping the handle
    pub fn release(self) {}

    fn detach(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner
                .borrow_mut()
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

/// The behavioral biometric extractor owned by one login surface
///
/// Wraps a [`CaptureSession`] shared into the bus listener, so the recording
/// closure captures explicit state instead of a self-referential callback
/// object. One tracker per login attempt surface; summaries are pure reads
/// and can be taken at any time without stopping tracking.
pub struct BiometricTracker {
    session: Rc<RefCell<CaptureSession>>,
    encoder: SummaryEncoder,
    subscription: Option<Subscription>,
}

impl BiometricTracker {
    /// Create a tracker for the given host environment; tracking is off
    /// until [`BiometricTracker::start_tracking`]
    pub fn new(environment: EnvironmentInfo) -> Self {
        Self {
            session: Rc::new(RefCell::new(CaptureSession::begin())),
            encoder: SummaryEncoder::new(environment),
            subscription: None,
        }
    }

    /// Reset all accumulators, restart the clock, and begin receiving events
    ///
    /// Idempotent: calling again fully resets state, and any prior
    /// subscription is released before the new one attaches, so listeners
    /// never accumulate across attempts.
    pub fn start_tracking(&mut self, bus: &InputBus) {
        self.start_tracking_at(bus, Utc::now());
    }

    /// [`BiometricTracker::start_tracking`] with an explicit start instant
    pub fn start_tracking_at(&mut self, bus: &InputBus, now: DateTime<Utc>) {
        self.subscription = None;
        self.session.borrow_mut().reset_at(now);

        let session = Rc::clone(&self.session);
        self.subscription = Some(bus.subscribe(Box::new(move |event| {
            session.borrow_mut().record(event);
        })));
    }

    /// Detach from the bus; safe to call when tracking never started
    pub fn stop_tracking(&mut self) {
        self.subscription = None;
    }

    /// Whether a live subscription is attached
    pub fn is_tracking(&self) -> bool {
        self.subscription.is_some()
    }

    /// Clear accumulators and restart the clock without detaching
    ///
    /// Used after a failed attempt so the retry captures a fresh
    /// fingerprint.
    pub fn reset(&mut self) {
        self.session.borrow_mut().reset();
    }

    /// [`BiometricTracker::reset`] with an explicit instant
    pub fn reset_at(&mut self, now: DateTime<Utc>) {
        self.session.borrow_mut().reset_at(now);
    }

    /// Take a summary stamped with the current time
    pub fn summary(&self) -> BiometricSummary {
        self.summary_at(Utc::now())
    }

    /// Take a summary at an explicit instant; pure, repeatable read
    pub fn summary_at(&self, now: DateTime<Utc>) -> BiometricSummary {
        self.encoder.encode_at(&self.session.borrow(), now)
    }

    /// The environment stamped onto summaries
    pub fn environment(&self) -> &EnvironmentInfo {
        self.encoder.environment()
    }
}
