//! Process-wide control state shared between interrupt handlers and the
//! main loop.
//!
//! Every field is effectively single-writer: the unit preference is written
//! only by the receive decoder, the cycle-enable flag only by the external
//! command path, the running flag only by the controller, and the pending
//! event set is posted by the acquisition sequencer and drained only by the
//! main loop. That convention is what makes the state safe without locks;
//! the fields are atomics anyway so a preempting handler can never observe
//! a torn value.

use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::acquire::convert::Unit;

/// A unit of deferred work for the main loop.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    /// A completed acquisition left a reading to transmit
    ReadingReady = 0b0000_0001,
}

/// Set of pending events, stored as a bitfield.
///
/// Handlers post events; the main loop is the sole consumer that drains
/// them. The one sanctioned exception is the cycle-disable teardown, which
/// withdraws a pending [`EventKind::ReadingReady`] so no stale transmission
/// follows a disable.
#[derive(Debug)]
pub struct EventSet(AtomicU8);

impl EventSet {
    /// New empty set.
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Mark `kind` pending.
    pub fn post(&self, kind: EventKind) {
        self.0.fetch_or(kind as u8, Ordering::Relaxed);
    }

    /// Consume `kind` if pending. Returns whether it was.
    pub fn take(&self, kind: EventKind) -> bool {
        self.0.fetch_and(!(kind as u8), Ordering::Relaxed) & kind as u8 != 0
    }

    /// Withdraw `kind` without caring whether it was pending.
    pub fn clear(&self, kind: EventKind) {
        self.0.fetch_and(!(kind as u8), Ordering::Relaxed);
    }

    /// Whether `kind` is pending.
    pub fn contains(&self, kind: EventKind) -> bool {
        self.0.load(Ordering::Relaxed) & kind as u8 != 0
    }

    /// Whether any event is pending.
    pub fn any_pending(&self) -> bool {
        self.0.load(Ordering::Relaxed) != 0
    }
}

impl Default for EventSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared mutable state of the telemetry node.
///
/// Designed to live in a `static` and be referenced by the controller, the
/// transport and the interrupt glue alike.
#[derive(Debug)]
pub struct ControlState {
    /// Report unit preference; written only by the receive decoder
    unit_celsius: AtomicBool,

    /// Whether the periodic cycle should keep running; written only by the
    /// external command path
    cycle_enabled: AtomicBool,

    /// Whether the cycle timer is currently active; written only by the
    /// controller
    cycle_running: AtomicBool,

    /// Transmit handshake: set by the tx-empty interrupt handler, cleared
    /// by the sender after writing a byte
    tx_ready: AtomicBool,

    /// Deferred work for the main loop
    events: EventSet,
}

impl ControlState {
    /// New state: Celsius preferred, cycle neither enabled nor running, no
    /// pending work.
    pub const fn new() -> Self {
        Self {
            unit_celsius: AtomicBool::new(true),
            cycle_enabled: AtomicBool::new(false),
            cycle_running: AtomicBool::new(false),
            tx_ready: AtomicBool::new(false),
            events: EventSet::new(),
        }
    }

    /// Current report unit preference.
    pub fn unit(&self) -> Unit {
        if self.unit_celsius.load(Ordering::Relaxed) {
            Unit::Celsius
        } else {
            Unit::Fahrenheit
        }
    }

    /// Set the report unit preference.
    pub fn set_unit(&self, unit: Unit) {
        self.unit_celsius
            .store(matches!(unit, Unit::Celsius), Ordering::Relaxed);
    }

    /// Whether the periodic cycle is requested to run.
    pub fn cycle_enabled(&self) -> bool {
        self.cycle_enabled.load(Ordering::Relaxed)
    }

    /// Request the periodic cycle on or off.
    ///
    /// Turning it off takes effect only at the end of the in-flight
    /// acquisition, never mid-transaction.
    pub fn set_cycle_enabled(&self, enabled: bool) {
        self.cycle_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the cycle timer is currently active.
    pub fn cycle_running(&self) -> bool {
        self.cycle_running.load(Ordering::Relaxed)
    }

    /// Record the cycle timer as active or stopped.
    pub fn set_cycle_running(&self, running: bool) {
        self.cycle_running.store(running, Ordering::Relaxed);
    }

    /// Whether the transmit data register has room for a byte.
    pub fn tx_ready(&self) -> bool {
        self.tx_ready.load(Ordering::Relaxed)
    }

    /// Set or clear the transmit handshake flag.
    pub fn set_tx_ready(&self, ready: bool) {
        self.tx_ready.store(ready, Ordering::Relaxed);
    }

    /// The pending-event set.
    pub fn events(&self) -> &EventSet {
        &self.events
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = ControlState::new();
        assert_eq!(state.unit(), Unit::Celsius);
        assert!(!state.cycle_enabled());
        assert!(!state.cycle_running());
        assert!(!state.tx_ready());
        assert!(!state.events().any_pending());
    }

    #[test]
    fn test_unit_round_trip() {
        let state = ControlState::new();
        state.set_unit(Unit::Fahrenheit);
        assert_eq!(state.unit(), Unit::Fahrenheit);
        state.set_unit(Unit::Celsius);
        assert_eq!(state.unit(), Unit::Celsius);
    }

    #[test]
    fn test_event_post_take() {
        let events = EventSet::new();
        assert!(!events.take(EventKind::ReadingReady));

        events.post(EventKind::ReadingReady);
        assert!(events.contains(EventKind::ReadingReady));
        assert!(events.any_pending());

        // take drains exactly once
        assert!(events.take(EventKind::ReadingReady));
        assert!(!events.take(EventKind::ReadingReady));
        assert!(!events.any_pending());
    }

    #[test]
    fn test_event_post_is_idempotent() {
        let events = EventSet::new();
        events.post(EventKind::ReadingReady);
        events.post(EventKind::ReadingReady);
        assert!(events.take(EventKind::ReadingReady));
        assert!(!events.any_pending());
    }

    #[test]
    fn test_event_clear() {
        let events = EventSet::new();
        events.post(EventKind::ReadingReady);
        events.clear(EventKind::ReadingReady);
        assert!(!events.contains(EventKind::ReadingReady));

        // Clearing an absent event is a no-op
        events.clear(EventKind::ReadingReady);
        assert!(!events.any_pending());
    }

    #[test]
    fn test_static_usable() {
        static STATE: ControlState = ControlState::new();
        STATE.set_cycle_enabled(true);
        assert!(STATE.cycle_enabled());
        STATE.set_cycle_enabled(false);
    }
}
