//! The boundary between a monitor and its host.
//!
//! A compiled [`Automaton`][crate::automaton::Automaton] never touches the outside world directly.
//! Timers, visual or actuator effects and event subscriptions all go through an [`EffectSink`]
//! owned by the automaton. The host (a UI toolkit, a sensor bus, a test harness) implements the
//! trait and feeds events back with [`accept`][crate::automaton::Automaton::accept].
//!
//! Two adapters ship with the crate:
//!
//! - [`NullSink`] ignores every request. Useful when all triggers are plain closures.
//! - [`RecordingSink`] records every call and keeps track of the pending timer, so a driver can
//!   deliver the timeout event itself. Tests and demos use it.

use std::fmt;
use std::time::Duration;

use log::debug;

use crate::event::{Event, ShapeKey, TriggerContext};

/// Handle of a scheduled timer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(id: u64) -> Self {
        TimerId(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// What an effect does to the elements matched by its selector.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum EffectKind {
    AddClass(String),
    RemoveClass(String),
    ToggleClass(String),
    /// Move the target by the pointer delta, clamped to `container`.
    TrackMovement { container: String },
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::AddClass(class) => write!(f, "add-class {}", class),
            EffectKind::RemoveClass(class) => write!(f, "remove-class {}", class),
            EffectKind::ToggleClass(class) => write!(f, "toggle-class {}", class),
            EffectKind::TrackMovement { container } => write!(f, "track-movement in {}", container),
        }
    }
}

/// A symbolic trigger: data describing a side effect, executed through the sink.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Effect {
    /// Schedule a synthetic [`timeout`][crate::event::TIMEOUT] event after the delay.
    StartTimer(Duration),
    /// Apply `kind` to whatever `selector` designates in the host.
    Apply { selector: String, kind: EffectKind },
}

impl Effect {
    pub fn start_timer(delay: Duration) -> Self {
        Effect::StartTimer(delay)
    }

    pub fn add_class(selector: impl Into<String>, class: impl Into<String>) -> Self {
        Effect::Apply {
            selector: selector.into(),
            kind: EffectKind::AddClass(class.into()),
        }
    }

    pub fn remove_class(selector: impl Into<String>, class: impl Into<String>) -> Self {
        Effect::Apply {
            selector: selector.into(),
            kind: EffectKind::RemoveClass(class.into()),
        }
    }

    pub fn toggle_class(selector: impl Into<String>, class: impl Into<String>) -> Self {
        Effect::Apply {
            selector: selector.into(),
            kind: EffectKind::ToggleClass(class.into()),
        }
    }

    pub fn track_movement(selector: impl Into<String>, container: impl Into<String>) -> Self {
        Effect::Apply {
            selector: selector.into(),
            kind: EffectKind::TrackMovement {
                container: container.into(),
            },
        }
    }
}

/// Capabilities a host provides to a running monitor.
pub trait EffectSink {
    /// Schedules a `timeout` event after `delay`.
    ///
    /// At most one timer is pending per monitor: scheduling a new one replaces the previous one.
    fn schedule_timeout(&mut self, delay: Duration) -> TimerId;

    /// Cancels the pending timer, if any.
    fn cancel_pending_timeout(&mut self);

    /// Executes `kind` on the elements designated by `selector`.
    fn apply_effect(&mut self, selector: &str, kind: &EffectKind, ctx: &TriggerContext<'_>);

    /// Registers interest in events of the given shape.
    fn subscribe(&mut self, shape: &ShapeKey);
}

/// A sink that ignores every request.
#[derive(Debug, Default)]
pub struct NullSink {
    next_timer: u64,
}

impl EffectSink for NullSink {
    fn schedule_timeout(&mut self, _delay: Duration) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }

    fn cancel_pending_timeout(&mut self) {}

    fn apply_effect(&mut self, _selector: &str, _kind: &EffectKind, _ctx: &TriggerContext<'_>) {}

    fn subscribe(&mut self, _shape: &ShapeKey) {}
}

/// One request received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Subscribe(ShapeKey),
    Schedule(TimerId, Duration),
    Cancel(Option<TimerId>),
    Apply {
        selector: String,
        kind: EffectKind,
        /// `(dx, dy)` against the previous event of any shape, when both carry coordinates.
        delta: Option<(f64, f64)>,
    },
}

/// A sink that records every request and tracks the single pending timer.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
    pending: Option<(TimerId, Duration)>,
    next_timer: u64,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Returns the recorded calls and forgets them.
    pub fn drain(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn pending_timeout(&self) -> Option<(TimerId, Duration)> {
        self.pending
    }

    /// Treats the pending timer as expired: clears it and returns the event to deliver.
    pub fn expire_pending(&mut self) -> Option<Event> {
        let (id, delay) = self.pending.take()?;
        debug!("{} expired after {:?}", id, delay);
        Some(Event::timeout())
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &ShapeKey> {
        self.calls.iter().filter_map(|call| match call {
            SinkCall::Subscribe(shape) => Some(shape),
            _ => None,
        })
    }
}

impl EffectSink for RecordingSink {
    fn schedule_timeout(&mut self, delay: Duration) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        if let Some((old, _)) = self.pending.replace((id, delay)) {
            debug!("{} replaced by {}", old, id);
        }
        self.calls.push(SinkCall::Schedule(id, delay));
        id
    }

    fn cancel_pending_timeout(&mut self) {
        let cancelled = self.pending.take().map(|(id, _)| id);
        self.calls.push(SinkCall::Cancel(cancelled));
    }

    fn apply_effect(&mut self, selector: &str, kind: &EffectKind, ctx: &TriggerContext<'_>) {
        let delta = ctx.delta("x").zip(ctx.delta("y"));
        self.calls.push(SinkCall::Apply {
            selector: selector.to_string(),
            kind: kind.clone(),
            delta,
        });
    }

    fn subscribe(&mut self, shape: &ShapeKey) {
        self.calls.push(SinkCall::Subscribe(shape.clone()));
    }
}
