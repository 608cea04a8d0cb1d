//! Events consumed by a running monitor.
//!
//! An [`Event`] is a named occurrence, optionally attached to a selector (the element, sensor or
//! channel it came from), carrying numeric payload fields. Events of the same name and selector
//! share a [`ShapeKey`], which the monitor uses to remember the most recent occurrence of each
//! kind.

use std::collections::BTreeMap;
use std::fmt;

/// Name of the synthetic event delivered when a scheduled timer expires.
pub const TIMEOUT: &str = "timeout";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    selector: Option<String>,
    fields: BTreeMap<String, f64>,
}

impl Event {
    /// Creates an event without a selector.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "Event name must not be empty");
        Self {
            name,
            selector: None,
            fields: BTreeMap::new(),
        }
    }

    /// Creates an event coming from `selector`.
    pub fn on(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::new(name).with_selector(selector)
    }

    /// The synthetic event delivered when a timer expires.
    pub fn timeout() -> Self {
        Self::new(TIMEOUT)
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied()
    }

    pub fn fields(&self) -> &BTreeMap<String, f64> {
        &self.fields
    }

    pub fn is_timeout(&self) -> bool {
        self.name == TIMEOUT && self.selector.is_none()
    }

    pub fn shape(&self) -> ShapeKey {
        ShapeKey::new(&self.name, self.selector.as_deref())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(selector) => write!(f, "{}:{}", selector, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// The `(name, selector)` pair identifying the kind of an event.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ShapeKey {
    pub name: String,
    pub selector: Option<String>,
}

impl ShapeKey {
    pub fn new(name: &str, selector: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.map(str::to_string),
        }
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(selector) => write!(f, "({}, {})", self.name, selector),
            None => write!(f, "({}, -)", self.name),
        }
    }
}

/// Everything a trigger can observe when it fires.
///
/// When the monitor has not yet recorded an earlier event, both "previous" events are the current
/// event itself, so deltas start at zero.
#[derive(Debug, Copy, Clone)]
pub struct TriggerContext<'a> {
    /// The event being accepted.
    pub event: &'a Event,
    /// The most recent recorded event with the same shape.
    pub previous_same_shape: &'a Event,
    /// The most recent recorded event of any shape.
    pub previous_any_shape: &'a Event,
}

impl<'a> TriggerContext<'a> {
    /// Difference of `key` between the current event and the previous event of any shape.
    pub fn delta(&self, key: &str) -> Option<f64> {
        Some(self.event.field(key)? - self.previous_any_shape.field(key)?)
    }

    /// Difference of `key` between the current event and the previous event of the same shape.
    pub fn delta_same_shape(&self, key: &str) -> Option<f64> {
        Some(self.event.field(key)? - self.previous_same_shape.field(key)?)
    }
}
