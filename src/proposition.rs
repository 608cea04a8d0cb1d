//! Propositions: the literals of a formula.
//!
//! A [`Proposition`] is a matcher over [`Event`]s. It names an event, optionally restricts the
//! selector it must come from, optionally filters it with a guard predicate, and may carry a
//! [`Trigger`] that fires whenever the monitor discharges the proposition on a matching event.
//!
//! Two names are reserved for the constants: `true` matches every event, `false` matches none.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::effect::Effect;
use crate::event::{Event, ShapeKey, TriggerContext, TIMEOUT};

const TRUE_NAME: &str = "true";
const FALSE_NAME: &str = "false";

/// Filter deciding whether an otherwise matching event counts.
pub type Guard = Rc<dyn Fn(&Event) -> bool>;

/// Side effect attached to a proposition.
#[derive(Clone)]
pub enum Trigger {
    /// Arbitrary code, called with the matching event and its predecessors.
    Callback(Rc<dyn Fn(&TriggerContext<'_>)>),
    /// A symbolic effect executed by the automaton's sink.
    Effect(Effect),
}

impl Trigger {
    pub fn callback(f: impl Fn(&TriggerContext<'_>) + 'static) -> Self {
        Trigger::Callback(Rc::new(f))
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Trigger::Callback(a), Trigger::Callback(b)) => Rc::ptr_eq(a, b),
            (Trigger::Effect(a), Trigger::Effect(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Trigger {}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Callback(cb) => write!(f, "Callback({:p})", Rc::as_ptr(cb)),
            Trigger::Effect(effect) => f.debug_tuple("Effect").field(effect).finish(),
        }
    }
}

impl From<Effect> for Trigger {
    fn from(effect: Effect) -> Self {
        Trigger::Effect(effect)
    }
}

#[derive(Clone)]
pub struct Proposition {
    name: String,
    selector: Option<String>,
    trigger: Option<Trigger>,
    guard: Option<Guard>,
}

impl Proposition {
    /// Creates a proposition matching events named `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or one of the reserved constant names.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "Proposition name must not be empty");
        assert!(
            name != TRUE_NAME && name != FALSE_NAME,
            "Proposition name '{}' is reserved",
            name
        );
        Self::raw(name)
    }

    fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: None,
            trigger: None,
            guard: None,
        }
    }

    /// The constant matching every event.
    pub fn truth() -> Self {
        Self::raw(TRUE_NAME)
    }

    /// The constant matching no event.
    pub fn falsity() -> Self {
        Self::raw(FALSE_NAME)
    }

    /// Matches the synthetic event delivered when a timer expires.
    pub fn timeout() -> Self {
        Self::new(TIMEOUT)
    }

    pub fn on(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_trigger(mut self, trigger: impl Into<Trigger>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn with_callback(self, f: impl Fn(&TriggerContext<'_>) + 'static) -> Self {
        self.with_trigger(Trigger::callback(f))
    }

    pub fn with_guard(mut self, guard: impl Fn(&Event) -> bool + 'static) -> Self {
        self.guard = Some(Rc::new(guard));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        self.trigger.as_ref()
    }

    pub fn has_trigger(&self) -> bool {
        self.trigger.is_some()
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    pub fn is_true(&self) -> bool {
        self.name == TRUE_NAME
    }

    pub fn is_false(&self) -> bool {
        self.name == FALSE_NAME
    }

    pub fn is_constant(&self) -> bool {
        self.is_true() || self.is_false()
    }

    pub fn shape(&self) -> ShapeKey {
        ShapeKey::new(&self.name, self.selector.as_deref())
    }

    /// Does `event` satisfy this proposition?
    pub fn matches(&self, event: &Event) -> bool {
        if self.is_true() {
            return true;
        }
        if self.is_false() {
            return false;
        }
        event.name() == self.name
            && self.selector.as_deref().map_or(true, |s| event.selector() == Some(s))
            && self.guard.as_ref().map_or(true, |guard| guard(event))
    }
}

impl PartialEq for Proposition {
    fn eq(&self, other: &Self) -> bool {
        let same_guard = match (&self.guard, &other.guard) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        self.name == other.name
            && self.selector == other.selector
            && self.trigger == other.trigger
            && same_guard
    }
}

impl Eq for Proposition {}

impl Hash for Proposition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.selector.hash(state);
        self.trigger.is_some().hash(state);
        self.guard.is_some().hash(state);
    }
}

impl fmt::Debug for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proposition")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .field("trigger", &self.trigger)
            .field("guard", &self.guard.is_some())
            .finish()
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_true() {
            return write!(f, "True");
        }
        if self.is_false() {
            return write!(f, "False");
        }
        write!(f, "{}", self.name)?;
        if let Some(selector) = &self.selector {
            write!(f, ":{}", selector)?;
        }
        if self.has_trigger() {
            write!(f, ":Trigger")?;
        }
        Ok(())
    }
}
