//! Compiled automata and the streaming monitor that runs them.
//!
//! [`Automaton::compile`] turns a [`Formula`] into a finite automaton through its
//! [`Tableau`]: one [`State`] per elementary node, edges reversed to point forward, and a state
//! marked final when it can step into a "nothing left to prove" sink (a literal-free state looping
//! only on itself).
//!
//! [`Automaton::accept`] then consumes events one at a time. The set of current states is advanced
//! along its out-edges, each candidate state is kept only if the event satisfies its literals, and
//! the triggers of every kept state fire. After each event the run is either
//!
//! - **accepted**: a final state was reached, and the monitor restarts from the initial state;
//! - **rejected**: no state survived, and the monitor restarts from the initial state as well;
//! - still in progress otherwise.
//!
//! Either restart cancels the pending timer. A monitor never gets stuck: after `accept` returns the
//! current state set is never empty.
//!
//! # Examples
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use ltl_rs::ast::Formula;
//! use ltl_rs::automaton::compile;
//! use ltl_rs::event::Event;
//! use ltl_rs::proposition::Proposition;
//!
//! let hits = Rc::new(Cell::new(0));
//! let h = hits.clone();
//! let open = Proposition::new("open").with_callback(move |_| h.set(h.get() + 1));
//! let close = Proposition::new("close");
//!
//! // open, then close right after
//! let formula = Formula::and(Formula::prop(open), Formula::next(Formula::prop(close)));
//! let mut monitor = compile(&formula).unwrap();
//!
//! monitor.accept(Event::new("open"));
//! assert_eq!(hits.get(), 1);
//! monitor.accept(Event::new("close"));
//! assert!(monitor.is_at_initial());
//! assert_eq!(monitor.stats().accepted, 1);
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, trace};

use crate::ast::Formula;
use crate::effect::{Effect, EffectSink, NullSink, TimerId};
use crate::error::FormulaError;
use crate::event::{Event, ShapeKey, TriggerContext, TIMEOUT};
use crate::proposition::{Proposition, Trigger};
use crate::tableau::Tableau;
use crate::types::StateId;

#[derive(Debug, Clone)]
pub struct State {
    name: String,
    out: BTreeSet<StateId>,
    propositions: Vec<Proposition>,
    negated: Vec<Proposition>,
    is_final: bool,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Successor states.
    pub fn out(&self) -> &BTreeSet<StateId> {
        &self.out
    }

    /// Propositions an event must match to enter this state.
    pub fn propositions(&self) -> &[Proposition] {
        &self.propositions
    }

    /// Propositions an event must not match to enter this state.
    pub fn negated_propositions(&self) -> &[Proposition] {
        &self.negated
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Whether this state still proves something positive.
    pub fn has_obligations(&self) -> bool {
        !self.propositions.is_empty()
    }

    pub fn is_satisfied_by(&self, event: &Event) -> bool {
        !self.negated.iter().any(|p| p.matches(event)) && self.propositions.iter().all(|p| p.matches(event))
    }
}

/// Counters over the lifetime of a monitor.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct MonitorStats {
    pub events: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub triggers_fired: u64,
}

/// Compiles `formula` into a monitor whose symbolic effects are discarded.
pub fn compile(formula: &Formula) -> Result<Automaton, FormulaError> {
    Automaton::compile(formula, NullSink::default())
}

pub struct Automaton<S = NullSink> {
    formula: Formula,
    states: Vec<State>,
    initial: StateId,
    current: BTreeSet<StateId>,
    last_event_by_shape: HashMap<ShapeKey, Event>,
    last_event: Option<Event>,
    pending_timer: Option<TimerId>,
    stats: MonitorStats,
    sink: S,
}

impl<S: EffectSink> Automaton<S> {
    /// Compiles `formula`, binding its effects and event subscriptions to `sink`.
    ///
    /// Fails before building anything if triggers are misplaced, see
    /// [`Formula::validate_trigger_placement`].
    pub fn compile(formula: &Formula, sink: S) -> Result<Self, FormulaError> {
        if !formula.validate_trigger_placement() {
            return Err(FormulaError::TriggerPlacementViolation {
                formula: formula.to_string(),
            });
        }
        debug!("compiling {}", formula);
        let tableau = Tableau::create_graph(formula);
        let mut automaton = Self::from_tableau(formula, &tableau, sink);
        automaton.bind();
        Ok(automaton)
    }

    /// Builds the automaton of an already constructed tableau of `formula`.
    ///
    /// No validation and no subscriptions happen here.
    pub fn from_tableau(formula: &Formula, tableau: &Tableau, sink: S) -> Self {
        let arena = tableau.arena();

        let mut states: Vec<State> = tableau
            .nodes()
            .iter()
            .map(|node| State {
                name: node.name.clone(),
                out: BTreeSet::new(),
                propositions: node
                    .satisfied
                    .iter()
                    .filter_map(|&eta| arena.proposition(eta))
                    .filter(|p| !p.is_true())
                    .cloned()
                    .collect(),
                negated: node
                    .satisfied
                    .iter()
                    .filter_map(|&eta| arena.negated_proposition(eta))
                    .cloned()
                    .collect(),
                is_final: false,
            })
            .collect();

        // Node ids and state ids share the same indices.
        for id in tableau.ids() {
            for pred in &tableau.node(id).incoming {
                states[pred.index()].out.insert(StateId::new(id.index()));
            }
        }

        let seeds: BTreeSet<StateId> = states
            .iter()
            .enumerate()
            .filter(|(i, s)| {
                s.propositions.is_empty()
                    && s.negated.is_empty()
                    && s.out.len() == 1
                    && s.out.contains(&StateId::new(*i))
            })
            .map(|(i, _)| StateId::new(i))
            .collect();
        for state in states.iter_mut() {
            state.is_final = !state.out.is_disjoint(&seeds);
        }

        let initial = StateId::new(tableau.init().index());
        debug!(
            "compiled {} states ({} final) for {}",
            states.len(),
            states.iter().filter(|s| s.is_final).count(),
            formula
        );

        Self {
            formula: formula.clone(),
            states,
            initial,
            current: BTreeSet::from([initial]),
            last_event_by_shape: HashMap::new(),
            last_event: None,
            pending_timer: None,
            stats: MonitorStats::default(),
            sink,
        }
    }

    /// Walks the formula as written and subscribes to every distinct event shape once.
    ///
    /// Timeouts come from the sink's own timer, so they are never subscribed to. Symbolic effects need no further binding: they are dispatched through the owned sink when
    /// their proposition fires.
    fn bind(&mut self) {
        let mut shapes = HashSet::new();
        let sink = &mut self.sink;
        self.formula.for_each_proposition(&mut |p| {
            if let Some(Trigger::Effect(effect)) = p.trigger() {
                trace!("{} bound to {:?}", p, effect);
            }
            if p.is_constant() {
                return;
            }
            let shape = p.shape();
            if shape == ShapeKey::new(TIMEOUT, None) {
                return;
            }
            if !shapes.contains(&shape) {
                debug!("subscribing to {}", shape);
                sink.subscribe(&shape);
                shapes.insert(shape);
            }
        });
    }

    /// Advances the monitor by one event.
    pub fn accept(&mut self, event: Event) {
        debug!("received {}", event);
        self.stats.events += 1;
        // The timer that produced this event is spent; a trigger below may start a new one.
        if event.is_timeout() {
            self.pending_timer = None;
        }

        let shape = event.shape();
        let ctx = TriggerContext {
            event: &event,
            previous_same_shape: self.last_event_by_shape.get(&shape).unwrap_or(&event),
            previous_any_shape: self.last_event.as_ref().unwrap_or(&event),
        };

        let candidates: BTreeSet<StateId> = self
            .current
            .iter()
            .flat_map(|&id| self.states[id.index()].out.iter().copied())
            .collect();
        self.current.clear();

        // Triggers fire as soon as a state matches, before narrowing.
        let mut retained = Vec::with_capacity(candidates.len());
        for id in candidates {
            let state = &self.states[id.index()];
            if !state.is_satisfied_by(&event) {
                trace!("{} does not match {}", state.name, event);
                continue;
            }
            for p in &state.propositions {
                if let Some(trigger) = p.trigger() {
                    trace!("{}: firing trigger of {}", state.name, p);
                    fire(trigger, &ctx, &mut self.sink, &mut self.pending_timer);
                    self.stats.triggers_fired += 1;
                }
            }
            retained.push(id);
        }

        if retained.iter().any(|id| self.states[id.index()].has_obligations()) {
            retained.retain(|id| self.states[id.index()].has_obligations());
        }
        self.current.extend(retained);

        if self.current.iter().any(|id| self.states[id.index()].is_final) {
            debug!("{} reached a final state, reset", event);
            self.stats.accepted += 1;
            self.reset();
        } else if self.current.is_empty() {
            debug!("{} rejected, reset", event);
            self.stats.rejected += 1;
            self.reset();
        } else {
            self.last_event_by_shape.insert(shape, event.clone());
            self.last_event = Some(event);
        }

        debug_assert!(!self.current.is_empty(), "monitor lost all current states");
        debug!("current states: {:?}", self.current_state_names());
    }

    fn reset(&mut self) {
        self.current.clear();
        self.current.insert(self.initial);
        self.sink.cancel_pending_timeout();
        self.pending_timer = None;
    }
}

fn fire<S: EffectSink>(
    trigger: &Trigger,
    ctx: &TriggerContext<'_>,
    sink: &mut S,
    pending_timer: &mut Option<TimerId>,
) {
    match trigger {
        Trigger::Callback(f) => f(ctx),
        Trigger::Effect(Effect::StartTimer(delay)) => {
            let id = sink.schedule_timeout(*delay);
            debug!("started {} ({:?})", id, delay);
            *pending_timer = Some(id);
        }
        Trigger::Effect(Effect::Apply { selector, kind }) => sink.apply_effect(selector, kind, ctx),
    }
}

impl<S> Automaton<S> {
    /// The formula this automaton was compiled from, as written.
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.states.len()).map(StateId::new)
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states.iter().position(|s| s.name == name).map(StateId::new)
    }

    pub fn current_states(&self) -> &BTreeSet<StateId> {
        &self.current
    }

    pub fn current_state_names(&self) -> Vec<&str> {
        self.current.iter().map(|id| self.states[id.index()].name.as_str()).collect()
    }

    /// Whether the monitor sits at its initial state, i.e. right after a start, accept or reject.
    pub fn is_at_initial(&self) -> bool {
        self.current.len() == 1 && self.current.contains(&self.initial)
    }

    pub fn last_event(&self) -> Option<&Event> {
        self.last_event.as_ref()
    }

    pub fn last_event_of(&self, shape: &ShapeKey) -> Option<&Event> {
        self.last_event_by_shape.get(shape)
    }

    /// The timer started by the latest `StartTimer` trigger, unless a reset cancelled it.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending_timer
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
