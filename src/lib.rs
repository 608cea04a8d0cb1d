//! # ltl-rs: runtime monitors from LTL formulas
//!
//! **`ltl-rs`** compiles Linear Temporal Logic formulas over discrete events into finite automata
//! and runs them as streaming monitors. Propositions may carry **triggers**, which fire when the
//! monitor passes through a state that requires the proposition. This makes a formula a small
//! reactive program: "on `enter`, start a timer; if the `timeout` comes before `exit`, highlight the
//! element".
//!
//! ## Pipeline
//!
//! ```text
//! Formula --to_nnf--> NNF --create_graph--> Tableau --compile--> Automaton --accept(event)--> triggers
//! ```
//!
//! - **Negation normal form**: negations are pushed down to propositions.
//! - **Tableau**: the formula is unfolded into elementary nodes, each listing what must hold now
//!   and what is deferred to the next event. Equal nodes are folded, which closes loops.
//! - **Automaton**: one state per node. A state is final when it can step into a state with nothing
//!   left to prove.
//! - **Monitor**: every event advances the set of current states. Reaching a final state
//!   (**accept**) or losing every state (**reject**) restarts the monitor from its initial state,
//!   so a monitor watches for repeated occurrences of its property.
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use ltl_rs::ast::Formula;
//! use ltl_rs::automaton::compile;
//! use ltl_rs::event::Event;
//! use ltl_rs::proposition::Proposition;
//!
//! // 1. Propositions, one with a trigger
//! let fired = Rc::new(Cell::new(false));
//! let f = fired.clone();
//! let ack = Proposition::new("ack").with_callback(move |_| f.set(true));
//!
//! // 2. A formula: eventually ack
//! let formula = Formula::eventually(Formula::prop(ack));
//!
//! // 3. Compile and feed events
//! let mut monitor = compile(&formula).unwrap();
//! monitor.accept(Event::new("req"));
//! assert!(!fired.get());
//! monitor.accept(Event::new("ack"));
//! assert!(fired.get());
//! assert_eq!(monitor.stats().accepted, 1);
//! ```
//!
//! ## Core Components
//!
//! - **[`ast`]**: formulas, negation normal form and the hash-consed [`ExprArena`][crate::ast::ExprArena].
//! - **[`tableau`]**: the node graph of a formula.
//! - **[`automaton`]**: compilation and the streaming monitor.
//! - **[`effect`]**: symbolic effects and the [`EffectSink`][crate::effect::EffectSink] a host implements.
//! - **[`dot`]** and **[`debug`]**: visualization and listings.

pub mod ast;
pub mod automaton;
pub mod debug;
pub mod dot;
pub mod effect;
pub mod error;
pub mod event;
pub mod proposition;
pub mod tableau;
pub mod types;

pub use crate::ast::Formula;
pub use crate::automaton::{compile, Automaton, MonitorStats, State};
pub use crate::effect::{Effect, EffectKind, EffectSink, NullSink, RecordingSink, SinkCall, TimerId};
pub use crate::error::FormulaError;
pub use crate::event::{Event, ShapeKey, TriggerContext};
pub use crate::proposition::{Proposition, Trigger};
