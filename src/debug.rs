//! Debug utilities for inspecting tableaux and automata.
//!
//! These are primarily useful in tests and during development.

use std::fmt;
use std::fmt::Write;

use crate::automaton::Automaton;
use crate::tableau::Tableau;
use crate::types::{NodeId, StateId};

/// A tableau node together with the names of its predecessors.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub incoming: Vec<String>,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ name: {}, incoming : {{{}}} }}", self.name, self.incoming.join(", "))
    }
}

/// Detailed information about a single automaton state.
#[derive(Debug, Clone)]
pub struct StateInfo {
    pub id: StateId,
    pub name: String,
    /// Literals of the state, negated ones prefixed with `!`
    pub literals: Vec<String>,
    /// Names of the successors
    pub out: Vec<String>,
    pub is_final: bool,
    pub is_initial: bool,
    pub is_current: bool,
}

impl fmt::Display for StateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        let mut flags = Vec::new();
        if self.is_initial {
            flags.push("initial");
        }
        if self.is_final {
            flags.push("final");
        }
        if self.is_current {
            flags.push("current");
        }
        if !flags.is_empty() {
            write!(f, " ({})", flags.join(", "))?;
        }
        write!(f, " [{}] -> {{{}}}", self.literals.join(", "), self.out.join(", "))
    }
}

impl Tableau {
    pub fn node_info(&self, id: NodeId) -> NodeInfo {
        let node = self.node(id);
        NodeInfo {
            id,
            name: node.name.clone(),
            incoming: node.incoming.iter().map(|&pred| self.node(pred).name.clone()).collect(),
        }
    }

    /// One line per node, in creation order.
    pub fn debug_string(&self) -> String {
        let mut result = String::new();
        for id in self.ids() {
            writeln!(&mut result, "{}", self.node_info(id)).unwrap();
        }
        result
    }
}

impl<S> Automaton<S> {
    pub fn state_info(&self, id: StateId) -> StateInfo {
        let state = self.state(id);
        StateInfo {
            id,
            name: state.name().to_string(),
            literals: state
                .propositions()
                .iter()
                .map(|p| p.to_string())
                .chain(state.negated_propositions().iter().map(|p| format!("!{}", p)))
                .collect(),
            out: state.out().iter().map(|&s| self.state(s).name().to_string()).collect(),
            is_final: state.is_final(),
            is_initial: id == self.initial_state(),
            is_current: self.current_states().contains(&id),
        }
    }

    /// Print a compact listing of every state.
    ///
    /// Format: `name (flags) [literals] -> {successors}`
    pub fn debug_string(&self) -> String {
        let mut result = String::new();
        writeln!(&mut result, "Automaton for {} (states={}):", self.formula(), self.states().len()).unwrap();
        for id in self.ids() {
            writeln!(&mut result, "  {}", self.state_info(id)).unwrap();
        }
        result
    }

    /// Dump the runtime state of the monitor.
    pub fn dump_state(&self) -> String {
        let mut result = String::new();
        let stats = self.stats();

        writeln!(&mut result, "=== Monitor State ===").unwrap();
        writeln!(&mut result, "Current: {:?}", self.current_state_names()).unwrap();
        match self.last_event() {
            Some(event) => writeln!(&mut result, "Last event: {}", event).unwrap(),
            None => writeln!(&mut result, "Last event: none").unwrap(),
        }
        if let Some(timer) = self.pending_timer() {
            writeln!(&mut result, "Pending: {}", timer).unwrap();
        }
        writeln!(
            &mut result,
            "Events: {}, accepted: {}, rejected: {}, triggers fired: {}",
            stats.events, stats.accepted, stats.rejected, stats.triggers_fired
        )
        .unwrap();
        result
    }
}
