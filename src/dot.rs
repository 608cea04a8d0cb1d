//! Automaton to DOT (Graphviz) conversion.
//!
//! The generated graph follows these conventions:
//! - **States** are circles labeled with their name and their literals; negated literals are
//!   prefixed with `!`
//! - **Final states** are double circles
//! - **The initial state** is entered by an arrow from an invisible point node
//! - **Current states** are filled, so a dump taken mid-run shows where the monitor stands
//!
//! # Examples
//!
//! ```
//! use ltl_rs::ast::Formula;
//! use ltl_rs::automaton::compile;
//! use ltl_rs::proposition::Proposition;
//!
//! let f = Formula::eventually(Formula::prop(Proposition::new("p")));
//! let automaton = compile(&f).unwrap();
//! let dot = automaton.to_dot().unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("digraph {"));
//! ```

use std::fmt::Write as _;

use crate::automaton::{Automaton, State};
use crate::tableau::Tableau;

/// Configuration options for DOT output generation.
///
/// ```
/// use ltl_rs::dot::DotConfig;
///
/// let config = DotConfig {
///     show_literals: false,
///     ..DotConfig::default()
/// };
/// assert_eq!(config.final_shape, "doublecircle");
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for ordinary states (default: "circle")
    pub state_shape: &'static str,
    /// Shape for final states (default: "doublecircle")
    pub final_shape: &'static str,
    /// Fill color of current states (default: "lightgrey")
    pub current_fill: &'static str,
    /// Whether to list literals under the state name (default: true)
    pub show_literals: bool,
    /// Whether to fill current states (default: true)
    pub highlight_current: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            state_shape: "circle",
            final_shape: "doublecircle",
            current_fill: "lightgrey",
            show_literals: true,
            highlight_current: true,
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn state_label(state: &State, config: &DotConfig) -> String {
    let mut label = escape(state.name());
    if config.show_literals {
        let literals: Vec<String> = state
            .propositions()
            .iter()
            .map(|p| escape(&p.to_string()))
            .chain(state.negated_propositions().iter().map(|p| format!("!{}", escape(&p.to_string()))))
            .collect();
        if !literals.is_empty() {
            label.push_str("\\n");
            label.push_str(&literals.join(", "));
        }
    }
    label
}

impl<S> Automaton<S> {
    /// Converts the automaton to DOT format with the default configuration.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "label=\"{}\";", escape(&self.formula().to_string()))?;
        writeln!(dot, "start [shape=point, style=invis];")?;

        for id in self.ids() {
            let state = self.state(id);
            let shape = if state.is_final() {
                config.final_shape
            } else {
                config.state_shape
            };
            write!(dot, "{} [shape={}, label=\"{}\"", id.index(), shape, state_label(state, config))?;
            if config.highlight_current && self.current_states().contains(&id) {
                write!(dot, ", style=filled, fillcolor={}", config.current_fill)?;
            }
            writeln!(dot, "];")?;
        }

        writeln!(dot, "start -> {};", self.initial_state().index())?;
        for id in self.ids() {
            for succ in self.state(id).out() {
                writeln!(dot, "{} -> {};", id.index(), succ.index())?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

impl Tableau {
    /// Converts the tableau to DOT format, edges drawn along `incoming` (predecessor to node).
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape=box];")?;
        for id in self.ids() {
            let node = self.node(id);
            let satisfied: Vec<String> = node
                .satisfied
                .iter()
                .map(|&eta| escape(&self.arena().to_formula(eta).to_string()))
                .collect();
            writeln!(
                dot,
                "{} [label=\"{}\\n{}\"];",
                id.index(),
                escape(&node.name),
                satisfied.join("\\n")
            )?;
        }
        for id in self.ids() {
            for pred in &self.node(id).incoming {
                writeln!(dot, "{} -> {};", pred.index(), id.index())?;
            }
        }
        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
