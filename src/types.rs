//! Type-safe handles into the tableau and automaton arenas.
//!
//! Both graphs are cyclic, so nodes and states refer to each other by index rather than by
//! ownership. Distinct newtypes keep a tableau node id from being used to index automaton states.
use std::fmt;

/// Index of a node in a [`Tableau`][crate::tableau::Tableau].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Index of a state in an [`Automaton`][crate::automaton::Automaton].
///
/// # Invariants
///
/// - A `StateId` is only meaningful for the automaton that produced it.
/// - State ids are dense: `0..automaton.states().len()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StateId(usize);

impl StateId {
    pub fn new(index: usize) -> Self {
        StateId(index)
    }

    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl From<StateId> for usize {
    fn from(id: StateId) -> Self {
        id.0
    }
}
