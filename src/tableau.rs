//! Tableau construction: unfolding a formula into elementary obligation nodes.
//!
//! Each node records what it still has to process (`pending`), what it has already discharged at
//! the current step (`satisfied`) and what it hands over to its successor (`deferred`). Expanding a
//! node processes one pending obligation at a time:
//!
//! - a literal is discharged (or, for `False`, kills the whole branch),
//! - `a ∧ b` adds both operands to the same node,
//! - `X a` defers `a` to the successor,
//! - `a U b`, `a R b` and `a ∨ b` fork the node in two:
//!
//! ```text
//!               branch 1              branch 1     branch 2
//!               pending               deferred     pending
//! a U b         {a}                   {a U b}      {b}
//! a R b         {b}                   {a R b}      {a, b}
//! a ∨ b         {a}                   -            {b}
//! ```
//!
//! Once nothing is pending the node is elementary. If an elementary node with the same
//! `satisfied` and `deferred` sets already exists, the new one folds into it and its predecessors
//! are merged. Both sets are drawn from the closure of the formula, so the graph stays finite.
//! Otherwise the node is kept and a successor is spawned with
//! the deferred obligations as its pending set.
//!
//! Edges are recorded backwards (`incoming`) while building; the
//! [`Automaton`][crate::automaton::Automaton] compiler turns them around.

use std::collections::{BTreeSet, HashMap};

use log::{debug, trace};

use crate::ast::{Expr, ExprArena, Formula, Idx};
use crate::types::NodeId;

/// Name of the synthetic node every root hangs off.
pub const INIT_NAME: &str = "init";

#[derive(Debug, Clone, Default)]
pub struct TableauNode {
    pub name: String,
    pub incoming: BTreeSet<NodeId>,
    pub pending: BTreeSet<Idx>,
    pub satisfied: BTreeSet<Idx>,
    pub deferred: BTreeSet<Idx>,
}

impl TableauNode {
    fn new(name: String, incoming: BTreeSet<NodeId>, pending: BTreeSet<Idx>) -> Self {
        Self {
            name,
            incoming,
            pending,
            ..Default::default()
        }
    }

    /// Adds `obligations` to `pending`, skipping those already satisfied here.
    fn add_pending(&mut self, obligations: impl IntoIterator<Item = Idx>) {
        for eta in obligations {
            if !self.satisfied.contains(&eta) {
                self.pending.insert(eta);
            }
        }
    }
}

/// Per-compilation generator of human-readable node names.
#[derive(Debug, Default)]
struct NameGen {
    counter: usize,
}

impl NameGen {
    fn fresh(&mut self) -> String {
        self.counter += 1;
        format!("Node_{}", self.counter)
    }
}

/// How one pending obligation is processed.
enum Rule {
    Contradiction,
    Literal,
    Conjunction(Idx, Idx),
    Next(Idx),
    Fork {
        first: Vec<Idx>,
        defer_self: bool,
        second: Vec<Idx>,
    },
}

/// The elementary nodes of a formula, plus the synthetic `init` node.
#[derive(Debug)]
pub struct Tableau {
    arena: ExprArena,
    root: Idx,
    nodes: Vec<TableauNode>,
    init: NodeId,
}

impl Tableau {
    /// Builds the tableau of `formula`.
    ///
    /// The formula is put into negation normal form first; the root node's only obligation is that
    /// normal form, and its only predecessor is `init`.
    pub fn create_graph(formula: &Formula) -> Tableau {
        let mut arena = ExprArena::new();
        let root = arena.intern(&formula.to_nnf());
        debug!("create_graph({}) with {} subformulas", formula, arena.len());

        let init = TableauNode::new(INIT_NAME.to_string(), BTreeSet::new(), BTreeSet::new());
        let mut builder = TableauBuilder {
            arena,
            names: NameGen::default(),
            nodes: vec![init],
            seen: HashMap::new(),
        };
        let init = NodeId::new(0);
        let start = TableauNode::new(
            builder.names.fresh(),
            BTreeSet::from([init]),
            BTreeSet::from([root]),
        );
        builder.expand(start);

        debug!("create_graph: {} nodes", builder.nodes.len());
        Tableau {
            arena: builder.arena,
            root,
            nodes: builder.nodes,
            init,
        }
    }

    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    /// Index of the normal form of the compiled formula.
    pub fn root(&self) -> Idx {
        self.root
    }

    pub fn init(&self) -> NodeId {
        self.init
    }

    pub fn node(&self, id: NodeId) -> &TableauNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[TableauNode] {
        &self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|node| node.name == name).map(NodeId::new)
    }
}

struct TableauBuilder {
    arena: ExprArena,
    names: NameGen,
    /// Elementary nodes found so far, `init` first.
    nodes: Vec<TableauNode>,
    /// `(satisfied, deferred)` of every elementary node except `init`.
    seen: HashMap<(BTreeSet<Idx>, BTreeSet<Idx>), NodeId>,
}

impl TableauBuilder {
    fn rule(&self, eta: Idx) -> Rule {
        match self.arena.get(eta) {
            Expr::Prop(p) if p.is_false() => Rule::Contradiction,
            Expr::Prop(_) => Rule::Literal,
            Expr::Not(inner) => {
                debug_assert!(
                    self.arena.proposition(*inner).is_some(),
                    "negation above a non-literal: formula is not in NNF"
                );
                Rule::Literal
            }
            Expr::And(a, b) => Rule::Conjunction(*a, *b),
            Expr::Next(a) => Rule::Next(*a),
            Expr::Until(a, b) => Rule::Fork {
                first: vec![*a],
                defer_self: true,
                second: vec![*b],
            },
            Expr::Release(a, b) => Rule::Fork {
                first: vec![*b],
                defer_self: true,
                second: vec![*a, *b],
            },
            Expr::Or(a, b) => Rule::Fork {
                first: vec![*a],
                defer_self: false,
                second: vec![*b],
            },
        }
    }

    /// Expands `start` depth-first; the first branch of every fork is finished before the second.
    fn expand(&mut self, start: TableauNode) {
        let mut stack = vec![start];

        while let Some(mut node) = stack.pop() {
            loop {
                let Some(eta) = node.pending.pop_first() else {
                    if let Some(successor) = self.complete(node) {
                        stack.push(successor);
                    }
                    break;
                };

                match self.rule(eta) {
                    Rule::Contradiction => {
                        trace!("{}: contradiction, branch dropped", node.name);
                        break;
                    }
                    Rule::Literal => {
                        node.satisfied.insert(eta);
                    }
                    Rule::Conjunction(a, b) => {
                        node.add_pending([a, b]);
                        node.satisfied.insert(eta);
                    }
                    Rule::Next(a) => {
                        node.satisfied.insert(eta);
                        node.deferred.insert(a);
                    }
                    Rule::Fork {
                        first,
                        defer_self,
                        second,
                    } => {
                        let mut node1 = TableauNode {
                            name: self.names.fresh(),
                            incoming: node.incoming.clone(),
                            pending: node.pending.clone(),
                            satisfied: node.satisfied.clone(),
                            deferred: node.deferred.clone(),
                        };
                        node1.add_pending(first);
                        node1.satisfied.insert(eta);
                        if defer_self {
                            node1.deferred.insert(eta);
                        }

                        let mut node2 = TableauNode {
                            name: self.names.fresh(),
                            incoming: node.incoming,
                            pending: node.pending,
                            satisfied: node.satisfied,
                            deferred: node.deferred,
                        };
                        node2.add_pending(second);
                        node2.satisfied.insert(eta);

                        trace!("fork into {} and {}", node1.name, node2.name);
                        stack.push(node2);
                        stack.push(node1);
                        break;
                    }
                }
            }
        }
    }

    /// Registers an elementary node, or folds it into an equal one.
    ///
    /// Returns the successor placeholder to expand next, if the node is new.
    fn complete(&mut self, node: TableauNode) -> Option<TableauNode> {
        let key = (node.satisfied.clone(), node.deferred.clone());
        if let Some(&existing) = self.seen.get(&key) {
            let target = &mut self.nodes[existing.index()];
            debug!("{} folds into {}", node.name, target.name);
            target.incoming.extend(node.incoming);
            return None;
        }

        let id = NodeId::new(self.nodes.len());
        self.seen.insert(key, id);
        let successor = TableauNode::new(
            self.names.fresh(),
            BTreeSet::from([id]),
            node.deferred.clone(),
        );
        debug!(
            "{} is elementary ({} satisfied, {} deferred), successor {}",
            node.name,
            node.satisfied.len(),
            node.deferred.len(),
            successor.name
        );
        self.nodes.push(node);
        Some(successor)
    }
}
