//! Formula syntax trees.
//!
//! Formulas are built as ordinary boxed trees ([`Formula`]). Before compilation the negation normal
//! form of a formula is interned into an [`ExprArena`], where every distinct subformula lives
//! exactly once and is referred to by an [`Idx`]. Obligation sets in the tableau are sets of
//! indices, so comparing two of them is cheap and structural.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::proposition::Proposition;

/// LTL formula over event propositions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Prop(Proposition),
    Not(Box<Formula>),
    Next(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Until(Box<Formula>, Box<Formula>),
    Release(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn prop(p: Proposition) -> Self {
        Formula::Prop(p)
    }

    pub fn truth() -> Self {
        Formula::Prop(Proposition::truth())
    }

    pub fn falsity() -> Self {
        Formula::Prop(Proposition::falsity())
    }

    pub fn timeout() -> Self {
        Formula::Prop(Proposition::timeout())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(value: Self) -> Self {
        Formula::Not(Box::new(value))
    }

    pub fn next(value: Self) -> Self {
        Formula::Next(Box::new(value))
    }

    pub fn and(lhs: Self, rhs: Self) -> Self {
        Formula::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Self, rhs: Self) -> Self {
        Formula::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn until(lhs: Self, rhs: Self) -> Self {
        Formula::Until(Box::new(lhs), Box::new(rhs))
    }

    pub fn release(lhs: Self, rhs: Self) -> Self {
        Formula::Release(Box::new(lhs), Box::new(rhs))
    }

    /// `F f`, encoded as `True U f`.
    pub fn eventually(value: Self) -> Self {
        Formula::until(Formula::truth(), value)
    }

    /// `G f`, encoded as `False R f`.
    pub fn always(value: Self) -> Self {
        Formula::release(Formula::falsity(), value)
    }

    /// `a → b`, encoded as `¬a ∨ b`.
    pub fn implies(lhs: Self, rhs: Self) -> Self {
        Formula::or(Formula::not(lhs), rhs)
    }
}

impl From<Proposition> for Formula {
    fn from(p: Proposition) -> Self {
        Formula::Prop(p)
    }
}

impl Formula {
    /// Is this a proposition or a directly negated proposition?
    pub fn is_literal(&self) -> bool {
        match self {
            Formula::Prop(_) => true,
            Formula::Not(inner) => matches!(**inner, Formula::Prop(_)),
            _ => false,
        }
    }

    /// Pushes every negation down to the propositions.
    ///
    /// ```text
    /// ¬(a ∧ b) = ¬a ∨ ¬b      ¬(a U b) = ¬a R ¬b      ¬X a = X ¬a
    /// ¬(a ∨ b) = ¬a ∧ ¬b      ¬(a R b) = ¬a U ¬b      ¬¬a  = a
    /// ```
    ///
    /// Negated propositions are left as they are, constants included: `¬True` stays `Not(True)`.
    pub fn to_nnf(&self) -> Formula {
        match self {
            Formula::Prop(_) => self.clone(),
            Formula::Not(inner) => inner.negate_to_nnf(),
            Formula::Next(a) => Formula::next(a.to_nnf()),
            Formula::And(a, b) => Formula::and(a.to_nnf(), b.to_nnf()),
            Formula::Or(a, b) => Formula::or(a.to_nnf(), b.to_nnf()),
            Formula::Until(a, b) => Formula::until(a.to_nnf(), b.to_nnf()),
            Formula::Release(a, b) => Formula::release(a.to_nnf(), b.to_nnf()),
        }
    }

    /// NNF of `¬self`.
    fn negate_to_nnf(&self) -> Formula {
        match self {
            Formula::Prop(_) => Formula::not(self.clone()),
            Formula::Not(inner) => inner.to_nnf(),
            Formula::Next(a) => Formula::next(a.negate_to_nnf()),
            Formula::And(a, b) => Formula::or(a.negate_to_nnf(), b.negate_to_nnf()),
            Formula::Or(a, b) => Formula::and(a.negate_to_nnf(), b.negate_to_nnf()),
            Formula::Until(a, b) => Formula::release(a.negate_to_nnf(), b.negate_to_nnf()),
            Formula::Release(a, b) => Formula::until(a.negate_to_nnf(), b.negate_to_nnf()),
        }
    }

    /// Whether negations only appear directly above propositions.
    pub fn is_nnf(&self) -> bool {
        match self {
            Formula::Prop(_) => true,
            Formula::Not(inner) => matches!(**inner, Formula::Prop(_)),
            Formula::Next(a) => a.is_nnf(),
            Formula::And(a, b) | Formula::Or(a, b) | Formula::Until(a, b) | Formula::Release(a, b) => {
                a.is_nnf() && b.is_nnf()
            }
        }
    }

    /// Does any proposition in this formula carry a trigger?
    pub fn has_trigger(&self) -> bool {
        match self {
            Formula::Prop(p) => p.has_trigger(),
            Formula::Not(a) | Formula::Next(a) => a.has_trigger(),
            Formula::And(a, b) | Formula::Or(a, b) | Formula::Until(a, b) | Formula::Release(a, b) => {
                a.has_trigger() || b.has_trigger()
            }
        }
    }

    /// The steps, counted from the event that starts this formula, on which its triggers can fire.
    fn trigger_steps(&self) -> TriggerSteps {
        match self {
            Formula::Prop(p) if p.has_trigger() => TriggerSteps::at(0),
            Formula::Prop(_) => TriggerSteps::default(),
            Formula::Not(a) => a.trigger_steps(),
            Formula::Next(a) => a.trigger_steps().shifted(),
            Formula::And(a, b) | Formula::Or(a, b) => a.trigger_steps().union(b.trigger_steps()),
            Formula::Until(a, b) | Formula::Release(a, b) => a.trigger_steps().union(b.trigger_steps()).unbounded(),
        }
    }

    /// Checks where triggers are placed.
    ///
    /// - A negated proposition can never fire, so it must not carry a trigger.
    /// - Both operands of an `Or` may carry triggers.
    /// - At most one operand of an `Until` or a `Release` may.
    /// - Both operands of an `And` may, as long as no step exists on which triggers of both could
    ///   fire: `a! ∧ X b!` is accepted, `a! ∧ b!` and `X a! ∧ X b!` are not.
    pub fn validate_trigger_placement(&self) -> bool {
        match self {
            Formula::Prop(_) => true,
            Formula::Not(inner) => match inner.as_ref() {
                Formula::Prop(p) => !p.has_trigger(),
                other => other.validate_trigger_placement(),
            },
            Formula::Next(a) => a.validate_trigger_placement(),
            Formula::Or(a, b) => a.validate_trigger_placement() && b.validate_trigger_placement(),
            Formula::And(a, b) => {
                !a.trigger_steps().overlaps(&b.trigger_steps())
                    && a.validate_trigger_placement()
                    && b.validate_trigger_placement()
            }
            Formula::Until(a, b) | Formula::Release(a, b) => {
                (!b.has_trigger() && a.validate_trigger_placement())
                    || (!a.has_trigger() && b.validate_trigger_placement())
            }
        }
    }

    /// Calls `f` on every proposition, left to right.
    pub fn for_each_proposition<'a>(&'a self, f: &mut impl FnMut(&'a Proposition)) {
        match self {
            Formula::Prop(p) => f(p),
            Formula::Not(a) | Formula::Next(a) => a.for_each_proposition(f),
            Formula::And(a, b) | Formula::Or(a, b) | Formula::Until(a, b) | Formula::Release(a, b) => {
                a.for_each_proposition(f);
                b.for_each_proposition(f);
            }
        }
    }

    /// One layer of the tree, with children left as references.
    fn project(&self) -> Expr<&Formula> {
        match self {
            Formula::Prop(p) => Expr::Prop(p.clone()),
            Formula::Not(a) => Expr::Not(a.as_ref()),
            Formula::Next(a) => Expr::Next(a.as_ref()),
            Formula::And(a, b) => Expr::And(a.as_ref(), b.as_ref()),
            Formula::Or(a, b) => Expr::Or(a.as_ref(), b.as_ref()),
            Formula::Until(a, b) => Expr::Until(a.as_ref(), b.as_ref()),
            Formula::Release(a, b) => Expr::Release(a.as_ref(), b.as_ref()),
        }
    }
}

/// Steps on which triggers can fire: a finite set, plus every step from `from` on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct TriggerSteps {
    exact: BTreeSet<usize>,
    from: Option<usize>,
}

impl TriggerSteps {
    fn at(step: usize) -> Self {
        Self {
            exact: BTreeSet::from([step]),
            from: None,
        }
    }

    fn shifted(self) -> Self {
        Self {
            exact: self.exact.into_iter().map(|k| k + 1).collect(),
            from: self.from.map(|k| k + 1),
        }
    }

    fn union(mut self, other: Self) -> Self {
        self.exact.extend(other.exact);
        self.from = match (self.from, other.from) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self
    }

    /// Under `Until`/`Release` an operand may be due on any later step.
    fn unbounded(self) -> Self {
        let from = self.exact.first().copied().into_iter().chain(self.from).min();
        Self {
            exact: BTreeSet::new(),
            from,
        }
    }

    fn covers(&self, step: usize) -> bool {
        self.exact.contains(&step) || self.from.is_some_and(|k| step >= k)
    }

    fn overlaps(&self, other: &Self) -> bool {
        (self.from.is_some() && other.from.is_some())
            || self.exact.iter().any(|&k| other.covers(k))
            || other.exact.iter().any(|&k| self.covers(k))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Prop(p) => write!(f, "{}", p),
            Formula::Not(a) => write!(f, "Not({})", a),
            Formula::Next(a) => write!(f, "Next({})", a),
            Formula::And(a, b) => write!(f, "({} And {})", a, b),
            Formula::Or(a, b) => write!(f, "({} Or {})", a, b),
            Formula::Until(a, b) => write!(f, "({} Until {})", a, b),
            Formula::Release(a, b) => write!(f, "({} Release {})", a, b),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Idx(usize);

impl Idx {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of an interned formula; children are arena indices.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Expr<I = Idx> {
    Prop(Proposition),
    Not(I),
    Next(I),
    And(I, I),
    Or(I, I),
    Until(I, I),
    Release(I, I),
}

impl<A> Expr<A> {
    #[inline(always)]
    pub fn fmap<B, F>(self, mut f: F) -> Expr<B>
    where
        F: FnMut(A) -> B,
    {
        match self {
            Expr::Prop(p) => Expr::Prop(p),
            Expr::Not(a) => Expr::Not(f(a)),
            Expr::Next(a) => Expr::Next(f(a)),
            Expr::And(a, b) => Expr::And(f(a), f(b)),
            Expr::Or(a, b) => Expr::Or(f(a), f(b)),
            Expr::Until(a, b) => Expr::Until(f(a), f(b)),
            Expr::Release(a, b) => Expr::Release(f(a), f(b)),
        }
    }
}

/// Hash-consed subformulas of one formula.
#[derive(Debug, Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    index: HashMap<Expr, Idx>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, idx: Idx) -> &Expr {
        &self.exprs[idx.0]
    }

    /// Number of distinct subformulas.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Interns `formula` and all its subformulas, children first.
    pub fn intern(&mut self, formula: &Formula) -> Idx {
        let expr = formula.project().fmap(|child| self.intern(child));
        self.insert(expr)
    }

    fn insert(&mut self, expr: Expr) -> Idx {
        if let Some(&idx) = self.index.get(&expr) {
            return idx;
        }
        let idx = Idx(self.exprs.len());
        self.exprs.push(expr.clone());
        self.index.insert(expr, idx);
        idx
    }

    /// The proposition at `idx`, if it is one.
    pub fn proposition(&self, idx: Idx) -> Option<&Proposition> {
        match self.get(idx) {
            Expr::Prop(p) => Some(p),
            _ => None,
        }
    }

    /// The proposition under a negation at `idx`, if it is one.
    pub fn negated_proposition(&self, idx: Idx) -> Option<&Proposition> {
        match self.get(idx) {
            Expr::Not(inner) => self.proposition(*inner),
            _ => None,
        }
    }

    pub fn is_literal(&self, idx: Idx) -> bool {
        self.proposition(idx).is_some() || self.negated_proposition(idx).is_some()
    }

    pub fn is_false(&self, idx: Idx) -> bool {
        self.proposition(idx).is_some_and(Proposition::is_false)
    }

    /// Rebuilds the boxed formula rooted at `idx`.
    pub fn to_formula(&self, idx: Idx) -> Formula {
        match self.get(idx) {
            Expr::Prop(p) => Formula::Prop(p.clone()),
            Expr::Not(a) => Formula::not(self.to_formula(*a)),
            Expr::Next(a) => Formula::next(self.to_formula(*a)),
            Expr::And(a, b) => Formula::and(self.to_formula(*a), self.to_formula(*b)),
            Expr::Or(a, b) => Formula::or(self.to_formula(*a), self.to_formula(*b)),
            Expr::Until(a, b) => Formula::until(self.to_formula(*a), self.to_formula(*b)),
            Expr::Release(a, b) => Formula::release(self.to_formula(*a), self.to_formula(*b)),
        }
    }
}
