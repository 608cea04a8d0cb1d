//! Errors reported while compiling a formula.
//!
//! The running monitor has no error channel: events that do not fit the property simply reset it.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormulaError {
    /// A negated proposition carries a trigger, both operands of an `Until` or `Release` do, or
    /// both operands of an `And` would fire on the same event.
    #[error("misplaced trigger in formula {formula}")]
    TriggerPlacementViolation { formula: String },
}
