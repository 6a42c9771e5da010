//! Declarative policy layer.
//!
//! The evaluator sees rule metadata (`rule_id`, `priority`) and the evidence report of a
//! run. It has no access to the input snapshot: this crate does not depend on anything
//! that could hand it one.

#![forbid(unsafe_code)]

mod engine;
mod evaluate;
mod input;

#[cfg(test)]
mod proptest;

pub use engine::{Declarative, PolicyEngine, PolicyError, parse_verdict};
pub use evaluate::{evaluate, evaluate_input};
pub use input::{PolicyInput, RuleRef};
