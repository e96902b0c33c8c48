//! Activity scoring: ledger editing and the capped score calculator.
//!
//! # Responsibility
//! - Keep every scoring context (read-only review and editable report) on
//!   one calculator so totals cannot diverge.
//!
//! # Invariants
//! - All operations are pure, synchronous and in-memory.

pub mod calculator;
pub mod ledger;
