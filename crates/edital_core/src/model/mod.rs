//! Domain model for notices, activity catalogs and project ledgers.
//!
//! # Responsibility
//! - Define canonical data structures used by scoring and persistence.
//! - Keep catalog editing rules next to the catalog data.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Deletion is an explicit lifecycle state, not a hard delete.

pub mod catalog;
pub mod notice;
pub mod project;
