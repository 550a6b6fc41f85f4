//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! poultry ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built ledger data and an in-memory service harness
//! - `builders`: Builder patterns for service requests
//! - `database`: PostgreSQL testcontainer with the ledger migrations applied
//! - `assertions`: Custom assertion helpers for service results and invoices
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
