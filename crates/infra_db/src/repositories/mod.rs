//! Repository implementations for the ledger tables
//!
//! Each repository reads through the shared session and stages its writes.
//! The `insert`/`update`/`delete` functions of each module are the SQL the
//! unit of work runs when it flushes the staged writes.
//!
//! # Architecture
//!
//! - Runtime-checked `sqlx::query_as` with `FromRow` row types
//! - Reads run on the open transaction, so they see its own writes
//! - Identities are drawn from the table's serial sequence at `add` time

pub mod customers;
pub mod invoices;
pub mod payments;
pub mod truck_loads;
pub mod trucks;

pub use customers::PgCustomers;
pub use invoices::PgInvoices;
pub use payments::PgPayments;
pub use truck_loads::PgTruckLoads;
pub use trucks::PgTrucks;
