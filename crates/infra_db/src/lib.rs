//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL persistence for the poultry ledger,
//! implementing the `domain_ledger` unit-of-work port with SQLx.
//!
//! # Architecture
//!
//! - [`pool`]: connection pool configuration and the embedded migrations
//! - [`repositories`]: one repository per ledger table, reading through a
//!   shared session and staging writes
//! - [`unit_of_work`]: transaction handling and the flush of staged writes
//!
//! The schema lives in the workspace `migrations/` directory: five tables with
//! restrictive foreign keys, unique truck and invoice numbers, and one load
//! per truck per day.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgUnitOfWorkProvider};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/poultry_pos")).await?;
//! run_migrations(&pool).await?;
//! let provider = PgUnitOfWorkProvider::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;
pub mod rows;
pub mod session;
pub mod unit_of_work;

pub use error::{db_to_port_error, DatabaseError};
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use session::SessionHandle;
pub use unit_of_work::{PgUnitOfWork, PgUnitOfWorkProvider};
