//! PostgreSQL unit of work
//!
//! Implements the ledger's [`UnitOfWork`] port over a SQLx pool. The five
//! repositories are built together with the unit of work and share one
//! [`SessionHandle`]; `save_changes` replays the staged writes in order inside
//! the open transaction, or inside a short transaction of its own when none
//! is open.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, PgUnitOfWorkProvider};
//!
//! let pool = create_pool_from_url("postgres://localhost/poultry_pos").await?;
//! let provider = Arc::new(PgUnitOfWorkProvider::new(pool));
//! let invoices = InvoiceService::new(provider, clock);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, warn};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_ledger::ports::{
    CustomerRepository, InvoiceRepository, PaymentRepository, PendingChange, TruckLoadRepository,
    TruckRepository,
};
use domain_ledger::{TransactionState, UnitOfWork, UnitOfWorkProvider};

use crate::error::sql_error;
use crate::repositories::{
    customers, invoices, payments, truck_loads, trucks, PgCustomers, PgInvoices, PgPayments,
    PgTruckLoads, PgTrucks,
};
use crate::session::SessionHandle;

/// One transactional session over the ledger tables
#[derive(Debug)]
pub struct PgUnitOfWork {
    session: SessionHandle,
    state: TransactionState,
    trucks: PgTrucks,
    truck_loads: PgTruckLoads,
    customers: PgCustomers,
    invoices: PgInvoices,
    payments: PgPayments,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        let session = SessionHandle::new(pool);
        Self {
            trucks: PgTrucks::new(session.clone()),
            truck_loads: PgTruckLoads::new(session.clone()),
            customers: PgCustomers::new(session.clone()),
            invoices: PgInvoices::new(session.clone()),
            payments: PgPayments::new(session.clone()),
            session,
            state: TransactionState::NoTransaction,
        }
    }

    async fn flush(&self) -> Result<usize, PortError> {
        let mut guard = self.session.lock().await;
        let changes = guard.pending.take();
        if changes.is_empty() {
            return Ok(0);
        }

        let session = &mut *guard;
        match session.tx.as_mut() {
            Some(tx) => apply_changes(&mut **tx, &changes).await?,
            None => {
                let mut tx = session.pool.begin().await.map_err(sql_error)?;
                apply_changes(&mut *tx, &changes).await?;
                tx.commit().await.map_err(sql_error)?;
            }
        }

        debug!(count = changes.len(), "Flushed staged changes");
        Ok(changes.len())
    }
}

/// Writes staged changes in the order they were staged
async fn apply_changes(conn: &mut PgConnection, changes: &[PendingChange]) -> Result<(), PortError> {
    for change in changes {
        match change {
            PendingChange::AddTruck(truck) => trucks::insert(conn, truck).await?,
            PendingChange::UpdateTruck(truck) => trucks::update(conn, truck).await?,
            PendingChange::AddTruckLoad(load) => truck_loads::insert(conn, load).await?,
            PendingChange::UpdateTruckLoad(load) => truck_loads::update(conn, load).await?,
            PendingChange::RemoveTruckLoad(id) => truck_loads::delete(conn, *id).await?,
            PendingChange::AddCustomer(customer) => customers::insert(conn, customer).await?,
            PendingChange::UpdateCustomer(customer) => customers::update(conn, customer).await?,
            PendingChange::RemoveCustomer(id) => customers::delete(conn, *id).await?,
            PendingChange::AddInvoice(invoice) => invoices::insert(conn, invoice).await?,
            PendingChange::UpdateInvoice(invoice) => invoices::update(conn, invoice).await?,
            PendingChange::RemoveInvoice(id) => invoices::delete(conn, *id).await?,
            PendingChange::AddPayment(payment) => payments::insert(conn, payment).await?,
        }
    }
    Ok(())
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn trucks(&self) -> &dyn TruckRepository {
        &self.trucks
    }

    fn truck_loads(&self) -> &dyn TruckLoadRepository {
        &self.truck_loads
    }

    fn customers(&self) -> &dyn CustomerRepository {
        &self.customers
    }

    fn invoices(&self) -> &dyn InvoiceRepository {
        &self.invoices
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }

    fn transaction_state(&self) -> TransactionState {
        self.state
    }

    async fn begin_transaction(&mut self) -> Result<(), PortError> {
        let next = self.state.begin()?;
        self.session.begin().await?;
        self.state = next;
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<(), PortError> {
        let next = self.state.commit()?;
        match self.session.commit().await {
            Ok(()) => {
                self.state = next;
                Ok(())
            }
            Err(error) => {
                // the transaction is consumed by a failed commit
                self.state = TransactionState::RolledBack;
                Err(error)
            }
        }
    }

    async fn rollback_transaction(&mut self) -> Result<(), PortError> {
        let next = self.state.rollback()?;
        let outcome = self.session.rollback().await;
        self.state = next;
        outcome
    }

    async fn save_changes(&mut self) -> Result<usize, PortError> {
        let outcome = self.flush().await;
        if let Err(error) = &outcome {
            if self.state.is_active() {
                warn!(%error, "Save failed, rolling back transaction");
                if let Err(rollback_error) = self.session.rollback().await {
                    warn!(error = %rollback_error, "Rollback after failed save also failed");
                }
                self.state = TransactionState::RolledBack;
            }
        }
        outcome
    }
}

/// Hands out PostgreSQL units of work over one pool
#[derive(Debug, Clone)]
pub struct PgUnitOfWorkProvider {
    pool: PgPool,
}

impl PgUnitOfWorkProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PgUnitOfWorkProvider {}

#[async_trait]
impl HealthCheckable for PgUnitOfWorkProvider {
    /// Times a `SELECT 1` round trip on the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-ledger-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-ledger-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl UnitOfWorkProvider for PgUnitOfWorkProvider {
    async fn unit_of_work(&self) -> Result<Box<dyn UnitOfWork>, PortError> {
        Ok(Box::new(PgUnitOfWork::new(self.pool.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        // never connects unless a query runs
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/poultry_pos")
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_unit_of_work_has_no_transaction() {
        let uow = PgUnitOfWork::new(lazy_pool());
        assert_eq!(uow.transaction_state(), TransactionState::NoTransaction);
    }

    #[tokio::test]
    async fn test_commit_without_begin_is_rejected() {
        let mut uow = PgUnitOfWork::new(lazy_pool());
        let error = uow.commit_transaction().await.unwrap_err();
        assert_eq!(error.to_string(), "Invalid transaction state: No transaction started");
    }

    #[tokio::test]
    async fn test_saving_nothing_touches_no_connection() {
        let mut uow = PgUnitOfWork::new(lazy_pool());
        assert_eq!(uow.save_changes().await.unwrap(), 0);
    }
}
