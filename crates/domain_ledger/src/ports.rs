//! Ledger Domain Ports
//!
//! This module defines the persistence interfaces the ledger services work
//! against: one repository per entity, grouped in a [`UnitOfWork`] that owns
//! a single transactional session.
//!
//! # Architecture
//!
//! - Repositories read immediately and **stage** writes; `add` assigns the
//!   identity of the new row right away so that dependent rows can refer to it
//! - [`UnitOfWork::save_changes`] flushes every staged write atomically
//! - [`UnitOfWork::begin_transaction`] widens the atomic scope to reads and
//!   several flushes; commit or rollback ends it
//! - A failing flush inside an active transaction rolls the transaction back
//!   before the error is returned
//!
//! Adapters:
//!
//! - **PostgreSQL**: `infra_db::PgUnitOfWorkProvider`
//! - **In-memory**: [`memory::MemoryUnitOfWorkProvider`] for tests
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut uow = provider.unit_of_work().await?;
//! uow.begin_transaction().await?;
//! let mut customer = uow.customers().get(customer_id).await?.unwrap();
//! customer.total_debt += final_amount;
//! uow.customers().update(customer).await?;
//! uow.save_changes().await?;
//! uow.commit_transaction().await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{
    CustomerId, DateRange, DomainPort, HealthCheckable, InvoiceId, PortError, TruckId, TruckLoadId,
};

use crate::customer::Customer;
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::truck::{Truck, TruckLoad};

#[cfg(any(test, feature = "mock"))]
pub mod memory;

/// Transaction state of a unit of work
///
/// `NoTransaction -> Active -> (Committed | RolledBack)`; a finished
/// transaction behaves like `NoTransaction` and a new one may begin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    #[default]
    NoTransaction,
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    /// State after beginning a transaction
    pub fn begin(self) -> Result<Self, PortError> {
        match self {
            TransactionState::Active => Err(PortError::invalid_transaction("Transaction already started")),
            _ => Ok(TransactionState::Active),
        }
    }

    /// State after committing
    pub fn commit(self) -> Result<Self, PortError> {
        match self {
            TransactionState::Active => Ok(TransactionState::Committed),
            _ => Err(PortError::invalid_transaction("No transaction started")),
        }
    }

    /// State after rolling back
    pub fn rollback(self) -> Result<Self, PortError> {
        match self {
            TransactionState::Active => Ok(TransactionState::RolledBack),
            _ => Err(PortError::invalid_transaction("No transaction started")),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }
}

/// A write staged by a repository, applied by `save_changes`
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    AddTruck(Truck),
    UpdateTruck(Truck),
    AddTruckLoad(TruckLoad),
    UpdateTruckLoad(TruckLoad),
    RemoveTruckLoad(TruckLoadId),
    AddCustomer(Customer),
    UpdateCustomer(Customer),
    RemoveCustomer(CustomerId),
    AddInvoice(Invoice),
    UpdateInvoice(Invoice),
    RemoveInvoice(InvoiceId),
    AddPayment(Payment),
}

/// Ordered list of staged writes
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<PendingChange>,
}

impl ChangeSet {
    pub fn push(&mut self, change: PendingChange) {
        self.changes.push(change);
    }

    /// Removes and returns every staged write
    pub fn take(&mut self) -> Vec<PendingChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Trucks
#[async_trait]
pub trait TruckRepository: Send + Sync {
    async fn get(&self, id: TruckId) -> Result<Option<Truck>, PortError>;

    async fn find_by_number(&self, truck_number: &str) -> Result<Option<Truck>, PortError>;

    /// Active trucks ordered by number
    async fn list_active(&self) -> Result<Vec<Truck>, PortError>;

    /// Active trucks that have a load on the date, ordered by number
    async fn list_with_loads_on(&self, date: NaiveDate) -> Result<Vec<Truck>, PortError>;

    /// Stages a new truck and returns it with its identity
    async fn add(&self, truck: Truck) -> Result<Truck, PortError>;

    async fn update(&self, truck: Truck) -> Result<(), PortError>;
}

/// Truck loads
#[async_trait]
pub trait TruckLoadRepository: Send + Sync {
    async fn get(&self, id: TruckLoadId) -> Result<Option<TruckLoad>, PortError>;

    /// The load of a truck on a date, if any
    async fn find_for_truck_on(&self, truck_id: TruckId, date: NaiveDate) -> Result<Option<TruckLoad>, PortError>;

    /// Loads of every truck on a date
    async fn list_on(&self, date: NaiveDate) -> Result<Vec<TruckLoad>, PortError>;

    /// Loads of one truck, newest first
    async fn list_for_truck(&self, truck_id: TruckId) -> Result<Vec<TruckLoad>, PortError>;

    async fn add(&self, load: TruckLoad) -> Result<TruckLoad, PortError>;

    async fn update(&self, load: TruckLoad) -> Result<(), PortError>;

    async fn remove(&self, id: TruckLoadId) -> Result<(), PortError>;
}

/// Customers
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, PortError>;

    /// Reads a customer and, inside a transaction, holds its row until the
    /// transaction ends so concurrent debt updates apply one after another
    async fn get_for_update(&self, id: CustomerId) -> Result<Option<Customer>, PortError>;

    /// Active customers ordered by name
    async fn list_active(&self) -> Result<Vec<Customer>, PortError>;

    /// Active customers owing money, largest debt first
    async fn list_with_debt(&self) -> Result<Vec<Customer>, PortError>;

    /// An active customer whose trimmed, lower-cased name equals `normalized_name`
    async fn find_active_by_name(
        &self,
        normalized_name: &str,
        exclude: Option<CustomerId>,
    ) -> Result<Option<Customer>, PortError>;

    /// Active customers whose name or phone contains the term
    async fn search(&self, term: &str) -> Result<Vec<Customer>, PortError>;

    async fn add(&self, customer: Customer) -> Result<Customer, PortError>;

    async fn update(&self, customer: Customer) -> Result<(), PortError>;

    async fn remove(&self, id: CustomerId) -> Result<(), PortError>;
}

/// Invoices
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError>;

    /// Greatest invoice number starting with the prefix
    async fn last_number_with_prefix(&self, prefix: &str) -> Result<Option<String>, PortError>;

    /// Invoices dated within the range, by date then number
    async fn list_by_date_range(&self, range: DateRange) -> Result<Vec<Invoice>, PortError>;

    /// Invoices of a customer, optionally bounded by date, by date then number
    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, PortError>;

    /// Invoices of a truck on a date
    async fn list_for_truck_on(&self, truck_id: TruckId, date: NaiveDate) -> Result<Vec<Invoice>, PortError>;

    /// Unpaid invoices, oldest first
    async fn list_unpaid(&self) -> Result<Vec<Invoice>, PortError>;

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<u64, PortError>;

    async fn add(&self, invoice: Invoice) -> Result<Invoice, PortError>;

    async fn update(&self, invoice: Invoice) -> Result<(), PortError>;

    async fn remove(&self, id: InvoiceId) -> Result<(), PortError>;
}

/// Payments
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Payments of a customer, newest first
    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Payment>, PortError>;

    async fn count_for_invoice(&self, invoice_id: InvoiceId) -> Result<u64, PortError>;

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<u64, PortError>;

    async fn add(&self, payment: Payment) -> Result<Payment, PortError>;
}

/// One transactional scope over all repositories
///
/// The repositories are created with the unit of work and share its session.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn trucks(&self) -> &dyn TruckRepository;

    fn truck_loads(&self) -> &dyn TruckLoadRepository;

    fn customers(&self) -> &dyn CustomerRepository;

    fn invoices(&self) -> &dyn InvoiceRepository;

    fn payments(&self) -> &dyn PaymentRepository;

    fn transaction_state(&self) -> TransactionState;

    /// Fails with `InvalidTransaction` when a transaction is already active
    async fn begin_transaction(&mut self) -> Result<(), PortError>;

    /// Fails with `InvalidTransaction` when no transaction is active
    async fn commit_transaction(&mut self) -> Result<(), PortError>;

    /// Fails with `InvalidTransaction` when no transaction is active
    async fn rollback_transaction(&mut self) -> Result<(), PortError>;

    /// Flushes staged writes atomically and returns how many were applied
    ///
    /// On failure an active transaction is rolled back before returning.
    async fn save_changes(&mut self) -> Result<usize, PortError>;
}

/// Creates a fresh unit of work per service operation
#[async_trait]
pub trait UnitOfWorkProvider: DomainPort + HealthCheckable {
    async fn unit_of_work(&self) -> Result<Box<dyn UnitOfWork>, PortError>;
}
