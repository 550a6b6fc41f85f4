//! In-memory implementation of the ledger ports
//!
//! The store keeps every table in ordered maps and enforces the same
//! constraints as the relational schema: unique truck and invoice numbers,
//! one load per truck and date, and restrictive foreign keys. A transaction
//! works on a private copy of the tables that replaces the shared tables on
//! commit and is dropped on rollback. A single writer is assumed.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::warn;

use core_kernel::{
    AdapterHealth, CustomerId, DateRange, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId,
    PaymentId, PortError, TruckId, TruckLoadId,
};

use super::{
    ChangeSet, CustomerRepository, InvoiceRepository, PaymentRepository, PendingChange,
    TransactionState, TruckLoadRepository, TruckRepository, UnitOfWork, UnitOfWorkProvider,
};
use crate::customer::{normalize_name, Customer};
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::truck::{Truck, TruckLoad};

#[derive(Debug, Clone, Default)]
struct Tables {
    trucks: BTreeMap<TruckId, Truck>,
    truck_loads: BTreeMap<TruckLoadId, TruckLoad>,
    customers: BTreeMap<CustomerId, Customer>,
    invoices: BTreeMap<InvoiceId, Invoice>,
    payments: BTreeMap<PaymentId, Payment>,
}

impl Tables {
    fn apply(&mut self, change: &PendingChange) -> Result<(), PortError> {
        match change {
            PendingChange::AddTruck(truck) => {
                self.check_truck_number(truck)?;
                self.trucks.insert(truck.id, truck.clone());
            }
            PendingChange::UpdateTruck(truck) => {
                require(self.trucks.contains_key(&truck.id), "Truck", truck.id)?;
                self.check_truck_number(truck)?;
                self.trucks.insert(truck.id, truck.clone());
            }
            PendingChange::AddTruckLoad(load) => {
                self.check_truck_load(load)?;
                self.truck_loads.insert(load.id, load.clone());
            }
            PendingChange::UpdateTruckLoad(load) => {
                require(self.truck_loads.contains_key(&load.id), "TruckLoad", load.id)?;
                self.check_truck_load(load)?;
                self.truck_loads.insert(load.id, load.clone());
            }
            PendingChange::RemoveTruckLoad(id) => {
                require(self.truck_loads.remove(id).is_some(), "TruckLoad", id)?;
            }
            PendingChange::AddCustomer(customer) => {
                self.customers.insert(customer.id, customer.clone());
            }
            PendingChange::UpdateCustomer(customer) => {
                require(self.customers.contains_key(&customer.id), "Customer", customer.id)?;
                self.customers.insert(customer.id, customer.clone());
            }
            PendingChange::RemoveCustomer(id) => {
                let referenced = self.invoices.values().any(|i| i.customer_id == *id)
                    || self.payments.values().any(|p| p.customer_id == *id);
                if referenced {
                    return Err(PortError::conflict(format!(
                        "Customer {} is still referenced by invoices or payments",
                        id
                    )));
                }
                require(self.customers.remove(id).is_some(), "Customer", id)?;
            }
            PendingChange::AddInvoice(invoice) => {
                self.check_invoice(invoice)?;
                self.invoices.insert(invoice.id, invoice.clone());
            }
            PendingChange::UpdateInvoice(invoice) => {
                require(self.invoices.contains_key(&invoice.id), "Invoice", invoice.id)?;
                self.check_invoice(invoice)?;
                self.invoices.insert(invoice.id, invoice.clone());
            }
            PendingChange::RemoveInvoice(id) => {
                if self.payments.values().any(|p| p.invoice_id == Some(*id)) {
                    return Err(PortError::conflict(format!(
                        "Invoice {} is still referenced by payments",
                        id
                    )));
                }
                require(self.invoices.remove(id).is_some(), "Invoice", id)?;
            }
            PendingChange::AddPayment(payment) => {
                foreign_key(self.customers.contains_key(&payment.customer_id), "customer", payment.customer_id)?;
                if let Some(invoice_id) = payment.invoice_id {
                    foreign_key(self.invoices.contains_key(&invoice_id), "invoice", invoice_id)?;
                }
                self.payments.insert(payment.id, payment.clone());
            }
        }
        Ok(())
    }

    fn check_truck_number(&self, truck: &Truck) -> Result<(), PortError> {
        let taken = self
            .trucks
            .values()
            .any(|t| t.id != truck.id && t.truck_number == truck.truck_number);
        if taken {
            return Err(PortError::conflict(format!(
                "Truck number {} already exists",
                truck.truck_number
            )));
        }
        Ok(())
    }

    fn check_truck_load(&self, load: &TruckLoad) -> Result<(), PortError> {
        foreign_key(self.trucks.contains_key(&load.truck_id), "truck", load.truck_id)?;
        let taken = self
            .truck_loads
            .values()
            .any(|l| l.id != load.id && l.truck_id == load.truck_id && l.load_date == load.load_date);
        if taken {
            return Err(PortError::conflict(format!(
                "Truck {} already has a load on {}",
                load.truck_id, load.load_date
            )));
        }
        Ok(())
    }

    fn check_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        foreign_key(self.customers.contains_key(&invoice.customer_id), "customer", invoice.customer_id)?;
        foreign_key(self.trucks.contains_key(&invoice.truck_id), "truck", invoice.truck_id)?;
        let taken = self
            .invoices
            .values()
            .any(|i| i.id != invoice.id && i.invoice_number == invoice.invoice_number);
        if taken {
            return Err(PortError::conflict(format!(
                "Invoice number {} already exists",
                invoice.invoice_number
            )));
        }
        Ok(())
    }
}

fn require(found: bool, entity: &str, id: impl std::fmt::Display) -> Result<(), PortError> {
    if found {
        Ok(())
    } else {
        Err(PortError::not_found(entity, id))
    }
}

fn foreign_key(found: bool, target: &str, id: impl std::fmt::Display) -> Result<(), PortError> {
    if found {
        Ok(())
    } else {
        Err(PortError::conflict(format!("Referenced {} {} does not exist", target, id)))
    }
}

#[derive(Debug, Clone, Copy)]
enum Table {
    Truck,
    TruckLoad,
    Customer,
    Invoice,
    Payment,
}

#[derive(Debug, Default)]
struct LastIds {
    truck: i64,
    truck_load: i64,
    customer: i64,
    invoice: i64,
    payment: i64,
}

impl LastIds {
    fn next(&mut self, table: Table) -> i64 {
        let slot = match table {
            Table::Truck => &mut self.truck,
            Table::TruckLoad => &mut self.truck_load,
            Table::Customer => &mut self.customer,
            Table::Invoice => &mut self.invoice,
            Table::Payment => &mut self.payment,
        };
        *slot += 1;
        *slot
    }
}

#[derive(Debug, Default)]
struct StoreState {
    tables: Tables,
    last_ids: LastIds,
    fail_next_save: Option<String>,
}

/// Shared in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `save_changes` fail with an internal error
    pub async fn fail_next_save(&self, message: impl Into<String>) {
        self.state.lock().await.fail_next_save = Some(message.into());
    }

    async fn next_id(&self, table: Table) -> i64 {
        self.state.lock().await.last_ids.next(table)
    }

    /// Seeds a truck directly, bypassing staging and constraints
    pub async fn insert_truck(&self, mut truck: Truck) -> Truck {
        let mut state = self.state.lock().await;
        truck.id = TruckId::new(state.last_ids.next(Table::Truck));
        state.tables.trucks.insert(truck.id, truck.clone());
        truck
    }

    /// Seeds a truck load directly
    pub async fn insert_truck_load(&self, mut load: TruckLoad) -> TruckLoad {
        let mut state = self.state.lock().await;
        load.id = TruckLoadId::new(state.last_ids.next(Table::TruckLoad));
        state.tables.truck_loads.insert(load.id, load.clone());
        load
    }

    /// Seeds a customer directly
    pub async fn insert_customer(&self, mut customer: Customer) -> Customer {
        let mut state = self.state.lock().await;
        customer.id = CustomerId::new(state.last_ids.next(Table::Customer));
        state.tables.customers.insert(customer.id, customer.clone());
        customer
    }

    /// Seeds a payment directly
    pub async fn insert_payment(&self, mut payment: Payment) -> Payment {
        let mut state = self.state.lock().await;
        payment.id = PaymentId::new(state.last_ids.next(Table::Payment));
        state.tables.payments.insert(payment.id, payment.clone());
        payment
    }

    /// Committed customer row
    pub async fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.state.lock().await.tables.customers.get(&id).cloned()
    }

    /// Committed invoice row
    pub async fn invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.state.lock().await.tables.invoices.get(&id).cloned()
    }

    /// Committed truck load row
    pub async fn truck_load(&self, id: TruckLoadId) -> Option<TruckLoad> {
        self.state.lock().await.tables.truck_loads.get(&id).cloned()
    }

    /// Every committed invoice
    pub async fn invoices(&self) -> Vec<Invoice> {
        self.state.lock().await.tables.invoices.values().cloned().collect()
    }

    /// Every committed payment
    pub async fn payments(&self) -> Vec<Payment> {
        self.state.lock().await.tables.payments.values().cloned().collect()
    }
}

#[derive(Debug, Default)]
struct MemorySession {
    pending: ChangeSet,
    /// Private copy of the tables while a transaction is active
    working: Option<Tables>,
}

#[derive(Debug, Clone)]
struct Handle {
    store: MemoryStore,
    session: Arc<Mutex<MemorySession>>,
}

impl Handle {
    async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let session = self.session.lock().await;
        match session.working.as_ref() {
            Some(tables) => f(tables),
            None => {
                let state = self.store.state.lock().await;
                f(&state.tables)
            }
        }
    }

    async fn stage(&self, change: PendingChange) {
        self.session.lock().await.pending.push(change);
    }
}

fn sorted_by<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    rows
}

/// In-memory trucks
#[derive(Debug, Clone)]
pub struct MemoryTrucks(Handle);

#[async_trait]
impl TruckRepository for MemoryTrucks {
    async fn get(&self, id: TruckId) -> Result<Option<Truck>, PortError> {
        Ok(self.0.read(|t| t.trucks.get(&id).cloned()).await)
    }

    async fn find_by_number(&self, truck_number: &str) -> Result<Option<Truck>, PortError> {
        let number = truck_number.trim();
        Ok(self
            .0
            .read(|t| t.trucks.values().find(|truck| truck.truck_number == number).cloned())
            .await)
    }

    async fn list_active(&self) -> Result<Vec<Truck>, PortError> {
        let trucks = self
            .0
            .read(|t| t.trucks.values().filter(|truck| truck.is_active).cloned().collect())
            .await;
        Ok(sorted_by(trucks, |truck: &Truck| truck.truck_number.clone()))
    }

    async fn list_with_loads_on(&self, date: NaiveDate) -> Result<Vec<Truck>, PortError> {
        let trucks = self
            .0
            .read(|t| {
                t.trucks
                    .values()
                    .filter(|truck| {
                        truck.is_active
                            && t.truck_loads
                                .values()
                                .any(|load| load.truck_id == truck.id && load.load_date == date)
                    })
                    .cloned()
                    .collect()
            })
            .await;
        Ok(sorted_by(trucks, |truck: &Truck| truck.truck_number.clone()))
    }

    async fn add(&self, mut truck: Truck) -> Result<Truck, PortError> {
        truck.id = TruckId::new(self.0.store.next_id(Table::Truck).await);
        self.0.stage(PendingChange::AddTruck(truck.clone())).await;
        Ok(truck)
    }

    async fn update(&self, truck: Truck) -> Result<(), PortError> {
        self.0.stage(PendingChange::UpdateTruck(truck)).await;
        Ok(())
    }
}

/// In-memory truck loads
#[derive(Debug, Clone)]
pub struct MemoryTruckLoads(Handle);

#[async_trait]
impl TruckLoadRepository for MemoryTruckLoads {
    async fn get(&self, id: TruckLoadId) -> Result<Option<TruckLoad>, PortError> {
        Ok(self.0.read(|t| t.truck_loads.get(&id).cloned()).await)
    }

    async fn find_for_truck_on(&self, truck_id: TruckId, date: NaiveDate) -> Result<Option<TruckLoad>, PortError> {
        Ok(self
            .0
            .read(|t| {
                t.truck_loads
                    .values()
                    .find(|load| load.truck_id == truck_id && load.load_date == date)
                    .cloned()
            })
            .await)
    }

    async fn list_on(&self, date: NaiveDate) -> Result<Vec<TruckLoad>, PortError> {
        Ok(self
            .0
            .read(|t| t.truck_loads.values().filter(|load| load.load_date == date).cloned().collect())
            .await)
    }

    async fn list_for_truck(&self, truck_id: TruckId) -> Result<Vec<TruckLoad>, PortError> {
        let loads: Vec<TruckLoad> = self
            .0
            .read(|t| t.truck_loads.values().filter(|load| load.truck_id == truck_id).cloned().collect())
            .await;
        let mut loads = loads;
        loads.sort_by(|a, b| b.load_date.cmp(&a.load_date));
        Ok(loads)
    }

    async fn add(&self, mut load: TruckLoad) -> Result<TruckLoad, PortError> {
        load.id = TruckLoadId::new(self.0.store.next_id(Table::TruckLoad).await);
        self.0.stage(PendingChange::AddTruckLoad(load.clone())).await;
        Ok(load)
    }

    async fn update(&self, load: TruckLoad) -> Result<(), PortError> {
        self.0.stage(PendingChange::UpdateTruckLoad(load)).await;
        Ok(())
    }

    async fn remove(&self, id: TruckLoadId) -> Result<(), PortError> {
        self.0.stage(PendingChange::RemoveTruckLoad(id)).await;
        Ok(())
    }
}

/// In-memory customers
#[derive(Debug, Clone)]
pub struct MemoryCustomers(Handle);

#[async_trait]
impl CustomerRepository for MemoryCustomers {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        Ok(self.0.read(|t| t.customers.get(&id).cloned()).await)
    }

    // No row locks in memory
    async fn get_for_update(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        self.get(id).await
    }

    async fn list_active(&self) -> Result<Vec<Customer>, PortError> {
        let customers = self
            .0
            .read(|t| t.customers.values().filter(|c| c.is_active).cloned().collect())
            .await;
        Ok(sorted_by(customers, |c: &Customer| c.customer_name.clone()))
    }

    async fn list_with_debt(&self) -> Result<Vec<Customer>, PortError> {
        let mut customers: Vec<Customer> = self
            .0
            .read(|t| {
                t.customers
                    .values()
                    .filter(|c| c.is_active && c.total_debt > Decimal::ZERO)
                    .cloned()
                    .collect()
            })
            .await;
        customers.sort_by(|a, b| b.total_debt.cmp(&a.total_debt).then(a.id.cmp(&b.id)));
        Ok(customers)
    }

    async fn find_active_by_name(
        &self,
        normalized_name: &str,
        exclude: Option<CustomerId>,
    ) -> Result<Option<Customer>, PortError> {
        Ok(self
            .0
            .read(|t| {
                t.customers
                    .values()
                    .find(|c| {
                        c.is_active
                            && Some(c.id) != exclude
                            && normalize_name(&c.customer_name) == normalized_name
                    })
                    .cloned()
            })
            .await)
    }

    async fn search(&self, term: &str) -> Result<Vec<Customer>, PortError> {
        let customers = self
            .0
            .read(|t| {
                t.customers
                    .values()
                    .filter(|c| c.is_active && c.matches_search(term))
                    .cloned()
                    .collect()
            })
            .await;
        Ok(sorted_by(customers, |c: &Customer| c.customer_name.clone()))
    }

    async fn add(&self, mut customer: Customer) -> Result<Customer, PortError> {
        customer.id = CustomerId::new(self.0.store.next_id(Table::Customer).await);
        self.0.stage(PendingChange::AddCustomer(customer.clone())).await;
        Ok(customer)
    }

    async fn update(&self, customer: Customer) -> Result<(), PortError> {
        self.0.stage(PendingChange::UpdateCustomer(customer)).await;
        Ok(())
    }

    async fn remove(&self, id: CustomerId) -> Result<(), PortError> {
        self.0.stage(PendingChange::RemoveCustomer(id)).await;
        Ok(())
    }
}

/// In-memory invoices
#[derive(Debug, Clone)]
pub struct MemoryInvoices(Handle);

fn by_date_and_number(invoices: Vec<Invoice>) -> Vec<Invoice> {
    sorted_by(invoices, |i: &Invoice| (i.invoice_date, i.invoice_number.clone()))
}

#[async_trait]
impl InvoiceRepository for MemoryInvoices {
    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        Ok(self.0.read(|t| t.invoices.get(&id).cloned()).await)
    }

    async fn last_number_with_prefix(&self, prefix: &str) -> Result<Option<String>, PortError> {
        Ok(self
            .0
            .read(|t| {
                t.invoices
                    .values()
                    .map(|i| &i.invoice_number)
                    .filter(|number| number.starts_with(prefix))
                    .max()
                    .cloned()
            })
            .await)
    }

    async fn list_by_date_range(&self, range: DateRange) -> Result<Vec<Invoice>, PortError> {
        let invoices = self
            .0
            .read(|t| t.invoices.values().filter(|i| range.contains(i.invoice_date)).cloned().collect())
            .await;
        Ok(by_date_and_number(invoices))
    }

    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, PortError> {
        let invoices = self
            .0
            .read(|t| {
                t.invoices
                    .values()
                    .filter(|i| {
                        i.customer_id == customer_id
                            && start.map_or(true, |s| i.invoice_date >= s)
                            && end.map_or(true, |e| i.invoice_date <= e)
                    })
                    .cloned()
                    .collect()
            })
            .await;
        Ok(by_date_and_number(invoices))
    }

    async fn list_for_truck_on(&self, truck_id: TruckId, date: NaiveDate) -> Result<Vec<Invoice>, PortError> {
        let invoices = self
            .0
            .read(|t| {
                t.invoices
                    .values()
                    .filter(|i| i.truck_id == truck_id && i.invoice_date == date)
                    .cloned()
                    .collect()
            })
            .await;
        Ok(by_date_and_number(invoices))
    }

    async fn list_unpaid(&self) -> Result<Vec<Invoice>, PortError> {
        let invoices = self
            .0
            .read(|t| t.invoices.values().filter(|i| !i.is_paid).cloned().collect())
            .await;
        Ok(by_date_and_number(invoices))
    }

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<u64, PortError> {
        Ok(self
            .0
            .read(|t| t.invoices.values().filter(|i| i.customer_id == customer_id).count() as u64)
            .await)
    }

    async fn add(&self, mut invoice: Invoice) -> Result<Invoice, PortError> {
        invoice.id = InvoiceId::new(self.0.store.next_id(Table::Invoice).await);
        self.0.stage(PendingChange::AddInvoice(invoice.clone())).await;
        Ok(invoice)
    }

    async fn update(&self, invoice: Invoice) -> Result<(), PortError> {
        self.0.stage(PendingChange::UpdateInvoice(invoice)).await;
        Ok(())
    }

    async fn remove(&self, id: InvoiceId) -> Result<(), PortError> {
        self.0.stage(PendingChange::RemoveInvoice(id)).await;
        Ok(())
    }
}

/// In-memory payments
#[derive(Debug, Clone)]
pub struct MemoryPayments(Handle);

#[async_trait]
impl PaymentRepository for MemoryPayments {
    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Payment>, PortError> {
        let mut payments: Vec<Payment> = self
            .0
            .read(|t| t.payments.values().filter(|p| p.customer_id == customer_id).cloned().collect())
            .await;
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.id.cmp(&a.id)));
        Ok(payments)
    }

    async fn count_for_invoice(&self, invoice_id: InvoiceId) -> Result<u64, PortError> {
        Ok(self
            .0
            .read(|t| t.payments.values().filter(|p| p.invoice_id == Some(invoice_id)).count() as u64)
            .await)
    }

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<u64, PortError> {
        Ok(self
            .0
            .read(|t| t.payments.values().filter(|p| p.customer_id == customer_id).count() as u64)
            .await)
    }

    async fn add(&self, mut payment: Payment) -> Result<Payment, PortError> {
        payment.id = PaymentId::new(self.0.store.next_id(Table::Payment).await);
        self.0.stage(PendingChange::AddPayment(payment.clone())).await;
        Ok(payment)
    }
}

/// Unit of work over a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    handle: Handle,
    state: TransactionState,
    trucks: MemoryTrucks,
    truck_loads: MemoryTruckLoads,
    customers: MemoryCustomers,
    invoices: MemoryInvoices,
    payments: MemoryPayments,
}

impl MemoryUnitOfWork {
    /// Creates the unit of work and all of its repositories
    pub fn new(store: MemoryStore) -> Self {
        let handle = Handle {
            store,
            session: Arc::new(Mutex::new(MemorySession::default())),
        };
        Self {
            trucks: MemoryTrucks(handle.clone()),
            truck_loads: MemoryTruckLoads(handle.clone()),
            customers: MemoryCustomers(handle.clone()),
            invoices: MemoryInvoices(handle.clone()),
            payments: MemoryPayments(handle.clone()),
            state: TransactionState::NoTransaction,
            handle,
        }
    }

    async fn flush(&self) -> Result<usize, PortError> {
        let mut session = self.handle.session.lock().await;
        let changes = session.pending.take();
        let mut store = self.handle.store.state.lock().await;

        if let Some(message) = store.fail_next_save.take() {
            return Err(PortError::internal(message));
        }
        if changes.is_empty() {
            return Ok(0);
        }

        let tables = match session.working.as_mut() {
            Some(working) => working,
            None => &mut store.tables,
        };
        let mut next = tables.clone();
        for change in &changes {
            next.apply(change)?;
        }
        *tables = next;
        Ok(changes.len())
    }

    async fn discard_transaction(&self) {
        let mut session = self.handle.session.lock().await;
        session.working = None;
        session.pending.clear();
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
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
        let snapshot = self.handle.store.state.lock().await.tables.clone();
        self.handle.session.lock().await.working = Some(snapshot);
        self.state = next;
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<(), PortError> {
        let next = self.state.commit()?;
        let working = self.handle.session.lock().await.working.take();
        if let Some(tables) = working {
            self.handle.store.state.lock().await.tables = tables;
        }
        self.state = next;
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> Result<(), PortError> {
        let next = self.state.rollback()?;
        self.discard_transaction().await;
        self.state = next;
        Ok(())
    }

    async fn save_changes(&mut self) -> Result<usize, PortError> {
        let outcome = self.flush().await;
        if let Err(error) = &outcome {
            if self.state.is_active() {
                warn!(%error, "Save failed, rolling back in-memory transaction");
                self.discard_transaction().await;
                self.state = TransactionState::RolledBack;
            }
        }
        outcome
    }
}

/// Hands out units of work over one shared [`MemoryStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryUnitOfWorkProvider {
    store: MemoryStore,
}

impl MemoryUnitOfWorkProvider {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// The shared store, for seeding and inspection
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl DomainPort for MemoryUnitOfWorkProvider {}

#[async_trait]
impl HealthCheckable for MemoryUnitOfWorkProvider {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-ledger-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl UnitOfWorkProvider for MemoryUnitOfWorkProvider {
    async fn unit_of_work(&self) -> Result<Box<dyn UnitOfWork>, PortError> {
        Ok(Box::new(MemoryUnitOfWork::new(self.store.clone())))
    }
}
