//! Pre-built Test Fixtures
//!
//! Provides ready-to-use ledger data and a fully wired in-memory service
//! harness. Every fixture uses the same business date, 14 June 2025, so
//! invoice numbers in tests start with `250614`.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, FixedClock, TruckId, TruckLoadId};
use domain_ledger::ports::memory::{MemoryStore, MemoryUnitOfWorkProvider};
use domain_ledger::{
    CreateCustomerRequest, Customer, CustomerService, InvoiceService, LoadStatus, Truck,
    TruckLoad, TruckLoadService,
};

/// Fixture for dates and clocks
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The business date all fixtures share (14 June 2025)
    pub fn business_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    /// Noon UTC on the business date
    pub fn business_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap()
    }

    /// The business date shifted by whole days
    pub fn days_from_business_date(days: i64) -> NaiveDate {
        Self::business_date() + chrono::Duration::days(days)
    }

    /// A clock frozen on the business date
    pub fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::on_date(Self::business_date()))
    }
}

/// Fixture for ledger entities
pub struct LedgerFixtures;

impl LedgerFixtures {
    /// An active truck with a driver
    pub fn truck(number: &str) -> Truck {
        Truck::new(number, "Driver One", Some("0790000001".to_string()), TemporalFixtures::business_now())
    }

    /// An active customer with no debt
    pub fn customer(name: &str) -> Customer {
        Customer::new(name, None, None, dec!(5000), TemporalFixtures::business_now())
    }

    /// An active customer already owing money
    pub fn customer_with_debt(name: &str, debt: Decimal) -> Customer {
        let mut customer = Self::customer(name);
        customer.total_debt = debt;
        customer
    }

    /// A load of the truck on the date
    pub fn truck_load(truck_id: TruckId, load_date: NaiveDate, total_weight: Decimal) -> TruckLoad {
        TruckLoad {
            id: TruckLoadId::UNASSIGNED,
            truck_id,
            load_date,
            total_weight,
            cages_count: 40,
            cages_weight: dec!(60.000),
            notes: None,
            status: LoadStatus::Loaded,
            is_completed: false,
            created_at: TemporalFixtures::business_now(),
            updated_at: None,
        }
    }

    /// A new-customer request with a random English name
    pub fn random_customer_request() -> CreateCustomerRequest {
        let name: String = Name().fake();
        CreateCustomerRequest {
            customer_name: name,
            phone_number: None,
            address: None,
            credit_limit: Decimal::ZERO,
        }
    }
}

/// Rows seeded by [`LedgerHarness::seed`]
#[derive(Debug, Clone)]
pub struct SeedData {
    /// `T001`
    pub truck: Truck,
    /// `T002`
    pub spare_truck: Truck,
    /// A regular customer with no debt
    pub customer: Customer,
    /// The walk-in cash customer
    pub cash_customer: Customer,
}

/// All three services over one in-memory store and a frozen clock
pub struct LedgerHarness {
    pub store: MemoryStore,
    pub provider: Arc<MemoryUnitOfWorkProvider>,
    pub clock: Arc<FixedClock>,
    pub invoices: InvoiceService,
    pub customers: CustomerService,
    pub trucks: TruckLoadService,
}

impl LedgerHarness {
    /// An empty store with the clock on the business date
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let provider = Arc::new(MemoryUnitOfWorkProvider::new(store.clone()));
        let clock = TemporalFixtures::fixed_clock();
        Self {
            invoices: InvoiceService::new(provider.clone(), clock.clone()),
            customers: CustomerService::new(provider.clone(), clock.clone()),
            trucks: TruckLoadService::new(provider.clone(), clock.clone()),
            store,
            provider,
            clock,
        }
    }

    /// Seeds the two trucks and the customers every suite needs
    pub async fn seed(&self) -> SeedData {
        SeedData {
            truck: self.store.insert_truck(LedgerFixtures::truck("T001")).await,
            spare_truck: self.store.insert_truck(LedgerFixtures::truck("T002")).await,
            customer: self.store.insert_customer(LedgerFixtures::customer("Al Noor Market")).await,
            cash_customer: self.store.insert_customer(LedgerFixtures::customer("Cash Customer")).await,
        }
    }

    /// Seeds a customer owing `debt`
    pub async fn customer_with_debt(&self, name: &str, debt: Decimal) -> Customer {
        self.store
            .insert_customer(LedgerFixtures::customer_with_debt(name, debt))
            .await
    }

    /// Current debt of a customer in the committed store
    pub async fn debt_of(&self, customer: &Customer) -> Decimal {
        self.debt_of_id(customer.id).await
    }

    pub async fn debt_of_id(&self, id: CustomerId) -> Decimal {
        self.store
            .customer(id)
            .await
            .map(|c| c.total_debt)
            .unwrap_or_default()
    }
}

impl Default for LedgerHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_date_is_fixed() {
        assert_eq!(TemporalFixtures::business_date().to_string(), "2025-06-14");
        assert_eq!(TemporalFixtures::business_now().date_naive(), TemporalFixtures::business_date());
    }

    #[tokio::test]
    async fn test_seed_assigns_identities() {
        let harness = LedgerHarness::new();
        let seed = harness.seed().await;

        assert!(seed.truck.id.is_assigned());
        assert_ne!(seed.truck.id, seed.spare_truck.id);
        assert_eq!(harness.debt_of(&seed.customer).await, Decimal::ZERO);
    }

    #[test]
    fn test_random_customer_request_has_name() {
        let request = LedgerFixtures::random_customer_request();
        assert!(!request.customer_name.trim().is_empty());
    }
}
