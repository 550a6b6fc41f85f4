//! Transaction and constraint behaviour of the in-memory unit of work

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, CustomerId, HealthCheckable, PaymentId};
use domain_ledger::ports::memory::{MemoryStore, MemoryUnitOfWorkProvider};
use domain_ledger::{
    Customer, Payment, PaymentMethod, TransactionState, Truck, UnitOfWork, UnitOfWorkProvider,
};
use test_utils::{assert_success, InvoiceRequestBuilder, LedgerFixtures, LedgerHarness, TemporalFixtures};

fn provider() -> (MemoryStore, MemoryUnitOfWorkProvider) {
    let store = MemoryStore::new();
    (store.clone(), MemoryUnitOfWorkProvider::new(store))
}

#[tokio::test]
async fn test_open_transaction_is_invisible_to_other_units() {
    let (store, provider) = provider();
    let mut writer = provider.unit_of_work().await.unwrap();
    let reader = provider.unit_of_work().await.unwrap();

    writer.begin_transaction().await.unwrap();
    let customer = writer
        .customers()
        .add(LedgerFixtures::customer("Al Salam"))
        .await
        .unwrap();
    writer.save_changes().await.unwrap();

    assert!(writer.customers().get(customer.id).await.unwrap().is_some());
    assert!(reader.customers().get(customer.id).await.unwrap().is_none());

    writer.commit_transaction().await.unwrap();
    assert!(reader.customers().get(customer.id).await.unwrap().is_some());
    assert!(store.customer(customer.id).await.is_some());
}

#[tokio::test]
async fn test_batch_with_duplicate_truck_number_writes_nothing() {
    let (store, provider) = provider();
    store.insert_truck(LedgerFixtures::truck("T001")).await;
    let mut uow = provider.unit_of_work().await.unwrap();

    let customer = uow
        .customers()
        .add(LedgerFixtures::customer("Al Salam"))
        .await
        .unwrap();
    uow.trucks()
        .add(Truck::new("T001", "Someone Else", None, Utc::now()))
        .await
        .unwrap();

    let error = uow.save_changes().await.unwrap_err();
    assert!(error.is_conflict());
    assert!(store.customer(customer.id).await.is_none());
}

#[tokio::test]
async fn test_payment_for_missing_customer_violates_foreign_key() {
    let (_, provider) = provider();
    let mut uow = provider.unit_of_work().await.unwrap();

    uow.payments()
        .add(Payment {
            id: PaymentId::UNASSIGNED,
            customer_id: CustomerId::new(42),
            invoice_id: None,
            amount: dec!(100.00),
            payment_method: PaymentMethod::Cash,
            payment_date: TemporalFixtures::business_date(),
            reference_number: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        })
        .await
        .unwrap();

    let error = uow.save_changes().await.unwrap_err();
    assert!(error.is_conflict());
    assert!(error.to_string().contains("Referenced customer CUST-42 does not exist"));
}

#[tokio::test]
async fn test_customer_with_invoice_cannot_be_removed() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let request = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id).build();
    assert_success(&harness.invoices.create_invoice(request).await);

    let mut uow = harness.provider.unit_of_work().await.unwrap();
    uow.customers().remove(seed.customer.id).await.unwrap();

    let error = uow.save_changes().await.unwrap_err();
    assert!(error.is_conflict());
    assert!(harness.store.customer(seed.customer.id).await.is_some());
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_found() {
    let (_, provider) = provider();
    let mut uow = provider.unit_of_work().await.unwrap();

    let mut ghost = Customer::new("Ghost", None, None, Decimal::ZERO, Utc::now());
    ghost.id = CustomerId::new(7);
    uow.customers().update(ghost).await.unwrap();

    let error = uow.save_changes().await.unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_failed_save_ends_transaction() {
    let (store, provider) = provider();
    let mut uow = provider.unit_of_work().await.unwrap();
    uow.begin_transaction().await.unwrap();

    let customer = uow
        .customers()
        .add(LedgerFixtures::customer("Al Salam"))
        .await
        .unwrap();
    store.fail_next_save("disk full").await;

    assert!(uow.save_changes().await.is_err());
    assert_eq!(uow.transaction_state(), TransactionState::RolledBack);
    assert!(uow.commit_transaction().await.is_err());
    assert!(store.customer(customer.id).await.is_none());

    // a finished unit can start over
    uow.begin_transaction().await.unwrap();
    assert_eq!(uow.transaction_state(), TransactionState::Active);
}

#[tokio::test]
async fn test_later_commit_wins() {
    let (store, provider) = provider();
    let seeded = store.insert_customer(LedgerFixtures::customer("Al Salam")).await;

    let mut first = provider.unit_of_work().await.unwrap();
    let mut second = provider.unit_of_work().await.unwrap();
    first.begin_transaction().await.unwrap();
    second.begin_transaction().await.unwrap();

    let mut a = seeded.clone();
    a.total_debt = dec!(100.00);
    first.customers().update(a).await.unwrap();
    first.save_changes().await.unwrap();

    let mut b = seeded.clone();
    b.total_debt = dec!(250.00);
    second.customers().update(b).await.unwrap();
    second.save_changes().await.unwrap();

    first.commit_transaction().await.unwrap();
    second.commit_transaction().await.unwrap();

    assert_eq!(store.customer(seeded.id).await.unwrap().total_debt, dec!(250.00));
}

#[tokio::test]
async fn test_memory_provider_reports_healthy() {
    let (_, provider) = provider();
    let health = provider.health_check().await;
    assert_eq!(health.adapter_id, "memory-ledger-store");
    assert_eq!(health.status, AdapterHealth::Healthy);
}
