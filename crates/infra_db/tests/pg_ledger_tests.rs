//! PostgreSQL ledger tests
//!
//! Each test starts its own container, so they are ignored by default.
//! Run them with `cargo test -p infra_db -- --ignored` on a host with Docker.

use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, HealthCheckable};
use domain_ledger::{Customer, ErrorCode, TransactionState, Truck, UnitOfWork, UnitOfWorkProvider};
use test_utils::{
    assert_failure, assert_invoice_consistent, assert_success, db_test, CustomerRequestBuilder,
    InvoiceRequestBuilder, LedgerFixtures, PaymentRequestBuilder, PgServices, TemporalFixtures,
    TruckLoadRequestBuilder,
};

/// The seeded truck `T001` and a fresh customer
async fn truck_and_customer(services: &PgServices) -> (Truck, Customer) {
    let trucks = services.trucks.active_trucks().await;
    let truck = assert_success(&trucks)
        .iter()
        .find(|t| t.truck_number == "T001")
        .cloned()
        .expect("seed truck T001");
    let customer = services
        .customers
        .create_customer(CustomerRequestBuilder::new("Al Noor Market").with_phone("0791234567").build())
        .await;
    (truck, assert_success(&customer).clone())
}

db_test!(test_seed_rows_are_present, |db| {
    let services = db.services();

    let trucks = services.trucks.active_trucks().await;
    let numbers: Vec<_> = assert_success(&trucks).iter().map(|t| t.truck_number.clone()).collect();
    assert_eq!(numbers, vec!["T001", "T002"]);

    let customers = services.customers.search_customers("cash").await;
    assert_eq!(assert_success(&customers).len(), 1);
});

db_test!(test_invoice_round_trip_and_debt, |db| {
    let services = db.services();
    let (truck, customer) = truck_and_customer(&services).await;

    let created = services
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(customer.id, truck.id).build())
        .await;
    let invoice = assert_success(&created).clone();
    assert_eq!(invoice.invoice_number, "250614001");

    let stored = services.invoices.get_invoice(invoice.id).await;
    let stored = assert_success(&stored);
    assert_eq!(stored, &invoice);
    assert_invoice_consistent(stored);

    let balance = services.customers.customer_balance(customer.id).await;
    assert_eq!(*assert_success(&balance), dec!(760.00));

    let next = services.invoices.preview_invoice_number().await;
    assert_eq!(assert_success(&next), "250614002");
});

db_test!(test_payment_settles_invoice, |db| {
    let services = db.services();
    let (truck, customer) = truck_and_customer(&services).await;
    let created = services
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(customer.id, truck.id).build())
        .await;
    let invoice = assert_success(&created).clone();

    let payment = PaymentRequestBuilder::new(dec!(760.00)).for_invoice(invoice.id).build();
    let receipt = services.customers.process_payment(customer.id, payment).await;
    let receipt = assert_success(&receipt);
    assert!(receipt.invoice_settled);
    assert_eq!(receipt.new_balance, dec!(0.00));

    let unpaid = services.invoices.unpaid_invoices().await;
    assert!(assert_success(&unpaid).is_empty());

    let deleted = services.invoices.delete_invoice(invoice.id).await;
    assert_failure(&deleted, ErrorCode::HasPayments);
});

db_test!(test_payment_accepts_full_length_reference, |db| {
    let services = db.services();
    let (truck, customer) = truck_and_customer(&services).await;
    let created = services
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(customer.id, truck.id).build())
        .await;
    assert_success(&created);

    let reference = "R".repeat(100);
    let payment = PaymentRequestBuilder::new(dec!(100.00)).with_reference(reference.clone()).build();
    let receipt = services.customers.process_payment(customer.id, payment).await;
    assert_eq!(assert_success(&receipt).new_balance, dec!(660.00));

    let payments = services.customers.customer_payments(customer.id).await;
    let stored = assert_success(&payments);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].reference_number.as_deref(), Some(reference.as_str()));
});

db_test!(test_concurrent_sales_keep_every_debt_change, |db| {
    let services = db.services();
    let (truck, customer) = truck_and_customer(&services).await;

    let (first, second) = tokio::join!(
        services.invoices.create_invoice(InvoiceRequestBuilder::new(customer.id, truck.id).build()),
        services.invoices.create_invoice(InvoiceRequestBuilder::new(customer.id, truck.id).build()),
    );
    let first = assert_success(&first).clone();
    let second = assert_success(&second).clone();
    assert_ne!(first.invoice_number, second.invoice_number);

    let balance = services.customers.customer_balance(customer.id).await;
    assert_eq!(*assert_success(&balance), first.final_amount + second.final_amount);
    assert_eq!(*assert_success(&balance), dec!(1520.00));

    // the later sale starts from the earlier sale's balance
    let (earlier, later) = if first.id < second.id { (first, second) } else { (second, first) };
    assert_eq!(later.previous_balance, earlier.current_balance);
});

db_test!(test_concurrent_sale_and_payment_keep_debt, |db| {
    let services = db.services();
    let (truck, customer) = truck_and_customer(&services).await;
    let created = services
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(customer.id, truck.id).build())
        .await;
    assert_success(&created);

    let (sale, receipt) = tokio::join!(
        services.invoices.create_invoice(InvoiceRequestBuilder::new(customer.id, truck.id).build()),
        services
            .customers
            .process_payment(customer.id, PaymentRequestBuilder::new(dec!(100.00)).build()),
    );
    assert_success(&sale);
    assert_success(&receipt);

    let balance = services.customers.customer_balance(customer.id).await;
    assert_eq!(*assert_success(&balance), dec!(1420.00));
});

db_test!(test_one_load_per_truck_and_day, |db| {
    let services = db.services();
    let (truck, _) = truck_and_customer(&services).await;

    let first = services
        .trucks
        .create_truck_load(TruckLoadRequestBuilder::new(truck.id).build())
        .await;
    assert_success(&first);

    let second = services
        .trucks
        .create_truck_load(TruckLoadRequestBuilder::new(truck.id).build())
        .await;
    assert_failure(&second, ErrorCode::DuplicateLoad);

    // the unique index backs the service check
    let mut uow = services.provider.unit_of_work().await.unwrap();
    uow.truck_loads()
        .add(LedgerFixtures::truck_load(truck.id, TemporalFixtures::business_date(), dec!(300.000)))
        .await
        .unwrap();
    let error = uow.save_changes().await.unwrap_err();
    assert!(error.is_conflict(), "unexpected error: {error}");
});

db_test!(test_rollback_discards_flushed_rows, |db| {
    let provider = db.provider();
    let mut uow = provider.unit_of_work().await.unwrap();

    uow.begin_transaction().await.unwrap();
    let customer = uow
        .customers()
        .add(LedgerFixtures::customer("Temporary Buyer"))
        .await
        .unwrap();
    assert_eq!(uow.save_changes().await.unwrap(), 1);
    assert!(uow.customers().get(customer.id).await.unwrap().is_some());

    uow.rollback_transaction().await.unwrap();
    assert_eq!(uow.transaction_state(), TransactionState::RolledBack);

    let reader = provider.unit_of_work().await.unwrap();
    assert!(reader.customers().get(customer.id).await.unwrap().is_none());
});

db_test!(test_search_matches_phone_digits, |db| {
    let services = db.services();
    truck_and_customer(&services).await;

    let by_phone = services.customers.search_customers("٠٧٩١٢").await;
    let found = assert_success(&by_phone);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].customer_name, "Al Noor Market");
});

db_test!(test_clear_data_empties_ledger, |db| {
    db.clear_data().await.unwrap();
    let services = db.services();

    let trucks = services.trucks.active_trucks().await;
    assert!(assert_success(&trucks).is_empty());
});

db_test!(test_provider_health_check, |db| {
    let health = db.provider().health_check().await;
    assert_eq!(health.adapter_id, "postgres-ledger-store");
    assert_eq!(health.status, AdapterHealth::Healthy);
});
