//! Customer and payment tests against the in-memory unit of work

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::CustomerId;
use domain_ledger::reports::AgingBucket;
use domain_ledger::{ErrorCode, Invoice, PaymentMethod};
use test_utils::{
    assert_failure, assert_success, assert_validation_error, CustomerRequestBuilder,
    InvoiceRequestBuilder, LedgerHarness, PaymentRequestBuilder, SeedData, TemporalFixtures,
};

/// Seeds the store and sells the reference invoice to a customer owing 200.00
async fn customer_owing_960(harness: &LedgerHarness) -> (SeedData, CustomerId, Invoice) {
    let seed = harness.seed().await;
    let customer = harness.customer_with_debt("Abu Khalil Poultry", dec!(200.00)).await;
    let created = harness
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(customer.id, seed.truck.id).build())
        .await;
    let invoice = assert_success(&created).clone();
    (seed, customer.id, invoice)
}

#[tokio::test]
async fn test_create_customer_cleans_input() {
    let harness = LedgerHarness::new();

    let request = CustomerRequestBuilder::new("  Al Baraka Meat  ")
        .with_phone("٠٧٩١٢٣٤٥٦٧")
        .with_address("   ")
        .with_credit_limit(dec!(2500))
        .build();
    let result = harness.customers.create_customer(request).await;

    let customer = assert_success(&result);
    assert!(customer.id.is_assigned());
    assert_eq!(customer.customer_name, "Al Baraka Meat");
    assert_eq!(customer.phone_number.as_deref(), Some("0791234567"));
    assert_eq!(customer.address, None);
    assert_eq!(customer.total_debt, Decimal::ZERO);
    assert!(customer.is_active);
}

#[tokio::test]
async fn test_duplicate_name_ignores_case_and_spaces() {
    let harness = LedgerHarness::new();
    harness.seed().await;

    let request = CustomerRequestBuilder::new(" al noor MARKET ").build();
    let result = harness.customers.create_customer(request).await;

    assert_failure(&result, ErrorCode::DuplicateCustomer);
    assert_eq!(result.message, "A customer with this name already exists");
}

#[tokio::test]
async fn test_short_name_is_rejected() {
    let harness = LedgerHarness::new();

    let result = harness
        .customers
        .create_customer(CustomerRequestBuilder::new("A").build())
        .await;

    assert_validation_error(&result, "at least 2 characters");
    assert_eq!(result.message, "Customer validation failed");
}

#[tokio::test]
async fn test_random_customers_are_accepted() {
    let harness = LedgerHarness::new();

    for _ in 0..5 {
        let request = test_utils::LedgerFixtures::random_customer_request();
        let name = request.customer_name.clone();
        let result = harness.customers.create_customer(request).await;
        // fake names can repeat
        if !result.is_success {
            assert_failure(&result, ErrorCode::DuplicateCustomer);
            continue;
        }
        assert_eq!(assert_success(&result).customer_name, name.trim());
    }
}

#[tokio::test]
async fn test_update_may_keep_own_name_but_not_take_another() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let keep = CustomerRequestBuilder::new("Al Noor Market")
        .with_phone("0790000000")
        .build_update(true);
    let result = harness.customers.update_customer(seed.customer.id, keep).await;
    assert_eq!(assert_success(&result).phone_number.as_deref(), Some("0790000000"));

    let clash = CustomerRequestBuilder::new("cash customer").build_update(true);
    let result = harness.customers.update_customer(seed.customer.id, clash).await;
    assert_failure(&result, ErrorCode::DuplicateCustomer);

    let missing = CustomerRequestBuilder::new("Nobody").build_update(true);
    let result = harness.customers.update_customer(CustomerId::new(404), missing).await;
    assert_failure(&result, ErrorCode::CustomerNotFound);
}

#[tokio::test]
async fn test_deactivated_customer_leaves_active_lists() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let update = CustomerRequestBuilder::new("Al Noor Market").build_update(false);
    assert_success(&harness.customers.update_customer(seed.customer.id, update).await);

    let active = harness.customers.active_customers().await;
    let names: Vec<_> = assert_success(&active).iter().map(|c| c.customer_name.as_str()).collect();
    assert_eq!(names, vec!["Cash Customer"]);

    let found = harness.customers.search_customers("noor").await;
    assert!(assert_success(&found).is_empty());
}

#[tokio::test]
async fn test_delete_customer_with_history_is_refused() {
    let harness = LedgerHarness::new();
    let (_, customer_id, _) = customer_owing_960(&harness).await;

    let result = harness.customers.delete_customer(customer_id).await;

    assert_failure(&result, ErrorCode::HasTransactions);
    assert!(harness.store.customer(customer_id).await.is_some());
}

#[tokio::test]
async fn test_delete_unused_customer() {
    let harness = LedgerHarness::new();
    let created = harness
        .customers
        .create_customer(CustomerRequestBuilder::new("One Off Buyer").build())
        .await;
    let id = assert_success(&created).id;

    assert!(harness.customers.delete_customer(id).await.is_success);
    assert_failure(&harness.customers.get_customer(id).await, ErrorCode::CustomerNotFound);
    assert_failure(&harness.customers.customer_balance(id).await, ErrorCode::CustomerNotFound);
}

#[tokio::test]
async fn test_search_by_name_and_phone() {
    let harness = LedgerHarness::new();
    harness.seed().await;
    let request = CustomerRequestBuilder::new("Abu Khalil Poultry").with_phone("0791234567").build();
    assert_success(&harness.customers.create_customer(request).await);

    let by_name = harness.customers.search_customers("  KHALIL ").await;
    assert_eq!(assert_success(&by_name).len(), 1);

    let by_phone = harness.customers.search_customers("١٢٣٤").await;
    assert_eq!(assert_success(&by_phone)[0].customer_name, "Abu Khalil Poultry");
    assert_eq!(by_phone.message, "Found 1 customers");

    let blank = harness.customers.search_customers("   ").await;
    assert_failure(&blank, ErrorCode::InvalidSearchTerm);
}

#[tokio::test]
async fn test_full_payment_settles_invoice() {
    let harness = LedgerHarness::new();
    let (_, customer_id, invoice) = customer_owing_960(&harness).await;

    let request = PaymentRequestBuilder::new(dec!(760.00))
        .for_invoice(invoice.id)
        .with_method(PaymentMethod::Check)
        .with_reference("CHK-1001")
        .build();
    let result = harness.customers.process_payment(customer_id, request).await;

    let receipt = assert_success(&result);
    assert_eq!(receipt.new_balance, dec!(200.00));
    assert!(receipt.invoice_settled);
    assert_eq!(receipt.payment.payment_date, TemporalFixtures::business_date());
    assert_eq!(receipt.payment.reference_number.as_deref(), Some("CHK-1001"));

    assert!(harness.store.invoice(invoice.id).await.unwrap().is_paid);
    let balance = harness.customers.customer_balance(customer_id).await;
    assert_eq!(*assert_success(&balance), dec!(200.00));
}

#[tokio::test]
async fn test_partial_payment_keeps_invoice_open() {
    let harness = LedgerHarness::new();
    let (_, customer_id, invoice) = customer_owing_960(&harness).await;

    let request = PaymentRequestBuilder::new(dec!(500.00)).for_invoice(invoice.id).build();
    let result = harness.customers.process_payment(customer_id, request).await;

    let receipt = assert_success(&result);
    assert_eq!(receipt.new_balance, dec!(460.00));
    assert!(!receipt.invoice_settled);
    assert!(!harness.store.invoice(invoice.id).await.unwrap().is_paid);
}

#[tokio::test]
async fn test_payment_rejections() {
    let harness = LedgerHarness::new();
    let (seed, customer_id, invoice) = customer_owing_960(&harness).await;

    let zero = harness
        .customers
        .process_payment(customer_id, PaymentRequestBuilder::new(Decimal::ZERO).build())
        .await;
    assert_failure(&zero, ErrorCode::InvalidAmount);

    let over = harness
        .customers
        .process_payment(customer_id, PaymentRequestBuilder::new(dec!(960.01)).build())
        .await;
    assert_failure(&over, ErrorCode::Overpayment);

    let foreign_invoice = harness
        .customers
        .process_payment(
            seed.customer.id,
            PaymentRequestBuilder::new(dec!(10.00)).for_invoice(invoice.id).build(),
        )
        .await;
    assert_failure(&foreign_invoice, ErrorCode::InvoiceNotFound);
    assert_eq!(foreign_invoice.message, "Invoice not found for this customer");

    let future = harness
        .customers
        .process_payment(
            customer_id,
            PaymentRequestBuilder::new(dec!(10.00))
                .on(TemporalFixtures::days_from_business_date(1))
                .build(),
        )
        .await;
    assert_validation_error(&future, "Payment date cannot be in the future");

    let unknown = harness
        .customers
        .process_payment(CustomerId::new(404), PaymentRequestBuilder::new(dec!(10.00)).build())
        .await;
    assert_failure(&unknown, ErrorCode::CustomerNotFound);

    assert_eq!(harness.debt_of_id(customer_id).await, dec!(960.00));
    assert!(harness.store.payments().await.is_empty());
}

#[tokio::test]
async fn test_paid_invoice_cannot_be_paid_again() {
    let harness = LedgerHarness::new();
    let (_, customer_id, invoice) = customer_owing_960(&harness).await;
    assert_success(&harness.invoices.mark_invoice_as_paid(invoice.id).await);

    let request = PaymentRequestBuilder::new(dec!(760.00)).for_invoice(invoice.id).build();
    let result = harness.customers.process_payment(customer_id, request).await;

    assert_failure(&result, ErrorCode::InvoiceAlreadyPaid);
}

#[tokio::test]
async fn test_payment_without_debt_floors_at_zero() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let request = PaymentRequestBuilder::new(dec!(50.00)).build();
    let result = harness.customers.process_payment(seed.customer.id, request).await;

    assert_eq!(assert_success(&result).new_balance, Decimal::ZERO);
    let payments = harness.customers.customer_payments(seed.customer.id).await;
    assert_eq!(assert_success(&payments).len(), 1);
}

#[tokio::test]
async fn test_failed_payment_save_leaves_debt() {
    let harness = LedgerHarness::new();
    let (_, customer_id, invoice) = customer_owing_960(&harness).await;
    harness.store.fail_next_save("connection reset").await;

    let request = PaymentRequestBuilder::new(dec!(760.00)).for_invoice(invoice.id).build();
    let result = harness.customers.process_payment(customer_id, request).await;

    assert_failure(&result, ErrorCode::PaymentError);
    assert_eq!(result.message, "An error occurred while trying to process the payment");
    assert_eq!(harness.debt_of_id(customer_id).await, dec!(960.00));
    assert!(!harness.store.invoice(invoice.id).await.unwrap().is_paid);
}

#[tokio::test]
async fn test_account_summary() {
    let harness = LedgerHarness::new();
    let (_, customer_id, invoice) = customer_owing_960(&harness).await;
    let payment = PaymentRequestBuilder::new(dec!(300.00)).for_invoice(invoice.id).build();
    assert_success(&harness.customers.process_payment(customer_id, payment).await);

    let result = harness.customers.customer_account_summary(customer_id).await;

    let summary = assert_success(&result);
    assert_eq!(summary.current_balance, dec!(660.00));
    assert_eq!(summary.total_invoices, 1);
    assert_eq!(summary.unpaid_invoices, 1);
    assert_eq!(summary.total_purchases, dec!(760.00));
    assert_eq!(summary.total_payments, dec!(300.00));
    assert_eq!(summary.available_credit, dec!(4340.00));
    assert_eq!(summary.last_transaction_date, Some(TemporalFixtures::business_date()));
    assert_eq!(summary.recent_payments.len(), 1);
}

#[tokio::test]
async fn test_debtors_report_ages_balances() {
    let harness = LedgerHarness::new();
    let (_, customer_id, _) = customer_owing_960(&harness).await;
    let silent = harness.customer_with_debt("Old Account", dec!(150.00)).await;

    let result = harness.customers.generate_debtors_report().await;

    let report = assert_success(&result);
    assert_eq!(report.report_date, TemporalFixtures::business_date());
    assert_eq!(report.total_debtors, 2);
    assert_eq!(report.total_outstanding_debt, dec!(1110.00));
    assert_eq!(report.average_debt, dec!(555.00));
    assert_eq!(report.debtors[0].customer_id, customer_id);
    assert_eq!(report.debtors[0].aging, AgingBucket::Days0To30);
    assert_eq!(report.debtors[1].customer_id, silent.id);
    assert_eq!(report.debtors[1].aging, AgingBucket::Over90Days);
    assert_eq!(report.aging.len(), 4);
    assert_eq!(report.aging[3].total_debt, dec!(150.00));

    let with_debt = harness.customers.customers_with_debt().await;
    assert_eq!(assert_success(&with_debt).len(), 2);
}
