//! Invoice service tests against the in-memory unit of work

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{InvoiceId, PaymentId};
use domain_ledger::{ErrorCode, InvoiceCalculationInput, Payment, PaymentMethod};
use test_utils::{
    assert_failure, assert_invoice_consistent, assert_success, assert_validation_error,
    InvoiceRequestBuilder, LedgerFixtures, LedgerHarness, TemporalFixtures,
};

#[tokio::test]
async fn test_reference_sale_adds_final_amount_to_debt() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let customer = harness.customer_with_debt("Abu Khalil Poultry", dec!(200.00)).await;

    let request = InvoiceRequestBuilder::new(customer.id, seed.truck.id).build();
    let result = harness.invoices.create_invoice(request).await;

    let invoice = assert_success(&result);
    assert_eq!(invoice.invoice_number, "250614001");
    assert_eq!(invoice.net_weight, dec!(80.000));
    assert_eq!(invoice.total_amount, dec!(800.00));
    assert_eq!(invoice.discount_amount, dec!(40.00));
    assert_eq!(invoice.final_amount, dec!(760.00));
    assert_eq!(invoice.previous_balance, dec!(200.00));
    assert_eq!(invoice.current_balance, dec!(960.00));
    assert!(!invoice.is_paid);
    assert_invoice_consistent(invoice);
    assert_eq!(result.message, "Invoice 250614001 created successfully");

    assert_eq!(harness.debt_of(&customer).await, dec!(960.00));
}

#[tokio::test]
async fn test_same_day_numbers_increase() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let preview = harness.invoices.preview_invoice_number().await;
    assert_eq!(assert_success(&preview), "250614001");

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let request = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id).build();
        let result = harness.invoices.create_invoice(request).await;
        numbers.push(assert_success(&result).invoice_number.clone());
    }
    assert_eq!(numbers, vec!["250614001", "250614002", "250614003"]);

    let preview = harness.invoices.preview_invoice_number().await;
    assert_eq!(assert_success(&preview), "250614004");
}

#[tokio::test]
async fn test_back_dated_invoice_is_numbered_for_today() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let request = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id)
        .with_date(TemporalFixtures::days_from_business_date(-3))
        .build();
    let result = harness.invoices.create_invoice(request).await;

    let invoice = assert_success(&result);
    assert_eq!(invoice.invoice_date, TemporalFixtures::days_from_business_date(-3));
    assert!(invoice.invoice_number.starts_with("250614"));
}

#[tokio::test]
async fn test_invoice_older_than_a_week_is_rejected() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let request = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id)
        .with_date(TemporalFixtures::days_from_business_date(-8))
        .build();
    let result = harness.invoices.create_invoice(request).await;

    assert_validation_error(&result, "more than 7 days in the past");
    assert_eq!(result.message, "Invoice validation failed");
    assert!(harness.store.invoices().await.is_empty());
}

#[tokio::test]
async fn test_every_broken_rule_is_reported() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let request = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id)
        .with_unit_price(Decimal::ZERO)
        .with_discount(dec!(150))
        .build();
    let result = harness.invoices.create_invoice(request).await;

    assert_validation_error(&result, "Unit price must be greater than zero");
    assert_validation_error(&result, "Discount percentage must be between 0 and 100");
}

#[tokio::test]
async fn test_inactive_customer_cannot_buy() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let mut dormant = LedgerFixtures::customer("Dormant Trader");
    dormant.is_active = false;
    let dormant = harness.store.insert_customer(dormant).await;

    let request = InvoiceRequestBuilder::new(dormant.id, seed.truck.id).build();
    let result = harness.invoices.create_invoice(request).await;

    assert_failure(&result, ErrorCode::CustomerInvalid);
    assert_eq!(result.message, "Selected customer not found or inactive");
}

#[tokio::test]
async fn test_inactive_truck_cannot_sell() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let deactivated = harness.trucks.set_truck_active(seed.spare_truck.id, false).await;
    assert_success(&deactivated);

    let request = InvoiceRequestBuilder::new(seed.customer.id, seed.spare_truck.id).build();
    let result = harness.invoices.create_invoice(request).await;

    assert_failure(&result, ErrorCode::TruckInvalid);
    assert_eq!(harness.debt_of(&seed.customer).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_failed_save_rolls_back_and_hides_store_error() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let customer = harness.customer_with_debt("Abu Khalil Poultry", dec!(200.00)).await;
    harness.store.fail_next_save("disk full").await;

    let request = InvoiceRequestBuilder::new(customer.id, seed.truck.id).build();
    let result = harness.invoices.create_invoice(request).await;

    assert_failure(&result, ErrorCode::CreationError);
    assert_eq!(result.message, "An error occurred while trying to create the invoice");
    assert!(!result.message.contains("disk full"));
    assert!(harness.store.invoices().await.is_empty());
    assert_eq!(harness.debt_of(&customer).await, dec!(200.00));

    // the number is free again
    let preview = harness.invoices.preview_invoice_number().await;
    assert_eq!(assert_success(&preview), "250614001");
}

#[tokio::test]
async fn test_update_recomputes_against_debt_without_invoice() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let customer = harness.customer_with_debt("Abu Khalil Poultry", dec!(200.00)).await;
    let created = harness
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(customer.id, seed.truck.id).build())
        .await;
    let invoice = assert_success(&created).clone();

    let update = InvoiceRequestBuilder::new(customer.id, seed.spare_truck.id)
        .with_unit_price(dec!(12.00))
        .with_notes("  corrected price  ")
        .build_update();
    let result = harness.invoices.update_invoice(invoice.id, update).await;

    let updated = assert_success(&result);
    assert_eq!(updated.invoice_number, invoice.invoice_number);
    assert_eq!(updated.truck_id, seed.spare_truck.id);
    assert_eq!(updated.total_amount, dec!(960.00));
    assert_eq!(updated.discount_amount, dec!(48.00));
    assert_eq!(updated.final_amount, dec!(912.00));
    assert_eq!(updated.previous_balance, dec!(200.00));
    assert_eq!(updated.current_balance, dec!(1112.00));
    assert_eq!(updated.notes.as_deref(), Some("corrected price"));
    assert!(updated.updated_at.is_some());
    assert_invoice_consistent(updated);

    assert_eq!(harness.debt_of(&customer).await, dec!(1112.00));
}

#[tokio::test]
async fn test_update_of_missing_invoice() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;

    let update = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id).build_update();
    let result = harness.invoices.update_invoice(InvoiceId::new(99), update).await;

    assert_failure(&result, ErrorCode::InvoiceNotFound);
}

#[tokio::test]
async fn test_delete_returns_final_amount_to_customer() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let customer = harness.customer_with_debt("Abu Khalil Poultry", dec!(200.00)).await;
    let created = harness
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(customer.id, seed.truck.id).build())
        .await;
    let invoice_id = assert_success(&created).id;

    let result = harness.invoices.delete_invoice(invoice_id).await;

    assert!(result.is_success, "{}", result.message);
    assert_eq!(harness.debt_of(&customer).await, dec!(200.00));
    assert_failure(&harness.invoices.get_invoice(invoice_id).await, ErrorCode::InvoiceNotFound);
}

#[tokio::test]
async fn test_delete_with_payments_is_refused() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let created = harness
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id).build())
        .await;
    let invoice = assert_success(&created).clone();
    harness
        .store
        .insert_payment(Payment {
            id: PaymentId::UNASSIGNED,
            customer_id: seed.customer.id,
            invoice_id: Some(invoice.id),
            amount: dec!(100.00),
            payment_method: PaymentMethod::Cash,
            payment_date: TemporalFixtures::business_date(),
            reference_number: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        })
        .await;

    let result = harness.invoices.delete_invoice(invoice.id).await;

    assert_failure(&result, ErrorCode::HasPayments);
    assert_eq!(result.message, "Cannot delete invoice with existing payments");
    assert_eq!(harness.debt_of(&seed.customer).await, dec!(760.00));
    assert!(harness.store.invoice(invoice.id).await.is_some());
}

#[tokio::test]
async fn test_mark_paid_leaves_debt_alone() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let created = harness
        .invoices
        .create_invoice(InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id).build())
        .await;
    let invoice_id = assert_success(&created).id;

    let result = harness.invoices.mark_invoice_as_paid(invoice_id).await;

    assert!(assert_success(&result).is_paid);
    assert_eq!(harness.debt_of(&seed.customer).await, dec!(760.00));
    let unpaid = harness.invoices.unpaid_invoices().await;
    assert!(assert_success(&unpaid).is_empty());
}

#[tokio::test]
async fn test_queries_by_customer_and_date() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    for days_back in [0, 2, 5] {
        let request = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id)
            .with_date(TemporalFixtures::days_from_business_date(-days_back))
            .build();
        assert_success(&harness.invoices.create_invoice(request).await);
    }
    let other = InvoiceRequestBuilder::new(seed.cash_customer.id, seed.truck.id).build();
    assert_success(&harness.invoices.create_invoice(other).await);

    let all_for_customer = harness.invoices.invoices_by_customer(seed.customer.id, None, None).await;
    let dates: Vec<_> = assert_success(&all_for_customer).iter().map(|i| i.invoice_date).collect();
    assert_eq!(
        dates,
        vec![
            TemporalFixtures::days_from_business_date(-5),
            TemporalFixtures::days_from_business_date(-2),
            TemporalFixtures::business_date(),
        ]
    );

    let recent = harness
        .invoices
        .invoices_by_customer(seed.customer.id, Some(TemporalFixtures::days_from_business_date(-2)), None)
        .await;
    assert_eq!(assert_success(&recent).len(), 2);

    let today = harness
        .invoices
        .invoices_by_date_range(TemporalFixtures::business_date(), TemporalFixtures::business_date())
        .await;
    assert_eq!(assert_success(&today).len(), 2);
    assert_eq!(today.message, "Retrieved 2 invoices");
}

#[tokio::test]
async fn test_sales_report_totals() {
    let harness = LedgerHarness::new();
    let seed = harness.seed().await;
    let first = InvoiceRequestBuilder::new(seed.customer.id, seed.truck.id).build();
    let second = InvoiceRequestBuilder::new(seed.cash_customer.id, seed.spare_truck.id)
        .with_discount(Decimal::ZERO)
        .build();
    assert_success(&harness.invoices.create_invoice(first).await);
    assert_success(&harness.invoices.create_invoice(second).await);

    let day = TemporalFixtures::business_date();
    let result = harness.invoices.generate_sales_report(day, day).await;

    let report = assert_success(&result);
    assert_eq!(report.total_invoices, 2);
    assert_eq!(report.total_sales_amount, dec!(1560.00));
    assert_eq!(report.total_net_weight, dec!(160.000));
    assert_eq!(report.customer_sales.len(), 2);
    assert_eq!(report.truck_sales.len(), 2);
    assert!(report
        .customer_sales
        .iter()
        .any(|sales| sales.customer_name == "Al Noor Market" && sales.total_amount == dec!(760.00)));
}

#[tokio::test]
async fn test_sales_report_edges() {
    let harness = LedgerHarness::new();
    harness.seed().await;

    let inverted = harness
        .invoices
        .generate_sales_report(
            TemporalFixtures::business_date(),
            TemporalFixtures::days_from_business_date(-1),
        )
        .await;
    assert_failure(&inverted, ErrorCode::ValidationError);
    assert_eq!(inverted.message, "Invalid report period");

    let day = TemporalFixtures::business_date();
    let empty = harness.invoices.generate_sales_report(day, day).await;
    let report = assert_success(&empty);
    assert_eq!(report.total_invoices, 0);
    assert_eq!(report.total_sales_amount, Decimal::ZERO);
    assert_eq!(empty.message, "No sales data found for the specified period");
}

#[tokio::test]
async fn test_calculation_preview_does_not_touch_store() {
    let harness = LedgerHarness::new();
    let input = InvoiceCalculationInput {
        gross_weight: dec!(100.000),
        cages_weight: dec!(20.000),
        unit_price: dec!(10.00),
        discount_percentage: dec!(5),
        previous_balance: dec!(200.00),
    };

    let result = harness.invoices.calculate_invoice_amounts(&input);
    let calculation = assert_success(&result);
    assert_eq!(calculation.final_amount, dec!(760.00));
    assert_eq!(calculation.current_balance, dec!(960.00));

    let bad = InvoiceCalculationInput {
        cages_weight: dec!(100.000),
        ..input
    };
    assert!(!harness.invoices.calculate_invoice_amounts(&bad).is_success);
    assert!(harness.store.invoices().await.is_empty());
}
