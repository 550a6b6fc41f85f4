//! Customer handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;

use core_kernel::CustomerId;
use domain_ledger::reports::{CustomerAccountSummary, PaymentReceipt};
use domain_ledger::{
    CreateCustomerRequest, Customer, Invoice, Payment, ProcessPaymentRequest, UpdateCustomerRequest,
};

use crate::dto::{CustomerListQuery, OpenPeriodQuery, SearchQuery};
use crate::error::ApiResponse;
use crate::AppState;

/// Creates a customer
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> ApiResponse<Customer> {
    ApiResponse::created(state.services.customers.create_customer(request).await)
}

/// Lists active customers, or only debtors with `?with_debt=true`
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> ApiResponse<Vec<Customer>> {
    if query.with_debt {
        state.services.customers.customers_with_debt().await.into()
    } else {
        state.services.customers.active_customers().await.into()
    }
}

pub async fn search_customers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResponse<Vec<Customer>> {
    state.services.customers.search_customers(&query.q).await.into()
}

pub async fn get_customer(State(state): State<AppState>, Path(id): Path<CustomerId>) -> ApiResponse<Customer> {
    state.services.customers.get_customer(id).await.into()
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(request): Json<UpdateCustomerRequest>,
) -> ApiResponse<Customer> {
    state.services.customers.update_customer(id, request).await.into()
}

pub async fn delete_customer(State(state): State<AppState>, Path(id): Path<CustomerId>) -> ApiResponse<()> {
    state.services.customers.delete_customer(id).await.into()
}

pub async fn get_balance(State(state): State<AppState>, Path(id): Path<CustomerId>) -> ApiResponse<Decimal> {
    state.services.customers.customer_balance(id).await.into()
}

pub async fn get_account_summary(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> ApiResponse<CustomerAccountSummary> {
    state.services.customers.customer_account_summary(id).await.into()
}

pub async fn list_payments(State(state): State<AppState>, Path(id): Path<CustomerId>) -> ApiResponse<Vec<Payment>> {
    state.services.customers.customer_payments(id).await.into()
}

/// Records a payment from the customer
pub async fn process_payment(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(request): Json<ProcessPaymentRequest>,
) -> ApiResponse<PaymentReceipt> {
    ApiResponse::created(state.services.customers.process_payment(id, request).await)
}

/// Invoices of the customer, optionally bounded by `start` and `end`
pub async fn list_invoices(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Query(period): Query<OpenPeriodQuery>,
) -> ApiResponse<Vec<Invoice>> {
    state
        .services
        .invoices
        .invoices_by_customer(id, period.start, period.end)
        .await
        .into()
}
