//! Invoice handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};

use core_kernel::InvoiceId;
use domain_ledger::{
    CreateInvoiceRequest, Invoice, InvoiceCalculation, InvoiceCalculationInput, UpdateInvoiceRequest,
};

use crate::dto::PeriodQuery;
use crate::error::ApiResponse;
use crate::AppState;

/// Creates an invoice and adds it to the customer's debt
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> ApiResponse<Invoice> {
    ApiResponse::created(state.services.invoices.create_invoice(request).await)
}

/// Invoices dated between `start` and `end`
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(period): Query<PeriodQuery>,
) -> ApiResponse<Vec<Invoice>> {
    state
        .services
        .invoices
        .invoices_by_date_range(period.start, period.end)
        .await
        .into()
}

pub async fn list_unpaid(State(state): State<AppState>) -> ApiResponse<Vec<Invoice>> {
    state.services.invoices.unpaid_invoices().await.into()
}

/// The number the next invoice of the day would get
pub async fn next_number(State(state): State<AppState>) -> ApiResponse<String> {
    state.services.invoices.preview_invoice_number().await.into()
}

/// Amounts of a prospective invoice, without storing anything
pub async fn calculate(
    State(state): State<AppState>,
    Json(input): Json<InvoiceCalculationInput>,
) -> ApiResponse<InvoiceCalculation> {
    state.services.invoices.calculate_invoice_amounts(&input).into()
}

pub async fn get_invoice(State(state): State<AppState>, Path(id): Path<InvoiceId>) -> ApiResponse<Invoice> {
    state.services.invoices.get_invoice(id).await.into()
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> ApiResponse<Invoice> {
    state.services.invoices.update_invoice(id, request).await.into()
}

pub async fn delete_invoice(State(state): State<AppState>, Path(id): Path<InvoiceId>) -> ApiResponse<()> {
    state.services.invoices.delete_invoice(id).await.into()
}

pub async fn mark_paid(State(state): State<AppState>, Path(id): Path<InvoiceId>) -> ApiResponse<Invoice> {
    state.services.invoices.mark_invoice_as_paid(id).await.into()
}
