//! Report handlers

use axum::extract::{Query, State};

use domain_ledger::reports::{DailySummaryReport, DebtorsReport, SalesReport};

use crate::dto::{DateQuery, PeriodQuery};
use crate::error::ApiResponse;
use crate::AppState;

pub async fn sales(State(state): State<AppState>, Query(period): Query<PeriodQuery>) -> ApiResponse<SalesReport> {
    state
        .services
        .invoices
        .generate_sales_report(period.start, period.end)
        .await
        .into()
}

pub async fn debtors(State(state): State<AppState>) -> ApiResponse<DebtorsReport> {
    state.services.customers.generate_debtors_report().await.into()
}

/// Facility-wide weight and sales for `?date=`, today by default
pub async fn daily_summary(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResponse<DailySummaryReport> {
    let date = query.date.unwrap_or_else(|| state.clock.today());
    state.services.trucks.generate_daily_summary_report(date).await.into()
}
