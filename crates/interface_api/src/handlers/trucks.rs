//! Truck handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;

use core_kernel::TruckId;
use domain_ledger::reports::WeightComparisonReport;
use domain_ledger::{CreateTruckRequest, Truck, TruckLoad};

use crate::dto::{DateQuery, SetActiveRequest};
use crate::error::ApiResponse;
use crate::AppState;

pub async fn create_truck(
    State(state): State<AppState>,
    Json(request): Json<CreateTruckRequest>,
) -> ApiResponse<Truck> {
    ApiResponse::created(state.services.trucks.create_truck(request).await)
}

pub async fn list_trucks(State(state): State<AppState>) -> ApiResponse<Vec<Truck>> {
    state.services.trucks.active_trucks().await.into()
}

pub async fn get_truck(State(state): State<AppState>, Path(id): Path<TruckId>) -> ApiResponse<Truck> {
    state.services.trucks.get_truck(id).await.into()
}

pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<TruckId>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResponse<Truck> {
    state.services.trucks.set_truck_active(id, request.is_active).await.into()
}

/// Every load of the truck, newest first
pub async fn list_loads(State(state): State<AppState>, Path(id): Path<TruckId>) -> ApiResponse<Vec<TruckLoad>> {
    state.services.trucks.truck_loads_for(id).await.into()
}

pub async fn get_load_on(
    State(state): State<AppState>,
    Path((id, date)): Path<(TruckId, NaiveDate)>,
) -> ApiResponse<TruckLoad> {
    state.services.trucks.truck_load_for(id, date).await.into()
}

/// Loaded against sold weight on `?date=`, today by default
pub async fn weight_comparison(
    State(state): State<AppState>,
    Path(id): Path<TruckId>,
    Query(query): Query<DateQuery>,
) -> ApiResponse<WeightComparisonReport> {
    let date = query.date.unwrap_or_else(|| state.clock.today());
    state
        .services
        .trucks
        .generate_weight_comparison_report(id, date)
        .await
        .into()
}
