//! Truck load handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};

use core_kernel::TruckLoadId;
use domain_ledger::{CreateTruckLoadRequest, TruckLoad, UpdateTruckLoadRequest};

use crate::dto::DateQuery;
use crate::error::ApiResponse;
use crate::AppState;

pub async fn create_load(
    State(state): State<AppState>,
    Json(request): Json<CreateTruckLoadRequest>,
) -> ApiResponse<TruckLoad> {
    ApiResponse::created(state.services.trucks.create_truck_load(request).await)
}

/// Loads of every truck on `?date=`, today by default
pub async fn list_loads(State(state): State<AppState>, Query(query): Query<DateQuery>) -> ApiResponse<Vec<TruckLoad>> {
    let date = query.date.unwrap_or_else(|| state.clock.today());
    state.services.trucks.truck_loads_on(date).await.into()
}

pub async fn get_load(State(state): State<AppState>, Path(id): Path<TruckLoadId>) -> ApiResponse<TruckLoad> {
    state.services.trucks.get_truck_load(id).await.into()
}

pub async fn update_load(
    State(state): State<AppState>,
    Path(id): Path<TruckLoadId>,
    Json(request): Json<UpdateTruckLoadRequest>,
) -> ApiResponse<TruckLoad> {
    state.services.trucks.update_truck_load(id, request).await.into()
}

pub async fn delete_load(State(state): State<AppState>, Path(id): Path<TruckLoadId>) -> ApiResponse<()> {
    state.services.trucks.delete_truck_load(id).await.into()
}

pub async fn complete_load(State(state): State<AppState>, Path(id): Path<TruckLoadId>) -> ApiResponse<TruckLoad> {
    state.services.trucks.complete_truck_load(id).await.into()
}
