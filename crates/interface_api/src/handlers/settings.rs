//! Settings handlers

use axum::{extract::State, Json};
use tracing::info;

use crate::dto::BackupStatus;
use crate::error::ApiError;
use crate::settings::AppSettings;
use crate::AppState;

pub async fn get_settings(State(state): State<AppState>) -> Json<AppSettings> {
    Json(state.settings.read().await.settings().clone())
}

/// Validates and saves a full preferences document
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<AppSettings>,
) -> Result<Json<AppSettings>, ApiError> {
    let mut store = state.settings.write().await;
    let saved = store.update(settings).await?;
    Ok(Json(saved.clone()))
}

pub async fn reset_settings(State(state): State<AppState>) -> Result<Json<AppSettings>, ApiError> {
    let mut store = state.settings.write().await;
    let saved = store.reset().await?;
    Ok(Json(saved.clone()))
}

pub async fn backup_status(State(state): State<AppState>) -> Json<BackupStatus> {
    let store = state.settings.read().await;
    let settings = store.settings();
    Json(BackupStatus {
        due: settings.is_backup_due(state.clock.now()),
        enabled: settings.auto_backup_enabled,
        interval_days: settings.auto_backup_interval_days,
        last_backup: settings.last_backup,
    })
}

/// Stamps a backup taken by the client now
pub async fn record_backup(State(state): State<AppState>) -> Result<Json<BackupStatus>, ApiError> {
    let now = state.clock.now();
    let mut store = state.settings.write().await;
    store.record_backup(now).await?;
    info!(at = %now, "Backup recorded");

    let settings = store.settings();
    Ok(Json(BackupStatus {
        due: settings.is_backup_due(now),
        enabled: settings.auto_backup_enabled,
        interval_days: settings.auto_backup_interval_days,
        last_backup: settings.last_backup,
    }))
}
