//! Operator preferences
//!
//! A small JSON document next to the server: theme, company details printed
//! on invoices, the default unit price offered at the counter, backup
//! schedule, language, audit logging and session timeout. It is loaded once
//! at start-up into the application state and rewritten atomically on every
//! change.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

const MAX_DEFAULT_UNIT_PRICE: Decimal = dec!(10000);

/// Display theme of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Preferences document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: Theme,
    #[validate(length(min = 1, max = 100, message = "Company name must be between 1 and 100 characters"))]
    pub company_name: String,
    #[validate(length(max = 200, message = "Company address cannot exceed 200 characters"))]
    pub company_address: String,
    #[validate(length(max = 15, message = "Company phone cannot exceed 15 characters"))]
    pub company_phone: String,
    /// Price per kg suggested for new invoices
    #[validate(custom(function = validate_default_unit_price))]
    pub default_unit_price: Decimal,
    pub auto_backup_enabled: bool,
    #[validate(range(min = 1, max = 365, message = "Auto backup interval must be between 1 and 365 days"))]
    pub auto_backup_interval_days: u32,
    pub backup_location: Option<PathBuf>,
    pub last_backup: Option<DateTime<Utc>>,
    #[validate(length(min = 2, max = 10, message = "Language must be a language tag such as ar or en"))]
    pub language: String,
    pub audit_logging: bool,
    #[validate(range(min = 5, max = 1440, message = "Session timeout must be between 5 and 1440 minutes"))]
    pub session_timeout_minutes: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            company_name: "مسلخ الدجاج".to_string(),
            company_address: String::new(),
            company_phone: String::new(),
            default_unit_price: dec!(15.00),
            auto_backup_enabled: true,
            auto_backup_interval_days: 7,
            backup_location: None,
            last_backup: None,
            language: "ar".to_string(),
            audit_logging: true,
            session_timeout_minutes: 120,
        }
    }
}

fn validate_default_unit_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO || *price > MAX_DEFAULT_UNIT_PRICE {
        let mut error = ValidationError::new("default_unit_price");
        error.message = Some("Default unit price must be between 0 and 10,000".into());
        return Err(error);
    }
    Ok(())
}

impl AppSettings {
    /// Whether the backup schedule says a backup should run now
    pub fn is_backup_due(&self, now: DateTime<Utc>) -> bool {
        if !self.auto_backup_enabled {
            return false;
        }
        match self.last_backup {
            None => true,
            Some(last) => now - last >= Duration::days(i64::from(self.auto_backup_interval_days)),
        }
    }
}

/// Settings persistence errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SettingsError {
    /// Human-readable validation messages, sorted
    pub fn messages(&self) -> Vec<String> {
        match self {
            SettingsError::Invalid(errors) => validation_messages(errors),
            other => vec![other.to_string()],
        }
    }
}

fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages
}

/// The preferences file and its current contents
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    current: AppSettings,
}

impl SettingsStore {
    /// Reads the file, falling back to defaults when it is missing, unreadable
    /// or fails validation
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<AppSettings>(&content) {
                Ok(settings) => match settings.validate() {
                    Ok(()) => {
                        info!(path = %path.display(), "Settings loaded");
                        settings
                    }
                    Err(errors) => {
                        warn!(path = %path.display(), %errors, "Stored settings are invalid, using defaults");
                        AppSettings::default()
                    }
                },
                Err(error) => {
                    warn!(path = %path.display(), %error, "Settings file is corrupt, using defaults");
                    AppSettings::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file, using defaults");
                AppSettings::default()
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Cannot read settings file, using defaults");
                AppSettings::default()
            }
        };
        Self { path, current }
    }

    /// A store with the given contents that has not been written yet
    pub fn with_settings(path: impl Into<PathBuf>, settings: AppSettings) -> Self {
        Self {
            path: path.into(),
            current: settings,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.current
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates and persists new settings
    pub async fn update(&mut self, settings: AppSettings) -> Result<&AppSettings, SettingsError> {
        settings.validate()?;
        write_atomically(&self.path, &settings).await?;
        self.current = settings;
        info!(path = %self.path.display(), "Settings saved");
        Ok(&self.current)
    }

    /// Restores and persists the defaults
    pub async fn reset(&mut self) -> Result<&AppSettings, SettingsError> {
        let defaults = AppSettings::default();
        write_atomically(&self.path, &defaults).await?;
        self.current = defaults;
        info!(path = %self.path.display(), "Settings reset to defaults");
        Ok(&self.current)
    }

    /// Stamps the time of a completed backup
    pub async fn record_backup(&mut self, at: DateTime<Utc>) -> Result<(), SettingsError> {
        let mut next = self.current.clone();
        next.last_backup = Some(at);
        write_atomically(&self.path, &next).await?;
        self.current = next;
        Ok(())
    }
}

/// Writes to a sibling temp file, then renames it over the target
async fn write_atomically(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    tokio::fs::write(&temp, content).await?;
    tokio::fs::rename(&temp, path).await?;
    debug!(path = %path.display(), "Settings file replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("poultry-pos-{}", uuid::Uuid::new_v4()))
            .join("app-settings.json")
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppSettings::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_values_are_reported() {
        let settings = AppSettings {
            default_unit_price: dec!(0),
            auto_backup_interval_days: 400,
            session_timeout_minutes: 2,
            ..AppSettings::default()
        };
        let error = SettingsError::from(settings.validate().unwrap_err());

        assert_eq!(
            error.messages(),
            vec![
                "Auto backup interval must be between 1 and 365 days",
                "Default unit price must be between 0 and 10,000",
                "Session timeout must be between 5 and 1440 minutes",
            ]
        );
    }

    #[test]
    fn test_backup_schedule() {
        let now = Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap();
        let mut settings = AppSettings::default();
        assert!(settings.is_backup_due(now));

        settings.last_backup = Some(now - Duration::days(3));
        assert!(!settings.is_backup_due(now));

        settings.last_backup = Some(now - Duration::days(7));
        assert!(settings.is_backup_due(now));

        settings.auto_backup_enabled = false;
        assert!(!settings.is_backup_due(now));
    }

    #[test]
    fn test_json_uses_camel_case_and_fills_gaps() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"theme":"dark","defaultUnitPrice":"12.50"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.default_unit_price, dec!(12.50));
        assert_eq!(settings.session_timeout_minutes, 120);
    }

    #[tokio::test]
    async fn test_missing_file_loads_defaults() {
        let store = SettingsStore::load(temp_path()).await;
        assert_eq!(store.settings(), &AppSettings::default());
    }

    #[tokio::test]
    async fn test_update_round_trips_through_file() {
        let path = temp_path();
        let mut store = SettingsStore::load(&path).await;

        let mut next = store.settings().clone();
        next.company_name = "Al Waha Poultry".to_string();
        next.theme = Theme::Dark;
        store.update(next.clone()).await.unwrap();

        let reloaded = SettingsStore::load(&path).await;
        assert_eq!(reloaded.settings(), &next);
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        assert!(!PathBuf::from(temp).exists());
    }

    #[tokio::test]
    async fn test_invalid_update_keeps_current() {
        let mut store = SettingsStore::load(temp_path()).await;
        let invalid = AppSettings {
            company_name: String::new(),
            ..AppSettings::default()
        };

        assert!(matches!(store.update(invalid).await, Err(SettingsError::Invalid(_))));
        assert_eq!(store.settings(), &AppSettings::default());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_defaults() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = SettingsStore::load(&path).await;
        assert_eq!(store.settings(), &AppSettings::default());
    }

    #[tokio::test]
    async fn test_reset_and_backup_stamp() {
        let path = temp_path();
        let mut store = SettingsStore::load(&path).await;
        let mut next = store.settings().clone();
        next.language = "en".to_string();
        store.update(next).await.unwrap();

        let at = Utc.with_ymd_and_hms(2025, 6, 14, 23, 0, 0).unwrap();
        store.record_backup(at).await.unwrap();
        assert_eq!(SettingsStore::load(&path).await.settings().last_backup, Some(at));

        store.reset().await.unwrap();
        assert_eq!(SettingsStore::load(&path).await.settings(), &AppSettings::default());
    }
}
