//! Query strings and small request/response bodies of the HTTP layer
//!
//! Ledger requests and results are the domain types themselves; only the
//! shapes that exist purely for HTTP live here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// `?start=YYYY-MM-DD&end=YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Period bounds that may be left open
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OpenPeriodQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// A business date; today when absent
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CustomerListQuery {
    /// Only customers owing money, largest debt first
    #[serde(default)]
    pub with_debt: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Backup schedule as seen at the time of the request
#[derive(Debug, Clone, Serialize)]
pub struct BackupStatus {
    pub due: bool,
    pub enabled: bool,
    pub interval_days: u32,
    pub last_backup: Option<DateTime<Utc>>,
}
