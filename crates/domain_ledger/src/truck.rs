//! Trucks and the loads they carry out of the facility

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{round_weight, TruckId, TruckLoadId};

/// A delivery truck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: TruckId,
    /// Plate or fleet number, unique
    pub truck_number: String,
    pub driver_name: String,
    pub driver_phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Truck {
    /// Creates an active, not yet stored truck
    pub fn new(
        truck_number: impl Into<String>,
        driver_name: impl Into<String>,
        driver_phone: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TruckId::UNASSIGNED,
            truck_number: truck_number.into(),
            driver_name: driver_name.into(),
            driver_phone,
            is_active: true,
            created_at: now,
            updated_at: None,
        }
    }
}

/// Where a truck load is in its day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Weighed and loaded at the facility
    Loaded,
    /// On the road delivering
    InTransit,
    /// Back, with sales reconciled
    Completed,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Loaded => "Loaded",
            LoadStatus::InTransit => "InTransit",
            LoadStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Loaded" => Ok(LoadStatus::Loaded),
            "InTransit" => Ok(LoadStatus::InTransit),
            "Completed" => Ok(LoadStatus::Completed),
            other => Err(format!("Unknown load status: {}", other)),
        }
    }
}

/// The weighed load a truck takes out on one calendar day
///
/// At most one load exists per truck and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckLoad {
    pub id: TruckLoadId,
    pub truck_id: TruckId,
    pub load_date: NaiveDate,
    /// Gross weight including cages, in kg
    pub total_weight: Decimal,
    pub cages_count: i32,
    pub cages_weight: Decimal,
    pub notes: Option<String>,
    pub status: LoadStatus,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TruckLoad {
    /// Weight of birds only
    pub fn net_weight(&self) -> Decimal {
        round_weight(self.total_weight - self.cages_weight)
    }

    /// Moves the load to a new status; `Completed` also sets the flag
    pub fn set_status(&mut self, status: LoadStatus, now: DateTime<Utc>) {
        self.status = status;
        self.is_completed = status == LoadStatus::Completed;
        self.updated_at = Some(now);
    }
}
