//! Core Kernel - Foundational types shared by the poultry ledger crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Integer surrogate identifiers for every stored entity
//! - Decimal precision rules for weights, money and percentages
//! - Business timezone, inclusive date ranges and the injectable clock
//! - The port traits and error type used by every persistence adapter

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{
    MoneyError, Percentage, round_half_even, round_money, round_percent, round_weight,
    percentage_of, MONEY_SCALE, PERCENT_SCALE, WEIGHT_SCALE,
};
pub use temporal::{Clock, DateRange, FixedClock, SystemClock, TemporalError, Timezone};
pub use identifiers::{CustomerId, InvoiceId, PaymentId, TruckId, TruckLoadId};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
