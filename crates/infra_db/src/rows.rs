//! Database row types
//!
//! One `FromRow` struct per ledger table. Enumerations are stored as text
//! and parsed back here, so a row with an unknown status surfaces as
//! [`DatabaseError::InvalidData`] instead of a panic.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use core_kernel::{CustomerId, InvoiceId, PaymentId, PortError, TruckId, TruckLoadId};
use domain_ledger::{Customer, Invoice, LoadStatus, Payment, PaymentMethod, Truck, TruckLoad};

use crate::error::{db_to_port_error, DatabaseError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TruckRow {
    pub id: i64,
    pub truck_number: String,
    pub driver_name: String,
    pub driver_phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<TruckRow> for Truck {
    fn from(row: TruckRow) -> Self {
        Truck {
            id: TruckId::new(row.id),
            truck_number: row.truck_number,
            driver_name: row.driver_name,
            driver_phone: row.driver_phone,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TruckLoadRow {
    pub id: i64,
    pub truck_id: i64,
    pub load_date: NaiveDate,
    pub total_weight: Decimal,
    pub cages_count: i32,
    pub cages_weight: Decimal,
    pub notes: Option<String>,
    pub status: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TruckLoadRow> for TruckLoad {
    type Error = PortError;

    fn try_from(row: TruckLoadRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<LoadStatus>()
            .map_err(|e| db_to_port_error(DatabaseError::InvalidData(e)))?;

        Ok(TruckLoad {
            id: TruckLoadId::new(row.id),
            truck_id: TruckId::new(row.truck_id),
            load_date: row.load_date,
            total_weight: row.total_weight,
            cages_count: row.cages_count,
            cages_weight: row.cages_weight,
            notes: row.notes,
            status,
            is_completed: row.is_completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub credit_limit: Decimal,
    pub total_debt: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: CustomerId::new(row.id),
            customer_name: row.customer_name,
            phone_number: row.phone_number,
            address: row.address,
            credit_limit: row.credit_limit,
            total_debt: row.total_debt,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: i64,
    pub truck_id: i64,
    pub invoice_date: NaiveDate,
    pub gross_weight: Decimal,
    pub cages_weight: Decimal,
    pub cages_count: i32,
    pub net_weight: Decimal,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub previous_balance: Decimal,
    pub current_balance: Decimal,
    pub notes: Option<String>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: InvoiceId::new(row.id),
            invoice_number: row.invoice_number,
            customer_id: CustomerId::new(row.customer_id),
            truck_id: TruckId::new(row.truck_id),
            invoice_date: row.invoice_date,
            gross_weight: row.gross_weight,
            cages_weight: row.cages_weight,
            cages_count: row.cages_count,
            net_weight: row.net_weight,
            unit_price: row.unit_price,
            total_amount: row.total_amount,
            discount_percentage: row.discount_percentage,
            discount_amount: row.discount_amount,
            final_amount: row.final_amount,
            previous_balance: row.previous_balance,
            current_balance: row.current_balance,
            notes: row.notes,
            is_paid: row.is_paid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub customer_id: i64,
    pub invoice_id: Option<i64>,
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = PortError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| db_to_port_error(DatabaseError::InvalidData(e)))?;

        Ok(Payment {
            id: PaymentId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            invoice_id: row.invoice_id.map(InvoiceId::new),
            amount: row.amount,
            payment_method,
            payment_date: row.payment_date,
            reference_number: row.reference_number,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Converts fallible rows, stopping at the first bad one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, PortError>
where
    T: TryFrom<R, Error = PortError>,
{
    rows.into_iter().map(T::try_from).collect()
}
