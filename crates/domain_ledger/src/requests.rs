//! Input records for service operations

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, InvoiceId, TruckId};

use crate::payment::PaymentMethod;
use crate::truck::LoadStatus;

/// Request for registering a truck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTruckRequest {
    pub truck_number: String,
    pub driver_name: String,
    #[serde(default)]
    pub driver_phone: Option<String>,
}

/// Request for recording the day's load of a truck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTruckLoadRequest {
    pub truck_id: TruckId,
    pub load_date: NaiveDate,
    pub total_weight: Decimal,
    pub cages_count: i32,
    pub cages_weight: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request for correcting a load; truck and date are fixed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTruckLoadRequest {
    pub total_weight: Decimal,
    pub cages_count: i32,
    pub cages_weight: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: LoadStatus,
}

/// Request for creating a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub customer_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub credit_limit: Decimal,
}

/// Request for editing a customer; debt is not editable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCustomerRequest {
    pub customer_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub credit_limit: Decimal,
    pub is_active: bool,
}

impl UpdateCustomerRequest {
    /// The editable details, validated like a new customer
    pub fn details(&self) -> CreateCustomerRequest {
        CreateCustomerRequest {
            customer_name: self.customer_name.clone(),
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
            credit_limit: self.credit_limit,
        }
    }
}

/// Request for creating an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer_id: CustomerId,
    pub truck_id: TruckId,
    pub invoice_date: NaiveDate,
    pub gross_weight: Decimal,
    pub cages_weight: Decimal,
    pub cages_count: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request for correcting an invoice; the customer cannot change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub truck_id: TruckId,
    pub invoice_date: NaiveDate,
    pub gross_weight: Decimal,
    pub cages_weight: Decimal,
    pub cages_count: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateInvoiceRequest {
    /// The full invoice input for an existing customer
    pub fn for_customer(&self, customer_id: CustomerId) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            customer_id,
            truck_id: self.truck_id,
            invoice_date: self.invoice_date,
            gross_weight: self.gross_weight,
            cages_weight: self.cages_weight,
            cages_count: self.cages_count,
            unit_price: self.unit_price,
            discount_percentage: self.discount_percentage,
            notes: self.notes.clone(),
        }
    }
}

/// Request for applying a customer payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPaymentRequest {
    pub amount: Decimal,
    /// Invoice the payment settles, if any
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    /// Defaults to the business date
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
