//! Sales invoices

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, InvoiceId, TruckId};

use crate::calculation::InvoiceCalculation;

/// A sale of birds from one truck to one customer
///
/// All computed fields come from [`calculate_invoice_amounts`]; the invoice
/// also records the customer's balance before and after it.
///
/// [`calculate_invoice_amounts`]: crate::calculation::calculate_invoice_amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// `YYMMDD` plus a 3-digit daily sequence
    pub invoice_number: String,
    pub customer_id: CustomerId,
    pub truck_id: TruckId,
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
    /// Customer debt before this invoice
    pub previous_balance: Decimal,
    /// Customer debt after this invoice
    pub current_balance: Decimal,
    pub notes: Option<String>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Copies computed amounts onto the invoice
    pub fn apply_calculation(&mut self, calculation: &InvoiceCalculation, previous_balance: Decimal) {
        self.net_weight = calculation.net_weight;
        self.total_amount = calculation.total_amount;
        self.discount_amount = calculation.discount_amount;
        self.final_amount = calculation.final_amount;
        self.previous_balance = previous_balance;
        self.current_balance = calculation.current_balance;
    }
}
