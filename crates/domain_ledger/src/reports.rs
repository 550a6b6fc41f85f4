//! Report and receipt records
//!
//! Reports are fully computed and rounded here; printing and export only
//! render them. The aggregation functions are pure so they can be checked
//! without a store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use core_kernel::{
    percentage_of, round_money, round_percent, round_weight, CustomerId, DateRange, InvoiceId,
    TruckId, TruckLoadId,
};

use crate::customer::Customer;
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::truck::{Truck, TruckLoad};

/// How many invoices the sales report ranks
pub const TOP_INVOICES: usize = 10;

/// How many recent invoices and payments an account summary lists
pub const RECENT_ITEMS: usize = 10;

/// How many account summaries the debtors report details
pub const TOP_DEBTORS: usize = 10;

/// One invoice line in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub net_weight: Decimal,
    pub final_amount: Decimal,
    pub is_paid: bool,
}

impl InvoiceSummary {
    pub fn new(invoice: &Invoice, customer_name: impl Into<String>) -> Self {
        Self {
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            invoice_date: invoice.invoice_date,
            customer_id: invoice.customer_id,
            customer_name: customer_name.into(),
            net_weight: invoice.net_weight,
            final_amount: invoice.final_amount,
            is_paid: invoice.is_paid,
        }
    }
}

/// Sales of one customer within a report period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSales {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub invoice_count: usize,
    pub total_amount: Decimal,
    pub total_weight: Decimal,
}

/// Sales from one truck within a report period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckSales {
    pub truck_id: TruckId,
    pub truck_number: String,
    pub invoice_count: usize,
    pub total_amount: Decimal,
    pub total_weight: Decimal,
}

/// Sales over an inclusive date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_invoices: usize,
    pub total_sales_amount: Decimal,
    pub total_net_weight: Decimal,
    pub average_unit_price: Decimal,
    /// Largest buyer first
    pub customer_sales: Vec<CustomerSales>,
    /// Largest seller first
    pub truck_sales: Vec<TruckSales>,
    /// Ten largest invoices by final amount
    pub top_invoices: Vec<InvoiceSummary>,
}

impl SalesReport {
    /// A report with no sales
    pub fn empty(range: DateRange) -> Self {
        Self {
            start_date: range.start,
            end_date: range.end,
            total_invoices: 0,
            total_sales_amount: Decimal::ZERO,
            total_net_weight: Decimal::ZERO,
            average_unit_price: Decimal::ZERO,
            customer_sales: Vec::new(),
            truck_sales: Vec::new(),
            top_invoices: Vec::new(),
        }
    }

    /// Aggregates the invoices of the range
    ///
    /// Missing names fall back to the identifier's display form.
    pub fn aggregate(
        range: DateRange,
        invoices: &[Invoice],
        customer_names: &HashMap<CustomerId, String>,
        truck_numbers: &HashMap<TruckId, String>,
    ) -> Self {
        if invoices.is_empty() {
            return Self::empty(range);
        }

        let customer_name =
            |id: CustomerId| customer_names.get(&id).cloned().unwrap_or_else(|| id.to_string());
        let truck_number =
            |id: TruckId| truck_numbers.get(&id).cloned().unwrap_or_else(|| id.to_string());

        let mut by_customer: BTreeMap<CustomerId, CustomerSales> = BTreeMap::new();
        let mut by_truck: BTreeMap<TruckId, TruckSales> = BTreeMap::new();
        for invoice in invoices {
            let customer = by_customer.entry(invoice.customer_id).or_insert_with(|| CustomerSales {
                customer_id: invoice.customer_id,
                customer_name: customer_name(invoice.customer_id),
                invoice_count: 0,
                total_amount: Decimal::ZERO,
                total_weight: Decimal::ZERO,
            });
            customer.invoice_count += 1;
            customer.total_amount += invoice.final_amount;
            customer.total_weight += invoice.net_weight;

            let truck = by_truck.entry(invoice.truck_id).or_insert_with(|| TruckSales {
                truck_id: invoice.truck_id,
                truck_number: truck_number(invoice.truck_id),
                invoice_count: 0,
                total_amount: Decimal::ZERO,
                total_weight: Decimal::ZERO,
            });
            truck.invoice_count += 1;
            truck.total_amount += invoice.final_amount;
            truck.total_weight += invoice.net_weight;
        }

        let mut customer_sales: Vec<_> = by_customer.into_values().collect();
        customer_sales.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
        let mut truck_sales: Vec<_> = by_truck.into_values().collect();
        truck_sales.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

        let mut ranked: Vec<&Invoice> = invoices.iter().collect();
        ranked.sort_by(|a, b| b.final_amount.cmp(&a.final_amount).then(a.id.cmp(&b.id)));
        let top_invoices = ranked
            .into_iter()
            .take(TOP_INVOICES)
            .map(|invoice| InvoiceSummary::new(invoice, customer_name(invoice.customer_id)))
            .collect();

        let count = Decimal::from(invoices.len());
        let price_sum: Decimal = invoices.iter().map(|i| i.unit_price).sum();

        Self {
            start_date: range.start,
            end_date: range.end,
            total_invoices: invoices.len(),
            total_sales_amount: round_money(invoices.iter().map(|i| i.final_amount).sum()),
            total_net_weight: round_weight(invoices.iter().map(|i| i.net_weight).sum()),
            average_unit_price: round_money(price_sum / count),
            customer_sales,
            truck_sales,
            top_invoices,
        }
    }
}

/// Statement of one customer's account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAccountSummary {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub current_balance: Decimal,
    pub credit_limit: Decimal,
    pub available_credit: Decimal,
    pub total_invoices: usize,
    pub unpaid_invoices: usize,
    pub total_purchases: Decimal,
    pub total_payments: Decimal,
    pub last_transaction_date: Option<NaiveDate>,
    /// Newest first
    pub recent_invoices: Vec<Invoice>,
    /// Newest first
    pub recent_payments: Vec<Payment>,
}

impl CustomerAccountSummary {
    /// Builds the statement from the customer's full history
    pub fn build(customer: &Customer, invoices: &[Invoice], payments: &[Payment]) -> Self {
        let mut recent_invoices = invoices.to_vec();
        recent_invoices.sort_by(|a, b| b.invoice_date.cmp(&a.invoice_date).then(b.id.cmp(&a.id)));
        recent_invoices.truncate(RECENT_ITEMS);

        let mut recent_payments = payments.to_vec();
        recent_payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(b.id.cmp(&a.id)));
        recent_payments.truncate(RECENT_ITEMS);

        Self {
            customer_id: customer.id,
            customer_name: customer.customer_name.clone(),
            phone_number: customer.phone_number.clone(),
            current_balance: customer.total_debt,
            credit_limit: customer.credit_limit,
            available_credit: customer.available_credit(),
            total_invoices: invoices.len(),
            unpaid_invoices: invoices.iter().filter(|i| !i.is_paid).count(),
            total_purchases: round_money(invoices.iter().map(|i| i.final_amount).sum()),
            total_payments: round_money(payments.iter().map(|p| p.amount).sum()),
            last_transaction_date: last_transaction_date(invoices, payments),
            recent_invoices,
            recent_payments,
        }
    }
}

/// Latest invoice or payment date
pub fn last_transaction_date(invoices: &[Invoice], payments: &[Payment]) -> Option<NaiveDate> {
    let last_invoice = invoices.iter().map(|i| i.invoice_date).max();
    let last_payment = payments.iter().map(|p| p.payment_date).max();
    last_invoice.max(last_payment)
}

/// Debt aging band by days since the last transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    Days0To30,
    Days31To60,
    Days61To90,
    Over90Days,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 4] = [
        AgingBucket::Days0To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90Days,
    ];

    /// Band for a customer; no transaction at all ages as "over 90"
    pub fn for_days(days: Option<i64>) -> Self {
        match days {
            Some(d) if d <= 30 => AgingBucket::Days0To30,
            Some(d) if d <= 60 => AgingBucket::Days31To60,
            Some(d) if d <= 90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90Days,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Days0To30 => "0-30 days",
            AgingBucket::Days31To60 => "31-60 days",
            AgingBucket::Days61To90 => "61-90 days",
            AgingBucket::Over90Days => "Over 90 days",
        }
    }
}

/// Outstanding debt in one aging band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgingBand {
    pub bucket: AgingBucket,
    pub label: String,
    pub customer_count: usize,
    pub total_debt: Decimal,
}

/// One debtor line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtorSummary {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub phone_number: Option<String>,
    pub total_debt: Decimal,
    pub credit_limit: Decimal,
    /// `None` when the customer never traded
    pub days_since_last_transaction: Option<i64>,
    pub aging: AgingBucket,
    pub unpaid_invoice_count: usize,
    pub oldest_unpaid_invoice_date: Option<NaiveDate>,
    pub oldest_unpaid_amount: Option<Decimal>,
}

impl DebtorSummary {
    pub fn build(customer: &Customer, invoices: &[Invoice], payments: &[Payment], today: NaiveDate) -> Self {
        let days = last_transaction_date(invoices, payments).map(|last| (today - last).num_days());
        let oldest_unpaid = invoices
            .iter()
            .filter(|i| !i.is_paid)
            .min_by(|a, b| a.invoice_date.cmp(&b.invoice_date).then(a.id.cmp(&b.id)));

        Self {
            customer_id: customer.id,
            customer_name: customer.customer_name.clone(),
            phone_number: customer.phone_number.clone(),
            total_debt: customer.total_debt,
            credit_limit: customer.credit_limit,
            days_since_last_transaction: days,
            aging: AgingBucket::for_days(days),
            unpaid_invoice_count: invoices.iter().filter(|i| !i.is_paid).count(),
            oldest_unpaid_invoice_date: oldest_unpaid.map(|i| i.invoice_date),
            oldest_unpaid_amount: oldest_unpaid.map(|i| i.final_amount),
        }
    }
}

/// Outstanding customer debt as of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtorsReport {
    pub report_date: NaiveDate,
    pub total_debtors: usize,
    pub total_outstanding_debt: Decimal,
    pub average_debt: Decimal,
    /// Largest debt first
    pub debtors: Vec<DebtorSummary>,
    /// Always the four bands, youngest first
    pub aging: Vec<AgingBand>,
    pub top_debtors: Vec<CustomerAccountSummary>,
}

impl DebtorsReport {
    /// Totals, averages and bands over debtors sorted by descending debt
    pub fn assemble(
        report_date: NaiveDate,
        debtors: Vec<DebtorSummary>,
        top_debtors: Vec<CustomerAccountSummary>,
    ) -> Self {
        let total: Decimal = debtors.iter().map(|d| d.total_debt).sum();
        let average_debt = if debtors.is_empty() {
            Decimal::ZERO
        } else {
            round_money(total / Decimal::from(debtors.len()))
        };

        let aging = AgingBucket::ALL
            .iter()
            .map(|bucket| {
                let members: Vec<_> = debtors.iter().filter(|d| d.aging == *bucket).collect();
                AgingBand {
                    bucket: *bucket,
                    label: bucket.label().to_string(),
                    customer_count: members.len(),
                    total_debt: round_money(members.iter().map(|d| d.total_debt).sum()),
                }
            })
            .collect();

        Self {
            report_date,
            total_debtors: debtors.len(),
            total_outstanding_debt: round_money(total),
            average_debt,
            debtors,
            aging,
            top_debtors,
        }
    }
}

/// Loaded weight against sold weight for one truck on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightComparisonReport {
    pub truck_id: TruckId,
    pub truck_number: String,
    pub driver_name: String,
    pub load_id: TruckLoadId,
    pub load_date: NaiveDate,
    pub loaded_weight: Decimal,
    pub sold_weight: Decimal,
    pub weight_difference: Decimal,
    /// Difference as a share of the loaded weight; 0 when nothing was loaded
    pub loss_percentage: Decimal,
    pub invoice_count: usize,
    pub total_sales_amount: Decimal,
    pub invoices: Vec<InvoiceSummary>,
}

impl WeightComparisonReport {
    /// Compares a load with the invoices of its truck and date
    pub fn compare(
        truck: &Truck,
        load: &TruckLoad,
        invoices: &[Invoice],
        customer_names: &HashMap<CustomerId, String>,
    ) -> Self {
        let loaded_weight = load.total_weight;
        let sold_weight = round_weight(invoices.iter().map(|i| i.net_weight).sum());
        let weight_difference = round_weight(loaded_weight - sold_weight);

        Self {
            truck_id: truck.id,
            truck_number: truck.truck_number.clone(),
            driver_name: truck.driver_name.clone(),
            load_id: load.id,
            load_date: load.load_date,
            loaded_weight,
            sold_weight,
            weight_difference,
            loss_percentage: percentage_of(weight_difference, loaded_weight),
            invoice_count: invoices.len(),
            total_sales_amount: round_money(invoices.iter().map(|i| i.final_amount).sum()),
            invoices: invoices
                .iter()
                .map(|invoice| {
                    let name = customer_names
                        .get(&invoice.customer_id)
                        .cloned()
                        .unwrap_or_else(|| invoice.customer_id.to_string());
                    InvoiceSummary::new(invoice, name)
                })
                .collect(),
        }
    }
}

/// Facility-wide weight and sales totals for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryReport {
    pub report_date: NaiveDate,
    pub truck_count: usize,
    pub total_loaded_weight: Decimal,
    pub total_sold_weight: Decimal,
    pub total_weight_loss: Decimal,
    /// Mean of the per-truck loss percentages
    pub average_loss_percentage: Decimal,
    pub total_sales_amount: Decimal,
    pub total_invoices: usize,
    pub trucks: Vec<WeightComparisonReport>,
}

impl DailySummaryReport {
    pub fn summarize(report_date: NaiveDate, trucks: Vec<WeightComparisonReport>) -> Self {
        let total_loaded_weight = round_weight(trucks.iter().map(|t| t.loaded_weight).sum());
        let total_sold_weight = round_weight(trucks.iter().map(|t| t.sold_weight).sum());
        let average_loss_percentage = if trucks.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = trucks.iter().map(|t| t.loss_percentage).sum();
            round_percent(sum / Decimal::from(trucks.len()))
        };

        Self {
            report_date,
            truck_count: trucks.len(),
            total_loaded_weight,
            total_sold_weight,
            total_weight_loss: round_weight(total_loaded_weight - total_sold_weight),
            average_loss_percentage,
            total_sales_amount: round_money(trucks.iter().map(|t| t.total_sales_amount).sum()),
            total_invoices: trucks.iter().map(|t| t.invoice_count).sum(),
            trucks,
        }
    }
}

/// Outcome of applying a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// Customer debt after the payment
    pub new_balance: Decimal,
    /// Whether the referenced invoice was marked paid
    pub invoice_settled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aging_bucket_edges() {
        assert_eq!(AgingBucket::for_days(Some(0)), AgingBucket::Days0To30);
        assert_eq!(AgingBucket::for_days(Some(30)), AgingBucket::Days0To30);
        assert_eq!(AgingBucket::for_days(Some(31)), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days(Some(60)), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days(Some(90)), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days(Some(91)), AgingBucket::Over90Days);
        assert_eq!(AgingBucket::for_days(None), AgingBucket::Over90Days);
    }

    #[test]
    fn test_empty_debtors_report_has_zero_average() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let report = DebtorsReport::assemble(date, Vec::new(), Vec::new());
        assert_eq!(report.average_debt, Decimal::ZERO);
        assert_eq!(report.aging.len(), 4);
        assert!(report.aging.iter().all(|band| band.customer_count == 0));
    }

    #[test]
    fn test_empty_daily_summary() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let report = DailySummaryReport::summarize(date, Vec::new());
        assert_eq!(report.average_loss_percentage, Decimal::ZERO);
        assert_eq!(report.truck_count, 0);
    }
}
