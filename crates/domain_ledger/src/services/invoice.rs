//! Invoice lifecycle and sales reporting

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use core_kernel::{Clock, CustomerId, DateRange, InvoiceId};

use super::{clean_text, finish_transaction, respond};
use crate::calculation::{calculate_invoice_amounts, InvoiceCalculation, InvoiceCalculationInput};
use crate::customer::Customer;
use crate::error::LedgerError;
use crate::invoice::Invoice;
use crate::numbering::{invoice_number_prefix, next_invoice_number};
use crate::ports::{UnitOfWork, UnitOfWorkProvider};
use crate::reports::SalesReport;
use crate::requests::{CreateInvoiceRequest, UpdateInvoiceRequest};
use crate::result::{ErrorCode, ServiceResult};
use crate::truck::Truck;
use crate::validation::BusinessRequest;

const INVOICE_VALIDATION_FAILED: &str = "Invoice validation failed";

/// Creates, corrects and reports on invoices
///
/// Every write moves the customer's running debt in the same transaction as
/// the invoice row.
pub struct InvoiceService {
    provider: Arc<dyn UnitOfWorkProvider>,
    clock: Arc<dyn Clock>,
}

impl InvoiceService {
    pub fn new(provider: Arc<dyn UnitOfWorkProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    /// Creates an invoice and adds its final amount to the customer's debt
    ///
    /// The invoice number is taken from the business date, and the previous
    /// balance recorded on the invoice is the customer's debt before it.
    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> ServiceResult<Invoice> {
        info!(
            customer_id = %request.customer_id,
            truck_id = %request.truck_id,
            gross_weight = %request.gross_weight,
            "Creating invoice"
        );
        let outcome = self.try_create_invoice(&request).await;
        respond("create the invoice", outcome, ErrorCode::CreationError, |invoice| {
            format!("Invoice {} created successfully", invoice.invoice_number)
        })
    }

    /// Recomputes an invoice and moves the customer's debt by the difference
    pub async fn update_invoice(&self, id: InvoiceId, request: UpdateInvoiceRequest) -> ServiceResult<Invoice> {
        info!(invoice_id = %id, "Updating invoice");
        let outcome = self.try_update_invoice(id, &request).await;
        respond("update the invoice", outcome, ErrorCode::UpdateError, |invoice| {
            format!("Invoice {} updated successfully", invoice.invoice_number)
        })
    }

    /// Removes an invoice without payments and takes it off the customer's debt
    pub async fn delete_invoice(&self, id: InvoiceId) -> ServiceResult<()> {
        info!(invoice_id = %id, "Deleting invoice");
        let outcome = self.try_delete_invoice(id).await;
        respond("delete the invoice", outcome, ErrorCode::DeleteError, |_| {
            "Invoice deleted successfully".to_string()
        })
    }

    /// Sets the paid flag; balances are not touched
    pub async fn mark_invoice_as_paid(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        let outcome = self.try_mark_paid(id).await;
        respond("mark the invoice as paid", outcome, ErrorCode::UpdateError, |invoice| {
            format!("Invoice {} marked as paid", invoice.invoice_number)
        })
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        let outcome = self.try_get_invoice(id).await;
        respond("retrieve the invoice", outcome, ErrorCode::RetrievalError, |_| {
            "Invoice retrieved successfully".to_string()
        })
    }

    /// Invoices dated within `start..=end`
    pub async fn invoices_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> ServiceResult<Vec<Invoice>> {
        let outcome = async {
            let range = report_range(start, end)?;
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.invoices().list_by_date_range(range).await?)
        }
        .await;
        respond("retrieve invoices", outcome, ErrorCode::RetrievalError, |invoices| {
            format!("Retrieved {} invoices", invoices.len())
        })
    }

    /// Invoices of one customer, optionally bounded by date
    pub async fn invoices_by_customer(
        &self,
        customer_id: CustomerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ServiceResult<Vec<Invoice>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.invoices().list_by_customer(customer_id, start, end).await?)
        }
        .await;
        respond("retrieve customer invoices", outcome, ErrorCode::RetrievalError, |invoices| {
            format!("Retrieved {} invoices", invoices.len())
        })
    }

    pub async fn unpaid_invoices(&self) -> ServiceResult<Vec<Invoice>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.invoices().list_unpaid().await?)
        }
        .await;
        respond("retrieve unpaid invoices", outcome, ErrorCode::RetrievalError, |invoices| {
            format!("Retrieved {} unpaid invoices", invoices.len())
        })
    }

    /// Live preview of the invoice arithmetic; nothing is stored
    pub fn calculate_invoice_amounts(&self, input: &InvoiceCalculationInput) -> ServiceResult<InvoiceCalculation> {
        respond(
            "calculate invoice amounts",
            calculate_invoice_amounts(input),
            ErrorCode::CalculationError,
            |_| "Invoice amounts calculated".to_string(),
        )
    }

    /// The number the next invoice created today would receive
    pub async fn preview_invoice_number(&self) -> ServiceResult<String> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            self.next_number(&*uow).await
        }
        .await;
        respond("generate the invoice number", outcome, ErrorCode::NumberGenerationError, |number| {
            format!("Next invoice number is {}", number)
        })
    }

    /// Sales totals and breakdowns for `start..=end`
    pub async fn generate_sales_report(&self, start: NaiveDate, end: NaiveDate) -> ServiceResult<SalesReport> {
        info!(%start, %end, "Generating sales report");
        let outcome = self.try_sales_report(start, end).await;
        respond("generate the sales report", outcome, ErrorCode::ReportError, |report| {
            if report.total_invoices == 0 {
                "No sales data found for the specified period".to_string()
            } else {
                "Sales report generated successfully".to_string()
            }
        })
    }

    async fn try_create_invoice(&self, request: &CreateInvoiceRequest) -> Result<Invoice, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = self.create_in(uow.as_mut(), request).await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn create_in(&self, uow: &mut dyn UnitOfWork, request: &CreateInvoiceRequest) -> Result<Invoice, LedgerError> {
        let validation = BusinessRequest::Invoice(request).validate(self.clock.today());
        if !validation.is_valid {
            return Err(LedgerError::validation(INVOICE_VALIDATION_FAILED, validation.errors));
        }

        let mut customer = active_customer(uow, request.customer_id).await?;
        active_truck(uow, request).await?;

        let invoice_number = self.next_number(uow).await?;
        let previous_balance = customer.total_debt;
        let calculation = calculate_invoice_amounts(&calculation_input(request, previous_balance))?;

        let now = self.clock.now();
        let invoice = Invoice {
            id: InvoiceId::UNASSIGNED,
            invoice_number,
            customer_id: request.customer_id,
            truck_id: request.truck_id,
            invoice_date: request.invoice_date,
            gross_weight: request.gross_weight,
            cages_weight: request.cages_weight,
            cages_count: request.cages_count,
            net_weight: calculation.net_weight,
            unit_price: request.unit_price,
            total_amount: calculation.total_amount,
            discount_percentage: request.discount_percentage,
            discount_amount: calculation.discount_amount,
            final_amount: calculation.final_amount,
            previous_balance,
            current_balance: calculation.current_balance,
            notes: clean_text(request.notes.as_deref()),
            is_paid: false,
            created_at: now,
            updated_at: None,
        };
        let invoice = uow.invoices().add(invoice).await?;

        customer.total_debt = calculation.current_balance;
        customer.updated_at = Some(now);
        uow.customers().update(customer).await?;
        uow.save_changes().await?;

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            final_amount = %invoice.final_amount,
            "Invoice stored"
        );
        Ok(invoice)
    }

    async fn try_update_invoice(&self, id: InvoiceId, request: &UpdateInvoiceRequest) -> Result<Invoice, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = self.update_in(uow.as_mut(), id, request).await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn update_in(
        &self,
        uow: &mut dyn UnitOfWork,
        id: InvoiceId,
        request: &UpdateInvoiceRequest,
    ) -> Result<Invoice, LedgerError> {
        let customer_id = existing_invoice(uow, id).await?.customer_id;
        let customer = uow.customers().get_for_update(customer_id).await?;
        // Re-read under the customer lock so a concurrent edit is not lost
        let mut invoice = existing_invoice(uow, id).await?;
        let full_request = request.for_customer(invoice.customer_id);

        let validation = BusinessRequest::Invoice(&full_request).validate(self.clock.today());
        if !validation.is_valid {
            return Err(LedgerError::validation(INVOICE_VALIDATION_FAILED, validation.errors));
        }
        active_truck(uow, &full_request).await?;

        let mut customer = customer.ok_or_else(|| {
            LedgerError::not_found(
                ErrorCode::CustomerNotFound,
                format!("Customer {} not found", invoice.customer_id),
            )
        })?;

        // Debt without this invoice, before the corrected amount is added back
        let previous_balance = customer.total_debt - invoice.final_amount;
        let calculation = calculate_invoice_amounts(&calculation_input(&full_request, previous_balance))?;
        debug!(
            invoice_id = %id,
            old_final = %invoice.final_amount,
            new_final = %calculation.final_amount,
            "Recomputed invoice"
        );

        let now = self.clock.now();
        invoice.truck_id = full_request.truck_id;
        invoice.invoice_date = full_request.invoice_date;
        invoice.gross_weight = full_request.gross_weight;
        invoice.cages_weight = full_request.cages_weight;
        invoice.cages_count = full_request.cages_count;
        invoice.unit_price = full_request.unit_price;
        invoice.discount_percentage = full_request.discount_percentage;
        invoice.notes = clean_text(full_request.notes.as_deref());
        invoice.apply_calculation(&calculation, previous_balance);
        invoice.updated_at = Some(now);
        uow.invoices().update(invoice.clone()).await?;

        customer.total_debt = calculation.current_balance;
        customer.updated_at = Some(now);
        uow.customers().update(customer).await?;
        uow.save_changes().await?;
        Ok(invoice)
    }

    async fn try_delete_invoice(&self, id: InvoiceId) -> Result<(), LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = self.delete_in(uow.as_mut(), id).await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn delete_in(&self, uow: &mut dyn UnitOfWork, id: InvoiceId) -> Result<(), LedgerError> {
        let customer_id = existing_invoice(uow, id).await?.customer_id;
        let customer = uow.customers().get_for_update(customer_id).await?;
        let invoice = existing_invoice(uow, id).await?;

        if uow.payments().count_for_invoice(id).await? > 0 {
            return Err(LedgerError::conflict(
                ErrorCode::HasPayments,
                "Cannot delete invoice with existing payments",
            ));
        }

        if let Some(mut customer) = customer {
            customer.total_debt -= invoice.final_amount;
            customer.updated_at = Some(self.clock.now());
            uow.customers().update(customer).await?;
        }
        uow.invoices().remove(id).await?;
        uow.save_changes().await?;

        info!(invoice_number = %invoice.invoice_number, final_amount = %invoice.final_amount, "Invoice removed");
        Ok(())
    }

    async fn try_mark_paid(&self, id: InvoiceId) -> Result<Invoice, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let mut invoice = existing_invoice(&*uow, id).await?;
            invoice.is_paid = true;
            invoice.updated_at = Some(self.clock.now());
            uow.invoices().update(invoice.clone()).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(invoice)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_get_invoice(&self, id: InvoiceId) -> Result<Invoice, LedgerError> {
        let uow = self.provider.unit_of_work().await?;
        existing_invoice(&*uow, id).await
    }

    async fn try_sales_report(&self, start: NaiveDate, end: NaiveDate) -> Result<SalesReport, LedgerError> {
        let range = report_range(start, end)?;
        let uow = self.provider.unit_of_work().await?;
        let invoices = uow.invoices().list_by_date_range(range).await?;
        if invoices.is_empty() {
            return Ok(SalesReport::empty(range));
        }

        let mut customer_names = HashMap::new();
        let mut truck_numbers = HashMap::new();
        for invoice in &invoices {
            if !customer_names.contains_key(&invoice.customer_id) {
                if let Some(customer) = uow.customers().get(invoice.customer_id).await? {
                    customer_names.insert(customer.id, customer.customer_name);
                }
            }
            if !truck_numbers.contains_key(&invoice.truck_id) {
                if let Some(truck) = uow.trucks().get(invoice.truck_id).await? {
                    truck_numbers.insert(truck.id, truck.truck_number);
                }
            }
        }

        Ok(SalesReport::aggregate(range, &invoices, &customer_names, &truck_numbers))
    }

    async fn next_number(&self, uow: &dyn UnitOfWork) -> Result<String, LedgerError> {
        let today = self.clock.today();
        let last = uow
            .invoices()
            .last_number_with_prefix(&invoice_number_prefix(today))
            .await?;
        next_invoice_number(today, last.as_deref())
    }
}

fn calculation_input(request: &CreateInvoiceRequest, previous_balance: Decimal) -> InvoiceCalculationInput {
    InvoiceCalculationInput {
        gross_weight: request.gross_weight,
        cages_weight: request.cages_weight,
        unit_price: request.unit_price,
        discount_percentage: request.discount_percentage,
        previous_balance,
    }
}

fn report_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, LedgerError> {
    DateRange::new(start, end)
        .map_err(|e| LedgerError::validation("Invalid report period", vec![e.to_string()]))
}

async fn existing_invoice(uow: &dyn UnitOfWork, id: InvoiceId) -> Result<Invoice, LedgerError> {
    uow.invoices()
        .get(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(ErrorCode::InvoiceNotFound, format!("Invoice {} not found", id)))
}

/// Locks the customer row for the debt update that follows
async fn active_customer(uow: &dyn UnitOfWork, id: CustomerId) -> Result<Customer, LedgerError> {
    match uow.customers().get_for_update(id).await? {
        Some(customer) if customer.is_active => Ok(customer),
        _ => Err(LedgerError::not_found(
            ErrorCode::CustomerInvalid,
            "Selected customer not found or inactive",
        )),
    }
}

async fn active_truck(uow: &dyn UnitOfWork, request: &CreateInvoiceRequest) -> Result<Truck, LedgerError> {
    match uow.trucks().get(request.truck_id).await? {
        Some(truck) if truck.is_active => Ok(truck),
        _ => Err(LedgerError::not_found(
            ErrorCode::TruckInvalid,
            "Selected truck not found or inactive",
        )),
    }
}
