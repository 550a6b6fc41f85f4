//! Customers, payments and debt reporting

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use core_kernel::{round_money, Clock, CustomerId, InvoiceId, PaymentId};

use super::{clean_text, finish_transaction, respond};
use crate::customer::{normalize_name, Customer};
use crate::error::LedgerError;
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::ports::{UnitOfWork, UnitOfWorkProvider};
use crate::reports::{CustomerAccountSummary, DebtorSummary, DebtorsReport, PaymentReceipt, TOP_DEBTORS};
use crate::requests::{CreateCustomerRequest, ProcessPaymentRequest, UpdateCustomerRequest};
use crate::result::{ErrorCode, ServiceResult};
use crate::validation::{normalize_digits, BusinessRequest};

/// Maintains customers and applies their payments
pub struct CustomerService {
    provider: Arc<dyn UnitOfWorkProvider>,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(provider: Arc<dyn UnitOfWorkProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    /// Creates an active customer with no debt
    ///
    /// Names are unique among active customers, ignoring case and
    /// surrounding whitespace.
    pub async fn create_customer(&self, request: CreateCustomerRequest) -> ServiceResult<Customer> {
        info!(customer_name = %request.customer_name.trim(), "Creating customer");
        let outcome = self.try_create_customer(&request).await;
        respond("create the customer", outcome, ErrorCode::CreationError, |customer| {
            format!("Customer {} created successfully", customer.customer_name)
        })
    }

    /// Edits contact details, credit limit and the active flag
    pub async fn update_customer(&self, id: CustomerId, request: UpdateCustomerRequest) -> ServiceResult<Customer> {
        info!(customer_id = %id, "Updating customer");
        let outcome = self.try_update_customer(id, &request).await;
        respond("update the customer", outcome, ErrorCode::UpdateError, |customer| {
            format!("Customer {} updated successfully", customer.customer_name)
        })
    }

    /// Removes a customer that has never traded
    pub async fn delete_customer(&self, id: CustomerId) -> ServiceResult<()> {
        info!(customer_id = %id, "Deleting customer");
        let outcome = self.try_delete_customer(id).await;
        respond("delete the customer", outcome, ErrorCode::DeleteError, |_| {
            "Customer deleted successfully".to_string()
        })
    }

    pub async fn get_customer(&self, id: CustomerId) -> ServiceResult<Customer> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            existing_customer(&*uow, id).await
        }
        .await;
        respond("retrieve the customer", outcome, ErrorCode::RetrievalError, |_| {
            "Customer retrieved successfully".to_string()
        })
    }

    pub async fn active_customers(&self) -> ServiceResult<Vec<Customer>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.customers().list_active().await?)
        }
        .await;
        respond("retrieve customers", outcome, ErrorCode::RetrievalError, |customers| {
            format!("Retrieved {} customers", customers.len())
        })
    }

    /// Active customers owing money, largest debt first
    pub async fn customers_with_debt(&self) -> ServiceResult<Vec<Customer>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.customers().list_with_debt().await?)
        }
        .await;
        respond("retrieve customers with debt", outcome, ErrorCode::RetrievalError, |customers| {
            format!("Retrieved {} customers with debt", customers.len())
        })
    }

    /// Active customers whose name or phone contains the term
    pub async fn search_customers(&self, term: &str) -> ServiceResult<Vec<Customer>> {
        let outcome = async {
            let term = term.trim();
            if term.is_empty() {
                return Err(LedgerError::rejected(
                    ErrorCode::InvalidSearchTerm,
                    "Search term cannot be empty",
                ));
            }
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.customers().search(&normalize_digits(term)).await?)
        }
        .await;
        respond("search customers", outcome, ErrorCode::RetrievalError, |customers| {
            format!("Found {} customers", customers.len())
        })
    }

    /// The customer's current debt
    pub async fn customer_balance(&self, id: CustomerId) -> ServiceResult<Decimal> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(existing_customer(&*uow, id).await?.total_debt)
        }
        .await;
        respond("retrieve the customer balance", outcome, ErrorCode::RetrievalError, |_| {
            "Customer balance retrieved successfully".to_string()
        })
    }

    /// Payments of a customer, newest first
    pub async fn customer_payments(&self, id: CustomerId) -> ServiceResult<Vec<Payment>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            existing_customer(&*uow, id).await?;
            Ok::<_, LedgerError>(uow.payments().list_by_customer(id).await?)
        }
        .await;
        respond("retrieve customer payments", outcome, ErrorCode::RetrievalError, |payments| {
            format!("Retrieved {} payments", payments.len())
        })
    }

    /// Balance, credit and recent activity of one customer
    pub async fn customer_account_summary(&self, id: CustomerId) -> ServiceResult<CustomerAccountSummary> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            let customer = existing_customer(&*uow, id).await?;
            account_summary(&*uow, &customer).await
        }
        .await;
        respond("build the account summary", outcome, ErrorCode::ReportError, |summary| {
            format!("Account summary for {} generated", summary.customer_name)
        })
    }

    /// Applies a payment to the customer's debt and optionally settles an invoice
    ///
    /// The payment row, the new debt and the invoice's paid flag are written
    /// in one transaction. A payment larger than an outstanding debt is
    /// rejected; debt never drops below zero.
    pub async fn process_payment(
        &self,
        customer_id: CustomerId,
        request: ProcessPaymentRequest,
    ) -> ServiceResult<PaymentReceipt> {
        info!(
            customer_id = %customer_id,
            amount = %request.amount,
            method = %request.payment_method,
            "Processing payment"
        );
        let outcome = self.try_process_payment(customer_id, &request).await;
        respond("process the payment", outcome, ErrorCode::PaymentError, |receipt| {
            format!(
                "Payment of {} processed, new balance {}",
                receipt.payment.amount, receipt.new_balance
            )
        })
    }

    /// Outstanding debt with aging bands and the top debtors' statements
    pub async fn generate_debtors_report(&self) -> ServiceResult<DebtorsReport> {
        info!("Generating debtors report");
        let outcome = self.try_debtors_report().await;
        respond("generate the debtors report", outcome, ErrorCode::ReportError, |report| {
            format!("Debtors report generated for {} customers", report.total_debtors)
        })
    }

    async fn try_create_customer(&self, request: &CreateCustomerRequest) -> Result<Customer, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            validate_customer(request, self.clock.today())?;
            ensure_unique_name(&*uow, &request.customer_name, None).await?;

            let customer = Customer::new(
                request.customer_name.trim(),
                clean_phone(request.phone_number.as_deref()),
                clean_text(request.address.as_deref()),
                request.credit_limit,
                self.clock.now(),
            );
            let customer = uow.customers().add(customer).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(customer)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_update_customer(&self, id: CustomerId, request: &UpdateCustomerRequest) -> Result<Customer, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let mut customer = existing_customer(&*uow, id).await?;
            validate_customer(&request.details(), self.clock.today())?;
            ensure_unique_name(&*uow, &request.customer_name, Some(id)).await?;

            customer.customer_name = request.customer_name.trim().to_string();
            customer.phone_number = clean_phone(request.phone_number.as_deref());
            customer.address = clean_text(request.address.as_deref());
            customer.credit_limit = request.credit_limit;
            customer.is_active = request.is_active;
            customer.updated_at = Some(self.clock.now());
            uow.customers().update(customer.clone()).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(customer)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_delete_customer(&self, id: CustomerId) -> Result<(), LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            existing_customer(&*uow, id).await?;
            let invoices = uow.invoices().count_for_customer(id).await?;
            let payments = uow.payments().count_for_customer(id).await?;
            if invoices > 0 || payments > 0 {
                return Err(LedgerError::conflict(
                    ErrorCode::HasTransactions,
                    "Cannot delete customer with existing invoices or payments",
                ));
            }
            uow.customers().remove(id).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(())
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_process_payment(
        &self,
        customer_id: CustomerId,
        request: &ProcessPaymentRequest,
    ) -> Result<PaymentReceipt, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = self.process_payment_in(uow.as_mut(), customer_id, request).await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn process_payment_in(
        &self,
        uow: &mut dyn UnitOfWork,
        customer_id: CustomerId,
        request: &ProcessPaymentRequest,
    ) -> Result<PaymentReceipt, LedgerError> {
        let today = self.clock.today();
        let validation = BusinessRequest::Payment(request).validate(today);
        if !validation.is_valid {
            return Err(LedgerError::validation("Payment validation failed", validation.errors));
        }

        let mut customer = match uow.customers().get_for_update(customer_id).await? {
            Some(customer) if customer.is_active => customer,
            _ => {
                return Err(LedgerError::not_found(
                    ErrorCode::CustomerNotFound,
                    "Customer not found or inactive",
                ))
            }
        };

        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::rejected(
                ErrorCode::InvalidAmount,
                "Payment amount must be greater than zero",
            ));
        }
        if customer.has_debt() && request.amount > customer.total_debt {
            return Err(LedgerError::conflict(
                ErrorCode::Overpayment,
                format!(
                    "Payment amount ({}) exceeds customer debt ({})",
                    request.amount, customer.total_debt
                ),
            ));
        }

        let settled_invoice = match request.invoice_id {
            Some(invoice_id) => self.settleable_invoice(&*uow, customer_id, invoice_id, request.amount).await?,
            None => None,
        };

        let now = self.clock.now();
        let payment = Payment {
            id: PaymentId::UNASSIGNED,
            customer_id,
            invoice_id: request.invoice_id,
            amount: request.amount,
            payment_method: request.payment_method,
            payment_date: request.payment_date.unwrap_or(today),
            reference_number: clean_text(request.reference_number.as_deref()),
            notes: clean_text(request.notes.as_deref()),
            created_at: now,
            updated_at: None,
        };
        let payment = uow.payments().add(payment).await?;

        customer.total_debt = round_money((customer.total_debt - request.amount).max(Decimal::ZERO));
        customer.updated_at = Some(now);
        let new_balance = customer.total_debt;
        uow.customers().update(customer).await?;

        let invoice_settled = settled_invoice.is_some();
        if let Some(mut invoice) = settled_invoice {
            invoice.is_paid = true;
            invoice.updated_at = Some(now);
            uow.invoices().update(invoice).await?;
        }

        uow.save_changes().await?;
        info!(
            payment_id = %payment.id,
            customer_id = %customer_id,
            new_balance = %new_balance,
            invoice_settled,
            "Payment applied"
        );

        Ok(PaymentReceipt {
            payment,
            new_balance,
            invoice_settled,
        })
    }

    /// The referenced invoice when this payment settles it
    async fn settleable_invoice(
        &self,
        uow: &dyn UnitOfWork,
        customer_id: CustomerId,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<Option<Invoice>, LedgerError> {
        let invoice = match uow.invoices().get(invoice_id).await? {
            Some(invoice) if invoice.customer_id == customer_id => invoice,
            _ => {
                return Err(LedgerError::not_found(
                    ErrorCode::InvoiceNotFound,
                    "Invoice not found for this customer",
                ))
            }
        };
        if invoice.is_paid {
            return Err(LedgerError::conflict(
                ErrorCode::InvoiceAlreadyPaid,
                format!("Invoice {} is already paid", invoice.invoice_number),
            ));
        }

        if amount >= invoice.final_amount {
            Ok(Some(invoice))
        } else {
            debug!(invoice_number = %invoice.invoice_number, "Partial payment leaves invoice open");
            Ok(None)
        }
    }

    async fn try_debtors_report(&self) -> Result<DebtorsReport, LedgerError> {
        let today = self.clock.today();
        let uow = self.provider.unit_of_work().await?;
        let customers = uow.customers().list_with_debt().await?;

        let mut debtors = Vec::with_capacity(customers.len());
        let mut top_debtors = Vec::new();
        for customer in &customers {
            let invoices = uow.invoices().list_by_customer(customer.id, None, None).await?;
            let payments = uow.payments().list_by_customer(customer.id).await?;
            debtors.push(DebtorSummary::build(customer, &invoices, &payments, today));
            if top_debtors.len() < TOP_DEBTORS {
                top_debtors.push(CustomerAccountSummary::build(customer, &invoices, &payments));
            }
        }

        Ok(DebtorsReport::assemble(today, debtors, top_debtors))
    }
}

fn validate_customer(request: &CreateCustomerRequest, today: NaiveDate) -> Result<(), LedgerError> {
    let validation = BusinessRequest::Customer(request).validate(today);
    for warning in &validation.warnings {
        warn!(customer_name = %request.customer_name.trim(), "{}", warning);
    }
    if validation.is_valid {
        Ok(())
    } else {
        Err(LedgerError::validation("Customer validation failed", validation.errors))
    }
}

async fn ensure_unique_name(
    uow: &dyn UnitOfWork,
    name: &str,
    exclude: Option<CustomerId>,
) -> Result<(), LedgerError> {
    let existing = uow
        .customers()
        .find_active_by_name(&normalize_name(name), exclude)
        .await?;
    match existing {
        Some(_) => Err(LedgerError::conflict(
            ErrorCode::DuplicateCustomer,
            "A customer with this name already exists",
        )),
        None => Ok(()),
    }
}

async fn existing_customer(uow: &dyn UnitOfWork, id: CustomerId) -> Result<Customer, LedgerError> {
    uow.customers()
        .get(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(ErrorCode::CustomerNotFound, format!("Customer {} not found", id)))
}

async fn account_summary(uow: &dyn UnitOfWork, customer: &Customer) -> Result<CustomerAccountSummary, LedgerError> {
    let invoices = uow.invoices().list_by_customer(customer.id, None, None).await?;
    let payments = uow.payments().list_by_customer(customer.id).await?;
    Ok(CustomerAccountSummary::build(customer, &invoices, &payments))
}

/// Phone with ASCII digits, or nothing when blank
fn clean_phone(phone: Option<&str>) -> Option<String> {
    clean_text(phone).map(|p| normalize_digits(&p))
}
