//! Ledger Domain - Poultry sales, truck loads and customer debt
//!
//! This crate holds the business core of the slaughterhouse point of sale:
//! trucks leave the facility with a weighed load, the birds are sold to
//! customers on invoices, and every invoice and payment moves the customer's
//! running debt.
//!
//! # Ledger Rules
//!
//! - Net weight is gross weight minus cages weight, kept to 3 decimals
//! - Amounts are kept to 2 decimals with banker's rounding
//! - `Customer::total_debt` is the authoritative running balance; invoice
//!   creation, update and deletion and payment application adjust it in the
//!   same transaction as the rows they write
//! - Invoice numbers are `YYMMDD` plus a 3-digit daily sequence
//!
//! # Services
//!
//! - [`InvoiceService`]: invoice lifecycle, numbering and the sales report
//! - [`CustomerService`]: customers, payments, account summaries and debt aging
//! - [`TruckLoadService`]: trucks, loads and weight-loss reports
//!
//! Every service operation returns a [`ServiceResult`]; business-rule
//! failures never escape as errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{InvoiceService, CreateInvoiceRequest};
//!
//! let service = InvoiceService::new(provider, clock);
//! let result = service.create_invoice(request).await;
//! if result.is_success {
//!     println!("created {}", result.data.unwrap().invoice_number);
//! }
//! ```

pub mod calculation;
pub mod customer;
pub mod error;
pub mod invoice;
pub mod numbering;
pub mod payment;
pub mod ports;
pub mod reports;
pub mod requests;
pub mod result;
pub mod services;
pub mod truck;
pub mod validation;

pub use calculation::{calculate_invoice_amounts, InvoiceCalculation, InvoiceCalculationInput};
pub use customer::Customer;
pub use error::LedgerError;
pub use invoice::Invoice;
pub use numbering::{invoice_number_prefix, next_invoice_number};
pub use payment::{Payment, PaymentMethod};
pub use ports::{TransactionState, UnitOfWork, UnitOfWorkProvider};
pub use requests::{
    CreateCustomerRequest, CreateInvoiceRequest, CreateTruckLoadRequest, CreateTruckRequest,
    ProcessPaymentRequest, UpdateCustomerRequest, UpdateInvoiceRequest, UpdateTruckLoadRequest,
};
pub use result::{ErrorCode, ErrorKind, ServiceResult};
pub use services::{CustomerService, InvoiceService, TruckLoadService};
pub use truck::{LoadStatus, Truck, TruckLoad};
pub use validation::{BusinessRequest, ValidationResult};
