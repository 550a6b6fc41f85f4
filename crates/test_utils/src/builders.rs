//! Test Data Builders
//!
//! Provides builder patterns for constructing service requests with sensible
//! defaults. Tests set only the fields they care about.
//!
//! The default invoice is the reference sale: 100.000 kg gross, 20.000 kg of
//! cages in 5 cages, 10.00 per kg and 5 % discount, which nets 80.000 kg and
//! a final amount of 760.00.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, InvoiceId, TruckId};
use domain_ledger::{
    CreateCustomerRequest, CreateInvoiceRequest, CreateTruckLoadRequest, CreateTruckRequest,
    LoadStatus, PaymentMethod, ProcessPaymentRequest, UpdateCustomerRequest, UpdateInvoiceRequest,
    UpdateTruckLoadRequest,
};

use crate::fixtures::TemporalFixtures;

/// Builder for invoice requests
pub struct InvoiceRequestBuilder {
    request: CreateInvoiceRequest,
}

impl InvoiceRequestBuilder {
    /// The reference sale for a customer from a truck on the business date
    pub fn new(customer_id: CustomerId, truck_id: TruckId) -> Self {
        Self {
            request: CreateInvoiceRequest {
                customer_id,
                truck_id,
                invoice_date: TemporalFixtures::business_date(),
                gross_weight: dec!(100.000),
                cages_weight: dec!(20.000),
                cages_count: 5,
                unit_price: dec!(10.00),
                discount_percentage: dec!(5),
                notes: None,
            },
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.request.invoice_date = date;
        self
    }

    /// Sets gross and cages weight
    pub fn with_weights(mut self, gross: Decimal, cages: Decimal) -> Self {
        self.request.gross_weight = gross;
        self.request.cages_weight = cages;
        self
    }

    pub fn with_cages_count(mut self, count: i32) -> Self {
        self.request.cages_count = count;
        self
    }

    pub fn with_unit_price(mut self, price: Decimal) -> Self {
        self.request.unit_price = price;
        self
    }

    pub fn with_discount(mut self, percentage: Decimal) -> Self {
        self.request.discount_percentage = percentage;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> CreateInvoiceRequest {
        self.request
    }

    /// The same figures as an update request
    pub fn build_update(self) -> UpdateInvoiceRequest {
        UpdateInvoiceRequest {
            truck_id: self.request.truck_id,
            invoice_date: self.request.invoice_date,
            gross_weight: self.request.gross_weight,
            cages_weight: self.request.cages_weight,
            cages_count: self.request.cages_count,
            unit_price: self.request.unit_price,
            discount_percentage: self.request.discount_percentage,
            notes: self.request.notes,
        }
    }
}

/// Builder for payment requests
pub struct PaymentRequestBuilder {
    request: ProcessPaymentRequest,
}

impl PaymentRequestBuilder {
    /// A cash payment on the business date, not tied to an invoice
    pub fn new(amount: Decimal) -> Self {
        Self {
            request: ProcessPaymentRequest {
                amount,
                invoice_id: None,
                payment_date: None,
                payment_method: PaymentMethod::Cash,
                reference_number: None,
                notes: None,
            },
        }
    }

    /// Applies the payment against an invoice
    pub fn for_invoice(mut self, invoice_id: InvoiceId) -> Self {
        self.request.invoice_id = Some(invoice_id);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.request.payment_date = Some(date);
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.request.payment_method = method;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.request.reference_number = Some(reference.into());
        self
    }

    pub fn build(self) -> ProcessPaymentRequest {
        self.request
    }
}

/// Builder for truck-load requests
pub struct TruckLoadRequestBuilder {
    request: CreateTruckLoadRequest,
}

impl TruckLoadRequestBuilder {
    /// A 500.000 kg load with 40 cages weighing 60.000 kg on the business date
    pub fn new(truck_id: TruckId) -> Self {
        Self {
            request: CreateTruckLoadRequest {
                truck_id,
                load_date: TemporalFixtures::business_date(),
                total_weight: dec!(500.000),
                cages_count: 40,
                cages_weight: dec!(60.000),
                notes: None,
            },
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.request.load_date = date;
        self
    }

    pub fn with_total_weight(mut self, weight: Decimal) -> Self {
        self.request.total_weight = weight;
        self
    }

    pub fn with_cages(mut self, count: i32, weight: Decimal) -> Self {
        self.request.cages_count = count;
        self.request.cages_weight = weight;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> CreateTruckLoadRequest {
        self.request
    }

    /// The same figures as an update request with a new status
    pub fn build_update(self, status: LoadStatus) -> UpdateTruckLoadRequest {
        UpdateTruckLoadRequest {
            total_weight: self.request.total_weight,
            cages_count: self.request.cages_count,
            cages_weight: self.request.cages_weight,
            notes: self.request.notes,
            status,
        }
    }
}

/// Builder for customer requests
pub struct CustomerRequestBuilder {
    request: CreateCustomerRequest,
}

impl CustomerRequestBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            request: CreateCustomerRequest {
                customer_name: name.into(),
                phone_number: None,
                address: None,
                credit_limit: Decimal::ZERO,
            },
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.request.phone_number = Some(phone.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.request.address = Some(address.into());
        self
    }

    pub fn with_credit_limit(mut self, limit: Decimal) -> Self {
        self.request.credit_limit = limit;
        self
    }

    pub fn build(self) -> CreateCustomerRequest {
        self.request
    }

    pub fn build_update(self, is_active: bool) -> UpdateCustomerRequest {
        UpdateCustomerRequest {
            customer_name: self.request.customer_name,
            phone_number: self.request.phone_number,
            address: self.request.address,
            credit_limit: self.request.credit_limit,
            is_active,
        }
    }
}

/// A truck registration request
pub fn truck_request(number: &str, driver: &str) -> CreateTruckRequest {
    CreateTruckRequest {
        truck_number: number.to_string(),
        driver_name: driver.to_string(),
        driver_phone: None,
    }
}
