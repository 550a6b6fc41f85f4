//! Payment repository

use async_trait::async_trait;
use sqlx::PgConnection;

use core_kernel::{CustomerId, InvoiceId, PaymentId, PortError};
use domain_ledger::ports::{PaymentRepository, PendingChange};
use domain_ledger::Payment;

use crate::error::sql_error;
use crate::rows::{convert_all, PaymentRow};
use crate::session::{on_session, SessionHandle};

/// PostgreSQL payments
#[derive(Debug, Clone)]
pub struct PgPayments {
    session: SessionHandle,
}

impl PgPayments {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

#[async_trait]
impl PaymentRepository for PgPayments {
    async fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Payment>, PortError> {
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, PaymentRow>(
                "SELECT id, customer_id, invoice_id, amount, payment_method, payment_date, \
                 reference_number, notes, created_at, updated_at \
                 FROM payments WHERE customer_id = $1 ORDER BY payment_date DESC, id DESC",
            )
            .bind(customer_id.value()),
            fetch_all
        )?;
        convert_all(rows)
    }

    async fn count_for_invoice(&self, invoice_id: InvoiceId) -> Result<u64, PortError> {
        let count = on_session!(
            self.session,
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments WHERE invoice_id = $1")
                .bind(invoice_id.value()),
            fetch_one
        )?;
        Ok(count.max(0) as u64)
    }

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<u64, PortError> {
        let count = on_session!(
            self.session,
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments WHERE customer_id = $1")
                .bind(customer_id.value()),
            fetch_one
        )?;
        Ok(count.max(0) as u64)
    }

    async fn add(&self, mut payment: Payment) -> Result<Payment, PortError> {
        payment.id = PaymentId::new(self.session.next_id("payments").await?);
        self.session.stage(PendingChange::AddPayment(payment.clone())).await;
        Ok(payment)
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, payment: &Payment) -> Result<(), PortError> {
    sqlx::query(
        "INSERT INTO payments (id, customer_id, invoice_id, amount, payment_method, payment_date, \
         reference_number, notes, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(payment.id.value())
    .bind(payment.customer_id.value())
    .bind(payment.invoice_id.map(|id| id.value()))
    .bind(payment.amount)
    .bind(payment.payment_method.as_str())
    .bind(payment.payment_date)
    .bind(&payment.reference_number)
    .bind(&payment.notes)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;
    Ok(())
}
