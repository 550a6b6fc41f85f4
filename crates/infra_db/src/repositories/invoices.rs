//! Invoice repository
//!
//! Invoice numbers are allocated by scanning for the greatest number of the
//! day. Inside a transaction the scan first takes a transaction-scoped
//! advisory lock on the day prefix, so two concurrent sales serialise on it
//! instead of failing on the unique index.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::debug;

use core_kernel::{CustomerId, DateRange, InvoiceId, PortError, TruckId};
use domain_ledger::ports::{InvoiceRepository, PendingChange};
use domain_ledger::Invoice;

use crate::error::sql_error;
use crate::rows::InvoiceRow;
use crate::session::{on_session, SessionHandle};

const COLUMNS: &str = "id, invoice_number, customer_id, truck_id, invoice_date, gross_weight, cages_weight, \
                       cages_count, net_weight, unit_price, total_amount, discount_percentage, \
                       discount_amount, final_amount, previous_balance, current_balance, notes, is_paid, \
                       created_at, updated_at";

/// PostgreSQL invoices
#[derive(Debug, Clone)]
pub struct PgInvoices {
    session: SessionHandle,
}

impl PgInvoices {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

#[async_trait]
impl InvoiceRepository for PgInvoices {
    async fn get(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1");
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, InvoiceRow>(&sql).bind(id.value()),
            fetch_optional
        )?;
        Ok(row.map(Invoice::from))
    }

    async fn last_number_with_prefix(&self, prefix: &str) -> Result<Option<String>, PortError> {
        if self.session.in_transaction().await {
            debug!(prefix, "Locking invoice number prefix");
            on_session!(
                self.session,
                sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))").bind(prefix),
                execute
            )?;
        }

        on_session!(
            self.session,
            sqlx::query_scalar::<_, String>(
                "SELECT invoice_number FROM invoices WHERE starts_with(invoice_number, $1) \
                 ORDER BY invoice_number DESC LIMIT 1",
            )
            .bind(prefix),
            fetch_optional
        )
    }

    async fn list_by_date_range(&self, range: DateRange) -> Result<Vec<Invoice>, PortError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM invoices WHERE invoice_date BETWEEN $1 AND $2 \
             ORDER BY invoice_date, invoice_number"
        );
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, InvoiceRow>(&sql).bind(range.start).bind(range.end),
            fetch_all
        )?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    async fn list_by_customer(
        &self,
        customer_id: CustomerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, PortError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM invoices \
             WHERE customer_id = $1 \
               AND ($2::DATE IS NULL OR invoice_date >= $2) \
               AND ($3::DATE IS NULL OR invoice_date <= $3) \
             ORDER BY invoice_date, invoice_number"
        );
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, InvoiceRow>(&sql)
                .bind(customer_id.value())
                .bind(start)
                .bind(end),
            fetch_all
        )?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    async fn list_for_truck_on(&self, truck_id: TruckId, date: NaiveDate) -> Result<Vec<Invoice>, PortError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM invoices WHERE truck_id = $1 AND invoice_date = $2 \
             ORDER BY invoice_number"
        );
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, InvoiceRow>(&sql).bind(truck_id.value()).bind(date),
            fetch_all
        )?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    async fn list_unpaid(&self) -> Result<Vec<Invoice>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM invoices WHERE NOT is_paid ORDER BY invoice_date, invoice_number");
        let rows = on_session!(self.session, sqlx::query_as::<_, InvoiceRow>(&sql), fetch_all)?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    async fn count_for_customer(&self, customer_id: CustomerId) -> Result<u64, PortError> {
        let count = on_session!(
            self.session,
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices WHERE customer_id = $1")
                .bind(customer_id.value()),
            fetch_one
        )?;
        Ok(count.max(0) as u64)
    }

    async fn add(&self, mut invoice: Invoice) -> Result<Invoice, PortError> {
        invoice.id = InvoiceId::new(self.session.next_id("invoices").await?);
        self.session.stage(PendingChange::AddInvoice(invoice.clone())).await;
        Ok(invoice)
    }

    async fn update(&self, invoice: Invoice) -> Result<(), PortError> {
        self.session.stage(PendingChange::UpdateInvoice(invoice)).await;
        Ok(())
    }

    async fn remove(&self, id: InvoiceId) -> Result<(), PortError> {
        self.session.stage(PendingChange::RemoveInvoice(id)).await;
        Ok(())
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, invoice: &Invoice) -> Result<(), PortError> {
    sqlx::query(
        "INSERT INTO invoices (id, invoice_number, customer_id, truck_id, invoice_date, gross_weight, \
         cages_weight, cages_count, net_weight, unit_price, total_amount, discount_percentage, \
         discount_amount, final_amount, previous_balance, current_balance, notes, is_paid, \
         created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
    )
    .bind(invoice.id.value())
    .bind(&invoice.invoice_number)
    .bind(invoice.customer_id.value())
    .bind(invoice.truck_id.value())
    .bind(invoice.invoice_date)
    .bind(invoice.gross_weight)
    .bind(invoice.cages_weight)
    .bind(invoice.cages_count)
    .bind(invoice.net_weight)
    .bind(invoice.unit_price)
    .bind(invoice.total_amount)
    .bind(invoice.discount_percentage)
    .bind(invoice.discount_amount)
    .bind(invoice.final_amount)
    .bind(invoice.previous_balance)
    .bind(invoice.current_balance)
    .bind(&invoice.notes)
    .bind(invoice.is_paid)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;
    Ok(())
}

pub(crate) async fn update(conn: &mut PgConnection, invoice: &Invoice) -> Result<(), PortError> {
    let result = sqlx::query(
        "UPDATE invoices SET truck_id = $2, invoice_date = $3, gross_weight = $4, cages_weight = $5, \
         cages_count = $6, net_weight = $7, unit_price = $8, total_amount = $9, \
         discount_percentage = $10, discount_amount = $11, final_amount = $12, \
         previous_balance = $13, current_balance = $14, notes = $15, is_paid = $16, updated_at = $17 \
         WHERE id = $1",
    )
    .bind(invoice.id.value())
    .bind(invoice.truck_id.value())
    .bind(invoice.invoice_date)
    .bind(invoice.gross_weight)
    .bind(invoice.cages_weight)
    .bind(invoice.cages_count)
    .bind(invoice.net_weight)
    .bind(invoice.unit_price)
    .bind(invoice.total_amount)
    .bind(invoice.discount_percentage)
    .bind(invoice.discount_amount)
    .bind(invoice.final_amount)
    .bind(invoice.previous_balance)
    .bind(invoice.current_balance)
    .bind(&invoice.notes)
    .bind(invoice.is_paid)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::not_found("Invoice", invoice.id));
    }
    Ok(())
}

pub(crate) async fn delete(conn: &mut PgConnection, id: InvoiceId) -> Result<(), PortError> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id.value())
        .execute(&mut *conn)
        .await
        .map_err(sql_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::not_found("Invoice", id));
    }
    Ok(())
}
