//! Customer repository
//!
//! Debt changes read the customer with `FOR UPDATE` inside the transaction,
//! so two sales or payments for one customer queue on the row lock.

use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::debug;

use core_kernel::{CustomerId, PortError};
use domain_ledger::ports::{CustomerRepository, PendingChange};
use domain_ledger::validation::normalize_digits;
use domain_ledger::Customer;

use crate::error::sql_error;
use crate::rows::CustomerRow;
use crate::session::{on_session, SessionHandle};

const COLUMNS: &str = "id, customer_name, phone_number, address, credit_limit, total_debt, \
                       is_active, created_at, updated_at";

/// PostgreSQL customers
#[derive(Debug, Clone)]
pub struct PgCustomers {
    session: SessionHandle,
}

impl PgCustomers {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomers {
    async fn get(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, CustomerRow>(&sql).bind(id.value()),
            fetch_optional
        )?;
        Ok(row.map(Customer::from))
    }

    async fn get_for_update(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        if !self.session.in_transaction().await {
            return self.get(id).await;
        }

        debug!(customer_id = id.value(), "Locking customer row");
        let sql = format!("SELECT {COLUMNS} FROM customers WHERE id = $1 FOR UPDATE");
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, CustomerRow>(&sql).bind(id.value()),
            fetch_optional
        )?;
        Ok(row.map(Customer::from))
    }

    async fn list_active(&self) -> Result<Vec<Customer>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM customers WHERE is_active ORDER BY customer_name, id");
        let rows = on_session!(self.session, sqlx::query_as::<_, CustomerRow>(&sql), fetch_all)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn list_with_debt(&self) -> Result<Vec<Customer>, PortError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM customers WHERE is_active AND total_debt > 0 ORDER BY total_debt DESC, id"
        );
        let rows = on_session!(self.session, sqlx::query_as::<_, CustomerRow>(&sql), fetch_all)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn find_active_by_name(
        &self,
        normalized_name: &str,
        exclude: Option<CustomerId>,
    ) -> Result<Option<Customer>, PortError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM customers \
             WHERE is_active AND LOWER(TRIM(customer_name)) = $1 AND ($2::BIGINT IS NULL OR id <> $2) \
             ORDER BY id LIMIT 1"
        );
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, CustomerRow>(&sql)
                .bind(normalized_name)
                .bind(exclude.map(|id| id.value())),
            fetch_optional
        )?;
        Ok(row.map(Customer::from))
    }

    async fn search(&self, term: &str) -> Result<Vec<Customer>, PortError> {
        let term = normalize_digits(term.trim());
        let sql = format!(
            "SELECT {COLUMNS} FROM customers \
             WHERE is_active \
               AND (strpos(LOWER(customer_name), $1) > 0 OR strpos(COALESCE(phone_number, ''), $2) > 0) \
             ORDER BY customer_name, id"
        );
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, CustomerRow>(&sql)
                .bind(term.to_lowercase())
                .bind(&term),
            fetch_all
        )?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn add(&self, mut customer: Customer) -> Result<Customer, PortError> {
        customer.id = CustomerId::new(self.session.next_id("customers").await?);
        self.session.stage(PendingChange::AddCustomer(customer.clone())).await;
        Ok(customer)
    }

    async fn update(&self, customer: Customer) -> Result<(), PortError> {
        self.session.stage(PendingChange::UpdateCustomer(customer)).await;
        Ok(())
    }

    async fn remove(&self, id: CustomerId) -> Result<(), PortError> {
        self.session.stage(PendingChange::RemoveCustomer(id)).await;
        Ok(())
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, customer: &Customer) -> Result<(), PortError> {
    sqlx::query(
        "INSERT INTO customers (id, customer_name, phone_number, address, credit_limit, total_debt, \
         is_active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(customer.id.value())
    .bind(&customer.customer_name)
    .bind(&customer.phone_number)
    .bind(&customer.address)
    .bind(customer.credit_limit)
    .bind(customer.total_debt)
    .bind(customer.is_active)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;
    Ok(())
}

pub(crate) async fn update(conn: &mut PgConnection, customer: &Customer) -> Result<(), PortError> {
    let result = sqlx::query(
        "UPDATE customers SET customer_name = $2, phone_number = $3, address = $4, credit_limit = $5, \
         total_debt = $6, is_active = $7, updated_at = $8 WHERE id = $1",
    )
    .bind(customer.id.value())
    .bind(&customer.customer_name)
    .bind(&customer.phone_number)
    .bind(&customer.address)
    .bind(customer.credit_limit)
    .bind(customer.total_debt)
    .bind(customer.is_active)
    .bind(customer.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::not_found("Customer", customer.id));
    }
    Ok(())
}

pub(crate) async fn delete(conn: &mut PgConnection, id: CustomerId) -> Result<(), PortError> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id.value())
        .execute(&mut *conn)
        .await
        .map_err(sql_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::not_found("Customer", id));
    }
    Ok(())
}
