//! Truck repository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgConnection;

use core_kernel::{PortError, TruckId};
use domain_ledger::ports::{PendingChange, TruckRepository};
use domain_ledger::Truck;

use crate::error::sql_error;
use crate::rows::TruckRow;
use crate::session::{on_session, SessionHandle};

const COLUMNS: &str = "id, truck_number, driver_name, driver_phone, is_active, created_at, updated_at";

/// PostgreSQL trucks
#[derive(Debug, Clone)]
pub struct PgTrucks {
    session: SessionHandle,
}

impl PgTrucks {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

#[async_trait]
impl TruckRepository for PgTrucks {
    async fn get(&self, id: TruckId) -> Result<Option<Truck>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM trucks WHERE id = $1");
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, TruckRow>(&sql).bind(id.value()),
            fetch_optional
        )?;
        Ok(row.map(Truck::from))
    }

    async fn find_by_number(&self, truck_number: &str) -> Result<Option<Truck>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM trucks WHERE truck_number = $1");
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, TruckRow>(&sql).bind(truck_number),
            fetch_optional
        )?;
        Ok(row.map(Truck::from))
    }

    async fn list_active(&self) -> Result<Vec<Truck>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM trucks WHERE is_active ORDER BY truck_number");
        let rows = on_session!(self.session, sqlx::query_as::<_, TruckRow>(&sql), fetch_all)?;
        Ok(rows.into_iter().map(Truck::from).collect())
    }

    async fn list_with_loads_on(&self, date: NaiveDate) -> Result<Vec<Truck>, PortError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM trucks t \
             WHERE t.is_active \
               AND EXISTS (SELECT 1 FROM truck_loads l WHERE l.truck_id = t.id AND l.load_date = $1) \
             ORDER BY t.truck_number"
        );
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, TruckRow>(&sql).bind(date),
            fetch_all
        )?;
        Ok(rows.into_iter().map(Truck::from).collect())
    }

    async fn add(&self, mut truck: Truck) -> Result<Truck, PortError> {
        truck.id = TruckId::new(self.session.next_id("trucks").await?);
        self.session.stage(PendingChange::AddTruck(truck.clone())).await;
        Ok(truck)
    }

    async fn update(&self, truck: Truck) -> Result<(), PortError> {
        self.session.stage(PendingChange::UpdateTruck(truck)).await;
        Ok(())
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, truck: &Truck) -> Result<(), PortError> {
    sqlx::query(
        "INSERT INTO trucks (id, truck_number, driver_name, driver_phone, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(truck.id.value())
    .bind(&truck.truck_number)
    .bind(&truck.driver_name)
    .bind(&truck.driver_phone)
    .bind(truck.is_active)
    .bind(truck.created_at)
    .bind(truck.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;
    Ok(())
}

pub(crate) async fn update(conn: &mut PgConnection, truck: &Truck) -> Result<(), PortError> {
    let result = sqlx::query(
        "UPDATE trucks SET truck_number = $2, driver_name = $3, driver_phone = $4, \
         is_active = $5, updated_at = $6 WHERE id = $1",
    )
    .bind(truck.id.value())
    .bind(&truck.truck_number)
    .bind(&truck.driver_name)
    .bind(&truck.driver_phone)
    .bind(truck.is_active)
    .bind(truck.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::not_found("Truck", truck.id));
    }
    Ok(())
}
