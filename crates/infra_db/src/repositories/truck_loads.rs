//! Truck load repository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgConnection;

use core_kernel::{PortError, TruckId, TruckLoadId};
use domain_ledger::ports::{PendingChange, TruckLoadRepository};
use domain_ledger::TruckLoad;

use crate::error::sql_error;
use crate::rows::{convert_all, TruckLoadRow};
use crate::session::{on_session, SessionHandle};

const COLUMNS: &str = "id, truck_id, load_date, total_weight, cages_count, cages_weight, notes, \
                       status, is_completed, created_at, updated_at";

/// PostgreSQL truck loads
#[derive(Debug, Clone)]
pub struct PgTruckLoads {
    session: SessionHandle,
}

impl PgTruckLoads {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

#[async_trait]
impl TruckLoadRepository for PgTruckLoads {
    async fn get(&self, id: TruckLoadId) -> Result<Option<TruckLoad>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM truck_loads WHERE id = $1");
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, TruckLoadRow>(&sql).bind(id.value()),
            fetch_optional
        )?;
        row.map(TruckLoad::try_from).transpose()
    }

    async fn find_for_truck_on(&self, truck_id: TruckId, date: NaiveDate) -> Result<Option<TruckLoad>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM truck_loads WHERE truck_id = $1 AND load_date = $2");
        let row = on_session!(
            self.session,
            sqlx::query_as::<_, TruckLoadRow>(&sql).bind(truck_id.value()).bind(date),
            fetch_optional
        )?;
        row.map(TruckLoad::try_from).transpose()
    }

    async fn list_on(&self, date: NaiveDate) -> Result<Vec<TruckLoad>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM truck_loads WHERE load_date = $1 ORDER BY id");
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, TruckLoadRow>(&sql).bind(date),
            fetch_all
        )?;
        convert_all(rows)
    }

    async fn list_for_truck(&self, truck_id: TruckId) -> Result<Vec<TruckLoad>, PortError> {
        let sql = format!("SELECT {COLUMNS} FROM truck_loads WHERE truck_id = $1 ORDER BY load_date DESC");
        let rows = on_session!(
            self.session,
            sqlx::query_as::<_, TruckLoadRow>(&sql).bind(truck_id.value()),
            fetch_all
        )?;
        convert_all(rows)
    }

    async fn add(&self, mut load: TruckLoad) -> Result<TruckLoad, PortError> {
        load.id = TruckLoadId::new(self.session.next_id("truck_loads").await?);
        self.session.stage(PendingChange::AddTruckLoad(load.clone())).await;
        Ok(load)
    }

    async fn update(&self, load: TruckLoad) -> Result<(), PortError> {
        self.session.stage(PendingChange::UpdateTruckLoad(load)).await;
        Ok(())
    }

    async fn remove(&self, id: TruckLoadId) -> Result<(), PortError> {
        self.session.stage(PendingChange::RemoveTruckLoad(id)).await;
        Ok(())
    }
}

pub(crate) async fn insert(conn: &mut PgConnection, load: &TruckLoad) -> Result<(), PortError> {
    sqlx::query(
        "INSERT INTO truck_loads (id, truck_id, load_date, total_weight, cages_count, cages_weight, \
         notes, status, is_completed, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(load.id.value())
    .bind(load.truck_id.value())
    .bind(load.load_date)
    .bind(load.total_weight)
    .bind(load.cages_count)
    .bind(load.cages_weight)
    .bind(&load.notes)
    .bind(load.status.as_str())
    .bind(load.is_completed)
    .bind(load.created_at)
    .bind(load.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;
    Ok(())
}

pub(crate) async fn update(conn: &mut PgConnection, load: &TruckLoad) -> Result<(), PortError> {
    let result = sqlx::query(
        "UPDATE truck_loads SET total_weight = $2, cages_count = $3, cages_weight = $4, notes = $5, \
         status = $6, is_completed = $7, updated_at = $8 WHERE id = $1",
    )
    .bind(load.id.value())
    .bind(load.total_weight)
    .bind(load.cages_count)
    .bind(load.cages_weight)
    .bind(&load.notes)
    .bind(load.status.as_str())
    .bind(load.is_completed)
    .bind(load.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(sql_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::not_found("TruckLoad", load.id));
    }
    Ok(())
}

pub(crate) async fn delete(conn: &mut PgConnection, id: TruckLoadId) -> Result<(), PortError> {
    let result = sqlx::query("DELETE FROM truck_loads WHERE id = $1")
        .bind(id.value())
        .execute(&mut *conn)
        .await
        .map_err(sql_error)?;

    if result.rows_affected() == 0 {
        return Err(PortError::not_found("TruckLoad", id));
    }
    Ok(())
}
