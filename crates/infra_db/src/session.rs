//! Shared transactional session
//!
//! Every repository of one unit of work holds a [`SessionHandle`]. Reads run
//! on the open transaction when there is one and on the pool otherwise, so a
//! read inside a transaction sees the rows that transaction already wrote.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use core_kernel::PortError;
use domain_ledger::ports::{ChangeSet, PendingChange};

use crate::error::sql_error;

/// Connection state of one unit of work
pub struct PgSession {
    pub(crate) pool: PgPool,
    pub(crate) tx: Option<Transaction<'static, Postgres>>,
    pub(crate) pending: ChangeSet,
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("in_transaction", &self.tx.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Runs a query on the session's transaction, or on the pool outside one
///
/// `$run` is the fetch method (`fetch_one`, `fetch_optional`, `fetch_all`,
/// `execute`).
macro_rules! on_session {
    ($handle:expr, $query:expr, $run:ident) => {{
        let mut session = $handle.lock().await;
        let session = &mut *session;
        match session.tx.as_mut() {
            Some(tx) => $query.$run(&mut **tx).await,
            None => $query.$run(&session.pool).await,
        }
        .map_err($crate::error::sql_error)
    }};
}

pub(crate) use on_session;

/// Cloneable handle on the session, shared by the repositories
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<PgSession>>,
}

impl SessionHandle {
    pub fn new(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PgSession {
                pool,
                tx: None,
                pending: ChangeSet::default(),
            })),
        }
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, PgSession> {
        self.inner.lock().await
    }

    /// Queues a write for the next flush
    pub(crate) async fn stage(&self, change: PendingChange) {
        self.inner.lock().await.pending.push(change);
    }

    /// Draws the next identity of a table from its serial sequence
    ///
    /// Sequence values are never rolled back, so an identity drawn for a
    /// write that is later discarded leaves a gap.
    pub(crate) async fn next_id(&self, table: &'static str) -> Result<i64, PortError> {
        on_session!(
            self,
            sqlx::query_scalar::<_, i64>("SELECT nextval(pg_get_serial_sequence($1, 'id'))").bind(table),
            fetch_one
        )
    }

    pub(crate) async fn in_transaction(&self) -> bool {
        self.inner.lock().await.tx.is_some()
    }

    pub(crate) async fn begin(&self) -> Result<(), PortError> {
        let mut session = self.inner.lock().await;
        let tx = session.pool.begin().await.map_err(sql_error)?;
        session.tx = Some(tx);
        Ok(())
    }

    pub(crate) async fn commit(&self) -> Result<(), PortError> {
        let tx = self.inner.lock().await.tx.take();
        match tx {
            Some(tx) => tx.commit().await.map_err(sql_error),
            None => Err(PortError::invalid_transaction("No transaction started")),
        }
    }

    /// Rolls back the open transaction and drops staged writes
    pub(crate) async fn rollback(&self) -> Result<(), PortError> {
        let mut session = self.inner.lock().await;
        session.pending.clear();
        match session.tx.take() {
            Some(tx) => tx.rollback().await.map_err(sql_error),
            None => Ok(()),
        }
    }
}
