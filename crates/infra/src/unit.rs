//! Storage units and their transaction boundaries.
//!
//! The gateway persists into two independent units: the durable `Main`
//! store and the ephemeral `Tokens` store for short-lived bank
//! credentials. Each unit owns its own bounded connection pool and its own
//! transaction scope type. `UnitTransaction<Main>` and
//! `UnitTransaction<Tokens>` are distinct types, so a unit of work cannot
//! span both stores; a caller that must touch both sequences two
//! transactions and handles partial completion itself.

use std::marker::PhantomData;

use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::instrument;

use finpuls_core::UnitMarker;

use crate::config::UnitConfig;
use crate::error::{StorageError, map_sqlx_error};

/// One storage unit: a named, bounded connection pool.
///
/// Cloning is cheap (the pool is shared). Pool bounds come from
/// [`UnitConfig`]: exceeding `max_connections` blocks acquisition up to
/// `acquire_timeout` and then fails with [`StorageError::Exhausted`];
/// idle and lifetime bounds keep connections from going stale.
#[derive(Debug)]
pub struct StorageUnit<U: UnitMarker> {
    pool: PgPool,
    _unit: PhantomData<fn() -> U>,
}

impl<U: UnitMarker> Clone for StorageUnit<U> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), _unit: PhantomData }
    }
}

impl<U: UnitMarker> StorageUnit<U> {
    /// Connect the unit's pool.
    #[instrument(skip(cfg), fields(unit = U::NAME), err)]
    pub async fn connect(cfg: &UnitConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout)
            .idle_timeout(cfg.idle_timeout)
            .max_lifetime(cfg.max_lifetime)
            .connect(&cfg.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        tracing::info!(unit = U::NAME, max_connections = cfg.max_connections, "storage unit connected");
        Ok(Self { pool, _unit: PhantomData })
    }

    /// Wrap an existing pool (tests, embedded setups).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool, _unit: PhantomData }
    }

    pub fn name(&self) -> &'static str {
        U::NAME
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a read-write transaction scoped to this unit.
    pub async fn begin(&self) -> Result<UnitTransaction<U>, StorageError> {
        let inner = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;
        Ok(UnitTransaction { inner, _unit: PhantomData })
    }

    /// Begin a read-only transaction: a consistent snapshot for the
    /// duration of the call without write-ahead overhead.
    pub async fn begin_read_only(&self) -> Result<UnitTransaction<U>, StorageError> {
        let mut inner = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *inner)
            .await
            .map_err(|e| map_sqlx_error("begin_read_only", e))?;
        Ok(UnitTransaction { inner, _unit: PhantomData })
    }
}

/// A transaction scoped to exactly one storage unit.
///
/// Dropping without an explicit `commit` rolls back, so early returns via
/// `?` leave no partial work behind.
pub struct UnitTransaction<U: UnitMarker> {
    inner: Transaction<'static, Postgres>,
    _unit: PhantomData<fn() -> U>,
}

impl<U: UnitMarker> UnitTransaction<U> {
    /// Connection to run statements on, e.g. `tx.conn()` as an executor.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.inner
    }

    pub async fn commit(self) -> Result<(), StorageError> {
        self.inner.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }

    pub async fn rollback(self) -> Result<(), StorageError> {
        self.inner.rollback().await.map_err(|e| map_sqlx_error("rollback", e))
    }
}
