//! Routing of entity families onto storage units.
//!
//! Assignment is static: each `Persistable` names its unit through the
//! `Unit` associated type, and `repository` resolves the owning unit at
//! compile time. There is no way to ask the router for a repository backed
//! by the wrong unit.

use finpuls_core::{Main, Persistable, Tokens, UnitMarker};
use sqlx::postgres::PgRow;

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::sql::SqlRepository;
use crate::unit::StorageUnit;

/// Both storage units of the gateway.
#[derive(Debug, Clone)]
pub struct StorageRouter {
    main: StorageUnit<Main>,
    tokens: StorageUnit<Tokens>,
}

/// Maps a unit marker to the unit instance held by the router.
pub trait RoutesTo<U: UnitMarker> {
    fn unit_of(&self) -> &StorageUnit<U>;
}

impl RoutesTo<Main> for StorageRouter {
    fn unit_of(&self) -> &StorageUnit<Main> {
        &self.main
    }
}

impl RoutesTo<Tokens> for StorageRouter {
    fn unit_of(&self) -> &StorageUnit<Tokens> {
        &self.tokens
    }
}

impl StorageRouter {
    /// Connect both units. The pools are independent; a failure to reach
    /// one database does not tear down the other's pool, but startup
    /// requires both.
    pub async fn connect(cfg: &StorageConfig) -> Result<Self, StorageError> {
        let main = StorageUnit::connect(&cfg.main).await?;
        let tokens = StorageUnit::connect(&cfg.tokens).await?;
        Ok(Self { main, tokens })
    }

    pub fn from_units(main: StorageUnit<Main>, tokens: StorageUnit<Tokens>) -> Self {
        Self { main, tokens }
    }

    pub fn main(&self) -> &StorageUnit<Main> {
        &self.main
    }

    pub fn tokens(&self) -> &StorageUnit<Tokens> {
        &self.tokens
    }

    /// Repository for an entity family, backed by the unit that owns it.
    pub fn repository<E>(&self) -> SqlRepository<E>
    where
        E: Persistable + Unpin + for<'r> sqlx::FromRow<'r, PgRow> + 'static,
        Self: RoutesTo<E::Unit>,
    {
        SqlRepository::new(<Self as RoutesTo<E::Unit>>::unit_of(self).clone())
    }
}
