//! In-memory implementation of the persistence facade.
//!
//! Behavioural twin of [`SqlRepository`](crate::sql::SqlRepository) for
//! tests and dev wiring: it assigns identifiers and audit timestamps the
//! way a storage unit would and matches probes with the same
//! case-insensitive text semantics.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use finpuls_core::Persistable;

use crate::error::StorageError;
use crate::probe::Probe;
use crate::store::{EntityStore, require_id};

#[derive(Debug, Default)]
pub struct InMemoryStore<E> {
    rows: RwLock<HashMap<Uuid, E>>,
}

impl<E> InMemoryStore<E> {
    pub fn new() -> Self {
        Self { rows: RwLock::new(HashMap::new()) }
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<E> EntityStore<E> for InMemoryStore<E>
where
    E: Persistable + Clone + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, StorageError> {
        let id = require_id(id)?;
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<E>, StorageError> {
        Ok(self.rows.read().unwrap().values().cloned().collect())
    }

    async fn save(&self, mut entity: E) -> Result<E, StorageError> {
        let now = Utc::now();
        let mut rows = self.rows.write().unwrap();

        let id = match entity.id() {
            None => Uuid::new_v4(),
            Some(id) => require_id(id)?,
        };
        // Keep the original creation stamp on update; the unit owns both
        // audit columns.
        let created_at = rows
            .get(&id)
            .and_then(|existing| existing.created_at())
            .unwrap_or(now);
        entity.stamp(id, created_at, now);
        rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StorageError> {
        let id = require_id(id)?;
        match self.rows.write().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!("no {} row with id {id}", E::TABLE))),
        }
    }

    async fn find_by_probe(&self, probe: Probe) -> Result<Option<E>, StorageError> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .find(|entity| probe.matches(*entity))
            .cloned())
    }

    async fn find_all_by_probe(&self, probe: Probe) -> Result<Vec<E>, StorageError> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|entity| probe.matches(*entity))
            .cloned()
            .collect())
    }
}
