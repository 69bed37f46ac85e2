//! Generic, entity-agnostic persistence facade.
//!
//! Implemented once per backend (SQL, in-memory) and reused for every
//! entity family. Lookup-by-example goes through [`Probe`]; the
//! field-name convenience methods and the existence/required helpers are
//! provided compositions.

use async_trait::async_trait;
use uuid::Uuid;

use finpuls_core::{FieldValue, Persistable};

use crate::error::StorageError;
use crate::probe::Probe;

/// CRUD surface over one entity family.
///
/// Failure semantics shared by all implementations:
/// - a nil id is rejected with an invalid-argument error before the
///   backend is touched;
/// - `find_by_id` returns `Ok(None)` for a missing row — absence is not
///   an error;
/// - `delete_by_id` on a missing row fails with a not-found error;
/// - `save` inserts or updates depending on whether the identifier
///   already exists in the owning unit, and returns the persisted
///   instance including server-populated columns.
#[async_trait]
pub trait EntityStore<E: Persistable + 'static>: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, StorageError>;

    async fn find_all(&self) -> Result<Vec<E>, StorageError>;

    async fn save(&self, entity: E) -> Result<E, StorageError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StorageError>;

    /// First entity matching the probe, in arbitrary order.
    async fn find_by_probe(&self, probe: Probe) -> Result<Option<E>, StorageError>;

    /// All entities matching the probe. An empty probe matches everything.
    async fn find_all_by_probe(&self, probe: Probe) -> Result<Vec<E>, StorageError>;

    async fn find_by_field(&self, name: &str, value: FieldValue) -> Result<Option<E>, StorageError> {
        self.find_by_probe(Probe::of_field::<E>(name, value)?).await
    }

    async fn find_all_by_field(
        &self,
        name: &str,
        value: FieldValue,
    ) -> Result<Vec<E>, StorageError> {
        self.find_all_by_probe(Probe::of_field::<E>(name, value)?).await
    }

    /// First entity equal, field by field, to the populated fields of the
    /// example instance.
    async fn find_by_example(&self, example: &E) -> Result<Option<E>, StorageError> {
        self.find_by_probe(Probe::of_example(example)).await
    }

    async fn find_all_by_example(&self, example: &E) -> Result<Vec<E>, StorageError> {
        self.find_all_by_probe(Probe::of_example(example)).await
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StorageError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn exists_by_field(&self, name: &str, value: FieldValue) -> Result<bool, StorageError> {
        Ok(self.find_by_field(name, value).await?.is_some())
    }

    /// Like `find_by_id`, but absence is an error.
    async fn get_required_by_id(&self, id: Uuid) -> Result<E, StorageError> {
        self.find_by_id(id).await?.ok_or_else(|| {
            StorageError::NotFound(format!("no {} row with id {id}", E::TABLE))
        })
    }
}

#[async_trait]
impl<E, S> EntityStore<E> for std::sync::Arc<S>
where
    E: Persistable + 'static,
    S: EntityStore<E> + ?Sized,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, StorageError> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<E>, StorageError> {
        (**self).find_all().await
    }

    async fn save(&self, entity: E) -> Result<E, StorageError> {
        (**self).save(entity).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StorageError> {
        (**self).delete_by_id(id).await
    }

    async fn find_by_probe(&self, probe: Probe) -> Result<Option<E>, StorageError> {
        (**self).find_by_probe(probe).await
    }

    async fn find_all_by_probe(&self, probe: Probe) -> Result<Vec<E>, StorageError> {
        (**self).find_all_by_probe(probe).await
    }
}

/// Reject nil identifiers before they reach a backend.
pub(crate) fn require_id(id: Uuid) -> Result<Uuid, StorageError> {
    if id.is_nil() {
        return Err(StorageError::invalid("id", "must not be nil"));
    }
    Ok(id)
}
