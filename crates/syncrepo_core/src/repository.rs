//! The CRUD and query contract shared by every repository variant.

use crate::entity::Entity;
use crate::error::RepositoryResult;
use crate::filter::QueryFilter;
use async_trait::async_trait;

/// CRUD and query operations over entities of type `T`.
///
/// Implemented by remote clients, by the local offline repository and by
/// the connectivity-aware [`SyncRepository`](crate::SyncRepository) that
/// routes between them. Callers see the same contract in every mode.
///
/// Mutations report "did not happen" as `None` or `false`; errors are
/// reserved for failures of the underlying transport or store.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Returns every entity.
    async fn get_all(&self) -> RepositoryResult<Vec<T>>;

    /// Returns the entity with this key, if any.
    async fn get_by_id(&self, key: i64) -> RepositoryResult<Option<T>>;

    /// Returns the entities selected by `filter`.
    ///
    /// The default validates `filter`, materializes every entity and
    /// filters in process.
    async fn get(&self, filter: &QueryFilter<T>) -> RepositoryResult<Vec<T>> {
        filter.validate()?;
        let all = self.get_all().await?;
        filter.apply(all)
    }

    /// Creates an entity and returns it as stored, with its assigned key.
    async fn insert(&self, entity: T) -> RepositoryResult<Option<T>>;

    /// Replaces the entity stored under `entity`'s key.
    async fn update(&self, entity: T) -> RepositoryResult<Option<T>>;

    /// Deletes by key. Returns whether the delete happened.
    async fn delete_by_id(&self, key: i64) -> RepositoryResult<bool>;

    /// Deletes the given entity. Returns whether the delete happened.
    async fn delete_by_entity(&self, entity: &T) -> RepositoryResult<bool>;

    /// Deletes every entity. Returns whether the delete happened.
    async fn delete_all(&self) -> RepositoryResult<bool>;
}
