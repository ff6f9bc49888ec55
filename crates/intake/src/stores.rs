//! Store ports: the narrow persistence interfaces the intake layer is
//! written against, plus [`Stores`], the bundle handed to every service.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::need::NeedStep;
use hearth_core::types::{EntityId, UserId};
use hearth_db::models::address::{CreateUserAddress, UserAddress};
use hearth_db::models::category::{AssignCategory, CategoryAssignment, NeedCategory};
use hearth_db::models::document::{CreateNeedDocument, NeedDocument, UpdateNeedDocument};
use hearth_db::models::need::Need;
use hearth_db::models::progress::ProgressEvent;
use hearth_db::models::story::{NeedStory, UpsertNeedStory};
use hearth_db::DbPool;
use hearth_storage::ObjectStore;

use crate::error::StoreError;
use crate::pg::PgStore;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NeedStore: Send + Sync {
    async fn get(&self, id: EntityId) -> Result<Need, StoreError>;
    /// The user's newest need in `Draft` or `Submitted` status.
    async fn find_in_flight_by_user(&self, user_id: UserId) -> Result<Option<Need>, StoreError>;
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Need>, StoreError>;
    async fn create(&self, need: &Need) -> Result<Need, StoreError>;
    async fn update(&self, need: &Need) -> Result<Need, StoreError>;
    async fn delete(&self, id: EntityId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Primary first, then oldest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<UserAddress>, StoreError>;
    /// Fails with `NotFound` if the address is absent or owned by someone else.
    async fn get(&self, id: EntityId, user_id: UserId) -> Result<UserAddress, StoreError>;
    async fn get_primary_by_user(&self, user_id: UserId)
        -> Result<Option<UserAddress>, StoreError>;
    /// Insert; when primary, the previous primary is cleared atomically.
    async fn create(&self, input: &CreateUserAddress) -> Result<UserAddress, StoreError>;
    /// Clear the old primary and set the new one atomically.
    async fn set_primary(
        &self,
        user_id: UserId,
        address_id: EntityId,
    ) -> Result<UserAddress, StoreError>;
    async fn delete(&self, id: EntityId, user_id: UserId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_active(&self) -> Result<Vec<NeedCategory>, StoreError>;
    /// Categories for the given ids. Unknown ids are absent from the result.
    async fn get_by_ids(&self, ids: &[EntityId]) -> Result<Vec<NeedCategory>, StoreError>;
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Primary first.
    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<CategoryAssignment>, StoreError>;
    /// Delete-all then insert, atomically.
    async fn replace_all(
        &self,
        need_id: EntityId,
        assignments: &[AssignCategory],
    ) -> Result<Vec<CategoryAssignment>, StoreError>;
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn get_by_need(&self, need_id: EntityId) -> Result<Option<NeedStory>, StoreError>;
    async fn upsert(&self, input: &UpsertNeedStory) -> Result<NeedStory, StoreError>;
    /// Remove the story; a missing story is not an error.
    async fn delete(&self, need_id: EntityId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, input: &CreateNeedDocument) -> Result<NeedDocument, StoreError>;
    async fn update(
        &self,
        need_id: EntityId,
        id: EntityId,
        input: &UpdateNeedDocument,
    ) -> Result<NeedDocument, StoreError>;
    async fn get(&self, need_id: EntityId, id: EntityId) -> Result<NeedDocument, StoreError>;
    /// Newest upload first.
    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<NeedDocument>, StoreError>;
    async fn delete(&self, need_id: EntityId, id: EntityId) -> Result<(), StoreError>;
}

/// Append-only audit trail of completed steps.
#[async_trait]
pub trait ProgressLog: Send + Sync {
    async fn append(&self, need_id: EntityId, step: NeedStep) -> Result<(), StoreError>;
    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<ProgressEvent>, StoreError>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Every port an intake service may touch.
#[derive(Clone)]
pub struct Stores {
    pub needs: Arc<dyn NeedStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub stories: Arc<dyn StoryStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub progress: Arc<dyn ProgressLog>,
    pub objects: Arc<dyn ObjectStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: DbPool, objects: Arc<dyn ObjectStore>) -> Self {
        Self::from_single(Arc::new(PgStore::new(pool)), objects)
    }

    /// Use one value that implements every relational port.
    pub fn from_single<S>(store: Arc<S>, objects: Arc<dyn ObjectStore>) -> Self
    where
        S: NeedStore
            + AddressStore
            + CategoryStore
            + AssignmentStore
            + StoryStore
            + DocumentStore
            + ProgressLog
            + 'static,
    {
        Self {
            needs: store.clone(),
            addresses: store.clone(),
            categories: store.clone(),
            assignments: store.clone(),
            stories: store.clone(),
            documents: store.clone(),
            progress: store,
            objects,
        }
    }
}
