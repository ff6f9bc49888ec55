//! PostgreSQL adapters for the store ports, delegating to `hearth-db`
//! repositories.

use async_trait::async_trait;
use hearth_core::need::NeedStep;
use hearth_core::types::{new_id, EntityId, UserId};
use hearth_db::models::address::{CreateUserAddress, UserAddress};
use hearth_db::models::category::{AssignCategory, CategoryAssignment, NeedCategory};
use hearth_db::models::document::{CreateNeedDocument, NeedDocument, UpdateNeedDocument};
use hearth_db::models::need::Need;
use hearth_db::models::progress::ProgressEvent;
use hearth_db::models::story::{NeedStory, UpsertNeedStory};
use hearth_db::repositories::{
    AddressRepo, CategoryAssignmentRepo, CategoryRepo, DocumentRepo, NeedRepo, ProgressRepo,
    StoryRepo,
};
use hearth_db::DbPool;

use crate::error::StoreError;
use crate::stores::{
    AddressStore, AssignmentStore, CategoryStore, DocumentStore, NeedStore, ProgressLog,
    StoryStore,
};

/// Implements every relational port over a single pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn found<T>(row: Option<T>, entity: &'static str, id: EntityId) -> Result<T, StoreError> {
    row.ok_or(StoreError::NotFound { entity, id })
}

#[async_trait]
impl NeedStore for PgStore {
    async fn get(&self, id: EntityId) -> Result<Need, StoreError> {
        found(NeedRepo::find_by_id(&self.pool, id).await?, "need", id)
    }

    async fn find_in_flight_by_user(&self, user_id: UserId) -> Result<Option<Need>, StoreError> {
        Ok(NeedRepo::find_in_flight_by_user(&self.pool, user_id).await?)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Need>, StoreError> {
        Ok(NeedRepo::list_by_user(&self.pool, user_id).await?)
    }

    async fn create(&self, need: &Need) -> Result<Need, StoreError> {
        Ok(NeedRepo::create(&self.pool, need.id, need.user_id).await?)
    }

    async fn update(&self, need: &Need) -> Result<Need, StoreError> {
        found(NeedRepo::update(&self.pool, need).await?, "need", need.id)
    }

    async fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        if NeedRepo::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound { entity: "need", id })
        }
    }
}

#[async_trait]
impl AddressStore for PgStore {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<UserAddress>, StoreError> {
        Ok(AddressRepo::list_by_user(&self.pool, user_id).await?)
    }

    async fn get(&self, id: EntityId, user_id: UserId) -> Result<UserAddress, StoreError> {
        found(
            AddressRepo::find_for_user(&self.pool, user_id, id).await?,
            "address",
            id,
        )
    }

    async fn get_primary_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserAddress>, StoreError> {
        Ok(AddressRepo::find_primary(&self.pool, user_id).await?)
    }

    async fn create(&self, input: &CreateUserAddress) -> Result<UserAddress, StoreError> {
        Ok(AddressRepo::create(&self.pool, input).await?)
    }

    async fn set_primary(
        &self,
        user_id: UserId,
        address_id: EntityId,
    ) -> Result<UserAddress, StoreError> {
        found(
            AddressRepo::set_primary(&self.pool, user_id, address_id).await?,
            "address",
            address_id,
        )
    }

    async fn delete(&self, id: EntityId, user_id: UserId) -> Result<(), StoreError> {
        if AddressRepo::delete(&self.pool, user_id, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound { entity: "address", id })
        }
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_active(&self) -> Result<Vec<NeedCategory>, StoreError> {
        Ok(CategoryRepo::list_active(&self.pool).await?)
    }

    async fn get_by_ids(&self, ids: &[EntityId]) -> Result<Vec<NeedCategory>, StoreError> {
        Ok(CategoryRepo::find_by_ids(&self.pool, ids).await?)
    }
}

#[async_trait]
impl AssignmentStore for PgStore {
    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<CategoryAssignment>, StoreError> {
        Ok(CategoryAssignmentRepo::list_by_need(&self.pool, need_id).await?)
    }

    async fn replace_all(
        &self,
        need_id: EntityId,
        assignments: &[AssignCategory],
    ) -> Result<Vec<CategoryAssignment>, StoreError> {
        Ok(CategoryAssignmentRepo::replace_all(&self.pool, need_id, assignments).await?)
    }
}

#[async_trait]
impl StoryStore for PgStore {
    async fn get_by_need(&self, need_id: EntityId) -> Result<Option<NeedStory>, StoreError> {
        Ok(StoryRepo::find_by_need(&self.pool, need_id).await?)
    }

    async fn upsert(&self, input: &UpsertNeedStory) -> Result<NeedStory, StoreError> {
        Ok(StoryRepo::upsert(&self.pool, input).await?)
    }

    async fn delete(&self, need_id: EntityId) -> Result<(), StoreError> {
        StoryRepo::delete(&self.pool, need_id).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create(&self, input: &CreateNeedDocument) -> Result<NeedDocument, StoreError> {
        Ok(DocumentRepo::create(&self.pool, input).await?)
    }

    async fn update(
        &self,
        need_id: EntityId,
        id: EntityId,
        input: &UpdateNeedDocument,
    ) -> Result<NeedDocument, StoreError> {
        found(
            DocumentRepo::update_metadata(&self.pool, need_id, id, input).await?,
            "document",
            id,
        )
    }

    async fn get(&self, need_id: EntityId, id: EntityId) -> Result<NeedDocument, StoreError> {
        found(
            DocumentRepo::find_for_need(&self.pool, need_id, id).await?,
            "document",
            id,
        )
    }

    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<NeedDocument>, StoreError> {
        Ok(DocumentRepo::list_by_need(&self.pool, need_id).await?)
    }

    async fn delete(&self, need_id: EntityId, id: EntityId) -> Result<(), StoreError> {
        if DocumentRepo::delete(&self.pool, need_id, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound { entity: "document", id })
        }
    }
}

#[async_trait]
impl ProgressLog for PgStore {
    async fn append(&self, need_id: EntityId, step: NeedStep) -> Result<(), StoreError> {
        ProgressRepo::append(&self.pool, new_id(), need_id, step).await?;
        Ok(())
    }

    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<ProgressEvent>, StoreError> {
        Ok(ProgressRepo::list_by_need(&self.pool, need_id).await?)
    }
}
