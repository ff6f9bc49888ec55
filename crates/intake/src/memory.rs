//! In-memory implementation of every store port.
//!
//! Mirrors the PostgreSQL constraints that the intake layer relies on
//! (single primary address, single primary assignment, unique storage
//! keys, cascade on need delete) and supports fault injection per
//! operation so partial-failure paths can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::need::NeedStep;
use hearth_core::types::{new_id, EntityId, UserId};
use hearth_db::models::address::{CreateUserAddress, UserAddress};
use hearth_db::models::category::{AssignCategory, CategoryAssignment, NeedCategory};
use hearth_db::models::document::{CreateNeedDocument, NeedDocument, UpdateNeedDocument};
use hearth_db::models::need::Need;
use hearth_db::models::progress::ProgressEvent;
use hearth_db::models::story::{NeedStory, UpsertNeedStory};
use uuid::Uuid;

use crate::error::StoreError;
use crate::stores::{
    AddressStore, AssignmentStore, CategoryStore, DocumentStore, NeedStore, ProgressLog,
    StoryStore,
};

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    NeedGet,
    NeedCreate,
    NeedUpdate,
    NeedDelete,
    AddressCreate,
    AddressSetPrimary,
    AddressDelete,
    CategoryLookup,
    AssignmentReplace,
    StoryUpsert,
    DocumentCreate,
    DocumentUpdate,
    DocumentDelete,
    DocumentList,
    ProgressAppend,
}

/// Seeded category catalog, matching the initial migration.
const DEFAULT_CATEGORIES: &[(u128, &str, &str)] = &[
    (0x0190a000_0000_7000_8000_000000000001, "Housing", "housing"),
    (0x0190a000_0000_7000_8000_000000000002, "Medical", "medical"),
    (0x0190a000_0000_7000_8000_000000000003, "Food", "food"),
    (0x0190a000_0000_7000_8000_000000000004, "Utilities", "utilities"),
    (0x0190a000_0000_7000_8000_000000000005, "Transportation", "transportation"),
    (0x0190a000_0000_7000_8000_000000000006, "Education", "education"),
    (0x0190a000_0000_7000_8000_000000000007, "Childcare", "childcare"),
    (0x0190a000_0000_7000_8000_000000000008, "Other", "other"),
];

#[derive(Debug, Default)]
struct State {
    needs: HashMap<EntityId, Need>,
    addresses: Vec<UserAddress>,
    categories: Vec<NeedCategory>,
    assignments: HashMap<EntityId, Vec<CategoryAssignment>>,
    stories: HashMap<EntityId, NeedStory>,
    documents: Vec<NeedDocument>,
    events: Vec<ProgressEvent>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    failing: Mutex<HashSet<FailPoint>>,
}

impl MemoryStore {
    /// An empty store with no categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the default category catalog.
    pub fn with_default_categories() -> Self {
        let store = Self::new();
        for (order, (id, name, slug)) in DEFAULT_CATEGORIES.iter().enumerate() {
            store.insert_category(NeedCategory {
                id: Uuid::from_u128(*id),
                name: (*name).to_string(),
                slug: (*slug).to_string(),
                description: None,
                icon: None,
                display_order: order as i32 + 1,
                is_active: true,
                created_at: Utc::now(),
            });
        }
        store
    }

    pub fn insert_category(&self, category: NeedCategory) {
        self.state().categories.push(category);
    }

    pub fn fail(&self, point: FailPoint) {
        self.failing().insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.failing().remove(&point);
    }

    // -- Inspection helpers ------------------------------------------------

    pub fn need(&self, id: EntityId) -> Option<Need> {
        self.state().needs.get(&id).cloned()
    }

    pub fn addresses_of(&self, user_id: UserId) -> Vec<UserAddress> {
        self.state()
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn assignments_of(&self, need_id: EntityId) -> Vec<CategoryAssignment> {
        self.state()
            .assignments
            .get(&need_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn story_of(&self, need_id: EntityId) -> Option<NeedStory> {
        self.state().stories.get(&need_id).cloned()
    }

    pub fn documents_of(&self, need_id: EntityId) -> Vec<NeedDocument> {
        self.state()
            .documents
            .iter()
            .filter(|d| d.need_id == need_id)
            .cloned()
            .collect()
    }

    pub fn events_of(&self, need_id: EntityId) -> Vec<ProgressEvent> {
        self.state()
            .events
            .iter()
            .filter(|e| e.need_id == need_id)
            .cloned()
            .collect()
    }

    // -- Internals ---------------------------------------------------------

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn failing(&self) -> MutexGuard<'_, HashSet<FailPoint>> {
        self.failing.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.failing().contains(&point) {
            return Err(StoreError::Backend(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

#[async_trait]
impl NeedStore for MemoryStore {
    async fn get(&self, id: EntityId) -> Result<Need, StoreError> {
        self.check(FailPoint::NeedGet)?;
        self.need(id).ok_or(StoreError::NotFound { entity: "need", id })
    }

    async fn find_in_flight_by_user(&self, user_id: UserId) -> Result<Option<Need>, StoreError> {
        self.check(FailPoint::NeedGet)?;
        Ok(self
            .state()
            .needs
            .values()
            .filter(|n| n.user_id == user_id && n.status.is_in_flight())
            .max_by_key(|n| (n.created_at, n.id))
            .cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Need>, StoreError> {
        self.check(FailPoint::NeedGet)?;
        let mut needs: Vec<Need> = self
            .state()
            .needs
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut needs, |n| (n.created_at, n.id));
        Ok(needs)
    }

    async fn create(&self, need: &Need) -> Result<Need, StoreError> {
        self.check(FailPoint::NeedCreate)?;
        let mut state = self.state();
        if state.needs.contains_key(&need.id) {
            return Err(StoreError::Backend(format!("duplicate need id {}", need.id)));
        }
        let now = Utc::now();
        let created = Need {
            created_at: now,
            updated_at: now,
            ..need.clone()
        };
        state.needs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, need: &Need) -> Result<Need, StoreError> {
        self.check(FailPoint::NeedUpdate)?;
        let mut state = self.state();
        let existing = state
            .needs
            .get_mut(&need.id)
            .ok_or(StoreError::NotFound { entity: "need", id: need.id })?;
        *existing = Need {
            created_at: existing.created_at,
            updated_at: Utc::now(),
            ..need.clone()
        };
        Ok(existing.clone())
    }

    async fn delete(&self, id: EntityId) -> Result<(), StoreError> {
        self.check(FailPoint::NeedDelete)?;
        let mut state = self.state();
        if state.needs.remove(&id).is_none() {
            return Err(StoreError::NotFound { entity: "need", id });
        }
        state.assignments.remove(&id);
        state.stories.remove(&id);
        state.documents.retain(|d| d.need_id != id);
        state.events.retain(|e| e.need_id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[async_trait]
impl AddressStore for MemoryStore {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<UserAddress>, StoreError> {
        let mut addresses = self.addresses_of(user_id);
        addresses.sort_by_key(|a| (!a.is_primary, a.created_at));
        Ok(addresses)
    }

    async fn get(&self, id: EntityId, user_id: UserId) -> Result<UserAddress, StoreError> {
        self.state()
            .addresses
            .iter()
            .find(|a| a.id == id && a.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "address", id })
    }

    async fn get_primary_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserAddress>, StoreError> {
        Ok(self
            .state()
            .addresses
            .iter()
            .find(|a| a.user_id == user_id && a.is_primary)
            .cloned())
    }

    async fn create(&self, input: &CreateUserAddress) -> Result<UserAddress, StoreError> {
        self.check(FailPoint::AddressCreate)?;
        let mut state = self.state();
        let now = Utc::now();
        if input.is_primary {
            for address in state.addresses.iter_mut().filter(|a| a.user_id == input.user_id) {
                address.is_primary = false;
            }
        }
        let fields = &input.address;
        let created = UserAddress {
            id: input.id,
            user_id: input.user_id,
            address: fields.address.clone(),
            address_ext: fields.address_ext.clone(),
            city: fields.city.clone(),
            state: fields.state.clone(),
            zip_code: fields.zip_code.clone(),
            privacy_display: fields.privacy_display,
            contact_methods: fields.contact_methods.clone(),
            preferred_contact_time: fields.preferred_contact_time.clone(),
            is_primary: input.is_primary,
            created_at: now,
            updated_at: now,
        };
        state.addresses.push(created.clone());
        Ok(created)
    }

    async fn set_primary(
        &self,
        user_id: UserId,
        address_id: EntityId,
    ) -> Result<UserAddress, StoreError> {
        self.check(FailPoint::AddressSetPrimary)?;
        let mut state = self.state();
        if !state
            .addresses
            .iter()
            .any(|a| a.id == address_id && a.user_id == user_id)
        {
            return Err(StoreError::NotFound { entity: "address", id: address_id });
        }
        let now = Utc::now();
        let mut updated = None;
        for address in state.addresses.iter_mut().filter(|a| a.user_id == user_id) {
            address.is_primary = address.id == address_id;
            address.updated_at = now;
            if address.is_primary {
                updated = Some(address.clone());
            }
        }
        updated.ok_or(StoreError::NotFound { entity: "address", id: address_id })
    }

    async fn delete(&self, id: EntityId, user_id: UserId) -> Result<(), StoreError> {
        self.check(FailPoint::AddressDelete)?;
        let mut state = self.state();
        let before = state.addresses.len();
        state.addresses.retain(|a| !(a.id == id && a.user_id == user_id));
        if state.addresses.len() == before {
            return Err(StoreError::NotFound { entity: "address", id });
        }
        for need in state.needs.values_mut() {
            if need.selected_address_id == Some(id) {
                need.selected_address_id = None;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Categories and assignments
// ---------------------------------------------------------------------------

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_active(&self) -> Result<Vec<NeedCategory>, StoreError> {
        self.check(FailPoint::CategoryLookup)?;
        let mut categories: Vec<NeedCategory> = self
            .state()
            .categories
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| (a.display_order, &a.name).cmp(&(b.display_order, &b.name)));
        Ok(categories)
    }

    async fn get_by_ids(&self, ids: &[EntityId]) -> Result<Vec<NeedCategory>, StoreError> {
        self.check(FailPoint::CategoryLookup)?;
        Ok(self
            .state()
            .categories
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<CategoryAssignment>, StoreError> {
        let mut rows = self.assignments_of(need_id);
        rows.sort_by_key(|r| (!r.is_primary, r.created_at, r.category_id));
        Ok(rows)
    }

    async fn replace_all(
        &self,
        need_id: EntityId,
        assignments: &[AssignCategory],
    ) -> Result<Vec<CategoryAssignment>, StoreError> {
        self.check(FailPoint::AssignmentReplace)?;
        let mut state = self.state();
        if !state.needs.contains_key(&need_id) {
            return Err(StoreError::NotFound { entity: "need", id: need_id });
        }

        let mut seen = HashSet::new();
        let mut primaries = 0;
        for assignment in assignments {
            if !seen.insert(assignment.category_id) {
                return Err(StoreError::Backend(format!(
                    "duplicate category {} for need {need_id}",
                    assignment.category_id
                )));
            }
            if !state.categories.iter().any(|c| c.id == assignment.category_id) {
                return Err(StoreError::Backend(format!(
                    "unknown category {}",
                    assignment.category_id
                )));
            }
            primaries += usize::from(assignment.is_primary);
        }
        if primaries > 1 {
            return Err(StoreError::Backend(format!(
                "more than one primary category for need {need_id}"
            )));
        }

        let now = Utc::now();
        let rows: Vec<CategoryAssignment> = assignments
            .iter()
            .map(|a| CategoryAssignment {
                need_id,
                category_id: a.category_id,
                is_primary: a.is_primary,
                created_at: now,
            })
            .collect();
        state.assignments.insert(need_id, rows.clone());
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Stories
// ---------------------------------------------------------------------------

#[async_trait]
impl StoryStore for MemoryStore {
    async fn get_by_need(&self, need_id: EntityId) -> Result<Option<NeedStory>, StoreError> {
        Ok(self.story_of(need_id))
    }

    async fn upsert(&self, input: &UpsertNeedStory) -> Result<NeedStory, StoreError> {
        self.check(FailPoint::StoryUpsert)?;
        let mut state = self.state();
        if !state.needs.contains_key(&input.need_id) {
            return Err(StoreError::NotFound { entity: "need", id: input.need_id });
        }
        let now = Utc::now();
        let created_at = state
            .stories
            .get(&input.need_id)
            .map(|s| s.created_at)
            .unwrap_or(now);
        let story = NeedStory {
            need_id: input.need_id,
            current: Some(input.current.clone()),
            need: Some(input.need.clone()),
            outcome: Some(input.outcome.clone()),
            created_at,
            updated_at: now,
        };
        state.stories.insert(input.need_id, story.clone());
        Ok(story)
    }

    async fn delete(&self, need_id: EntityId) -> Result<(), StoreError> {
        self.state().stories.remove(&need_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, input: &CreateNeedDocument) -> Result<NeedDocument, StoreError> {
        self.check(FailPoint::DocumentCreate)?;
        let mut state = self.state();
        if !state.needs.contains_key(&input.need_id) {
            return Err(StoreError::NotFound { entity: "need", id: input.need_id });
        }
        if state.documents.iter().any(|d| d.storage_key == input.storage_key) {
            return Err(StoreError::Backend(format!(
                "duplicate storage key {}",
                input.storage_key
            )));
        }
        let document = NeedDocument {
            id: input.id,
            need_id: input.need_id,
            user_id: input.user_id,
            document_type: input.document_type,
            file_name: input.file_name.clone(),
            file_size_bytes: input.file_size_bytes,
            mime_type: input.mime_type.clone(),
            storage_key: input.storage_key.clone(),
            uploaded_at: Utc::now(),
        };
        state.documents.push(document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        need_id: EntityId,
        id: EntityId,
        input: &UpdateNeedDocument,
    ) -> Result<NeedDocument, StoreError> {
        self.check(FailPoint::DocumentUpdate)?;
        let mut state = self.state();
        let document = state
            .documents
            .iter_mut()
            .find(|d| d.id == id && d.need_id == need_id)
            .ok_or(StoreError::NotFound { entity: "document", id })?;
        document.document_type = input.document_type;
        document.file_name = input.file_name.clone();
        document.uploaded_at = Utc::now();
        Ok(document.clone())
    }

    async fn get(&self, need_id: EntityId, id: EntityId) -> Result<NeedDocument, StoreError> {
        self.state()
            .documents
            .iter()
            .find(|d| d.id == id && d.need_id == need_id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "document", id })
    }

    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<NeedDocument>, StoreError> {
        self.check(FailPoint::DocumentList)?;
        let mut documents = self.documents_of(need_id);
        newest_first(&mut documents, |d| (d.uploaded_at, d.id));
        Ok(documents)
    }

    async fn delete(&self, need_id: EntityId, id: EntityId) -> Result<(), StoreError> {
        self.check(FailPoint::DocumentDelete)?;
        let mut state = self.state();
        let before = state.documents.len();
        state.documents.retain(|d| !(d.id == id && d.need_id == need_id));
        if state.documents.len() == before {
            return Err(StoreError::NotFound { entity: "document", id });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Progress log
// ---------------------------------------------------------------------------

#[async_trait]
impl ProgressLog for MemoryStore {
    async fn append(&self, need_id: EntityId, step: NeedStep) -> Result<(), StoreError> {
        self.check(FailPoint::ProgressAppend)?;
        self.state().events.push(ProgressEvent {
            id: new_id(),
            need_id,
            step,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_by_need(&self, need_id: EntityId) -> Result<Vec<ProgressEvent>, StoreError> {
        Ok(self.events_of(need_id))
    }
}
