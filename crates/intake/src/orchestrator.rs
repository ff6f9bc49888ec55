//! Intake orchestrator: the entry points the HTTP layer calls.
//!
//! Resolves which need a caller is working on and where they should be
//! sent, assembles read-only step views, and delegates writes to the
//! [`StepController`] and [`DocumentManager`].

use chrono::Utc;
use hearth_core::documents::DocumentType;
use hearth_core::need::{ensure_step_reachable, IntakeRoute, NeedStatus, NeedStep};
use hearth_core::types::{new_id, EntityId, Timestamp, UserId};
use hearth_core::validation::FORM_FIELD;
use hearth_db::models::address::UserAddress;
use hearth_db::models::category::{CategoryAssignment, NeedCategory};
use hearth_db::models::document::NeedDocument;
use hearth_db::models::need::Need;
use hearth_db::models::progress::ProgressEvent;
use hearth_db::models::story::NeedStory;
use serde::Serialize;

use crate::controller::{StepController, StepOutcome, StepSubmission};
use crate::documents::{BatchUploadSummary, DocumentManager, DocumentMetadataInput, UploadFile};
use crate::error::{IntakeError, StoreError};
use crate::stores::Stores;

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// Where a caller resumes intake.
#[derive(Debug, Serialize)]
pub struct Resume {
    pub need: Need,
    pub route: IntakeRoute,
    /// True when a fresh draft was created for this call.
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
}

impl From<&NeedCategory> for CategoryRef {
    fn from(category: &NeedCategory) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

/// Everything shown on the review step.
#[derive(Debug, Serialize)]
pub struct ReviewSummary {
    pub need: Need,
    pub story: Option<NeedStory>,
    pub primary_category: Option<CategoryRef>,
    pub secondary_categories: Vec<CategoryRef>,
    pub address: Option<UserAddress>,
    pub documents: Vec<NeedDocument>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DocumentTypeOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Read-only data for re-displaying one step.
#[derive(Debug, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepView {
    Welcome {
        need: Need,
    },
    Location {
        need: Need,
        addresses: Vec<UserAddress>,
        selected_address_id: Option<EntityId>,
    },
    Categories {
        need: Need,
        categories: Vec<NeedCategory>,
        primary_category_id: Option<EntityId>,
        secondary_category_ids: Vec<EntityId>,
    },
    Story {
        need: Need,
        story: Option<NeedStory>,
    },
    Documents {
        need: Need,
        documents: Vec<NeedDocument>,
        document_types: Vec<DocumentTypeOption>,
    },
    Review(ReviewSummary),
    Confirmation {
        need: Need,
    },
}

/// One row of the requester's profile list.
#[derive(Debug, Serialize)]
pub struct NeedSummary {
    pub need_id: EntityId,
    pub status: NeedStatus,
    pub current_step: NeedStep,
    pub step_label: &'static str,
    pub amount_needed_cents: i64,
    pub amount_raised_cents: i64,
    pub primary_category_name: Option<String>,
    pub can_delete: bool,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct IntakeOrchestrator {
    stores: Stores,
    controller: StepController,
}

impl IntakeOrchestrator {
    pub fn new(stores: Stores) -> Self {
        let controller = StepController::new(stores.clone());
        Self { stores, controller }
    }

    pub fn controller(&self) -> &StepController {
        &self.controller
    }

    fn documents(&self) -> &DocumentManager {
        self.controller.documents()
    }

    // -- Resume ------------------------------------------------------------

    /// Find the caller's in-flight need and where to send them, creating a
    /// draft only when none exists.
    pub async fn resume(&self, user_id: UserId) -> Result<Resume, IntakeError> {
        if let Some(need) = self.stores.needs.find_in_flight_by_user(user_id).await? {
            let route = IntakeRoute::for_need(need.status, need.current_step);
            return Ok(Resume {
                need,
                route,
                created: false,
            });
        }
        self.create_draft(user_id).await
    }

    /// Begin another need. An existing draft is returned instead of
    /// creating a second one.
    pub async fn start_new(&self, user_id: UserId) -> Result<Resume, IntakeError> {
        let draft = self
            .stores
            .needs
            .find_in_flight_by_user(user_id)
            .await?
            .filter(|n| n.status == NeedStatus::Draft);
        match draft {
            Some(need) => Ok(Resume {
                route: IntakeRoute::for_need(need.status, need.current_step),
                need,
                created: false,
            }),
            None => self.create_draft(user_id).await,
        }
    }

    async fn create_draft(&self, user_id: UserId) -> Result<Resume, IntakeError> {
        let need = self
            .stores
            .needs
            .create(&Need::new_draft(new_id(), user_id, Utc::now()))
            .await?;
        tracing::info!(need_id = %need.id, %user_id, "Draft need created");
        Ok(Resume {
            route: IntakeRoute::for_need(need.status, need.current_step),
            need,
            created: true,
        })
    }

    // -- Steps -------------------------------------------------------------

    pub async fn submit(
        &self,
        user_id: UserId,
        need_id: EntityId,
        submission: StepSubmission,
    ) -> Result<StepOutcome, IntakeError> {
        self.controller.apply(user_id, need_id, submission).await
    }

    /// Read-only data for re-displaying a step. Never writes.
    ///
    /// A draft may view any step up to its marker. A submitted need may view
    /// every step read-only, and is the only kind with a confirmation view.
    pub async fn view(
        &self,
        user_id: UserId,
        need_id: EntityId,
        step: NeedStep,
    ) -> Result<StepView, IntakeError> {
        let need = self.controller.load_owned(user_id, need_id).await?;

        if step == NeedStep::Complete {
            if need.status.is_editable() {
                return Err(IntakeError::invalid(
                    FORM_FIELD,
                    "This need has not been submitted yet",
                ));
            }
            return Ok(StepView::Confirmation { need });
        }
        if need.status.is_editable() {
            ensure_step_reachable(need.current_step, step)?;
        }

        let view = match step {
            NeedStep::Welcome => StepView::Welcome { need },
            NeedStep::Location => StepView::Location {
                addresses: self.stores.addresses.list_by_user(user_id).await?,
                selected_address_id: need.selected_address_id,
                need,
            },
            NeedStep::Categories => {
                let assignments = self.stores.assignments.list_by_need(need.id).await?;
                let (primary, secondary) = split_assignments(&assignments);
                StepView::Categories {
                    categories: self.stores.categories.list_active().await?,
                    primary_category_id: primary,
                    secondary_category_ids: secondary,
                    need,
                }
            }
            NeedStep::Story => StepView::Story {
                story: self.stores.stories.get_by_need(need.id).await?,
                need,
            },
            NeedStep::Documents => StepView::Documents {
                documents: self.documents().list(need.id).await?,
                document_types: DocumentType::ALL
                    .iter()
                    .map(|t| DocumentTypeOption {
                        value: t.as_str(),
                        label: t.label(),
                    })
                    .collect(),
                need,
            },
            NeedStep::Review => StepView::Review(self.summarize(user_id, need).await?),
            NeedStep::Complete => StepView::Confirmation { need },
        };
        Ok(view)
    }

    /// Compose the review page from every store. Pure read.
    pub async fn review_summary(
        &self,
        user_id: UserId,
        need_id: EntityId,
    ) -> Result<ReviewSummary, IntakeError> {
        let need = self.controller.load_owned(user_id, need_id).await?;
        self.summarize(user_id, need).await
    }

    async fn summarize(&self, user_id: UserId, need: Need) -> Result<ReviewSummary, IntakeError> {
        let story = self.stores.stories.get_by_need(need.id).await?;

        let assignments = self.stores.assignments.list_by_need(need.id).await?;
        let ids: Vec<EntityId> = assignments.iter().map(|a| a.category_id).collect();
        let categories = if ids.is_empty() {
            Vec::new()
        } else {
            self.stores.categories.get_by_ids(&ids).await?
        };
        let lookup = |id: EntityId| categories.iter().find(|c| c.id == id).map(CategoryRef::from);
        let (primary_id, secondary_ids) = split_assignments(&assignments);

        let address = match need.selected_address_id {
            None => None,
            Some(address_id) => match self.stores.addresses.get(address_id, user_id).await {
                Ok(address) => Some(address),
                Err(StoreError::NotFound { .. }) => None,
                Err(e) => return Err(e.into()),
            },
        };

        Ok(ReviewSummary {
            story,
            primary_category: primary_id.and_then(lookup),
            secondary_categories: secondary_ids.into_iter().filter_map(lookup).collect(),
            address,
            documents: self.documents().list(need.id).await?,
            need,
        })
    }

    // -- Documents ---------------------------------------------------------

    pub async fn upload_documents(
        &self,
        user_id: UserId,
        need_id: EntityId,
        files: Vec<UploadFile>,
    ) -> Result<BatchUploadSummary, IntakeError> {
        let need = self
            .controller
            .load_editable(user_id, need_id, NeedStep::Documents)
            .await?;
        Ok(self.documents().upload_batch(need.id, user_id, files).await)
    }

    pub async fn list_documents(
        &self,
        user_id: UserId,
        need_id: EntityId,
    ) -> Result<Vec<NeedDocument>, IntakeError> {
        let need = self.controller.load_owned(user_id, need_id).await?;
        self.documents().list(need.id).await
    }

    pub async fn update_document(
        &self,
        user_id: UserId,
        need_id: EntityId,
        document_id: EntityId,
        input: &DocumentMetadataInput,
    ) -> Result<NeedDocument, IntakeError> {
        let need = self
            .controller
            .load_editable(user_id, need_id, NeedStep::Documents)
            .await?;
        self.documents().update_metadata(need.id, document_id, input).await
    }

    pub async fn delete_document(
        &self,
        user_id: UserId,
        need_id: EntityId,
        document_id: EntityId,
    ) -> Result<(), IntakeError> {
        let need = self
            .controller
            .load_editable(user_id, need_id, NeedStep::Documents)
            .await?;
        self.documents().delete(need.id, document_id).await
    }

    // -- Profile -----------------------------------------------------------

    /// The caller's needs, newest first.
    pub async fn list_needs(&self, user_id: UserId) -> Result<Vec<NeedSummary>, IntakeError> {
        let needs = self.stores.needs.list_by_user(user_id).await?;

        let mut primary_ids = Vec::with_capacity(needs.len());
        for need in &needs {
            let assignments = self.stores.assignments.list_by_need(need.id).await?;
            primary_ids.push(split_assignments(&assignments).0);
        }
        let wanted: Vec<EntityId> = primary_ids.iter().flatten().copied().collect();
        let categories = if wanted.is_empty() {
            Vec::new()
        } else {
            self.stores.categories.get_by_ids(&wanted).await?
        };

        Ok(needs
            .into_iter()
            .zip(primary_ids)
            .map(|(need, primary)| NeedSummary {
                need_id: need.id,
                status: need.status,
                current_step: need.current_step,
                step_label: need.current_step.label(),
                amount_needed_cents: need.amount_needed_cents,
                amount_raised_cents: need.amount_raised_cents,
                primary_category_name: primary.and_then(|id| {
                    categories.iter().find(|c| c.id == id).map(|c| c.name.clone())
                }),
                can_delete: need.status == NeedStatus::Draft,
                created_at: need.created_at,
            })
            .collect())
    }

    /// Delete a draft the caller owns. Its documents are removed one by one
    /// (blob, then row); if any of them fails the need is left in place
    /// with the documents not yet removed.
    pub async fn discard_draft(&self, user_id: UserId, need_id: EntityId) -> Result<(), IntakeError> {
        let need = self.controller.load_owned(user_id, need_id).await?;
        if need.status != NeedStatus::Draft {
            return Err(IntakeError::invalid(
                FORM_FIELD,
                "Only draft needs can be deleted",
            ));
        }

        let removed = self.documents().delete_all_for_need(need.id).await?;
        self.stores.needs.delete(need.id).await?;
        tracing::info!(%need_id, %user_id, documents_removed = removed, "Draft need discarded");
        Ok(())
    }

    /// Completed-step events for a need, oldest first.
    pub async fn progress_history(
        &self,
        user_id: UserId,
        need_id: EntityId,
    ) -> Result<Vec<ProgressEvent>, IntakeError> {
        let need = self.controller.load_owned(user_id, need_id).await?;
        Ok(self.stores.progress.list_by_need(need.id).await?)
    }
}

/// Split an assignment set into its primary id and secondary ids.
fn split_assignments(assignments: &[CategoryAssignment]) -> (Option<EntityId>, Vec<EntityId>) {
    let primary = assignments.iter().find(|a| a.is_primary).map(|a| a.category_id);
    let secondary = assignments
        .iter()
        .filter(|a| !a.is_primary)
        .map(|a| a.category_id)
        .collect();
    (primary, secondary)
}
