//! Step transition controller: validates and applies each intake step.
//!
//! Every apply follows the same shape. Load the need and check ownership,
//! editability and reachability. Validate the step payload. Perform the
//! step's own writes. Write the need record last, then append a progress
//! event. A failure before the need write leaves the marker where it was
//! and logs no event; if the need write itself fails, the step's own
//! writes are put back the way they were.

use chrono::Utc;
use hearth_core::categories::{unresolved_ids, validate_category_selection, CategorySelection};
use hearth_core::location::{
    new_address_becomes_primary, uses_non_primary_address, validate_new_address,
    LocationSelection,
};
use hearth_core::need::{
    ensure_step_reachable, marker_after, validate_status_step, IntakeRoute, NeedStatus, NeedStep,
    MAX_PERSISTED_STEP,
};
use hearth_core::review::{validate_agreements, ReviewAgreements};
use hearth_core::story::{validate_story, StoryInput};
use hearth_core::types::{new_id, EntityId, UserId};
use hearth_core::validation::{FieldErrors, FORM_FIELD};
use hearth_db::models::address::{CreateUserAddress, UserAddress};
use hearth_db::models::category::AssignCategory;
use hearth_db::models::need::Need;
use hearth_db::models::story::UpsertNeedStory;
use serde::Serialize;

use crate::documents::{BatchUploadSummary, DocumentManager, UploadFile};
use crate::error::{IntakeError, StoreError};
use crate::stores::Stores;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Payload for one step submission.
#[derive(Debug, Clone)]
pub enum StepSubmission {
    Welcome,
    Location(LocationSelection),
    Categories(CategorySelection),
    Story(StoryInput),
    Documents(DocumentsSubmission),
    Review(ReviewAgreements),
}

impl StepSubmission {
    pub fn step(&self) -> NeedStep {
        match self {
            Self::Welcome => NeedStep::Welcome,
            Self::Location(_) => NeedStep::Location,
            Self::Categories(_) => NeedStep::Categories,
            Self::Story(_) => NeedStep::Story,
            Self::Documents(_) => NeedStep::Documents,
            Self::Review(_) => NeedStep::Review,
        }
    }
}

/// Documents step payload: files uploaded with the submission, and the
/// explicit opt-out.
#[derive(Debug, Clone, Default)]
pub struct DocumentsSubmission {
    pub skip_documents: bool,
    pub files: Vec<UploadFile>,
}

/// Result of a successful step.
#[derive(Debug, Serialize)]
pub struct StepOutcome {
    pub need: Need,
    /// Where the caller goes next.
    pub next: IntakeRoute,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads: Option<BatchUploadSummary>,
}

/// Route that follows a completed `step` in wizard order.
pub fn next_route(step: NeedStep) -> IntakeRoute {
    match step.next() {
        Some(next) if next <= MAX_PERSISTED_STEP => IntakeRoute::Step(next),
        _ => IntakeRoute::Confirmation,
    }
}

/// Address change made by a location step before the need update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressWrite {
    None,
    Created,
    Promoted,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StepController {
    stores: Stores,
    documents: DocumentManager,
}

impl StepController {
    pub fn new(stores: Stores) -> Self {
        let documents = DocumentManager::new(stores.documents.clone(), stores.objects.clone());
        Self { stores, documents }
    }

    pub fn documents(&self) -> &DocumentManager {
        &self.documents
    }

    /// Dispatch a submission to its step. Infrastructure failures are
    /// logged here with the need and step.
    pub async fn apply(
        &self,
        user_id: UserId,
        need_id: EntityId,
        submission: StepSubmission,
    ) -> Result<StepOutcome, IntakeError> {
        let step = submission.step();
        let result = match submission {
            StepSubmission::Welcome => self.apply_welcome(user_id, need_id).await,
            StepSubmission::Location(selection) => {
                self.apply_location(user_id, need_id, selection).await
            }
            StepSubmission::Categories(selection) => {
                self.apply_categories(user_id, need_id, &selection).await
            }
            StepSubmission::Story(input) => self.apply_story(user_id, need_id, &input).await,
            StepSubmission::Documents(input) => {
                self.apply_documents(user_id, need_id, input).await
            }
            StepSubmission::Review(agreements) => {
                self.apply_review(user_id, need_id, &agreements).await
            }
        };

        if let Err(e) = &result {
            if e.is_retryable() {
                tracing::error!(
                    %need_id,
                    %user_id,
                    step = step.as_str(),
                    error = %e,
                    "Intake step failed",
                );
            }
        }
        result
    }

    /// Load a need the caller owns. Someone else's need is reported as
    /// missing.
    pub async fn load_owned(&self, user_id: UserId, need_id: EntityId) -> Result<Need, IntakeError> {
        let need = self.stores.needs.get(need_id).await?;
        if need.user_id != user_id {
            return Err(IntakeError::NotFound {
                entity: "need",
                id: need_id,
            });
        }
        Ok(need)
    }

    /// Load a need that may still be edited at `step`.
    pub async fn load_editable(
        &self,
        user_id: UserId,
        need_id: EntityId,
        step: NeedStep,
    ) -> Result<Need, IntakeError> {
        let need = self.load_owned(user_id, need_id).await?;
        if !need.status.is_editable() {
            return Err(IntakeError::invalid(
                FORM_FIELD,
                "This need has been submitted and can no longer be edited",
            ));
        }
        ensure_step_reachable(need.current_step, step)?;
        Ok(need)
    }

    // -- Steps -------------------------------------------------------------

    pub async fn apply_welcome(
        &self,
        user_id: UserId,
        need_id: EntityId,
    ) -> Result<StepOutcome, IntakeError> {
        let need = self.load_editable(user_id, need_id, NeedStep::Welcome).await?;
        self.complete(need, NeedStep::Welcome).await
    }

    /// Location step. Address writes happen before the need update; if that
    /// update fails they are rolled back so a retry starts from the same
    /// address book.
    pub async fn apply_location(
        &self,
        user_id: UserId,
        need_id: EntityId,
        selection: LocationSelection,
    ) -> Result<StepOutcome, IntakeError> {
        let mut need = self.load_editable(user_id, need_id, NeedStep::Location).await?;
        let previous_primary = self
            .stores
            .addresses
            .get_primary_by_user(user_id)
            .await?
            .map(|a| a.id);

        let (resolved, write) = match selection {
            LocationSelection::Existing {
                address_id,
                make_primary,
            } => self.resolve_existing_address(user_id, address_id, make_primary).await?,
            LocationSelection::New {
                address,
                make_primary,
            } => {
                let validated = validate_new_address(&address)?;
                let existing = self.stores.addresses.list_by_user(user_id).await?.len();
                let input = CreateUserAddress {
                    id: new_id(),
                    user_id,
                    address: validated,
                    is_primary: new_address_becomes_primary(existing, make_primary),
                };
                let created = self.stores.addresses.create(&input).await?;
                tracing::info!(
                    %user_id,
                    address_id = %created.id,
                    is_primary = created.is_primary,
                    "Address created",
                );
                (created, AddressWrite::Created)
            }
        };

        let primary = if resolved.is_primary {
            Some(resolved.id)
        } else {
            previous_primary
        };
        need.selected_address_id = Some(resolved.id);
        need.uses_non_primary_address = uses_non_primary_address(resolved.id, primary);

        match self.complete(need, NeedStep::Location).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.undo_address_write(user_id, resolved.id, write, previous_primary)
                    .await;
                Err(e)
            }
        }
    }

    async fn resolve_existing_address(
        &self,
        user_id: UserId,
        address_id: EntityId,
        make_primary: bool,
    ) -> Result<(UserAddress, AddressWrite), IntakeError> {
        let address = match self.stores.addresses.get(address_id, user_id).await {
            Ok(address) => address,
            Err(StoreError::NotFound { .. }) => {
                return Err(IntakeError::invalid(
                    "address_id",
                    "Select one of your saved addresses",
                ))
            }
            Err(e) => return Err(e.into()),
        };

        if make_primary && !address.is_primary {
            let promoted = self.stores.addresses.set_primary(user_id, address_id).await?;
            tracing::info!(%user_id, %address_id, "Primary address changed");
            return Ok((promoted, AddressWrite::Promoted));
        }
        Ok((address, AddressWrite::None))
    }

    /// Reverse the address write of a location step whose need update
    /// failed. Failures here are logged; the caller still sees the
    /// original error.
    async fn undo_address_write(
        &self,
        user_id: UserId,
        address_id: EntityId,
        write: AddressWrite,
        previous_primary: Option<EntityId>,
    ) {
        if write == AddressWrite::None {
            return;
        }
        if write == AddressWrite::Created {
            if let Err(e) = self.stores.addresses.delete(address_id, user_id).await {
                tracing::warn!(
                    %user_id,
                    %address_id,
                    error = %e,
                    "Address created by a failed location step was not removed",
                );
                return;
            }
        }
        if let Some(previous) = previous_primary.filter(|p| *p != address_id) {
            let restored = self.stores.addresses.get_primary_by_user(user_id).await;
            if matches!(restored, Ok(Some(ref current)) if current.id == previous) {
                return;
            }
            if let Err(e) = self.stores.addresses.set_primary(user_id, previous).await {
                tracing::warn!(
                    %user_id,
                    address_id = %previous,
                    error = %e,
                    "Primary address not restored after a failed location step",
                );
            }
        }
    }

    pub async fn apply_categories(
        &self,
        user_id: UserId,
        need_id: EntityId,
        selection: &CategorySelection,
    ) -> Result<StepOutcome, IntakeError> {
        let need = self.load_editable(user_id, need_id, NeedStep::Categories).await?;
        let resolved = validate_category_selection(selection)?;

        let ids = resolved.all_ids();
        let active: Vec<EntityId> = self
            .stores
            .categories
            .get_by_ids(&ids)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| c.id)
            .collect();
        let missing = unresolved_ids(&ids, &active);
        if !missing.is_empty() {
            let mut errors = FieldErrors::new();
            for id in missing {
                if id == resolved.primary {
                    errors.add("primary", format!("Unknown category {id}"));
                } else {
                    errors.add("secondary", format!("Unknown category {id}"));
                }
            }
            return Err(errors.into());
        }

        let rows: Vec<AssignCategory> = resolved
            .assignment_rows()
            .into_iter()
            .map(AssignCategory::from)
            .collect();
        let previous: Vec<AssignCategory> = self
            .stores
            .assignments
            .list_by_need(need.id)
            .await?
            .into_iter()
            .map(|a| AssignCategory::from((a.category_id, a.is_primary)))
            .collect();
        self.stores.assignments.replace_all(need.id, &rows).await?;

        let need_id = need.id;
        match self.complete(need, NeedStep::Categories).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(undo) = self.stores.assignments.replace_all(need_id, &previous).await {
                    tracing::warn!(
                        %need_id,
                        error = %undo,
                        "Category assignments not restored after a failed step",
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn apply_story(
        &self,
        user_id: UserId,
        need_id: EntityId,
        input: &StoryInput,
    ) -> Result<StepOutcome, IntakeError> {
        let mut need = self.load_editable(user_id, need_id, NeedStep::Story).await?;
        let story = validate_story(input)?;

        let previous = self.stores.stories.get_by_need(need.id).await?;
        self.stores
            .stories
            .upsert(&UpsertNeedStory {
                need_id: need.id,
                current: story.current,
                need: story.need,
                outcome: story.outcome,
            })
            .await?;
        need.amount_needed_cents = story.amount_needed_cents;

        let need_id = need.id;
        match self.complete(need, NeedStep::Story).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let undo = match previous {
                    Some(previous) => self
                        .stores
                        .stories
                        .upsert(&UpsertNeedStory {
                            need_id,
                            current: previous.current.unwrap_or_default(),
                            need: previous.need.unwrap_or_default(),
                            outcome: previous.outcome.unwrap_or_default(),
                        })
                        .await
                        .map(|_| ()),
                    None => self.stores.stories.delete(need_id).await,
                };
                if let Err(undo) = undo {
                    tracing::warn!(
                        %need_id,
                        error = %undo,
                        "Story not restored after a failed step",
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn apply_documents(
        &self,
        user_id: UserId,
        need_id: EntityId,
        input: DocumentsSubmission,
    ) -> Result<StepOutcome, IntakeError> {
        let need = self.load_editable(user_id, need_id, NeedStep::Documents).await?;

        let uploads = if input.files.is_empty() {
            None
        } else {
            Some(self.documents.upload_batch(need.id, user_id, input.files).await)
        };

        let stored = self.documents.list(need.id).await?.len();
        if stored == 0 && !input.skip_documents {
            let mut errors = FieldErrors::single(
                "documents",
                "Upload at least one document, or choose to skip this step",
            );
            for failed in uploads.iter().flat_map(|u| &u.failed) {
                errors.add("files", format!("{}: {}", failed.file_name, failed.reason));
            }
            return Err(errors.into());
        }

        let mut outcome = self.complete(need, NeedStep::Documents).await?;
        outcome.uploads = uploads;
        Ok(outcome)
    }

    /// Submit the need. A repeated submission of an already submitted need
    /// is a no-op that routes to the confirmation view.
    pub async fn apply_review(
        &self,
        user_id: UserId,
        need_id: EntityId,
        agreements: &ReviewAgreements,
    ) -> Result<StepOutcome, IntakeError> {
        let mut need = self.load_owned(user_id, need_id).await?;
        if !need.status.is_editable() {
            tracing::info!(
                %need_id,
                status = need.status.as_str(),
                "Repeated review submission ignored",
            );
            return Ok(StepOutcome {
                need,
                next: IntakeRoute::Confirmation,
                uploads: None,
            });
        }
        ensure_step_reachable(need.current_step, NeedStep::Review)?;
        validate_agreements(agreements)?;

        need.status = NeedStatus::Submitted;
        need.submitted_at = Some(Utc::now());
        need.current_step = NeedStep::Review;

        let outcome = self.complete(need, NeedStep::Review).await?;
        tracing::info!(%need_id, %user_id, "Need submitted");
        Ok(outcome)
    }

    // -- Shared tail -------------------------------------------------------

    async fn complete(&self, mut need: Need, step: NeedStep) -> Result<StepOutcome, IntakeError> {
        need.current_step = marker_after(need.current_step, step);
        validate_status_step(need.status, need.current_step)?;

        let need = self.stores.needs.update(&need).await?;
        self.record_progress(need.id, step).await;

        tracing::info!(
            need_id = %need.id,
            user_id = %need.user_id,
            step = step.as_str(),
            current_step = need.current_step.as_str(),
            "Intake step applied",
        );
        Ok(StepOutcome {
            next: next_route(step),
            need,
            uploads: None,
        })
    }

    async fn record_progress(&self, need_id: EntityId, step: NeedStep) {
        if let Err(e) = self.stores.progress.append(need_id, step).await {
            tracing::warn!(
                %need_id,
                step = step.as_str(),
                error = %e,
                "Progress event not recorded",
            );
        }
    }
}
