#![allow(dead_code)]

use std::sync::Arc;

use hearth_core::categories::CategorySelection;
use hearth_core::documents::DocumentType;
use hearth_core::location::{LocationSelection, NewAddressInput};
use hearth_core::need::NeedStep;
use hearth_core::review::ReviewAgreements;
use hearth_core::story::StoryInput;
use hearth_core::types::{new_id, EntityId, UserId};
use hearth_db::models::need::Need;
use hearth_intake::memory::MemoryStore;
use hearth_intake::{DocumentsSubmission, IntakeOrchestrator, StepSubmission, Stores, UploadFile};
use hearth_storage::MemoryObjectStore;
use uuid::Uuid;

pub const HOUSING: Uuid = Uuid::from_u128(0x0190a000_0000_7000_8000_000000000001);
pub const MEDICAL: Uuid = Uuid::from_u128(0x0190a000_0000_7000_8000_000000000002);
pub const FOOD: Uuid = Uuid::from_u128(0x0190a000_0000_7000_8000_000000000003);
pub const UTILITIES: Uuid = Uuid::from_u128(0x0190a000_0000_7000_8000_000000000004);

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub intake: IntakeOrchestrator,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::with_default_categories());
    let objects = Arc::new(MemoryObjectStore::new());
    let stores = Stores::from_single(store.clone(), objects.clone());
    Harness {
        store,
        objects,
        intake: IntakeOrchestrator::new(stores),
    }
}

pub fn user() -> UserId {
    new_id()
}

pub fn address_input(street: &str) -> NewAddressInput {
    NewAddressInput {
        address: Some(street.to_string()),
        city: Some("Springfield".to_string()),
        state: Some("IL".to_string()),
        zip_code: Some("62704".to_string()),
        ..NewAddressInput::default()
    }
}

pub fn new_address(street: &str, make_primary: bool) -> StepSubmission {
    StepSubmission::Location(LocationSelection::New {
        address: address_input(street),
        make_primary,
    })
}

pub fn categories(primary: &[EntityId], secondary: &[EntityId]) -> StepSubmission {
    StepSubmission::Categories(CategorySelection {
        primary: primary.to_vec(),
        secondary: secondary.to_vec(),
    })
}

pub fn story(amount: i64) -> StepSubmission {
    StepSubmission::Story(StoryInput {
        current: Some("Laid off in March".to_string()),
        need: Some("Two months of rent".to_string()),
        outcome: Some("Stay housed while I retrain".to_string()),
        amount: Some(amount),
    })
}

pub fn skip_documents() -> StepSubmission {
    StepSubmission::Documents(DocumentsSubmission {
        skip_documents: true,
        files: Vec::new(),
    })
}

pub fn agree() -> StepSubmission {
    StepSubmission::Review(ReviewAgreements {
        confirm_accurate: true,
        agree_terms: true,
    })
}

pub fn pdf(name: &str) -> UploadFile {
    UploadFile {
        file_name: name.to_string(),
        content_type: "application/pdf".to_string(),
        document_type: DocumentType::UtilityBill,
        bytes: b"%PDF-1.7 test".to_vec(),
    }
}

/// Create a draft and apply every step before `target`, leaving the marker
/// on `target`.
pub async fn draft_at(h: &Harness, user_id: UserId, target: NeedStep) -> Need {
    let mut need = h.intake.resume(user_id).await.unwrap().need;
    let steps = [
        (NeedStep::Welcome, StepSubmission::Welcome),
        (NeedStep::Location, new_address("12 Elm St", false)),
        (NeedStep::Categories, categories(&[HOUSING], &[UTILITIES])),
        (NeedStep::Story, story(1250)),
        (NeedStep::Documents, skip_documents()),
    ];
    for (step, submission) in steps {
        if step >= target {
            break;
        }
        need = h.intake.submit(user_id, need.id, submission).await.unwrap().need;
    }
    assert_eq!(need.current_step, target.min(NeedStep::Review));
    need
}
