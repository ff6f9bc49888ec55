//! Need intake: the step state machine, document consistency, and the
//! orchestration the HTTP layer calls into.
//!
//! Services are written against the store ports in [`stores`]; [`pg`]
//! backs them with PostgreSQL and [`memory`] with in-process state.

pub mod controller;
pub mod documents;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod pg;
pub mod stores;

pub use controller::{DocumentsSubmission, StepController, StepOutcome, StepSubmission};
pub use documents::{BatchUploadSummary, DocumentManager, DocumentMetadataInput, UploadFile};
pub use error::{IntakeError, StoreError};
pub use orchestrator::{IntakeOrchestrator, NeedSummary, Resume, ReviewSummary, StepView};
pub use stores::Stores;
