//! Repository layer: one zero-sized struct per table, each exposing async
//! functions over a `PgPool`.

pub mod address_repo;
pub mod category_repo;
pub mod document_repo;
pub mod need_repo;
pub mod progress_repo;
pub mod story_repo;

pub use address_repo::AddressRepo;
pub use category_repo::{CategoryAssignmentRepo, CategoryRepo};
pub use document_repo::DocumentRepo;
pub use need_repo::NeedRepo;
pub use progress_repo::ProgressRepo;
pub use story_repo::StoryRepo;
