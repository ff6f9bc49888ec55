//! Pure domain rules for the need intake wizard.
//!
//! Nothing in this crate performs I/O; the storage, object-store and HTTP
//! layers build on these types and validators.

pub mod categories;
pub mod documents;
pub mod error;
pub mod location;
pub mod need;
pub mod review;
pub mod story;
pub mod types;
pub mod validation;
