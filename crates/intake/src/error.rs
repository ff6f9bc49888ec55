//! Error taxonomy for intake operations.
//!
//! Validation and not-found failures are user- or caller-correctable and
//! never leave partial writes behind. Store and object-store failures are
//! infrastructure errors the caller may retry.

use hearth_core::error::CoreError;
use hearth_core::types::EntityId;
use hearth_core::validation::{FieldErrors, FORM_FIELD};
use hearth_storage::ObjectStoreError;

/// Failure reported by a store port.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Store error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    #[error(transparent)]
    Core(CoreError),
}

impl IntakeError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        IntakeError::Validation(FieldErrors::single(field, message))
    }

    /// Infrastructure failures that may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            IntakeError::Store(StoreError::Backend(_)) => true,
            IntakeError::ObjectStore(err) => !matches!(err, ObjectStoreError::InvalidKey(_)),
            _ => false,
        }
    }
}

impl From<FieldErrors> for IntakeError {
    fn from(errors: FieldErrors) -> Self {
        IntakeError::Validation(errors)
    }
}

impl From<StoreError> for IntakeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => IntakeError::NotFound { entity, id },
            other => IntakeError::Store(other),
        }
    }
}

impl From<CoreError> for IntakeError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => IntakeError::invalid(FORM_FIELD, message),
            CoreError::NotFound { entity, id } => IntakeError::NotFound { entity, id },
            other => IntakeError::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::types::new_id;

    #[test]
    fn store_not_found_surfaces_as_not_found() {
        let id = new_id();
        let err: IntakeError = StoreError::NotFound { entity: "need", id }.into();
        assert!(matches!(err, IntakeError::NotFound { entity: "need", id: got } if got == id));
        assert!(!err.is_retryable());
    }

    #[test]
    fn backend_failures_are_retryable() {
        let err: IntakeError = StoreError::Backend("connection reset".into()).into();
        assert!(err.is_retryable());

        let err: IntakeError = ObjectStoreError::Backend("503".into()).into();
        assert!(err.is_retryable());

        let err: IntakeError = ObjectStoreError::InvalidKey("../x".into()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn core_validation_becomes_form_error() {
        let err: IntakeError = CoreError::Validation("skip ahead".into()).into();
        match err {
            IntakeError::Validation(fields) => assert_eq!(fields.get(FORM_FIELD), ["skip ahead"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
