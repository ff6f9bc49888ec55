/// All entity primary keys are application-generated UUID v7 values.
pub type EntityId = uuid::Uuid;

/// Verified identity of the caller (the identity token's subject).
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh, time-ordered entity id.
pub fn new_id() -> EntityId {
    uuid::Uuid::now_v7()
}
