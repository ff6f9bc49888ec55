//! Saved user address model and DTOs.

use hearth_core::location::{NewAddress, PrivacyDisplay};
use hearth_core::types::{EntityId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_addresses` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserAddress {
    pub id: EntityId,
    pub user_id: UserId,
    pub address: String,
    pub address_ext: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[sqlx(try_from = "String")]
    pub privacy_display: PrivacyDisplay,
    pub contact_methods: Vec<String>,
    pub preferred_contact_time: Option<String>,
    pub is_primary: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a validated address.
#[derive(Debug, Clone)]
pub struct CreateUserAddress {
    pub id: EntityId,
    pub user_id: UserId,
    pub address: NewAddress,
    pub is_primary: bool,
}
