//! Repository for the `user_addresses` table.
//!
//! The "at most one primary per user" rule is backed by the partial unique
//! index `uq_user_addresses_primary`; every write that sets a primary first
//! clears the old one inside the same transaction.

use hearth_core::types::{EntityId, UserId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::address::{CreateUserAddress, UserAddress};

/// Column list for `user_addresses` queries.
const COLUMNS: &str = "id, user_id, address, address_ext, city, state, zip_code, \
     privacy_display, contact_methods, preferred_contact_time, is_primary, \
     created_at, updated_at";

pub struct AddressRepo;

impl AddressRepo {
    /// A user's addresses, primary first then oldest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<UserAddress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_addresses \
             WHERE user_id = $1 \
             ORDER BY is_primary DESC, created_at ASC"
        );
        sqlx::query_as::<_, UserAddress>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find an address only if it belongs to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: UserId,
        id: EntityId,
    ) -> Result<Option<UserAddress>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_addresses WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, UserAddress>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_primary(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Option<UserAddress>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM user_addresses WHERE user_id = $1 AND is_primary");
        sqlx::query_as::<_, UserAddress>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_by_user(pool: &PgPool, user_id: UserId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_addresses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Insert an address. When it is primary, any previous primary is
    /// cleared in the same transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateUserAddress,
    ) -> Result<UserAddress, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if input.is_primary {
            Self::clear_primary(&mut tx, input.user_id).await?;
        }

        let query = format!(
            "INSERT INTO user_addresses \
                (id, user_id, address, address_ext, city, state, zip_code, \
                 privacy_display, contact_methods, preferred_contact_time, is_primary) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        let address = &input.address;
        let row = sqlx::query_as::<_, UserAddress>(&query)
            .bind(input.id)
            .bind(input.user_id)
            .bind(&address.address)
            .bind(&address.address_ext)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.zip_code)
            .bind(address.privacy_display.as_str())
            .bind(&address.contact_methods)
            .bind(&address.preferred_contact_time)
            .bind(input.is_primary)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Make `address_id` the user's only primary address.
    ///
    /// Returns `None` (and changes nothing) if the address does not belong
    /// to the user.
    pub async fn set_primary(
        pool: &PgPool,
        user_id: UserId,
        address_id: EntityId,
    ) -> Result<Option<UserAddress>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        Self::clear_primary(&mut tx, user_id).await?;

        let query = format!(
            "UPDATE user_addresses SET is_primary = true, updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserAddress>(&query)
            .bind(address_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        match row {
            Some(row) => {
                tx.commit().await?;
                Ok(Some(row))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    /// Delete one of the user's addresses. Needs pointing at it lose their
    /// selection through `ON DELETE SET NULL`.
    pub async fn delete(pool: &PgPool, user_id: UserId, id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_primary(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE user_addresses SET is_primary = false, updated_at = now() \
             WHERE user_id = $1 AND is_primary",
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
