//! Item service layer - Business logic for the item registry

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::item::{Item, ItemScope, NewItem, UpdateItem};
use crate::middleware::auth::AuthenticatedUser;

/// Item service for managing the item registry
pub struct ItemService {
    db_pool: PgPool,
}

impl ItemService {
    /// Create a new item service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// List a new item. Items start out available.
    pub async fn create_item(&self, owner: &AuthenticatedUser, new_item: NewItem) -> ApiResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (id, name, category, description, deposit_cents, available, scope, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, true, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_item.name)
        .bind(&new_item.category)
        .bind(&new_item.description)
        .bind(new_item.deposit_cents)
        .bind(new_item.scope.unwrap_or(ItemScope::Public))
        .bind(owner.user_id)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(item)
    }

    /// Get a single item. Private items are only visible to their owner;
    /// anyone else gets the same NotFound as for a missing id.
    pub async fn get_item(&self, id: Uuid, actor: &AuthenticatedUser) -> ApiResult<Item> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Item {} not found", id)))?;

        if item.scope == ItemScope::Private && item.owner_id != actor.user_id && !actor.is_admin() {
            return Err(ApiError::NotFound(format!("Item {} not found", id)));
        }

        Ok(item)
    }

    /// List the caller's own items, newest first
    pub async fn list_items(&self, owner: &AuthenticatedUser) -> ApiResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner.user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(items)
    }

    /// Update an item. The availability flag is owned by the loan lifecycle
    /// while a loan is live, so direct edits to it are rejected then.
    pub async fn update_item(
        &self,
        id: Uuid,
        actor: &AuthenticatedUser,
        patch: UpdateItem,
    ) -> ApiResult<Item> {
        let item = self.get_item(id, actor).await?;

        if item.owner_id != actor.user_id && !actor.is_admin() {
            return Err(ApiError::Unauthorized(
                "You are not authorized to update this item".to_string(),
            ));
        }

        if let Some(available) = patch.available {
            if available != item.available && self.has_active_loan(id).await? {
                return Err(ApiError::Conflict(
                    "Item availability is managed by its active loan".to_string(),
                ));
            }
        }

        let updated = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($1, name),
                category = COALESCE($2, category),
                description = COALESCE($3, description),
                deposit_cents = COALESCE($4, deposit_cents),
                available = COALESCE($5, available),
                scope = COALESCE($6, scope),
                updated_at = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(patch.name)
        .bind(patch.category)
        .bind(patch.description)
        .bind(patch.deposit_cents)
        .bind(patch.available)
        .bind(patch.scope)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(updated)
    }

    /// Remove an item from the registry. Rejected while any live loan still
    /// references it.
    pub async fn delete_item(&self, id: Uuid, actor: &AuthenticatedUser) -> ApiResult<()> {
        let item = self.get_item(id, actor).await?;

        if item.owner_id != actor.user_id && !actor.is_admin() {
            return Err(ApiError::Unauthorized(
                "You are not authorized to delete this item".to_string(),
            ));
        }

        if self.has_active_loan(id).await? {
            return Err(ApiError::Conflict(
                "Item cannot be deleted while a loan is in progress".to_string(),
            ));
        }

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }

    /// Whether a non-terminal loan currently references the item
    pub async fn has_active_loan(&self, item_id: Uuid) -> ApiResult<bool> {
        let exists = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE item_id = $1 AND status IN ('pending', 'in_progress', 'in_completion')
            )
            "#,
        )
        .bind(item_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(exists.0)
    }
}
