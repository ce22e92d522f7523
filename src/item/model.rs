//! Item models and data structures

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Visibility of an item. PUBLIC items are discoverable by anyone; PRIVATE
/// items only by the owner's circle.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "item_scope", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemScope {
    Public,
    Private,
}

/// Item model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: String,
    /// Deposit charged up front and refunded at loan completion, in cents
    pub deposit_cents: Option<i64>,
    pub available: bool,
    pub scope: ItemScope,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for listing a new item
#[derive(Debug, Deserialize, Validate)]
pub struct NewItem {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0))]
    pub deposit_cents: Option<i64>,
    pub scope: Option<ItemScope>,
}

/// Request DTO for updating an item. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItem {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub deposit_cents: Option<i64>,
    pub available: Option<bool>,
    pub scope: Option<ItemScope>,
}
