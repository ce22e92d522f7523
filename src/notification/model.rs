//! Push notification models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Registered device token for a user
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct PushToken {
    pub id: i64,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for registering or removing a device token
#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub token: String,
}

/// Message in the push gateway's wire format
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
}
