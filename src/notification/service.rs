//! Push notification service layer
//!
//! Manages device tokens and dispatches messages through the push gateway.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::notification::{PushMessage, PushToken};

/// The gateway accepts at most this many messages per call.
const PUSH_CHUNK_SIZE: usize = 100;

/// Errors from notification operations
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Push gateway unreachable: {0}")]
    Gateway(#[from] reqwest::Error),

    #[error("Push gateway rejected the batch ({status})")]
    Rejected { status: u16 },
}

/// Notification service
pub struct NotificationService {
    db_pool: PgPool,
    http: reqwest::Client,
    gateway_url: String,
}

impl NotificationService {
    /// Create a new notification service instance
    pub fn new(db_pool: PgPool, gateway_url: String) -> Self {
        Self {
            db_pool,
            http: reqwest::Client::new(),
            gateway_url,
        }
    }

    /// Register a device token for a user. Re-registering the same token is
    /// a no-op returning the existing row.
    pub async fn register_token(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<PushToken, NotificationError> {
        let existing = sqlx::query_as::<_, PushToken>(
            "SELECT * FROM push_tokens WHERE user_id = $1 AND token = $2",
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some(existing) = existing {
            return Ok(existing);
        }

        let created = sqlx::query_as::<_, PushToken>(
            r#"
            INSERT INTO push_tokens (user_id, token, created_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(created)
    }

    /// Remove a device token for a user
    pub async fn remove_token(&self, user_id: Uuid, token: &str) -> Result<(), NotificationError> {
        sqlx::query("DELETE FROM push_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }

    /// All registered tokens for a user
    pub async fn tokens_for_user(&self, user_id: Uuid) -> Result<Vec<String>, NotificationError> {
        let tokens = sqlx::query_as::<_, (String,)>(
            "SELECT token FROM push_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(tokens.into_iter().map(|(token,)| token).collect())
    }

    /// Send a push message to a set of device tokens. Invalid tokens are
    /// skipped with a warning; an empty batch is not an error.
    pub async fn send_push(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let messages = build_messages(tokens, title, body);

        if messages.is_empty() {
            tracing::warn!("No valid device tokens, nothing to send");
            return Ok(());
        }

        for chunk in messages.chunks(PUSH_CHUNK_SIZE) {
            let response = self
                .http
                .post(&self.gateway_url)
                .json(&chunk)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(NotificationError::Rejected {
                    status: status.as_u16(),
                });
            }

            tracing::debug!(count = chunk.len(), "Push batch delivered");
        }

        Ok(())
    }

    /// Look up a user's tokens and push to all of them
    pub async fn send_to_user(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let tokens = self.tokens_for_user(user_id).await?;
        self.send_push(&tokens, title, body).await
    }
}

/// Build gateway messages, dropping tokens the gateway would reject
pub fn build_messages(tokens: &[String], title: &str, body: &str) -> Vec<PushMessage> {
    tokens
        .iter()
        .filter(|token| {
            if is_push_token(token) {
                true
            } else {
                tracing::warn!(token = %token, "Skipping invalid push token");
                false
            }
        })
        .map(|token| PushMessage {
            to: token.clone(),
            sound: "default".to_string(),
            title: title.to_string(),
            body: body.to_string(),
        })
        .collect()
}

fn is_push_token(token: &str) -> bool {
    (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
        && token.ends_with(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_push_token() {
        assert!(is_push_token("ExponentPushToken[abc123]"));
        assert!(is_push_token("ExpoPushToken[abc123]"));
        assert!(!is_push_token("abc123"));
        assert!(!is_push_token("ExponentPushToken[unterminated"));
    }

    #[test]
    fn test_build_messages_skips_invalid_tokens() {
        let tokens = vec![
            "ExponentPushToken[valid]".to_string(),
            "garbage".to_string(),
            "ExpoPushToken[also-valid]".to_string(),
        ];

        let messages = build_messages(&tokens, "Title", "Body");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].to, "ExponentPushToken[valid]");
        assert_eq!(messages[1].to, "ExpoPushToken[also-valid]");
        assert!(messages.iter().all(|m| m.sound == "default"));
    }

    #[test]
    fn test_build_messages_empty_when_all_invalid() {
        let tokens = vec!["nope".to_string()];
        assert!(build_messages(&tokens, "Title", "Body").is_empty());
    }
}
