//! Loan request service layer
//!
//! Business logic for submitting, listing, and resolving loan requests.
//! Accepting a request is the one multi-entity write in the system and runs
//! in a single transaction with row locks on the request and its item.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::item::Item;
use crate::loan::Loan;
use crate::middleware::auth::AuthenticatedUser;
use crate::request::{LoanRequest, LoanRequestStatus, NewLoanRequest};

/// Pending requests older than this are swept to AUTO_REJECTED.
pub const STALE_REQUEST_AGE_HOURS: i64 = 24;

/// Loan request service
pub struct LoanRequestService {
    db_pool: PgPool,
}

impl LoanRequestService {
    /// Create a new loan request service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Submit a loan request for an item. The item owner is snapshotted as
    /// the lender.
    pub async fn submit(
        &self,
        requester: &AuthenticatedUser,
        new_request: NewLoanRequest,
    ) -> ApiResult<LoanRequest> {
        if new_request.date_start > new_request.date_end {
            return Err(ApiError::Validation(
                "Loan start date must not be after its end date".to_string(),
            ));
        }

        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(new_request.item_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Item {} not found", new_request.item_id)))?;

        if item.owner_id == requester.user_id {
            return Err(ApiError::Validation(
                "You cannot request a loan on your own item".to_string(),
            ));
        }

        let duplicate = sqlx::query_as::<_, (bool,)>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loan_requests
                WHERE requester_id = $1 AND item_id = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(requester.user_id)
        .bind(item.id)
        .fetch_one(&self.db_pool)
        .await?;

        if duplicate.0 {
            return Err(ApiError::Conflict(
                "You already have a pending request for this item".to_string(),
            ));
        }

        let request = sqlx::query_as::<_, LoanRequest>(
            r#"
            INSERT INTO loan_requests (requester_id, lender_id, item_id, date_start, date_end, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(requester.user_id)
        .bind(item.owner_id)
        .bind(item.id)
        .bind(new_request.date_start)
        .bind(new_request.date_end)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            // The partial unique index closes the race the EXISTS pre-check leaves open.
            sqlx::Error::Database(db) if db.constraint() == Some("idx_loan_requests_one_pending") => {
                ApiError::Conflict("You already have a pending request for this item".to_string())
            }
            _ => ApiError::from(e),
        })?;

        Ok(request)
    }

    /// Pending requests where the caller is the lender, newest first
    pub async fn list_received(&self, user: &AuthenticatedUser) -> ApiResult<Vec<LoanRequest>> {
        let requests = sqlx::query_as::<_, LoanRequest>(
            r#"
            SELECT * FROM loan_requests
            WHERE lender_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user.user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(requests)
    }

    /// Pending requests where the caller is the requester, newest first
    pub async fn list_sent(&self, user: &AuthenticatedUser) -> ApiResult<Vec<LoanRequest>> {
        let requests = sqlx::query_as::<_, LoanRequest>(
            r#"
            SELECT * FROM loan_requests
            WHERE requester_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user.user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(requests)
    }

    /// Accept a request. In one atomic unit: the request becomes APPROVED, a
    /// loan is created, the item becomes unavailable, and every other live
    /// request for the same item is rejected. A concurrent accept on the
    /// same request serializes on the row lock and fails the must-be-PENDING
    /// check after the first one commits.
    pub async fn accept(&self, request_id: i64, actor: &AuthenticatedUser) -> ApiResult<Loan> {
        let mut tx = self.db_pool.begin().await?;

        let request = sqlx::query_as::<_, LoanRequest>(
            "SELECT * FROM loan_requests WHERE id = $1 AND lender_id = $2 FOR UPDATE",
        )
        .bind(request_id)
        .bind(actor.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Request #{} not found", request_id)))?;

        if request.status != LoanRequestStatus::Pending {
            return Err(ApiError::Conflict(format!(
                "Request #{} is no longer pending",
                request_id
            )));
        }

        // The item row is locked too so the availability flip and the
        // sibling rejection can't interleave with another accept.
        sqlx::query("SELECT id FROM items WHERE id = $1 FOR UPDATE")
            .bind(request.item_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE loan_requests SET status = 'approved' WHERE id = $1")
            .bind(request_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (item_id, lender_id, borrower_id, date_start, date_end, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(request.item_id)
        .bind(request.lender_id)
        .bind(request.requester_id)
        .bind(request.date_start)
        .bind(request.date_end)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE items SET available = false, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(request.item_id)
            .execute(&mut *tx)
            .await?;

        // Competing requests for the same item lose automatically.
        sqlx::query(
            r#"
            UPDATE loan_requests SET status = 'rejected'
            WHERE item_id = $1 AND id <> $2 AND status = 'pending'
            "#,
        )
        .bind(request.item_id)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Reject a request. Lender only.
    pub async fn reject(&self, request_id: i64, actor: &AuthenticatedUser) -> ApiResult<LoanRequest> {
        self.resolve(request_id, actor.user_id, "lender_id").await
    }

    /// Cancel a sent request. Requester only. Cancellation lands in the same
    /// REJECTED terminal state as a lender rejection.
    pub async fn cancel(&self, request_id: i64, actor: &AuthenticatedUser) -> ApiResult<LoanRequest> {
        self.resolve(request_id, actor.user_id, "requester_id").await
    }

    async fn resolve(
        &self,
        request_id: i64,
        actor_id: Uuid,
        actor_column: &'static str,
    ) -> ApiResult<LoanRequest> {
        let sql = format!(
            "SELECT * FROM loan_requests WHERE id = $1 AND {} = $2",
            actor_column
        );
        let request = sqlx::query_as::<_, LoanRequest>(&sql)
            .bind(request_id)
            .bind(actor_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Request #{} not found", request_id)))?;

        if request.status.is_terminal() {
            return Err(ApiError::Conflict(format!(
                "Request #{} is no longer pending",
                request_id
            )));
        }

        let updated = sqlx::query_as::<_, LoanRequest>(
            "UPDATE loan_requests SET status = 'rejected' WHERE id = $1 RETURNING *",
        )
        .bind(request_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(updated)
    }

    /// Sweep pending requests older than the staleness cutoff to
    /// AUTO_REJECTED. Idempotent: swept rows no longer match the filter.
    pub async fn auto_reject_stale(&self) -> ApiResult<Vec<i64>> {
        let cutoff = Utc::now() - Duration::hours(STALE_REQUEST_AGE_HOURS);

        let rejected = sqlx::query_as::<_, (i64,)>(
            r#"
            UPDATE loan_requests SET status = 'auto_rejected'
            WHERE status = 'pending' AND created_at < $1
            RETURNING id
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rejected.into_iter().map(|(id,)| id).collect())
    }
}
