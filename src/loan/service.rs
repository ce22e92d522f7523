//! Loan service layer
//!
//! Business logic for the loan lifecycle: payment validation, cancellation,
//! return, completion with reviews and refund, archival, and the overdue
//! sweep. All status changes are validated through the central transition
//! table in [`LoanStatus`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::loan::{Loan, LoanStatus};
use crate::middleware::auth::AuthenticatedUser;
use crate::notification::NotificationService;
use crate::payment::PaymentService;

/// In-progress loans whose end date is older than this are swept to
/// IN_COMPLETION.
pub const OVERDUE_GRACE_HOURS: i64 = 24;

/// Loan service for managing the loan lifecycle
pub struct LoanService {
    db_pool: PgPool,
    payments: Arc<PaymentService>,
    notifications: Arc<NotificationService>,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(
        db_pool: PgPool,
        payments: Arc<PaymentService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_pool,
            payments,
            notifications,
        }
    }

    /// Get a single loan. Participants and admins only.
    pub async fn get(&self, id: i64, actor: &AuthenticatedUser) -> ApiResult<Loan> {
        let loan = self.load(id).await?;

        if loan.lender_id != actor.user_id
            && loan.borrower_id != actor.user_id
            && !actor.is_admin()
        {
            return Err(ApiError::Unauthorized(
                "You are not authorized to view this loan".to_string(),
            ));
        }

        Ok(loan)
    }

    /// Non-archived loans where the caller is the lender (admins see all)
    pub async fn list_loans(
        &self,
        actor: &AuthenticatedUser,
        status: Option<LoanStatus>,
    ) -> ApiResult<Vec<Loan>> {
        self.list(actor, "lender_id", false, status).await
    }

    /// Non-archived loans where the caller is the borrower (admins see all)
    pub async fn list_borrows(
        &self,
        actor: &AuthenticatedUser,
        status: Option<LoanStatus>,
    ) -> ApiResult<Vec<Loan>> {
        self.list(actor, "borrower_id", false, status).await
    }

    /// Archived loans where the caller is the lender (admins see all)
    pub async fn list_archived(
        &self,
        actor: &AuthenticatedUser,
        status: Option<LoanStatus>,
    ) -> ApiResult<Vec<Loan>> {
        self.list(actor, "lender_id", true, status).await
    }

    async fn list(
        &self,
        actor: &AuthenticatedUser,
        actor_column: &'static str,
        archived: bool,
        status: Option<LoanStatus>,
    ) -> ApiResult<Vec<Loan>> {
        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("SELECT * FROM loans WHERE archived = ");
        query_builder.push_bind(archived);

        if !actor.is_admin() {
            query_builder.push(format!(" AND {} = ", actor_column));
            query_builder.push_bind(actor.user_id);
        }
        if let Some(status) = status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }

        query_builder.push(" ORDER BY created_at DESC");

        let loans = query_builder
            .build_query_as::<Loan>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(loans)
    }

    /// Record the payment reference and move the loan to IN_PROGRESS.
    /// Borrower only; capture itself already happened on the processor side.
    pub async fn validate(
        &self,
        id: i64,
        payment_id: &str,
        actor: &AuthenticatedUser,
    ) -> ApiResult<Loan> {
        let loan = self.load(id).await?;
        Self::ensure_borrower(&loan, actor)?;
        Self::check_transition(&loan, LoanStatus::InProgress)?;

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = 'in_progress', payment_id = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(updated)
    }

    /// Cancel a loan. Borrower only. Item availability and payment are left
    /// untouched.
    pub async fn cancel(&self, id: i64, actor: &AuthenticatedUser) -> ApiResult<Loan> {
        let loan = self.load(id).await?;
        Self::ensure_borrower(&loan, actor)?;
        Self::check_transition(&loan, LoanStatus::Canceled)?;

        let updated = self.set_status(id, LoanStatus::Canceled).await?;

        Ok(updated)
    }

    /// Mark the return as initiated. Borrower only.
    pub async fn mark_in_completion(&self, id: i64, actor: &AuthenticatedUser) -> ApiResult<Loan> {
        let loan = self.load(id).await?;
        Self::ensure_borrower(&loan, actor)?;
        Self::check_transition(&loan, LoanStatus::InCompletion)?;

        let updated = self.set_status(id, LoanStatus::InCompletion).await?;

        Ok(updated)
    }

    /// Complete a loan. Lender only. In one transaction the loan becomes
    /// COMPLETED and the lender's review of the borrower is recorded; the
    /// deposit refund runs after the commit and its failure surfaces without
    /// undoing the completion; the completion push to the borrower is
    /// best-effort.
    pub async fn complete(
        &self,
        id: i64,
        rating: f64,
        comment: Option<String>,
        actor: &AuthenticatedUser,
    ) -> ApiResult<Loan> {
        let loan = self.load(id).await?;
        Self::ensure_lender(&loan, actor)?;
        Self::check_transition(&loan, LoanStatus::Completed)?;

        let now = Utc::now();
        let mut tx = self.db_pool.begin().await?;

        // The status filter makes a concurrent second complete lose
        // deterministically instead of inserting a second review.
        let mut completed = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = 'completed', lender_review = true, updated_at = $1
            WHERE id = $2 AND status = 'in_completion'
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict(format!("Loan #{} is no longer awaiting completion", id))
        })?;

        sqlx::query(
            r#"
            INSERT INTO reviews (rating, comment, author_id, recipient_id, item_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rating)
        .bind(comment.unwrap_or_default())
        .bind(loan.lender_id)
        .bind(loan.borrower_id)
        .bind(loan.item_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if completed.refund_due() {
            if let Some(payment_id) = completed.payment_id.clone() {
                self.payments.refund(&payment_id).await?;

                completed = sqlx::query_as::<_, Loan>(
                    "UPDATE loans SET refund = true, updated_at = $1 WHERE id = $2 RETURNING *",
                )
                .bind(Utc::now())
                .bind(id)
                .fetch_one(&self.db_pool)
                .await?;
            }
        }

        let item_name = self.item_name(loan.item_id).await?;
        if let Err(e) = self
            .notifications
            .send_to_user(
                loan.borrower_id,
                "Loan completed",
                &format!(
                    "The loan for \"{}\" was completed successfully. Thanks for taking part!",
                    item_name
                ),
            )
            .await
        {
            tracing::warn!(loan_id = id, error = %e, "Completion notification failed");
        }

        Ok(completed)
    }

    /// Record the borrower's review of the lender. Borrower only.
    pub async fn submit_borrower_review(
        &self,
        id: i64,
        rating: f64,
        comment: Option<String>,
        actor: &AuthenticatedUser,
    ) -> ApiResult<Loan> {
        let loan = self.load(id).await?;
        Self::ensure_borrower(&loan, actor)?;

        let now = Utc::now();
        let mut tx = self.db_pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO reviews (rating, comment, author_id, recipient_id, item_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rating)
        .bind(comment.unwrap_or_default())
        .bind(loan.borrower_id)
        .bind(loan.lender_id)
        .bind(loan.item_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET borrower_review = true, updated_at = $1 WHERE id = $2 RETURNING *",
        )
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Archive a loan. Either participant or an admin; independent of
    /// status and idempotent.
    pub async fn archive(&self, id: i64, actor: &AuthenticatedUser) -> ApiResult<Loan> {
        let loan = self.load(id).await?;

        if loan.lender_id != actor.user_id
            && loan.borrower_id != actor.user_id
            && !actor.is_admin()
        {
            return Err(ApiError::Unauthorized(
                "You are not authorized to archive this loan".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET archived = true, updated_at = $1 WHERE id = $2 RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(updated)
    }

    /// Sweep in-progress loans past their end date to IN_COMPLETION and
    /// remind both parties to arrange the return. Notification failures are
    /// logged per loan and do not abort the batch.
    pub async fn auto_complete_overdue(&self) -> ApiResult<Vec<i64>> {
        let cutoff = Utc::now() - Duration::hours(OVERDUE_GRACE_HOURS);

        let overdue = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = 'in_completion', updated_at = $1
            WHERE status = 'in_progress' AND date_end < $2
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(cutoff)
        .fetch_all(&self.db_pool)
        .await?;

        for loan in &overdue {
            let item_name = match self.item_name(loan.item_id).await {
                Ok(name) => name,
                Err(e) => {
                    tracing::error!(loan_id = loan.id, error = %e, "Overdue reminder skipped");
                    continue;
                }
            };

            if let Err(e) = self
                .notifications
                .send_to_user(
                    loan.lender_id,
                    "Loan ended",
                    &format!(
                        "The loan of \"{}\" has ended. Arrange a meeting for the return",
                        item_name
                    ),
                )
                .await
            {
                tracing::error!(loan_id = loan.id, error = %e, "Lender reminder failed");
            }

            if let Err(e) = self
                .notifications
                .send_to_user(
                    loan.borrower_id,
                    "Borrow ended",
                    &format!(
                        "Your borrow of \"{}\" has ended. Arrange a meeting for the return",
                        item_name
                    ),
                )
                .await
            {
                tracing::error!(loan_id = loan.id, error = %e, "Borrower reminder failed");
            }
        }

        Ok(overdue.into_iter().map(|loan| loan.id).collect())
    }

    // ===== Helpers =====

    async fn load(&self, id: i64) -> ApiResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan #{} not found", id)))
    }

    async fn set_status(&self, id: i64, status: LoanStatus) -> ApiResult<Loan> {
        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(updated)
    }

    async fn item_name(&self, item_id: Uuid) -> ApiResult<String> {
        let row = sqlx::query_as::<_, (String,)>("SELECT name FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(row.map(|(name,)| name).unwrap_or_default())
    }

    fn ensure_borrower(loan: &Loan, actor: &AuthenticatedUser) -> ApiResult<()> {
        if loan.borrower_id != actor.user_id {
            return Err(ApiError::Unauthorized(
                "Only the borrower can perform this action".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_lender(loan: &Loan, actor: &AuthenticatedUser) -> ApiResult<()> {
        if loan.lender_id != actor.user_id {
            return Err(ApiError::Unauthorized(
                "Only the lender can perform this action".to_string(),
            ));
        }
        Ok(())
    }

    fn check_transition(loan: &Loan, to: LoanStatus) -> ApiResult<()> {
        if !loan.status.can_transition(to) {
            return Err(ApiError::Conflict(format!(
                "Loan #{} cannot move from {:?} to {:?}",
                loan.id, loan.status, to
            )));
        }
        Ok(())
    }
}
