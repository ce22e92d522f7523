//! Loan lifecycle consistency tests
//!
//! End-to-end checks of the request/loan engines against a real database:
//! accept atomicity, sibling rejection, availability locking, the
//! housekeeping sweeps, and the refund guard.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlx::PgPool;
    use uuid::Uuid;

    use lendhub_server::db;
    use lendhub_server::error::ApiError;
    use lendhub_server::item::{ItemService, NewItem, UpdateItem};
    use lendhub_server::loan::{LoanService, LoanStatus};
    use lendhub_server::middleware::auth::AuthenticatedUser;
    use lendhub_server::models::UserRole;
    use lendhub_server::notification::NotificationService;
    use lendhub_server::payment::PaymentService;
    use lendhub_server::request::{LoanRequestService, LoanRequestStatus, NewLoanRequest};

    /// Helper to create a test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/lendhub_test".to_string());

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn services(pool: &PgPool) -> (ItemService, LoanRequestService, LoanService) {
        // Both external endpoints point at a closed port so any attempted
        // call fails fast instead of leaving the test hanging.
        let payments = Arc::new(PaymentService::new(
            "http://127.0.0.1:9".to_string(),
            "sk_test_unused".to_string(),
        ));
        let notifications = Arc::new(NotificationService::new(
            pool.clone(),
            "http://127.0.0.1:9".to_string(),
        ));

        (
            ItemService::new(pool.clone()),
            LoanRequestService::new(pool.clone()),
            LoanService::new(pool.clone(), payments, notifications),
        )
    }

    async fn seed_user(pool: &PgPool) -> AuthenticatedUser {
        let id = Uuid::new_v4();
        let username = format!("user-{}", id);

        sqlx::query("INSERT INTO users (id, username) VALUES ($1, $2)")
            .bind(id)
            .bind(&username)
            .execute(pool)
            .await
            .expect("Failed to seed user");

        AuthenticatedUser {
            user_id: id,
            username,
            role: UserRole::User,
        }
    }

    fn new_item() -> NewItem {
        NewItem {
            name: "Cordless drill".to_string(),
            category: "tools".to_string(),
            description: "18V with two batteries".to_string(),
            deposit_cents: Some(2_000),
            scope: None,
        }
    }

    fn request_for(item_id: Uuid) -> NewLoanRequest {
        let now = chrono::Utc::now();
        NewLoanRequest {
            item_id,
            date_start: now,
            date_end: now + chrono::Duration::days(7),
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_accept_is_atomic_and_rejects_siblings() {
        let pool = setup_test_db().await;
        let (items, requests, _loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower_a = seed_user(&pool).await;
        let borrower_b = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        assert!(item.available);

        let r1 = requests
            .submit(&borrower_a, request_for(item.id))
            .await
            .unwrap();
        let r2 = requests
            .submit(&borrower_b, request_for(item.id))
            .await
            .unwrap();

        let loan = requests.accept(r1.id, &owner).await.unwrap();
        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.borrower_id, borrower_a.user_id);

        // Exactly one loan references the item
        let (loan_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM loans WHERE item_id = $1")
                .bind(item.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(loan_count, 1);

        // The item is locked
        let (available,): (bool,) = sqlx::query_as("SELECT available FROM items WHERE id = $1")
            .bind(item.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!available);

        // The sibling request lost automatically
        let (r2_status,): (LoanRequestStatus,) =
            sqlx::query_as("SELECT status FROM loan_requests WHERE id = $1")
                .bind(r2.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(r2_status, LoanRequestStatus::Rejected);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_second_accept_observes_terminal_state() {
        let pool = setup_test_db().await;
        let (items, requests, _loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        let request = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();

        requests.accept(request.id, &owner).await.unwrap();

        let second = requests.accept(request.id, &owner).await;
        assert!(matches!(second, Err(ApiError::Conflict(_))));

        // Still exactly one loan
        let (loan_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM loans WHERE item_id = $1")
                .bind(item.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(loan_count, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_accepts_only_one_wins() {
        let pool = setup_test_db().await;
        let (items, requests, _loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        let request = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();

        let (first, second) = tokio::join!(
            requests.accept(request.id, &owner),
            requests.accept(request.id, &owner),
        );

        // The row lock serializes the two attempts; exactly one commits.
        let wins = first.is_ok() as u8 + second.is_ok() as u8;
        assert_eq!(wins, 1);

        let (loan_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM loans WHERE item_id = $1")
                .bind(item.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(loan_count, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_accept_by_non_lender_is_not_found() {
        let pool = setup_test_db().await;
        let (items, requests, _loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        let request = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();

        let result = requests.accept(request.id, &borrower).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_duplicate_and_self_requests_are_rejected() {
        let pool = setup_test_db().await;
        let (items, requests, _loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();

        requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();

        let duplicate = requests.submit(&borrower, request_for(item.id)).await;
        assert!(matches!(duplicate, Err(ApiError::Conflict(_))));

        let self_loan = requests.submit(&owner, request_for(item.id)).await;
        assert!(matches!(self_loan, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_stale_request_sweep_is_idempotent() {
        let pool = setup_test_db().await;
        let (items, requests, _loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;
        let other_borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();

        let stale = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();
        let fresh = requests
            .submit(&other_borrower, request_for(item.id))
            .await
            .unwrap();

        sqlx::query(
            "UPDATE loan_requests SET created_at = now() - interval '25 hours' WHERE id = $1",
        )
        .bind(stale.id)
        .execute(&pool)
        .await
        .unwrap();

        let swept = requests.auto_reject_stale().await.unwrap();
        assert!(swept.contains(&stale.id));
        assert!(!swept.contains(&fresh.id));

        let (status,): (LoanRequestStatus,) =
            sqlx::query_as("SELECT status FROM loan_requests WHERE id = $1")
                .bind(stale.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, LoanRequestStatus::AutoRejected);

        // Second run finds nothing new for this request
        let swept_again = requests.auto_reject_stale().await.unwrap();
        assert!(!swept_again.contains(&stale.id));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_overdue_loan_sweep() {
        let pool = setup_test_db().await;
        let (items, requests, loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        let request = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();
        let loan = requests.accept(request.id, &owner).await.unwrap();

        loans
            .validate(loan.id, "pi_test_123", &borrower)
            .await
            .unwrap();

        sqlx::query("UPDATE loans SET date_end = now() - interval '25 hours' WHERE id = $1")
            .bind(loan.id)
            .execute(&pool)
            .await
            .unwrap();

        let swept = loans.auto_complete_overdue().await.unwrap();
        assert!(swept.contains(&loan.id));

        let (status,): (LoanStatus,) = sqlx::query_as("SELECT status FROM loans WHERE id = $1")
            .bind(loan.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, LoanStatus::InCompletion);

        // Already-swept loans no longer match the filter
        let swept_again = loans.auto_complete_overdue().await.unwrap();
        assert!(!swept_again.contains(&loan.id));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_refund_failure_does_not_undo_completion() {
        let pool = setup_test_db().await;
        let (items, requests, loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        let request = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();
        let loan = requests.accept(request.id, &owner).await.unwrap();

        loans
            .validate(loan.id, "pi_test_123", &borrower)
            .await
            .unwrap();
        loans.mark_in_completion(loan.id, &borrower).await.unwrap();

        // The processor endpoint is unreachable, so the refund call fails --
        // but the completion itself must already be committed.
        let result = loans.complete(loan.id, 4.5, None, &owner).await;
        assert!(matches!(result, Err(ApiError::Processor(_))));

        let (status, refund): (LoanStatus, bool) =
            sqlx::query_as::<_, (LoanStatus, bool)>(
                "SELECT status, refund FROM loans WHERE id = $1",
            )
            .bind(loan.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, LoanStatus::Completed);
        assert!(!refund);

        // The lender's review was part of the committed transaction
        let (review_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE author_id = $1 AND recipient_id = $2")
                .bind(owner.user_id)
                .bind(borrower.user_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(review_count, 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_round_trip_with_idempotent_archive() {
        let pool = setup_test_db().await;
        let (items, requests, loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        let request = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();
        let loan = requests.accept(request.id, &owner).await.unwrap();

        loans
            .validate(loan.id, "pi_test_123", &borrower)
            .await
            .unwrap();
        loans.mark_in_completion(loan.id, &borrower).await.unwrap();

        // Clear the payment reference so completion does not reach for the
        // (unreachable) processor in this test.
        sqlx::query("UPDATE loans SET payment_id = NULL WHERE id = $1")
            .bind(loan.id)
            .execute(&pool)
            .await
            .unwrap();

        let completed = loans.complete(loan.id, 5.0, Some("All good".to_string()), &owner).await.unwrap();
        assert_eq!(completed.status, LoanStatus::Completed);
        assert!(completed.lender_review);
        assert!(!completed.refund);

        // Completing twice is rejected by the transition table
        let again = loans.complete(loan.id, 5.0, None, &owner).await;
        assert!(matches!(again, Err(ApiError::Conflict(_))));

        // The borrower reviews the lender
        let reviewed = loans
            .submit_borrower_review(loan.id, 4.0, None, &borrower)
            .await
            .unwrap();
        assert!(reviewed.borrower_review);

        // Archiving is idempotent
        let archived = loans.archive(loan.id, &borrower).await.unwrap();
        assert!(archived.archived);
        let archived_again = loans.archive(loan.id, &borrower).await.unwrap();
        assert!(archived_again.archived);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_item_availability_is_loan_managed() {
        let pool = setup_test_db().await;
        let (items, requests, _loans) = services(&pool);

        let owner = seed_user(&pool).await;
        let borrower = seed_user(&pool).await;

        let item = items.create_item(&owner, new_item()).await.unwrap();
        let request = requests
            .submit(&borrower, request_for(item.id))
            .await
            .unwrap();
        requests.accept(request.id, &owner).await.unwrap();

        // The owner cannot hand the flag back while the loan is live
        let patch = UpdateItem {
            name: None,
            category: None,
            description: None,
            deposit_cents: None,
            available: Some(true),
            scope: None,
        };
        let result = items.update_item(item.id, &owner, patch).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));

        // Deleting the item is blocked too
        let result = items.delete_item(item.id, &owner).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }
}
