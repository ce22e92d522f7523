//! Loan request models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Loan request status. PENDING is the only live state; the three others are
/// terminal and a request enters exactly one of them, once.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_request_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanRequestStatus {
    Pending,
    Approved,
    Rejected,
    AutoRejected,
}

impl LoanRequestStatus {
    /// Terminal states admit no further transition
    pub fn is_terminal(self) -> bool {
        !matches!(self, LoanRequestStatus::Pending)
    }
}

/// Loan request model. The lender is a snapshot of the item's owner at
/// submission time.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LoanRequest {
    pub id: i64,
    pub requester_id: Uuid,
    pub lender_id: Uuid,
    pub item_id: Uuid,
    pub status: LoanRequestStatus,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for submitting a loan request
#[derive(Debug, Deserialize)]
pub struct NewLoanRequest {
    pub item_id: Uuid,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_live() {
        assert!(!LoanRequestStatus::Pending.is_terminal());
        assert!(LoanRequestStatus::Approved.is_terminal());
        assert!(LoanRequestStatus::Rejected.is_terminal());
        assert!(LoanRequestStatus::AutoRejected.is_terminal());
    }
}
