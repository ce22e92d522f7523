//! Loan models and state machine

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Loan status. Transitions are validated in one place
/// ([`LoanStatus::can_transition`]); every mutating operation goes through
/// it rather than re-checking ad hoc.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Created from an accepted request, awaiting payment validation
    Pending,
    /// Payment recorded, item with the borrower
    InProgress,
    /// Return initiated, awaiting lender confirmation
    InCompletion,
    Completed,
    Canceled,
}

impl LoanStatus {
    /// Whether a transition from `self` to `to` is legal. The machine is
    /// monotonic: PENDING → IN_PROGRESS → IN_COMPLETION → COMPLETED, with
    /// CANCELED as a terminal side branch out of the first two states.
    pub fn can_transition(self, to: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, to),
            (Pending, InProgress)
                | (InProgress, InCompletion)
                | (InCompletion, Completed)
                | (Pending, Canceled)
                | (InProgress, Canceled)
        )
    }

    /// Terminal states admit no further transition
    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Canceled)
    }

    /// A loan in a non-terminal state keeps its item unavailable
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// Loan model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: i64,
    pub item_id: Uuid,
    pub lender_id: Uuid,
    pub borrower_id: Uuid,
    pub status: LoanStatus,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    /// Set when the lender has left a review for the borrower
    pub lender_review: bool,
    /// Set when the borrower has left a review for the lender
    pub borrower_review: bool,
    /// Archival is orthogonal to status and settable by either party
    pub archived: bool,
    /// External payment reference, recorded at validation time
    pub payment_id: Option<String>,
    /// Whether the deposit has been refunded
    pub refund: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Whether completing this loan should trigger a refund. The deposit is
    /// charged up front and given back exactly once, on successful return.
    pub fn refund_due(&self) -> bool {
        self.payment_id.is_some() && !self.refund
    }
}

/// Review left by one loan party about the other
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: i64,
    pub rating: f64,
    pub comment: String,
    pub author_id: Uuid,
    pub recipient_id: Uuid,
    pub item_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for validating a loan after payment
#[derive(Debug, Deserialize)]
pub struct ValidateLoanBody {
    pub payment_id: String,
}

/// Query parameters for listing loans
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    pub status: Option<LoanStatus>,
}

/// Request DTO carrying a review rating and optional comment
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewBody {
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoanStatus::*;

    const ALL: [LoanStatus; 5] = [Pending, InProgress, InCompletion, Completed, Canceled];

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition(InProgress));
        assert!(InProgress.can_transition(InCompletion));
        assert!(InCompletion.can_transition(Completed));
    }

    #[test]
    fn test_cancel_branch() {
        assert!(Pending.can_transition(Canceled));
        assert!(InProgress.can_transition(Canceled));
        // Once the return is underway cancellation is no longer possible
        assert!(!InCompletion.can_transition(Canceled));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!InProgress.can_transition(Pending));
        assert!(!InCompletion.can_transition(InProgress));
        assert!(!Completed.can_transition(InCompletion));
    }

    #[test]
    fn test_terminal_states_are_dead_ends() {
        for from in [Completed, Canceled] {
            for to in ALL {
                assert!(!from.can_transition(to), "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in ALL {
            assert!(!status.can_transition(status), "{:?}", status);
        }
    }

    #[test]
    fn test_active_states() {
        assert!(Pending.is_active());
        assert!(InProgress.is_active());
        assert!(InCompletion.is_active());
        assert!(!Completed.is_active());
        assert!(!Canceled.is_active());
    }

    fn loan(payment_id: Option<&str>, refund: bool) -> Loan {
        let now = Utc::now();
        Loan {
            id: 1,
            item_id: Uuid::new_v4(),
            lender_id: Uuid::new_v4(),
            borrower_id: Uuid::new_v4(),
            status: InCompletion,
            date_start: now,
            date_end: now,
            lender_review: false,
            borrower_review: false,
            archived: false,
            payment_id: payment_id.map(String::from),
            refund,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_refund_due_only_once() {
        assert!(loan(Some("pi_123"), false).refund_due());
        assert!(!loan(Some("pi_123"), true).refund_due());
        assert!(!loan(None, false).refund_due());
    }
}
