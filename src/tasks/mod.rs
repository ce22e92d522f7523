//! Scheduled housekeeping
//!
//! Two time-driven sweeps: an hourly pass that auto-rejects stale pending
//! requests and a daily pass that moves overdue loans to IN_COMPLETION and
//! reminds both parties. Both go through the same public service operations
//! a regular caller would use.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::loan::LoanService;
use crate::request::LoanRequestService;

/// Housekeeper over the public engine operations
#[derive(Clone)]
pub struct Housekeeper {
    requests: Arc<LoanRequestService>,
    loans: Arc<LoanService>,
}

impl Housekeeper {
    /// Create a new housekeeper instance
    pub fn new(requests: Arc<LoanRequestService>, loans: Arc<LoanService>) -> Self {
        Self { requests, loans }
    }

    /// Hourly sweep: pending requests older than the staleness cutoff are
    /// auto-rejected
    pub async fn auto_reject_stale_requests(&self) {
        match self.requests.auto_reject_stale().await {
            Ok(ids) if ids.is_empty() => tracing::debug!("No stale loan requests"),
            Ok(ids) => tracing::info!(count = ids.len(), "Auto-rejected stale loan requests"),
            Err(e) => tracing::error!(error = %e, "Stale request sweep failed"),
        }
    }

    /// Daily sweep: overdue in-progress loans move to IN_COMPLETION and both
    /// parties get a return reminder
    pub async fn auto_complete_overdue_loans(&self) {
        match self.loans.auto_complete_overdue().await {
            Ok(ids) if ids.is_empty() => tracing::debug!("No overdue loans"),
            Ok(ids) => tracing::info!(count = ids.len(), "Moved overdue loans to completion"),
            Err(e) => tracing::error!(error = %e, "Overdue loan sweep failed"),
        }
    }
}

/// Start the cron scheduler with the hourly and daily sweeps
pub async fn start_scheduler(housekeeper: Housekeeper) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let hourly = housekeeper.clone();
    scheduler
        .add(Job::new_async("0 0 * * * *", move |_id, _sched| {
            let housekeeper = hourly.clone();
            Box::pin(async move {
                housekeeper.auto_reject_stale_requests().await;
            })
        })?)
        .await?;

    let daily = housekeeper;
    scheduler
        .add(Job::new_async("0 0 0 * * *", move |_id, _sched| {
            let housekeeper = daily.clone();
            Box::pin(async move {
                housekeeper.auto_complete_overdue_loans().await;
            })
        })?)
        .await?;

    scheduler.start().await?;
    tracing::info!("Housekeeping scheduler started (hourly request sweep, daily loan sweep)");

    Ok(scheduler)
}
