//! Submission lifecycle of the bill form.
//!
//! A workflow goes `Idle -> Submitting -> Settled(outcome)` for every accepted
//! submit. Outcomes are plain state: nothing raised by the service or by the
//! draft rows escapes [`BillSubmissionWorkflow::submit`]. An approved bill
//! schedules the completion signal after the configured delay; tearing the
//! workflow down (or dropping it) before then keeps the signal from firing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use log::{error, info, warn};
use crate::desk::editor::DraftItemList;
use crate::desk::model::bill::{BillResponse, BillStatus, BillSubmissionRequest};
use crate::desk::model::config::ClientConfig;
use crate::desk::model::draft::{SubmissionPolicy, ValidationGap};
use crate::desk::model::UserId;
use crate::desk::scheduler::job::DelayedJobs;
use crate::desk::service::{BillService, CreateBillReply};

const CREATE_FAILED_MSG: &str = "Failed to create bill";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    Approved(BillResponse),
    Declined(BillResponse),
    Failed { message: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum WorkflowState {
    #[default]
    Idle,
    Submitting,
    Settled(Outcome),
}

/// Result of one call to `submit`
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubmitAttempt {
    Settled(Outcome),
    /// a submission was already in flight, nothing was sent
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WorkflowSettings {
    pub user_id: UserId,
    pub policy: SubmissionPolicy,
    pub approval_delay: Duration,
}

impl From<&ClientConfig> for WorkflowSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            user_id: config.user_id,
            policy: config.policy,
            approval_delay: config.approval_delay,
        }
    }
}

type CompletionSignal = Arc<dyn Fn() + Send + Sync>;

pub(crate) struct BillSubmissionWorkflow<S: BillService> {
    service: S,
    settings: WorkflowSettings,
    state: Mutex<WorkflowState>,
    on_complete: CompletionSignal,
    jobs: DelayedJobs,
}

/// The state lock is never held across an await, so it is always free to
/// take. A poisoned lock still holds a valid state.
fn lock(state: &Mutex<WorkflowState>) -> MutexGuard<'_, WorkflowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the workflow back to `Idle` if a submit future is dropped mid-flight.
struct InFlight<'a> {
    state: &'a Mutex<WorkflowState>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: Outcome) {
        *lock(self.state) = WorkflowState::Settled(outcome);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("submission abandoned before settling");
            *lock(self.state) = WorkflowState::Idle;
        }
    }
}

/// Payload for the given rows: items converted under `policy`, total by the
/// same rule as the running total.
pub(crate) fn build_request(
    user_id: UserId,
    items: &DraftItemList,
    policy: SubmissionPolicy,
) -> Result<BillSubmissionRequest, ValidationGap> {
    let bill_items = items
        .rows()
        .iter()
        .enumerate()
        .map(|(row, item)| item.to_bill_item(row, policy))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BillSubmissionRequest {
        user_id,
        items: bill_items,
        total_amount: items.total(),
    })
}

/// Map what the service said onto an outcome.
fn classify(reply: CreateBillReply) -> Outcome {
    match reply {
        CreateBillReply::Decided(response) => match response.status {
            BillStatus::Approved => Outcome::Approved(response),
            BillStatus::Declined => Outcome::Declined(response),
            BillStatus::Unknown => Outcome::Failed {
                message: non_empty_or_generic(response.response_message),
            },
        },
        CreateBillReply::Rejected { code, message } => {
            warn!("bill rejected with status {}", code);
            Outcome::Failed {
                message: non_empty_or_generic(message),
            }
        }
    }
}

fn non_empty_or_generic(message: Option<String>) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| CREATE_FAILED_MSG.to_string())
}

impl<S: BillService> BillSubmissionWorkflow<S> {
    pub fn new(service: S, settings: WorkflowSettings, on_complete: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            service,
            settings,
            state: Mutex::new(WorkflowState::Idle),
            on_complete: Arc::new(on_complete),
            jobs: DelayedJobs::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        lock(&self.state).clone()
    }

    /// Submit the rows as a new bill. Rejected while another submit is in
    /// flight, otherwise calls the service at most once and settles.
    pub async fn submit(&self, items: &DraftItemList) -> SubmitAttempt {
        {
            let mut state = lock(&self.state);
            if matches!(*state, WorkflowState::Submitting) {
                warn!("submit ignored, a submission is already in flight");
                return SubmitAttempt::Rejected;
            }
            *state = WorkflowState::Submitting;
        }
        let mut in_flight = InFlight {
            state: &self.state,
            settled: false,
        };
        info!(
            "submitting bill for user={} with {} rows",
            self.settings.user_id,
            items.len()
        );

        let outcome = match build_request(self.settings.user_id, items, self.settings.policy) {
            Ok(request) => match self.service.create_bill(&request).await {
                Ok(reply) => classify(reply),
                Err(e) => {
                    error!("create_bill got no response, {}", e);
                    Outcome::Failed {
                        message: non_empty_or_generic(Some(e.to_string())),
                    }
                }
            },
            Err(gap) => {
                warn!("bill not submitted, {}", gap);
                Outcome::Failed { message: gap.to_string() }
            }
        };

        in_flight.settle(outcome.clone());
        match &outcome {
            Outcome::Approved(response) => {
                info!("bill approved, id={:?}", response.id);
                self.signal_completion();
            }
            Outcome::Declined(response) => warn!("bill declined, {}", response.message()),
            Outcome::Failed { message } => warn!("bill submission failed, {}", message),
        }
        SubmitAttempt::Settled(outcome)
    }

    fn signal_completion(&self) {
        if self.jobs.is_cancelled() {
            info!("workflow torn down, completion signal not scheduled");
            return;
        }
        let on_complete = self.on_complete.clone();
        self.jobs
            .schedule("completion signal", self.settings.approval_delay, move || on_complete());
    }

    /// Drop a pending completion signal and wait for its task to finish.
    pub async fn teardown(&self) {
        info!("tearing down submission workflow");
        self.jobs.shutdown().await;
    }
}
