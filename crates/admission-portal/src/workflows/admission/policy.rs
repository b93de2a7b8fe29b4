//! Pipeline ordering and applicant guidance.
//!
//! The table here gates applicant self-service moves only. Admin overrides and
//! processor confirmations consult [`TransitionPolicy::permits`] for logging but
//! are not refused by it.

use super::domain::ApplicationStatus;

/// Explicit `from -> {to}` pipeline table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionPolicy;

impl TransitionPolicy {
    pub fn allowed_from(&self, from: ApplicationStatus) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;

        match from {
            Pending => &[Interview, Task, InterviewScheduled, TaskSubmitted, Rejected],
            Interview => &[InterviewScheduled, Rejected],
            Task => &[TaskSubmitted, Rejected],
            InterviewScheduled => &[Payment, Rejected],
            TaskSubmitted => &[Payment, Rejected],
            Payment => &[Accepted, Rejected],
            Accepted | Rejected => &[],
        }
    }

    pub fn permits(&self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        self.allowed_from(from).contains(&to)
    }

    pub fn is_terminal(&self, status: ApplicationStatus) -> bool {
        self.allowed_from(status).is_empty()
    }
}

const PENDING_MESSAGE: &str = "Your application is being reviewed.";

/// Guidance shown next to the current status.
pub fn next_step_for(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => PENDING_MESSAGE,
        ApplicationStatus::Interview => {
            "Please schedule an interview with one of our administrators."
        }
        ApplicationStatus::InterviewScheduled => {
            "Your interview has been scheduled. Please check your email for details."
        }
        ApplicationStatus::Task => {
            "Please submit the required task to proceed with your application."
        }
        ApplicationStatus::TaskSubmitted => {
            "Your task has been submitted and is being reviewed."
        }
        ApplicationStatus::Payment => {
            "Your application has been accepted. Please complete the payment to secure your admission."
        }
        ApplicationStatus::Accepted => {
            "Congratulations! Your application has been accepted and enrollment is complete."
        }
        ApplicationStatus::Rejected => {
            "We regret to inform you that your application has been rejected."
        }
    }
}

/// Total over arbitrary input: missing or unknown statuses get the pending message.
pub fn next_step(status: Option<&str>) -> &'static str {
    status
        .and_then(|raw| raw.parse::<ApplicationStatus>().ok())
        .map_or(PENDING_MESSAGE, next_step_for)
}
