//! Applicant-facing progress reporting.
//!
//! Portals render onboarding as three steps regardless of how many internal
//! statuses the pipeline moves through. The mapping below is the single
//! source of truth for that collapse; it is total over the status set, and
//! labels from outside the set fail closed to the earliest in-progress view
//! rather than erroring in front of an applicant.

use super::cases::domain::CaseStatus;
use serde::Serialize;
use std::time::Duration;

/// Cadence portals poll at unless the deployment overrides it.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One of the three applicant-visible steps, plus how that step is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub step: u8,
    pub result: PhaseResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseResult {
    InProgress,
    Done,
    Clarify,
    Approved,
    Rejected,
}

impl PhaseResult {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Clarify => "clarify",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

const fn phase(step: u8, result: PhaseResult) -> Phase {
    Phase { step, result }
}

/// Collapse a pipeline status onto the applicant view. Cancellation renders
/// the same as rejection; applicants see the outcome, not the reason.
pub const fn phase_for(status: CaseStatus) -> Phase {
    match status {
        CaseStatus::PendingReview => phase(1, PhaseResult::InProgress),
        CaseStatus::KycComplete => phase(1, PhaseResult::Done),
        CaseStatus::AmlInProgress => phase(2, PhaseResult::InProgress),
        CaseStatus::AmlComplete => phase(2, PhaseResult::Done),
        CaseStatus::AmlReviewReady => phase(3, PhaseResult::InProgress),
        CaseStatus::ClarificationRequired => phase(1, PhaseResult::Clarify),
        CaseStatus::Approved => phase(3, PhaseResult::Approved),
        CaseStatus::Rejected => phase(3, PhaseResult::Rejected),
        CaseStatus::Cancelled => phase(3, PhaseResult::Rejected),
    }
}

/// Phase for a raw status label, for callers holding strings from an older
/// export or a foreign system. Unknown labels fail closed.
pub fn phase_for_label(label: &str) -> Phase {
    match CaseStatus::parse(label) {
        Some(status) => phase_for(status),
        None => phase(1, PhaseResult::InProgress),
    }
}

/// Statuses that advance on their own. Everything else only moves when an
/// officer or an applicant acts, so polling can stop.
pub const fn is_in_flight(status: CaseStatus) -> bool {
    matches!(
        status,
        CaseStatus::PendingReview | CaseStatus::KycComplete | CaseStatus::AmlInProgress
    )
}

/// What an observer should do after one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollDirective {
    pub phase: Phase,
    pub changed: bool,
    pub keep_polling: bool,
    pub next_poll_in: Option<Duration>,
}

/// Polling context for a single observer session.
///
/// Each portal session owns one tracker; there is no shared registry, so two
/// sessions watching the same case never see each other's change flags.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    interval: Duration,
    last_status: Option<CaseStatus>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_status: None,
        }
    }

    /// Record the status a poll returned. The first observation always
    /// reports a change.
    pub fn observe(&mut self, status: CaseStatus) -> PollDirective {
        let changed = self.last_status != Some(status);
        self.last_status = Some(status);

        let keep_polling = is_in_flight(status);
        PollDirective {
            phase: phase_for(status),
            changed,
            keep_polling,
            next_poll_in: keep_polling.then_some(self.interval),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
