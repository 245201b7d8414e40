use super::domain::{CaseId, CaseStatus, OfficerAction};
use crate::workflows::onboarding::screening::ScreeningStage;

/// Why a requested transition did not happen.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error(
        "action '{}' is not permitted while the case is {}",
        action.label(),
        status.label()
    )]
    InvalidTransition {
        status: CaseStatus,
        action: OfficerAction,
    },
    #[error(
        "case {} changed while the decision was in flight; re-fetch and resubmit",
        case_id.0
    )]
    Stale { case_id: CaseId },
}

/// Target status for an officer action taken from `status`.
///
/// Terminal cases accept nothing. Approve is the only stage-aware action:
/// from `KYC_COMPLETE` it opens AML screening rather than closing the case,
/// and it is refused while either automated stage is still running. Reject,
/// clarify, and cancel are valid from every non-terminal status; clarify may
/// be repeated to update the request.
pub fn action_target(
    status: CaseStatus,
    action: OfficerAction,
) -> Result<CaseStatus, TransitionError> {
    if status.is_terminal() {
        return Err(TransitionError::InvalidTransition { status, action });
    }

    let target = match action {
        OfficerAction::Approve => match status {
            CaseStatus::KycComplete => CaseStatus::AmlInProgress,
            CaseStatus::AmlComplete
            | CaseStatus::AmlReviewReady
            | CaseStatus::ClarificationRequired => CaseStatus::Approved,
            _ => return Err(TransitionError::InvalidTransition { status, action }),
        },
        OfficerAction::Reject => CaseStatus::Rejected,
        OfficerAction::Clarify => CaseStatus::ClarificationRequired,
        OfficerAction::Cancel => CaseStatus::Cancelled,
    };

    Ok(target)
}

/// Target status when a screening stage reports complete, or `None` when the
/// case is not at the point the stage advances from. Stage completion is an
/// idempotent signal: out-of-place deliveries are ignored, not errors.
pub fn stage_target(status: CaseStatus, stage: ScreeningStage) -> Option<CaseStatus> {
    match (stage, status) {
        (ScreeningStage::Kyc, CaseStatus::PendingReview) => Some(CaseStatus::KycComplete),
        (ScreeningStage::AmlRisk, CaseStatus::AmlInProgress) => Some(CaseStatus::AmlComplete),
        _ => None,
    }
}

/// Officer actions currently valid for a case, in presentation order.
/// Derived from the same table that enforces them, so the review UI can
/// never offer a button the service would refuse.
pub fn available_actions(status: CaseStatus) -> Vec<OfficerAction> {
    OfficerAction::ordered()
        .into_iter()
        .filter(|action| action_target(status, *action).is_ok())
        .collect()
}
