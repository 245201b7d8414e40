use crate::workflows::onboarding::cases::CaseStatus;
use std::collections::HashMap;
use std::sync::OnceLock;

static STATUS_LABEL_MAP: OnceLock<HashMap<String, CaseStatus>> = OnceLock::new();

/// Pipeline status for a legacy export label, or `None` when the label is
/// not one the import recognizes. Unmapped labels are reported to the
/// operator, never guessed at.
pub(crate) fn status_for_label(label: &str) -> Option<CaseStatus> {
    status_label_map().get(&normalize_label(label)).copied()
}

fn status_label_map() -> &'static HashMap<String, CaseStatus> {
    STATUS_LABEL_MAP.get_or_init(|| {
        const LABEL_TO_STATUS: &[(&str, CaseStatus)] = &[
            // Current pipeline labels.
            ("PENDING_REVIEW", CaseStatus::PendingReview),
            ("KYC_COMPLETE", CaseStatus::KycComplete),
            ("AML_IN_PROGRESS", CaseStatus::AmlInProgress),
            ("AML_COMPLETE", CaseStatus::AmlComplete),
            ("AML_REVIEW_READY", CaseStatus::AmlReviewReady),
            ("CLARIFICATION_REQUIRED", CaseStatus::ClarificationRequired),
            ("APPROVED", CaseStatus::Approved),
            ("REJECTED", CaseStatus::Rejected),
            ("CANCELLED", CaseStatus::Cancelled),
            // The retired intake tool split the document phase into three
            // statuses; all of them land before the first automated stage.
            ("DOCUMENT_IN_PROGRESS", CaseStatus::PendingReview),
            ("DOCUMENT_COMPLETE", CaseStatus::PendingReview),
            ("KYC_IN_PROGRESS", CaseStatus::PendingReview),
            // Spelling drift seen across export versions.
            ("NEEDS_CLARIFICATION", CaseStatus::ClarificationRequired),
            ("CANCELED", CaseStatus::Cancelled),
            // AML_STAGE3_COMPLETE is deliberately absent: the label appears
            // in one export version but no surviving system ever produced
            // it, so rows carrying it are surfaced for manual review.
        ];

        let mut map = HashMap::with_capacity(LABEL_TO_STATUS.len());
        for (label, status) in LABEL_TO_STATUS {
            map.insert(normalize_label(label), *status);
        }
        map
    })
}

/// Canonical form for label lookup: trimmed, uppercased, word breaks and
/// hyphens collapsed to single underscores.
fn normalize_label(label: &str) -> String {
    label
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_uppercase()
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(label: &str) -> Option<CaseStatus> {
    status_for_label(label)
}
