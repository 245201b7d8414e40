//! Corporate onboarding review pipeline.
//!
//! `cases` owns the case lifecycle: intake, the review state machine, storage,
//! the service facade, and the HTTP surface. `screening` normalizes and
//! aggregates the findings reported by the automated KYC and AML agents.
//! `progress` maps internal statuses onto the three-step view applicant
//! portals poll.

pub mod cases;
pub mod progress;
pub mod screening;
