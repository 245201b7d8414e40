//! Core library for the compliance onboarding service.
//!
//! The crate tracks corporate onboarding applications as cases moving through
//! a fixed review pipeline: intake, automated KYC and AML screening stages,
//! officer decisions, and applicant-facing progress reporting. Screening
//! agents report their findings through the same service facade that the HTTP
//! layer exposes, so every status change flows through one state machine and
//! lands in one append-only audit history.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
