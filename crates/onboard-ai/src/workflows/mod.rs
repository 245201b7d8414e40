pub mod backfill;
pub mod onboarding;
