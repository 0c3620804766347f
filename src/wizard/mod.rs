//! Onboarding wizard: a linear, validated multi-step form.
//!
//! The wizard resumes from the session's onboarding snapshot, prefills the
//! contact fields from checkout, persists the whole form on every change and
//! submits the reconciled record from its final step.

pub mod form;
pub mod machine;
pub mod schema;

pub use form::FormState;
pub use machine::{FieldFlag, OnboardingWizard, StepOutcome, SUBMIT_ERROR_MESSAGE};
pub use schema::{FieldKind, FieldSpec, FormSchema, MULTI_VALUED_FIELDS};
