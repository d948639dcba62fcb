//! Job-application lifecycle: intake, guarded transitions, and the
//! eligibility diagnosis side-action.
//!
//! The state machine lives in [`transition`] as a pure function over a tagged
//! state enum; persistence, membership checks, and notifications stay behind
//! the traits in [`repository`] so the whole workflow can run against
//! in-memory adapters in tests and demos.

pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod router;
pub mod service;
pub mod transition;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationState, JobApplication, JobApplicationId, NewApplication, RefusalReason, SenderKind,
    SiaeId, StaffCapability, UserId,
};
pub use eligibility::{CriteriaSelection, EligibilityDiagnosis, Level1Criterion, Level2Criterion};
pub use repository::{
    ApplicationNotification, ApplicationRepository, ApplicationView, DiagnosisRepository,
    MembershipDirectory, NotificationError, NotificationPublisher, RepositoryError,
};
pub use router::application_router;
pub use service::{parse_hiring_date, ApplicationServiceError, JobApplicationService};
pub use transition::{
    allowed_actions, ActionKind, ApplicationAction, TransitionEffect, WorkflowConfig,
    WorkflowError,
};
