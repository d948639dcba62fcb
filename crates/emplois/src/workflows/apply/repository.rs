use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{JobApplication, JobApplicationId, SiaeId, StaffCapability, UserId};
use super::eligibility::EligibilityDiagnosis;
use super::transition::{allowed_actions, ActionKind};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: JobApplication) -> Result<JobApplication, RepositoryError>;
    fn update(&self, application: JobApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &JobApplicationId) -> Result<Option<JobApplication>, RepositoryError>;
    /// Every application of one job seeker, used to retire siblings on hire.
    fn for_job_seeker(&self, job_seeker: &UserId) -> Result<Vec<JobApplication>, RepositoryError>;
}

/// Storage abstraction for eligibility diagnoses, keyed by job seeker.
pub trait DiagnosisRepository: Send + Sync {
    fn record(&self, diagnosis: EligibilityDiagnosis) -> Result<(), RepositoryError>;
    fn latest_for(
        &self,
        job_seeker: &UserId,
    ) -> Result<Option<EligibilityDiagnosis>, RepositoryError>;
}

/// Issues staff capabilities; the only way to obtain one.
pub trait MembershipDirectory: Send + Sync {
    /// `None` when the user is not a staff member of the employer.
    fn staff_capability(
        &self,
        user: &UserId,
        siae: &SiaeId,
    ) -> Result<Option<StaffCapability>, RepositoryError>;
}

/// Error enumeration for repository and directory failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound notification hooks (e-mail adapters in production).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: ApplicationNotification) -> Result<(), NotificationError>;
}

/// Notification payload emitted on accept and refuse transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationNotification {
    pub template: String,
    pub application_id: JobApplicationId,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized details view returned to employer staff.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_id: JobApplicationId,
    pub job_seeker: UserId,
    pub sender_kind: &'static str,
    pub state: &'static str,
    pub allowed_actions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_hiring: Option<chrono::NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl ApplicationView {
    pub fn from_application(application: &JobApplication) -> Self {
        Self {
            application_id: application.id.clone(),
            job_seeker: application.job_seeker.clone(),
            sender_kind: application.sender_kind.label(),
            state: application.state.label(),
            allowed_actions: allowed_actions(application.state)
                .iter()
                .copied()
                .map(ActionKind::label)
                .collect(),
            date_of_hiring: application.date_of_hiring,
            refusal_reason: application.refusal_reason.map(|reason| reason.label()),
            answer: application.answer.clone(),
        }
    }
}
