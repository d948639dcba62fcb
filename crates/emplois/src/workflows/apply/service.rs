use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use tracing::info;

use super::domain::{
    ApplicationState, JobApplication, JobApplicationId, NewApplication, StaffCapability, UserId,
};
use super::eligibility::{self, CriteriaSelection, EligibilityDiagnosis};
use super::repository::{
    ApplicationNotification, ApplicationRepository, DiagnosisRepository, MembershipDirectory,
    NotificationError, NotificationPublisher, RepositoryError,
};
use super::transition::{self, ApplicationAction, WorkflowConfig, WorkflowError};

/// Service composing the transition engine, repositories, and notifications.
///
/// Every transition runs in one logical unit: guards first, then a single
/// repository update, then notification. A guard failure leaves the stored
/// application untouched.
pub struct JobApplicationService<R, N> {
    applications: Arc<R>,
    diagnoses: Arc<dyn DiagnosisRepository>,
    directory: Arc<dyn MembershipDirectory>,
    notifications: Arc<N>,
    config: WorkflowConfig,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> JobApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobApplicationId(format!("apply-{id:06}"))
}

impl<R, N> JobApplicationService<R, N>
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        applications: Arc<R>,
        diagnoses: Arc<dyn DiagnosisRepository>,
        directory: Arc<dyn MembershipDirectory>,
        notifications: Arc<N>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            applications,
            diagnoses,
            directory,
            notifications,
            config,
        }
    }

    /// Submit a new application on behalf of a job seeker. Always lands in `new`.
    pub fn submit(
        &self,
        submission: NewApplication,
    ) -> Result<JobApplication, ApplicationServiceError> {
        let now = Utc::now();
        let application = JobApplication {
            id: next_application_id(),
            job_seeker: submission.job_seeker,
            sender: submission.sender,
            sender_kind: submission.sender_kind,
            to_siae: submission.to_siae,
            message: submission.message,
            state: ApplicationState::New,
            date_of_hiring: None,
            refusal_reason: None,
            answer: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.applications.insert(application)?;
        info!(application_id = %stored.id.0, siae = %stored.to_siae.0, "application submitted");
        Ok(stored)
    }

    /// Run a guarded transition on behalf of an employer staff member.
    pub fn transition(
        &self,
        id: &JobApplicationId,
        acting_user: &UserId,
        action: ApplicationAction,
    ) -> Result<JobApplication, ApplicationServiceError> {
        let mut application = self
            .applications
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        let capability = self.capability_for(acting_user, &application)?;
        let today = Local::now().date_naive();
        let effect = transition::apply(&application, action, &capability, today, &self.config)?;

        let previous = application.state;
        application.state = effect.next_state;
        if effect.date_of_hiring.is_some() {
            application.date_of_hiring = effect.date_of_hiring;
        }
        if effect.refusal_reason.is_some() {
            application.refusal_reason = effect.refusal_reason;
        }
        if effect.answer.is_some() {
            application.answer = effect.answer;
        }
        application.updated_at = Utc::now();

        self.applications.update(application.clone())?;
        info!(
            application_id = %application.id.0,
            from = previous.label(),
            to = application.state.label(),
            "application transition applied"
        );

        match application.state {
            ApplicationState::Accepted => {
                self.retire_siblings(&application)?;
                self.notify(&application, "application_accepted")?;
            }
            ApplicationState::Refused => {
                self.notify(&application, "application_refused")?;
            }
            _ => {}
        }

        Ok(application)
    }

    /// Record an eligibility diagnosis for the job seeker; only while `processing`.
    pub fn record_eligibility(
        &self,
        id: &JobApplicationId,
        acting_user: &UserId,
        criteria: CriteriaSelection,
    ) -> Result<EligibilityDiagnosis, ApplicationServiceError> {
        let application = self
            .applications
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        let capability = self.capability_for(acting_user, &application)?;
        eligibility::validate_recording(application.state, &criteria)?;

        let diagnosis = EligibilityDiagnosis {
            job_seeker: application.job_seeker.clone(),
            author: capability.member().clone(),
            author_siae: capability.siae().clone(),
            criteria,
            created_at: Utc::now(),
        };
        self.diagnoses.record(diagnosis.clone())?;
        info!(
            application_id = %application.id.0,
            job_seeker = %diagnosis.job_seeker.0,
            "eligibility diagnosis recorded"
        );
        Ok(diagnosis)
    }

    /// Fetch an application for the details view, gated on staff membership.
    pub fn get(
        &self,
        id: &JobApplicationId,
        acting_user: &UserId,
    ) -> Result<JobApplication, ApplicationServiceError> {
        let application = self
            .applications
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        self.capability_for(acting_user, &application)?;
        Ok(application)
    }

    /// Does the job seeker hold a recorded eligibility diagnosis?
    pub fn has_eligibility_diagnosis(
        &self,
        job_seeker: &UserId,
    ) -> Result<bool, ApplicationServiceError> {
        Ok(self.diagnoses.latest_for(job_seeker)?.is_some())
    }

    pub fn config(&self) -> WorkflowConfig {
        self.config
    }

    fn capability_for(
        &self,
        acting_user: &UserId,
        application: &JobApplication,
    ) -> Result<StaffCapability, ApplicationServiceError> {
        self.directory
            .staff_capability(acting_user, &application.to_siae)?
            .ok_or(ApplicationServiceError::Workflow(WorkflowError::OutOfScope))
    }

    /// On hire, the job seeker's other pending applications become obsolete.
    fn retire_siblings(&self, accepted: &JobApplication) -> Result<(), ApplicationServiceError> {
        let siblings = self.applications.for_job_seeker(&accepted.job_seeker)?;
        for mut sibling in siblings {
            if sibling.id == accepted.id {
                continue;
            }
            if let Some(next) = transition::render_obsolete(sibling.state) {
                sibling.state = next;
                sibling.updated_at = Utc::now();
                self.applications.update(sibling)?;
            }
        }
        Ok(())
    }

    fn notify(
        &self,
        application: &JobApplication,
        template: &str,
    ) -> Result<(), ApplicationServiceError> {
        let mut details = BTreeMap::new();
        details.insert("state".to_string(), application.state.label().to_string());
        if let Some(date) = application.date_of_hiring {
            details.insert("date_of_hiring".to_string(), date.to_string());
        }
        if let Some(reason) = application.refusal_reason {
            details.insert("refusal_reason".to_string(), reason.label().to_string());
        }

        self.notifications.publish(ApplicationNotification {
            template: template.to_string(),
            application_id: application.id.clone(),
            details,
        })?;
        Ok(())
    }
}

/// Convenience wrapper parsing the `DD/MM/YYYY` hiring date used on the wire.
pub fn parse_hiring_date(raw: &str) -> Result<NaiveDate, WorkflowError> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").map_err(|err| WorkflowError::Validation {
        field: "date_of_hiring",
        message: format!("expected DD/MM/YYYY, got '{raw}' ({err})"),
    })
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl ApplicationServiceError {
    /// Guard failures are indistinguishable from missing records at the
    /// boundary: the action simply does not exist for that caller.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplicationServiceError::Workflow(WorkflowError::Unavailable { .. })
                | ApplicationServiceError::Workflow(WorkflowError::OutOfScope)
                | ApplicationServiceError::Repository(RepositoryError::NotFound)
        )
    }
}
