use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::apply::domain::{
    ApplicationState, JobApplication, JobApplicationId, NewApplication, SenderKind, SiaeId,
    StaffCapability, UserId,
};
use crate::workflows::apply::eligibility::{
    CriteriaSelection, EligibilityDiagnosis, Level1Criterion, Level2Criterion,
};
use crate::workflows::apply::repository::{
    ApplicationNotification, ApplicationRepository, DiagnosisRepository, MembershipDirectory,
    NotificationError, NotificationPublisher, RepositoryError,
};
use crate::workflows::apply::service::JobApplicationService;
use crate::workflows::apply::transition::WorkflowConfig;
use crate::workflows::apply::application_router;

pub(super) fn siae() -> SiaeId {
    SiaeId("siae-croix-rouge".to_string())
}

pub(super) fn other_siae() -> SiaeId {
    SiaeId("siae-emmaus".to_string())
}

pub(super) fn staff_user() -> UserId {
    UserId("staff-marie".to_string())
}

pub(super) fn outsider() -> UserId {
    UserId("staff-elsewhere".to_string())
}

pub(super) fn job_seeker() -> UserId {
    UserId("seeker-karim".to_string())
}

pub(super) fn submission() -> NewApplication {
    NewApplication {
        job_seeker: job_seeker(),
        sender: UserId("prescriber-cap-emploi".to_string()),
        sender_kind: SenderKind::Prescriber,
        to_siae: siae(),
        message: Some("Motivated candidate, available immediately.".to_string()),
    }
}

pub(super) fn application_in(state: ApplicationState) -> JobApplication {
    let now = Utc::now();
    JobApplication {
        id: JobApplicationId(format!("apply-fixture-{}", state.label())),
        job_seeker: job_seeker(),
        sender: UserId("prescriber-cap-emploi".to_string()),
        sender_kind: SenderKind::Prescriber,
        to_siae: siae(),
        message: None,
        state,
        date_of_hiring: None,
        refusal_reason: None,
        answer: None,
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn capability() -> StaffCapability {
    StaffCapability::issue(staff_user(), siae())
}

pub(super) fn foreign_capability() -> StaffCapability {
    StaffCapability::issue(outsider(), other_siae())
}

pub(super) fn criteria() -> CriteriaSelection {
    CriteriaSelection {
        level_1: vec![Level1Criterion::MinimumIncomeBeneficiary],
        level_2: vec![Level2Criterion::LongTermUnemployed],
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    pub(super) records: Arc<Mutex<HashMap<JobApplicationId, JobApplication>>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: JobApplication) -> Result<JobApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: JobApplication) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            guard.insert(application.id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &JobApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_job_seeker(&self, seeker: &UserId) -> Result<Vec<JobApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| &application.job_seeker == seeker)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _application: JobApplication) -> Result<JobApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: JobApplication) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &JobApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_job_seeker(&self, _seeker: &UserId) -> Result<Vec<JobApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDiagnoses {
    entries: Arc<Mutex<Vec<EligibilityDiagnosis>>>,
}

impl MemoryDiagnoses {
    pub(super) fn entries(&self) -> Vec<EligibilityDiagnosis> {
        self.entries.lock().expect("diagnosis mutex poisoned").clone()
    }
}

impl DiagnosisRepository for MemoryDiagnoses {
    fn record(&self, diagnosis: EligibilityDiagnosis) -> Result<(), RepositoryError> {
        self.entries
            .lock()
            .expect("diagnosis mutex poisoned")
            .push(diagnosis);
        Ok(())
    }

    fn latest_for(
        &self,
        seeker: &UserId,
    ) -> Result<Option<EligibilityDiagnosis>, RepositoryError> {
        let guard = self.entries.lock().expect("diagnosis mutex poisoned");
        Ok(guard
            .iter()
            .filter(|diagnosis| &diagnosis.job_seeker == seeker)
            .max_by_key(|diagnosis| diagnosis.created_at)
            .cloned())
    }
}

/// Directory answering from a fixed membership table.
#[derive(Default, Clone)]
pub(super) struct StaticDirectory {
    members: Arc<Mutex<Vec<(UserId, SiaeId)>>>,
}

impl StaticDirectory {
    pub(super) fn with_member(user: UserId, siae: SiaeId) -> Self {
        let directory = Self::default();
        directory.add_member(user, siae);
        directory
    }

    pub(super) fn add_member(&self, user: UserId, siae: SiaeId) {
        self.members
            .lock()
            .expect("directory mutex poisoned")
            .push((user, siae));
    }
}

impl MembershipDirectory for StaticDirectory {
    fn staff_capability(
        &self,
        user: &UserId,
        siae: &SiaeId,
    ) -> Result<Option<StaffCapability>, RepositoryError> {
        let guard = self.members.lock().expect("directory mutex poisoned");
        Ok(guard
            .iter()
            .find(|(member, employer)| member == user && employer == siae)
            .map(|(member, employer)| StaffCapability::issue(member.clone(), employer.clone())))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<ApplicationNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<ApplicationNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: ApplicationNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct ServiceFixture {
    pub(super) service: JobApplicationService<MemoryApplications, MemoryNotifications>,
    pub(super) applications: Arc<MemoryApplications>,
    pub(super) diagnoses: Arc<MemoryDiagnoses>,
    pub(super) notifications: Arc<MemoryNotifications>,
    pub(super) directory: Arc<StaticDirectory>,
}

pub(super) fn build_service() -> ServiceFixture {
    build_service_with_config(WorkflowConfig::default())
}

pub(super) fn build_service_with_config(config: WorkflowConfig) -> ServiceFixture {
    let applications = Arc::new(MemoryApplications::default());
    let diagnoses = Arc::new(MemoryDiagnoses::default());
    let directory = Arc::new(StaticDirectory::with_member(staff_user(), siae()));
    let notifications = Arc::new(MemoryNotifications::default());
    let service = JobApplicationService::new(
        applications.clone(),
        diagnoses.clone(),
        directory.clone(),
        notifications.clone(),
        config,
    );
    ServiceFixture {
        service,
        applications,
        diagnoses,
        notifications,
        directory,
    }
}

pub(super) fn router_with_service(
    service: JobApplicationService<MemoryApplications, MemoryNotifications>,
) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
