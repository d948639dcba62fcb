use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use emplois::workflows::apply::{
    ApplicationNotification, ApplicationRepository, DiagnosisRepository, EligibilityDiagnosis,
    JobApplication, JobApplicationId, MembershipDirectory, NotificationError,
    NotificationPublisher, RepositoryError, SiaeId, StaffCapability, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<JobApplicationId, JobApplication>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryDiagnosisRepository {
    entries: Arc<Mutex<Vec<EligibilityDiagnosis>>>,
}

impl DiagnosisRepository for InMemoryDiagnosisRepository {
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

/// Membership table held in memory, seeded from `APP_SIAE_STAFF`.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMembershipDirectory {
    members: Arc<Mutex<Vec<(UserId, SiaeId)>>>,
}

impl InMemoryMembershipDirectory {
    pub(crate) fn add_member(&self, user: UserId, siae: SiaeId) {
        self.members
            .lock()
            .expect("directory mutex poisoned")
            .push((user, siae));
    }

    /// Parse `APP_SIAE_STAFF` entries of the form `user@siae`, comma separated.
    /// Unparseable entries are skipped; an empty directory is a valid (if
    /// useless) deployment, so this never fails.
    pub(crate) fn seed_from_env(&self) {
        let Ok(raw) = env::var("APP_SIAE_STAFF") else {
            return;
        };
        for entry in raw.split(',') {
            if let Some((user, siae)) = entry.trim().split_once('@') {
                if !user.is_empty() && !siae.is_empty() {
                    self.add_member(UserId(user.to_string()), SiaeId(siae.to_string()));
                }
            }
        }
    }
}

impl MembershipDirectory for InMemoryMembershipDirectory {
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
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<ApplicationNotification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: ApplicationNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<ApplicationNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}
