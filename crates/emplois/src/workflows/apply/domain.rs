use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobApplicationId(pub String);

/// Identifier wrapper for platform users (job seekers, prescribers, employer staff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for work-integration employers ("SIAE").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiaeId(pub String);

/// Lifecycle state of a job application.
///
/// `Accepted`, `Refused`, and `Obsolete` are terminal: no action is available
/// from them. An application is never deleted; when the job seeker is hired
/// elsewhere its remaining applications become `Obsolete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    New,
    Processing,
    Postponed,
    Accepted,
    Refused,
    Obsolete,
}

impl ApplicationState {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationState::New => "new",
            ApplicationState::Processing => "processing",
            ApplicationState::Postponed => "postponed",
            ApplicationState::Accepted => "accepted",
            ApplicationState::Refused => "refused",
            ApplicationState::Obsolete => "obsolete",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationState::Accepted | ApplicationState::Refused | ApplicationState::Obsolete
        )
    }

    /// States in which the application still competes for a position.
    pub const fn is_pending(self) -> bool {
        !self.is_terminal()
    }
}

/// Who submitted the application on behalf of the job seeker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    JobSeeker,
    Prescriber,
    SiaeStaff,
}

impl SenderKind {
    pub const fn label(self) -> &'static str {
        match self {
            SenderKind::JobSeeker => "job_seeker",
            SenderKind::Prescriber => "prescriber",
            SenderKind::SiaeStaff => "siae_staff",
        }
    }
}

/// Reason recorded when an employer refuses an application.
///
/// `Other` is the free-form escape hatch and requires a written answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusalReason {
    DidNotCome,
    Unavailable,
    NonEligible,
    Incompatible,
    NoPosition,
    Other,
}

impl RefusalReason {
    pub const fn label(self) -> &'static str {
        match self {
            RefusalReason::DidNotCome => "did_not_come",
            RefusalReason::Unavailable => "unavailable",
            RefusalReason::NonEligible => "non_eligible",
            RefusalReason::Incompatible => "incompatible",
            RefusalReason::NoPosition => "no_position",
            RefusalReason::Other => "other",
        }
    }

    pub const fn requires_answer(self) -> bool {
        matches!(self, RefusalReason::Other)
    }
}

/// A job application as persisted by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: JobApplicationId,
    pub job_seeker: UserId,
    pub sender: UserId,
    pub sender_kind: SenderKind,
    pub to_siae: SiaeId,
    pub message: Option<String>,
    pub state: ApplicationState,
    pub date_of_hiring: Option<NaiveDate>,
    pub refusal_reason: Option<RefusalReason>,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted when a sender submits a new application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_seeker: UserId,
    pub sender: UserId,
    pub sender_kind: SenderKind,
    pub to_siae: SiaeId,
    #[serde(default)]
    pub message: Option<String>,
}

/// Proof that a user belongs to the staff of one employer.
///
/// Only the membership directory can mint one, so holding a capability is the
/// authorization check. The transition engine still verifies the scope matches
/// the application's target employer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffCapability {
    siae: SiaeId,
    member: UserId,
}

impl StaffCapability {
    /// Directory-only constructor; adapters implementing `MembershipDirectory`
    /// call this after verifying the membership relation.
    pub fn issue(member: UserId, siae: SiaeId) -> Self {
        Self { siae, member }
    }

    pub fn covers(&self, siae: &SiaeId) -> bool {
        &self.siae == siae
    }

    pub fn member(&self) -> &UserId {
        &self.member
    }

    pub fn siae(&self) -> &SiaeId {
        &self.siae
    }
}
