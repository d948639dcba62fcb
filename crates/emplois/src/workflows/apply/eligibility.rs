use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationState, SiaeId, UserId};
use super::transition::WorkflowError;

/// Level-1 administrative criteria: a single one qualifies the job seeker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level1Criterion {
    MinimumIncomeBeneficiary,
    SolidarityAllowanceBeneficiary,
    DisabledAdultAllowanceBeneficiary,
    VeryLongTermUnemployed,
}

/// Level-2 administrative criteria: cumulative markers of distance from employment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level2Criterion {
    LongTermUnemployed,
    SingleParent,
    SeniorOverFifty,
    UnderTwentySix,
    DisabledWorker,
    NoStableHousing,
    PriorityDistrictResident,
    RuralRevitalizationResident,
}

/// Criteria ticked by the employer while assessing the job seeker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaSelection {
    #[serde(default)]
    pub level_1: Vec<Level1Criterion>,
    #[serde(default)]
    pub level_2: Vec<Level2Criterion>,
}

impl CriteriaSelection {
    pub fn is_empty(&self) -> bool {
        self.level_1.is_empty() && self.level_2.is_empty()
    }
}

/// Recorded assessment of a job seeker's administrative eligibility.
///
/// Owned by the job seeker, not the application: once recorded it outlives the
/// application that prompted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityDiagnosis {
    pub job_seeker: UserId,
    pub author: UserId,
    pub author_siae: SiaeId,
    pub criteria: CriteriaSelection,
    pub created_at: DateTime<Utc>,
}

/// Gate for the eligibility side-action.
///
/// Only reachable while the application is `Processing`; anywhere else the
/// action does not exist, matching the transition table semantics. The
/// application state is left untouched on success.
pub fn validate_recording(
    state: ApplicationState,
    criteria: &CriteriaSelection,
) -> Result<(), WorkflowError> {
    if state != ApplicationState::Processing {
        return Err(WorkflowError::Unavailable {
            state,
            action: super::transition::ActionKind::Eligibility,
        });
    }

    if criteria.is_empty() {
        return Err(WorkflowError::Validation {
            field: "criteria",
            message: "at least one administrative criterion must be selected".to_string(),
        });
    }

    Ok(())
}
