use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationState, JobApplication, RefusalReason, StaffCapability};

/// An employer-side action on a job application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ApplicationAction {
    Process,
    Postpone {
        #[serde(default)]
        answer: Option<String>,
    },
    Accept {
        date_of_hiring: NaiveDate,
        #[serde(default)]
        answer: Option<String>,
    },
    Refuse {
        refusal_reason: RefusalReason,
        #[serde(default)]
        answer: Option<String>,
    },
}

impl ApplicationAction {
    pub const fn kind(&self) -> ActionKind {
        match self {
            ApplicationAction::Process => ActionKind::Process,
            ApplicationAction::Postpone { .. } => ActionKind::Postpone,
            ApplicationAction::Accept { .. } => ActionKind::Accept,
            ApplicationAction::Refuse { .. } => ActionKind::Refuse,
        }
    }
}

/// Payload-free identifier of an action, used for availability tables and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Process,
    Postpone,
    Accept,
    Refuse,
    /// Side-action: records an eligibility diagnosis without changing state.
    Eligibility,
}

impl ActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            ActionKind::Process => "process",
            ActionKind::Postpone => "postpone",
            ActionKind::Accept => "accept",
            ActionKind::Refuse => "refuse",
            ActionKind::Eligibility => "eligibility",
        }
    }
}

/// Transition table: which actions exist in a given state.
///
/// An action absent from this table is structurally unavailable, which the
/// HTTP boundary reports as not-found rather than a state-specific error.
pub fn allowed_actions(state: ApplicationState) -> &'static [ActionKind] {
    match state {
        ApplicationState::New => &[ActionKind::Process],
        ApplicationState::Processing => &[
            ActionKind::Postpone,
            ActionKind::Accept,
            ActionKind::Refuse,
            ActionKind::Eligibility,
        ],
        ApplicationState::Postponed => &[ActionKind::Accept, ActionKind::Refuse],
        ApplicationState::Accepted | ApplicationState::Refused | ApplicationState::Obsolete => &[],
    }
}

/// Workflow dials that are policy, not structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowConfig {
    /// When set, `accept` rejects hiring dates before the evaluation date.
    /// Off by default, matching the historical behavior.
    pub forbid_hiring_in_past: bool,
}

/// What a successful transition writes back onto the application.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEffect {
    pub next_state: ApplicationState,
    pub date_of_hiring: Option<NaiveDate>,
    pub refusal_reason: Option<RefusalReason>,
    pub answer: Option<String>,
}

impl TransitionEffect {
    fn to_state(next_state: ApplicationState) -> Self {
        Self {
            next_state,
            date_of_hiring: None,
            refusal_reason: None,
            answer: None,
        }
    }
}

/// Guard failures raised by the transition engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// The action does not exist in the current state. Surfaced as not-found.
    #[error("action '{}' is unavailable in state '{}'", .action.label(), .state.label())]
    Unavailable {
        state: ApplicationState,
        action: ActionKind,
    },
    /// The acting user's capability does not cover the target employer.
    /// Also surfaced as not-found: the application does not exist for them.
    #[error("acting user is not a staff member of the target employer")]
    OutOfScope,
    /// A required field is missing or invalid; the state is left untouched.
    #[error("invalid value for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

fn blank(answer: &Option<String>) -> bool {
    answer
        .as_deref()
        .map(|text| text.trim().is_empty())
        .unwrap_or(true)
}

fn normalized(answer: Option<String>) -> Option<String> {
    answer.filter(|text| !text.trim().is_empty())
}

/// Pure transition function.
///
/// Guard order is fixed: capability scope, then state availability, then
/// payload validation. Nothing is mutated here; the caller persists the
/// returned effect in one update.
pub fn apply(
    application: &JobApplication,
    action: ApplicationAction,
    capability: &StaffCapability,
    today: NaiveDate,
    config: &WorkflowConfig,
) -> Result<TransitionEffect, WorkflowError> {
    if !capability.covers(&application.to_siae) {
        return Err(WorkflowError::OutOfScope);
    }

    let kind = action.kind();
    if !allowed_actions(application.state).contains(&kind) {
        return Err(WorkflowError::Unavailable {
            state: application.state,
            action: kind,
        });
    }

    match action {
        ApplicationAction::Process => Ok(TransitionEffect::to_state(ApplicationState::Processing)),
        ApplicationAction::Postpone { answer } => {
            let mut effect = TransitionEffect::to_state(ApplicationState::Postponed);
            effect.answer = normalized(answer);
            Ok(effect)
        }
        ApplicationAction::Accept {
            date_of_hiring,
            answer,
        } => {
            if config.forbid_hiring_in_past && date_of_hiring < today {
                return Err(WorkflowError::Validation {
                    field: "date_of_hiring",
                    message: format!("hiring date {date_of_hiring} is in the past"),
                });
            }
            let mut effect = TransitionEffect::to_state(ApplicationState::Accepted);
            effect.date_of_hiring = Some(date_of_hiring);
            effect.answer = normalized(answer);
            Ok(effect)
        }
        ApplicationAction::Refuse {
            refusal_reason,
            answer,
        } => {
            if refusal_reason.requires_answer() && blank(&answer) {
                return Err(WorkflowError::Validation {
                    field: "answer",
                    message: "an answer is mandatory when the refusal reason is 'other'"
                        .to_string(),
                });
            }
            let mut effect = TransitionEffect::to_state(ApplicationState::Refused);
            effect.refusal_reason = Some(refusal_reason);
            effect.answer = normalized(answer);
            Ok(effect)
        }
    }
}

/// Soft retirement applied when the job seeker is hired elsewhere.
///
/// Terminal applications keep their state; anything still pending collapses
/// to `Obsolete`.
pub(crate) fn render_obsolete(state: ApplicationState) -> Option<ApplicationState> {
    state.is_pending().then_some(ApplicationState::Obsolete)
}
