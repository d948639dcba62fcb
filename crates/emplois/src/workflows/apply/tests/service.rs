use std::sync::Arc;

use chrono::NaiveDate;

use super::common::*;
use crate::workflows::apply::domain::{ApplicationState, JobApplicationId, RefusalReason};
use crate::workflows::apply::repository::{ApplicationRepository, RepositoryError};
use crate::workflows::apply::service::{
    parse_hiring_date, ApplicationServiceError, JobApplicationService,
};
use crate::workflows::apply::transition::{ApplicationAction, WorkflowConfig, WorkflowError};

#[test]
fn submit_creates_a_new_application() {
    let fixture = build_service();
    let application = fixture.service.submit(submission()).expect("submitted");

    assert_eq!(application.state, ApplicationState::New);
    assert!(application.date_of_hiring.is_none());
    assert!(application.refusal_reason.is_none());
    assert_eq!(application.to_siae, siae());

    let stored = fixture
        .applications
        .fetch(&application.id)
        .expect("fetch works")
        .expect("record present");
    assert_eq!(stored, application);
}

#[test]
fn process_requires_staff_of_the_target_employer() {
    let fixture = build_service();
    let application = fixture.service.submit(submission()).expect("submitted");

    let error = fixture
        .service
        .transition(&application.id, &outsider(), ApplicationAction::Process)
        .expect_err("outsider cannot process");
    assert!(error.is_not_found());

    let processed = fixture
        .service
        .transition(&application.id, &staff_user(), ApplicationAction::Process)
        .expect("staff can process");
    assert_eq!(processed.state, ApplicationState::Processing);
}

#[test]
fn guard_failures_leave_the_stored_state_untouched() {
    let fixture = build_service();
    let application = fixture.service.submit(submission()).expect("submitted");
    fixture
        .service
        .transition(&application.id, &staff_user(), ApplicationAction::Process)
        .expect("processing");

    let error = fixture
        .service
        .transition(
            &application.id,
            &staff_user(),
            ApplicationAction::Refuse {
                refusal_reason: RefusalReason::Other,
                answer: None,
            },
        )
        .expect_err("refuse without answer rejected");
    assert!(matches!(
        error,
        ApplicationServiceError::Workflow(WorkflowError::Validation { field: "answer", .. })
    ));

    let stored = fixture
        .service
        .get(&application.id, &staff_user())
        .expect("fetch works");
    assert_eq!(stored.state, ApplicationState::Processing);
    assert!(stored.refusal_reason.is_none());
}

#[test]
fn refuse_records_reason_and_answer_and_notifies() {
    let fixture = build_service();
    let application = fixture.service.submit(submission()).expect("submitted");
    fixture
        .service
        .transition(&application.id, &staff_user(), ApplicationAction::Process)
        .expect("processing");

    let refused = fixture
        .service
        .transition(
            &application.id,
            &staff_user(),
            ApplicationAction::Refuse {
                refusal_reason: RefusalReason::Other,
                answer: Some("The position was filled internally.".to_string()),
            },
        )
        .expect("refuse succeeds");

    assert_eq!(refused.state, ApplicationState::Refused);
    assert_eq!(refused.refusal_reason, Some(RefusalReason::Other));
    assert_eq!(
        refused.answer.as_deref(),
        Some("The position was filled internally.")
    );

    let events = fixture.notifications.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "application_refused");
    assert_eq!(
        events[0].details.get("refusal_reason").map(String::as_str),
        Some("other")
    );
}

#[test]
fn accept_persists_the_submitted_date_exactly() {
    let fixture = build_service();
    let application = fixture.service.submit(submission()).expect("submitted");
    fixture
        .service
        .transition(&application.id, &staff_user(), ApplicationAction::Process)
        .expect("processing");

    let date = parse_hiring_date("15/06/2024").expect("date parses");
    assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid"));

    let accepted = fixture
        .service
        .transition(
            &application.id,
            &staff_user(),
            ApplicationAction::Accept {
                date_of_hiring: date,
                answer: None,
            },
        )
        .expect("accept succeeds");

    assert_eq!(accepted.state, ApplicationState::Accepted);
    assert_eq!(accepted.date_of_hiring, Some(date));

    let events = fixture.notifications.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "application_accepted");
    assert_eq!(
        events[0].details.get("date_of_hiring").map(String::as_str),
        Some("2024-06-15")
    );
}

#[test]
fn accept_renders_sibling_applications_obsolete() {
    let fixture = build_service();
    fixture.directory.add_member(staff_user(), other_siae());

    let first = fixture.service.submit(submission()).expect("submitted");
    let mut second_submission = submission();
    second_submission.to_siae = other_siae();
    let second = fixture.service.submit(second_submission).expect("submitted");

    // A refused sibling keeps its state.
    let mut third_submission = submission();
    third_submission.to_siae = other_siae();
    let third = fixture.service.submit(third_submission).expect("submitted");
    fixture
        .service
        .transition(&third.id, &staff_user(), ApplicationAction::Process)
        .expect("processing");
    fixture
        .service
        .transition(
            &third.id,
            &staff_user(),
            ApplicationAction::Refuse {
                refusal_reason: RefusalReason::NoPosition,
                answer: None,
            },
        )
        .expect("refused");

    fixture
        .service
        .transition(&first.id, &staff_user(), ApplicationAction::Process)
        .expect("processing");
    fixture
        .service
        .transition(
            &first.id,
            &staff_user(),
            ApplicationAction::Accept {
                date_of_hiring: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid"),
                answer: None,
            },
        )
        .expect("accepted");

    let accepted = fixture
        .service
        .get(&first.id, &staff_user())
        .expect("fetch works");
    assert_eq!(accepted.state, ApplicationState::Accepted);

    let sibling = fixture
        .service
        .get(&second.id, &staff_user())
        .expect("fetch works");
    assert_eq!(sibling.state, ApplicationState::Obsolete);

    let refused = fixture
        .service
        .get(&third.id, &staff_user())
        .expect("fetch works");
    assert_eq!(refused.state, ApplicationState::Refused);
}

#[test]
fn terminal_states_reject_every_transition() {
    let fixture = build_service();
    let application = fixture.service.submit(submission()).expect("submitted");
    fixture
        .service
        .transition(&application.id, &staff_user(), ApplicationAction::Process)
        .expect("processing");
    fixture
        .service
        .transition(
            &application.id,
            &staff_user(),
            ApplicationAction::Accept {
                date_of_hiring: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid"),
                answer: None,
            },
        )
        .expect("accepted");

    for action in [
        ApplicationAction::Process,
        ApplicationAction::Postpone { answer: None },
        ApplicationAction::Accept {
            date_of_hiring: NaiveDate::from_ymd_opt(2024, 8, 1).expect("valid"),
            answer: None,
        },
        ApplicationAction::Refuse {
            refusal_reason: RefusalReason::NoPosition,
            answer: None,
        },
    ] {
        let error = fixture
            .service
            .transition(&application.id, &staff_user(), action)
            .expect_err("terminal state allows nothing");
        assert!(error.is_not_found());
    }
}

#[test]
fn accept_honors_the_past_date_rule_when_configured() {
    let fixture = build_service_with_config(WorkflowConfig {
        forbid_hiring_in_past: true,
    });
    let application = fixture.service.submit(submission()).expect("submitted");
    fixture
        .service
        .transition(&application.id, &staff_user(), ApplicationAction::Process)
        .expect("processing");

    let error = fixture
        .service
        .transition(
            &application.id,
            &staff_user(),
            ApplicationAction::Accept {
                date_of_hiring: NaiveDate::from_ymd_opt(2001, 1, 1).expect("valid"),
                answer: None,
            },
        )
        .expect_err("ancient hiring date rejected");
    assert!(matches!(
        error,
        ApplicationServiceError::Workflow(WorkflowError::Validation {
            field: "date_of_hiring",
            ..
        })
    ));
}

#[test]
fn unknown_application_is_not_found() {
    let fixture = build_service();
    let error = fixture
        .service
        .transition(
            &JobApplicationId("missing".to_string()),
            &staff_user(),
            ApplicationAction::Process,
        )
        .expect_err("missing record");
    assert!(matches!(
        error,
        ApplicationServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn repository_outage_surfaces_as_service_error() {
    let fixture = build_service();
    let service = JobApplicationService::new(
        Arc::new(UnavailableApplications),
        fixture.diagnoses.clone(),
        fixture.directory.clone(),
        fixture.notifications.clone(),
        WorkflowConfig::default(),
    );

    let error = service.submit(submission()).expect_err("storage offline");
    assert!(matches!(
        error,
        ApplicationServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn parse_hiring_date_rejects_malformed_input() {
    let error = parse_hiring_date("2024-06-15").expect_err("ISO order rejected");
    assert!(matches!(
        error,
        WorkflowError::Validation {
            field: "date_of_hiring",
            ..
        }
    ));
}
