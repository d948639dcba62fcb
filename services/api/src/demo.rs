use std::sync::Arc;

use clap::Args;

use crate::infra::{
    InMemoryApplicationRepository, InMemoryDiagnosisRepository, InMemoryMembershipDirectory,
    InMemoryNotificationPublisher,
};
use emplois::error::AppError;
use emplois::workflows::apply::{
    parse_hiring_date, ApplicationAction, ApplicationView, CriteriaSelection,
    JobApplicationService, Level1Criterion, Level2Criterion, NewApplication, SenderKind, SiaeId,
    UserId, WorkflowConfig,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Hiring date for the final accept step, in DD/MM/YYYY
    #[arg(long, default_value = "15/06/2024")]
    pub(crate) date_of_hiring: String,
    /// Refuse the application instead of accepting it
    #[arg(long)]
    pub(crate) refuse: bool,
}

fn print_step(label: &str, view: &ApplicationView) {
    println!(
        "{label:<12} state={:<11} actions=[{}]",
        view.state,
        view.allowed_actions.join(", ")
    );
}

/// Console walkthrough of the workflow, mirroring how the web front drives it.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let staff = UserId("staff-marie".to_string());
    let employer = SiaeId("siae-croix-rouge".to_string());

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let diagnoses = Arc::new(InMemoryDiagnosisRepository::default());
    let directory = Arc::new(InMemoryMembershipDirectory::default());
    directory.add_member(staff.clone(), employer.clone());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = JobApplicationService::new(
        repository,
        diagnoses,
        directory,
        notifications.clone(),
        WorkflowConfig::default(),
    );

    let application = service
        .submit(NewApplication {
            job_seeker: UserId("seeker-karim".to_string()),
            sender: UserId("prescriber-cap-emploi".to_string()),
            sender_kind: SenderKind::Prescriber,
            to_siae: employer,
            message: Some("Referred after a skills assessment.".to_string()),
        })
        .map_err(demo_failure)?;
    print_step("submitted", &ApplicationView::from_application(&application));

    let application = service
        .transition(&application.id, &staff, ApplicationAction::Process)
        .map_err(demo_failure)?;
    print_step("processed", &ApplicationView::from_application(&application));

    let diagnosis = service
        .record_eligibility(
            &application.id,
            &staff,
            CriteriaSelection {
                level_1: vec![Level1Criterion::MinimumIncomeBeneficiary],
                level_2: vec![Level2Criterion::LongTermUnemployed],
            },
        )
        .map_err(demo_failure)?;
    println!(
        "{:<12} job_seeker={} criteria={}+{}",
        "eligibility",
        diagnosis.job_seeker.0,
        diagnosis.criteria.level_1.len(),
        diagnosis.criteria.level_2.len()
    );

    let application = if args.refuse {
        service
            .transition(
                &application.id,
                &staff,
                ApplicationAction::Refuse {
                    refusal_reason: emplois::workflows::apply::RefusalReason::NoPosition,
                    answer: None,
                },
            )
            .map_err(demo_failure)?
    } else {
        let date_of_hiring = parse_hiring_date(&args.date_of_hiring).map_err(|err| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                err.to_string(),
            ))
        })?;
        service
            .transition(
                &application.id,
                &staff,
                ApplicationAction::Accept {
                    date_of_hiring,
                    answer: Some("Welcome aboard!".to_string()),
                },
            )
            .map_err(demo_failure)?
    };
    print_step("closed", &ApplicationView::from_application(&application));

    for event in notifications.events() {
        println!("notified     template={}", event.template);
    }

    Ok(())
}

fn demo_failure(error: emplois::workflows::apply::ApplicationServiceError) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        error.to_string(),
    ))
}
