use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{JobApplicationId, NewApplication, RefusalReason, UserId};
use super::eligibility::CriteriaSelection;
use super::repository::{ApplicationRepository, ApplicationView, NotificationPublisher};
use super::service::{
    parse_hiring_date, ApplicationServiceError, JobApplicationService,
};
use super::transition::{ApplicationAction, WorkflowError};

/// Router builder exposing HTTP endpoints for intake and transitions.
pub fn application_router<R, N>(service: Arc<JobApplicationService<R, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<R, N>))
        .route(
            "/api/v1/applications/:application_id",
            get(details_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/process",
            post(process_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/postpone",
            post(postpone_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/accept",
            post(accept_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/refuse",
            post(refuse_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/eligibility",
            post(eligibility_handler::<R, N>),
        )
        .with_state(service)
}

fn details_location(id: &JobApplicationId) -> String {
    format!("/api/v1/applications/{}", id.0)
}

fn error_response(error: ApplicationServiceError) -> Response {
    if error.is_not_found() {
        let payload = json!({ "error": "not found" });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    }

    match error {
        ApplicationServiceError::Workflow(WorkflowError::Validation { field, message }) => {
            let payload = json!({
                "error": message,
                "field": field,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// Successful transitions redirect to the details view, as the web front does.
fn see_details(id: &JobApplicationId, view: ApplicationView) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, details_location(id))],
        axum::Json(view),
    )
        .into_response()
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<JobApplicationService<R, N>>>,
    axum::Json(submission): axum::Json<NewApplication>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(submission) {
        Ok(application) => {
            let view = ApplicationView::from_application(&application);
            (
                StatusCode::CREATED,
                [(header::LOCATION, details_location(&application.id))],
                axum::Json(view),
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailsQuery {
    pub(crate) user_id: String,
}

pub(crate) async fn details_handler<R, N>(
    State(service): State<Arc<JobApplicationService<R, N>>>,
    Path(application_id): Path<String>,
    Query(query): Query<DetailsQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = JobApplicationId(application_id);
    let user = UserId(query.user_id);
    match service.get(&id, &user) {
        Ok(application) => {
            let view = ApplicationView::from_application(&application);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessRequest {
    pub(crate) user_id: String,
}

pub(crate) async fn process_handler<R, N>(
    State(service): State<Arc<JobApplicationService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ProcessRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = JobApplicationId(application_id);
    let user = UserId(request.user_id);
    match service.transition(&id, &user, ApplicationAction::Process) {
        Ok(application) => see_details(&id, ApplicationView::from_application(&application)),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostponeRequest {
    pub(crate) user_id: String,
    #[serde(default)]
    pub(crate) answer: Option<String>,
}

pub(crate) async fn postpone_handler<R, N>(
    State(service): State<Arc<JobApplicationService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<PostponeRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = JobApplicationId(application_id);
    let user = UserId(request.user_id);
    let action = ApplicationAction::Postpone {
        answer: request.answer,
    };
    match service.transition(&id, &user, action) {
        Ok(application) => see_details(&id, ApplicationView::from_application(&application)),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcceptRequest {
    pub(crate) user_id: String,
    /// Hiring date in `DD/MM/YYYY`, matching the paper forms employers fill in.
    pub(crate) date_of_hiring: String,
    #[serde(default)]
    pub(crate) answer: Option<String>,
}

pub(crate) async fn accept_handler<R, N>(
    State(service): State<Arc<JobApplicationService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<AcceptRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = JobApplicationId(application_id);
    let user = UserId(request.user_id);

    let date_of_hiring = match parse_hiring_date(&request.date_of_hiring) {
        Ok(date) => date,
        Err(error) => return error_response(ApplicationServiceError::Workflow(error)),
    };

    let action = ApplicationAction::Accept {
        date_of_hiring,
        answer: request.answer,
    };
    match service.transition(&id, &user, action) {
        Ok(application) => see_details(&id, ApplicationView::from_application(&application)),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefuseRequest {
    pub(crate) user_id: String,
    pub(crate) refusal_reason: RefusalReason,
    #[serde(default)]
    pub(crate) answer: Option<String>,
}

pub(crate) async fn refuse_handler<R, N>(
    State(service): State<Arc<JobApplicationService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<RefuseRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = JobApplicationId(application_id);
    let user = UserId(request.user_id);
    let action = ApplicationAction::Refuse {
        refusal_reason: request.refusal_reason,
        answer: request.answer,
    };
    match service.transition(&id, &user, action) {
        Ok(application) => see_details(&id, ApplicationView::from_application(&application)),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityRequest {
    pub(crate) user_id: String,
    #[serde(flatten)]
    pub(crate) criteria: CriteriaSelection,
}

pub(crate) async fn eligibility_handler<R, N>(
    State(service): State<Arc<JobApplicationService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<EligibilityRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let id = JobApplicationId(application_id);
    let user = UserId(request.user_id);
    match service.record_eligibility(&id, &user, request.criteria) {
        Ok(_diagnosis) => match service.get(&id, &user) {
            Ok(application) => see_details(&id, ApplicationView::from_application(&application)),
            Err(error) => error_response(error),
        },
        Err(error) => error_response(error),
    }
}
