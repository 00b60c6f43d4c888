use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    CategoryAvailability, ConciergeMessage, ConciergeRequest, RequestId, RequestStatus,
    RequestSubmission, ServiceCategory,
};
use super::gating::GatingViolation;
use super::notifier::RequestNotifier;
use super::repository::ConciergeRepository;
use super::service::{ConciergeService, ConciergeServiceError};
use crate::session::Session;
use crate::store::RepositoryError;

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    pub(crate) status: RequestStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    pub(crate) content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnreadView {
    pub(crate) request_id: RequestId,
    pub(crate) unread: usize,
}

/// Router builder exposing concierge intake, status and messaging endpoints.
pub fn concierge_router<R, N>(service: Arc<ConciergeService<R, N>>) -> Router
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/concierge/categories",
            get(categories_handler::<R, N>),
        )
        .route(
            "/api/v1/concierge/categories/:category/select",
            post(select_handler::<R, N>),
        )
        .route(
            "/api/v1/concierge/requests",
            get(list_handler::<R, N>).post(submit_handler::<R, N>),
        )
        .route(
            "/api/v1/concierge/requests/:request_id/status",
            post(status_handler::<R, N>),
        )
        .route(
            "/api/v1/concierge/requests/:request_id/messages",
            get(thread_handler::<R, N>).post(message_handler::<R, N>),
        )
        .route(
            "/api/v1/concierge/requests/:request_id/unread",
            get(unread_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn categories_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
) -> Json<Vec<CategoryAvailability>>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    Json(service.categories(&session))
}

pub(crate) async fn select_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
    Path(category): Path<String>,
) -> Result<Json<ServiceCategory>, ConciergeServiceError>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    service.select_category(&session, &category).map(Json)
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<ConciergeRequest>>, ConciergeServiceError>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    service.requests_for(&session).map(Json)
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
    Json(submission): Json<RequestSubmission>,
) -> Result<(StatusCode, Json<ConciergeRequest>), ConciergeServiceError>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    let request = service.submit(&session, submission).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
    Path(request_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<ConciergeRequest>, ConciergeServiceError>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    service
        .advance_status(&session, &RequestId(request_id), change.status)
        .await
        .map(Json)
}

pub(crate) async fn thread_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
    Path(request_id): Path<String>,
) -> Result<Json<Vec<ConciergeMessage>>, ConciergeServiceError>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    service.thread(&session, &RequestId(request_id)).map(Json)
}

pub(crate) async fn message_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
    Path(request_id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Result<(StatusCode, Json<ConciergeMessage>), ConciergeServiceError>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    let message = service
        .post_message(&session, &RequestId(request_id), &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub(crate) async fn unread_handler<R, N>(
    State(service): State<Arc<ConciergeService<R, N>>>,
    Extension(session): Extension<Session>,
    Path(request_id): Path<String>,
) -> Result<Json<UnreadView>, ConciergeServiceError>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    let request_id = RequestId(request_id);
    let unread = service.unread_count(&session, &request_id)?;
    Ok(Json(UnreadView { request_id, unread }))
}

impl IntoResponse for ConciergeServiceError {
    fn into_response(self) -> Response {
        let (status, payload) = match &self {
            ConciergeServiceError::Gating(GatingViolation::TierTooLow { required, .. }) => (
                StatusCode::FORBIDDEN,
                json!({ "error": self.to_string(), "required_tier": required }),
            ),
            ConciergeServiceError::Gating(GatingViolation::UnknownCategory(_))
            | ConciergeServiceError::NotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            ConciergeServiceError::Gating(GatingViolation::MissingTitle)
            | ConciergeServiceError::EmptyMessage => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string() }),
            ),
            ConciergeServiceError::Forbidden => {
                (StatusCode::FORBIDDEN, json!({ "error": self.to_string() }))
            }
            ConciergeServiceError::InvalidTransition { .. }
            | ConciergeServiceError::Repository(RepositoryError::Conflict) => {
                (StatusCode::CONFLICT, json!({ "error": self.to_string() }))
            }
            ConciergeServiceError::Repository(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(payload)).into_response()
    }
}
