use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{Event, EventDraft, EventId, EventListing, EventRsvp, RsvpOutcome};
use super::repository::EventRepository;
use super::service::{EventService, EventServiceError};
use crate::session::Session;

pub fn event_router<R>(service: Arc<EventService<R>>) -> Router
where
    R: EventRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/events",
            get(upcoming_handler::<R>).post(create_handler::<R>),
        )
        .route("/api/v1/events/rsvps", get(my_rsvps_handler::<R>))
        .route("/api/v1/events/:event_id/rsvp", post(rsvp_handler::<R>))
        .with_state(service)
}

pub(crate) async fn upcoming_handler<R>(
    State(service): State<Arc<EventService<R>>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<EventListing>>, EventServiceError>
where
    R: EventRepository + 'static,
{
    service.list_upcoming(&session, Utc::now()).map(Json)
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<EventService<R>>>,
    Extension(session): Extension<Session>,
    Json(draft): Json<EventDraft>,
) -> Result<(StatusCode, Json<Event>), EventServiceError>
where
    R: EventRepository + 'static,
{
    let event = service.create_event(&session, draft)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub(crate) async fn rsvp_handler<R>(
    State(service): State<Arc<EventService<R>>>,
    Extension(session): Extension<Session>,
    Path(event_id): Path<String>,
) -> Result<(StatusCode, Json<RsvpOutcome>), EventServiceError>
where
    R: EventRepository + 'static,
{
    let outcome = service.rsvp(&session, &EventId(event_id), Utc::now())?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

pub(crate) async fn my_rsvps_handler<R>(
    State(service): State<Arc<EventService<R>>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<EventRsvp>>, EventServiceError>
where
    R: EventRepository + 'static,
{
    service.rsvps_for(&session).map(Json)
}

impl IntoResponse for EventServiceError {
    fn into_response(self) -> Response {
        let payload = match &self {
            EventServiceError::UpgradeRequired { required, .. } => {
                json!({ "error": self.to_string(), "required_tier": required })
            }
            _ => json!({ "error": self.to_string() }),
        };

        let status = match self {
            EventServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            EventServiceError::NotOpen(_) => StatusCode::CONFLICT,
            EventServiceError::UpgradeRequired { .. } | EventServiceError::Forbidden => {
                StatusCode::FORBIDDEN
            }
            EventServiceError::InvalidDraft(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EventServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(payload)).into_response()
    }
}
