use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CatalogItem, SyncMode, SyncSummary};
use super::repository::CatalogRepository;
use super::scrape::ScrapeClient;
use super::sync::{CatalogSyncJob, SyncError};
use crate::session::Session;

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub action: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    #[serde(default)]
    pub category: Option<String>,
}

pub fn marketplace_router<C, R>(job: Arc<CatalogSyncJob<C, R>>) -> Router
where
    C: ScrapeClient + ?Sized + 'static,
    R: CatalogRepository + 'static,
{
    Router::new()
        .route("/api/v1/marketplace/items", get(items_handler::<C, R>))
        .route("/api/v1/marketplace/sync", post(sync_handler::<C, R>))
        .with_state(job)
}

pub(crate) async fn items_handler<C, R>(
    State(job): State<Arc<CatalogSyncJob<C, R>>>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<CatalogItem>>, SyncError>
where
    C: ScrapeClient + ?Sized + 'static,
    R: CatalogRepository + 'static,
{
    job.items(query.category.as_deref()).map(Json)
}

pub(crate) async fn sync_handler<C, R>(
    State(job): State<Arc<CatalogSyncJob<C, R>>>,
    Extension(session): Extension<Session>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncSummary>, SyncError>
where
    C: ScrapeClient + ?Sized + 'static,
    R: CatalogRepository + 'static,
{
    if !session.role.is_admin() {
        return Err(SyncError::Forbidden);
    }
    let mode =
        SyncMode::parse(&request.action).ok_or(SyncError::UnknownAction(request.action))?;

    job.run(mode, &request.categories).await.map(Json)
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = match self {
            SyncError::UnknownAction(_) => StatusCode::BAD_REQUEST,
            SyncError::Forbidden => StatusCode::FORBIDDEN,
            SyncError::Pattern(_) | SyncError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
