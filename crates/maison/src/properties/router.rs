use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::aggregator::{AggregatedListings, AggregationError, PropertyAggregator};
use super::domain::{Property, PropertyId, PropertyQuery};
use super::feed::IdxFeed;
use super::repository::PropertyRepository;

pub fn property_router<R, F>(aggregator: Arc<PropertyAggregator<R, F>>) -> Router
where
    R: PropertyRepository + 'static,
    F: IdxFeed + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/properties", get(listings_handler::<R, F>))
        .route("/api/v1/properties/:property_id", get(property_handler::<R, F>))
        .with_state(aggregator)
}

pub(crate) async fn listings_handler<R, F>(
    State(aggregator): State<Arc<PropertyAggregator<R, F>>>,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<AggregatedListings>, AggregationError>
where
    R: PropertyRepository + 'static,
    F: IdxFeed + ?Sized + 'static,
{
    aggregator.aggregate(&query).await.map(Json)
}

pub(crate) async fn property_handler<R, F>(
    State(aggregator): State<Arc<PropertyAggregator<R, F>>>,
    Path(property_id): Path<String>,
) -> Result<Json<Property>, AggregationError>
where
    R: PropertyRepository + 'static,
    F: IdxFeed + ?Sized + 'static,
{
    aggregator
        .property(&PropertyId(property_id))
        .await
        .map(Json)
}

impl IntoResponse for AggregationError {
    fn into_response(self) -> Response {
        let status = match self {
            AggregationError::NotFound(_) => StatusCode::NOT_FOUND,
            AggregationError::AllSourcesFailed { .. } | AggregationError::Lookup(_) => {
                StatusCode::BAD_GATEWAY
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
