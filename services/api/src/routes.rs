use crate::infra::{AppState, Platform};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use maison::concierge::concierge_router;
use maison::events::event_router;
use maison::marketplace::marketplace_router;
use maison::properties::property_router;
use maison::session::{membership_router, require_session};
use maison::store::MemoryStore;
use serde_json::json;

/// Operational endpoints plus the session-guarded API.
pub(crate) fn application_routes(platform: &Platform) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(api_routes(platform))
}

/// Every `/api/v1` route; each request resolves its [`maison::session::Session`] first.
pub(crate) fn api_routes(platform: &Platform) -> Router {
    membership_router()
        .merge(concierge_router(platform.concierge.clone()))
        .merge(event_router(platform.events.clone()))
        .merge(property_router(platform.listings.clone()))
        .merge(marketplace_router(platform.marketplace.clone()))
        .layer(middleware::from_fn_with_state(
            platform.resolver.clone(),
            require_session::<MemoryStore>,
        ))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{seed_demo_data, DEMO_ADMIN};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use maison::config::AppConfig;
    use maison::integrations::Integrations;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn platform() -> Platform {
        let mut config = AppConfig::local();
        config.marketplace.request_delay = Duration::ZERO;
        let integrations = Integrations::mock(&config.marketplace.source_base_url);
        let platform = Platform::build(&config, &integrations).expect("platform builds");
        seed_demo_data(&platform.store).expect("seed data loads");
        platform
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    fn get_as(user: &str, uri: &str) -> Request<Body> {
        Request::get(uri)
            .header("x-maison-user", user)
            .body(Body::empty())
            .expect("request builds")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn api_requires_the_user_header() {
        let router = api_routes(&platform());
        let request = Request::get("/api/v1/membership")
            .body(Body::empty())
            .expect("request builds");

        let (status, body) = call(router, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn membership_route_returns_the_resolved_tier() {
        let router = api_routes(&platform());

        let (status, body) = call(router, get_as("member-platinum", "/api/v1/membership")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["membership"]["tier"], "platinum");
        assert_eq!(body["role"], "member");
    }

    #[tokio::test]
    async fn unknown_users_fall_back_to_the_lowest_tier() {
        let router = api_routes(&platform());

        let (_, body) = call(router, get_as("walk-in", "/api/v1/membership")).await;

        assert_eq!(body["membership"]["tier"], "silver");
        assert_eq!(body["membership"]["source"], "default");
    }

    #[tokio::test]
    async fn properties_route_interleaves_both_sources() {
        let router = api_routes(&platform());

        let (status, body) = call(router, get_as("member-gold", "/api/v1/properties")).await;

        assert_eq!(status, StatusCode::OK);
        let properties = body["properties"].as_array().expect("listing array");
        assert_eq!(properties.len(), 7);
        assert_eq!(properties[0]["source"], "idx");
        assert_eq!(properties[1]["source"], "local");
        assert!(body["degraded"].as_array().expect("array").is_empty());
    }

    #[tokio::test]
    async fn marketplace_sync_is_admin_only_and_validates_action() {
        let platform = platform();
        let sync = |user: &str, body: Value| {
            Request::post("/api/v1/marketplace/sync")
                .header("x-maison-user", user)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request builds")
        };

        let (status, _) = call(
            api_routes(&platform),
            sync("member-black", json!({ "action": "sync" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            api_routes(&platform),
            sync(DEMO_ADMIN, json!({ "action": "purge" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            api_routes(&platform),
            sync(DEMO_ADMIN, json!({ "action": "sync", "categories": ["watches"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["itemsFound"], 2);
        assert_eq!(body["inserted"], 2);

        let (_, items) = call(
            api_routes(&platform),
            get_as("member-silver", "/api/v1/marketplace/items?category=watches"),
        )
        .await;
        assert_eq!(items.as_array().expect("item array").len(), 2);
    }
}
