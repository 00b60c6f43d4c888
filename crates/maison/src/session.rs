//! Request-scoped session resolved once per request and handed to handlers
//! through request extensions.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::membership::{
    MembershipError, MembershipRepository, MembershipSnapshot, MembershipTier, TierResolver,
    UserId, UserRole,
};

/// Header carrying the id of the user the upstream auth platform authenticated.
pub const USER_HEADER: &str = "x-maison-user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub role: UserRole,
    pub membership: MembershipSnapshot,
}

impl Session {
    pub fn member(user_id: UserId, tier: MembershipTier) -> Self {
        Self {
            membership: MembershipSnapshot::with_tier(user_id.clone(), tier),
            user_id,
            role: UserRole::Member,
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn tier(&self) -> MembershipTier {
        self.membership.tier
    }

    pub fn can_access_tier(&self, required: MembershipTier) -> bool {
        self.membership.can_access_tier(required)
    }
}

pub fn resolve_session<R>(
    resolver: &TierResolver<R>,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<Session, MembershipError>
where
    R: MembershipRepository + 'static,
{
    let membership = resolver.resolve(&user_id, now)?;
    let role = resolver.role(&user_id)?;
    Ok(Session {
        user_id,
        role,
        membership,
    })
}

/// Middleware rejecting anonymous calls and attaching a [`Session`].
pub async fn require_session<R>(
    State(resolver): State<TierResolver<R>>,
    mut request: Request,
    next: Next,
) -> Response
where
    R: MembershipRepository + 'static,
{
    let user_id = request
        .headers()
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::new);

    let Some(user_id) = user_id else {
        let payload = json!({ "error": format!("missing {USER_HEADER} header") });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    };

    match resolve_session(&resolver, user_id, Utc::now()) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, "session resolution failed");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}

pub fn membership_router() -> Router {
    Router::new().route("/api/v1/membership", get(membership_handler))
}

/// Session as reported to the member, with the next step on the upgrade path.
#[derive(Debug, Serialize)]
pub struct MembershipView {
    #[serde(flatten)]
    pub session: Session,
    pub next_tier: Option<MembershipTier>,
}

impl From<Session> for MembershipView {
    fn from(session: Session) -> Self {
        Self {
            next_tier: session.tier().next(),
            session,
        }
    }
}

pub(crate) async fn membership_handler(
    Extension(session): Extension<Session>,
) -> Json<MembershipView> {
    Json(MembershipView::from(session))
}
