use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::concierge::domain::{
    ConciergeMessage, ConciergeRequest, MessageId, RequestId, RequestStatus, RequestSubmission,
};
use crate::concierge::notifier::{NotifyError, RequestNotifier};
use crate::concierge::realtime::ChangeFeed;
use crate::concierge::repository::ConciergeRepository;
use crate::concierge::service::ConciergeService;
use crate::membership::{MembershipTier, UserId, UserRole};
use crate::session::Session;
use crate::store::{MemoryStore, RepositoryError};

pub(super) fn member(user: &str, tier: MembershipTier) -> Session {
    Session::member(UserId::new(user), tier)
}

pub(super) fn staff(user: &str) -> Session {
    Session::member(UserId::new(user), MembershipTier::Silver).with_role(UserRole::Staff)
}

pub(super) fn submission(category: &str, title: &str) -> RequestSubmission {
    RequestSubmission {
        category: category.to_string(),
        title: title.to_string(),
        description: "Anniversary dinner, quiet table".to_string(),
        preferred_date: None,
        budget_range: Some("$500-$1,000".to_string()),
    }
}

pub(super) fn build_service() -> (
    ConciergeService<MemoryStore, RecordingNotifier>,
    Arc<MemoryStore>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = ConciergeService::new(store.clone(), notifier.clone(), ChangeFeed::default());
    (service, store, notifier)
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<String>>,
    pub(super) fail: bool,
}

impl RecordingNotifier {
    pub(super) fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(super) fn events(&self) -> Vec<String> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    fn record(&self, event: String) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event);
        if self.fail {
            Err(NotifyError::Transport("crm offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RequestNotifier for RecordingNotifier {
    async fn request_created(&self, request: &ConciergeRequest) -> Result<(), NotifyError> {
        self.record(format!("created:{}", request.id))
    }

    async fn status_changed(&self, request: &ConciergeRequest) -> Result<(), NotifyError> {
        self.record(format!("status:{}:{}", request.id, request.status.label()))
    }

    async fn message_posted(
        &self,
        request: &ConciergeRequest,
        _message: &ConciergeMessage,
    ) -> Result<(), NotifyError> {
        self.record(format!("message:{}", request.id))
    }
}

pub(super) struct UnavailableRepository;

impl ConciergeRepository for UnavailableRepository {
    fn insert_request(
        &self,
        _request: ConciergeRequest,
    ) -> Result<ConciergeRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_request(
        &self,
        _expected: RequestStatus,
        _request: ConciergeRequest,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_request(&self, _id: &RequestId) -> Result<Option<ConciergeRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn requests_for(&self, _user: &UserId) -> Result<Vec<ConciergeRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_message(
        &self,
        _message: ConciergeMessage,
    ) -> Result<ConciergeMessage, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn messages_for(&self, _request: &RequestId) -> Result<Vec<ConciergeMessage>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mark_read(
        &self,
        _request: &RequestId,
        _viewer: &UserId,
    ) -> Result<Vec<MessageId>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
