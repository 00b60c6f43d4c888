use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::board::RequestBoard;
use super::domain::{
    CategoryAvailability, ConciergeMessage, ConciergeRequest, MessageId, RequestId,
    RequestStatus, RequestSubmission, ServiceCategory,
};
use super::gating::{CategoryGuard, GatingViolation};
use super::notifier::RequestNotifier;
use super::realtime::{
    ChangeEvent, ChangeFeed, ChangeKind, ChangeRecord, ChangeSubscription, Table,
};
use super::repository::ConciergeRepository;
use crate::session::Session;
use crate::store::RepositoryError;

/// Service composing the tier gate, repository, change feed and outbound notifier.
pub struct ConciergeService<R, N> {
    guard: CategoryGuard,
    repository: Arc<R>,
    notifier: Arc<N>,
    feed: ChangeFeed,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static MESSAGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

fn next_message_id() -> MessageId {
    let id = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MessageId(format!("msg-{id:06}"))
}

impl<R, N> ConciergeService<R, N>
where
    R: ConciergeRepository + 'static,
    N: RequestNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, feed: ChangeFeed) -> Self {
        Self {
            guard: CategoryGuard,
            repository,
            notifier,
            feed,
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn categories(&self, session: &Session) -> Vec<CategoryAvailability> {
        self.guard.availability(session)
    }

    /// Selection-time tier check.
    pub fn select_category(
        &self,
        session: &Session,
        category_id: &str,
    ) -> Result<ServiceCategory, ConciergeServiceError> {
        Ok(self.guard.select(session, category_id)?)
    }

    /// Submission-time checks, then persist with status `submitted`.
    pub async fn submit(
        &self,
        session: &Session,
        submission: RequestSubmission,
    ) -> Result<ConciergeRequest, ConciergeServiceError> {
        let validated = self.guard.validate(session, submission)?;
        let now = Utc::now();

        let request = ConciergeRequest {
            id: next_request_id(),
            user_id: session.user_id.clone(),
            category: validated.category.id.to_string(),
            title: validated.title,
            description: validated.description,
            preferred_date: validated.preferred_date,
            budget_range: validated.budget_range,
            status: RequestStatus::Submitted,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert_request(request)?;
        info!(
            request = %stored.id.0,
            user = %stored.user_id,
            category = %stored.category,
            "concierge request submitted"
        );

        self.publish_request(ChangeKind::Insert, &stored);
        if let Err(err) = self.notifier.request_created(&stored).await {
            warn!(request = %stored.id.0, error = %err, "request notification failed");
        }

        Ok(stored)
    }

    /// Staff-only forward transition.
    pub async fn advance_status(
        &self,
        session: &Session,
        request_id: &RequestId,
        target: RequestStatus,
    ) -> Result<ConciergeRequest, ConciergeServiceError> {
        if !session.role.is_staff() {
            return Err(ConciergeServiceError::Forbidden);
        }

        let mut request = self.load(request_id)?;
        if !request.status.can_transition_to(target) {
            return Err(ConciergeServiceError::InvalidTransition {
                from: request.status,
                to: target,
            });
        }

        let from = request.status;
        request.status = target;
        request.updated_at = Utc::now();
        match self.repository.update_request(from, request.clone()) {
            Ok(()) => {}
            Err(RepositoryError::Conflict) => {
                // Another staff member moved the request first.
                let current = self.load(request_id)?;
                return Err(ConciergeServiceError::InvalidTransition {
                    from: current.status,
                    to: target,
                });
            }
            Err(other) => return Err(other.into()),
        }
        info!(
            request = %request.id.0,
            status = request.status.label(),
            staff = %session.user_id,
            "concierge request status changed"
        );

        self.publish_request(ChangeKind::Update, &request);
        if let Err(err) = self.notifier.status_changed(&request).await {
            warn!(request = %request.id.0, error = %err, "status notification failed");
        }

        Ok(request)
    }

    pub async fn post_message(
        &self,
        session: &Session,
        request_id: &RequestId,
        content: &str,
    ) -> Result<ConciergeMessage, ConciergeServiceError> {
        let request = self.authorized(session, request_id)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(ConciergeServiceError::EmptyMessage);
        }

        let message = ConciergeMessage {
            id: next_message_id(),
            request_id: request.id.clone(),
            sender: session.user_id.clone(),
            content: content.to_string(),
            read: false,
            created_at: Utc::now(),
        };
        let stored = self.repository.insert_message(message)?;

        self.publish_message(ChangeKind::Insert, &request, &stored);
        if let Err(err) = self.notifier.message_posted(&request, &stored).await {
            warn!(request = %request.id.0, error = %err, "message notification failed");
        }

        Ok(stored)
    }

    /// Messages on a request; viewing marks the other party's messages as read.
    pub fn thread(
        &self,
        session: &Session,
        request_id: &RequestId,
    ) -> Result<Vec<ConciergeMessage>, ConciergeServiceError> {
        let request = self.authorized(session, request_id)?;
        let changed = self.repository.mark_read(&request.id, &session.user_id)?;
        let messages = self.repository.messages_for(&request.id)?;

        for message in messages.iter().filter(|message| changed.contains(&message.id)) {
            self.publish_message(ChangeKind::Update, &request, message);
        }

        Ok(messages)
    }

    pub fn unread_count(
        &self,
        session: &Session,
        request_id: &RequestId,
    ) -> Result<usize, ConciergeServiceError> {
        let request = self.authorized(session, request_id)?;
        let messages = self.repository.messages_for(&request.id)?;
        Ok(messages
            .iter()
            .filter(|message| message.is_unread_for(&session.user_id))
            .count())
    }

    pub fn requests_for(
        &self,
        session: &Session,
    ) -> Result<Vec<ConciergeRequest>, ConciergeServiceError> {
        Ok(self.repository.requests_for(&session.user_id)?)
    }

    /// Full snapshot of the caller's board, used initially and after a lagged feed.
    pub fn board_for(&self, session: &Session) -> Result<RequestBoard, ConciergeServiceError> {
        let requests = self.repository.requests_for(&session.user_id)?;
        let mut messages = Vec::new();
        for request in &requests {
            messages.extend(self.repository.messages_for(&request.id)?);
        }

        let mut board = RequestBoard::new(session.user_id.clone());
        board.reload(requests, &messages);
        Ok(board)
    }

    /// Snapshot plus a live subscription for the viewer. The subscription is opened before
    /// the snapshot is read, so nothing written in between is lost; replaying it is harmless.
    pub fn watch(
        &self,
        session: &Session,
    ) -> Result<(RequestBoard, ChangeSubscription), ConciergeServiceError> {
        let subscription = self.feed.subscribe(
            session.user_id.clone(),
            &[Table::ConciergeRequests, Table::ConciergeMessages],
        );
        let board = self.board_for(session)?;
        Ok((board, subscription))
    }

    fn load(&self, request_id: &RequestId) -> Result<ConciergeRequest, ConciergeServiceError> {
        self.repository
            .fetch_request(request_id)?
            .ok_or_else(|| ConciergeServiceError::NotFound(request_id.clone()))
    }

    /// Owner or staff only.
    fn authorized(
        &self,
        session: &Session,
        request_id: &RequestId,
    ) -> Result<ConciergeRequest, ConciergeServiceError> {
        let request = self.load(request_id)?;
        if request.user_id == session.user_id || session.role.is_staff() {
            Ok(request)
        } else {
            Err(ConciergeServiceError::Forbidden)
        }
    }

    fn publish_request(&self, kind: ChangeKind, request: &ConciergeRequest) {
        self.feed.publish(ChangeEvent {
            user_id: request.user_id.clone(),
            kind,
            record: ChangeRecord::Request(request.clone()),
        });
    }

    fn publish_message(
        &self,
        kind: ChangeKind,
        request: &ConciergeRequest,
        message: &ConciergeMessage,
    ) {
        self.feed.publish(ChangeEvent {
            user_id: request.user_id.clone(),
            kind,
            record: ChangeRecord::Message(message.clone()),
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConciergeServiceError {
    #[error(transparent)]
    Gating(#[from] GatingViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("concierge request {0} not found")]
    NotFound(RequestId),
    #[error("not permitted to access this concierge request")]
    Forbidden,
    #[error("cannot move request from {} to {}", from.label(), to.label())]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
    #[error("message content is required")]
    EmptyMessage,
}
