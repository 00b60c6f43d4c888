use super::domain::{ConciergeMessage, ConciergeRequest, MessageId, RequestId, RequestStatus};
use crate::membership::UserId;
use crate::store::RepositoryError;

/// Storage for requests and their message threads.
pub trait ConciergeRepository: Send + Sync {
    fn insert_request(&self, request: ConciergeRequest)
        -> Result<ConciergeRequest, RepositoryError>;
    /// Replaces the stored row only while its status is still `expected`; a row that has
    /// moved on yields [`RepositoryError::Conflict`].
    fn update_request(
        &self,
        expected: RequestStatus,
        request: ConciergeRequest,
    ) -> Result<(), RepositoryError>;
    fn fetch_request(&self, id: &RequestId) -> Result<Option<ConciergeRequest>, RepositoryError>;
    /// Requests owned by `user`, newest first.
    fn requests_for(&self, user: &UserId) -> Result<Vec<ConciergeRequest>, RepositoryError>;

    fn insert_message(&self, message: ConciergeMessage)
        -> Result<ConciergeMessage, RepositoryError>;
    /// Messages on a request ordered by creation time.
    fn messages_for(&self, request: &RequestId) -> Result<Vec<ConciergeMessage>, RepositoryError>;
    /// Flag every message on `request` not sent by `viewer` as read, returning the ids changed.
    fn mark_read(
        &self,
        request: &RequestId,
        viewer: &UserId,
    ) -> Result<Vec<MessageId>, RepositoryError>;
}
