use async_trait::async_trait;

use super::domain::{ConciergeMessage, ConciergeRequest};

/// Outbound hooks fired after concierge writes (CRM sync, concierge chat SDK).
#[async_trait]
pub trait RequestNotifier: Send + Sync {
    async fn request_created(&self, request: &ConciergeRequest) -> Result<(), NotifyError>;
    async fn status_changed(&self, request: &ConciergeRequest) -> Result<(), NotifyError>;
    async fn message_posted(
        &self,
        request: &ConciergeRequest,
        message: &ConciergeMessage,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
