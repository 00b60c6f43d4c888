//! Concierge requests: tier-gated intake, staff status transitions, message
//! threads and the realtime board that keeps a member's view current.

pub mod board;
pub mod domain;
pub(crate) mod gating;
pub mod notifier;
pub mod realtime;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use board::{spawn_board_sync, BoardEntry, RequestBoard};
pub use domain::{
    CategoryAvailability, ConciergeMessage, ConciergeRequest, MessageId, RequestId,
    RequestStatus, RequestSubmission, ServiceCategory,
};
pub use gating::{CategoryGuard, GatingViolation};
pub use notifier::{NotifyError, RequestNotifier};
pub use realtime::{
    ChangeEvent, ChangeFeed, ChangeKind, ChangeRecord, ChangeSubscription, Received, Table,
};
pub use repository::ConciergeRepository;
pub use router::concierge_router;
pub use service::{ConciergeService, ConciergeServiceError};
