//! Member events with tier-gated, idempotent RSVPs.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Event, EventDraft, EventId, EventListing, EventRsvp, EventStatus, RsvpAction, RsvpOutcome,
    RsvpStatus,
};
pub use repository::EventRepository;
pub use router::event_router;
pub use service::{EventService, EventServiceError};
