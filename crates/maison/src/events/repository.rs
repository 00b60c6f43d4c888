use chrono::{DateTime, Utc};

use super::domain::{Event, EventId, EventRsvp};
use crate::membership::UserId;
use crate::store::RepositoryError;

pub trait EventRepository: Send + Sync {
    fn insert_event(&self, event: Event) -> Result<Event, RepositoryError>;
    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError>;
    /// Events starting at or after `from`, earliest first.
    fn events_from(&self, from: DateTime<Utc>) -> Result<Vec<Event>, RepositoryError>;

    /// Counts confirmed rows and writes the new one in a single step: `confirmed` while
    /// fewer than `capacity` are confirmed, `waitlisted` after. Fails with
    /// [`RepositoryError::Conflict`] when the (event, user) pair already exists.
    fn reserve_rsvp(
        &self,
        event: &EventId,
        user: &UserId,
        capacity: u32,
        at: DateTime<Utc>,
    ) -> Result<EventRsvp, RepositoryError>;
    fn rsvp_for(
        &self,
        event: &EventId,
        user: &UserId,
    ) -> Result<Option<EventRsvp>, RepositoryError>;
    fn rsvps_for_event(&self, event: &EventId) -> Result<Vec<EventRsvp>, RepositoryError>;
    fn rsvps_for_user(&self, user: &UserId) -> Result<Vec<EventRsvp>, RepositoryError>;
}
