use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{
    Event, EventDraft, EventId, EventListing, EventRsvp, EventStatus, RsvpAction, RsvpOutcome,
    RsvpStatus,
};
use super::repository::EventRepository;
use crate::membership::MembershipTier;
use crate::session::Session;
use crate::store::RepositoryError;

pub struct EventService<R> {
    repository: Arc<R>,
}

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> EventId {
    let id = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EventId(format!("evt-{id:06}"))
}

impl<R> EventService<R>
where
    R: EventRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Scheduled events from `now` onward, earliest first, annotated with the
    /// action available to this member.
    pub fn list_upcoming(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventListing>, EventServiceError> {
        let mut events: Vec<Event> = self
            .repository
            .events_from(now)?
            .into_iter()
            .filter(|event| event.status == EventStatus::Scheduled)
            .collect();
        events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));

        events
            .into_iter()
            .map(|event| {
                let confirmed = self.confirmed_count(&event.id)?;
                let existing = self.repository.rsvp_for(&event.id, &session.user_id)?;
                let action = match existing {
                    Some(rsvp) => RsvpAction::Attending {
                        status: rsvp.status,
                    },
                    None => match session.membership.upgrade_target(event.min_tier) {
                        Some(required_tier) => RsvpAction::UpgradeRequired {
                            required_tier,
                            current_tier: session.tier(),
                        },
                        None => RsvpAction::Rsvp,
                    },
                };

                Ok(EventListing {
                    spots_left: event.capacity.saturating_sub(confirmed),
                    confirmed,
                    action,
                    event,
                })
            })
            .collect()
    }

    /// Idempotent per (event, member): a repeat RSVP returns the existing row.
    pub fn rsvp(
        &self,
        session: &Session,
        event_id: &EventId,
        now: DateTime<Utc>,
    ) -> Result<RsvpOutcome, EventServiceError> {
        let event = self
            .repository
            .fetch_event(event_id)?
            .ok_or_else(|| EventServiceError::NotFound(event_id.clone()))?;

        if let Some(existing) = self.repository.rsvp_for(&event.id, &session.user_id)? {
            return Ok(RsvpOutcome {
                rsvp: existing,
                created: false,
            });
        }

        if event.status != EventStatus::Scheduled || event.starts_at < now {
            return Err(EventServiceError::NotOpen(event.id));
        }

        if !session.can_access_tier(event.min_tier) {
            return Err(EventServiceError::UpgradeRequired {
                required: event.min_tier,
                current: session.tier(),
            });
        }

        match self
            .repository
            .reserve_rsvp(&event.id, &session.user_id, event.capacity, now)
        {
            Ok(stored) => {
                info!(event = %stored.event_id, user = %stored.user_id, status = ?stored.status, "rsvp recorded");
                Ok(RsvpOutcome {
                    rsvp: stored,
                    created: true,
                })
            }
            // A concurrent RSVP won the unique constraint; report the row it wrote.
            Err(RepositoryError::Conflict) => {
                let existing = self
                    .repository
                    .rsvp_for(&event.id, &session.user_id)?
                    .ok_or(RepositoryError::Conflict)?;
                Ok(RsvpOutcome {
                    rsvp: existing,
                    created: false,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    pub fn create_event(
        &self,
        session: &Session,
        draft: EventDraft,
    ) -> Result<Event, EventServiceError> {
        if !session.role.is_admin() {
            return Err(EventServiceError::Forbidden);
        }

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(EventServiceError::InvalidDraft("title is required"));
        }
        if draft.capacity == 0 {
            return Err(EventServiceError::InvalidDraft(
                "capacity must be at least one",
            ));
        }

        let event = Event {
            id: next_event_id(),
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            location: draft.location.trim().to_string(),
            starts_at: draft.starts_at,
            capacity: draft.capacity,
            min_tier: draft.min_tier,
            status: EventStatus::Scheduled,
        };

        let stored = self.repository.insert_event(event)?;
        info!(event = %stored.id, min_tier = %stored.min_tier, "event created");
        Ok(stored)
    }

    pub fn rsvps_for(&self, session: &Session) -> Result<Vec<EventRsvp>, EventServiceError> {
        Ok(self.repository.rsvps_for_user(&session.user_id)?)
    }

    fn confirmed_count(&self, event_id: &EventId) -> Result<u32, EventServiceError> {
        let confirmed = self
            .repository
            .rsvps_for_event(event_id)?
            .iter()
            .filter(|rsvp| rsvp.status == RsvpStatus::Confirmed)
            .count();
        Ok(u32::try_from(confirmed).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("event {0} not found")]
    NotFound(EventId),
    #[error("event {0} is not accepting RSVPs")]
    NotOpen(EventId),
    #[error("event requires {required} membership (current tier {current})")]
    UpgradeRequired {
        required: MembershipTier,
        current: MembershipTier,
    },
    #[error("only administrators can create events")]
    Forbidden,
    #[error("invalid event: {0}")]
    InvalidDraft(&'static str),
}
