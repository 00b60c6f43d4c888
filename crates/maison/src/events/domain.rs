use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::membership::{MembershipTier, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: u32,
    pub min_tier: MembershipTier,
    pub status: EventStatus,
}

/// Admin-supplied payload for a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: u32,
    pub min_tier: MembershipTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Confirmed,
    Waitlisted,
}

/// Confirmation row, unique per (event, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRsvp {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
}

/// What the member can do with an event listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RsvpAction {
    Rsvp,
    Attending {
        status: RsvpStatus,
    },
    /// RSVP hidden; the member is shown the tier to upgrade to instead.
    UpgradeRequired {
        required_tier: MembershipTier,
        current_tier: MembershipTier,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventListing {
    #[serde(flatten)]
    pub event: Event,
    pub confirmed: u32,
    pub spots_left: u32,
    pub action: RsvpAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsvpOutcome {
    pub rsvp: EventRsvp,
    /// `false` when the member had already responded and the existing row was returned.
    pub created: bool,
}
