use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::membership::{MembershipTier, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Service category offered by the concierge desk, gated at a minimum tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceCategory {
    pub id: &'static str,
    pub label: &'static str,
    pub min_tier: MembershipTier,
}

impl ServiceCategory {
    const fn new(id: &'static str, label: &'static str, min_tier: MembershipTier) -> Self {
        Self {
            id,
            label,
            min_tier,
        }
    }

    pub const fn catalogue() -> [Self; 9] {
        [
            Self::new("dining", "Fine Dining Reservations", MembershipTier::Silver),
            Self::new("travel", "Travel Planning", MembershipTier::Silver),
            Self::new("wellness", "Wellness & Spa", MembershipTier::Gold),
            Self::new("events_access", "Event Access", MembershipTier::Gold),
            Self::new("personal_shopping", "Personal Shopping", MembershipTier::Gold),
            Self::new("real_estate", "Real Estate Advisory", MembershipTier::Platinum),
            Self::new("private_aviation", "Private Aviation", MembershipTier::Platinum),
            Self::new("yacht_charter", "Yacht Charter", MembershipTier::Platinum),
            Self::new("bespoke", "Bespoke Experiences", MembershipTier::Black),
        ]
    }

    pub fn find(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::catalogue()
            .into_iter()
            .find(|category| category.id.eq_ignore_ascii_case(id))
    }
}

/// Catalogue entry as presented to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAvailability {
    #[serde(flatten)]
    pub category: ServiceCategory,
    pub accessible: bool,
}

/// Request lifecycle. Transitions only move forward one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Submitted,
    InProgress,
    Completed,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Submitted => "submitted",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            RequestStatus::Submitted => Some(RequestStatus::InProgress),
            RequestStatus::InProgress => Some(RequestStatus::Completed),
            RequestStatus::Completed => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

/// Member-supplied payload for a new request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSubmission {
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preferred_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConciergeRequest {
    pub id: RequestId,
    pub user_id: UserId,
    pub category: String,
    pub title: String,
    pub description: String,
    pub preferred_date: Option<NaiveDate>,
    pub budget_range: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConciergeMessage {
    pub id: MessageId,
    pub request_id: RequestId,
    pub sender: UserId,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl ConciergeMessage {
    /// Unread from `viewer`'s point of view.
    pub fn is_unread_for(&self, viewer: &UserId) -> bool {
        !self.read && &self.sender != viewer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_forward_one_step_only() {
        assert!(RequestStatus::Submitted.can_transition_to(RequestStatus::InProgress));
        assert!(RequestStatus::InProgress.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Submitted.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Completed.can_transition_to(RequestStatus::InProgress));
        assert!(!RequestStatus::InProgress.can_transition_to(RequestStatus::InProgress));
    }

    #[test]
    fn catalogue_lookup_ignores_case() {
        let category = ServiceCategory::find(" Private_Aviation").expect("known category");
        assert_eq!(category.min_tier, MembershipTier::Platinum);
        assert!(ServiceCategory::find("helicopter").is_none());
    }
}
