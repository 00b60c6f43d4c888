use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an authenticated user, as issued by the hosted auth platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership level. Variants are declared in rank order so the derived
/// `Ord` agrees with `rank()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Silver,
    Gold,
    Platinum,
    Black,
}

impl MembershipTier {
    pub const fn ordered() -> [Self; 4] {
        [Self::Silver, Self::Gold, Self::Platinum, Self::Black]
    }

    pub const fn lowest() -> Self {
        Self::Silver
    }

    pub const fn rank(self) -> u8 {
        match self {
            Self::Silver => 0,
            Self::Gold => 1,
            Self::Platinum => 2,
            Self::Black => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Black => "Black",
        }
    }

    /// The tier a member would upgrade to next, `None` at the top.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => Some(Self::Black),
            Self::Black => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "platinum" => Some(Self::Platinum),
            "black" => Some(Self::Black),
            _ => None,
        }
    }

    /// `true` when a member holding `self` may use something gated at `required`.
    pub const fn satisfies(self, required: Self) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    PastDue,
    Cancelled,
}

/// Stored membership row. One active row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub tier: MembershipTier,
    pub status: MembershipStatus,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl Membership {
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        if self.status != MembershipStatus::Active {
            return false;
        }
        match self.current_period_end {
            Some(end) => end >= now,
            None => true,
        }
    }
}

/// Platform role used for staff and admin-only operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Member,
    Staff,
    Admin,
}

impl UserRole {
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}
