//! Membership tiers and the resolver that turns a user id into a tier snapshot.

pub mod domain;
pub mod repository;
pub mod resolver;

pub use domain::{Membership, MembershipStatus, MembershipTier, UserId, UserRole};
pub use repository::MembershipRepository;
pub use resolver::{MembershipError, MembershipSnapshot, MembershipSource, TierResolver};
