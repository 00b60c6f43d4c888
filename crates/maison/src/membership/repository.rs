use super::domain::{Membership, UserId, UserRole};
use crate::store::RepositoryError;

/// Read access to membership rows and platform roles.
pub trait MembershipRepository: Send + Sync {
    /// The user's active membership row, if any.
    fn active_membership(&self, user: &UserId) -> Result<Option<Membership>, RepositoryError>;
    fn role(&self, user: &UserId) -> Result<UserRole, RepositoryError>;
}
