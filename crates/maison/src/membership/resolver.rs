use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::domain::{MembershipStatus, MembershipTier, UserId, UserRole};
use super::repository::MembershipRepository;
use crate::store::RepositoryError;

/// Where a resolved tier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipSource {
    /// An active, unexpired membership row.
    Membership,
    /// No current row; the user is treated as the lowest tier.
    Default,
}

/// Resolved tier for one user at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipSnapshot {
    pub user_id: UserId,
    pub tier: MembershipTier,
    pub source: MembershipSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MembershipStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
}

impl MembershipSnapshot {
    pub fn lowest(user_id: UserId) -> Self {
        Self {
            user_id,
            tier: MembershipTier::lowest(),
            source: MembershipSource::Default,
            status: None,
            current_period_end: None,
        }
    }

    pub fn with_tier(user_id: UserId, tier: MembershipTier) -> Self {
        Self {
            user_id,
            tier,
            source: MembershipSource::Membership,
            status: Some(MembershipStatus::Active),
            current_period_end: None,
        }
    }

    pub fn can_access_tier(&self, required: MembershipTier) -> bool {
        self.tier.satisfies(required)
    }

    /// Tier the member must reach to use something gated at `required`.
    pub fn upgrade_target(&self, required: MembershipTier) -> Option<MembershipTier> {
        if self.can_access_tier(required) {
            None
        } else {
            Some(required)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("membership lookup failed for {user}: {source}")]
    Lookup {
        user: UserId,
        #[source]
        source: RepositoryError,
    },
}

/// Loads membership rows and answers tier questions.
///
/// A missing or lapsed row resolves to the lowest tier. A failed lookup is an
/// error: callers get an explicit failure instead of a silent downgrade.
pub struct TierResolver<R> {
    repository: Arc<R>,
}

impl<R> Clone for TierResolver<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R> TierResolver<R>
where
    R: MembershipRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn resolve(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<MembershipSnapshot, MembershipError> {
        let row = self
            .repository
            .active_membership(user)
            .map_err(|source| MembershipError::Lookup {
                user: user.clone(),
                source,
            })?;

        let snapshot = match row {
            Some(membership) if membership.is_current(now) => MembershipSnapshot {
                user_id: user.clone(),
                tier: membership.tier,
                source: MembershipSource::Membership,
                status: Some(membership.status),
                current_period_end: membership.current_period_end,
            },
            Some(membership) => {
                debug!(user = %user, status = ?membership.status, "membership not current, using lowest tier");
                MembershipSnapshot::lowest(user.clone())
            }
            None => MembershipSnapshot::lowest(user.clone()),
        };

        Ok(snapshot)
    }

    pub fn role(&self, user: &UserId) -> Result<UserRole, MembershipError> {
        self.repository
            .role(user)
            .map_err(|source| MembershipError::Lookup {
                user: user.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::domain::Membership;
    use crate::store::MemoryStore;
    use chrono::Duration;

    struct OfflineRepository;

    impl MembershipRepository for OfflineRepository {
        fn active_membership(
            &self,
            _user: &UserId,
        ) -> Result<Option<Membership>, RepositoryError> {
            Err(RepositoryError::Unavailable("database offline".to_string()))
        }

        fn role(&self, _user: &UserId) -> Result<UserRole, RepositoryError> {
            Err(RepositoryError::Unavailable("database offline".to_string()))
        }
    }

    fn store_with(tier: MembershipTier, status: MembershipStatus, days_left: i64) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.put_membership(Membership {
            user_id: UserId::new("member-1"),
            tier,
            status,
            current_period_end: Some(Utc::now() + Duration::days(days_left)),
        });
        store
    }

    #[test]
    fn resolves_active_membership() {
        let resolver = TierResolver::new(store_with(
            MembershipTier::Platinum,
            MembershipStatus::Active,
            30,
        ));
        let snapshot = resolver
            .resolve(&UserId::new("member-1"), Utc::now())
            .expect("resolves");
        assert_eq!(snapshot.tier, MembershipTier::Platinum);
        assert_eq!(snapshot.source, MembershipSource::Membership);
        assert!(snapshot.can_access_tier(MembershipTier::Gold));
        assert!(!snapshot.can_access_tier(MembershipTier::Black));
    }

    #[test]
    fn missing_membership_defaults_to_lowest_tier() {
        let resolver = TierResolver::new(Arc::new(MemoryStore::default()));
        let snapshot = resolver
            .resolve(&UserId::new("stranger"), Utc::now())
            .expect("resolves");
        assert_eq!(snapshot.tier, MembershipTier::Silver);
        assert_eq!(snapshot.source, MembershipSource::Default);
    }

    #[test]
    fn expired_membership_defaults_to_lowest_tier() {
        let resolver = TierResolver::new(store_with(
            MembershipTier::Black,
            MembershipStatus::Active,
            -2,
        ));
        let snapshot = resolver
            .resolve(&UserId::new("member-1"), Utc::now())
            .expect("resolves");
        assert_eq!(snapshot.tier, MembershipTier::Silver);
        assert_eq!(snapshot.source, MembershipSource::Default);
    }

    #[test]
    fn lookup_failure_is_reported_not_downgraded() {
        let resolver = TierResolver::new(Arc::new(OfflineRepository));
        match resolver.resolve(&UserId::new("member-1"), Utc::now()) {
            Err(MembershipError::Lookup { user, .. }) => assert_eq!(user.as_str(), "member-1"),
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn upgrade_target_names_required_tier() {
        let snapshot = MembershipSnapshot::with_tier(UserId::new("u"), MembershipTier::Gold);
        assert_eq!(snapshot.upgrade_target(MembershipTier::Silver), None);
        assert_eq!(
            snapshot.upgrade_target(MembershipTier::Black),
            Some(MembershipTier::Black)
        );
    }
}
