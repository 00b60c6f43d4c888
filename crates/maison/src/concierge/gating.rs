use chrono::NaiveDate;

use super::domain::{CategoryAvailability, RequestSubmission, ServiceCategory};
use crate::membership::MembershipTier;
use crate::session::Session;

/// Validation errors raised while selecting a category or submitting a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatingViolation {
    #[error("unknown service category '{0}'")]
    UnknownCategory(String),
    #[error("{category} requires {required} membership (current tier {current})")]
    TierTooLow {
        category: &'static str,
        required: MembershipTier,
        current: MembershipTier,
    },
    #[error("request title is required")]
    MissingTitle,
}

/// Submission that passed every intake check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedSubmission {
    pub(crate) category: ServiceCategory,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) preferred_date: Option<NaiveDate>,
    pub(crate) budget_range: Option<String>,
}

/// Tier gate over the service catalogue, applied at selection and again at submission.
#[derive(Debug, Clone, Default)]
pub struct CategoryGuard;

impl CategoryGuard {
    pub fn availability(&self, session: &Session) -> Vec<CategoryAvailability> {
        ServiceCategory::catalogue()
            .into_iter()
            .map(|category| CategoryAvailability {
                accessible: session.can_access_tier(category.min_tier),
                category,
            })
            .collect()
    }

    pub fn select(
        &self,
        session: &Session,
        category_id: &str,
    ) -> Result<ServiceCategory, GatingViolation> {
        let category = ServiceCategory::find(category_id)
            .ok_or_else(|| GatingViolation::UnknownCategory(category_id.trim().to_string()))?;

        if !session.can_access_tier(category.min_tier) {
            return Err(GatingViolation::TierTooLow {
                category: category.id,
                required: category.min_tier,
                current: session.tier(),
            });
        }

        Ok(category)
    }

    pub(crate) fn validate(
        &self,
        session: &Session,
        submission: RequestSubmission,
    ) -> Result<ValidatedSubmission, GatingViolation> {
        let title = submission.title.trim();
        if title.is_empty() {
            return Err(GatingViolation::MissingTitle);
        }

        let category = self.select(session, &submission.category)?;

        let budget_range = submission
            .budget_range
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(ValidatedSubmission {
            category,
            title: title.to_string(),
            description: submission.description.trim().to_string(),
            preferred_date: submission.preferred_date,
            budget_range,
        })
    }
}
