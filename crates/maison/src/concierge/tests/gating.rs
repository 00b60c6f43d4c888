use super::common::*;

use crate::concierge::domain::ServiceCategory;
use crate::concierge::gating::{CategoryGuard, GatingViolation};
use crate::concierge::repository::ConciergeRepository;
use crate::concierge::service::ConciergeServiceError;
use crate::membership::MembershipTier;

#[test]
fn higher_tiers_reach_every_lower_tier_category() {
    let guard = CategoryGuard;
    for tier in MembershipTier::ordered() {
        let session = member("gating-member", tier);
        for category in ServiceCategory::catalogue() {
            let allowed = guard.select(&session, category.id).is_ok();
            assert_eq!(
                allowed,
                tier >= category.min_tier,
                "{tier:?} selecting {}",
                category.id
            );
        }
    }
}

#[tokio::test]
async fn out_of_tier_category_is_rejected_at_selection_and_submission() {
    let (service, store, notifier) = build_service();
    let session = member("gold-member", MembershipTier::Gold);

    for category in ServiceCategory::catalogue()
        .into_iter()
        .filter(|category| category.min_tier > MembershipTier::Gold)
    {
        let selected = service.select_category(&session, category.id);
        assert!(matches!(
            selected,
            Err(ConciergeServiceError::Gating(GatingViolation::TierTooLow { .. }))
        ));

        // a client that skips selection still hits the same gate
        let submitted = service
            .submit(&session, submission(category.id, "Charter to Capri"))
            .await;
        match submitted {
            Err(ConciergeServiceError::Gating(GatingViolation::TierTooLow {
                required,
                current,
                ..
            })) => {
                assert_eq!(required, category.min_tier);
                assert_eq!(current, MembershipTier::Gold);
            }
            other => panic!("expected tier rejection, got {other:?}"),
        }
    }

    assert!(store
        .requests_for(&session.user_id)
        .expect("list")
        .is_empty());
    assert!(notifier.events().is_empty());
}

#[test]
fn availability_flags_follow_the_member_tier() {
    let session = member("silver-member", MembershipTier::Silver);
    let availability = CategoryGuard.availability(&session);

    assert_eq!(availability.len(), 9);
    let accessible: Vec<_> = availability
        .iter()
        .filter(|entry| entry.accessible)
        .map(|entry| entry.category.id)
        .collect();
    assert_eq!(accessible, vec!["dining", "travel"]);
}

#[tokio::test]
async fn blank_title_and_unknown_category_are_rejected() {
    let (service, _, _) = build_service();
    let session = member("black-member", MembershipTier::Black);

    assert!(matches!(
        service.submit(&session, submission("dining", "   ")).await,
        Err(ConciergeServiceError::Gating(GatingViolation::MissingTitle))
    ));
    assert!(matches!(
        service.select_category(&session, "space_tourism"),
        Err(ConciergeServiceError::Gating(GatingViolation::UnknownCategory(_)))
    ));
}
