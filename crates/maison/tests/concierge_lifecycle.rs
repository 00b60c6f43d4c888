use std::sync::Arc;

use maison::concierge::{
    ChangeFeed, ConciergeService, ConciergeServiceError, RequestStatus, RequestSubmission,
};
use maison::integrations::crm::CrmCall;
use maison::integrations::{IntegrationNotifier, MockConciergeChannel, MockCrmClient};
use maison::membership::{MembershipTier, UserId, UserRole};
use maison::session::Session;
use maison::store::MemoryStore;

type Notifier = IntegrationNotifier<MockCrmClient, MockConciergeChannel>;

struct Desk {
    service: ConciergeService<MemoryStore, Notifier>,
    notifier: Arc<Notifier>,
    crm: Arc<MockCrmClient>,
    channel: Arc<MockConciergeChannel>,
}

fn desk() -> Desk {
    let crm = Arc::new(MockCrmClient::default());
    let channel = Arc::new(MockConciergeChannel::default());
    let notifier = Arc::new(IntegrationNotifier::new(crm.clone(), channel.clone()));
    let service = ConciergeService::new(
        Arc::new(MemoryStore::default()),
        notifier.clone(),
        ChangeFeed::default(),
    );
    Desk {
        service,
        notifier,
        crm,
        channel,
    }
}

fn platinum_member() -> Session {
    Session::member(UserId::new("member-platinum"), MembershipTier::Platinum)
}

fn staff() -> Session {
    Session::member(UserId::new("concierge-desk"), MembershipTier::Silver).with_role(UserRole::Staff)
}

fn charter() -> RequestSubmission {
    RequestSubmission {
        category: "yacht_charter".to_string(),
        title: "Week in the Exumas".to_string(),
        description: "Crewed motor yacht for six, late March".to_string(),
        preferred_date: None,
        budget_range: Some("$150k - $250k".to_string()),
    }
}

#[tokio::test]
async fn request_lifecycle_is_mirrored_to_crm_and_chat() {
    let desk = desk();
    let member = platinum_member();
    let staff = staff();

    let request = desk
        .service
        .submit(&member, charter())
        .await
        .expect("platinum members may charter");
    let thread = desk
        .notifier
        .thread_for(&request.id)
        .expect("thread opened on submission");

    desk.service
        .advance_status(&staff, &request.id, RequestStatus::InProgress)
        .await
        .expect("staff picks the request up");
    desk.service
        .post_message(&staff, &request.id, "Three yachts shortlisted, details inside.")
        .await
        .expect("staff replies");
    desk.service
        .post_message(&member, &request.id, "The second one, please.")
        .await
        .expect("member replies");

    let open = desk.channel.thread(&thread).expect("thread exists");
    assert_eq!(open.spec.member_id, "member-platinum");
    assert_eq!(open.status, "in_progress");
    assert_eq!(open.messages.len(), 2);
    assert!(!open.closed);

    desk.service
        .advance_status(&staff, &request.id, RequestStatus::Completed)
        .await
        .expect("staff completes the request");
    let closed = desk.channel.thread(&thread).expect("thread exists");
    assert_eq!(closed.status, "completed");
    assert!(closed.closed);

    let calls = desk.crm.calls();
    assert!(matches!(calls.first(), Some(CrmCall::UpsertContact(contact)) if contact.external_id == "member-platinum"));
    assert!(calls.iter().any(|call| matches!(
        call,
        CrmCall::CreateOpportunity(opportunity) if opportunity.pipeline_stage == "submitted"
    )));
    let last_status = calls.iter().rev().find_map(|call| match call {
        CrmCall::UpdateContact { fields, .. } => fields.get("last_request_status").cloned(),
        _ => None,
    });
    assert_eq!(last_status.as_deref(), Some("completed"));
}

#[tokio::test]
async fn messages_after_completion_are_stored_even_though_the_thread_is_closed() {
    let desk = desk();
    let member = platinum_member();
    let staff = staff();

    let request = desk.service.submit(&member, charter()).await.expect("submitted");
    for status in [RequestStatus::InProgress, RequestStatus::Completed] {
        desk.service
            .advance_status(&staff, &request.id, status)
            .await
            .expect("forward transition");
    }

    let message = desk
        .service
        .post_message(&member, &request.id, "Thank you, wonderful trip.")
        .await
        .expect("closed channel does not block the write");
    let thread = desk.service.thread(&staff, &request.id).expect("staff reads");
    assert_eq!(thread.last().map(|stored| &stored.id), Some(&message.id));
}

#[tokio::test]
async fn completed_requests_cannot_move_backwards() {
    let desk = desk();
    let member = platinum_member();
    let staff = staff();

    let request = desk.service.submit(&member, charter()).await.expect("submitted");
    let err = desk
        .service
        .advance_status(&staff, &request.id, RequestStatus::Completed)
        .await
        .expect_err("cannot skip in_progress");
    assert!(matches!(
        err,
        ConciergeServiceError::InvalidTransition {
            from: RequestStatus::Submitted,
            to: RequestStatus::Completed
        }
    ));
}

#[tokio::test]
async fn gold_members_cannot_book_a_charter() {
    let desk = desk();
    let gold = Session::member(UserId::new("member-gold"), MembershipTier::Gold);

    let err = desk
        .service
        .submit(&gold, charter())
        .await
        .expect_err("yacht charter is a platinum category");

    assert!(matches!(err, ConciergeServiceError::Gating(_)));
    assert!(desk.crm.calls().is_empty());
}
