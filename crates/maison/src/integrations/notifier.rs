use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::chat::{ChannelMessage, ConciergeChannel, ThreadId, ThreadSpec};
use super::crm::{ContactId, CrmClient, CrmContact, Opportunity};
use super::IntegrationError;
use crate::concierge::{
    ConciergeMessage, ConciergeRequest, NotifyError, RequestId, RequestNotifier, RequestStatus,
};
use crate::membership::UserId;

/// Mirrors concierge activity into the CRM pipeline and the concierge chat channel.
pub struct IntegrationNotifier<C: ?Sized, H: ?Sized> {
    crm: Arc<C>,
    channel: Arc<H>,
    contacts: Mutex<HashMap<UserId, ContactId>>,
    threads: Mutex<HashMap<RequestId, ThreadId>>,
}

impl<C, H> IntegrationNotifier<C, H>
where
    C: CrmClient + ?Sized,
    H: ConciergeChannel + ?Sized,
{
    pub fn new(crm: Arc<C>, channel: Arc<H>) -> Self {
        Self {
            crm,
            channel,
            contacts: Mutex::new(HashMap::new()),
            threads: Mutex::new(HashMap::new()),
        }
    }

    pub fn thread_for(&self, request: &RequestId) -> Option<ThreadId> {
        self.threads
            .lock()
            .expect("thread map mutex poisoned")
            .get(request)
            .cloned()
    }

    fn contact_for(&self, user: &UserId) -> Option<ContactId> {
        self.contacts
            .lock()
            .expect("contact map mutex poisoned")
            .get(user)
            .cloned()
    }
}

fn notify_error(err: IntegrationError) -> NotifyError {
    NotifyError::Transport(err.to_string())
}

#[async_trait]
impl<C, H> RequestNotifier for IntegrationNotifier<C, H>
where
    C: CrmClient + ?Sized,
    H: ConciergeChannel + ?Sized,
{
    async fn request_created(&self, request: &ConciergeRequest) -> Result<(), NotifyError> {
        let contact = self
            .crm
            .upsert_contact(&CrmContact {
                external_id: request.user_id.to_string(),
                tags: vec!["concierge".to_string(), request.category.clone()],
            })
            .await
            .map_err(notify_error)?;
        self.contacts
            .lock()
            .expect("contact map mutex poisoned")
            .insert(request.user_id.clone(), contact.clone());

        self.crm
            .create_opportunity(&Opportunity {
                contact_id: contact,
                name: request.title.clone(),
                pipeline_stage: request.status.label().to_string(),
                notes: request.budget_range.clone(),
            })
            .await
            .map_err(notify_error)?;

        let thread = self
            .channel
            .create_thread(&ThreadSpec {
                request_id: request.id.to_string(),
                member_id: request.user_id.to_string(),
                subject: request.title.clone(),
            })
            .await
            .map_err(notify_error)?;
        debug!(request_id = %request.id, thread = %thread.0, "concierge thread opened");
        self.threads
            .lock()
            .expect("thread map mutex poisoned")
            .insert(request.id.clone(), thread);

        Ok(())
    }

    async fn status_changed(&self, request: &ConciergeRequest) -> Result<(), NotifyError> {
        let status = request.status.label();

        if let Some(thread) = self.thread_for(&request.id) {
            self.channel
                .update_status(&thread, status)
                .await
                .map_err(notify_error)?;
            if request.status == RequestStatus::Completed {
                self.channel
                    .close_thread(&thread)
                    .await
                    .map_err(notify_error)?;
            }
        }

        if let Some(contact) = self.contact_for(&request.user_id) {
            let fields = BTreeMap::from([
                ("last_request".to_string(), request.id.to_string()),
                ("last_request_status".to_string(), status.to_string()),
            ]);
            self.crm
                .update_contact(&contact, &fields)
                .await
                .map_err(notify_error)?;
        }

        Ok(())
    }

    async fn message_posted(
        &self,
        request: &ConciergeRequest,
        message: &ConciergeMessage,
    ) -> Result<(), NotifyError> {
        let Some(thread) = self.thread_for(&request.id) else {
            return Err(NotifyError::Transport(format!(
                "no concierge thread for request {}",
                request.id
            )));
        };

        self.channel
            .send_message(
                &thread,
                &ChannelMessage {
                    sender: message.sender.to_string(),
                    content: message.content.clone(),
                    sent_at: message.created_at,
                },
            )
            .await
            .map_err(notify_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::chat::MockConciergeChannel;
    use crate::integrations::crm::{CrmCall, MockCrmClient};
    use crate::concierge::MessageId;
    use chrono::Utc;

    fn request(status: RequestStatus) -> ConciergeRequest {
        let now = Utc::now();
        ConciergeRequest {
            id: RequestId("req-900001".to_string()),
            user_id: UserId::new("member-42"),
            category: "yacht_charter".to_string(),
            title: "Week in the Grenadines".to_string(),
            description: String::new(),
            preferred_date: None,
            budget_range: Some("$150k-$200k".to_string()),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn lifecycle_reaches_crm_and_channel() {
        let crm = Arc::new(MockCrmClient::default());
        let channel = Arc::new(MockConciergeChannel::default());
        let notifier = IntegrationNotifier::new(Arc::clone(&crm), Arc::clone(&channel));

        notifier
            .request_created(&request(RequestStatus::Submitted))
            .await
            .expect("created");
        let thread = notifier
            .thread_for(&RequestId("req-900001".to_string()))
            .expect("thread mapped");

        let message = ConciergeMessage {
            id: MessageId("msg-1".to_string()),
            request_id: RequestId("req-900001".to_string()),
            sender: UserId::new("member-42"),
            content: "Crew of six".to_string(),
            read: false,
            created_at: Utc::now(),
        };
        notifier
            .message_posted(&request(RequestStatus::Submitted), &message)
            .await
            .expect("posted");
        notifier
            .status_changed(&request(RequestStatus::Completed))
            .await
            .expect("status synced");

        let mirrored = channel.thread(&thread).expect("thread exists");
        assert_eq!(mirrored.messages.len(), 1);
        assert_eq!(mirrored.status, "completed");
        assert!(mirrored.closed);

        let calls = crm.calls();
        assert!(matches!(calls[0], CrmCall::UpsertContact(_)));
        assert!(matches!(calls[1], CrmCall::CreateOpportunity(_)));
        assert!(matches!(calls[2], CrmCall::UpdateContact { .. }));
    }
}
