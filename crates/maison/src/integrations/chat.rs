use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::http::ApiClient;
use super::IntegrationError;
use crate::config::EndpointConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadSpec {
    pub request_id: String,
    pub member_id: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub sender: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Conversation channel between a member and the concierge team.
#[async_trait]
pub trait ConciergeChannel: Send + Sync {
    async fn create_thread(&self, spec: &ThreadSpec) -> Result<ThreadId, IntegrationError>;
    async fn send_message(
        &self,
        thread: &ThreadId,
        message: &ChannelMessage,
    ) -> Result<(), IntegrationError>;
    async fn update_status(&self, thread: &ThreadId, status: &str)
        -> Result<(), IntegrationError>;
    async fn list_messages(&self, thread: &ThreadId)
        -> Result<Vec<ChannelMessage>, IntegrationError>;
    async fn close_thread(&self, thread: &ThreadId) -> Result<(), IntegrationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockThread {
    pub spec: ThreadSpec,
    pub status: String,
    pub closed: bool,
    pub messages: Vec<ChannelMessage>,
}

#[derive(Default)]
pub struct MockConciergeChannel {
    threads: Mutex<BTreeMap<ThreadId, MockThread>>,
    sequence: AtomicU64,
}

impl MockConciergeChannel {
    pub fn thread(&self, id: &ThreadId) -> Option<MockThread> {
        self.threads
            .lock()
            .expect("channel mutex poisoned")
            .get(id)
            .cloned()
    }

    fn with_open_thread<T>(
        &self,
        id: &ThreadId,
        apply: impl FnOnce(&mut MockThread) -> T,
    ) -> Result<T, IntegrationError> {
        let mut threads = self.threads.lock().expect("channel mutex poisoned");
        match threads.get_mut(id) {
            Some(thread) if !thread.closed => Ok(apply(thread)),
            Some(_) => Err(IntegrationError::Rejected(format!("thread {} is closed", id.0))),
            None => Err(IntegrationError::Rejected(format!("thread {} not found", id.0))),
        }
    }
}

#[async_trait]
impl ConciergeChannel for MockConciergeChannel {
    async fn create_thread(&self, spec: &ThreadSpec) -> Result<ThreadId, IntegrationError> {
        let id = ThreadId(format!(
            "thread-{:04}",
            self.sequence.fetch_add(1, Ordering::Relaxed) + 1
        ));
        self.threads.lock().expect("channel mutex poisoned").insert(
            id.clone(),
            MockThread {
                spec: spec.clone(),
                status: "submitted".to_string(),
                closed: false,
                messages: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn send_message(
        &self,
        thread: &ThreadId,
        message: &ChannelMessage,
    ) -> Result<(), IntegrationError> {
        self.with_open_thread(thread, |open| open.messages.push(message.clone()))
    }

    async fn update_status(
        &self,
        thread: &ThreadId,
        status: &str,
    ) -> Result<(), IntegrationError> {
        self.with_open_thread(thread, |open| open.status = status.to_string())
    }

    async fn list_messages(
        &self,
        thread: &ThreadId,
    ) -> Result<Vec<ChannelMessage>, IntegrationError> {
        self.thread(thread)
            .map(|found| found.messages)
            .ok_or_else(|| IntegrationError::Rejected(format!("thread {} not found", thread.0)))
    }

    async fn close_thread(&self, thread: &ThreadId) -> Result<(), IntegrationError> {
        self.with_open_thread(thread, |open| open.closed = true)
    }
}

#[derive(Deserialize)]
struct CreatedThread {
    id: String,
}

#[derive(Deserialize)]
struct MessagePage {
    messages: Vec<ChannelMessage>,
}

pub struct HttpConciergeChannel {
    api: ApiClient,
}

impl HttpConciergeChannel {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            api: ApiClient::new("concierge chat", endpoint)?,
        })
    }
}

#[async_trait]
impl ConciergeChannel for HttpConciergeChannel {
    async fn create_thread(&self, spec: &ThreadSpec) -> Result<ThreadId, IntegrationError> {
        let request = self.api.request(Method::POST, "threads").json(spec);
        let created: CreatedThread = self.api.json(request).await?;
        Ok(ThreadId(created.id))
    }

    async fn send_message(
        &self,
        thread: &ThreadId,
        message: &ChannelMessage,
    ) -> Result<(), IntegrationError> {
        let request = self
            .api
            .request(Method::POST, &format!("threads/{}/messages", thread.0))
            .json(message);
        self.api.execute(request).await
    }

    async fn update_status(
        &self,
        thread: &ThreadId,
        status: &str,
    ) -> Result<(), IntegrationError> {
        let request = self
            .api
            .request(Method::PATCH, &format!("threads/{}", thread.0))
            .json(&serde_json::json!({ "status": status }));
        self.api.execute(request).await
    }

    async fn list_messages(
        &self,
        thread: &ThreadId,
    ) -> Result<Vec<ChannelMessage>, IntegrationError> {
        let request = self
            .api
            .request(Method::GET, &format!("threads/{}/messages", thread.0));
        let page: MessagePage = self.api.json(request).await?;
        Ok(page.messages)
    }

    async fn close_thread(&self, thread: &ThreadId) -> Result<(), IntegrationError> {
        let request = self
            .api
            .request(Method::POST, &format!("threads/{}/close", thread.0));
        self.api.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_threads_reject_new_messages() {
        let channel = MockConciergeChannel::default();
        let thread = channel
            .create_thread(&ThreadSpec {
                request_id: "req-1".to_string(),
                member_id: "member-1".to_string(),
                subject: "Dinner".to_string(),
            })
            .await
            .expect("thread created");

        let message = ChannelMessage {
            sender: "member-1".to_string(),
            content: "Window seat please".to_string(),
            sent_at: Utc::now(),
        };
        channel.send_message(&thread, &message).await.expect("sent");
        channel.close_thread(&thread).await.expect("closed");

        assert!(matches!(
            channel.send_message(&thread, &message).await,
            Err(IntegrationError::Rejected(_))
        ));
        assert_eq!(channel.list_messages(&thread).await.expect("listed").len(), 1);
    }
}
