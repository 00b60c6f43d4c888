//! In-process change feed standing in for the hosted platform's realtime
//! channel. Events are scoped by table and by the user owning the row.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

use super::domain::{ConciergeMessage, ConciergeRequest};
use crate::membership::UserId;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    ConciergeRequests,
    ConciergeMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "row", rename_all = "snake_case")]
pub enum ChangeRecord {
    Request(ConciergeRequest),
    Message(ConciergeMessage),
}

impl ChangeRecord {
    pub fn table(&self) -> Table {
        match self {
            ChangeRecord::Request(_) => Table::ConciergeRequests,
            ChangeRecord::Message(_) => Table::ConciergeMessages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// Owner of the request the row belongs to.
    pub user_id: UserId,
    pub kind: ChangeKind,
    pub record: ChangeRecord,
}

impl ChangeEvent {
    pub fn table(&self) -> Table {
        self.record.table()
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }
}

impl ChangeFeed {
    pub fn publish(&self, event: ChangeEvent) {
        // No subscribers is the normal state for a fresh service.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self, user_id: UserId, tables: &[Table]) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            user_id,
            tables: tables.to_vec(),
        }
    }
}

/// What a subscriber gets back from [`ChangeSubscription::recv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Change(ChangeEvent),
    /// Events were dropped because the subscriber fell behind; local state must be reloaded.
    Lagged(u64),
    Closed,
}

pub struct ChangeSubscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    user_id: UserId,
    tables: Vec<Table>,
}

impl ChangeSubscription {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub async fn recv(&mut self) -> Received {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if event.user_id == self.user_id && self.tables.contains(&event.table()) {
                        return Received::Change(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(user = %self.user_id, skipped, "change subscription lagged");
                    return Received::Lagged(skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return Received::Closed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concierge::domain::{RequestId, RequestStatus};
    use chrono::Utc;

    fn request_for(user: &str, id: &str) -> ConciergeRequest {
        let now = Utc::now();
        ConciergeRequest {
            id: RequestId(id.to_string()),
            user_id: UserId::new(user),
            category: "dining".to_string(),
            title: "Table for two".to_string(),
            description: String::new(),
            preferred_date: None,
            budget_range: None,
            status: RequestStatus::Submitted,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn subscription_filters_by_user_and_table() {
        let feed = ChangeFeed::default();
        let mut subscription =
            feed.subscribe(UserId::new("member-1"), &[Table::ConciergeRequests]);

        feed.publish(ChangeEvent {
            user_id: UserId::new("member-2"),
            kind: ChangeKind::Insert,
            record: ChangeRecord::Request(request_for("member-2", "req-a")),
        });
        feed.publish(ChangeEvent {
            user_id: UserId::new("member-1"),
            kind: ChangeKind::Insert,
            record: ChangeRecord::Request(request_for("member-1", "req-b")),
        });

        match subscription.recv().await {
            Received::Change(event) => match event.record {
                ChangeRecord::Request(request) => assert_eq!(request.id.0, "req-b"),
                other => panic!("unexpected record {other:?}"),
            },
            other => panic!("expected change, got {other:?}"),
        }
    }
}
