use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::domain::{ConciergeMessage, ConciergeRequest, MessageId, RequestId};
use super::realtime::{ChangeEvent, ChangeRecord, ChangeSubscription, Received};
use crate::membership::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    pub request: ConciergeRequest,
    unread_ids: BTreeSet<MessageId>,
}

impl BoardEntry {
    fn new(request: ConciergeRequest) -> Self {
        Self {
            request,
            unread_ids: BTreeSet::new(),
        }
    }

    pub fn unread(&self) -> usize {
        self.unread_ids.len()
    }
}

/// A member's requests and unread counts, kept current by applying change
/// events keyed by row id rather than refetching the whole list.
#[derive(Debug, Clone)]
pub struct RequestBoard {
    viewer: UserId,
    entries: BTreeMap<RequestId, BoardEntry>,
    stale: bool,
}

impl RequestBoard {
    pub fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            entries: BTreeMap::new(),
            stale: false,
        }
    }

    /// Replace the board contents with a full snapshot.
    pub fn reload(&mut self, requests: Vec<ConciergeRequest>, messages: &[ConciergeMessage]) {
        self.entries = requests
            .into_iter()
            .map(|request| (request.id.clone(), BoardEntry::new(request)))
            .collect();
        for message in messages {
            self.track_message(message);
        }
        self.stale = false;
    }

    /// Apply one change; returns whether the board changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        if event.user_id != self.viewer {
            return false;
        }

        match &event.record {
            ChangeRecord::Request(request) => {
                match self.entries.get_mut(&request.id) {
                    Some(entry) if entry.request == *request => return false,
                    Some(entry) => entry.request = request.clone(),
                    None => {
                        self.entries
                            .insert(request.id.clone(), BoardEntry::new(request.clone()));
                    }
                }
                true
            }
            ChangeRecord::Message(message) => self.track_message(message),
        }
    }

    fn track_message(&mut self, message: &ConciergeMessage) -> bool {
        let Some(entry) = self.entries.get_mut(&message.request_id) else {
            return false;
        };

        if message.is_unread_for(&self.viewer) {
            entry.unread_ids.insert(message.id.clone())
        } else {
            entry.unread_ids.remove(&message.id)
        }
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// `true` after events were missed; the owner should call [`reload`](Self::reload).
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn entry(&self, id: &RequestId) -> Option<&BoardEntry> {
        self.entries.get(id)
    }

    pub fn total_unread(&self) -> usize {
        self.entries.values().map(BoardEntry::unread).sum()
    }

    /// Entries newest first.
    pub fn entries(&self) -> Vec<&BoardEntry> {
        let mut entries: Vec<&BoardEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
        entries
    }
}

/// Apply events from `subscription` to `board` until `token` is cancelled or
/// the feed closes. Nothing is applied once cancellation is observed.
pub fn spawn_board_sync(
    mut subscription: ChangeSubscription,
    board: Arc<Mutex<RequestBoard>>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                received = subscription.recv() => received,
            };

            let event = match received {
                Received::Change(event) => event,
                Received::Lagged(_) => {
                    board.lock().expect("board mutex poisoned").mark_stale();
                    continue;
                }
                Received::Closed => break,
            };

            let changed = board.lock().expect("board mutex poisoned").apply(&event);
            if changed {
                debug!(user = %subscription.user_id(), table = ?event.table(), "board updated");
            }
        }
    })
}
