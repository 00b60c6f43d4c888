use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::concierge::{
    ConciergeMessage, ConciergeRepository, ConciergeRequest, MessageId, RequestId, RequestStatus,
};
use crate::events::{Event, EventId, EventRepository, EventRsvp, RsvpStatus};
use crate::marketplace::{CatalogItem, CatalogRepository};
use crate::membership::{Membership, MembershipRepository, UserId, UserRole};
use crate::properties::{Property, PropertyFilters, PropertyId, PropertyRepository};

/// Mutex-guarded tables backing every repository trait.
#[derive(Default)]
pub struct MemoryStore {
    memberships: Mutex<HashMap<UserId, Membership>>,
    roles: Mutex<HashMap<UserId, UserRole>>,
    requests: Mutex<BTreeMap<RequestId, ConciergeRequest>>,
    messages: Mutex<Vec<ConciergeMessage>>,
    events: Mutex<BTreeMap<EventId, Event>>,
    rsvps: Mutex<Vec<EventRsvp>>,
    properties: Mutex<Vec<Property>>,
    catalog: Mutex<Vec<CatalogItem>>,
}

impl MemoryStore {
    /// Replaces the user's membership row.
    pub fn put_membership(&self, membership: Membership) {
        let mut guard = self.memberships.lock().expect("membership mutex poisoned");
        guard.insert(membership.user_id.clone(), membership);
    }

    pub fn put_role(&self, user: UserId, role: UserRole) {
        let mut guard = self.roles.lock().expect("role mutex poisoned");
        guard.insert(user, role);
    }
}

impl MembershipRepository for MemoryStore {
    fn active_membership(&self, user: &UserId) -> Result<Option<Membership>, RepositoryError> {
        let guard = self.memberships.lock().expect("membership mutex poisoned");
        Ok(guard.get(user).cloned())
    }

    fn role(&self, user: &UserId) -> Result<UserRole, RepositoryError> {
        let guard = self.roles.lock().expect("role mutex poisoned");
        Ok(guard.get(user).copied().unwrap_or(UserRole::Member))
    }
}

impl ConciergeRepository for MemoryStore {
    fn insert_request(
        &self,
        request: ConciergeRequest,
    ) -> Result<ConciergeRequest, RepositoryError> {
        let mut guard = self.requests.lock().expect("request mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update_request(
        &self,
        expected: RequestStatus,
        request: ConciergeRequest,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.requests.lock().expect("request mutex poisoned");
        match guard.get_mut(&request.id) {
            Some(slot) if slot.status == expected => {
                *slot = request;
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_request(&self, id: &RequestId) -> Result<Option<ConciergeRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("request mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn requests_for(&self, user: &UserId) -> Result<Vec<ConciergeRequest>, RepositoryError> {
        let guard = self.requests.lock().expect("request mutex poisoned");
        let mut requests: Vec<_> = guard
            .values()
            .filter(|request| &request.user_id == user)
            .cloned()
            .collect();
        requests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(requests)
    }

    fn insert_message(
        &self,
        message: ConciergeMessage,
    ) -> Result<ConciergeMessage, RepositoryError> {
        if !self
            .requests
            .lock()
            .expect("request mutex poisoned")
            .contains_key(&message.request_id)
        {
            return Err(RepositoryError::NotFound);
        }
        let mut guard = self.messages.lock().expect("message mutex poisoned");
        if guard.iter().any(|existing| existing.id == message.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(message.clone());
        Ok(message)
    }

    fn messages_for(&self, request: &RequestId) -> Result<Vec<ConciergeMessage>, RepositoryError> {
        let guard = self.messages.lock().expect("message mutex poisoned");
        let mut messages: Vec<_> = guard
            .iter()
            .filter(|message| &message.request_id == request)
            .cloned()
            .collect();
        // stable, so equal timestamps keep append order
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }

    fn mark_read(
        &self,
        request: &RequestId,
        viewer: &UserId,
    ) -> Result<Vec<MessageId>, RepositoryError> {
        let mut guard = self.messages.lock().expect("message mutex poisoned");
        let mut changed = Vec::new();
        for message in guard
            .iter_mut()
            .filter(|message| &message.request_id == request)
        {
            if message.is_unread_for(viewer) {
                message.read = true;
                changed.push(message.id.clone());
            }
        }
        Ok(changed)
    }
}

impl EventRepository for MemoryStore {
    fn insert_event(&self, event: Event) -> Result<Event, RepositoryError> {
        let mut guard = self.events.lock().expect("event mutex poisoned");
        if guard.contains_key(&event.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError> {
        let guard = self.events.lock().expect("event mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn events_from(&self, from: DateTime<Utc>) -> Result<Vec<Event>, RepositoryError> {
        let guard = self.events.lock().expect("event mutex poisoned");
        let mut events: Vec<_> = guard
            .values()
            .filter(|event| event.starts_at >= from)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.starts_at);
        Ok(events)
    }

    fn reserve_rsvp(
        &self,
        event: &EventId,
        user: &UserId,
        capacity: u32,
        at: DateTime<Utc>,
    ) -> Result<EventRsvp, RepositoryError> {
        let mut guard = self.rsvps.lock().expect("rsvp mutex poisoned");
        let mut confirmed: u32 = 0;
        for row in guard.iter().filter(|row| &row.event_id == event) {
            if &row.user_id == user {
                return Err(RepositoryError::Conflict);
            }
            if row.status == RsvpStatus::Confirmed {
                confirmed = confirmed.saturating_add(1);
            }
        }

        let rsvp = EventRsvp {
            event_id: event.clone(),
            user_id: user.clone(),
            status: if confirmed < capacity {
                RsvpStatus::Confirmed
            } else {
                RsvpStatus::Waitlisted
            },
            created_at: at,
        };
        guard.push(rsvp.clone());
        Ok(rsvp)
    }

    fn rsvp_for(
        &self,
        event: &EventId,
        user: &UserId,
    ) -> Result<Option<EventRsvp>, RepositoryError> {
        let guard = self.rsvps.lock().expect("rsvp mutex poisoned");
        Ok(guard
            .iter()
            .find(|row| &row.event_id == event && &row.user_id == user)
            .cloned())
    }

    fn rsvps_for_event(&self, event: &EventId) -> Result<Vec<EventRsvp>, RepositoryError> {
        let guard = self.rsvps.lock().expect("rsvp mutex poisoned");
        Ok(guard
            .iter()
            .filter(|row| &row.event_id == event)
            .cloned()
            .collect())
    }

    fn rsvps_for_user(&self, user: &UserId) -> Result<Vec<EventRsvp>, RepositoryError> {
        let guard = self.rsvps.lock().expect("rsvp mutex poisoned");
        Ok(guard
            .iter()
            .filter(|row| &row.user_id == user)
            .cloned()
            .collect())
    }
}

impl PropertyRepository for MemoryStore {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.properties.lock().expect("property mutex poisoned");
        if guard.iter().any(|existing| existing.id == property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(property.clone());
        Ok(property)
    }

    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.properties.lock().expect("property mutex poisoned");
        Ok(guard.iter().find(|property| &property.id == id).cloned())
    }

    fn search_properties(
        &self,
        filters: &PropertyFilters,
    ) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.properties.lock().expect("property mutex poisoned");
        let matching = guard.iter().filter(|property| filters.matches(property));
        Ok(match filters.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }
}

impl CatalogRepository for MemoryStore {
    fn find_by_title(&self, title: &str) -> Result<Option<CatalogItem>, RepositoryError> {
        let guard = self.catalog.lock().expect("catalog mutex poisoned");
        Ok(guard.iter().find(|item| item.title == title).cloned())
    }

    fn insert_item(&self, item: CatalogItem) -> Result<CatalogItem, RepositoryError> {
        let mut guard = self.catalog.lock().expect("catalog mutex poisoned");
        if guard.iter().any(|existing| existing.id == item.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(item.clone());
        Ok(item)
    }

    fn update_item(&self, item: CatalogItem) -> Result<(), RepositoryError> {
        let mut guard = self.catalog.lock().expect("catalog mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == item.id) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn list_items(&self, category: Option<&str>) -> Result<Vec<CatalogItem>, RepositoryError> {
        let guard = self.catalog.lock().expect("catalog mutex poisoned");
        let mut items: Vec<_> = guard
            .iter()
            .filter(|item| category.map_or(true, |category| item.category == category))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(id: &str, user: &str, minutes_ago: i64) -> ConciergeRequest {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        ConciergeRequest {
            id: RequestId(id.to_string()),
            user_id: UserId::new(user),
            category: "dining".to_string(),
            title: "Table for two".to_string(),
            description: String::new(),
            preferred_date: None,
            budget_range: None,
            status: RequestStatus::Submitted,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn requests_are_scoped_to_owner_and_newest_first() {
        let store = MemoryStore::default();
        store.insert_request(request("r1", "ava", 30)).expect("insert");
        store.insert_request(request("r2", "ava", 5)).expect("insert");
        store.insert_request(request("r3", "ben", 1)).expect("insert");

        let ids: Vec<_> = store
            .requests_for(&UserId::new("ava"))
            .expect("list")
            .into_iter()
            .map(|request| request.id.0)
            .collect();
        assert_eq!(ids, vec!["r2".to_string(), "r1".to_string()]);
    }

    #[test]
    fn update_request_rejects_a_stale_status() {
        let store = MemoryStore::default();
        store.insert_request(request("r1", "ava", 5)).expect("insert");

        let mut accepted = request("r1", "ava", 5);
        accepted.status = RequestStatus::InProgress;
        store
            .update_request(RequestStatus::Submitted, accepted.clone())
            .expect("first transition");

        let mut stale = request("r1", "ava", 5);
        stale.status = RequestStatus::Completed;
        assert_eq!(
            store.update_request(RequestStatus::Submitted, stale),
            Err(RepositoryError::Conflict)
        );
        assert_eq!(
            store
                .fetch_request(&RequestId("r1".to_string()))
                .expect("fetch")
                .map(|row| row.status),
            Some(RequestStatus::InProgress)
        );
        assert_eq!(
            store.update_request(RequestStatus::Submitted, request("missing", "ava", 1)),
            Err(RepositoryError::NotFound)
        );
    }

    #[test]
    fn messages_require_an_existing_request() {
        let store = MemoryStore::default();
        let orphan = ConciergeMessage {
            id: MessageId("m1".to_string()),
            request_id: RequestId("missing".to_string()),
            sender: UserId::new("ava"),
            content: "hello".to_string(),
            read: false,
            created_at: Utc::now(),
        };
        assert_eq!(store.insert_message(orphan), Err(RepositoryError::NotFound));
    }

    #[test]
    fn reserve_rsvp_waitlists_past_capacity_and_rejects_duplicates() {
        let store = MemoryStore::default();
        let event = EventId("evt-1".to_string());
        let now = Utc::now();

        let first = store
            .reserve_rsvp(&event, &UserId::new("ava"), 1, now)
            .expect("first");
        let second = store
            .reserve_rsvp(&event, &UserId::new("ben"), 1, now)
            .expect("second");
        assert_eq!(first.status, RsvpStatus::Confirmed);
        assert_eq!(second.status, RsvpStatus::Waitlisted);

        assert_eq!(
            store.reserve_rsvp(&event, &UserId::new("ava"), 5, now),
            Err(RepositoryError::Conflict)
        );
        assert_eq!(store.rsvps_for_event(&event).expect("rsvps").len(), 2);
    }

    #[test]
    fn unknown_users_default_to_member_role() {
        let store = MemoryStore::default();
        assert_eq!(
            store.role(&UserId::new("stranger")).expect("lookup"),
            UserRole::Member
        );
    }
}
