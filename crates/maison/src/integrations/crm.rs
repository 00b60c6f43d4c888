use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::http::ApiClient;
use super::IntegrationError;
use crate::config::EndpointConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpportunityId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrmContact {
    /// Platform user id, used by the CRM as the dedupe key.
    pub external_id: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Opportunity {
    pub contact_id: ContactId,
    pub name: String,
    pub pipeline_stage: String,
    pub notes: Option<String>,
}

/// CRM contact and pipeline sync.
#[async_trait]
pub trait CrmClient: Send + Sync {
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<ContactId, IntegrationError>;
    async fn update_contact(
        &self,
        contact: &ContactId,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), IntegrationError>;
    async fn create_opportunity(
        &self,
        opportunity: &Opportunity,
    ) -> Result<OpportunityId, IntegrationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmCall {
    UpsertContact(CrmContact),
    UpdateContact {
        contact: ContactId,
        fields: BTreeMap<String, String>,
    },
    CreateOpportunity(Opportunity),
}

/// Records every call and answers with deterministic ids.
#[derive(Default)]
pub struct MockCrmClient {
    calls: Mutex<Vec<CrmCall>>,
    contacts: Mutex<BTreeMap<String, ContactId>>,
    sequence: AtomicU64,
}

impl MockCrmClient {
    pub fn calls(&self) -> Vec<CrmCall> {
        self.calls.lock().expect("crm mutex poisoned").clone()
    }

    fn record(&self, call: CrmCall) {
        self.calls.lock().expect("crm mutex poisoned").push(call);
    }

    fn next(&self, prefix: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{id:04}")
    }
}

#[async_trait]
impl CrmClient for MockCrmClient {
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<ContactId, IntegrationError> {
        self.record(CrmCall::UpsertContact(contact.clone()));
        let mut contacts = self.contacts.lock().expect("crm mutex poisoned");
        if let Some(existing) = contacts.get(&contact.external_id) {
            return Ok(existing.clone());
        }
        let id = ContactId(self.next("contact"));
        contacts.insert(contact.external_id.clone(), id.clone());
        Ok(id)
    }

    async fn update_contact(
        &self,
        contact: &ContactId,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), IntegrationError> {
        self.record(CrmCall::UpdateContact {
            contact: contact.clone(),
            fields: fields.clone(),
        });
        Ok(())
    }

    async fn create_opportunity(
        &self,
        opportunity: &Opportunity,
    ) -> Result<OpportunityId, IntegrationError> {
        self.record(CrmCall::CreateOpportunity(opportunity.clone()));
        Ok(OpportunityId(self.next("opp")))
    }
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

pub struct HttpCrmClient {
    api: ApiClient,
}

impl HttpCrmClient {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            api: ApiClient::new("crm", endpoint)?,
        })
    }
}

#[async_trait]
impl CrmClient for HttpCrmClient {
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<ContactId, IntegrationError> {
        let request = self.api.request(Method::POST, "contacts/upsert").json(contact);
        let created: Created = self.api.json(request).await?;
        Ok(ContactId(created.id))
    }

    async fn update_contact(
        &self,
        contact: &ContactId,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), IntegrationError> {
        let request = self
            .api
            .request(Method::PUT, &format!("contacts/{}", contact.0))
            .json(&serde_json::json!({ "customFields": fields }));
        self.api.execute(request).await
    }

    async fn create_opportunity(
        &self,
        opportunity: &Opportunity,
    ) -> Result<OpportunityId, IntegrationError> {
        let request = self
            .api
            .request(Method::POST, "opportunities")
            .json(opportunity);
        let created: Created = self.api.json(request).await?;
        Ok(OpportunityId(created.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_upsert_is_stable_per_external_id() {
        let crm = MockCrmClient::default();
        let contact = CrmContact {
            external_id: "member-1".to_string(),
            tags: vec!["concierge".to_string()],
        };

        let first = crm.upsert_contact(&contact).await.expect("upsert");
        let second = crm.upsert_contact(&contact).await.expect("upsert");

        assert_eq!(first, second);
        assert_eq!(crm.calls().len(), 2);
    }
}
