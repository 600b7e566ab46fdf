use serde_json::Value;
use uuid::Uuid;

use super::envelope::parse_entity;
use super::ApiClient;
use crate::errors::ServiceError;

/// Read-only access to company and customer detail.
///
/// Detail payloads are returned as raw JSON: deployments disagree on field
/// names (`tradeName` vs `legalName` vs `name`, `nif` vs `taxId`, ...), and
/// the invoice normalizer resolves them through its precedence table instead
/// of a fixed struct.
#[derive(Clone, Debug)]
pub struct PartiesApi {
    client: ApiClient,
}

impl PartiesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn company(&self, id: Uuid) -> Result<Value, ServiceError> {
        let value = self.client.get(&format!("companies/{id}"), &[]).await?;
        parse_entity("companies/{id}", value)
    }

    pub async fn customer(&self, id: Uuid) -> Result<Value, ServiceError> {
        let value = self.client.get(&format!("customers/{id}"), &[]).await?;
        parse_entity("customers/{id}", value)
    }
}
