/// PostgREST-style client for the hosted relational store
///
/// Tables live under `{base}/rest/v1/{table}`. Both the `apikey` and the bearer
/// `Authorization` header carry the service credential. Writes pick their
/// response shape with the `Prefer` header.

use crate::error::StoreError;
use crate::store::{Filter, Query, Returning, TableStore};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

/// REST table store backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct RestTableStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl RestTableStore {
    /// Create a client with the given per-request timeout
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Accept", "application/json")
    }

    fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| (f.column.clone(), f.param_value()))
            .collect()
    }

    /// Check status and decode the row array (empty body means no rows)
    async fn rows(response: Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!("📡 Store answered {}: {}", status, body);
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&body)? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        tracing::debug!("🔍 GET {} {:?}", table, query.to_params());
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.to_params());

        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn insert(
        &self,
        table: &str,
        row: Value,
        returning: Returning,
    ) -> Result<Vec<Value>, StoreError> {
        tracing::debug!("📝 POST {}", table);
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", returning.prefer_header())
            .json(&row)
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        tracing::debug!("✏️ PATCH {} {:?}", table, filters);
        let response = self
            .authorized(self.client.patch(self.table_url(table)))
            .header("Prefer", Returning::Representation.prefer_header())
            .query(&Self::filter_params(filters))
            .json(&patch)
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        tracing::debug!("🗑️ DELETE {} {:?}", table, filters);
        let response = self
            .authorized(self.client.delete(self.table_url(table)))
            .header("Prefer", Returning::Representation.prefer_header())
            .query(&Self::filter_params(filters))
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn probe(&self) -> Result<String, StoreError> {
        let url = format!("{}/auth/v1/health", self.base_url);
        let response = self.authorized(self.client.get(url)).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(format!("status {}", status.as_u16()))
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let store =
            RestTableStore::new("https://example.test/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.table_url("team_members"),
            "https://example.test/rest/v1/team_members"
        );
    }

    #[tokio::test]
    async fn unreachable_store_is_a_transport_error() {
        let store =
            RestTableStore::new("http://127.0.0.1:9", "key", Duration::from_millis(500)).unwrap();
        let err = store
            .select("team_members", &Query::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
