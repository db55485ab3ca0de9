use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{OrderBy, RecordStore, Row, StoreBackend, StoreError, Table};

const PREFER: HeaderName = HeaderName::from_static("prefer");
const API_KEY: HeaderName = HeaderName::from_static("apikey");

/// Record store backed by a PostgREST endpoint (`{base}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct RestRecordStore {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl RestRecordStore {
    /// Builds a store with its own reqwest client.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build http client: {}", e)))?;
        Self::with_client(base_url, api_key, client)
    }

    pub fn with_client(
        base_url: &str,
        api_key: Option<String>,
        client: Client,
    ) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = api_key.as_deref().filter(|k| !k.is_empty()) {
            let invalid = |_| StoreError::Unavailable("api key is not a valid header value".into());
            headers.insert(API_KEY, HeaderValue::from_str(key).map_err(invalid)?);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid)?,
            );
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("unreadable error body: {}", e));
        warn!(status = status.as_u16(), %message, "REST store rejected request");
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    #[instrument(skip(self, row), fields(table = %table))]
    async fn insert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url(table))
            .header(PREFER, "return=minimal")
            .json(&[row]);
        self.send(request).await?;
        debug!("Row inserted");
        Ok(())
    }

    #[instrument(skip(self), fields(table = %table, order_by = order_by.field))]
    async fn select_all(&self, table: Table, order_by: OrderBy) -> Result<Vec<Row>, StoreError> {
        let direction = if order_by.ascending { "asc" } else { "desc" };
        let request = self.client.get(self.table_url(table)).query(&[
            ("select", "*".to_string()),
            ("order", format!("{}.{}", order_by.field, direction)),
        ]);

        let rows: Vec<Row> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("malformed response body: {}", e)))?;
        debug!(rows = rows.len(), "Rows selected");
        Ok(rows)
    }

    #[instrument(skip(self, row), fields(table = %table))]
    async fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", conflict_key)])
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        self.send(request).await?;
        debug!(conflict_key, "Row upserted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self
            .client
            .get(self.table_url(Table::EmployeeWages))
            .query(&[("select", "persona"), ("limit", "1")]);
        self.send(request).await?;
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Rest
    }
}
