//! [`RecordStore`] backed by the Airtable REST API.
//!
//! Reads follow the `offset` cursor until the table (or `maxRecords`) is
//! exhausted. A 403 is logged separately because it almost always means the
//! personal access token lacks scopes on the base.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::StoreError;
use crate::store::{Fields, Query, RecordStore, Row};

const DEFAULT_BASE_URL: &str = "https://api.airtable.com";

/// Airtable accepts at most 10 records per create request.
const MAX_CREATE_BATCH: usize = 10;

/// Guard against a cursor that never terminates.
const MAX_PAGES: usize = 500;

pub struct AirtableStore {
    client: Client,
    api_key: String,
    base_id: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<Row>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<Row>,
}

impl AirtableStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, base_id: &str, timeout_secs: u64) -> Result<Self, StoreError> {
        Self::with_base_url(api_key, base_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a store with a custom API origin (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the client cannot be constructed, or
    /// [`StoreError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        base_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("boostline/0.1 (engagement-tracking)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StoreError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_id: base_id.to_owned(),
            base_url,
        })
    }

    /// `{origin}/v0/{base_id}/{table}` with the table name percent-encoded.
    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(["v0", self.base_id.as_str(), table]);
        Ok(url)
    }

    async fn check(
        table: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = StoreError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        };
        if err.is_forbidden() {
            tracing::error!(
                table,
                "record store authentication error - check Airtable API key permissions"
            );
        } else {
            tracing::warn!(table, error = %err, "record store request failed");
        }
        Err(err)
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        context: &str,
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let url = self.table_url(table)?;
        let mut rows = Vec::new();
        let mut offset: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut params: Vec<(&str, String)> = Vec::new();
            if let Some(filter) = &query.filter {
                params.push(("filterByFormula", filter.to_formula()));
            }
            if let Some(view) = &query.view {
                params.push(("view", view.clone()));
            }
            if let Some(max) = query.max_records {
                params.push(("maxRecords", max.to_string()));
            }
            if let Some(cursor) = &offset {
                params.push(("offset", cursor.clone()));
            }

            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&self.api_key)
                .query(&params)
                .send()
                .await?;
            let response = Self::check(table, response).await?;
            let page: ListResponse = Self::decode(&format!("list {table}"), response).await?;
            rows.extend(page.records);

            let reached_max = query
                .max_records
                .is_some_and(|max| rows.len() >= max as usize);
            match page.offset {
                Some(next) if !reached_max => offset = Some(next),
                _ => return Ok(rows),
            }
        }

        tracing::warn!(table, pages = MAX_PAGES, "record store pagination limit reached");
        Ok(rows)
    }

    async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Row>, StoreError> {
        let url = self.table_url(table)?;
        let mut created = Vec::with_capacity(rows.len());

        for chunk in rows.chunks(MAX_CREATE_BATCH) {
            let records: Vec<_> = chunk.iter().map(|fields| json!({ "fields": fields })).collect();
            let response = self
                .client
                .post(url.clone())
                .bearer_auth(&self.api_key)
                .json(&json!({ "records": records }))
                .send()
                .await?;
            let response = Self::check(table, response).await?;
            let body: RecordsResponse = Self::decode(&format!("create {table}"), response).await?;
            created.extend(body.records);
        }

        Ok(created)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let url = self.table_url(table)?;
        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "records": [{ "id": id, "fields": fields }] }))
            .send()
            .await?;
        let response = Self::check(table, response).await?;
        let body: RecordsResponse = Self::decode(&format!("update {table}"), response).await?;
        if body.records.iter().any(|r| r.id == id) {
            Ok(())
        } else {
            Err(StoreError::WriteFailed {
                table: table.to_owned(),
                reason: format!("record {id} missing from update response"),
            })
        }
    }
}
