pub mod dto;
pub mod mapping;

use std::env;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::AppError;
use dto::{
    DeleteRequest, GetResponse, PagingInfo, QueryRequest, QueryResponse, StoredRecord,
    WriteRequest, WriteResponse,
};

const PAGE_SIZE: u32 = 100;
const MAX_PAGES: u32 = 500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl RecordConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let base_url = var("RECORD_API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::Config("RECORD_API_URL is not set".to_string()))?;
        let api_token = var("RECORD_API_TOKEN").filter(|t| !t.is_empty());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

/// Generic CRUD against a named collection of the remote record store.
///
/// Records travel in storage shape; renaming to UI fields happens in
/// [`mapping`]. Missing records come back as `None` / `false`.
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn fetch_records(
        &self,
        collection: &str,
        query: &QueryRequest,
    ) -> Result<Vec<StoredRecord>, AppError>;
    async fn get_record(&self, collection: &str, id: i64) -> Result<Option<StoredRecord>, AppError>;
    async fn create_record(
        &self,
        collection: &str,
        record: StoredRecord,
    ) -> Result<StoredRecord, AppError>;
    async fn update_record(
        &self,
        collection: &str,
        record: StoredRecord,
    ) -> Result<Option<StoredRecord>, AppError>;
    async fn delete_record(&self, collection: &str, id: i64) -> Result<bool, AppError>;
}

pub struct RecordHttpClient {
    client: Client,
    config: RecordConfig,
}

impl RecordHttpClient {
    pub fn new(config: RecordConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/tables/{}/records", self.config.base_url, collection)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Sends the request and parses the body; `Ok(None)` on 404.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<Option<T>, AppError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            error!("record store {} failed: {}", action, e);
            AppError::Remote(format!("{} failed: {}", action, e))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::Remote(format!(
                "{} returned {}: {}",
                action, status, body
            )));
        }

        serde_json::from_str::<T>(&body).map(Some).map_err(|e| {
            error!("Failed to parse {} response: {}", action, e);
            AppError::Remote(format!("Failed to parse {} response: {}", action, e))
        })
    }

    async fn query_page(
        &self,
        collection: &str,
        query: &QueryRequest,
    ) -> Result<Vec<StoredRecord>, AppError> {
        let url = format!("{}/query", self.records_url(collection));
        let response: Option<QueryResponse> = self
            .send(self.client.post(&url).json(query), "query")
            .await?;
        let response = response.ok_or_else(|| {
            AppError::Remote(format!("collection {} does not exist", collection))
        })?;

        if !response.success {
            return Err(AppError::Remote(
                response
                    .message
                    .unwrap_or_else(|| format!("query on {} failed", collection)),
            ));
        }
        Ok(response.data)
    }

    fn first_result(response: WriteResponse, action: &str) -> Result<StoredRecord, AppError> {
        if !response.success {
            return Err(AppError::Remote(
                response.message.unwrap_or_else(|| format!("{} failed", action)),
            ));
        }
        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Remote(format!("{} returned no results", action)))?;
        if !result.success {
            return Err(AppError::Remote(
                result.message.unwrap_or_else(|| format!("{} was rejected", action)),
            ));
        }
        result
            .data
            .ok_or_else(|| AppError::Remote(format!("{} returned no record", action)))
    }
}

#[async_trait]
impl RecordClient for RecordHttpClient {
    /// Without explicit paging, reads every page of `PAGE_SIZE` records.
    /// Stops early if the store serves the same page twice and gives up
    /// after `MAX_PAGES`.
    async fn fetch_records(
        &self,
        collection: &str,
        query: &QueryRequest,
    ) -> Result<Vec<StoredRecord>, AppError> {
        if query.paging_info.is_some() {
            return self.query_page(collection, query).await;
        }

        let mut records = Vec::new();
        let mut page = query.clone();
        let mut offset = 0;
        let mut previous_first_id = None;
        for _ in 0..MAX_PAGES {
            page.paging_info = Some(PagingInfo {
                limit: PAGE_SIZE,
                offset,
            });
            let batch = self.query_page(collection, &page).await?;
            let first_id = batch.first().and_then(|r| r.get("Id")).cloned();
            if first_id.is_some() && first_id == previous_first_id {
                warn!(
                    "{} repeated the page at offset {}, stopping",
                    collection,
                    offset - PAGE_SIZE
                );
                return Ok(records);
            }
            let done = batch.len() < PAGE_SIZE as usize;
            records.extend(batch);
            if done {
                debug!("fetched {} records from {}", records.len(), collection);
                return Ok(records);
            }
            previous_first_id = first_id;
            offset += PAGE_SIZE;
        }
        Err(AppError::Remote(format!(
            "{} returned more than {} pages",
            collection, MAX_PAGES
        )))
    }

    async fn get_record(&self, collection: &str, id: i64) -> Result<Option<StoredRecord>, AppError> {
        let url = format!("{}/{}", self.records_url(collection), id);
        let response: Option<GetResponse> = self.send(self.client.get(&url), "get").await?;
        match response {
            Some(GetResponse {
                success: true,
                data,
                ..
            }) => Ok(data),
            Some(GetResponse {
                success: false,
                message,
                ..
            }) => Err(AppError::Remote(
                message.unwrap_or_else(|| format!("get on {} failed", collection)),
            )),
            None => Ok(None),
        }
    }

    async fn create_record(
        &self,
        collection: &str,
        record: StoredRecord,
    ) -> Result<StoredRecord, AppError> {
        let body = WriteRequest {
            records: vec![record],
        };
        let response: Option<WriteResponse> = self
            .send(self.client.post(self.records_url(collection)).json(&body), "create")
            .await?;
        let response = response.ok_or_else(|| {
            AppError::Remote(format!("collection {} does not exist", collection))
        })?;
        Self::first_result(response, "create")
    }

    async fn update_record(
        &self,
        collection: &str,
        record: StoredRecord,
    ) -> Result<Option<StoredRecord>, AppError> {
        let body = WriteRequest {
            records: vec![record],
        };
        let response: Option<WriteResponse> = self
            .send(self.client.patch(self.records_url(collection)).json(&body), "update")
            .await?;
        let Some(response) = response else {
            return Ok(None);
        };
        if response.success && response.results.first().is_some_and(|r| !r.success) {
            debug!("update on {} rejected, treating record as missing", collection);
            return Ok(None);
        }
        Self::first_result(response, "update").map(Some)
    }

    async fn delete_record(&self, collection: &str, id: i64) -> Result<bool, AppError> {
        let body = DeleteRequest {
            record_ids: vec![id],
        };
        let response: Option<WriteResponse> = self
            .send(self.client.delete(self.records_url(collection)).json(&body), "delete")
            .await?;
        let Some(response) = response else {
            return Ok(false);
        };
        if !response.success {
            return Err(AppError::Remote(
                response.message.unwrap_or_else(|| "delete failed".to_string()),
            ));
        }
        Ok(response.results.first().is_some_and(|r| r.success))
    }
}
