//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, IndexParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::get_index_settings;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use inspection_indexer_shared::InspectionDocument;

/// OpenSearch client implementation.
///
/// Writes inspection documents without an explicit `_id`, so the engine
/// generates one per write and repeated loads accumulate documents.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200", SearchIndexConfig::default()).await?;
/// client.ensure_index_exists("from_container_m3").await?;
/// client.index_document("from_container_m3", &document).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    config: SearchIndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `config` - Client limits such as the maximum bulk batch size
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, config: SearchIndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            max_batch_size = ?config.max_batch_size,
            "Created OpenSearch client"
        );

        Ok(Self { client, config })
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }
}

/// Turn a `_bulk` response body into a per-document summary.
///
/// Items are matched to documents by position. Items missing from the
/// response (a truncated or malformed body) count as failures.
pub(crate) fn summarize_bulk_response(body: &Value, expected: usize) -> BatchOperationSummary {
    let items = body["items"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    let results = (0..expected)
        .map(|position| {
            let Some(item) = items.get(position) else {
                return BatchOperationResult::failed(
                    position,
                    SearchIndexError::bulk_operation("No result returned for document"),
                );
            };

            let outcome = &item["index"];
            let status = outcome["status"].as_u64().unwrap_or(0);
            let error = &outcome["error"];

            if (200..300).contains(&status) && error.is_null() {
                BatchOperationResult::succeeded(position)
            } else {
                let reason = error["reason"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                BatchOperationResult::failed(
                    position,
                    SearchIndexError::index(format!("status {}: {}", status, reason)),
                )
            }
        })
        .collect();

    BatchOperationSummary::from_results(results)
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    /// Index a single document, letting the engine assign its id.
    async fn index_document(
        &self,
        index: &str,
        document: &InspectionDocument,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .index(IndexParts::Index(index))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(
            index = %index,
            business_id = document.record().business_id,
            "Document indexed"
        );
        Ok(())
    }

    /// Index multiple documents through the `_bulk` API.
    ///
    /// A rejected request fails as a whole; individual document rejections
    /// inside an accepted request are reported in the summary.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_index_documents(
        &self,
        index: &str,
        documents: &[InspectionDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }
        self.validate_batch_size(documents.len())?;

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            let source = serde_json::to_value(document)
                .map_err(|e| SearchIndexError::parse(e.to_string()))?;
            body.push(JsonBody::new(json!({ "index": {} })));
            body.push(JsonBody::new(source));
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_operation(format!(
                "Bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = summarize_bulk_response(&response_body, documents.len());
        if summary.failed > 0 {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk request completed with rejected documents"
            );
        }

        Ok(summary)
    }

    async fn ensure_index_exists(&self, index: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            debug!(index = %index, "Index already exists");
            return Ok(());
        }
        if status.as_u16() != 404 {
            return Err(SearchIndexError::index_creation(format!(
                "Index existence check failed with status {}",
                status
            )));
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another writer may have created it between the check and the create.
            if error_body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Create failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index, "Created search index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let cluster_status = body["status"].as_str().unwrap_or("red");
        debug!(status = %cluster_status, "Cluster health");
        Ok(cluster_status != "red")
    }
}
