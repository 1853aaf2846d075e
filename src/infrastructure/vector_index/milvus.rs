//! Distributed index backed by a Milvus cluster (RESTful API v2)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::chat::{Message, Usage};
use crate::domain::semantic_cache::{meets_threshold, CacheEntry, SimilarityMatch, VectorIndex};
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;

const VARCHAR_MAX_LENGTH: u32 = 65_535;

/// Connection settings for the Milvus REST endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MilvusConfig {
    pub url: String,
    pub collection: String,
    pub token: Option<String>,
    pub nprobe: u32,
    pub timeout_secs: u64,
}

impl Default for MilvusConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:19530".to_string(),
            collection: "semantic_cache".to_string(),
            token: None,
            nprobe: 10,
            timeout_secs: 10,
        }
    }
}

/// Index client for a remote Milvus collection.
///
/// The model filter is pushed into the search request; the returned row's
/// model is checked again locally.
#[derive(Debug)]
pub struct MilvusIndex<C: HttpClientTrait> {
    client: C,
    base_url: String,
    collection: String,
    auth_header: Option<String>,
    nprobe: u32,
    dimensions: usize,
}

impl<C: HttpClientTrait> MilvusIndex<C> {
    pub fn new(client: C, config: &MilvusConfig, dimensions: usize) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            auth_header: config
                .token
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| format!("Bearer {}", t)),
            nprobe: config.nprobe.max(1),
            dimensions,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/vectordb/{}", self.base_url, path)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];

        if let Some(ref auth) = self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        headers
    }

    /// POST to a Milvus endpoint and return `data` when `code == 0`
    async fn call(&self, path: &str, body: Value) -> Result<Value, DomainError> {
        let response = self
            .client
            .post_json(&self.url(path), self.headers(), &body)
            .await
            .map_err(|e| DomainError::index_unavailable(format!("milvus {}: {}", path, e)))?;

        let envelope: MilvusResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::index_unavailable(format!("milvus {}: malformed response: {}", path, e))
        })?;

        if envelope.code != 0 {
            return Err(DomainError::index_unavailable(format!(
                "milvus {}: code {}: {}",
                path,
                envelope.code,
                envelope.message.unwrap_or_default()
            )));
        }

        Ok(envelope.data)
    }

    /// Create the collection if it does not exist yet, otherwise load it
    /// into memory so it can be searched
    pub async fn ensure_collection(&self) -> Result<(), DomainError> {
        let data = self
            .call("collections/has", json!({ "collectionName": self.collection }))
            .await?;

        if data.get("has").and_then(Value::as_bool).unwrap_or(false) {
            self.call("collections/load", json!({ "collectionName": self.collection }))
                .await?;
            info!(collection = %self.collection, "Loaded existing Milvus collection");
            return Ok(());
        }

        let varchar = |name: &str| {
            json!({
                "fieldName": name,
                "dataType": "VarChar",
                "elementTypeParams": { "max_length": VARCHAR_MAX_LENGTH }
            })
        };

        let body = json!({
            "collectionName": self.collection,
            "schema": {
                "autoId": true,
                "enableDynamicField": false,
                "fields": [
                    { "fieldName": "id", "dataType": "Int64", "isPrimary": true },
                    {
                        "fieldName": "embedding",
                        "dataType": "FloatVector",
                        "elementTypeParams": { "dim": self.dimensions.to_string() }
                    },
                    varchar("request_messages"),
                    varchar("response_messages"),
                    varchar("model"),
                    varchar("usage"),
                ]
            },
            "indexParams": [{
                "fieldName": "embedding",
                "indexName": "embedding_ip",
                "metricType": "IP",
                "indexType": "IVF_FLAT",
                "params": { "nlist": 128 }
            }]
        });

        self.call("collections/create", body).await?;
        info!(
            collection = %self.collection,
            dimensions = self.dimensions,
            "Created Milvus collection"
        );

        Ok(())
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<(), DomainError> {
        if vector.len() != self.dimensions {
            return Err(DomainError::validation(format!(
                "embedding has dimension {}, index expects {}",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

/// Quote a string literal for a Milvus boolean filter expression
fn filter_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[async_trait]
impl<C: HttpClientTrait> VectorIndex for MilvusIndex<C> {
    async fn search(
        &self,
        embedding: &[f32],
        model: &str,
        threshold: f32,
    ) -> Result<Option<SimilarityMatch>, DomainError> {
        self.check_dimensions(embedding)?;

        let body = json!({
            "collectionName": self.collection,
            "data": [embedding],
            "annsField": "embedding",
            "filter": format!("model == {}", filter_literal(model)),
            "limit": 1,
            "outputFields": ["response_messages", "model", "usage"],
            "searchParams": {
                "metricType": "IP",
                "params": { "nprobe": self.nprobe }
            }
        });

        let data = self.call("entities/search", body).await?;
        let rows: Vec<MilvusSearchHit> = if data.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(data).map_err(|e| {
                DomainError::index_unavailable(format!("milvus search: malformed hits: {}", e))
            })?
        };

        let Some(hit) = rows.into_iter().next() else {
            return Ok(None);
        };

        if !meets_threshold(hit.distance, threshold) {
            return Ok(None);
        }

        if let Some(ref row_model) = hit.model {
            if row_model != model {
                debug!(query_model = model, entry_model = %row_model, "Milvus returned another model");
                return Ok(None);
            }
        }

        let response_messages: Vec<Message> = decode_column(&hit.response_messages)?;
        let usage: Usage = match hit.usage.as_deref() {
            Some(raw) if !raw.is_empty() => decode_column(raw)?,
            _ => Usage::default(),
        };

        Ok(Some(SimilarityMatch {
            response_messages,
            similarity_score: hit.distance,
            usage,
        }))
    }

    async fn store(&self, entry: CacheEntry) -> Result<(), DomainError> {
        self.check_dimensions(entry.embedding())?;

        let body = json!({
            "collectionName": self.collection,
            "data": [{
                "embedding": entry.embedding(),
                "request_messages": encode_column(entry.request_messages())?,
                "response_messages": encode_column(entry.response_messages())?,
                "model": entry.model(),
                "usage": encode_column(&entry.usage())?,
            }]
        });

        self.call("entities/insert", body).await?;

        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        let data = self
            .call(
                "collections/get_stats",
                json!({ "collectionName": self.collection }),
            )
            .await?;

        Ok(data.get("rowCount").and_then(Value::as_u64).unwrap_or(0) as usize)
    }

    fn backend_name(&self) -> &'static str {
        "milvus"
    }
}

/// Message and usage columns are stored as JSON text in VARCHAR fields
fn encode_column<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, DomainError> {
    serde_json::to_string(value)
        .map_err(|e| DomainError::internal(format!("cannot encode column: {}", e)))
}

fn decode_column<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, DomainError> {
    serde_json::from_str(raw)
        .map_err(|e| DomainError::index_unavailable(format!("milvus: corrupt row: {}", e)))
}

#[derive(Debug, Deserialize)]
struct MilvusResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct MilvusSearchHit {
    distance: f32,
    #[serde(default)]
    response_messages: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<String>,
}
