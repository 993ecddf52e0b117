// DetaClient — DocumentStore implementation over the hosted Base HTTP API.
//
// Endpoints, relative to `{host}/{project_id}/{base}`:
// - PUT    /items        {"items": [doc]}       → 207 {"processed": {"items": [doc]}}
// - GET    /items/{key}                          → 200 doc | 404
// - PATCH  /items/{key}  {"set": {...}}          → 200 | 404
// - DELETE /items/{key}                          → 200 (also for missing keys)
// - POST   /query        {"query": [...], "limit", "last"}
//                                                → 200 {"paging": {"size", "last"}, "items": [...]}

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use deta_auth_core::db::store::{
    BaseProvider, DocumentStore, FetchOptions, FetchPage, Query, RawDocument, UpdatePatch,
};
use deta_auth_core::error::{AdapterResult, StoreError};

use crate::config::DetaConfig;

const API_KEY_HEADER: &str = "X-API-Key";

// ─── Wire Types ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    items: [&'a RawDocument; 1],
}

#[derive(Debug, Default, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<RawDocument>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(default)]
    processed: ItemList,
    #[serde(default)]
    failed: ItemList,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    set: &'a UpdatePatch,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: [&'a Query; 1],
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    last: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct Paging {
    #[serde(default)]
    size: Option<usize>,
    #[serde(default)]
    last: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    paging: Paging,
    #[serde(default)]
    items: Vec<RawDocument>,
}

impl QueryResponse {
    fn into_page(self) -> FetchPage {
        let last = self.paging.last.filter(|l| !l.is_empty());
        let mut page = FetchPage::new(self.items, last);
        if let Some(size) = self.paging.size {
            page.count = size.min(page.items.len());
        }
        page
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

fn error_message(body: &str, action: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => {
            format!("{action}: {}", parsed.errors.join("; "))
        }
        _ if body.trim().is_empty() => format!("{action} failed"),
        _ => format!("{action}: {}", body.trim()),
    }
}

fn transport_error(action: &str, e: reqwest::Error) -> StoreError {
    if e.is_decode() {
        StoreError::Serialization(format!("{action}: undecodable response: {e}"))
    } else {
        StoreError::Connection(format!("{action}: {e}"))
    }
}

async fn read_response(response: Response, action: &str) -> AdapterResult<(StatusCode, String)> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(action, e))?;
    Ok((status, body))
}

fn check_status(status: StatusCode, body: &str, action: &str) -> AdapterResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(StoreError::request(status.as_u16(), error_message(body, action)))
    }
}

fn decode<T: DeserializeOwned>(body: &str, action: &str) -> AdapterResult<T> {
    serde_json::from_str(body)
        .map_err(|e| StoreError::Serialization(format!("{action}: undecodable response: {e}")))
}

// ─── Response Mapping ────────────────────────────────────────────

fn put_outcome(status: StatusCode, body: &str) -> AdapterResult<RawDocument> {
    check_status(status, body, "put")?;
    let body: PutResponse = decode(body, "put")?;
    if !body.failed.items.is_empty() {
        return Err(StoreError::request(status.as_u16(), "put: item was rejected"));
    }
    body.processed
        .items
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::request(status.as_u16(), "put: no item was processed"))
}

fn get_outcome(status: StatusCode, body: &str) -> AdapterResult<Option<RawDocument>> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    check_status(status, body, "get")?;
    decode(body, "get").map(Some)
}

fn update_outcome(status: StatusCode, body: &str, key: &str) -> AdapterResult<()> {
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::KeyNotFound(key.to_string()));
    }
    check_status(status, body, "update")
}

fn delete_outcome(status: StatusCode, body: &str) -> AdapterResult<()> {
    check_status(status, body, "delete")
}

fn fetch_outcome(status: StatusCode, body: &str) -> AdapterResult<FetchPage> {
    check_status(status, body, "fetch")?;
    let body: QueryResponse = decode(body, "fetch")?;
    Ok(body.into_page())
}

// ─── Base Handle ─────────────────────────────────────────────────

/// One collection ("base") of the hosted store.
#[derive(Debug, Clone)]
pub struct DetaBase {
    name: String,
    root: Url,
    project_key: String,
    http: reqwest::Client,
}

impl DetaBase {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, segments: &[&str]) -> AdapterResult<Url> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("host cannot be a base: {}", self.root)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn items_url(&self) -> AdapterResult<Url> {
        self.url(&["items"])
    }

    fn item_url(&self, key: &str) -> AdapterResult<Url> {
        self.url(&["items", key])
    }

    fn query_url(&self) -> AdapterResult<Url> {
        self.url(&["query"])
    }
}

#[async_trait]
impl DocumentStore for DetaBase {
    async fn put(&self, doc: RawDocument) -> AdapterResult<RawDocument> {
        let response = self
            .http
            .put(self.items_url()?)
            .header(API_KEY_HEADER, &self.project_key)
            .json(&PutRequest { items: [&doc] })
            .send()
            .await
            .map_err(|e| transport_error("put", e))?;
        let (status, body) = read_response(response, "put").await?;
        put_outcome(status, &body)
    }

    async fn get(&self, key: &str) -> AdapterResult<Option<RawDocument>> {
        let response = self
            .http
            .get(self.item_url(key)?)
            .header(API_KEY_HEADER, &self.project_key)
            .send()
            .await
            .map_err(|e| transport_error("get", e))?;
        let (status, body) = read_response(response, "get").await?;
        get_outcome(status, &body)
    }

    async fn update(&self, patch: UpdatePatch, key: &str) -> AdapterResult<()> {
        let response = self
            .http
            .patch(self.item_url(key)?)
            .header(API_KEY_HEADER, &self.project_key)
            .json(&UpdateRequest { set: &patch })
            .send()
            .await
            .map_err(|e| transport_error("update", e))?;
        let (status, body) = read_response(response, "update").await?;
        update_outcome(status, &body, key)
    }

    async fn delete(&self, key: &str) -> AdapterResult<()> {
        let response = self
            .http
            .delete(self.item_url(key)?)
            .header(API_KEY_HEADER, &self.project_key)
            .send()
            .await
            .map_err(|e| transport_error("delete", e))?;
        let (status, body) = read_response(response, "delete").await?;
        delete_outcome(status, &body)
    }

    async fn fetch(&self, query: &Query, options: FetchOptions) -> AdapterResult<FetchPage> {
        let request = QueryRequest {
            query: [query],
            limit: options.limit,
            last: options.last.as_deref(),
        };
        let response = self
            .http
            .post(self.query_url()?)
            .header(API_KEY_HEADER, &self.project_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("fetch", e))?;
        let (status, body) = read_response(response, "fetch").await?;
        fetch_outcome(status, &body)
    }
}

// ─── Client ──────────────────────────────────────────────────────

/// Client for one store project. Opens `DetaBase` handles sharing a single
/// HTTP connection pool.
#[derive(Debug, Clone)]
pub struct DetaClient {
    config: DetaConfig,
    http: reqwest::Client,
}

impl DetaClient {
    pub fn new(config: DetaConfig) -> AdapterResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Client configured from `DETA_*` environment variables.
    pub fn from_env() -> AdapterResult<Self> {
        Self::new(DetaConfig::from_env()?)
    }

    pub fn config(&self) -> &DetaConfig {
        &self.config
    }

    /// Handle on the collection `name`.
    pub fn open(&self, name: &str) -> AdapterResult<DetaBase> {
        let root = Url::parse(&self.config.base_url(name))
            .map_err(|e| StoreError::Config(format!("invalid base URL for '{name}': {e}")))?;
        Ok(DetaBase {
            name: name.to_string(),
            root,
            project_key: self.config.project_key.clone(),
            http: self.http.clone(),
        })
    }
}

/// Fallback handle for a collection whose URL could not be built; every call
/// reports the configuration error.
#[derive(Debug)]
struct Misconfigured(String);

impl Misconfigured {
    fn error(&self) -> StoreError {
        StoreError::Config(self.0.clone())
    }
}

#[async_trait]
impl DocumentStore for Misconfigured {
    async fn put(&self, _doc: RawDocument) -> AdapterResult<RawDocument> {
        Err(self.error())
    }

    async fn get(&self, _key: &str) -> AdapterResult<Option<RawDocument>> {
        Err(self.error())
    }

    async fn update(&self, _patch: UpdatePatch, _key: &str) -> AdapterResult<()> {
        Err(self.error())
    }

    async fn delete(&self, _key: &str) -> AdapterResult<()> {
        Err(self.error())
    }

    async fn fetch(&self, _query: &Query, _options: FetchOptions) -> AdapterResult<FetchPage> {
        Err(self.error())
    }
}

impl BaseProvider for DetaClient {
    fn base(&self, name: &str) -> Arc<dyn DocumentStore> {
        match self.open(name) {
            Ok(base) => Arc::new(base),
            Err(e) => {
                tracing::warn!("[Deta Adapter] cannot open base '{}': {}", name, e);
                Arc::new(Misconfigured(e.to_string()))
            }
        }
    }
}
