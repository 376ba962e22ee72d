//! HTTP client, base and table handles.

use crate::cache::{cache_key, MemoryQueryCache, NoopQueryCache, QueryCache};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError, Result};
use crate::query::RowQuery;
use crate::types::{Field, Row, RowList};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Params = BTreeMap<String, String>;

/// Baserow HTTP client.
///
/// Holds the connection settings and the query cache. Tables are reached
/// through [`BaserowClient::base`] and [`Base::table`]; the handles borrow
/// the client and carry nothing but identifiers.
pub struct BaserowClient {
    http: reqwest::Client,
    config: ClientConfig,
    cache: Arc<dyn QueryCache>,
}

impl fmt::Debug for BaserowClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaserowClient")
            .field("config", &self.config)
            .field("cached_pages", &self.cache.len())
            .finish()
    }
}

impl BaserowClient {
    /// Create a new configuration builder with the given API key.
    pub fn builder(api_key: impl Into<String>) -> crate::config::ClientConfigBuilder {
        crate::config::ClientConfigBuilder::new(api_key)
    }

    /// Create a new client with the given configuration.
    ///
    /// The query cache is an unbounded [`MemoryQueryCache`], or a
    /// [`NoopQueryCache`] when the configuration disables caching.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let cache: Arc<dyn QueryCache> = if config.cache_enabled {
            Arc::new(MemoryQueryCache::new())
        } else {
            Arc::new(NoopQueryCache)
        };
        Self::with_cache(config, cache)
    }

    /// Create a client that stores `select` results in `cache`.
    pub fn with_cache(mut config: ClientConfig, cache: Arc<dyn QueryCache>) -> Result<Self> {
        config.validate()?;
        config.base_url = config.normalized_base_url().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("baserow-client")),
        );

        let mut auth_value = HeaderValue::from_str(&format!("Token {}", config.api_key))
            .map_err(|_| ClientError::Config("Invalid API key format".to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()?;

        Ok(Self {
            http,
            config,
            cache,
        })
    }

    /// Get the base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Join an endpoint path to the base URL with exactly one `/`.
    pub fn resolve(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url, endpoint.trim_start_matches('/'))
    }

    /// Handle for one base (a collection of tables).
    pub fn base(&self, base_id: i64) -> Base<'_> {
        Base {
            client: self,
            base_id,
        }
    }

    // =========================================================================
    // Field Metadata
    // =========================================================================

    /// List the fields of a table.
    pub async fn fields(&self, table_id: impl fmt::Display) -> Result<Vec<Field>> {
        let endpoint = format!("api/database/fields/table/{}/", encode_id(table_id));
        self.get(&endpoint, &Params::new()).await
    }

    /// Fetch one row without going through a base handle.
    pub async fn row(&self, table_id: impl fmt::Display, row_id: i64) -> Result<Row> {
        let endpoint = row_endpoint(&table_id.to_string(), row_id);
        self.get(&endpoint, &user_field_names_param(true)).await
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop every cached `select` result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached `select` results, expired ones included.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    // =========================================================================
    // Internal HTTP Methods
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &Params) -> Result<T> {
        self.request(Method::GET, endpoint, params, Option::<&()>::None)
            .await
    }

    /// Perform a request and deserialize the response body.
    async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.execute(method, endpoint, params, body).await?;
        serde_json::from_slice(&body).map_err(|e| {
            ClientError::InvalidResponse(format!(
                "Failed to parse response: {} (body: {})",
                e,
                String::from_utf8_lossy(&body)
            ))
        })
    }

    /// Perform a request and return the raw body of a successful response.
    ///
    /// Any status >= 400 becomes [`ClientError::Api`].
    async fn execute<B>(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
        body: Option<&B>,
    ) -> Result<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(endpoint);
        let start = std::time::Instant::now();

        tracing::debug!(
            method = %method,
            path = %endpoint,
            params = params.len(),
            "Sending request"
        );

        let mut request = self.http.request(method.clone(), &url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(b) = body {
            request = request.body(serde_json::to_vec(b)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let request_url = response.url().to_string();
        let bytes = response.bytes().await?;
        let duration = start.elapsed();

        if status.as_u16() >= 400 {
            let err = ApiError::from_response(status.as_u16(), request_url, &bytes);
            tracing::warn!(
                method = %method,
                path = %endpoint,
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                error = %err.detail,
                "Request failed"
            );
            return Err(err.into());
        }

        tracing::debug!(
            method = %method,
            path = %endpoint,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            bytes = bytes.len(),
            "Received response"
        );

        Ok(bytes.to_vec())
    }
}

/// Handle for one base.
#[derive(Debug, Clone, Copy)]
pub struct Base<'a> {
    client: &'a BaserowClient,
    base_id: i64,
}

impl<'a> Base<'a> {
    pub fn id(&self) -> i64 {
        self.base_id
    }

    /// Handle for a table in this base.
    pub fn table(&self, table_id: impl ToString) -> Table<'a> {
        Table {
            client: self.client,
            base_id: self.base_id,
            table_id: table_id.to_string(),
        }
    }
}

/// Handle for one table: row queries and mutations.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    client: &'a BaserowClient,
    base_id: i64,
    table_id: String,
}

impl<'a> Table<'a> {
    pub fn base_id(&self) -> i64 {
        self.base_id
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Field metadata of this table.
    pub async fn fields(&self) -> Result<Vec<Field>> {
        self.client.fields(&self.table_id).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// List one page of rows. Always goes to the server.
    pub async fn rows(&self, query: &RowQuery) -> Result<RowList> {
        let params = query.to_params()?;
        self.fetch_rows(&params).await
    }

    /// List one page of rows, reusing a cached page younger than `cache_ttl`.
    ///
    /// With `cache_ttl == None` (or zero) the cache is neither read nor
    /// written. Otherwise expired entries are swept first, a fresh entry for
    /// the same table and parameters is returned as-is, and a miss fetches
    /// the page and stores it for `cache_ttl`.
    pub async fn select(&self, query: &RowQuery, cache_ttl: Option<Duration>) -> Result<RowList> {
        let params = query.to_params()?;

        let Some(ttl) = cache_ttl.filter(|ttl| !ttl.is_zero()) else {
            return self.fetch_rows(&params).await;
        };

        let evicted = self.client.cache.evict_expired();
        if evicted > 0 {
            tracing::debug!(evicted, "Swept expired query cache entries");
        }

        let key = cache_key(self.base_id, &self.table_id, &params);
        if let Some(cached) = self.client.cache.get(&key, ttl) {
            return Ok(cached);
        }

        let page = self.fetch_rows(&params).await?;
        self.client.cache.put(key, page.clone(), ttl);
        Ok(page)
    }

    /// Fetch every page of a query, starting at the query's page.
    pub async fn select_all(&self, query: &RowQuery) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        let mut page_no = query.current_page();

        loop {
            let page = self.rows(&query.clone().page(page_no)).await?;
            let has_next = page.has_next_page();
            rows.extend(page);
            if !has_next {
                break;
            }
            page_no += 1;
        }

        tracing::debug!(table = %self.table_id, rows = rows.len(), pages = page_no, "Fetched all pages");
        Ok(rows)
    }

    /// Fetch one row.
    pub async fn row(&self, row_id: i64, user_field_names: bool) -> Result<Row> {
        let endpoint = row_endpoint(&self.table_id, row_id);
        self.client
            .get(&endpoint, &user_field_names_param(user_field_names))
            .await
    }

    /// Fetch one row using field names. Same as `row(row_id, true)`.
    pub async fn get(&self, row_id: i64) -> Result<Row> {
        self.row(row_id, true).await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a row from a field-value mapping.
    ///
    /// With `before`, the new row is placed immediately before that row.
    pub async fn create<B>(
        &self,
        fields: &B,
        user_field_names: bool,
        before: Option<i64>,
    ) -> Result<Row>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = rows_endpoint(&self.table_id);
        let mut params = user_field_names_param(user_field_names);
        if let Some(before) = before {
            params.insert("before".to_string(), before.to_string());
        }
        self.client
            .request(Method::POST, &endpoint, &params, Some(fields))
            .await
    }

    /// Update the given fields of a row.
    pub async fn update<B>(&self, row_id: i64, fields: &B, user_field_names: bool) -> Result<Row>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = row_endpoint(&self.table_id, row_id);
        self.client
            .request(
                Method::PATCH,
                &endpoint,
                &user_field_names_param(user_field_names),
                Some(fields),
            )
            .await
    }

    /// Delete a row.
    pub async fn delete(&self, row_id: i64) -> Result<()> {
        let endpoint = row_endpoint(&self.table_id, row_id);
        self.client
            .execute(Method::DELETE, &endpoint, &Params::new(), Option::<&()>::None)
            .await?;
        Ok(())
    }

    async fn fetch_rows(&self, params: &Params) -> Result<RowList> {
        let endpoint = rows_endpoint(&self.table_id);
        self.client.get(&endpoint, params).await
    }
}

fn encode_id(id: impl fmt::Display) -> String {
    urlencoding::encode(&id.to_string()).into_owned()
}

fn rows_endpoint(table_id: &str) -> String {
    format!("api/database/rows/table/{}/", encode_id(table_id))
}

fn row_endpoint(table_id: &str, row_id: i64) -> String {
    format!("api/database/rows/table/{}/{}/", encode_id(table_id), row_id)
}

fn user_field_names_param(enabled: bool) -> Params {
    let mut params = Params::new();
    if enabled {
        params.insert("user_field_names".to_string(), "true".to_string());
    }
    params
}
