//! Client for the profile search / structured extraction service.
//!
//! Two operations are exposed: [`ProfileClient::search_profiles`] turns a
//! query into a bounded list of profile URLs, and
//! [`ProfileClient::extract_profile`] turns one URL into a [`LeadRecord`].
//! Both are single requests with a fixed timeout; neither retries.

mod response;

use std::time::Duration;

use leadscout_shared::{LeadRecord, LeadScoutError, Result, SearchConfig, require_api_key};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

pub use response::{PROFILE_URL_MARKER, lead_from_response, profile_schema, profile_urls, record_object};

/// User-Agent string for service requests.
const USER_AGENT: &str = concat!("LeadScout/", env!("CARGO_PKG_VERSION"));

/// Search endpoint path.
const SEARCH_PATH: &str = "/v1/search";

/// Extract endpoint path.
const EXTRACT_PATH: &str = "/v1/extract";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for the search/extract service.
#[derive(Debug, Clone)]
pub struct ProfileClientOptions {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// API key sent in both auth headers.
    pub api_key: String,
    /// Timeout applied to every request.
    pub timeout_secs: u64,
}

impl ProfileClientOptions {
    /// Resolve options from config. Fails when the API key env var is unset.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            api_key: require_api_key(&config.api_key_env)?,
            base_url: config.resolved_base_url()?,
            timeout_secs: config.resolved_timeout_secs()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Stateless client; configuration is fixed at construction.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: Client,
    base_url: String,
}

impl ProfileClient {
    /// Build a client that authenticates with both header schemes the service accepts.
    pub fn new(opts: &ProfileClientOptions) -> Result<Self> {
        if opts.timeout_secs == 0 {
            return Err(LeadScoutError::config("request timeout must be greater than 0"));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(auth_headers(&opts.api_key)?)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| LeadScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: opts.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run a search and return up to `limit` profile URLs in relevance order.
    ///
    /// A blank query or a zero limit returns an empty list without contacting
    /// the service.
    #[instrument(skip_all, fields(query = %query, limit = limit))]
    pub async fn search_profiles(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        if query.trim().is_empty() || limit == 0 {
            debug!("nothing to search for");
            return Ok(Vec::new());
        }

        let body = self
            .post(SEARCH_PATH, &json!({ "query": query }))
            .await
            .map_err(|message| {
                warn!(%message, "search request failed");
                LeadScoutError::Search(message)
            })?;

        let urls = profile_urls(&body, limit);
        info!(found = urls.len(), "search complete");
        Ok(urls)
    }

    /// Extract the structured profile behind one URL.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract_profile(&self, url: &str) -> Result<LeadRecord> {
        let payload = json!({
            "url": url,
            "schema": profile_schema(),
        });

        let body = self
            .post(EXTRACT_PATH, &payload)
            .await
            .map_err(|message| LeadScoutError::extract(url, message))?;

        Ok(lead_from_response(&body, url))
    }

    /// POST a JSON payload and decode the JSON reply.
    /// Errors are rendered as plain messages so callers can scope them.
    async fn post(&self, path: &str, payload: &Value) -> std::result::Result<Value, String> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| format!("{url}: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{url}: HTTP {status}: {}", truncate(&body, 200)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| format!("{url}: invalid JSON body: {e}"))
    }
}

/// Bearer token plus `X-API-Key`; deployments differ in which one they read.
fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|e| LeadScoutError::config(format!("API key is not a valid header value: {e}")))?;
    let raw = HeaderValue::from_str(api_key)
        .map_err(|e| LeadScoutError::config(format!("API key is not a valid header value: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert("x-api-key", raw);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
