//! Minimal client for a Gemini-style `generateContent` endpoint.
//!
//! Only what lead cleanup needs: send text parts, ask for JSON output, and
//! pull the reply text back out of whichever response shape arrives.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use leadscout_shared::shape::{self, Strategy};
use leadscout_shared::{EnrichmentConfig, LeadScoutError, Result, optional_api_key};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("LeadScout/", env!("CARGO_PKG_VERSION"));

/// Connection settings. `api_key: None` means generation is not configured.
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl GeminiOptions {
    /// Resolve from config; a missing key is not an error here.
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: optional_api_key(&config.api_key_env),
            model: config.model.clone(),
        }
    }

    /// Both a key and a model name are present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && !self.model.trim().is_empty()
    }
}

/// Generation client. No request timeout is set.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client, or `None` when the options lack a key or model.
    pub fn new(opts: &GeminiOptions) -> Result<Option<Self>> {
        let Some(api_key) = opts.api_key.clone().filter(|_| opts.is_configured()) else {
            return Ok(None);
        };

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LeadScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        let model = opts.model.trim().trim_start_matches("models/");
        Ok(Some(Self {
            client,
            endpoint: format!("{}/v1beta/models/{model}:generateContent", opts.base_url),
            api_key,
        }))
    }

    /// Send `parts` as one user turn, requesting `application/json` output.
    /// Returns the raw response body.
    pub async fn generate_json(&self, parts: &[&str]) -> std::result::Result<Value, String> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": parts.iter().map(|text| json!({ "text": text })).collect::<Vec<_>>(),
            }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        debug!(endpoint = %self.endpoint, parts = parts.len(), "generateContent");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("{}: {e}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{}: HTTP {status}", self.endpoint));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| format!("{}: invalid JSON body: {e}", self.endpoint))
    }
}

// ---------------------------------------------------------------------------
// Response text
// ---------------------------------------------------------------------------

/// Where the reply text may live, in priority order.
const TEXT_STRATEGIES: [Strategy<String>; 2] = [
    Strategy::new("text", direct_text),
    Strategy::new("candidates", candidate_parts_text),
];

/// A flat `text` field on the response.
fn direct_text(body: &Value) -> Option<String> {
    shape::truthy_key(body, "text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `candidates[0].content.parts[*].text`, concatenated in order.
fn candidate_parts_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    (!text.is_empty()).then_some(text)
}

/// Reply text from a generation response, if any strategy finds some.
pub fn response_text(body: &Value) -> Option<String> {
    shape::resolve(body, &TEXT_STRATEGIES).map(|resolved| {
        debug!(strategy = resolved.strategy, "extracted response text");
        resolved.value
    })
}
