//! HTTP backend for the automation service.

use std::collections::HashSet;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use leadscout_shared::{LeadScoutError, Result};

use crate::invoker::{ActionBackend, InvokeMethod};

/// User-Agent string for automation requests.
const USER_AGENT: &str = concat!("LeadScout/", env!("CARGO_PKG_VERSION"));

/// Talks to the automation service over REST. Which endpoint families a
/// deployment serves is declared up front; see [`InvokeMethod::request`].
#[derive(Debug, Clone)]
pub struct HttpActionBackend {
    client: Client,
    base_url: String,
    api_key: String,
    exposed: HashSet<InvokeMethod>,
}

impl HttpActionBackend {
    /// Build a backend exposing the named methods. No timeout is set.
    /// A blank API key is rejected before any client is built.
    pub fn new(base_url: &str, api_key: String, methods: &[String]) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(LeadScoutError::config(
                "automation API key is empty; set the variable named by [sheets] api_key_env",
            ));
        }

        let exposed = methods
            .iter()
            .map(|m| m.parse::<InvokeMethod>())
            .collect::<Result<HashSet<_>>>()?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LeadScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            exposed,
        })
    }
}

impl ActionBackend for HttpActionBackend {
    fn exposes(&self, method: InvokeMethod) -> bool {
        self.exposed.contains(&method)
    }

    async fn call(
        &self,
        method: InvokeMethod,
        tool: &str,
        action: &str,
        params: Value,
    ) -> Result<Value> {
        let (path, body) = method.request(tool, action, params);
        let url = format!("{}{path}", self.base_url);
        debug!(%url, %method, tool, action, "invoking automation action");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LeadScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LeadScoutError::Network(format!("{url}: HTTP {status}: {text}")));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| LeadScoutError::parse(format!("{url}: invalid JSON body: {e}")))?;

        // The service reports tool-level failures with a 200 and `successful: false`.
        if reply.get("successful").and_then(Value::as_bool) == Some(false) {
            let reason = reply
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("action reported failure");
            return Err(LeadScoutError::Network(format!("{action}: {reason}")));
        }

        Ok(reply)
    }
}
