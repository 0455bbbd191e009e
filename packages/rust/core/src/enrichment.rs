//! Lead cleanup through a generative text service.
//!
//! Enrichment is best-effort and total: every failure mode degrades to
//! returning the input lead. Internally each call produces an [`Enriched`]
//! outcome that records *why* a lead passed through untouched, so the policy
//! can be asserted in tests and summarized by callers.

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use leadscout_shared::shape;
use leadscout_shared::{EnrichmentConfig, LeadRecord};

use crate::gemini::{GeminiClient, GeminiOptions, response_text};

/// Instruction sent ahead of every serialized lead.
pub const CLEANUP_INSTRUCTION: &str = "You are cleaning structured lead data extracted from LinkedIn. \
Return a JSON object containing the fields name, headline, company, and location. \
Use the original value when unsure and never hallucinate companies.";

/// Fields the model is allowed to rewrite. `linkedin_url` is deliberately absent.
const CLEANED_FIELDS: [&str; 4] = ["name", "headline", "company", "location"];

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a lead came back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassthroughReason {
    /// No API key or model configured; no request was made.
    NotConfigured,
    /// The lead could not be serialized for the prompt.
    Encode(String),
    /// Network failure or non-success status.
    Transport(String),
    /// The response carried no text.
    EmptyResponse,
    /// The text was not valid JSON.
    InvalidJson(String),
    /// The JSON was valid but not an object.
    NotAnObject,
}

impl std::fmt::Display for PassthroughReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "enrichment not configured"),
            Self::Encode(e) => write!(f, "could not encode lead: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::EmptyResponse => write!(f, "empty response"),
            Self::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            Self::NotAnObject => write!(f, "response JSON is not an object"),
        }
    }
}

/// Result of enriching one lead.
#[derive(Debug, Clone, PartialEq)]
pub enum Enriched {
    /// The model's answer merged over the original.
    Cleaned(LeadRecord),
    /// The original lead, returned as-is.
    Passthrough {
        lead: LeadRecord,
        reason: PassthroughReason,
    },
}

impl Enriched {
    pub fn lead(&self) -> &LeadRecord {
        match self {
            Self::Cleaned(lead) | Self::Passthrough { lead, .. } => lead,
        }
    }

    pub fn into_lead(self) -> LeadRecord {
        match self {
            Self::Cleaned(lead) | Self::Passthrough { lead, .. } => lead,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough { .. })
    }

    fn passthrough(lead: &LeadRecord, reason: PassthroughReason) -> Self {
        Self::Passthrough {
            lead: lead.clone(),
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Cleans leads with a generative text model when one is configured.
#[derive(Debug, Clone)]
pub struct LeadEnricher {
    client: Option<GeminiClient>,
}

impl LeadEnricher {
    /// Build from config. A missing key, or a client that fails to build,
    /// yields an enricher that passes every lead through.
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self::new(&GeminiOptions::from_config(config))
    }

    pub fn new(opts: &GeminiOptions) -> Self {
        let client = match GeminiClient::new(opts) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "failed to configure enrichment client");
                None
            }
        };
        if client.is_none() {
            debug!("enrichment disabled, leads will pass through unchanged");
        }
        Self { client }
    }

    /// An enricher that never calls out.
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Clean one lead. Never fails; see [`enrich_outcome`](Self::enrich_outcome).
    pub async fn enrich(&self, lead: &LeadRecord) -> LeadRecord {
        self.enrich_outcome(lead).await.into_lead()
    }

    /// Clean one lead and report how it went.
    #[instrument(skip_all, fields(url = lead.linkedin_url.as_deref().unwrap_or("")))]
    pub async fn enrich_outcome(&self, lead: &LeadRecord) -> Enriched {
        let Some(client) = &self.client else {
            return Enriched::passthrough(lead, PassthroughReason::NotConfigured);
        };

        let serialized = match serde_json::to_string(lead) {
            Ok(s) => s,
            Err(e) => return Enriched::passthrough(lead, PassthroughReason::Encode(e.to_string())),
        };

        let outcome = match client.generate_json(&[CLEANUP_INSTRUCTION, &serialized]).await {
            Ok(body) => interpret_reply(lead, response_text(&body)),
            Err(e) => Enriched::passthrough(lead, PassthroughReason::Transport(e)),
        };

        if let Enriched::Passthrough { reason, .. } = &outcome {
            warn!(%reason, "enrichment fell back to original lead");
        }
        outcome
    }

    /// Enrich every lead in order, one request at a time.
    /// Output has the same length and order as the input.
    pub async fn enrich_all(&self, leads: &[LeadRecord]) -> Vec<LeadRecord> {
        self.enrich_all_outcomes(leads, &SilentEnrichmentProgress)
            .await
            .into_iter()
            .map(Enriched::into_lead)
            .collect()
    }

    /// [`enrich_all`](Self::enrich_all), keeping the per-lead outcomes.
    #[instrument(skip_all, fields(leads = leads.len()))]
    pub async fn enrich_all_outcomes(
        &self,
        leads: &[LeadRecord],
        progress: &dyn EnrichmentProgress,
    ) -> Vec<Enriched> {
        let total = leads.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, lead) in leads.iter().enumerate() {
            progress.task_progress(i + 1, total, lead.field_or_empty("name"));
            outcomes.push(self.enrich_outcome(lead).await);
        }

        let passthroughs = outcomes.iter().filter(|o| o.is_passthrough()).count();
        info!(
            cleaned = total - passthroughs,
            passthroughs,
            "enrichment complete"
        );
        outcomes
    }
}

// ---------------------------------------------------------------------------
// Reply interpretation
// ---------------------------------------------------------------------------

/// Turn the model's reply text into an outcome for `original`.
pub fn interpret_reply(original: &LeadRecord, text: Option<String>) -> Enriched {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Enriched::passthrough(original, PassthroughReason::EmptyResponse);
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(parsed)) => Enriched::Cleaned(merge_cleaned(original, &parsed)),
        Ok(_) => Enriched::passthrough(original, PassthroughReason::NotAnObject),
        Err(e) => {
            debug!(%text, "model reply is not JSON");
            Enriched::passthrough(original, PassthroughReason::InvalidJson(e.to_string()))
        }
    }
}

/// Field-by-field merge: the model's value when truthy, otherwise the
/// original's. `linkedin_url` always comes from `original`.
pub fn merge_cleaned(original: &LeadRecord, parsed: &Map<String, Value>) -> LeadRecord {
    let mut cleaned = LeadRecord {
        linkedin_url: original.linkedin_url.clone(),
        ..Default::default()
    };

    for key in CLEANED_FIELDS {
        let value = parsed
            .get(key)
            .and_then(model_value)
            .or_else(|| original.field(key).map(str::to_string));
        if let Some(slot) = cleaned.field_mut(key) {
            *slot = value;
        }
    }
    cleaned
}

/// Truthy model value as text. Non-string values are rendered as JSON, the
/// same way extracted records treat them.
fn model_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        other if shape::is_truthy(other) => Some(other.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for batch enrichment.
pub trait EnrichmentProgress: Send + Sync {
    /// Called before each lead is sent.
    fn task_progress(&self, current: usize, total: usize, detail: &str);
}

/// No-op enrichment progress.
pub struct SilentEnrichmentProgress;

impl EnrichmentProgress for SilentEnrichmentProgress {
    fn task_progress(&self, _current: usize, _total: usize, _detail: &str) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
