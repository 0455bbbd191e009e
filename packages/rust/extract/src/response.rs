//! Request schema and response-shape handling for the search/extract service.
//!
//! The extract endpoint does not guarantee where the structured record lives:
//! some deployments wrap it in `data`, some in `result`, some return it bare.

use serde_json::{Map, Value, json};

use leadscout_shared::LeadRecord;
use leadscout_shared::shape::{self, Strategy};

/// Substring that marks a URL as a profile page.
pub const PROFILE_URL_MARKER: &str = "linkedin.com/in";

/// Structured-output schema sent with every extract request.
pub fn profile_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "headline": {"type": "string"},
            "company": {"type": "string"},
            "location": {"type": "string"},
            "linkedin_url": {"type": "string"},
        },
        "required": ["name"],
        "additionalProperties": true,
    })
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// Where the list of search hits may live, in priority order.
const SEARCH_RESULT_STRATEGIES: [Strategy<Vec<Value>>; 2] = [
    Strategy::new("results", results_array),
    Strategy::new("data", data_array),
];

fn results_array(body: &Value) -> Option<Vec<Value>> {
    body.get("results").and_then(Value::as_array).cloned()
}

fn data_array(body: &Value) -> Option<Vec<Value>> {
    body.get("data").and_then(Value::as_array).cloned()
}

/// Pull profile URLs out of a search response, stopping at `limit` matches.
///
/// Items without a string `url`, and URLs that are not profile pages, are
/// skipped. Duplicates are kept in service order.
pub fn profile_urls(body: &Value, limit: usize) -> Vec<String> {
    let Some(resolved) = shape::resolve(body, &SEARCH_RESULT_STRATEGIES) else {
        return Vec::new();
    };

    resolved
        .value
        .iter()
        .filter_map(|item| item.get("url").and_then(Value::as_str))
        .filter(|url| url.contains(PROFILE_URL_MARKER))
        .take(limit)
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Extracted records
// ---------------------------------------------------------------------------

/// Where the extracted record may live, in priority order. `root` never declines.
const RECORD_STRATEGIES: [Strategy<Value>; 3] = [
    Strategy::new("data", data_record),
    Strategy::new("result", result_record),
    Strategy::new("root", root_record),
];

fn data_record(body: &Value) -> Option<Value> {
    shape::truthy_key(body, "data").cloned()
}

fn result_record(body: &Value) -> Option<Value> {
    shape::truthy_key(body, "result").cloned()
}

fn root_record(body: &Value) -> Option<Value> {
    Some(body.clone())
}

/// Resolve the record object inside an extract response.
/// A non-object resolution becomes an empty map.
pub fn record_object(body: &Value) -> Map<String, Value> {
    match shape::resolve(body, &RECORD_STRATEGIES) {
        Some(resolved) => match resolved.value {
            Value::Object(map) => map,
            other => {
                tracing::debug!(
                    strategy = resolved.strategy,
                    kind = json_kind(&other),
                    "extract payload is not an object, treating as empty"
                );
                Map::new()
            }
        },
        None => Map::new(),
    }
}

/// Build the lead record for `url`, filling `linkedin_url` when the service
/// left it out. An existing non-empty value is kept as returned.
pub fn lead_from_response(body: &Value, url: &str) -> LeadRecord {
    let mut lead = LeadRecord::from(record_object(body));
    if lead.linkedin_url.as_deref().is_none_or(str::is_empty) {
        lead.linkedin_url = Some(url.to_string());
    }
    lead
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
