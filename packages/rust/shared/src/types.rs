//! Core domain types for LeadScout runs.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// The five lead fields, in column order. Also the sheet header row.
pub const LEAD_FIELDS: [&str; 5] = ["name", "headline", "company", "location", "linkedin_url"];

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// LeadRecord
// ---------------------------------------------------------------------------

/// One discovered profile.
///
/// Only the five named fields are read or written by the pipeline. Any other
/// keys returned by the extraction service are kept in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct LeadRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Canonical source URL. Provenance: enrichment never changes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LeadRecord {
    /// Look up one of the five lead fields by name.
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => self.name.as_deref(),
            "headline" => self.headline.as_deref(),
            "company" => self.company.as_deref(),
            "location" => self.location.as_deref(),
            "linkedin_url" => self.linkedin_url.as_deref(),
            _ => None,
        }
    }

    /// Mutable slot for one of the five lead fields.
    pub fn field_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "name" => Some(&mut self.name),
            "headline" => Some(&mut self.headline),
            "company" => Some(&mut self.company),
            "location" => Some(&mut self.location),
            "linkedin_url" => Some(&mut self.linkedin_url),
            _ => None,
        }
    }

    /// Field value for tabular output; missing fields render as "".
    pub fn field_or_empty(&self, key: &str) -> &str {
        self.field(key).unwrap_or("")
    }

    /// The five fields as a row, in [`LEAD_FIELDS`] order.
    pub fn to_row(&self) -> Vec<String> {
        LEAD_FIELDS
            .iter()
            .map(|key| self.field_or_empty(key).to_string())
            .collect()
    }

    /// True when the record carries no fields at all.
    pub fn is_empty(&self) -> bool {
        LEAD_FIELDS.iter().all(|key| self.field(key).is_none()) && self.extra.is_empty()
    }
}

impl From<Map<String, Value>> for LeadRecord {
    fn from(map: Map<String, Value>) -> Self {
        let mut record = LeadRecord::default();
        for (key, value) in map {
            match record.field_mut(&key) {
                Some(slot) => *slot = scalar_to_string(&value),
                None => {
                    record.extra.insert(key, value);
                }
            }
        }
        record
    }
}

/// Lenient conversion of a JSON value into a field string.
/// `null` is treated as absent; non-string values are rendered as JSON.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn lead_from_object_keeps_unknown_fields() {
        let value = serde_json::json!({
            "name": "Ann",
            "company": null,
            "followers": 512,
            "linkedin_url": "https://linkedin.com/in/ann",
        });
        let lead: LeadRecord = serde_json::from_value(value).expect("deserialize lead");
        assert_eq!(lead.name.as_deref(), Some("Ann"));
        assert_eq!(lead.company, None);
        assert_eq!(lead.extra.get("followers"), Some(&serde_json::json!(512)));
        assert_eq!(lead.linkedin_url.as_deref(), Some("https://linkedin.com/in/ann"));
    }

    #[test]
    fn lead_serializes_flat() {
        let mut lead = LeadRecord {
            name: Some("Bo".into()),
            ..Default::default()
        };
        lead.extra.insert("skills".into(), serde_json::json!(["rust"]));
        let json = serde_json::to_value(&lead).expect("serialize");
        assert_eq!(json, serde_json::json!({"name": "Bo", "skills": ["rust"]}));
    }

    #[test]
    fn non_string_field_values_are_stringified() {
        let value = serde_json::json!({"name": 42, "headline": true});
        let lead: LeadRecord = serde_json::from_value(value).expect("deserialize lead");
        assert_eq!(lead.name.as_deref(), Some("42"));
        assert_eq!(lead.headline.as_deref(), Some("true"));
    }

    #[test]
    fn row_renders_missing_fields_empty() {
        let lead = LeadRecord {
            name: Some("Ann".into()),
            linkedin_url: Some("u".into()),
            ..Default::default()
        };
        assert_eq!(lead.to_row(), vec!["Ann", "", "", "", "u"]);
    }

    #[test]
    fn empty_record_detection() {
        assert!(LeadRecord::default().is_empty());
        let lead: LeadRecord = serde_json::from_value(serde_json::json!({"x": 1})).unwrap();
        assert!(!lead.is_empty());
    }
}
