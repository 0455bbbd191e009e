//! Spreadsheet export of lead lists through the automation service.
//!
//! [`SheetExporter::export_leads`] creates a fresh spreadsheet, writes a
//! header row plus one row per lead into `Leads!A1`, and returns the sheet's
//! public URL.

mod http;
mod invoker;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{info, instrument};

use leadscout_shared::shape::{self, Strategy};
use leadscout_shared::{LEAD_FIELDS, LeadRecord, LeadScoutError, Result, SheetsConfig, require_api_key};

pub use http::HttpActionBackend;
pub use invoker::{ActionBackend, ActionInvoker, InvokeMethod};

/// Tool name of the spreadsheet integration.
pub const SHEETS_TOOL: &str = "google_sheets";

/// Action creating an empty spreadsheet.
pub const CREATE_ACTION: &str = "create_spreadsheet";

/// Action bulk-writing a block of values.
pub const WRITE_ACTION: &str = "batch_update_values";

/// Target range for the header + lead rows.
pub const LEADS_RANGE: &str = "Leads!A1";

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Writes lead lists to new spreadsheets.
#[derive(Debug)]
pub struct SheetExporter<B> {
    invoker: ActionInvoker<B>,
}

impl SheetExporter<HttpActionBackend> {
    /// Exporter over the HTTP backend. Fails before any network activity when
    /// the API key is unset or no invocation method is available.
    pub fn from_config(config: &SheetsConfig) -> Result<Self> {
        let api_key = require_api_key(&config.api_key_env)?;
        let backend = HttpActionBackend::new(&config.base_url, api_key, &config.methods)?;
        Self::new(backend)
    }
}

impl<B: ActionBackend> SheetExporter<B> {
    /// Bind to `backend`, resolving its invocation method now.
    pub fn new(backend: B) -> Result<Self> {
        Ok(Self {
            invoker: ActionInvoker::resolve(backend)?,
        })
    }

    /// The invocation method chosen for the backend.
    pub fn method(&self) -> InvokeMethod {
        self.invoker.method()
    }

    /// Export `leads` to a new spreadsheet and return its URL.
    pub async fn export_leads(&self, leads: &[LeadRecord]) -> Result<String> {
        self.export_leads_at(leads, Utc::now()).await
    }

    /// [`export_leads`](Self::export_leads) with an explicit creation time.
    #[instrument(skip_all, fields(leads = leads.len(), method = %self.invoker.method()))]
    pub async fn export_leads_at(&self, leads: &[LeadRecord], now: DateTime<Utc>) -> Result<String> {
        let title = sheet_title(now);
        let created = self
            .invoker
            .invoke(SHEETS_TOOL, CREATE_ACTION, json!({ "title": title }))
            .await
            .map_err(|e| LeadScoutError::SheetCreation(e.to_string()))?;

        let spreadsheet_id = spreadsheet_id(&created).ok_or_else(|| {
            LeadScoutError::SheetCreation("response carried no spreadsheet id".into())
        })?;
        info!(%spreadsheet_id, %title, "spreadsheet created");

        let rows = sheet_rows(leads);
        let row_count = rows.len();
        self.invoker
            .invoke(
                SHEETS_TOOL,
                WRITE_ACTION,
                json!({
                    "spreadsheet_id": spreadsheet_id,
                    "range": LEADS_RANGE,
                    "values": rows,
                    "value_input_option": "RAW",
                }),
            )
            .await
            .map_err(|e| LeadScoutError::Export(e.to_string()))?;

        info!(rows = row_count, "rows written");
        Ok(sheet_url(&spreadsheet_id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `Leads YYYY-MM-DD HH:MM:SS UTC`.
pub fn sheet_title(now: DateTime<Utc>) -> String {
    format!("Leads {}", now.format("%Y-%m-%d %H:%M:%S UTC"))
}

/// Header row followed by one row per lead; missing fields are "".
pub fn sheet_rows(leads: &[LeadRecord]) -> Vec<Vec<String>> {
    let header: Vec<String> = LEAD_FIELDS.iter().map(|f| f.to_string()).collect();
    std::iter::once(header)
        .chain(leads.iter().map(LeadRecord::to_row))
        .collect()
}

/// Public URL of a spreadsheet.
pub fn sheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}")
}

/// Identifier keys, in priority order.
const ID_STRATEGIES: [Strategy<String>; 3] = [
    Strategy::new("spreadsheetId", camel_id),
    Strategy::new("spreadsheet_id", snake_id),
    Strategy::new("id", bare_id),
];

fn camel_id(payload: &Value) -> Option<String> {
    payload.get("spreadsheetId").and_then(shape::truthy_string)
}

fn snake_id(payload: &Value) -> Option<String> {
    payload.get("spreadsheet_id").and_then(shape::truthy_string)
}

fn bare_id(payload: &Value) -> Option<String> {
    payload.get("id").and_then(shape::truthy_string)
}

/// Spreadsheet id from a creation response. Keys are looked up on the `data`
/// object first when the response wraps its payload there, then on the root.
pub fn spreadsheet_id(response: &Value) -> Option<String> {
    response
        .get("data")
        .filter(|d| d.is_object())
        .and_then(|data| shape::resolve(data, &ID_STRATEGIES))
        .or_else(|| shape::resolve(response, &ID_STRATEGIES))
        .map(|resolved| resolved.value)
}
