//! End-to-end `leads` pipeline: query → search → extract → enrich → export.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use leadscout_extract::ProfileClient;
use leadscout_sheets::{ActionBackend, SheetExporter};
use leadscout_shared::{LeadRecord, LeadScoutError, Result, RunId};

use crate::enrichment::{EnrichmentProgress, LeadEnricher};

/// Largest `limit` a single run accepts.
pub const MAX_LIMIT: usize = 25;

/// Configuration for one `leads` run.
#[derive(Debug, Clone)]
pub struct LeadRunConfig {
    /// Free-text search query.
    pub query: String,
    /// Maximum number of profile URLs to process, `1..=MAX_LIMIT`.
    pub limit: usize,
    /// Send extracted leads through the enricher.
    pub enrich: bool,
}

impl LeadRunConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(LeadScoutError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

/// Result of one `leads` run.
#[derive(Debug)]
pub struct LeadRunResult {
    pub run_id: RunId,
    /// Final leads, in search relevance order.
    pub leads: Vec<LeadRecord>,
    /// Profile URLs returned by search.
    pub urls_found: usize,
    /// URLs whose extraction failed or came back empty.
    pub skipped: usize,
    /// Leads the enricher returned unchanged.
    pub passthroughs: usize,
    /// Set when the leads were exported.
    pub sheet_url: Option<String>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each profile URL is processed.
    fn profile_extracted(&self, url: &str, current: usize, total: usize);
    /// Called before each lead is sent for enrichment.
    fn lead_enriching(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &LeadRunResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn profile_extracted(&self, _url: &str, _current: usize, _total: usize) {}
    fn lead_enriching(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &LeadRunResult) {}
}

/// Forwards enrichment ticks to a pipeline reporter.
struct EnrichmentTicks<'a>(&'a dyn ProgressReporter);

impl EnrichmentProgress for EnrichmentTicks<'_> {
    fn task_progress(&self, current: usize, total: usize, detail: &str) {
        self.0.lead_enriching(detail, current, total);
    }
}

// ---------------------------------------------------------------------------
// Search + extract
// ---------------------------------------------------------------------------

/// Everything one search-and-extract pass produced.
#[derive(Debug, Default)]
pub struct ExtractionBatch {
    /// Profile URLs from search, in order.
    pub urls: Vec<String>,
    /// Non-empty leads, in URL order.
    pub leads: Vec<LeadRecord>,
    /// URLs that produced no lead, with the failure if there was one.
    pub skipped: Vec<(String, Option<LeadScoutError>)>,
}

/// Search for `query` and extract each profile URL found, in order.
///
/// Search failure propagates. Extraction failures are logged and the URL is
/// skipped; empty records are dropped.
pub async fn search_and_extract(
    client: &ProfileClient,
    query: &str,
    limit: usize,
) -> Result<Vec<LeadRecord>> {
    Ok(extract_batch(client, query, limit, &SilentProgress).await?.leads)
}

/// [`search_and_extract`], keeping the URLs and per-URL failures.
#[instrument(skip_all, fields(query = %query, limit = limit))]
pub async fn extract_batch(
    client: &ProfileClient,
    query: &str,
    limit: usize,
    progress: &dyn ProgressReporter,
) -> Result<ExtractionBatch> {
    let urls = client.search_profiles(query, limit).await?;
    let mut batch = ExtractionBatch {
        leads: Vec::with_capacity(urls.len()),
        ..Default::default()
    };

    let total = urls.len();
    for (i, url) in urls.iter().enumerate() {
        match client.extract_profile(url).await {
            Ok(lead) if !lead.is_empty() => batch.leads.push(lead),
            Ok(_) => {
                warn!(%url, "extraction returned an empty record, skipping");
                batch.skipped.push((url.clone(), None));
            }
            Err(e) => {
                warn!(%url, error = %e, "extraction failed, skipping");
                batch.skipped.push((url.clone(), Some(e)));
            }
        }
        progress.profile_extracted(url, i + 1, total);
    }

    batch.urls = urls;
    info!(
        urls = batch.urls.len(),
        leads = batch.leads.len(),
        skipped = batch.skipped.len(),
        "extraction complete"
    );
    Ok(batch)
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Run the full `leads` pipeline.
///
/// 1. Search for profile URLs
/// 2. Extract each profile
/// 3. Enrich (when `config.enrich`)
/// 4. Export (when an exporter is supplied)
#[instrument(skip_all, fields(query = %config.query, limit = config.limit))]
pub async fn run_leads<B: ActionBackend>(
    config: &LeadRunConfig,
    client: &ProfileClient,
    enricher: &LeadEnricher,
    exporter: Option<&SheetExporter<B>>,
    progress: &dyn ProgressReporter,
) -> Result<LeadRunResult> {
    config.validate()?;

    let start = Instant::now();
    let run_id = RunId::new();
    info!(%run_id, "starting leads pipeline");

    // --- Phase 1: Search + extract ---
    progress.phase("Searching profiles");
    let batch = extract_batch(client, &config.query, config.limit, progress).await?;

    // --- Phase 2: Enrich ---
    let mut passthroughs = 0;
    let leads = if config.enrich && !batch.leads.is_empty() {
        progress.phase("Enriching leads");
        let outcomes = enricher
            .enrich_all_outcomes(&batch.leads, &EnrichmentTicks(progress))
            .await;
        passthroughs = outcomes.iter().filter(|o| o.is_passthrough()).count();
        outcomes.into_iter().map(|o| o.into_lead()).collect()
    } else {
        batch.leads
    };

    // --- Phase 3: Export ---
    let sheet_url = match exporter {
        Some(exporter) => {
            progress.phase("Exporting to spreadsheet");
            Some(exporter.export_leads(&leads).await?)
        }
        None => None,
    };

    let result = LeadRunResult {
        run_id,
        urls_found: batch.urls.len(),
        skipped: batch.skipped.len(),
        passthroughs,
        leads,
        sheet_url,
        elapsed: start.elapsed(),
    };

    info!(
        run_id = %result.run_id,
        leads = result.leads.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "leads pipeline complete"
    );
    progress.done(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscout_extract::ProfileClientOptions;
    use leadscout_sheets::HttpActionBackend;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const A: &str = "https://linkedin.com/in/a";
    const B: &str = "https://linkedin.com/in/b";

    fn client_for(server: &MockServer) -> ProfileClient {
        ProfileClient::new(&ProfileClientOptions {
            base_url: server.uri(),
            api_key: "fc-key".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    async fn mount_search(server: &MockServer, urls: &[&str]) {
        let results: Vec<_> = urls.iter().map(|u| json!({ "url": u })).collect();
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn no_export() -> Option<&'static SheetExporter<HttpActionBackend>> {
        None
    }

    #[tokio::test]
    async fn no_urls_means_no_extraction() {
        let server = MockServer::start().await;
        mount_search(&server, &[]).await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let leads = search_and_extract(&client_for(&server), "vp sales", 5).await.unwrap();
        assert!(leads.is_empty());
    }

    #[tokio::test]
    async fn failed_extraction_is_skipped() {
        let server = MockServer::start().await;
        mount_search(&server, &[A, B]).await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(body_partial_json(json!({ "url": A })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "Ann" } })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(body_partial_json(json!({ "url": B })))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let leads = search_and_extract(&client_for(&server), "founders", 5).await.unwrap();
        assert_eq!(
            leads,
            vec![LeadRecord {
                name: Some("Ann".into()),
                linkedin_url: Some(A.into()),
                ..Default::default()
            }]
        );
    }

    #[tokio::test]
    async fn non_object_payload_keeps_source_url() {
        let server = MockServer::start().await;
        mount_search(&server, &[A, B]).await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(body_partial_json(json!({ "url": A })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "Ann" } })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(body_partial_json(json!({ "url": B })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": ["not", "a", "record"] })))
            .mount(&server)
            .await;

        let batch = extract_batch(&client_for(&server), "founders", 5, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(batch.urls, vec![A, B]);
        assert!(batch.skipped.is_empty());
        assert_eq!(
            batch.leads[1],
            LeadRecord {
                linkedin_url: Some(B.into()),
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn search_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = search_and_extract(&client_for(&server), "founders", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, LeadScoutError::Search(_)));
    }

    #[tokio::test]
    async fn run_without_enrichment_or_export() {
        let server = MockServer::start().await;
        mount_search(&server, &[A]).await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "name": "Ann", "company": "Acme" }
            })))
            .mount(&server)
            .await;

        let config = LeadRunConfig { query: "founders".into(), limit: 3, enrich: false };
        let result = run_leads(
            &config,
            &client_for(&server),
            &LeadEnricher::disabled(),
            no_export(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(result.urls_found, 1);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.passthroughs, 0);
        assert!(result.sheet_url.is_none());
        assert_eq!(result.leads[0].company.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn unconfigured_enrichment_counts_passthroughs() {
        let server = MockServer::start().await;
        mount_search(&server, &[A, B]).await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Someone" })))
            .mount(&server)
            .await;

        let config = LeadRunConfig { query: "founders".into(), limit: 2, enrich: true };
        let result = run_leads(
            &config,
            &client_for(&server),
            &LeadEnricher::disabled(),
            no_export(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(result.leads.len(), 2);
        assert_eq!(result.passthroughs, 2);
        assert_eq!(result.leads[1].linkedin_url.as_deref(), Some(B));
    }

    #[tokio::test]
    async fn run_exports_through_http_backend() {
        let search = MockServer::start().await;
        mount_search(&search, &[A]).await;
        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "name": "Ann" } })))
            .mount(&search)
            .await;

        let sheets = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/actions/create_spreadsheet/execute"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "successful": true,
                "data": { "spreadsheetId": "sheet-1" }
            })))
            .expect(1)
            .mount(&sheets)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/actions/batch_update_values/execute"))
            .and(body_partial_json(json!({
                "input": {
                    "spreadsheet_id": "sheet-1",
                    "values": [
                        ["name", "headline", "company", "location", "linkedin_url"],
                        ["Ann", "", "", "", A]
                    ]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "successful": true })))
            .expect(1)
            .mount(&sheets)
            .await;

        let backend = HttpActionBackend::new(
            &sheets.uri(),
            "sheet-key".into(),
            &["execute_action".into(), "tools.execute".into()],
        )
        .unwrap();
        let exporter = SheetExporter::new(backend).unwrap();

        let config = LeadRunConfig { query: "founders".into(), limit: 1, enrich: false };
        let result = run_leads(
            &config,
            &client_for(&search),
            &LeadEnricher::disabled(),
            Some(&exporter),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(
            result.sheet_url.as_deref(),
            Some("https://docs.google.com/spreadsheets/d/sheet-1")
        );
    }

    #[tokio::test]
    async fn out_of_range_limit_is_rejected_before_search() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        for limit in [0, MAX_LIMIT + 1] {
            let config = LeadRunConfig { query: "founders".into(), limit, enrich: false };
            let err = run_leads(
                &config,
                &client_for(&server),
                &LeadEnricher::disabled(),
                no_export(),
                &SilentProgress,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, LeadScoutError::Validation { .. }));
        }
    }
}
