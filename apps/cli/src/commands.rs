//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::Section;
use color_eyre::eyre::{Report, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use leadscout_core::enrichment::LeadEnricher;
use leadscout_core::pipeline::{self, LeadRunConfig, LeadRunResult, MAX_LIMIT, ProgressReporter};
use leadscout_extract::{ProfileClient, ProfileClientOptions};
use leadscout_sheets::SheetExporter;
use leadscout_shared::{AppConfig, LEAD_FIELDS, LeadRecord, LeadScoutError, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// LeadScout: find LinkedIn profiles for a query and turn them into leads.
#[derive(Parser)]
#[command(
    name = "leadscout",
    version,
    about = "Search LinkedIn profiles, clean them into leads, and export to Google Sheets.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search for profiles matching a query and print them as leads.
    Leads {
        /// Free-text search query, e.g. "VP Sales fintech Berlin".
        query: String,

        /// Maximum number of profiles to process (1-25). Defaults to `[search] default_limit`.
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=MAX_LIMIT as i64))]
        limit: Option<u8>,

        /// Skip the model-based cleanup step.
        #[arg(long)]
        no_enrich: bool,

        /// Export the leads to a new Google Sheet.
        #[arg(long)]
        export: bool,

        /// Print leads as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadscout=info",
        1 => "leadscout=debug",
        _ => "leadscout=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so `--json` output stays machine-readable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Leads {
            query,
            limit,
            no_enrich,
            export,
            json,
        } => cmd_leads(&query, limit, !no_enrich, export, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Attach a remediation hint to configuration failures.
fn report(err: LeadScoutError) -> Report {
    let hint = err.is_config().then(|| {
        "export the variable in your shell or add it to a .env file; \
         `leadscout config show` lists the variable names in use"
    });
    let report = Report::new(err);
    match hint {
        Some(hint) => report.suggestion(hint),
        None => report,
    }
}

// ---------------------------------------------------------------------------
// leads
// ---------------------------------------------------------------------------

async fn cmd_leads(
    query: &str,
    limit: Option<u8>,
    enrich: bool,
    export: bool,
    json: bool,
) -> Result<()> {
    let config = load_config().map_err(report)?;

    // Every credential a run needs is checked before the first request.
    let client = ProfileClientOptions::from_config(&config.search)
        .and_then(|opts| ProfileClient::new(&opts))
        .map_err(report)?;
    let exporter = if export {
        Some(SheetExporter::from_config(&config.sheets).map_err(report)?)
    } else {
        None
    };
    let enricher = if enrich {
        LeadEnricher::from_config(&config.enrichment)
    } else {
        LeadEnricher::disabled()
    };
    if enrich && !enricher.is_configured() {
        info!(
            env = %config.enrichment.api_key_env,
            "enrichment key not set, leads will not be cleaned"
        );
    }

    let run_config = LeadRunConfig {
        query: query.to_string(),
        limit: limit.map_or(config.search.default_limit, usize::from),
        enrich,
    };

    info!(query, limit = run_config.limit, enrich, export, "finding leads");

    let reporter = CliProgress::new();
    let result = pipeline::run_leads(&run_config, &client, &enricher, exporter.as_ref(), &reporter)
        .await
        .map_err(|e| {
            reporter.spinner.finish_and_clear();
            report(e)
        })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.leads)?);
    } else if result.leads.is_empty() {
        println!("No leads found for \"{query}\".");
    } else {
        print_table(&result.leads);
        print_summary(&result);
    }

    if let Some(url) = &result.sheet_url {
        // Keep stdout pure JSON in --json mode.
        if json {
            eprintln!("Exported to {url}");
        } else {
            println!("  Sheet:  {url}");
            println!();
        }
    }

    Ok(())
}

fn print_table(leads: &[LeadRecord]) {
    let rows: Vec<Vec<String>> = leads.iter().map(LeadRecord::to_row).collect();
    let widths: Vec<usize> = LEAD_FIELDS
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |cells: &[&str]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!();
    println!("{}", render(&LEAD_FIELDS).trim_end());
    println!(
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", render(&cells).trim_end());
    }
}

fn print_summary(result: &LeadRunResult) {
    println!();
    println!("  Run:     {}", result.run_id);
    println!("  Leads:   {} of {} profiles", result.leads.len(), result.urls_found);
    if result.skipped > 0 {
        println!("  Skipped: {}", result.skipped);
    }
    if result.passthroughs > 0 {
        println!("  Uncleaned: {}", result.passthroughs);
    }
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn profile_extracted(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Extracting [{current}/{total}] {url}"));
    }

    fn lead_enriching(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}] {name}"));
    }

    fn done(&self, _result: &LeadRunResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config().map_err(report)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config().map_err(report)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
