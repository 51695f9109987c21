mod catalog;
mod collectors;
mod config;
mod evaluate;
mod metrics;
mod model;
mod report;
mod runner;
mod summary;

use catalog::CheckCatalog;
use chrono::Local;
use clap::{Parser, ValueEnum};
use collectors::{run_all, CheckRun, Selection};
use config::{ConfigError, Environment, Inventory, ReportKind};
use metrics::Metrics;
use model::{now_rfc3339, CheckOutcome, ReportRow};
use report::{console, generate_reports, ReportError, ReportMeta};
use runner::{DemoRunner, RemoteRunner, SshRunner};
use serde::Serialize;
use std::path::{Path, PathBuf};
use summary::{duplicate_ids, summarize, Summary};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code for unusable inventory or catalog, distinct from the 0/1/2 health codes.
const CONFIG_EXIT_CODE: i32 = 3;

#[derive(Parser, Debug)]
#[command(name = "infracheck")]
#[command(version, about = "Periodic infrastructure inspection across dev, staging and production")]
struct Cli {
    #[arg(
        long,
        short = 'i',
        env = "INFRACHECK_INVENTORY",
        default_value = "./config/inventory.yaml"
    )]
    inventory: PathBuf,
    #[arg(long, short = 'c', default_value = "./config/check_items.yaml")]
    checks: PathBuf,
    /// Overrides `report.type` from the inventory.
    #[arg(long = "type", short = 't', value_enum)]
    report_type: Option<ReportKind>,
    /// Overrides `report.output_dir` from the inventory.
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,
    #[arg(long, short = 'e', value_enum, default_value_t = EnvArg::All)]
    env: EnvArg,
    /// Use canned sample outputs instead of connecting to hosts.
    #[arg(long)]
    demo: bool,
    /// Print results as JSON on stdout and skip report files.
    #[arg(long)]
    json: bool,
    #[arg(long, short = 'q')]
    quiet: bool,
    /// Write run gauges in Prometheus text format to this file.
    #[arg(long)]
    metrics_file: Option<PathBuf>,
    #[arg(long)]
    print_default_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EnvArg {
    Dev,
    Stg,
    Prd,
    All,
}

impl EnvArg {
    fn selection(self) -> Selection {
        match self {
            EnvArg::Dev => Selection::Only(Environment::Development),
            EnvArg::Stg => Selection::Only(Environment::Staging),
            EnvArg::Prd => Selection::Only(Environment::Production),
            EnvArg::All => Selection::All,
        }
    }

    fn label(self) -> &'static str {
        match self {
            EnvArg::Dev => "DEV",
            EnvArg::Stg => "STG",
            EnvArg::Prd => "PRD",
            EnvArg::All => "ALL",
        }
    }
}

/// `--json` payload. Results use the same labeled rows as the report files.
#[derive(Serialize)]
struct JsonOutput<'a> {
    summary: &'a Summary,
    results: Vec<ReportRow>,
    timestamp: String,
    demo_mode: bool,
}

impl<'a> JsonOutput<'a> {
    fn new(summary: &'a Summary, outcomes: &[CheckOutcome], demo_mode: bool) -> Self {
        Self {
            summary,
            results: report::rows(outcomes),
            timestamp: now_rfc3339(),
            demo_mode,
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Inventory::example_yaml());
        return;
    }

    let (inventory, catalog) = match load_inputs(&cli.inventory, &cli.checks) {
        Ok(loaded) => loaded,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    let mut report_cfg = inventory.report.clone();
    if let Some(kind) = cli.report_type {
        report_cfg.kind = kind;
    }
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&report_cfg.output_dir));
    let meta = ReportMeta::new(&report_cfg, Local::now());

    let runner: Box<dyn RemoteRunner> = if cli.demo {
        Box::new(DemoRunner)
    } else {
        Box::new(SshRunner::new(&inventory.ssh, &inventory.probes))
    };

    let interactive = !cli.json && !cli.quiet;
    if interactive {
        console::print_banner(&meta, cli.env.label(), runner.name(), cli.demo);
    }
    info!(
        runner = runner.name(),
        environments = cli.env.label(),
        checks = catalog.all().count(),
        "starting inspection"
    );

    let run = CheckRun {
        runner: runner.as_ref(),
        catalog: &catalog,
        expected_http_status: inventory.probes.http_expected_status,
    };
    let outcomes = run_all(&run, &inventory, cli.env.selection()).await;
    let summary = summarize(&outcomes);

    for id in duplicate_ids(&outcomes) {
        warn!(id = %id, "check id reused by different checks");
    }
    info!(
        total = summary.total,
        ok = summary.ok,
        warning = summary.warning,
        critical = summary.critical,
        unknown = summary.unknown,
        "inspection finished"
    );

    if let Some(path) = &cli.metrics_file {
        match export_metrics(&outcomes, &summary, path) {
            Ok(()) => info!(path = %path.display(), "metrics written"),
            Err(err) => error!(error = %err, "failed to write metrics"),
        }
    }

    if cli.json {
        let output = JsonOutput::new(&summary, &outcomes, cli.demo);
        match serde_json::to_string_pretty(&output) {
            Ok(body) => println!("{body}"),
            Err(err) => error!(error = %err, "failed to encode JSON output"),
        }
    } else {
        if interactive {
            console::print_summary(&summary);
        }
        let rows = report::rows(&outcomes);
        match generate_reports(&meta, &rows, &summary, &output_dir) {
            Ok(written) if interactive => console::print_reports(&written),
            Ok(_) => {}
            Err(err) => error!(error = %err, "failed to write reports"),
        }
        if interactive {
            console::print_issues(&outcomes);
            console::print_footer();
        }
    }

    std::process::exit(summary.exit_code());
}

fn load_inputs(inventory: &Path, checks: &Path) -> Result<(Inventory, CheckCatalog), ConfigError> {
    let inventory = Inventory::load_from_file(inventory)?;
    let catalog = CheckCatalog::load_from_file(checks)?;
    Ok((inventory, catalog))
}

fn export_metrics(outcomes: &[CheckOutcome], summary: &Summary, path: &Path) -> Result<(), ReportError> {
    let metrics = Metrics::new()?;
    metrics.update_from_run(outcomes, summary);
    metrics.write_textfile(path)
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
