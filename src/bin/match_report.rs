use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Parser;
use pema_rs::matching::report::summarize;
use pema_rs::{Interval, PeakMatcherBuilder, PemaConfig};
use tracing_subscriber::EnvFilter;

#[path = "match_report/json_report_formatter.rs"]
mod json_report_formatter;

#[derive(Debug, Parser)]
#[command(name = "match_report")]
#[command(about = "Match truth intervals against reconstructed peaks and write a JSON report")]
struct Args {
    /// JSON array of truth intervals, sorted by start.
    #[arg(long, env = "PEMA_TRUTH")]
    truth: PathBuf,

    /// JSON array of reconstructed peaks, sorted by start.
    #[arg(long, env = "PEMA_PEAKS")]
    peaks: PathBuf,

    /// Optional matching/acceptance config; defaults apply to missing fields.
    #[arg(long, env = "PEMA_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `matching.fuzz_ns` from the config.
    #[arg(long)]
    fuzz_ns: Option<i64>,

    #[arg(long, env = "PEMA_REPORT_OUT", default_value = "match_report.json")]
    out: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        tracing::error!(error = %err, "match_report failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PemaConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => PemaConfig::default(),
    };
    let mut builder = PeakMatcherBuilder::new(config);
    if let Some(fuzz_ns) = args.fuzz_ns {
        builder = builder.with_fuzz_ns(fuzz_ns);
    }
    let matcher = builder
        .build()
        .map_err(|err| format!("Failed to build PeakMatcher: {err}"))?;

    let truth = read_intervals(&args.truth)?;
    let peaks = read_intervals(&args.peaks)?;
    tracing::info!(
        truth = truth.len(),
        peaks = peaks.len(),
        fuzz_ns = matcher.config().matching.fuzz_ns,
        "matching inputs loaded"
    );

    let result = matcher
        .match_with_acceptance(&truth, &peaks)
        .map_err(|err| format!("Matching failed: {err}"))?;
    let summary = summarize(&truth, &result.output, &result.acceptance);
    let sentinel = matcher.config().no_match_sentinel;

    let report = json_report_formatter::Report {
        schema_version: json_report_formatter::SCHEMA_VERSION,
        meta: json_report_formatter::Meta {
            generated_at: Utc::now().to_rfc3339(),
            truth_count: truth.len(),
            peak_count: peaks.len(),
            fuzz_ns: matcher.config().matching.fuzz_ns,
            no_match_sentinel: sentinel,
        },
        summary,
        truth: result
            .output
            .truth
            .iter()
            .map(|record| record.flatten(sentinel))
            .collect(),
        peaks: result
            .output
            .peaks
            .iter()
            .map(|record| record.flatten(sentinel))
            .collect(),
        acceptance: result.acceptance,
    };
    json_report_formatter::write_report(&args.out, &report)?;

    tracing::info!(
        out = %args.out.display(),
        found_fraction = report.summary.found_fraction,
        "report written"
    );
    Ok(())
}

fn read_intervals(path: &Path) -> Result<Vec<Interval>, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read intervals '{}': {err}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse intervals '{}': {err}", path.display()))
}
