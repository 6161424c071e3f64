//! apiusage - Chart API usage for your monitored assets over any date range

mod config;
mod engine;
mod error;
mod sources;
mod types;
mod utils;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Settings;
use engine::{classify, MetricsAssembler, SeenSeries};
use sources::{identity, select_source, MetricsQuery};
use std::path::{Path, PathBuf};
use std::io::Write;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use types::{DateRange, OutputFormat};
use utils::format::{
    format_csv, format_json, format_periods, format_table, print_banner, print_doctor_results,
};
use utils::time::{default_range, today_utc};

#[derive(Parser)]
#[command(name = "apiusage")]
#[command(author, version, about = "Chart API usage for your monitored assets over any date range")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// First day of the range (YYYY-MM-DD), defaults to the first of this month
    #[arg(long, global = true)]
    from: Option<NaiveDate>,

    /// Last day of the range, inclusive (YYYY-MM-DD), defaults to today
    #[arg(long, global = true)]
    to: Option<NaiveDate>,

    /// Read metrics from a JSON export instead of the configured endpoint
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Email used to scope the metrics query
    #[arg(short, long)]
    email: Option<String>,

    /// Only print series not already listed in this file, then add them to it
    #[arg(long, value_name = "FILE")]
    exclude_seen: Option<PathBuf>,

    /// Forget the series in --exclude-seen before this run
    #[arg(long, requires = "exclude_seen")]
    refresh: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check endpoint, credentials and default paths
    Doctor,
    /// Show how the date range is split into periods
    Period,
    /// List the series colours
    Palette,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Doctor) => run_doctor(&cli).await,
        Some(Commands::Period) => run_period(&cli),
        Some(Commands::Palette) => run_palette(),
        None => run_usage_query(&cli).await,
    }
}

/// Logs go to stderr so JSON and CSV output stay clean
fn init_tracing(verbose: bool) {
    let level = if verbose { "apiusage=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> anyhow::Result<DateRange> {
    let default = default_range(today_utc())?;
    Ok(DateRange::new(
        from.unwrap_or(default.from()),
        to.unwrap_or(default.to()),
    )?)
}

async fn run_usage_query(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    let range = resolve_range(cli.from, cli.to)?;
    let plan = classify(&range);
    let source = select_source(cli.input.clone(), &settings);
    debug!(source = source.name(), %range, granularity = %plan.granularity(), "querying metrics");

    let query = MetricsQuery::new(range, plan.granularity());
    let identity = identity::resolve_email(cli.email.as_deref());

    // The endpoint needs the email as a query variable; a local export does
    // not, so both lookups can run together
    let (email, results) = if source.needs_identity() {
        let email = identity
            .await
            .context("could not determine your email; pass --email or set APIUSAGE_EMAIL")?;
        let results = source.fetch(&query.with_email(Some(email.clone()))).await?;
        (Some(email), results)
    } else {
        let (email, results) = futures::future::join(identity, source.fetch(&query)).await;
        (email, results?)
    };

    let assembler = MetricsAssembler::new(settings.palette.clone());
    let chart = match cli.exclude_seen {
        Some(ref path) => {
            let mut seen = load_seen(path)?;
            if cli.refresh {
                seen.clear();
            }
            let chart = assembler.assemble_incremental(&plan, &results, &mut seen);
            save_seen(path, &seen)?;
            chart
        }
        None => assembler.assemble_plan(&plan, &results),
    };

    let output = match cli.format {
        OutputFormat::Table => {
            print_banner(&range, chart.granularity.period_name(), email.as_deref());
            if chart.is_empty() {
                format!("{}", "No usage data for the selected range.".yellow())
            } else {
                format_table(&chart)
            }
        }
        OutputFormat::Json => format_json(&chart.to_payload()?),
        OutputFormat::Csv => format_csv(&chart),
    };

    println!("{}", output);

    if cli.verbose && matches!(cli.format, OutputFormat::Table) {
        println!("\n{}", "Data Source:".bold());
        println!("  {} {}", "✓".green(), source.display_name().dimmed());
    }

    Ok(())
}

fn load_seen(path: &Path) -> anyhow::Result<SeenSeries> {
    if !path.exists() {
        return Ok(SeenSeries::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // The table only suppresses repeats; a damaged one means a full refresh
    match serde_json::from_str(&content) {
        Ok(seen) => Ok(seen),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable seen table, starting empty");
            Ok(SeenSeries::new())
        }
    }
}

/// Write the table next to its destination first, then rename it into place
fn save_seen(path: &Path, seen: &SeenSeries) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(seen)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temp file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", file.path().display()))?;
    file.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn run_period(cli: &Cli) -> anyhow::Result<()> {
    let range = resolve_range(cli.from, cli.to)?;
    let plan = classify(&range);
    let labels = engine::axis_labels(&plan);

    println!();
    println!("  {}\n", range.to_string().cyan());
    println!("{}", format_periods(&plan, &labels));
    Ok(())
}

fn run_palette() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    println!("{}\n", "Series Colours:".bold());
    for (i, colour) in settings.palette.colours().iter().enumerate() {
        println!("  {} {}", format!("{:>2}", i).dimmed(), colour);
    }
    println!(
        "\n  Series {} and {} share a colour. Override with {}.\n",
        "n".cyan(),
        format!("n + {}", settings.palette.len()).cyan(),
        config::PALETTE_VAR.cyan()
    );
    Ok(())
}

async fn run_doctor(cli: &Cli) -> anyhow::Result<()> {
    println!("{}\n", "Running diagnostics...".cyan());

    let mut checks: Vec<(String, String, bool)> = Vec::new();

    let settings = match Settings::from_env() {
        Ok(settings) => {
            checks.push(("Environment".to_string(), "valid".to_string(), true));
            settings
        }
        Err(e) => {
            checks.push(("Environment".to_string(), e.to_string(), false));
            Settings::default()
        }
    };

    checks.push(match settings.endpoint {
        Some(ref url) => ("Metrics endpoint".to_string(), url.clone(), true),
        None => (
            "Metrics endpoint".to_string(),
            format!("{} not set (local export is used)", config::ENDPOINT_VAR),
            false,
        ),
    });

    checks.push((
        "Access token".to_string(),
        if settings.token.is_some() {
            format!("{} set", config::TOKEN_VAR)
        } else {
            format!("{} not set", config::TOKEN_VAR)
        },
        settings.token.is_some(),
    ));

    match identity::resolve_email(cli.email.as_deref()).await {
        Some(email) => checks.push(("Email".to_string(), email, true)),
        None => checks.push((
            "Email".to_string(),
            format!("pass --email, set {} or git user.email", config::EMAIL_VAR),
            false,
        )),
    }

    let export = cli.input.clone().or_else(utils::paths::default_metrics_file);
    if let Some(path) = export {
        let exists = path.exists();
        checks.push((
            "Metrics export".to_string(),
            path.to_string_lossy().to_string(),
            exists,
        ));
    }

    print_doctor_results(&checks);

    let found_count = checks.iter().filter(|(_, _, found)| *found).count();
    println!(
        "\n{}: {} of {} checks passed\n",
        "Summary".bold(),
        found_count.to_string().green(),
        checks.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_range_and_format() {
        let cli = Cli::try_parse_from([
            "apiusage", "--from", "2024-01-01", "--to", "2024-03-01", "-f", "json",
        ])
        .unwrap();
        assert_eq!(cli.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_refresh_requires_seen_file() {
        assert!(Cli::try_parse_from(["apiusage", "--refresh"]).is_err());
        assert!(
            Cli::try_parse_from(["apiusage", "--exclude-seen", "seen.json", "--refresh"]).is_ok()
        );
    }

    #[test]
    fn test_resolve_range_rejects_reversed_dates() {
        let from = NaiveDate::from_ymd_opt(2024, 2, 1);
        let to = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(resolve_range(from, to).is_err());
        assert!(resolve_range(to, from).is_ok());
    }

    #[test]
    fn test_seen_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        assert!(load_seen(&path).unwrap().is_empty());

        let seen: SeenSeries = serde_json::from_str(r#"["A1P1"]"#).unwrap();
        save_seen(&path, &seen).unwrap();
        assert!(load_seen(&path).unwrap().contains("A1P1"));
    }

    #[test]
    fn test_corrupt_seen_file_starts_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        std::fs::write(&path, r#"["A1P1", "A2"#).unwrap();
        assert!(load_seen(&path).unwrap().is_empty());

        let seen: SeenSeries = serde_json::from_str(r#"["A2P1"]"#).unwrap();
        save_seen(&path, &seen).unwrap();
        let reloaded = load_seen(&path).unwrap();
        assert!(reloaded.contains("A2P1"));
        assert!(!reloaded.contains("A1P1"));

        // Only the table itself is left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
