//! CLI entry point for the procurement data quality audit.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use decp_quality::{AuditConfig, AuditResultSet, SourceComparison};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data quality audit of the consolidated public procurement dataset",
    long_about = "Audits the consolidated DECP dataset source by source and ranks \
                  the sources on six quality dimensions.\n\n\
                  EXAMPLES:\n  \
                  # Fetch the dataset and its schema\n  \
                  decp-quality download\n\n  \
                  # Audit the first 10 000 records only\n  \
                  decp-quality audit --rows 10000\n\n  \
                  # Compare a source with a previous audit\n  \
                  decp-quality compare --source megalis-bretagne --previous audit-old.json"
)]
struct Args {
    /// Path to a TOML configuration file
    ///
    /// Defaults are used for every missing key, or when no file is given
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON is written.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the consolidated dataset and its schema
    Download,

    /// Audit the dataset and save the results
    Audit {
        /// Only audit the first N records of the dataset
        #[arg(long)]
        rows: Option<usize>,
    },

    /// Launch the reporting dashboard
    Web,

    /// Compare one source between two audit results
    Compare {
        /// Source to compare
        #[arg(short, long)]
        source: String,

        /// Latest audit results (defaults to the configured results path)
        #[arg(long)]
        current: Option<PathBuf>,

        /// Older audit results
        #[arg(long)]
        previous: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AuditConfig> {
    match path {
        Some(path) => {
            let config = AuditConfig::from_toml_file(path)?;
            debug!("Configuration loaded from {}", path.display());
            Ok(config)
        }
        None => Ok(AuditConfig::default()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    let config = load_config(args.config.as_deref())?;

    match &args.command {
        Commands::Download => run_download(&config),
        Commands::Audit { rows } => run_audit(&config, *rows, args.json),
        Commands::Web => run_web(&config),
        Commands::Compare {
            source,
            current,
            previous,
        } => run_compare(&config, source, current.as_deref(), previous.as_deref(), args.json),
    }
}

#[cfg(feature = "download")]
fn run_download(config: &AuditConfig) -> Result<()> {
    decp_quality::download::run(config)?;
    info!("Download complete");
    Ok(())
}

#[cfg(not(feature = "download"))]
fn run_download(_config: &AuditConfig) -> Result<()> {
    bail!("This binary was built without the \"download\" feature")
}

/// Run the audit and print a summary.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_audit(config: &AuditConfig, rows: Option<usize>, json_output: bool) -> Result<()> {
    let run = decp_quality::audit::run(config, rows)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&run.results.to_serialized())?
        );
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("AUDIT RESULTS");
    println!("{}\n", "=".repeat(80));
    println!("  Records audited: {}", run.num_records);
    println!("  Results file:    {}", run.output.display());
    println!("  Duration:        {}ms", run.duration_ms);
    println!();
    println!("{:<28} {:>10} {:>6}", "Source", "General", "Rank");
    println!("{}", "-".repeat(46));
    for result in run.results.results() {
        let rank = result
            .general
            .rank
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!(
            "{:<28} {:>10.6} {:>6}",
            result.source, result.general.value, rank
        );
    }
    println!();
    Ok(())
}

fn run_web(config: &AuditConfig) -> Result<()> {
    let (program, arguments) = config
        .web
        .command
        .split_first()
        .ok_or_else(|| anyhow!("web.command is empty"))?;

    info!("Launching {}", config.web.command.join(" "));
    let status = Command::new(program)
        .args(arguments)
        .status()
        .with_context(|| format!("Failed to launch '{}'", program))?;

    if !status.success() {
        bail!("'{}' exited with {}", program, status);
    }
    Ok(())
}

fn run_compare(
    config: &AuditConfig,
    source: &str,
    current: Option<&Path>,
    previous: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let current_path = current.unwrap_or(&config.paths.results);
    let current = AuditResultSet::load_json(current_path)?;
    let previous = previous.map(AuditResultSet::load_json).transpose()?;

    let current_result = current.lookup(source)?;
    let previous_result = match &previous {
        Some(set) => Some(set.lookup(source)?),
        None => None,
    };

    let comparison = SourceComparison::new(current_result, previous_result);
    if json_output {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print!("{}", comparison);
    }
    Ok(())
}
