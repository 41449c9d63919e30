//! Logspam - build/test log warning reporter
//!
//! A CLI tool that retrieves the test logs for a source-tree revision,
//! counts the warning lines in them, and reports either the most frequent
//! warnings or the tests that produced one specific warning.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, unknown warning, etc.)

mod analysis;
mod cli;
mod config;
mod logs;
mod models;
mod report;

use analysis::Warnings;
use anyhow::{Context, Result};
use cli::{Cli, Commands, ReportArgs};
use config::Config;
use logs::HttpLogStore;
use models::{ReportOptions, Revision};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Validate arguments
    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(cli.command, Commands::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&cli);

    info!("Logspam v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", cli);

    let Commands::Report(ref args) = cli.command else {
        return Ok(());
    };

    match run_report(&cli, args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Report failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .logspam.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".logspam.toml");

    if path.exists() {
        eprintln!("⚠️  .logspam.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .logspam.toml")?;

    println!("✅ Created .logspam.toml with default settings.");
    println!("   Edit it to customize the log store URL, repo, platform, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(cli: &Cli) {
    let level = cli.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the report workflow: fetch and aggregate logs, then print either the
/// top-N summary or the detail report for one warning.
async fn run_report(cli: &Cli, args: &ReportArgs) -> Result<()> {
    // Load configuration
    let mut config = load_config(cli)?;
    config.merge_with_args(cli, args);

    let store = HttpLogStore::new(&config.fetch, !cli.quiet)?;

    let options = ReportOptions {
        repo: config.report.repo.clone(),
        revision: Revision::from(args.revision.as_str()),
        platform: config.report.platform.clone(),
        cache_dir: args.cache_dir.clone(),
        use_cache: !args.no_cache,
        warning_re: config.report.warning_re.clone(),
        normalize: !args.no_normalize,
        is_debug: !args.opt,
    };

    if !cli.quiet {
        println!(
            "📥 Retrieving logs for {} revision {} ({})",
            options.repo, options.revision, options.platform
        );
    }

    let warnings = Warnings::fetch(&store, options).await?;
    info!("Reporting on revision: {}", warnings.revision());
    info!(
        "Using cache directory: {}",
        warnings.cache_dir().display()
    );

    if !cli.quiet {
        println!(
            "   {} logs retrieved ({} failed)\n",
            warnings.log_count(),
            warnings.dropped()
        );
    }
    if warnings.log_count() == 0 {
        warn!("No logs retrieved; the report will be empty");
    }

    match args.warning {
        None => {
            let top = warnings.top(config.report.warning_count, args.reverse);
            print!("{}", report::generate_top_report(&top));
        }
        Some(ref warning) => {
            let details = warnings.details(warning, config.report.test_summary_count)?;
            debug!("Warning matched {} tests", details.matches.len());
            println!("{}", report::generate_details_report(&details));
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = cli.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .logspam.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
