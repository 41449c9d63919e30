//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::DEFAULT_WARNING_RE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Logspam - build/test log warning reporter
///
/// Retrieve the test logs for a revision, count the warning lines in them,
/// and report either the most frequent warnings or the tests that produced
/// one specific warning.
///
/// Examples:
///   logspam report latest
///   logspam report abcdef123456 --platform windows11-64 --warning-count 20
///   logspam report latest "WARNING: No docshell" --test-summary-count 5
///   logspam init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .logspam.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate an overall warning report or a report for a specific warning
    Report(ReportArgs),
    /// Generate a default .logspam.toml configuration file
    InitConfig,
}

/// Arguments for the `report` subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// Revision to retrieve logs for. Use "latest" for the most recent push.
    pub revision: String,

    /// Optional: the text of a warning you want the full details of
    pub warning: Option<String>,

    /// Repository the revision corresponds to
    #[arg(long, default_value = "mozilla-central")]
    pub repo: String,

    /// Platform to get logs for
    #[arg(long, default_value = "linux1804-64-qr")]
    pub platform: String,

    /// Regex used to match lines. Can be used to match debug messages that
    /// are not proper warnings.
    #[arg(long, value_name = "PATTERN", default_value = DEFAULT_WARNING_RE)]
    pub warning_re: String,

    /// Redownload logs if already present
    #[arg(long)]
    pub no_cache: bool,

    /// Directory to cache logs to. Default: <repo>-<revision>-<platform>
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Number of warnings to show in the default summary
    #[arg(long, default_value = "40", value_name = "COUNT")]
    pub warning_count: usize,

    /// Number of tests to list in warning summary mode
    #[arg(long, default_value = "10", value_name = "COUNT")]
    pub test_summary_count: usize,

    /// Print the least common warnings instead
    #[arg(long)]
    pub reverse: bool,

    /// Skip normalizing and save the actual log text
    #[arg(long)]
    pub no_normalize: bool,

    /// Get opt build reports instead of debug. Not useful for warnings.
    #[arg(long)]
    pub opt: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Commands::Report(ref args) = self.command {
            if args.warning_count == 0 {
                return Err("Warning count must be at least 1".to_string());
            }

            if args.test_summary_count == 0 {
                return Err("Test summary count must be at least 1".to_string());
            }

            if args.revision.trim().is_empty() {
                return Err("Revision must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_report_defaults() {
        let cli = parse(&["logspam", "report", "latest"]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report subcommand");
        };

        assert_eq!(args.revision, "latest");
        assert_eq!(args.warning, None);
        assert_eq!(args.repo, "mozilla-central");
        assert_eq!(args.platform, "linux1804-64-qr");
        assert_eq!(args.warning_re, "^WARNING");
        assert_eq!(args.warning_count, 40);
        assert_eq!(args.test_summary_count, 10);
        assert!(!args.no_cache);
        assert!(!args.reverse);
        assert!(!args.no_normalize);
        assert!(!args.opt);
    }

    #[test]
    fn test_report_with_warning_positional() {
        let cli = parse(&["logspam", "report", "abc123", "WARNING: leaked window"]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report subcommand");
        };

        assert_eq!(args.revision, "abc123");
        assert_eq!(args.warning.as_deref(), Some("WARNING: leaked window"));
    }

    #[test]
    fn test_report_flag_overrides() {
        let cli = parse(&[
            "logspam",
            "report",
            "latest",
            "--repo",
            "autoland",
            "--no-cache",
            "--reverse",
            "--opt",
            "--warning-count",
            "5",
        ]);
        let Commands::Report(args) = cli.command else {
            panic!("expected report subcommand");
        };

        assert_eq!(args.repo, "autoland");
        assert!(args.no_cache);
        assert!(args.reverse);
        assert!(args.opt);
        assert_eq!(args.warning_count, 5);
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut cli = parse(&["logspam", "report", "latest"]);
        cli.verbose = true;
        cli.quiet = true;
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validation_zero_counts() {
        let cli = parse(&["logspam", "report", "latest", "--warning-count", "0"]);
        assert!(cli.validate().is_err());

        let cli = parse(&["logspam", "report", "latest", "--test-summary-count", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut cli = parse(&["logspam", "report", "latest"]);
        assert_eq!(cli.log_level(), tracing::Level::INFO);

        cli.verbose = true;
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);

        cli.verbose = false;
        cli.quiet = true;
        assert_eq!(cli.log_level(), tracing::Level::ERROR);
    }
}
