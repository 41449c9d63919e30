//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.logspam.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Log store fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { verbose: false }
    }
}

/// Log store fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the log store API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of concurrent log downloads.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_base_url() -> String {
    "https://treeherder.mozilla.org".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_concurrency() -> usize {
    8
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Repository the revision corresponds to.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Platform to get logs for.
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Pattern a line must satisfy to count as a warning.
    #[serde(default = "default_warning_re")]
    pub warning_re: String,

    /// Number of warnings to show in the summary report.
    #[serde(default = "default_warning_count")]
    pub warning_count: usize,

    /// Number of tests to list in warning detail mode.
    #[serde(default = "default_test_summary_count")]
    pub test_summary_count: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            platform: default_platform(),
            warning_re: default_warning_re(),
            warning_count: default_warning_count(),
            test_summary_count: default_test_summary_count(),
        }
    }
}

fn default_repo() -> String {
    "mozilla-central".to_string()
}

fn default_platform() -> String {
    "linux1804-64-qr".to_string()
}

fn default_warning_re() -> String {
    crate::models::DEFAULT_WARNING_RE.to_string()
}

fn default_warning_count() -> usize {
    40
}

fn default_test_summary_count() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".logspam.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with command-line arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, cli: &crate::cli::Cli, args: &crate::cli::ReportArgs) {
        // Report settings - always override since they have defaults in CLI
        self.report.repo = args.repo.clone();
        self.report.platform = args.platform.clone();
        self.report.warning_re = args.warning_re.clone();
        self.report.warning_count = args.warning_count;
        self.report.test_summary_count = args.test_summary_count;

        // Flags always override
        if cli.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
