//! Data models for the warning report tool.
//!
//! This module contains the core data structures shared between log
//! retrieval, aggregation, and report generation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Default pattern a line must satisfy to count as a warning.
pub const DEFAULT_WARNING_RE: &str = "^WARNING";

/// A revision of the source tree whose test logs are being inspected.
///
/// The `latest` sentinel is parsed at the CLI boundary and resolved to a
/// concrete revision id exactly once, before any cache key is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// Resolve to the most recent push known to the log store.
    Latest,
    /// A concrete revision identifier.
    Pinned(String),
}

impl From<&str> for Revision {
    fn from(s: &str) -> Self {
        match s {
            "latest" => Revision::Latest,
            other => Revision::Pinned(other.to_string()),
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Latest => write!(f, "latest"),
            Revision::Pinned(rev) => write!(f, "{}", rev),
        }
    }
}

/// One retrieved and parsed test log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestLog {
    /// Name of the test job that produced this log.
    pub job_name: String,
    /// URL the raw log was downloaded from.
    pub log_url: String,
    /// Warning line text (post-normalization) to occurrence count
    /// within this single log.
    pub warnings: HashMap<String, usize>,
}

impl TestLog {
    /// Total warning occurrences in this log.
    pub fn warning_count(&self) -> usize {
        self.warnings.values().sum()
    }
}

/// Options controlling a single report session.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Repository the revision corresponds to.
    pub repo: String,
    /// Revision to retrieve logs for.
    pub revision: Revision,
    /// Platform to get logs for.
    pub platform: String,
    /// Explicit cache directory; derived from (repo, revision, platform)
    /// when unset.
    pub cache_dir: Option<PathBuf>,
    /// Reuse previously cached logs when present.
    pub use_cache: bool,
    /// Pattern a line must satisfy to count as a warning.
    pub warning_re: String,
    /// Strip volatile substrings from warning lines before counting.
    pub normalize: bool,
    /// Select debug build artifacts instead of opt.
    pub is_debug: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            repo: "mozilla-central".to_string(),
            revision: Revision::Latest,
            platform: "linux1804-64-qr".to_string(),
            cache_dir: None,
            use_cache: true,
            warning_re: DEFAULT_WARNING_RE.to_string(),
            normalize: true,
            is_debug: true,
        }
    }
}

/// Fully resolved retrieval parameters handed to the log store.
///
/// Unlike [`ReportOptions`], the revision here is always concrete and the
/// cache directory is always set.
#[derive(Debug, Clone)]
pub struct FetchParams {
    pub repo: String,
    pub revision: String,
    pub platform: String,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
    pub warning_re: String,
    pub normalize: bool,
    pub is_debug: bool,
}

/// Result of a `top` query: the sliced ranking plus the full-table total.
#[derive(Debug, Clone)]
pub struct TopReport {
    /// Number of warnings requested for display.
    pub requested: usize,
    /// `(warning, count)` entries, already sliced and sorted.
    pub entries: Vec<(String, usize)>,
    /// Total warning occurrences over the entire table, not just the slice.
    pub total: usize,
}

/// Result of a detail query for one specific warning.
#[derive(Debug, Clone)]
pub struct WarningDetails {
    /// One-line summary: warning text, total count, revision identity.
    pub summary: String,
    /// Rendered detail block listing the affected tests.
    pub details: String,
    /// Raw `(job identity, count)` match data, sorted by descending count.
    pub matches: Vec<(String, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_from_str() {
        assert_eq!(Revision::from("latest"), Revision::Latest);
        assert_eq!(
            Revision::from("abcdef123456"),
            Revision::Pinned("abcdef123456".to_string())
        );
    }

    #[test]
    fn test_revision_display() {
        assert_eq!(Revision::Latest.to_string(), "latest");
        assert_eq!(Revision::Pinned("deadbeef".to_string()).to_string(), "deadbeef");
    }

    #[test]
    fn test_test_log_warning_count() {
        let log = TestLog {
            job_name: "test-mochitest-1".to_string(),
            log_url: "https://example.com/log".to_string(),
            warnings: [
                ("WARNING: a".to_string(), 3),
                ("WARNING: b".to_string(), 2),
            ]
            .into_iter()
            .collect(),
        };
        assert_eq!(log.warning_count(), 5);
    }

    #[test]
    fn test_test_log_round_trips_through_json() {
        let log = TestLog {
            job_name: "test-xpcshell-2".to_string(),
            log_url: "https://example.com/log".to_string(),
            warnings: [("WARNING: leaked window".to_string(), 7)]
                .into_iter()
                .collect(),
        };

        let json = serde_json::to_string(&log).unwrap();
        let parsed: TestLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.job_name, log.job_name);
        assert_eq!(parsed.warnings.get("WARNING: leaked window"), Some(&7));
    }

    #[test]
    fn test_report_options_defaults() {
        let options = ReportOptions::default();
        assert_eq!(options.repo, "mozilla-central");
        assert_eq!(options.platform, "linux1804-64-qr");
        assert_eq!(options.revision, Revision::Latest);
        assert!(options.use_cache);
        assert!(options.normalize);
        assert!(options.is_debug);
    }
}
