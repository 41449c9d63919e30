//! Warning aggregation across a revision's test logs.
//!
//! [`Warnings`] owns the full log set for one (repo, revision, platform)
//! session, combines per-log warning counts into a single frequency table,
//! and answers summary and detail queries against it.

use crate::analysis::matcher::WarningInfo;
use crate::logs::parser::matches_at_start;
use crate::logs::LogStore;
use crate::models::{ReportOptions, Revision, TestLog, TopReport, WarningDetails};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by summary and detail queries.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid warning pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("warning '{warning}' does not match the warning pattern '{pattern}'")]
    InvalidPattern { warning: String, pattern: String },

    #[error("warning '{warning}' was not found in any log")]
    WarningNotFound { warning: String },
}

/// Aggregated warning counts for one revision's log set.
#[derive(Debug)]
pub struct Warnings {
    repo: String,
    revision: String,
    platform: String,
    warning_re: Regex,
    cache_dir: PathBuf,
    logs: Vec<TestLog>,
    combined: HashMap<String, usize>,
    dropped: usize,
}

impl Warnings {
    /// Retrieve the logs for `options` and build the combined table.
    ///
    /// A `latest` revision is resolved first so every derived value,
    /// including the default cache directory, is stable for this session.
    /// Individual failed retrievals are dropped and counted; storage errors
    /// from the resolve and list phases propagate.
    pub async fn fetch<S: LogStore>(store: &S, options: ReportOptions) -> Result<Self> {
        let warning_re =
            Regex::new(&options.warning_re).map_err(|source| ReportError::InvalidRegex {
                pattern: options.warning_re.clone(),
                source,
            })?;

        let revision = match &options.revision {
            Revision::Latest => store.resolve_latest(&options.repo).await?,
            Revision::Pinned(rev) => rev.clone(),
        };

        let cache_dir = options.cache_dir.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}-{}-{}",
                options.repo, revision, options.platform
            ))
        });

        let params = crate::models::FetchParams {
            repo: options.repo.clone(),
            revision: revision.clone(),
            platform: options.platform.clone(),
            cache_dir: cache_dir.clone(),
            use_cache: options.use_cache,
            warning_re: options.warning_re.clone(),
            normalize: options.normalize,
            is_debug: options.is_debug,
        };

        let outcomes = store.retrieve(&params).await?;
        let attempted = outcomes.len();

        let mut logs = Vec::new();
        let mut dropped = 0;
        for outcome in outcomes {
            match outcome {
                Ok(log) => logs.push(log),
                Err(e) => {
                    dropped += 1;
                    debug!("Dropping log: {}", e);
                }
            }
        }
        if dropped > 0 {
            warn!("Dropped {} of {} logs that failed to retrieve", dropped, attempted);
        }

        let mut combined: HashMap<String, usize> = HashMap::new();
        for log in &logs {
            for (warning, count) in &log.warnings {
                *combined.entry(warning.clone()).or_default() += count;
            }
        }

        let occurrences: usize = logs.iter().map(TestLog::warning_count).sum();
        info!(
            "Aggregated {} distinct warnings ({} occurrences) across {} logs for {} revision {}",
            combined.len(),
            occurrences,
            logs.len(),
            options.repo,
            revision
        );

        Ok(Self {
            repo: options.repo,
            revision,
            platform: options.platform,
            warning_re,
            cache_dir,
            logs,
            combined,
            dropped,
        })
    }

    /// The `warning_count` most frequent warnings in descending order, or
    /// the least frequent in ascending order with `reverse`.
    ///
    /// Equal counts order lexicographically by warning text, ascending, so
    /// the ranking is deterministic regardless of map iteration order. The
    /// returned total covers the entire table, not just the slice.
    pub fn top(&self, warning_count: usize, reverse: bool) -> TopReport {
        let mut entries: Vec<(String, usize)> = self
            .combined
            .iter()
            .map(|(warning, count)| (warning.clone(), *count))
            .collect();

        if reverse {
            entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        } else {
            entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        }
        entries.truncate(warning_count);

        TopReport {
            requested: warning_count,
            entries,
            total: self.combined.values().sum(),
        }
    }

    /// Full detail report for one warning: which tests produced it and how
    /// often, bounded to `test_summary_count` listed tests.
    ///
    /// Provenance is reconstructed here by re-scanning the retained logs;
    /// the combined table only keeps merged counts, and only queried
    /// warnings ever need the per-log breakdown.
    pub fn details(
        &self,
        warning: &str,
        test_summary_count: usize,
    ) -> Result<WarningDetails, ReportError> {
        // A stored warning must be reconstructible from user input under the
        // same acceptance rule used at ingestion.
        if !matches_at_start(&self.warning_re, warning) {
            return Err(ReportError::InvalidPattern {
                warning: warning.to_string(),
                pattern: self.warning_re.as_str().to_string(),
            });
        }

        let aggregate = self.combined.get(warning).copied().unwrap_or(0);
        let mut info = WarningInfo::new(warning, aggregate);
        info.match_in_logs(&self.logs);

        if info.count() == 0 {
            return Err(ReportError::WarningNotFound {
                warning: warning.to_string(),
            });
        }
        if info.count() != info.aggregate_count() {
            warn!(
                "Matched count {} disagrees with aggregate count {} for '{}'",
                info.count(),
                info.aggregate_count(),
                warning
            );
        }

        info.details(&self.repo, &self.revision, &self.platform, test_summary_count)
    }

    /// The resolved revision this session is reporting on.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// The cache bucket derived (or supplied) for this session.
    pub fn cache_dir(&self) -> &std::path::Path {
        &self.cache_dir
    }

    /// Number of logs retained after dropping failed retrievals.
    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    /// Number of retrievals dropped as failed.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
