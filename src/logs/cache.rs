//! On-disk caching of parsed warning tables.
//!
//! Each (repo, revision, platform) bucket is a directory holding one JSON
//! file per test log plus a manifest recording the parameters the logs were
//! fetched with. A manifest that does not match the current request forces a
//! refetch; reads are safe for concurrent process instances, writes are not
//! coordinated here.

use crate::models::{FetchParams, TestLog};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const MANIFEST_FILE: &str = "manifest.json";

/// Parameters the cached logs were fetched with, plus a fetch timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheManifest {
    repo: String,
    revision: String,
    platform: String,
    warning_re: String,
    normalize: bool,
    is_debug: bool,
    fetched_at: DateTime<Utc>,
}

impl CacheManifest {
    fn from_params(params: &FetchParams) -> Self {
        Self {
            repo: params.repo.clone(),
            revision: params.revision.clone(),
            platform: params.platform.clone(),
            warning_re: params.warning_re.clone(),
            normalize: params.normalize,
            is_debug: params.is_debug,
            fetched_at: Utc::now(),
        }
    }

    /// Cached logs are only reusable when every parameter that affects
    /// parsing matches the current request.
    fn matches(&self, params: &FetchParams) -> bool {
        self.repo == params.repo
            && self.revision == params.revision
            && self.platform == params.platform
            && self.warning_re == params.warning_re
            && self.normalize == params.normalize
            && self.is_debug == params.is_debug
    }
}

/// Disk cache for one (repo, revision, platform) bucket.
pub struct LogCache {
    dir: PathBuf,
}

impl LogCache {
    /// Create a cache handle for the given bucket directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load cached logs, or `None` when the bucket is absent or was fetched
    /// with different parameters.
    pub fn load(&self, params: &FetchParams) -> Result<Option<Vec<TestLog>>> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let manifest: CacheManifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        if !manifest.matches(params) {
            debug!(
                "Cache at {} was fetched with different parameters, ignoring",
                self.dir.display()
            );
            return Ok(None);
        }

        let mut logs = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read cache dir {}", self.dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.file_name().and_then(|n| n.to_str()) == Some(MANIFEST_FILE) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|c| serde_json::from_str::<TestLog>(&c).map_err(Into::into))
            {
                Ok(log) => logs.push(log),
                Err(e) => warn!("Skipping unreadable cache entry {}: {}", path.display(), e),
            }
        }

        debug!("Loaded {} logs from cache {}", logs.len(), self.dir.display());
        Ok(Some(logs))
    }

    /// Write the fetched logs and a fresh manifest to the bucket.
    pub fn store(&self, params: &FetchParams, logs: &[TestLog]) -> Result<()> {
        // Rewrite the bucket wholesale; entries from an earlier fetch with a
        // different job set would otherwise survive and leak into loads.
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)
                .with_context(|| format!("Failed to clear cache dir {}", self.dir.display()))?;
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache dir {}", self.dir.display()))?;

        for (index, log) in logs.iter().enumerate() {
            let path = self
                .dir
                .join(format!("{:03}-{}.json", index, sanitize_file_name(&log.job_name)));
            let content = serde_json::to_string_pretty(log)?;
            fs::write(&path, content)
                .with_context(|| format!("Failed to write cache entry {}", path.display()))?;
        }

        let manifest = CacheManifest::from_params(params);
        let manifest_path = self.dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        debug!("Cached {} logs to {}", logs.len(), self.dir.display());
        Ok(())
    }
}

/// Reduce a job name to a safe file name component.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            c
        } else {
            '_'
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn make_params(dir: &std::path::Path) -> FetchParams {
        FetchParams {
            repo: "mozilla-central".to_string(),
            revision: "abc123".to_string(),
            platform: "linux1804-64-qr".to_string(),
            cache_dir: dir.to_path_buf(),
            use_cache: true,
            warning_re: "^WARNING".to_string(),
            normalize: true,
            is_debug: true,
        }
    }

    fn make_log(job: &str) -> TestLog {
        let mut warnings = HashMap::new();
        warnings.insert("WARNING: leaked window".to_string(), 3);
        TestLog {
            job_name: job.to_string(),
            log_url: format!("https://example.com/{}", job),
            warnings,
        }
    }

    #[test]
    fn test_load_missing_bucket_returns_none() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("bucket");
        let cache = LogCache::new(&dir);
        assert!(cache.load(&make_params(&dir)).unwrap().is_none());
    }

    #[test]
    fn test_store_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("bucket");
        let params = make_params(&dir);
        let cache = LogCache::new(&dir);

        let logs = vec![make_log("test-mochitest-1"), make_log("test-xpcshell-2")];
        cache.store(&params, &logs).unwrap();

        let loaded = cache.load(&params).unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        let names: Vec<_> = loaded.iter().map(|l| l.job_name.as_str()).collect();
        assert!(names.contains(&"test-mochitest-1"));
        assert!(names.contains(&"test-xpcshell-2"));
        assert_eq!(
            loaded[0].warnings.get("WARNING: leaked window"),
            Some(&3)
        );
    }

    #[test]
    fn test_manifest_mismatch_forces_refetch() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("bucket");
        let params = make_params(&dir);
        let cache = LogCache::new(&dir);
        cache.store(&params, &[make_log("test-mochitest-1")]).unwrap();

        // Same bucket queried with a different acceptance pattern.
        let mut other = params.clone();
        other.warning_re = "^ERROR".to_string();
        assert!(cache.load(&other).unwrap().is_none());

        // And with normalization flipped.
        let mut other = params.clone();
        other.normalize = false;
        assert!(cache.load(&other).unwrap().is_none());
    }

    #[test]
    fn test_store_clears_stale_entries() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("bucket");
        let params = make_params(&dir);
        let cache = LogCache::new(&dir);

        cache
            .store(&params, &[make_log("test-old-job"), make_log("test-kept-job")])
            .unwrap();
        cache.store(&params, &[make_log("test-kept-job")]).unwrap();

        let loaded = cache.load(&params).unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].job_name, "test-kept-job");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("test-mochitest-browser-chrome 3/7"),
            "test-mochitest-browser-chrome_3_7"
        );
    }
}
