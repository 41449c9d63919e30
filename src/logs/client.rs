//! Treeherder-style log store client.
//!
//! Resolves revisions to pushes, lists the completed test jobs for a
//! platform, and downloads each job's log with bounded concurrency. One
//! failed download produces a per-log failure outcome, never a fatal error.

use crate::config::FetchConfig;
use crate::logs::cache::LogCache;
use crate::logs::parser::WarningParser;
use crate::logs::{LogFetch, LogFetchError, LogStore};
use crate::models::{FetchParams, TestLog};
use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// A push known to the log store.
#[derive(Debug, Clone, Deserialize)]
struct Push {
    id: u64,
    revision: String,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    results: Vec<Push>,
}

/// One job attached to a push.
#[derive(Debug, Clone, Deserialize)]
struct Job {
    id: u64,
    job_type_name: String,
    platform: String,
    platform_option: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    results: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct JobLogUrl {
    url: String,
}

/// HTTP implementation of [`LogStore`] against a Treeherder-style REST API.
pub struct HttpLogStore {
    client: reqwest::Client,
    base_url: String,
    concurrency: usize,
    show_progress: bool,
}

impl HttpLogStore {
    /// Build a store from fetch configuration.
    pub fn new(config: &FetchConfig, show_progress: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            concurrency: config.concurrency,
            show_progress,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("Request to {} timed out", url)
            } else if e.is_connect() {
                anyhow::anyhow!("Cannot connect to log store at {}", self.base_url)
            } else {
                anyhow::anyhow!("Failed to send request to {}: {}", url, e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Log store API error {} for {}", status, url);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Find the push for a concrete revision.
    async fn find_push(&self, repo: &str, revision: &str) -> Result<Push> {
        let url = format!(
            "{}/api/project/{}/push/?revision={}",
            self.base_url, repo, revision
        );
        let response: PushResponse = self.get_json(&url).await?;

        response
            .results
            .into_iter()
            .next()
            .with_context(|| format!("No push found for revision {} in {}", revision, repo))
    }

    /// List the completed test jobs for a push on one platform.
    async fn list_test_jobs(&self, params: &FetchParams) -> Result<Vec<Job>> {
        let push = self.find_push(&params.repo, &params.revision).await?;
        debug!("Revision {} is push {}", push.revision, push.id);

        let url = format!(
            "{}/api/project/{}/jobs/?push_id={}&count=2000",
            self.base_url, params.repo, push.id
        );
        let response: JobsResponse = self.get_json(&url).await?;

        let build_type = if params.is_debug { "debug" } else { "opt" };
        let jobs: Vec<Job> = response
            .results
            .into_iter()
            .filter(|job| {
                job.state == "completed"
                    && job.platform == params.platform
                    && job.platform_option == build_type
                    && job.job_type_name.starts_with("test-")
            })
            .collect();

        info!(
            "Found {} {} test jobs for {} on {}",
            jobs.len(),
            build_type,
            params.revision,
            params.platform
        );
        Ok(jobs)
    }

    /// Download and parse one job's log.
    async fn fetch_log(
        client: reqwest::Client,
        base_url: String,
        repo: String,
        job: Job,
        parser: Arc<WarningParser>,
    ) -> LogFetch {
        let job_name = job.job_type_name.clone();

        let url = format!(
            "{}/api/project/{}/job-log-url/?job_id={}",
            base_url, repo, job.id
        );
        let log_urls: Vec<JobLogUrl> = match Self::get_json_with(&client, &url).await {
            Ok(urls) => urls,
            Err(source) => return Err(LogFetchError::Download { job: job_name, source }),
        };

        let Some(log_url) = log_urls.into_iter().next().map(|l| l.url) else {
            return Err(LogFetchError::MissingLog { job: job_name });
        };

        let response = match client.get(&log_url).send().await {
            Ok(response) => response,
            Err(source) => return Err(LogFetchError::Download { job: job_name, source }),
        };
        if !response.status().is_success() {
            return Err(LogFetchError::Status {
                job: job_name,
                status: response.status(),
            });
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(source) => return Err(LogFetchError::Download { job: job_name, source }),
        };

        Ok(TestLog {
            job_name,
            log_url,
            warnings: parser.parse(&text),
        })
    }

    /// Plain GET-and-deserialize without the store's error prose; used from
    /// spawned download tasks where failures become per-log outcomes.
    async fn get_json_with<T: DeserializeOwned>(
        client: &reqwest::Client,
        url: &str,
    ) -> std::result::Result<T, reqwest::Error> {
        client.get(url).send().await?.error_for_status()?.json().await
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    }
}

#[async_trait]
impl LogStore for HttpLogStore {
    async fn resolve_latest(&self, repo: &str) -> Result<String> {
        let url = format!("{}/api/project/{}/push/?count=1", self.base_url, repo);
        let response: PushResponse = self.get_json(&url).await?;

        let push = response
            .results
            .into_iter()
            .next()
            .with_context(|| format!("No pushes found for {}", repo))?;

        info!("Resolved latest revision of {} to {}", repo, push.revision);
        Ok(push.revision)
    }

    async fn retrieve(&self, params: &FetchParams) -> Result<Vec<LogFetch>> {
        let cache = LogCache::new(&params.cache_dir);

        if params.use_cache {
            if let Some(logs) = cache.load(params)? {
                info!(
                    "Using {} cached logs from {}",
                    logs.len(),
                    params.cache_dir.display()
                );
                return Ok(logs.into_iter().map(Ok).collect());
            }
        }

        let jobs = self.list_test_jobs(params).await?;
        let parser = Arc::new(
            WarningParser::new(&params.warning_re, params.normalize)
                .with_context(|| format!("Invalid warning pattern '{}'", params.warning_re))?,
        );

        let pb = self.progress_bar(jobs.len() as u64);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let client = self.client.clone();
            let base_url = self.base_url.clone();
            let repo = params.repo.clone();
            let parser = Arc::clone(&parser);
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("Failed to acquire download slot")?;

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                Self::fetch_log(client, base_url, repo, job, parser).await
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = handle.await.context("Log download task failed")?;
            pb.inc(1);
            outcomes.push(outcome);
        }
        pb.finish_and_clear();

        // A fetch where nothing succeeded is not cached; a transient outage
        // must not pin an empty bucket for this revision.
        let retrieved: Vec<TestLog> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok().cloned())
            .collect();
        if !retrieved.is_empty() {
            if let Err(e) = cache.store(params, &retrieved) {
                warn!("Failed to write log cache: {}", e);
            }
        }

        Ok(outcomes)
    }
}
