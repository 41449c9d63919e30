//! Log retrieval, parsing, and caching.
//!
//! The [`LogStore`] trait is the seam between the aggregation core and the
//! actual log storage; the HTTP client and an in-memory test fake both
//! implement it.

pub mod cache;
pub mod client;
pub mod parser;

pub use client::HttpLogStore;

use crate::models::{FetchParams, TestLog};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Outcome of retrieving one log: the parsed log, or a per-log failure that
/// the aggregator drops without failing the whole fetch.
pub type LogFetch = std::result::Result<TestLog, LogFetchError>;

/// A single log retrieval failure.
#[derive(Debug, Error)]
pub enum LogFetchError {
    #[error("no log available for job {job}")]
    MissingLog { job: String },

    #[error("failed to download log for {job}: {source}")]
    Download {
        job: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("log store returned {status} for {job}")]
    Status {
        job: String,
        status: reqwest::StatusCode,
    },
}

/// Source of test logs for a (repo, revision, platform) triple.
#[async_trait]
pub trait LogStore {
    /// Resolve the `latest` sentinel to a concrete revision id. Idempotent
    /// and deterministic for a given repo state at call time.
    async fn resolve_latest(&self, repo: &str) -> Result<String>;

    /// Retrieve all test logs for the resolved parameters. Storage and
    /// network errors fail the call; a single bad log is a per-entry
    /// [`LogFetchError`] outcome instead.
    async fn retrieve(&self, params: &FetchParams) -> Result<Vec<LogFetch>>;
}
