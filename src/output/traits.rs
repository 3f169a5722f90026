//! Output types and error handling
//!
//! This module defines the run-level summary handed to every report writer
//! and the errors report writers can return.

use crate::crawler::CrawlOutcome;
use crate::inventory::SourceKind;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How the reconciled record set was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Records were harvested in this invocation
    Crawl,
    /// Records were reloaded from a stored run
    Report,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Report => "report",
        }
    }
}

/// Crawl statistics for one source
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub kind: SourceKind,
    pub records: usize,

    /// Crawl details, absent when records were reloaded
    pub pages_fetched: Option<u32>,
    pub detail_failures: Option<usize>,
    pub termination: Option<String>,

    /// The crawl hit the page ceiling or a failed listing request
    pub anomaly: bool,
}

impl SourceSummary {
    pub fn from_outcome(outcome: &CrawlOutcome) -> Self {
        Self {
            name: outcome.source_name.clone(),
            kind: outcome.source_kind,
            records: outcome.records.len(),
            pages_fetched: Some(outcome.pages_fetched),
            detail_failures: Some(outcome.detail_failures),
            termination: Some(outcome.termination.to_string()),
            anomaly: outcome.termination.is_anomaly(),
        }
    }

    /// Summary for a source whose records came from storage
    pub fn reloaded(name: &str, kind: SourceKind, records: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            records,
            pages_fetched: None,
            detail_failures: None,
            termination: None,
            anomaly: false,
        }
    }
}

/// Run metadata printed and written alongside the inventory report
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Option<i64>,
    pub mode: RunMode,
    pub config_hash: String,
    pub sources: Vec<SourceSummary>,
}

impl RunSummary {
    pub fn anomalies(&self) -> impl Iterator<Item = &SourceSummary> {
        self.sources.iter().filter(|s| s.anomaly)
    }
}
