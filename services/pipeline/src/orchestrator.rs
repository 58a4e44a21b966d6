//! Fallback Orchestrator - remote -> csv -> empty
//!
//! The chain is an ordered list of (source, loader) pairs. The first loader
//! that succeeds ends the chain; if all fail the result is an empty record
//! list. `run` never returns an error.

use crate::config::PipelineConfig;
use crate::csv_reader;
use crate::error::{RemoteError, SourceError};
use crate::normalize::normalize_payload;
use crate::record::OrderRecord;
use crate::remote::RemoteReader;
use async_trait::async_trait;
use chrono::{Datelike, Local};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Where a response's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Csv,
    None,
}

impl DataSource {
    /// Note attached to responses served from this source.
    pub fn note(self) -> Option<&'static str> {
        match self {
            Self::Remote => None,
            Self::Csv => Some("CSV fallback - Original API unavailable"),
            Self::None => Some("No data: API and CSV unavailable"),
        }
    }

    pub fn is_live(self) -> bool {
        self == Self::Remote
    }
}

/// One caller request. Dates are passed through to the upstream verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub start_date: String,
    pub end_date: String,
    pub base_url: Option<String>,
}

impl OrderQuery {
    /// Missing or blank dates default to the current calendar year; other
    /// values are kept verbatim.
    pub fn new(start: Option<String>, end: Option<String>, base_url: Option<String>) -> Self {
        let year = Local::now().year();
        let given = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            start_date: given(start).unwrap_or_else(|| format!("{}-01-01", year)),
            end_date: given(end).unwrap_or_else(|| format!("{}-12-31", year)),
            base_url: given(base_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Envelope handed to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdersResponse {
    pub success: bool,
    pub data: Vec<OrderRecord>,
    pub count: usize,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub date_range: DateRange,
}

impl OrdersResponse {
    fn new(source: DataSource, data: Vec<OrderRecord>, query: &OrderQuery) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
            source,
            note: source.note().map(str::to_string),
            date_range: DateRange {
                start: query.start_date.clone(),
                end: query.end_date.clone(),
            },
        }
    }
}

/// A data source in the fallback chain.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn load(&self, query: &OrderQuery) -> Result<Vec<OrderRecord>, SourceError>;
}

/// Upstream fetch followed by normalization.
pub struct RemoteSource {
    reader: RemoteReader,
}

impl RemoteSource {
    pub fn new(reader: RemoteReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl OrderSource for RemoteSource {
    async fn load(&self, query: &OrderQuery) -> Result<Vec<OrderRecord>, SourceError> {
        let payload = self
            .reader
            .fetch(&query.start_date, &query.end_date, query.base_url.as_deref())
            .await?;
        Ok(normalize_payload(payload))
    }
}

/// The local snapshot file.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl OrderSource for CsvSource {
    async fn load(&self, _query: &OrderQuery) -> Result<Vec<OrderRecord>, SourceError> {
        info!("CSV fallback using path: {}", self.path.display());
        Ok(csv_reader::read_all(&self.path).await?)
    }
}

#[derive(Default)]
pub struct Orchestrator {
    chain: Vec<(DataSource, Box<dyn OrderSource>)>,
}

impl Orchestrator {
    /// Remote upstream first, CSV snapshot second.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, RemoteError> {
        let remote = RemoteSource::new(RemoteReader::new(config)?);
        let csv = CsvSource::new(config.resolve_csv_path());
        Ok(Self::new()
            .then(DataSource::Remote, remote)
            .then(DataSource::Csv, csv))
    }

    /// An empty chain; every run yields the empty result.
    pub fn new() -> Self {
        Self { chain: Vec::new() }
    }

    /// Append `loader` as the next fallback.
    pub fn then<S>(mut self, source: DataSource, loader: S) -> Self
    where
        S: OrderSource + 'static,
    {
        self.chain.push((source, Box::new(loader)));
        self
    }

    pub fn sources(&self) -> Vec<DataSource> {
        self.chain.iter().map(|(source, _)| *source).collect()
    }

    /// Walk the chain; always produces a response.
    pub async fn run(&self, query: &OrderQuery) -> OrdersResponse {
        for (source, loader) in &self.chain {
            info!("Attempting {:?} source for {}..{}", source, query.start_date, query.end_date);
            match loader.load(query).await {
                Ok(records) => {
                    info!("Serving {} orders from {:?} source", records.len(), source);
                    return OrdersResponse::new(*source, records, query);
                }
                Err(e) => warn!("{:?} source failed: {}", source, e),
            }
        }

        error!("All order sources failed; returning empty result");
        OrdersResponse::new(DataSource::None, Vec::new(), query)
    }
}
