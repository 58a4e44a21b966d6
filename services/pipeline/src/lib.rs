//! Order Pipeline - Ingests order records for the sales dashboard
//!
//! Responsibilities:
//! - Fetch date-bounded order listings from the upstream service
//! - Read the local CSV snapshot when the upstream is unavailable
//! - Reconcile upstream column dialects onto one canonical record shape
//! - Parse locale-formatted numbers and dates without ever failing a row
//! - Always hand the caller a well-formed (possibly empty) result
//!
//! Fallback order: remote -> csv -> empty

pub mod config;
pub mod csv_reader;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod record;
pub mod remote;
pub mod schema;
pub mod values;

pub use config::PipelineConfig;
pub use error::{CsvError, RemoteError, SourceError};
pub use orchestrator::{DataSource, OrderQuery, OrdersResponse, Orchestrator};
pub use record::OrderRecord;
