//! Logband - Bollinger-band anomaly detection for per-user access-log activity
//!
//! Logband flags days where a user's activity breaks out of its expected
//! range through a deterministic pipeline: series normalization → band
//! computation → anomaly filtering.
//!
//! ## Pipeline
//!
//! - **Series Normalizer**: resample one user's raw events into a gap-free
//!   daily count series
//! - **Band Computer**: exponentially weighted midband and deviation, upper
//!   and lower bounds, and the normalized `%b` position metric
//! - **Anomaly Filter**: the days with `%b > 1` (activity above the upper
//!   bound)
//!
//! A chart sink can observe the full band sequence before filtering; it never
//! feeds back into detection.

pub mod bands;
pub mod chart;
pub mod error;
pub mod filter;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use bands::BandComputer;
pub use chart::{BandChart, ChartEncoder, JsonChart};
pub use error::DetectError;
pub use filter::AnomalyFilter;
pub use normalizer::SeriesNormalizer;
pub use pipeline::{find_anomalies, AnomalyDetector};

// Schema exports
pub use schema::{AccessEvent, LogEventAdapter, SCHEMA_VERSION};

// Core type exports
pub use types::{BandRecord, DailyCount, DailyCountSeries, UserId};

/// Logband version embedded in chart documents
pub const LOGBAND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for chart documents
pub const PRODUCER_NAME: &str = "logband";
