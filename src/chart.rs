//! Band chart encoding
//!
//! The visualization collaborator: consumes the full (unfiltered) band
//! sequence and renders the four series a reviewer wants to see together —
//! raw count, midband, upper bound, lower bound. The pipeline treats
//! rendering as purely observational; nothing here feeds back into detection.

use crate::error::DetectError;
use crate::types::{BandRecord, UserId};
use crate::{LOGBAND_VERSION, PRODUCER_NAME};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

/// Current chart document version
pub const CHART_VERSION: &str = "band.chart.v1";

/// Producer metadata stamped into every chart document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartProducer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
}

/// The four plotted series, one entry per date.
///
/// Non-finite values (insufficient history) become `None` so the document
/// stays plain JSON; renderers draw those dates as gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Date axis
    pub dates: Vec<NaiveDate>,
    /// Raw daily counts
    pub counts: Vec<u32>,
    /// Midband values
    pub midband: Vec<Option<f64>>,
    /// Upper bound values
    pub upper_bound: Vec<Option<f64>>,
    /// Lower bound values
    pub lower_bound: Vec<Option<f64>>,
}

/// band.chart.v1 document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDocument {
    /// Chart schema version
    pub chart_version: String,
    /// Producer metadata
    pub producer: ChartProducer,
    /// User the chart belongs to
    pub user_id: UserId,
    /// When the document was generated (RFC3339)
    pub generated_at_utc: String,
    /// The plotted series
    pub series: ChartSeries,
}

/// Encoder for producing chart documents
pub struct ChartEncoder {
    instance_id: String,
}

impl Default for ChartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a band sequence into a chart document
    pub fn encode(&self, records: &[BandRecord], user: UserId) -> ChartDocument {
        let mut series = ChartSeries {
            dates: Vec::with_capacity(records.len()),
            counts: Vec::with_capacity(records.len()),
            midband: Vec::with_capacity(records.len()),
            upper_bound: Vec::with_capacity(records.len()),
            lower_bound: Vec::with_capacity(records.len()),
        };

        for record in records {
            series.dates.push(record.date);
            series.counts.push(record.count);
            series.midband.push(finite(record.midband));
            series.upper_bound.push(finite(record.upper_bound));
            series.lower_bound.push(finite(record.lower_bound));
        }

        ChartDocument {
            chart_version: CHART_VERSION.to_string(),
            producer: ChartProducer {
                name: PRODUCER_NAME.to_string(),
                version: LOGBAND_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            user_id: user,
            generated_at_utc: Utc::now().to_rfc3339(),
            series,
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        records: &[BandRecord],
        user: UserId,
    ) -> Result<String, DetectError> {
        let document = self.encode(records, user);
        serde_json::to_string_pretty(&document).map_err(DetectError::JsonError)
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Seam for chart sinks consumed by the pipeline orchestrator
pub trait BandChart {
    /// Render the full band sequence for a user
    fn render(&mut self, records: &[BandRecord], user: UserId) -> Result<(), DetectError>;
}

/// Chart sink writing band.chart.v1 JSON to any writer
pub struct JsonChart<W: Write> {
    encoder: ChartEncoder,
    writer: W,
}

impl<W: Write> JsonChart<W> {
    /// Create a chart sink over a writer
    pub fn new(writer: W) -> Self {
        Self {
            encoder: ChartEncoder::new(),
            writer,
        }
    }
}

impl<W: Write> BandChart for JsonChart<W> {
    fn render(&mut self, records: &[BandRecord], user: UserId) -> Result<(), DetectError> {
        let json = self.encoder.encode_to_json(records, user)?;
        self.writer
            .write_all(json.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| DetectError::RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_records() -> Vec<BandRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        vec![
            BandRecord {
                date: start,
                count: 3,
                midband: 3.0,
                stdev: f64::NAN,
                upper_bound: f64::NAN,
                lower_bound: f64::NAN,
                pct_b: f64::NAN,
                user_id: 341,
            },
            BandRecord {
                date: start.succ_opt().unwrap(),
                count: 5,
                midband: 4.2,
                stdev: 0.8,
                upper_bound: 5.8,
                lower_bound: 2.6,
                pct_b: 0.75,
                user_id: 341,
            },
        ]
    }

    #[test]
    fn test_encode_document_shape() {
        let encoder = ChartEncoder::with_instance_id("test-instance".to_string());
        let doc = encoder.encode(&make_records(), 341);

        assert_eq!(doc.chart_version, CHART_VERSION);
        assert_eq!(doc.producer.name, PRODUCER_NAME);
        assert_eq!(doc.producer.instance_id, "test-instance");
        assert_eq!(doc.user_id, 341);
        assert_eq!(doc.series.dates.len(), 2);
        assert_eq!(doc.series.counts, vec![3, 5]);
    }

    #[test]
    fn test_non_finite_values_become_gaps() {
        let encoder = ChartEncoder::new();
        let doc = encoder.encode(&make_records(), 341);

        assert_eq!(doc.series.midband[0], Some(3.0));
        assert_eq!(doc.series.upper_bound[0], None);
        assert_eq!(doc.series.lower_bound[0], None);
        assert_eq!(doc.series.upper_bound[1], Some(5.8));
    }

    #[test]
    fn test_json_chart_writes_document() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut chart = JsonChart::new(&mut buf);
            chart.render(&make_records(), 341).unwrap();
        }

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["chart_version"], "band.chart.v1");
        assert_eq!(value["user_id"], 341);
        assert_eq!(value["series"]["counts"][1], 5);
        // NaN bound encoded as a gap, not an error.
        assert!(value["series"]["upper_bound"][0].is_null());
    }

    #[test]
    fn test_failing_writer_is_a_render_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "sink closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut chart = JsonChart::new(Broken);
        let err = chart.render(&make_records(), 341).unwrap_err();
        assert!(matches!(err, DetectError::RenderError(_)));
    }
}
