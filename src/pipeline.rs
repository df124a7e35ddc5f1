//! Pipeline orchestration
//!
//! This module provides the public API for logband. It chains the three
//! stages — series normalization, band computation, anomaly filtering — and
//! optionally hands the full band sequence to a chart sink before filtering.

use crate::bands::BandComputer;
use crate::chart::BandChart;
use crate::error::DetectError;
use crate::filter::AnomalyFilter;
use crate::normalizer::SeriesNormalizer;
use crate::schema::AccessEvent;
use crate::types::{BandRecord, UserId};

/// Find the anomalous days for one user (stateless, one-shot).
///
/// # Arguments
/// * `events` - Raw access-log events (any users, any order)
/// * `user` - User to analyze
/// * `span` - Effective smoothing window in days (>= 1)
/// * `weight` - Envelope half-width in standard deviations (> 0)
///
/// # Returns
/// The band records with `pct_b > 1.0`, chronological. An empty result is a
/// normal outcome; stage failures propagate unchanged.
///
/// # Example
/// ```ignore
/// let anomalies = find_anomalies(&events, 341, 30, 3.5)?;
/// ```
pub fn find_anomalies(
    events: &[AccessEvent],
    user: UserId,
    span: u32,
    weight: f64,
) -> Result<Vec<BandRecord>, DetectError> {
    AnomalyDetector::new(span, weight).detect(events, user)
}

/// Detector holding the envelope parameters and an optional chart sink.
///
/// Use this to run the same configuration over many users, or to attach a
/// [`BandChart`] that receives the full annotated series before filtering.
pub struct AnomalyDetector {
    span: u32,
    weight: f64,
    chart: Option<Box<dyn BandChart>>,
}

impl AnomalyDetector {
    /// Create a detector with the given envelope parameters.
    ///
    /// Parameters are validated by the band computer on the first run, so an
    /// out-of-range `span` or `weight` surfaces from [`detect`](Self::detect)
    /// rather than here.
    pub fn new(span: u32, weight: f64) -> Self {
        Self {
            span,
            weight,
            chart: None,
        }
    }

    /// Attach a chart sink that receives the full band sequence
    pub fn with_chart(mut self, chart: Box<dyn BandChart>) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Full annotated band series for one user, unfiltered.
    ///
    /// This is what a chart sink receives; useful on its own for inspection.
    pub fn detect_bands(
        &self,
        events: &[AccessEvent],
        user: UserId,
    ) -> Result<Vec<BandRecord>, DetectError> {
        let series = SeriesNormalizer::normalize(events, user)?;
        BandComputer::compute_bands(&series, self.span, self.weight)
    }

    /// Anomalous days for one user.
    ///
    /// A failure in the attached chart sink never blocks the result.
    pub fn detect(
        &mut self,
        events: &[AccessEvent],
        user: UserId,
    ) -> Result<Vec<BandRecord>, DetectError> {
        let records = self.detect_bands(events, user)?;

        if let Some(chart) = self.chart.as_mut() {
            // Observational only; rendering failures are dropped.
            let _ = chart.render(&records, user);
        }

        Ok(AnomalyFilter::filter(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn make_event(timestamp: &str, user_id: UserId) -> AccessEvent {
        AccessEvent {
            timestamp: timestamp.parse::<DateTime<Utc>>().unwrap(),
            endpoint: "/lessons/intro".to_string(),
            user_id,
            cohort_id: Some(28),
            source_ip: Some("97.105.19.61".to_string()),
        }
    }

    /// Flat week of two hits per day, then a 50-hit burst on the last day.
    fn burst_events(user_id: UserId) -> Vec<AccessEvent> {
        let mut events = Vec::new();
        for day in 15..19 {
            events.push(make_event(&format!("2024-01-{day:02}T09:00:00Z"), user_id));
            events.push(make_event(&format!("2024-01-{day:02}T15:00:00Z"), user_id));
        }
        for i in 0..50 {
            let minute = i % 60;
            events.push(make_event(
                &format!("2024-01-19T10:{minute:02}:30Z"),
                user_id,
            ));
        }
        events
    }

    #[test]
    fn test_find_anomalies_flags_the_burst() {
        let anomalies = find_anomalies(&burst_events(341), 341, 3, 2.0).unwrap();

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].count, 50);
        assert_eq!(anomalies[0].date.to_string(), "2024-01-19");
        assert!(anomalies[0].pct_b > 1.0);
    }

    #[test]
    fn test_quiet_user_yields_no_anomalies() {
        let mut events = Vec::new();
        for day in 15..22 {
            events.push(make_event(&format!("2024-01-{day:02}T09:00:00Z"), 341));
        }
        let anomalies = find_anomalies(&events, 341, 3, 2.0).unwrap();
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_missing_user_error_propagates() {
        let err = find_anomalies(&burst_events(341), 999, 3, 2.0).unwrap_err();
        assert!(matches!(err, DetectError::EmptyUser(999)));
    }

    #[test]
    fn test_invalid_parameters_propagate() {
        let events = burst_events(341);
        assert!(matches!(
            find_anomalies(&events, 341, 0, 2.0).unwrap_err(),
            DetectError::InvalidParameter(_)
        ));
        assert!(matches!(
            find_anomalies(&events, 341, 3, 0.0).unwrap_err(),
            DetectError::InvalidParameter(_)
        ));
    }

    #[test]
    fn test_detect_bands_returns_full_series() {
        let detector = AnomalyDetector::new(3, 2.0);
        let records = detector.detect_bands(&burst_events(341), 341).unwrap();

        // Jan 15 through Jan 19 inclusive.
        assert_eq!(records.len(), 5);
        let counts: Vec<u32> = records.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![2, 2, 2, 2, 50]);
    }

    #[test]
    fn test_detector_reusable_across_users() {
        let mut events = burst_events(341);
        events.extend(burst_events(512));

        let mut detector = AnomalyDetector::new(3, 2.0);
        let a = detector.detect(&events, 341).unwrap();
        let b = detector.detect(&events, 512).unwrap();

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].user_id, 341);
        assert_eq!(b[0].user_id, 512);
    }

    struct RecordingChart {
        rendered: std::rc::Rc<std::cell::RefCell<usize>>,
    }

    impl BandChart for RecordingChart {
        fn render(&mut self, records: &[BandRecord], _user: UserId) -> Result<(), DetectError> {
            *self.rendered.borrow_mut() = records.len();
            Ok(())
        }
    }

    struct FailingChart;

    impl BandChart for FailingChart {
        fn render(&mut self, _records: &[BandRecord], _user: UserId) -> Result<(), DetectError> {
            Err(DetectError::RenderError("sink closed".to_string()))
        }
    }

    #[test]
    fn test_chart_receives_unfiltered_series() {
        let rendered = std::rc::Rc::new(std::cell::RefCell::new(0));
        let chart = RecordingChart {
            rendered: rendered.clone(),
        };

        let mut detector = AnomalyDetector::new(3, 2.0).with_chart(Box::new(chart));
        let anomalies = detector.detect(&burst_events(341), 341).unwrap();

        // The chart saw all five days, the caller only the anomaly.
        assert_eq!(*rendered.borrow(), 5);
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn test_chart_failure_does_not_block_result() {
        let mut detector = AnomalyDetector::new(3, 2.0).with_chart(Box::new(FailingChart));
        let anomalies = detector.detect(&burst_events(341), 341).unwrap();
        assert_eq!(anomalies.len(), 1);
    }
}
