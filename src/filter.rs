//! Anomaly filtering
//!
//! Selects the band records whose count sits above the upper bound
//! (`pct_b > 1`). Pure and order-preserving; records without enough history
//! carry a NaN `pct_b`, compare false, and are excluded without error.

use crate::types::BandRecord;

/// Filter for extracting anomalous records from an annotated series
pub struct AnomalyFilter;

impl AnomalyFilter {
    /// The subsequence of records with `pct_b > 1.0`, in input order.
    ///
    /// May be empty: a user that never exceeds the envelope is a normal,
    /// non-error outcome.
    pub fn filter(records: &[BandRecord]) -> Vec<BandRecord> {
        records
            .iter()
            .filter(|r| r.is_anomalous())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn make_record(day: u32, pct_b: f64) -> BandRecord {
        BandRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            count: 10,
            midband: 5.0,
            stdev: 1.0,
            upper_bound: 7.0,
            lower_bound: 3.0,
            pct_b,
            user_id: 341,
        }
    }

    #[test]
    fn test_keeps_only_records_above_one() {
        let records = vec![
            make_record(1, f64::NAN),
            make_record(2, 0.5),
            make_record(3, 1.0),
            make_record(4, 1.01),
            make_record(5, f64::INFINITY),
            make_record(6, 0.99),
        ];

        let anomalies = AnomalyFilter::filter(&records);
        let days: Vec<u32> = anomalies
            .iter()
            .map(|r| r.date.day0() + 1)
            .collect();
        assert_eq!(days, vec![4, 5]);
        assert!(anomalies.iter().all(|r| r.pct_b > 1.0));
    }

    #[test]
    fn test_nan_is_excluded_not_an_error() {
        let records = vec![make_record(1, f64::NAN), make_record(2, f64::NAN)];
        assert!(AnomalyFilter::filter(&records).is_empty());
    }

    #[test]
    fn test_empty_input_empty_output() {
        assert!(AnomalyFilter::filter(&[]).is_empty());
    }

    #[test]
    fn test_input_not_mutated() {
        let records = vec![make_record(1, 2.0)];
        let _ = AnomalyFilter::filter(&records);
        assert_eq!(records.len(), 1);
        assert!((records[0].pct_b - 2.0).abs() < 1e-12);
    }
}
