//! Core data types
//!
//! This module defines the types that flow through the detection pipeline:
//! the gap-free daily count series and the per-day band records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User identifier as carried in the access logs
pub type UserId = u32;

/// Activity count for a single calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// Calendar date (intra-day structure is discarded upstream)
    pub date: NaiveDate,
    /// Number of endpoint accesses on that date
    pub count: u32,
}

/// One user's daily activity series over the full observed span.
///
/// Invariant: `days` holds strictly increasing, contiguous dates from the
/// first to the last observed access, with zero-activity days present as
/// count 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCountSeries {
    /// User the series belongs to
    pub user_id: UserId,
    /// Contiguous daily counts, chronological
    pub days: Vec<DailyCount>,
}

impl DailyCountSeries {
    /// Number of days in the series
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the series holds no days
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First date of the observed span
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    /// Last date of the observed span
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }
}

/// Per-day band annotation produced by the band computer.
///
/// `midband`, `stdev`, and the bounds may be NaN while the series has not
/// accumulated enough history; `pct_b` may additionally be infinite when the
/// bounds collapse to zero width. Non-finite values propagate through
/// arithmetic and comparisons, they are never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandRecord {
    /// Calendar date of the observation
    pub date: NaiveDate,
    /// Observed access count for the date
    pub count: u32,
    /// Exponentially weighted mean of counts through the date
    pub midband: f64,
    /// Exponentially weighted standard deviation of the prior history
    pub stdev: f64,
    /// `midband + weight * stdev`
    pub upper_bound: f64,
    /// `midband - weight * stdev`
    pub lower_bound: f64,
    /// Normalized position within the envelope: 0 = lower bound,
    /// 1 = upper bound, > 1 = anomalous excess
    pub pct_b: f64,
    /// User the record belongs to
    pub user_id: UserId,
}

impl BandRecord {
    /// Whether the record sits above the upper bound
    pub fn is_anomalous(&self) -> bool {
        // NaN compares false, so days without enough history never flag.
        self.pct_b > 1.0
    }
}
