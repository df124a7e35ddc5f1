//! Series normalization
//!
//! This module turns one user's raw access events into a regular daily count
//! series: filter to the user, bucket by calendar date, and resample over the
//! full observed span so that days without any access appear as count 0.

use crate::error::DetectError;
use crate::schema::AccessEvent;
use crate::types::{DailyCount, DailyCountSeries, UserId};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Normalizer for building gap-free daily count series
pub struct SeriesNormalizer;

impl SeriesNormalizer {
    /// Build the daily count series for one user.
    ///
    /// Fails with [`DetectError::EmptyUser`] when the filtered event set is
    /// empty; downstream stages can handle an all-zero series but not a
    /// nonexistent one.
    pub fn normalize(
        events: &[AccessEvent],
        user: UserId,
    ) -> Result<DailyCountSeries, DetectError> {
        let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for event in events.iter().filter(|e| e.user_id == user) {
            *counts.entry(event.timestamp.date_naive()).or_insert(0) += 1;
        }

        let (first, last) = match (counts.keys().next(), counts.keys().next_back()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(DetectError::EmptyUser(user)),
        };

        let mut days = Vec::new();
        for date in first.iter_days() {
            if date > last {
                break;
            }
            days.push(DailyCount {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            });
        }

        Ok(DailyCountSeries {
            user_id: user,
            days,
        })
    }
}
