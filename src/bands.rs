//! Band computation
//!
//! This module applies exponential smoothing to a daily count series and
//! derives the anomaly envelope: midband (exponentially weighted mean),
//! exponentially weighted standard deviation, upper/lower bounds, and the
//! normalized `%b` position metric.
//!
//! Weighting convention, fixed for both statistics: the *adjusted* form with
//! decay `alpha = 2 / (span + 1)`, i.e. observation `k` steps back carries
//! weight `(1 - alpha)^k` normalized over the days seen so far, so early
//! values are not biased toward a seed. The midband for a date includes that
//! date's own count. The standard deviation is the bias-corrected weighted
//! deviation of the *strictly prior* days, so a fresh spike is judged against
//! the history that preceded it rather than against itself. Both statistics
//! are causal: no future observation influences a date's record.

use crate::error::DetectError;
use crate::types::{BandRecord, DailyCountSeries};

/// Band computer for annotating a count series with its envelope
pub struct BandComputer;

impl BandComputer {
    /// Compute one [`BandRecord`] per day of the series, chronological.
    ///
    /// `span` is the effective smoothing window in days; `weight` scales how
    /// many standard deviations define the envelope half-width.
    ///
    /// For the first two days the deviation is NaN (fewer than two prior
    /// observations), which propagates into the bounds and `pct_b`. When the
    /// prior history is constant the bounds collapse and `pct_b` becomes NaN
    /// for a count on the band or infinite for a count off it; all of these
    /// flow through without error.
    pub fn compute_bands(
        series: &DailyCountSeries,
        span: u32,
        weight: f64,
    ) -> Result<Vec<BandRecord>, DetectError> {
        if span < 1 {
            return Err(DetectError::InvalidParameter(format!(
                "span must be >= 1, got {span}"
            )));
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(DetectError::InvalidParameter(format!(
                "weight must be a finite positive number, got {weight}"
            )));
        }

        let mut state = EwmState::new(span);
        let mut records = Vec::with_capacity(series.len());

        for day in &series.days {
            let count = f64::from(day.count);

            // Deviation of the prior history, then fold in today's count.
            let stdev = state.stdev();
            state.push(count);
            let midband = state.mean();

            let upper_bound = midband + weight * stdev;
            let lower_bound = midband - weight * stdev;
            let pct_b = (count - lower_bound) / (upper_bound - lower_bound);

            records.push(BandRecord {
                date: day.date,
                count: day.count,
                midband,
                stdev,
                upper_bound,
                lower_bound,
                pct_b,
                user_id: series.user_id,
            });
        }

        Ok(records)
    }
}

/// Running sums for the adjusted exponentially weighted mean and the
/// bias-corrected weighted variance.
struct EwmState {
    /// Decay factor `1 - alpha`
    decay: f64,
    /// Sum of weights
    w_sum: f64,
    /// Sum of squared weights (for the bias correction)
    w_sq_sum: f64,
    /// Weighted sum of observations
    x_sum: f64,
    /// Weighted sum of squared observations
    x_sq_sum: f64,
    /// Number of observations folded in
    n: usize,
}

impl EwmState {
    fn new(span: u32) -> Self {
        let alpha = 2.0 / (f64::from(span) + 1.0);
        Self {
            decay: 1.0 - alpha,
            w_sum: 0.0,
            w_sq_sum: 0.0,
            x_sum: 0.0,
            x_sq_sum: 0.0,
            n: 0,
        }
    }

    fn push(&mut self, x: f64) {
        self.w_sum = 1.0 + self.decay * self.w_sum;
        self.w_sq_sum = 1.0 + self.decay * self.decay * self.w_sq_sum;
        self.x_sum = x + self.decay * self.x_sum;
        self.x_sq_sum = x * x + self.decay * self.x_sq_sum;
        self.n += 1;
    }

    /// Adjusted weighted mean of the observations seen so far
    fn mean(&self) -> f64 {
        if self.n == 0 {
            return f64::NAN;
        }
        self.x_sum / self.w_sum
    }

    /// Bias-corrected weighted standard deviation of the observations seen
    /// so far; NaN until two observations are available.
    fn stdev(&self) -> f64 {
        let correction_denom = self.w_sum * self.w_sum - self.w_sq_sum;
        if self.n < 2 || correction_denom <= 0.0 {
            return f64::NAN;
        }
        let mean = self.x_sum / self.w_sum;
        // Weighted E[x^2] - mean^2 can dip fractionally below zero.
        let biased_var = (self.x_sq_sum / self.w_sum - mean * mean).max(0.0);
        let var = biased_var * self.w_sum * self.w_sum / correction_denom;
        var.sqrt()
    }
}
