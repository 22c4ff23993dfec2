//! Standard-deviation based spike and dip detection.
//!
//! A day is anomalous when its count lies on or outside
//! `mean ± threshold · σ`, where mean and σ are the population moments of the
//! whole series, zero-count days included.
//!
//! Moments are accumulated as exact integer sums, and the band test is done
//! on squared, rescaled integers:
//!
//! ```text
//! |c - mean| >= t·σ   <=>   (n·c - Σc)² >= t² · (n·Σc² - (Σc)²)
//! ```
//!
//! so long series of large counts lose no precision before the final
//! comparison.

use crate::models::{AnomalyEntry, DailySeries, SeriesStats};

/// Default band width in standard deviations.
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Exact power sums of a series.
#[derive(Debug, Clone, Copy)]
struct Moments {
    n: u128,
    sum: u128,
    /// `n·Σc² - (Σc)²`, i.e. `n²·variance`. Never negative.
    scaled_variance: u128,
}

impl Moments {
    fn of(series: &DailySeries) -> Self {
        let (n, sum, sum_sq) = series.iter().fold((0u128, 0u128, 0u128), |(n, s, q), e| {
            let c = u128::from(e.count);
            (n + 1, s + c, q + c * c)
        });
        Self {
            n,
            sum,
            scaled_variance: (n * sum_sq).saturating_sub(sum * sum),
        }
    }

    fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum as f64 / self.n as f64
        }
    }

    fn std_dev(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            (self.scaled_variance as f64).sqrt() / self.n as f64
        }
    }

    /// Whether `count` sits on or outside the band.
    fn outside_band(&self, count: u64, threshold: f64) -> bool {
        let deviation = (self.n * u128::from(count)).abs_diff(self.sum);
        (deviation * deviation) as f64 >= threshold * threshold * self.scaled_variance as f64
    }
}

/// Mean, population standard deviation and band edges of `series`.
pub fn series_stats(series: &DailySeries, threshold: f64) -> SeriesStats {
    let moments = Moments::of(series);
    let mean = moments.mean();
    let std_dev = moments.std_dev();
    let width = threshold.abs() * std_dev;
    SeriesStats {
        mean,
        std_dev,
        threshold,
        lower: mean - width,
        upper: mean + width,
    }
}

/// Days whose count falls outside `mean ± threshold · σ`.
///
/// Ordered by count descending; equal counts stay in date order. A constant
/// (or empty) series has σ = 0 and yields nothing. The sign of `threshold`
/// is ignored. Band edges count as outside, so a zero threshold flags every
/// day of a non-constant series, including days exactly at the mean.
pub fn detect_anomalies(series: &DailySeries, threshold: f64) -> Vec<AnomalyEntry> {
    let moments = Moments::of(series);
    if moments.scaled_variance == 0 {
        return Vec::new();
    }

    let mut anomalies: Vec<AnomalyEntry> = series
        .iter()
        .filter(|e| moments.outside_band(e.count, threshold))
        .map(|e| AnomalyEntry {
            date: e.date,
            count: e.count,
        })
        .collect();
    anomalies.sort_by(|a, b| b.count.cmp(&a.count));
    anomalies
}
