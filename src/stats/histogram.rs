//! Evaluation time histogram using HdrHistogram
//!
//! Scoring a strategy takes anything from microseconds (a simulated scorer)
//! to many minutes (a full wildcard search), so the histogram records
//! microseconds over a range of 1µs to 24 hours with 3 significant digits.
//!
//! # Example
//!
//! ```
//! use stratsweep::stats::histogram::EvaluationHistogram;
//! use std::time::Duration;
//!
//! let mut hist = EvaluationHistogram::new();
//! hist.record(Duration::from_millis(120));
//! hist.record(Duration::from_millis(80));
//!
//! assert_eq!(hist.len(), 2);
//! assert!(hist.percentile(50.0).is_some());
//! ```

use crate::Result;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Largest recordable value: 24 hours in microseconds
const MAX_MICROS: u64 = 24 * 3600 * 1_000_000;

/// Histogram of per-strategy evaluation times
#[derive(Debug, Clone)]
pub struct EvaluationHistogram {
    histogram: Histogram<u64>,
}

impl EvaluationHistogram {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_MICROS, 3)
            .expect("histogram bounds are valid constants");
        Self { histogram }
    }

    /// Record one evaluation time, clamped to the histogram range
    #[inline]
    pub fn record(&mut self, elapsed: Duration) {
        let micros = (elapsed.as_micros() as u64).clamp(1, MAX_MICROS);
        let _ = self.histogram.record(micros);
    }

    /// Evaluation time at `percentile` (0.0 - 100.0)
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.value_at_percentile(percentile)))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.mean() as u64))
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Merge another worker's histogram into this one
    pub fn merge(&mut self, other: &EvaluationHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))?;
        Ok(())
    }
}

impl Default for EvaluationHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let hist = EvaluationHistogram::new();
        assert!(hist.is_empty());
        assert!(hist.percentile(50.0).is_none());
        assert!(hist.mean().is_none());
    }

    #[test]
    fn test_percentile() {
        let mut hist = EvaluationHistogram::new();
        for i in 1..=100 {
            hist.record(Duration::from_millis(i));
        }

        let p50 = hist.percentile(50.0).unwrap();
        assert!(p50.as_millis() >= 48 && p50.as_millis() <= 52);
        let max = hist.max().unwrap();
        assert!(max.as_millis() >= 99 && max.as_millis() <= 101);
    }

    #[test]
    fn test_sub_microsecond_clamped() {
        let mut hist = EvaluationHistogram::new();
        hist.record(Duration::from_nanos(10));
        assert_eq!(hist.min().unwrap(), Duration::from_micros(1));
    }

    #[test]
    fn test_merge() {
        let mut a = EvaluationHistogram::new();
        a.record(Duration::from_millis(10));
        let mut b = EvaluationHistogram::new();
        b.record(Duration::from_millis(30));
        b.record(Duration::from_millis(20));

        a.merge(&b).unwrap();
        assert_eq!(a.len(), 3);
        let mean = a.mean().unwrap();
        assert!(mean.as_millis() >= 19 && mean.as_millis() <= 21);
    }
}
