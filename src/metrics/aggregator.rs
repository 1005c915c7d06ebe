//! Two-phase accumulation of per-sample errors into an [`AggregateReport`].

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    mean_and_stddev, percentile, sorted_copy, ErrorHistogram, ErrorRecord, ErrorStatistics,
    MetricsError,
};

/// Latency of the estimator, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingStatistics {
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
}

impl TimingStatistics {
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }
        let (mean, stddev) = mean_and_stddev(durations);
        let median = percentile(&sorted_copy(durations), 50.0);
        Some(TimingStatistics {
            mean,
            stddev,
            median,
        })
    }
}

/// Summary of a whole evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub sample_count: usize,
    /// Position error statistics, in meters.
    pub position: ErrorStatistics,
    /// Rotation error statistics, in degrees.
    pub rotation: ErrorStatistics,
    pub histogram: ErrorHistogram,
    /// `None` when no latency was recorded.
    pub timing: Option<TimingStatistics>,
}

/// Collects [`ErrorRecord`]s in dataset order.
///
/// [`ResultAggregator::finalize`] consumes the aggregator, so a finalized run
/// cannot receive more records.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    records: Vec<ErrorRecord>,
    latencies: Vec<f64>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    /// Records the estimator latency of one sample.
    pub fn record_latency(&mut self, elapsed: Duration) {
        self.latencies.push(elapsed.as_secs_f64());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Builds the report from everything accumulated so far.
    ///
    /// # Errors
    ///
    /// * [`MetricsError::NoSamples`] - if nothing was accumulated
    pub fn finalize(self) -> Result<AggregateReport, MetricsError> {
        let position_errors: Vec<f64> = self.records.iter().map(|r| r.position_error).collect();
        let rotation_errors: Vec<f64> = self
            .records
            .iter()
            .map(|r| r.rotation_error_degrees)
            .collect();

        let position =
            ErrorStatistics::from_values(&position_errors).ok_or(MetricsError::NoSamples)?;
        let rotation =
            ErrorStatistics::from_values(&rotation_errors).ok_or(MetricsError::NoSamples)?;
        let histogram = ErrorHistogram::from_errors(&position_errors);
        let timing = TimingStatistics::from_durations(&self.latencies);

        debug!("Histogram of error: {:?}", histogram.counts);
        info!(
            "Total loc err larger than {} meters: {}",
            histogram.max_edge(),
            histogram.exceeding()
        );

        Ok(AggregateReport {
            sample_count: self.records.len(),
            position,
            rotation,
            histogram,
            timing,
        })
    }
}
