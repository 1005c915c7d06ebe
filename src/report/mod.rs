//! Result export.
//!
//! [`ReportExporter`] writes the five artifacts of an evaluation run into one
//! output directory:
//!
//! - `localize-poses.txt`: predicted pose of every image
//! - `localize-poses.json`: predicted and ground-truth translation/rotation matrices
//! - `summary-log.txt`: error and timing statistics
//! - `hist-log.txt`: position-error bin edges with the cumulative ratio
//! - `detail-log.txt`: per-image position and rotation error
//!
//! Every write failure is returned to the caller; nothing is retried.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::evaluation::EvaluatedSample;
use crate::metrics::{AggregateReport, ErrorStatistics};
use crate::pose::{rotation_matrix, Pose, PoseError};

pub const POSES_TXT_FILE: &str = "localize-poses.txt";
pub const POSES_JSON_FILE: &str = "localize-poses.json";
pub const SUMMARY_FILE: &str = "summary-log.txt";
pub const HISTOGRAM_FILE: &str = "hist-log.txt";
pub const DETAIL_FILE: &str = "detail-log.txt";

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to serialize JSON: {0}")]
    JsonError(String),
    #[error("Failed to write CSV: {0}")]
    CsvError(String),
    #[error("Invalid pose: {0}")]
    PoseError(String),
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::JsonError(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::CsvError(err.to_string())
    }
}

impl From<PoseError> for ReportError {
    fn from(err: PoseError) -> Self {
        ReportError::PoseError(err.to_string())
    }
}

/// Paths of the files written by [`ReportExporter::write_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub poses_txt: PathBuf,
    pub poses_json: PathBuf,
    pub summary: PathBuf,
    pub histogram: PathBuf,
    pub detail: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path) -> Self {
        OutputPaths {
            poses_txt: output_dir.join(POSES_TXT_FILE),
            poses_json: output_dir.join(POSES_JSON_FILE),
            summary: output_dir.join(SUMMARY_FILE),
            histogram: output_dir.join(HISTOGRAM_FILE),
            detail: output_dir.join(DETAIL_FILE),
        }
    }

    pub fn all(&self) -> [&Path; 5] {
        [
            self.poses_txt.as_path(),
            self.poses_json.as_path(),
            self.summary.as_path(),
            self.histogram.as_path(),
            self.detail.as_path(),
        ]
    }
}

/// One entry of `localize-poses.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizationEntry {
    pub filename: String,
    /// Predicted translation.
    pub t: [f64; 3],
    /// Predicted rotation matrix, row-major.
    #[serde(rename = "R")]
    pub r: [[f64; 3]; 3],
    /// Ground-truth translation.
    pub groundtruth: [f64; 3],
    /// Ground-truth rotation matrix, row-major.
    #[serde(rename = "groundtruthR")]
    pub groundtruth_r: [[f64; 3]; 3],
}

/// Top-level object of `localize-poses.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizationExport {
    #[serde(rename = "locGlobal")]
    pub loc_global: Vec<LocalizationEntry>,
}

impl LocalizationExport {
    pub fn from_samples(samples: &[EvaluatedSample]) -> Result<Self, PoseError> {
        let loc_global = samples
            .iter()
            .map(|sample| {
                Ok(LocalizationEntry {
                    filename: sample.image.clone(),
                    t: translation(&sample.predicted),
                    r: rotation_rows(&sample.predicted)?,
                    groundtruth: translation(&sample.ground_truth),
                    groundtruth_r: rotation_rows(&sample.ground_truth)?,
                })
            })
            .collect::<Result<Vec<_>, PoseError>>()?;
        Ok(LocalizationExport { loc_global })
    }
}

fn translation(pose: &Pose) -> [f64; 3] {
    [pose.position.x, pose.position.y, pose.position.z]
}

fn rotation_rows(pose: &Pose) -> Result<[[f64; 3]; 3], PoseError> {
    let m = rotation_matrix(&pose.orientation)?;
    let mut rows = [[0.0; 3]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = m[(i, j)];
        }
    }
    Ok(rows)
}

/// Writes evaluation artifacts into an output directory.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    paths: OutputPaths,
}

impl ReportExporter {
    /// Creates the exporter, creating `output_dir` if it does not exist.
    pub fn new(output_dir: &Path) -> Result<Self, ReportError> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).map_err(|e| {
                ReportError::IOError(format!(
                    "Failed to create output directory {}: {e}",
                    output_dir.display()
                ))
            })?;
        }
        Ok(ReportExporter {
            paths: OutputPaths::new(output_dir),
        })
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Writes all five artifacts.
    pub fn write_all(
        &self,
        samples: &[EvaluatedSample],
        report: &AggregateReport,
    ) -> Result<OutputPaths, ReportError> {
        self.write_poses_txt(samples)?;
        self.write_poses_json(samples)?;
        self.write_summary(report)?;
        self.write_histogram(report)?;
        self.write_detail(samples)?;

        info!("Results exported to:");
        for path in self.paths.all() {
            info!("  - {}", path.display());
        }
        Ok(self.paths.clone())
    }

    /// Writes the predicted pose of every sample, `%f` formatted.
    pub fn write_poses_txt(&self, samples: &[EvaluatedSample]) -> Result<(), ReportError> {
        let mut file = BufWriter::new(File::create(&self.paths.poses_txt)?);
        writeln!(file, "Localization Data V1")?;
        writeln!(file, "ImageFile, Camera Position [X Y Z W P Q R]")?;
        writeln!(file)?;
        for sample in samples {
            let values: Vec<String> = sample
                .predicted
                .to_row()
                .iter()
                .map(|v| format!("{v:.6}"))
                .collect();
            writeln!(file, "{} {}", sample.image, values.join(" "))?;
        }
        file.flush()?;
        Ok(())
    }

    /// Writes predicted and ground-truth translations and rotation matrices.
    pub fn write_poses_json(&self, samples: &[EvaluatedSample]) -> Result<(), ReportError> {
        let export = LocalizationExport::from_samples(samples)?;
        let mut file = BufWriter::new(File::create(&self.paths.poses_json)?);
        serde_json::to_writer(&mut file, &export)?;
        file.flush()?;
        Ok(())
    }

    /// Writes the human readable summary.
    pub fn write_summary(&self, report: &AggregateReport) -> Result<(), ReportError> {
        let mut file = BufWriter::new(File::create(&self.paths.summary)?);
        write_summary_to(&mut file, report)?;
        file.flush()?;
        Ok(())
    }

    /// Writes `bin_edge,cumulative_ratio` rows, one per bin.
    pub fn write_histogram(&self, report: &AggregateReport) -> Result<(), ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.paths.histogram)?;
        let histogram = &report.histogram;
        for (edge, ratio) in histogram
            .bin_edges
            .iter()
            .zip(histogram.cumulative_ratio())
        {
            writer.write_record([scientific(*edge), scientific(ratio)])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes `image,position_error,rotation_error` rows.
    pub fn write_detail(&self, samples: &[EvaluatedSample]) -> Result<(), ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.paths.detail)?;
        for sample in samples {
            writer.write_record([
                sample.image.clone(),
                sample.error.position_error.to_string(),
                sample.error.rotation_error_degrees.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// `%.18e` formatting: signed exponent of at least two digits.
fn scientific(value: f64) -> String {
    let formatted = format!("{value:.18e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

fn write_statistics<W: Write>(
    out: &mut W,
    stats: &ErrorStatistics,
    unit: &str,
) -> std::io::Result<()> {
    writeln!(out, "Mean error = {} {unit}.", stats.mean)?;
    writeln!(out, "StdDev error = {} {unit}.", stats.stddev)?;
    writeln!(out, "Median error = {} {unit}.", stats.median)?;
    writeln!(out, "Max error = {} {unit}.", stats.max)?;
    writeln!(out, "80 percentile error = {} {unit}.", stats.percentile_80)?;
    writeln!(out, "90 percentile error = {} {unit}.", stats.percentile_90)?;
    writeln!(out, "95 percentile error = {} {unit}.", stats.percentile_95)?;
    Ok(())
}

/// Formats the summary report into any writer.
pub fn write_summary_to<W: Write>(out: &mut W, report: &AggregateReport) -> std::io::Result<()> {
    writeln!(out, "Number of test image = {}", report.sample_count)?;
    write_statistics(out, &report.position, "meters")?;
    writeln!(out)?;
    write_statistics(out, &report.rotation, "degrees")?;
    writeln!(out)?;

    let histogram = &report.histogram;
    let counts: Vec<String> = histogram.counts.iter().map(|c| c.to_string()).collect();
    let ratios: Vec<String> = histogram
        .cumulative_ratio()
        .iter()
        .map(|r| format!("{r:.2}"))
        .collect();
    writeln!(out, "Histogram of error: [{}]", counts.join(" "))?;
    writeln!(out, "Cumulative ratio: [{}]", ratios.join(" "))?;
    writeln!(
        out,
        "Total loc err larger than {} meters: {}",
        histogram.max_edge(),
        histogram.exceeding()
    )?;

    if let Some(timing) = &report.timing {
        writeln!(out)?;
        writeln!(out, "Mean time = {}", timing.mean)?;
        writeln!(out, "StdDev time = {}", timing.stddev)?;
        writeln!(out, "Median time = {}", timing.median)?;
    }
    Ok(())
}
