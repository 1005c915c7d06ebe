//! Labeled dataset loading.
//!
//! The labeled dataset is a text file in the Cambridge Visual Landmark layout
//! extended with a beacon column:
//!
//! ```text
//! <header line>
//! <header line>
//! <header line>
//! seq1/frame00001.png <beacon descriptor> X Y Z W P Q R
//! ```
//!
//! Image paths are relative to the directory holding the dataset file. The
//! ground-truth quaternion is canonicalized on load (unit norm, `W >= 0`).

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pose::{Pose, PoseError};

/// Number of header lines preceding the samples in dataset and pose files.
pub const HEADER_LINES: usize = 3;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to parse dataset: {0}")]
    ParseError(String),
    #[error("Invalid ground-truth pose: {0}")]
    PoseError(String),
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::IOError(err.to_string())
    }
}

impl From<PoseError> for DatasetError {
    fn from(err: PoseError) -> Self {
        DatasetError::PoseError(err.to_string())
    }
}

/// One labeled sample of the evaluation set.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    /// Image identifier as written in the dataset file.
    pub image: String,
    /// Image path resolved against the dataset directory.
    pub image_path: PathBuf,
    /// Raw beacon-signal descriptor. Interpreted only by the estimator.
    pub beacon: String,
    /// Canonicalized ground-truth pose.
    pub ground_truth: Pose,
}

impl LabeledSample {
    /// File name of the image without its directories, used in every report.
    pub fn file_name(&self) -> String {
        base_name(&self.image)
    }
}

/// Ordered, immutable set of labeled samples.
#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<LabeledSample>,
}

impl Dataset {
    pub fn new(samples: Vec<LabeledSample>) -> Self {
        Dataset { samples }
    }

    /// Loads a labeled dataset file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the dataset text file
    ///
    /// # Returns
    ///
    /// * `Result<Dataset, DatasetError>` - Samples in file order
    ///
    /// # Errors
    ///
    /// * [`DatasetError::IOError`] - if the file cannot be read
    /// * [`DatasetError::ParseError`] - if a sample line is malformed
    /// * [`DatasetError::PoseError`] - if a ground-truth quaternion is degenerate
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DatasetError::IOError(format!("{}: {e}", path.display())))?;
        let image_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut samples = Vec::new();
        for (line_no, line) in contents.lines().enumerate().skip(HEADER_LINES) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 9 {
                return Err(DatasetError::ParseError(format!(
                    "line {}: expected 9 fields (image, beacon, 7 pose values), got {}",
                    line_no + 1,
                    fields.len()
                )));
            }

            let row = parse_pose_values(&fields[2..], line_no + 1)
                .map_err(DatasetError::ParseError)?;
            let ground_truth = Pose::canonical([row[0], row[1], row[2]], &row[3..])?;

            debug!("Loaded sample {} with ground truth {:?}", fields[0], row);
            samples.push(LabeledSample {
                image: fields[0].to_string(),
                image_path: image_dir.join(fields[0]),
                beacon: fields[1].to_string(),
                ground_truth,
            });
        }

        info!("Loaded {} samples from {}", samples.len(), path.display());
        Ok(Dataset { samples })
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledSample> {
        self.samples.iter()
    }
}

/// Parses seven whitespace-separated pose values `X Y Z W P Q R`.
pub(crate) fn parse_pose_values(fields: &[&str], line_no: usize) -> Result<[f64; 7], String> {
    if fields.len() != 7 {
        return Err(format!(
            "line {line_no}: expected 7 pose values, got {}",
            fields.len()
        ));
    }
    let mut row = [0.0; 7];
    for (value, field) in row.iter_mut().zip(fields) {
        *value = field
            .parse::<f64>()
            .map_err(|e| format!("line {line_no}: invalid number '{field}': {e}"))?;
    }
    Ok(row)
}

/// Strips directories from an image identifier.
pub(crate) fn base_name(image: &str) -> String {
    Path::new(image)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_load_sample_dataset() {
        let dataset = Dataset::load(Path::new("samples/dataset_test.txt")).unwrap();
        assert_eq!(dataset.len(), 3);

        let first = &dataset.samples()[0];
        assert_eq!(first.image, "seq1/frame00001.png");
        assert_eq!(first.file_name(), "frame00001.png");
        assert_eq!(first.image_path, Path::new("samples/seq1/frame00001.png"));
        assert_eq!(first.beacon, "b0:-70,b1:-82");
        assert_relative_eq!(first.ground_truth.orientation.w, 1.0);

        // written as (-2, 0, 0, 0), stored canonical
        let third = &dataset.samples()[2];
        assert_relative_eq!(third.ground_truth.orientation.w, 1.0);
        assert_relative_eq!(third.ground_truth.position.x, 12.0);
    }

    #[test]
    fn test_load_rejects_short_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "h1\nh2\nh3").unwrap();
        writeln!(file, "img.png beacons 1 2 3 1 0 0").unwrap();
        let result = Dataset::load(file.path());
        assert!(matches!(result, Err(DatasetError::ParseError(_))));
    }

    #[test]
    fn test_load_rejects_degenerate_quaternion() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "h1\nh2\nh3").unwrap();
        writeln!(file, "img.png beacons 1 2 3 0 0 0 0").unwrap();
        let result = Dataset::load(file.path());
        assert!(matches!(result, Err(DatasetError::PoseError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Dataset::load(Path::new("samples/does_not_exist.txt"));
        assert!(matches!(result, Err(DatasetError::IOError(_))));
    }

    #[test]
    fn test_parse_pose_values_reports_bad_number() {
        let err = parse_pose_values(&["1", "2", "x", "1", "0", "0", "0"], 4).unwrap_err();
        assert!(err.contains("line 4"));
    }
}
