//! Pose representation shared by the dataset, estimator and metrics modules.
//!
//! A [`Pose`] stores a position in meters and an orientation quaternion in the
//! scalar-first `W P Q R` order used by the labeled dataset files. Quaternions
//! read from ground truth are canonicalized through
//! [`quaternion::normalize_quaternion`]; predicted quaternions are kept exactly
//! as the estimator returned them so that the exported poses reflect the raw
//! network output.

use nalgebra::{Quaternion, Vector3};

pub mod quaternion;

pub use quaternion::{normalize_quaternion, rotation_matrix};

#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    #[error("Invalid quaternion: {0}")]
    InvalidQuaternion(String),
    #[error("Degenerate quaternion: {0}")]
    DegenerateQuaternion(String),
    #[error("Invalid pose: {0}")]
    InvalidPose(String),
}

/// A 3D position plus an orientation quaternion.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Position in meters.
    pub position: Vector3<f64>,
    /// Orientation, stored as a nalgebra [`Quaternion`] (`w` is the scalar part).
    pub orientation: Quaternion<f64>,
}

impl Pose {
    /// Creates a pose without touching the quaternion.
    pub fn new(position: Vector3<f64>, orientation: Quaternion<f64>) -> Self {
        Pose {
            position,
            orientation,
        }
    }

    /// Creates a pose whose orientation is canonicalized: unit norm and a
    /// non-negative scalar component.
    ///
    /// # Arguments
    ///
    /// * `position` - `[x, y, z]` in meters.
    /// * `quaternion` - raw `[w, p, q, r]` values, not necessarily unit length.
    ///
    /// # Errors
    ///
    /// * [`PoseError::InvalidQuaternion`] - if `quaternion` does not hold 4 values.
    /// * [`PoseError::DegenerateQuaternion`] - if its norm is zero or not finite.
    pub fn canonical(position: [f64; 3], quaternion: &[f64]) -> Result<Self, PoseError> {
        let [w, x, y, z] = normalize_quaternion(quaternion)?;
        Ok(Pose {
            position: Vector3::from(position),
            orientation: Quaternion::new(w, x, y, z),
        })
    }

    /// Builds a pose from a `[x, y, z, w, p, q, r]` row, leaving the quaternion raw.
    pub fn from_row(row: &[f64; 7]) -> Self {
        Pose {
            position: Vector3::new(row[0], row[1], row[2]),
            orientation: Quaternion::new(row[3], row[4], row[5], row[6]),
        }
    }

    /// Returns the pose as `[x, y, z, w, p, q, r]`.
    pub fn to_row(&self) -> [f64; 7] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.orientation.w,
            self.orientation.i,
            self.orientation.j,
            self.orientation.k,
        ]
    }
}
