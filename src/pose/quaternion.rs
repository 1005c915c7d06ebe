//! Quaternion canonicalization and conversion helpers.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion};

use super::PoseError;

/// Normalizes a raw `[w, x, y, z]` quaternion and moves it to the northern
/// hemisphere (`w >= 0`).
///
/// `q` and `-q` encode the same rotation, so forcing the sign of the scalar
/// part gives every rotation a single stored representation.
///
/// # Arguments
///
/// * `quat` - Raw quaternion components, scalar first.
///
/// # Returns
///
/// * `Result<[f64; 4], PoseError>` - Unit quaternion with a non-negative scalar part
///
/// # Errors
///
/// * [`PoseError::InvalidQuaternion`] - if `quat.len() != 4`
/// * [`PoseError::DegenerateQuaternion`] - if the norm is zero or not finite
pub fn normalize_quaternion(quat: &[f64]) -> Result<[f64; 4], PoseError> {
    if quat.len() != 4 {
        return Err(PoseError::InvalidQuaternion(format!(
            "expected 4 components, got {}",
            quat.len()
        )));
    }

    let norm = quat.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(PoseError::DegenerateQuaternion(format!(
            "norm of {quat:?} is {norm}"
        )));
    }

    let sign = if quat[0] < 0.0 { -1.0 } else { 1.0 };
    Ok([
        sign * quat[0] / norm,
        sign * quat[1] / norm,
        sign * quat[2] / norm,
        sign * quat[3] / norm,
    ])
}

/// Converts a (not necessarily unit) quaternion into a 3x3 rotation matrix.
///
/// # Errors
///
/// * [`PoseError::DegenerateQuaternion`] - if the quaternion cannot be normalized
pub fn rotation_matrix(quat: &Quaternion<f64>) -> Result<Matrix3<f64>, PoseError> {
    let norm = quat.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(PoseError::DegenerateQuaternion(format!(
            "cannot build a rotation from quaternion with norm {norm}"
        )));
    }
    Ok(UnitQuaternion::from_quaternion(*quat)
        .to_rotation_matrix()
        .into_inner())
}
