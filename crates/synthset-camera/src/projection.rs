use synthset_linalg::{mat3_inverse, mat3_mul_mat34, mat34_to_mat4, Mat34, Mat4};

use crate::{CameraError, CameraIntrinsic, Extrinsics};

/// Compute the projection matrix `P = K·[R|t]`.
///
/// # Arguments
///
/// * `intrinsic` - The pinhole intrinsics.
/// * `extrinsics` - The world-to-camera transform.
///
/// # Returns
///
/// The 3x4 projection matrix mapping homogeneous world points to homogeneous pixels.
pub fn projection_matrix(intrinsic: &CameraIntrinsic, extrinsics: &Extrinsics) -> Mat34 {
    mat3_mul_mat34(&intrinsic.matrix3(), &extrinsics.matrix34())
}

/// The projection matrix lifted to 4x4 with a `[0, 0, 0, 1]` bottom row.
pub fn lifted_projection_matrix(intrinsic: &CameraIntrinsic, extrinsics: &Extrinsics) -> Mat4 {
    mat34_to_mat4(&projection_matrix(intrinsic, extrinsics))
}

/// Recover `[R|t]` from a projection matrix given its intrinsics, as `K⁻¹·P`.
///
/// # Errors
///
/// Returns an error if `K` is singular.
pub fn extrinsics_from_projection(
    intrinsic: &CameraIntrinsic,
    projection: &Mat34,
) -> Result<Extrinsics, CameraError> {
    let k_inv = mat3_inverse(&intrinsic.matrix3())?;
    Ok(Extrinsics::from_matrix34(&mat3_mul_mat34(&k_inv, projection)))
}

/// Project a world point to pixel coordinates.
///
/// Returns `None` for points on the camera plane.
pub fn project_point(projection: &Mat34, point: &[f64; 3]) -> Option<[f64; 2]> {
    let h = [point[0], point[1], point[2], 1.0];
    let row = |r: &[f64; 4]| r.iter().zip(h.iter()).map(|(a, b)| a * b).sum::<f64>();
    let w = row(&projection[2]);
    if w.abs() < f64::EPSILON {
        return None;
    }
    Some([row(&projection[0]) / w, row(&projection[1]) / w])
}
