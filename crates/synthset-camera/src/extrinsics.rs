use synthset_linalg::{
    compose_rt, mat3_determinant, mat3_mul, mat3_mul_vec, mat3_transpose, mat34_to_mat4, split_rt,
    Mat3, Mat34, Mat4, Vec3,
};

use crate::CameraError;

/// Rotation from the host camera axes (y up, z backward) to CV axes (y down, z forward).
pub const BCAM_TO_CV: Mat3 = [[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]];

/// Split an affine world matrix into location, pure rotation and per-axis scale.
///
/// A mirrored basis is folded into the rotation by negating it together with the scale.
///
/// # Errors
///
/// Returns [`CameraError::DegenerateTransform`] if any basis column has zero length.
pub fn decompose_world_matrix(world: &Mat4) -> Result<(Vec3, Mat3, Vec3), CameraError> {
    let location = [world[0][3], world[1][3], world[2][3]];

    let mut scale = [0.0; 3];
    let mut rotation = [[0.0; 3]; 3];
    for j in 0..3 {
        let norm = (0..3).map(|i| world[i][j] * world[i][j]).sum::<f64>().sqrt();
        if norm < 1e-12 {
            return Err(CameraError::DegenerateTransform(format!(
                "basis column {j} has zero length"
            )));
        }
        scale[j] = norm;
        for i in 0..3 {
            rotation[i][j] = world[i][j] / norm;
        }
    }

    if mat3_determinant(&rotation) < 0.0 {
        rotation = rotation.map(|row| row.map(|v| -v));
        scale = scale.map(|v| -v);
    }

    Ok((location, rotation, scale))
}

/// A world-to-camera rigid transform in the CV axis convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrinsics {
    /// World-to-camera rotation.
    pub rotation: Mat3,
    /// World-to-camera translation.
    pub translation: Vec3,
}

impl Extrinsics {
    /// Build extrinsics from a 3x4 `[R|t]` matrix.
    pub fn from_matrix34(rt: &Mat34) -> Self {
        let (rotation, translation) = split_rt(rt);
        Self {
            rotation,
            translation,
        }
    }

    /// The 3x4 `[R|t]` matrix.
    pub fn matrix34(&self) -> Mat34 {
        compose_rt(&self.rotation, &self.translation)
    }

    /// The `[R|t]` matrix lifted to 4x4 with a `[0, 0, 0, 1]` bottom row.
    pub fn matrix4(&self) -> Mat4 {
        mat34_to_mat4(&self.matrix34())
    }

    /// The inverse transform, mapping camera coordinates to world coordinates.
    pub fn camera_to_world(&self) -> Mat4 {
        let rt = mat3_transpose(&self.rotation);
        let c = self.camera_center();
        mat34_to_mat4(&compose_rt(&rt, &c))
    }

    /// The camera center in world coordinates, `-Rᵀ·t`.
    pub fn camera_center(&self) -> Vec3 {
        let c = mat3_mul_vec(&mat3_transpose(&self.rotation), &self.translation);
        [-c[0], -c[1], -c[2]]
    }
}

/// Derive CV extrinsics from the host camera's world matrix.
///
/// Scale in the world matrix is discarded; only the location and rotation are used.
///
/// # Arguments
///
/// * `world` - The camera-to-world matrix of the host camera.
///
/// # Returns
///
/// The world-to-camera rotation and translation with x right, y down, z forward.
pub fn derive_extrinsics(world: &Mat4) -> Result<Extrinsics, CameraError> {
    let (location, rotation, _scale) = decompose_world_matrix(world)?;

    let r_world2bcam = mat3_transpose(&rotation);
    let t = mat3_mul_vec(&r_world2bcam, &location);
    let t_world2bcam = [-t[0], -t[1], -t[2]];

    Ok(Extrinsics {
        rotation: mat3_mul(&BCAM_TO_CV, &r_world2bcam),
        translation: mat3_mul_vec(&BCAM_TO_CV, &t_world2bcam),
    })
}
