use crate::mat::Mat3;

/// A quaternion stored as `[qw, qx, qy, qz]`.
pub type Quaternion = [f64; 4];

/// Strategy used to extract a quaternion from a rotation matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuaternionFormula {
    /// The classic trace-based formula with signs taken from the off-diagonal differences.
    ///
    /// NOTE: degenerates near 180° rotations, where the trace and one off-diagonal
    /// difference both vanish and the result collapses towards the zero quaternion.
    #[default]
    Trace,
    /// Branch on the largest diagonal term, stable for every rotation.
    LargestDiagonal,
}

// sign function returning zero for zero, unlike f64::signum
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Convert a rotation matrix to a quaternion using the requested formula.
///
/// The scalar part `qw` of the trace formula is always non-negative.
///
/// Example:
///
/// ```
/// use synthset_linalg::quat::{rotation_matrix_to_quaternion, QuaternionFormula};
/// use synthset_linalg::IDENTITY3;
///
/// let q = rotation_matrix_to_quaternion(&IDENTITY3, QuaternionFormula::Trace);
/// assert_eq!(q, [1.0, 0.0, 0.0, 0.0]);
/// ```
pub fn rotation_matrix_to_quaternion(r: &Mat3, formula: QuaternionFormula) -> Quaternion {
    match formula {
        QuaternionFormula::Trace => rotation_matrix_to_quaternion_trace(r),
        QuaternionFormula::LargestDiagonal => rotation_matrix_to_quaternion_robust(r),
    }
}

fn rotation_matrix_to_quaternion_trace(r: &Mat3) -> Quaternion {
    let qw = (1.0 + r[0][0] + r[1][1] + r[2][2]).max(0.0).sqrt() / 2.0;
    let qx = sign(r[2][1] - r[1][2]) * (1.0 + r[0][0] - r[1][1] - r[2][2]).max(0.0).sqrt() / 2.0;
    let qy = sign(r[0][2] - r[2][0]) * (1.0 - r[0][0] + r[1][1] - r[2][2]).max(0.0).sqrt() / 2.0;
    let qz = sign(r[1][0] - r[0][1]) * (1.0 - r[0][0] - r[1][1] + r[2][2]).max(0.0).sqrt() / 2.0;
    [qw, qx, qy, qz]
}

fn rotation_matrix_to_quaternion_robust(r: &Mat3) -> Quaternion {
    let trace = r[0][0] + r[1][1] + r[2][2];

    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        [
            0.25 * s,
            (r[2][1] - r[1][2]) / s,
            (r[0][2] - r[2][0]) / s,
            (r[1][0] - r[0][1]) / s,
        ]
    } else if r[0][0] > r[1][1] && r[0][0] > r[2][2] {
        let s = (1.0 + r[0][0] - r[1][1] - r[2][2]).sqrt() * 2.0;
        [
            (r[2][1] - r[1][2]) / s,
            0.25 * s,
            (r[0][1] + r[1][0]) / s,
            (r[0][2] + r[2][0]) / s,
        ]
    } else if r[1][1] > r[2][2] {
        let s = (1.0 - r[0][0] + r[1][1] - r[2][2]).sqrt() * 2.0;
        [
            (r[0][2] - r[2][0]) / s,
            (r[0][1] + r[1][0]) / s,
            0.25 * s,
            (r[1][2] + r[2][1]) / s,
        ]
    } else {
        let s = (1.0 - r[0][0] - r[1][1] + r[2][2]).sqrt() * 2.0;
        [
            (r[1][0] - r[0][1]) / s,
            (r[0][2] + r[2][0]) / s,
            (r[1][2] + r[2][1]) / s,
            0.25 * s,
        ]
    };

    // keep the same hemisphere as the trace formula
    if q[0] < 0.0 {
        [-q[0], -q[1], -q[2], -q[3]]
    } else {
        q
    }
}

/// Convert a quaternion `[qw, qx, qy, qz]` to a rotation matrix.
///
/// The quaternion is normalized first; a zero quaternion maps to the zero matrix.
pub fn quaternion_to_rotation_matrix(q: &Quaternion) -> Mat3 {
    let norm = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if norm == 0.0 {
        return [[0.0; 3]; 3];
    }
    let (w, x, y, z) = (q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm);

    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
        ],
        [
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
        ],
        [
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::axis_angle_to_rotation_matrix;
    use crate::LinalgError;
    use approx::assert_relative_eq;

    const AXES: [[f64; 3]; 6] = [
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 1.0, 0.0],
        [1.0, -2.0, 3.0],
        [-0.3, 0.5, -0.8],
    ];

    fn assert_mat3_eq(a: &Mat3, b: &Mat3, eps: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(a[i][j], b[i][j], epsilon = eps);
            }
        }
    }

    #[test]
    fn test_trace_roundtrip_away_from_half_turn() -> Result<(), LinalgError> {
        for axis in AXES.iter() {
            for step in 0..=34 {
                // up to 170 degrees
                let angle = (step as f64 * 5.0).to_radians();
                let r = axis_angle_to_rotation_matrix(axis, angle)?;
                let q = rotation_matrix_to_quaternion(&r, QuaternionFormula::Trace);
                assert_mat3_eq(&quaternion_to_rotation_matrix(&q), &r, 1e-6);
                assert!(q[0] >= 0.0);
            }
        }
        Ok(())
    }

    #[test]
    fn test_robust_roundtrip_full_range() -> Result<(), LinalgError> {
        for axis in AXES.iter() {
            for step in 0..=36 {
                let angle = (step as f64 * 5.0).to_radians();
                let r = axis_angle_to_rotation_matrix(axis, angle)?;
                let q = rotation_matrix_to_quaternion(&r, QuaternionFormula::LargestDiagonal);
                assert_mat3_eq(&quaternion_to_rotation_matrix(&q), &r, 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_formulas_agree_for_moderate_rotation() -> Result<(), LinalgError> {
        let r = axis_angle_to_rotation_matrix(&[1.0, -2.0, 3.0], 1.1)?;
        let q0 = rotation_matrix_to_quaternion(&r, QuaternionFormula::Trace);
        let q1 = rotation_matrix_to_quaternion(&r, QuaternionFormula::LargestDiagonal);
        for i in 0..4 {
            assert_relative_eq!(q0[i], q1[i], epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_trace_formula_degenerates_at_half_turn() {
        // 180 degrees about x
        let r = [[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]];
        let q = rotation_matrix_to_quaternion(&r, QuaternionFormula::Trace);
        assert_eq!(q, [0.0, 0.0, 0.0, 0.0]);

        let q = rotation_matrix_to_quaternion(&r, QuaternionFormula::LargestDiagonal);
        assert_relative_eq!(q[1].abs(), 1.0);
        assert_mat3_eq(&quaternion_to_rotation_matrix(&q), &r, 1e-12);
    }
}
