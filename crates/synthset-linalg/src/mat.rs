use crate::LinalgError;

/// A 3 element column vector.
pub type Vec3 = [f64; 3];

/// A row-major 3x3 matrix.
pub type Mat3 = [[f64; 3]; 3];

/// A row-major 3x4 matrix, typically `[R|t]` or `K·[R|t]`.
pub type Mat34 = [[f64; 4]; 3];

/// A row-major 4x4 homogeneous matrix.
pub type Mat4 = [[f64; 4]; 4];

/// The 3x3 identity matrix.
pub const IDENTITY3: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// The 4x4 identity matrix.
pub const IDENTITY4: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

// pivots below this magnitude are treated as zero by the inversion
const SINGULAR_EPS: f64 = 1e-12;

/// Multiply two 3x3 matrices.
pub fn mat3_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Multiply a 3x3 matrix by a column vector.
pub fn mat3_mul_vec(a: &Mat3, v: &Vec3) -> Vec3 {
    [
        a[0][0] * v[0] + a[0][1] * v[1] + a[0][2] * v[2],
        a[1][0] * v[0] + a[1][1] * v[1] + a[1][2] * v[2],
        a[2][0] * v[0] + a[2][1] * v[1] + a[2][2] * v[2],
    ]
}

/// Transpose a 3x3 matrix.
pub fn mat3_transpose(a: &Mat3) -> Mat3 {
    [
        [a[0][0], a[1][0], a[2][0]],
        [a[0][1], a[1][1], a[2][1]],
        [a[0][2], a[1][2], a[2][2]],
    ]
}

/// Determinant of a 3x3 matrix.
pub fn mat3_determinant(a: &Mat3) -> f64 {
    a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
}

/// Invert a 3x3 matrix using the adjugate.
///
/// # Errors
///
/// Returns [`LinalgError::SingularMatrix`] if the determinant vanishes.
pub fn mat3_inverse(a: &Mat3) -> Result<Mat3, LinalgError> {
    let det = mat3_determinant(a);
    if det.abs() < SINGULAR_EPS {
        return Err(LinalgError::SingularMatrix(det));
    }
    let inv_det = 1.0 / det;
    Ok([
        [
            (a[1][1] * a[2][2] - a[1][2] * a[2][1]) * inv_det,
            (a[0][2] * a[2][1] - a[0][1] * a[2][2]) * inv_det,
            (a[0][1] * a[1][2] - a[0][2] * a[1][1]) * inv_det,
        ],
        [
            (a[1][2] * a[2][0] - a[1][0] * a[2][2]) * inv_det,
            (a[0][0] * a[2][2] - a[0][2] * a[2][0]) * inv_det,
            (a[0][2] * a[1][0] - a[0][0] * a[1][2]) * inv_det,
        ],
        [
            (a[1][0] * a[2][1] - a[1][1] * a[2][0]) * inv_det,
            (a[0][1] * a[2][0] - a[0][0] * a[2][1]) * inv_det,
            (a[0][0] * a[1][1] - a[0][1] * a[1][0]) * inv_det,
        ],
    ])
}

/// Multiply two 4x4 matrices.
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Transform a point by a 4x4 homogeneous matrix (w = 1), dividing by the resulting w.
pub fn mat4_transform_point(a: &Mat4, p: &Vec3) -> Vec3 {
    let mut out = [0.0; 4];
    for (i, val) in out.iter_mut().enumerate() {
        *val = a[i][0] * p[0] + a[i][1] * p[1] + a[i][2] * p[2] + a[i][3];
    }
    if out[3] != 0.0 && out[3] != 1.0 {
        [out[0] / out[3], out[1] / out[3], out[2] / out[3]]
    } else {
        [out[0], out[1], out[2]]
    }
}

/// Invert a 4x4 matrix by Gauss-Jordan elimination with partial pivoting.
///
/// # Errors
///
/// Returns [`LinalgError::SingularMatrix`] if a pivot vanishes.
///
/// Example:
///
/// ```
/// use synthset_linalg::{mat4_inverse, IDENTITY4};
///
/// let inv = mat4_inverse(&IDENTITY4).unwrap();
/// assert_eq!(inv, IDENTITY4);
/// ```
pub fn mat4_inverse(a: &Mat4) -> Result<Mat4, LinalgError> {
    let mut m = *a;
    let mut inv = IDENTITY4;

    for col in 0..4 {
        // find the row with the largest pivot for this column
        let pivot_row = (col..4)
            .max_by(|&r0, &r1| m[r0][col].abs().total_cmp(&m[r1][col].abs()))
            .unwrap_or(col);

        let pivot = m[pivot_row][col];
        if pivot.abs() < SINGULAR_EPS {
            return Err(LinalgError::SingularMatrix(pivot));
        }

        m.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let inv_pivot = 1.0 / pivot;
        for j in 0..4 {
            m[col][j] *= inv_pivot;
            inv[col][j] *= inv_pivot;
        }

        for row in 0..4 {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..4 {
                m[row][j] -= factor * m[col][j];
                inv[row][j] -= factor * inv[col][j];
            }
        }
    }

    Ok(inv)
}

/// Embed a 3x3 matrix into the upper-left block of a 4x4 identity.
pub fn mat3_to_mat4(a: &Mat3) -> Mat4 {
    let mut out = IDENTITY4;
    for i in 0..3 {
        out[i][..3].copy_from_slice(&a[i]);
    }
    out
}

/// Lift a 3x4 matrix to 4x4 by appending the row `[0, 0, 0, 1]`.
pub fn mat34_to_mat4(a: &Mat34) -> Mat4 {
    [a[0], a[1], a[2], [0.0, 0.0, 0.0, 1.0]]
}

/// Drop the last row of a 4x4 matrix.
pub fn mat4_to_mat34(a: &Mat4) -> Mat34 {
    [a[0], a[1], a[2]]
}

/// Build a 3x4 matrix `[R|t]` from a rotation and a translation.
pub fn compose_rt(rotation: &Mat3, translation: &Vec3) -> Mat34 {
    let mut out = [[0.0; 4]; 3];
    for i in 0..3 {
        out[i][..3].copy_from_slice(&rotation[i]);
        out[i][3] = translation[i];
    }
    out
}

/// Split a 3x4 matrix `[R|t]` into its left 3x3 block and last column.
pub fn split_rt(a: &Mat34) -> (Mat3, Vec3) {
    let rotation = [
        [a[0][0], a[0][1], a[0][2]],
        [a[1][0], a[1][1], a[1][2]],
        [a[2][0], a[2][1], a[2][2]],
    ];
    (rotation, [a[0][3], a[1][3], a[2][3]])
}

/// Multiply a 3x3 matrix by a 3x4 matrix.
pub fn mat3_mul_mat34(a: &Mat3, b: &Mat34) -> Mat34 {
    let mut out = [[0.0; 4]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Euclidean norm of a vector.
pub fn vec3_norm(v: &Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Cross product `a × b`.
pub fn vec3_cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Flatten a row-major matrix into a vector.
pub fn flatten_rows<const R: usize, const C: usize>(a: &[[f64; C]; R]) -> Vec<f64> {
    a.iter().flat_map(|row| row.iter().copied()).collect()
}
