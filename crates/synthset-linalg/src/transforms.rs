use crate::{mat::Mat3, mat::Vec3, LinalgError};

/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation, normalized internally.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix.
///
/// Example:
///
/// ```
/// use synthset_linalg::transforms::axis_angle_to_rotation_matrix;
///
/// let rotation = axis_angle_to_rotation_matrix(&[0.0, 0.0, 2.0], 0.0).unwrap();
/// assert_eq!(rotation, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
/// ```
pub fn axis_angle_to_rotation_matrix(axis: &Vec3, angle: f64) -> Result<Mat3, LinalgError> {
    let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
    if magnitude < 1e-10 {
        return Err(LinalgError::ZeroAxis);
    }
    let (x, y, z) = (
        axis[0] / magnitude,
        axis[1] / magnitude,
        axis[2] / magnitude,
    );

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    Ok([
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s],
        [x * y * t + z * s, c + y * y * t, y * z * t - x * s],
        [x * z * t - y * s, y * z * t + x * s, c + z * z * t],
    ])
}

/// Build the rotation of an object whose local `-Z` axis points along `direction`
/// and whose local `Y` axis points as close as possible to world `+Z`.
///
/// The columns of the returned matrix are the object's local axes in world space.
/// When `direction` is parallel to world `+Z`, world `+Y` is used as the up hint.
///
/// # Errors
///
/// Returns [`LinalgError::ZeroAxis`] for a zero-length direction.
pub fn look_at_rotation(direction: &Vec3) -> Result<Mat3, LinalgError> {
    let len = crate::vec3_norm(direction);
    if len < 1e-10 {
        return Err(LinalgError::ZeroAxis);
    }
    let forward = [
        direction[0] / len,
        direction[1] / len,
        direction[2] / len,
    ];
    // the local z axis looks away from the target
    let z_axis = [-forward[0], -forward[1], -forward[2]];

    let up_hint = if forward[0].abs() < 1e-9 && forward[1].abs() < 1e-9 {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };

    let x_raw = crate::vec3_cross(&up_hint, &z_axis);
    let x_len = crate::vec3_norm(&x_raw);
    let x_axis = [x_raw[0] / x_len, x_raw[1] / x_len, x_raw[2] / x_len];
    let y_axis = crate::vec3_cross(&z_axis, &x_axis);

    Ok([
        [x_axis[0], y_axis[0], z_axis[0]],
        [x_axis[1], y_axis[1], z_axis[1]],
        [x_axis[2], y_axis[2], z_axis[2]],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::{mat3_determinant, mat3_mul_vec};
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_angle_quarter_turn_x() -> Result<(), Box<dyn std::error::Error>> {
        let rotation = axis_angle_to_rotation_matrix(&[1.0, 0.0, 0.0], std::f64::consts::FRAC_PI_2)?;
        let expected = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rotation[i][j], expected[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_axis_angle_zero_axis() {
        assert_eq!(
            axis_angle_to_rotation_matrix(&[0.0, 0.0, 0.0], 1.0),
            Err(LinalgError::ZeroAxis)
        );
    }

    #[test]
    fn test_look_at_points_minus_z_to_target() -> Result<(), Box<dyn std::error::Error>> {
        let location = [3.0, -4.0, 5.0];
        let direction = [-location[0], -location[1], -location[2]];
        let r = look_at_rotation(&direction)?;

        // local -Z mapped to world must be the normalized direction
        let fwd = mat3_mul_vec(&r, &[0.0, 0.0, -1.0]);
        let n = crate::vec3_norm(&direction);
        for i in 0..3 {
            assert_relative_eq!(fwd[i], direction[i] / n, epsilon = 1e-12);
        }
        assert_relative_eq!(mat3_determinant(&r), 1.0, epsilon = 1e-12);

        // local +Y keeps a positive world z component
        let up = mat3_mul_vec(&r, &[0.0, 1.0, 0.0]);
        assert!(up[2] > 0.0);
        Ok(())
    }

    #[test]
    fn test_look_at_straight_down() -> Result<(), Box<dyn std::error::Error>> {
        let r = look_at_rotation(&[0.0, 0.0, -10.0])?;
        assert_relative_eq!(mat3_determinant(&r), 1.0, epsilon = 1e-12);
        let fwd = mat3_mul_vec(&r, &[0.0, 0.0, -1.0]);
        assert_relative_eq!(fwd[2], -1.0, epsilon = 1e-12);
        Ok(())
    }
}
