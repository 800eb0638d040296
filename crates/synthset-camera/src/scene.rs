use regex::Regex;
use synthset_linalg::{mat4_transform_point, Mat4, Vec3, IDENTITY4};

use crate::CameraError;

/// Default number of voxels along the longest box axis.
pub const DEFAULT_VOXEL_DIVISIONS: f64 = 128.0;

/// A scene object as seen by the summarizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// The object name, matched against the exclusion pattern.
    pub name: String,
    /// The object-to-world transform.
    pub world_matrix: Mat4,
    /// The 8 corners of the object's local bounding volume.
    pub bound_corners: [Vec3; 8],
}

impl SceneObject {
    /// Create an object from the min and max corners of a local axis-aligned box.
    pub fn from_local_aabb(name: impl Into<String>, world_matrix: Mat4, min: Vec3, max: Vec3) -> Self {
        Self {
            name: name.into(),
            world_matrix,
            bound_corners: box_corners(&min, &max),
        }
    }

    /// The corners of the local bounding volume mapped to world space.
    pub fn world_corners(&self) -> [Vec3; 8] {
        self.bound_corners
            .map(|c| mat4_transform_point(&self.world_matrix, &c))
    }
}

fn box_corners(min: &Vec3, max: &Vec3) -> [Vec3; 8] {
    let mut corners = [[0.0; 3]; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        *corner = [
            if i & 1 == 0 { min[0] } else { max[0] },
            if i & 2 == 0 { min[1] } else { max[1] },
            if i & 4 == 0 { min[2] } else { max[2] },
        ];
    }
    corners
}

/// Predicate selecting the objects left out of the bounding box.
///
/// An empty pattern matches nothing.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter(Option<Regex>);

impl ExclusionFilter {
    /// A filter that keeps every object.
    pub fn none() -> Self {
        Self(None)
    }

    /// Build a filter from a regular expression searched in object names.
    pub fn new(pattern: &str) -> Result<Self, CameraError> {
        if pattern.is_empty() {
            return Ok(Self(None));
        }
        Ok(Self(Some(Regex::new(pattern)?)))
    }

    /// Whether the object name is excluded.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.0.as_ref().is_some_and(|re| re.is_match(name))
    }
}

/// Axis-aligned scene bounds with a suggested voxel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
    /// Suggested voxel size.
    pub voxel_size: f64,
}

impl BoundingBox {
    /// Create a box from its corners with the default voxel size.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        let mut bbox = Self {
            min,
            max,
            voxel_size: 0.0,
        };
        bbox.voxel_size = bbox.max_extent() / DEFAULT_VOXEL_DIVISIONS;
        bbox
    }

    /// Build a box from the seven values `x_min y_min z_min x_max y_max z_max voxel`.
    ///
    /// # Errors
    ///
    /// Fails if `min > max` on any axis or a value is not finite.
    pub fn from_values(values: &[f64; 7]) -> Result<Self, CameraError> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CameraError::InvalidParameter(format!(
                "bounding box values must be finite, got {values:?}"
            )));
        }
        let min = [values[0], values[1], values[2]];
        let max = [values[3], values[4], values[5]];
        if (0..3).any(|i| min[i] > max[i]) {
            return Err(CameraError::InvalidParameter(format!(
                "bounding box min {min:?} exceeds max {max:?}"
            )));
        }
        Ok(Self {
            min,
            max,
            voxel_size: values[6],
        })
    }

    /// The seven values `x_min y_min z_min x_max y_max z_max voxel`.
    pub fn to_values(&self) -> [f64; 7] {
        [
            self.min[0],
            self.min[1],
            self.min[2],
            self.max[0],
            self.max[1],
            self.max[2],
            self.voxel_size,
        ]
    }

    /// Extent along each axis.
    pub fn extent(&self) -> Vec3 {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// The longest extent.
    pub fn max_extent(&self) -> f64 {
        self.extent().into_iter().fold(0.0, f64::max)
    }

    /// The box center.
    pub fn center(&self) -> Vec3 {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }

    /// Half the length of the box diagonal.
    pub fn half_diagonal(&self) -> f64 {
        0.5 * synthset_linalg::vec3_norm(&self.extent())
    }

    /// The 8 corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        box_corners(&self.min, &self.max)
    }
}

/// Compute the world-space bounding box of every object not matched by `filter`.
///
/// # Arguments
///
/// * `objects` - The scene objects.
/// * `filter` - Objects whose name matches are skipped.
/// * `voxel_size` - Overrides the default `max_extent / 128` voxel size when positive.
///
/// # Returns
///
/// `None` when no object passes the filter.
pub fn compute_bounding_box(
    objects: &[SceneObject],
    filter: &ExclusionFilter,
    voxel_size: Option<f64>,
) -> Option<BoundingBox> {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    let mut included = 0usize;

    for object in objects {
        if filter.is_excluded(&object.name) {
            log::debug!("excluding {} from the bounding box", object.name);
            continue;
        }
        included += 1;
        for corner in object.world_corners() {
            for i in 0..3 {
                min[i] = min[i].min(corner[i]);
                max[i] = max[i].max(corner[i]);
            }
        }
    }

    if included == 0 {
        log::warn!("no scene object passed the exclusion filter, bounding box is undefined");
        return None;
    }

    let mut bbox = BoundingBox::new(min, max);
    if let Some(voxel_size) = voxel_size.filter(|v| *v > 0.0) {
        bbox.voxel_size = voxel_size;
    }
    Some(bbox)
}

/// Compute the matrix scaling the bounding box into the unit sphere.
///
/// The scale is `1 / R` with `R` the half-diagonal, or `1` for a degenerate box.
/// With `center` the box center is also moved to the origin; without it the
/// matrix is the plain `diag(s, s, s, 1)`.
pub fn normalization_matrix(bbox: &BoundingBox, center: bool) -> Mat4 {
    let radius = bbox.half_diagonal();
    let radius = if radius > 0.0 { radius } else { 1.0 };
    let s = 1.0 / radius;

    let mut m = IDENTITY4;
    for (i, c) in bbox.center().into_iter().enumerate() {
        m[i][i] = s;
        if center {
            m[i][3] = -s * c;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use synthset_linalg::vec3_norm;

    fn unit_cube(name: &str, world_matrix: Mat4) -> SceneObject {
        SceneObject::from_local_aabb(name, world_matrix, [-1.0; 3], [1.0; 3])
    }

    fn translated(t: Vec3) -> Mat4 {
        let mut m = IDENTITY4;
        for i in 0..3 {
            m[i][3] = t[i];
        }
        m
    }

    #[test]
    fn test_symmetric_box_scale() {
        let bbox = BoundingBox::new([-1.0; 3], [1.0; 3]);
        let m = normalization_matrix(&bbox, true);
        assert_relative_eq!(m[0][0], 1.0 / 3f64.sqrt(), epsilon = 1e-12);
        assert_eq!(m[0][3], 0.0);

        let p = mat4_transform_point(&m, &[1.0, 1.0, 1.0]);
        assert_relative_eq!(vec3_norm(&p), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_only_matrix() {
        let bbox = BoundingBox::new([0.0; 3], [2.0, 4.0, 4.0]);
        let m = normalization_matrix(&bbox, false);
        assert_relative_eq!(m[1][1], 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!([m[0][3], m[1][3], m[2][3]], [0.0; 3]);
    }

    #[test]
    fn test_centered_matrix_translation() {
        let bbox = BoundingBox::new([0.0; 3], [2.0, 4.0, 4.0]);
        let m = normalization_matrix(&bbox, true);
        assert_relative_eq!(m[0][3], -1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m[1][3], -2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m[2][3], -2.0 / 3.0, epsilon = 1e-12);

        let p = mat4_transform_point(&m, &bbox.center());
        assert_relative_eq!(vec3_norm(&p), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_corners_inside_unit_sphere() {
        let boxes = [
            BoundingBox::new([-1.0; 3], [1.0; 3]),
            BoundingBox::new([2.0, 3.0, -7.0], [5.0, 3.5, 1.0]),
            BoundingBox::new([10.0, 10.0, 10.0], [10.0, 20.0, 10.0]),
            BoundingBox::new([-0.01, -100.0, 4.0], [0.02, 50.0, 4.5]),
        ];
        for bbox in boxes.iter() {
            let m = normalization_matrix(bbox, true);
            for corner in bbox.corners() {
                let p = mat4_transform_point(&m, &corner);
                assert!(vec3_norm(&p) <= 1.0 + 1e-9, "{bbox:?} -> {p:?}");
            }
        }
    }

    #[test]
    fn test_degenerate_box_keeps_unit_scale() {
        let bbox = BoundingBox::new([3.0; 3], [3.0; 3]);
        let m = normalization_matrix(&bbox, false);
        assert_eq!(m, IDENTITY4);
        assert_eq!(bbox.voxel_size, 0.0);
    }

    #[test]
    fn test_bounding_box_of_translated_objects() {
        let objects = vec![
            unit_cube("Cube", translated([2.0, 0.0, 0.0])),
            unit_cube("Cube.001", translated([0.0, -3.0, 1.0])),
        ];
        let bbox = compute_bounding_box(&objects, &ExclusionFilter::none(), None);
        let bbox = bbox.expect("objects are included");
        assert_eq!(bbox.min, [-1.0, -4.0, -1.0]);
        assert_eq!(bbox.max, [3.0, 1.0, 2.0]);
        assert_relative_eq!(bbox.voxel_size, 5.0 / 128.0);
    }

    #[test]
    fn test_exclusion_filter() -> Result<(), CameraError> {
        let objects = vec![
            unit_cube("Ground", translated([0.0, 0.0, -50.0])),
            unit_cube("Statue", IDENTITY4),
        ];
        let filter = ExclusionFilter::new("^Ground")?;
        let bbox = compute_bounding_box(&objects, &filter, Some(0.5));
        assert_eq!(
            bbox.map(|b| b.to_values()),
            Some([-1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 0.5])
        );
        Ok(())
    }

    #[test]
    fn test_everything_excluded() -> Result<(), CameraError> {
        let objects = vec![unit_cube("Cube", IDENTITY4)];
        let filter = ExclusionFilter::new(".*")?;
        assert!(compute_bounding_box(&objects, &filter, None).is_none());
        assert!(compute_bounding_box(&[], &ExclusionFilter::none(), None).is_none());
        Ok(())
    }

    #[test]
    fn test_empty_pattern_matches_nothing() -> Result<(), CameraError> {
        let filter = ExclusionFilter::new("")?;
        assert!(!filter.is_excluded("anything"));
        assert!(ExclusionFilter::new("(").is_err());
        Ok(())
    }

    #[test]
    fn test_values_roundtrip_and_validation() -> Result<(), CameraError> {
        let values = [-1.0, -2.0, -3.0, 1.0, 2.0, 3.0, 0.1];
        assert_eq!(BoundingBox::from_values(&values)?.to_values(), values);
        assert!(BoundingBox::from_values(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1]).is_err());
        Ok(())
    }
}
