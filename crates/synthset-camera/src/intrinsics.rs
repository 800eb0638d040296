use serde::{Deserialize, Serialize};
use synthset_linalg::{mat3_to_mat4, Mat3, Mat4};

use crate::CameraError;

/// The projection model of the host camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraProjection {
    /// Pinhole perspective projection.
    #[default]
    Perspective,
    /// Parallel projection, not representable by a pinhole matrix.
    Orthographic,
    /// Equirectangular or fisheye projection, not representable by a pinhole matrix.
    Panoramic,
}

/// Which sensor dimension the focal length is calibrated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorFit {
    /// Pick the axis from the aspect ratio of the output image.
    #[default]
    Auto,
    /// Fit the sensor width to the image width.
    Horizontal,
    /// Fit the sensor height to the image height.
    Vertical,
}

/// Focal length of the lens, either directly in millimeters or as a field of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocalLength {
    /// Focal length in millimeters.
    Millimeters(f64),
    /// Field of view in radians, measured along the sensor fit axis.
    FieldOfView(f64),
}

impl Default for FocalLength {
    fn default() -> Self {
        FocalLength::Millimeters(50.0)
    }
}

/// Lens and sensor state of a host camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraLens {
    /// The projection model.
    pub projection: CameraProjection,
    /// The focal length.
    pub focal: FocalLength,
    /// Sensor width in millimeters.
    pub sensor_width: f64,
    /// Sensor height in millimeters.
    pub sensor_height: f64,
    /// The sensor fit mode.
    pub sensor_fit: SensorFit,
    /// Horizontal principal point shift, in units of the fit dimension.
    pub shift_x: f64,
    /// Vertical principal point shift, in units of the fit dimension.
    pub shift_y: f64,
}

impl Default for CameraLens {
    fn default() -> Self {
        Self {
            projection: CameraProjection::Perspective,
            focal: FocalLength::default(),
            sensor_width: 36.0,
            sensor_height: 24.0,
            sensor_fit: SensorFit::Auto,
            shift_x: 0.0,
            shift_y: 0.0,
        }
    }
}

impl CameraLens {
    /// The sensor size in millimeters used by the fit mode.
    pub fn fit_sensor_size(&self) -> f64 {
        match self.sensor_fit {
            SensorFit::Vertical => self.sensor_height,
            _ => self.sensor_width,
        }
    }

    /// The focal length in millimeters, converting from a field of view when needed.
    pub fn focal_length_mm(&self) -> f64 {
        match self.focal {
            FocalLength::Millimeters(f) => f,
            FocalLength::FieldOfView(fov) => self.fit_sensor_size() / (2.0 * (fov / 2.0).tan()),
        }
    }

    /// Check the lens parameters are physically meaningful.
    pub fn validate(&self) -> Result<(), CameraError> {
        if !(self.sensor_width > 0.0 && self.sensor_height > 0.0) {
            return Err(CameraError::InvalidParameter(format!(
                "sensor size must be positive, got {}x{}",
                self.sensor_width, self.sensor_height
            )));
        }
        match self.focal {
            FocalLength::Millimeters(f) if !(f > 0.0) => Err(CameraError::InvalidParameter(
                format!("focal length must be positive, got {f}"),
            )),
            FocalLength::FieldOfView(fov) if !(fov > 0.0 && fov < std::f64::consts::PI) => {
                Err(CameraError::InvalidParameter(format!(
                    "field of view must be in (0, pi), got {fov}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Output image settings of the host renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Nominal horizontal resolution in pixels.
    pub resolution_x: u32,
    /// Nominal vertical resolution in pixels.
    pub resolution_y: u32,
    /// Percentage applied to the nominal resolution.
    pub resolution_percentage: u32,
    /// Horizontal pixel aspect.
    pub pixel_aspect_x: f64,
    /// Vertical pixel aspect.
    pub pixel_aspect_y: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution_x: 1920,
            resolution_y: 1080,
            resolution_percentage: 100,
            pixel_aspect_x: 1.0,
            pixel_aspect_y: 1.0,
        }
    }
}

impl RenderSettings {
    /// The effective resolution after applying the percentage, as fractional pixels.
    pub fn scaled_resolution(&self) -> (f64, f64) {
        let scale = self.resolution_percentage as f64 / 100.0;
        (
            scale * self.resolution_x as f64,
            scale * self.resolution_y as f64,
        )
    }

    /// The size of the rendered image in whole pixels.
    pub fn output_size(&self) -> ImageSize {
        let (w, h) = self.scaled_resolution();
        ImageSize {
            width: w as u32,
            height: h as u32,
        }
    }

    /// Check the render parameters are usable.
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.resolution_x == 0 || self.resolution_y == 0 || self.resolution_percentage == 0 {
            return Err(CameraError::InvalidParameter(format!(
                "resolution must be positive, got {}x{} at {}%",
                self.resolution_x, self.resolution_y, self.resolution_percentage
            )));
        }
        if !(self.pixel_aspect_x > 0.0 && self.pixel_aspect_y > 0.0) {
            return Err(CameraError::InvalidParameter(format!(
                "pixel aspect must be positive, got {}:{}",
                self.pixel_aspect_x, self.pixel_aspect_y
            )));
        }
        Ok(())
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Represents the intrinsic parameters of a pinhole camera in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl CameraIntrinsic {
    /// The 3x3 camera matrix `K`.
    pub fn matrix3(&self) -> Mat3 {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// The camera matrix embedded in a 4x4 identity.
    pub fn matrix4(&self) -> Mat4 {
        mat3_to_mat4(&self.matrix3())
    }

    /// Build intrinsics from a 3x3 camera matrix, ignoring any skew term.
    ///
    /// # Errors
    ///
    /// Fails if the focal lengths are not positive or the last row is not `[0, 0, 1]`.
    pub fn from_matrix3(k: &Mat3) -> Result<Self, CameraError> {
        if k[2] != [0.0, 0.0, 1.0] {
            return Err(CameraError::InvalidParameter(format!(
                "camera matrix last row must be [0, 0, 1], got {:?}",
                k[2]
            )));
        }
        if !(k[0][0] > 0.0 && k[1][1] > 0.0) {
            return Err(CameraError::InvalidParameter(format!(
                "focal lengths must be positive, got fx={} fy={}",
                k[0][0], k[1][1]
            )));
        }
        Ok(Self {
            fx: k[0][0],
            fy: k[1][1],
            cx: k[0][2],
            cy: k[1][2],
        })
    }

    /// Whether the horizontal and vertical focal lengths agree.
    pub fn has_square_pixels(&self) -> bool {
        (self.fx - self.fy).abs() <= f64::EPSILON * self.fx.abs().max(1.0)
    }
}

/// Derive the pixel-space intrinsics of a host camera.
///
/// The focal length is calibrated against the sensor fit axis. With square pixels
/// `fx == fy`; otherwise `fy` is scaled by the pixel aspect ratio. The principal
/// point defaults to the image center, moved by the lens shift.
///
/// # Errors
///
/// * [`CameraError::UnsupportedCameraModel`] for non-perspective cameras.
/// * [`CameraError::InvalidParameter`] for non-positive sizes or focal lengths.
pub fn derive_intrinsics(
    lens: &CameraLens,
    render: &RenderSettings,
) -> Result<CameraIntrinsic, CameraError> {
    if lens.projection != CameraProjection::Perspective {
        return Err(CameraError::UnsupportedCameraModel(lens.projection));
    }
    lens.validate()?;
    render.validate()?;

    let (res_x, res_y) = render.scaled_resolution();
    let sensor_size = lens.fit_sensor_size();
    let focal_mm = lens.focal_length_mm();

    let sensor_fit = match lens.sensor_fit {
        SensorFit::Auto => {
            if render.pixel_aspect_x * res_x >= render.pixel_aspect_y * res_y {
                SensorFit::Horizontal
            } else {
                SensorFit::Vertical
            }
        }
        fit => fit,
    };

    let pixel_aspect_ratio = render.pixel_aspect_y / render.pixel_aspect_x;
    let view_fac_px = match sensor_fit {
        SensorFit::Horizontal => res_x,
        _ => pixel_aspect_ratio * res_y,
    };

    let pixel_size_mm_per_px = sensor_size / focal_mm / view_fac_px;
    let fx = 1.0 / pixel_size_mm_per_px;
    let fy = fx / pixel_aspect_ratio;

    let cx = res_x / 2.0 - lens.shift_x * view_fac_px;
    let cy = res_y / 2.0 + lens.shift_y * view_fac_px / pixel_aspect_ratio;

    log::debug!("derived intrinsics fx={fx} fy={fy} cx={cx} cy={cy} ({sensor_fit:?} fit)");

    Ok(CameraIntrinsic { fx, fy, cx, cy })
}
