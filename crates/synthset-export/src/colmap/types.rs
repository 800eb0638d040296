/// Represents a Colmap camera model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraModelId {
    /// Simple pinhole camera model
    CameraModelSimplePinhole = 0,
    /// Pinhole camera model
    CameraModelPinhole = 1,
    /// Simplified radial camera model
    CameraModelSimplifiedRadial = 2,
    /// Radial camera model
    CameraModelRadial = 3,
    /// OpenCV camera model
    CameraModelOpenCV = 4,
    /// OpenCV fisheye camera model
    CameraModelOpenCVFisheye = 5,
    /// Full OpenCV camera model
    CameraModelFullOpenCV = 6,
}

impl CameraModelId {
    /// The model name used in `cameras.txt`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraModelId::CameraModelSimplePinhole => "SIMPLE_PINHOLE",
            CameraModelId::CameraModelPinhole => "PINHOLE",
            CameraModelId::CameraModelSimplifiedRadial => "SIMPLE_RADIAL",
            CameraModelId::CameraModelRadial => "RADIAL",
            CameraModelId::CameraModelOpenCV => "OPENCV",
            CameraModelId::CameraModelOpenCVFisheye => "OPENCV_FISHEYE",
            CameraModelId::CameraModelFullOpenCV => "FULL_OPENCV",
        }
    }

    /// Parse a model name from `cameras.txt`.
    pub fn from_name(name: &str) -> Option<Self> {
        [
            CameraModelId::CameraModelSimplePinhole,
            CameraModelId::CameraModelPinhole,
            CameraModelId::CameraModelSimplifiedRadial,
            CameraModelId::CameraModelRadial,
            CameraModelId::CameraModelOpenCV,
            CameraModelId::CameraModelOpenCVFisheye,
            CameraModelId::CameraModelFullOpenCV,
        ]
        .into_iter()
        .find(|m| m.as_str() == name)
    }
}

/// Represents a camera in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapCamera {
    /// Camera id
    pub camera_id: u32,
    /// Camera model id
    pub model_id: CameraModelId,
    /// Image width
    pub width: usize,
    /// Image height
    pub height: usize,
    /// Camera parameters
    pub params: Vec<f64>,
}

/// Represents an image in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapImage {
    /// Image name
    pub name: String,
    /// Image id
    pub image_id: u32,
    /// Camera id
    pub camera_id: u32,
    /// Rotation
    pub rotation: [f64; 4], // qw, qx, qy, qz
    /// Translation
    pub translation: [f64; 3], // x, y, z
    /// Points2d
    pub points2d: Vec<(f64, f64, i64)>,
}

/// Represents a 3D point in the Colmap system.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapPoint3d {
    /// Point3d id
    pub point3d_id: u64,
    /// x, y, z coordinates
    pub xyz: [f64; 3],
    /// rgb color
    pub rgb: [u8; 3],
    /// Error
    pub error: f64,
    /// Track
    pub track: Vec<(u32, u32)>,
}
