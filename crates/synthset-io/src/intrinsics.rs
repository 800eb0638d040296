use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use synthset_camera::{CameraIntrinsic, ImageSize};

use crate::{
    error::DatasetIoError,
    matrix::{format_matrix, parse_matrix_rows, MATRIX_TEXT_PRECISION},
};

/// Layout of an intrinsics file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrinsicsSchema {
    /// `K` embedded in a 4x4 identity, 16 values.
    #[default]
    Full4x4,
    /// The 3x3 `K`, 9 values.
    Matrix3x3,
    /// The legacy compact layout `f cx cy 0 / 0 0 0 / 0 / 1 / H W`, 11 values.
    Compact,
}

impl IntrinsicsSchema {
    /// Detect the schema from the number of values in a file.
    pub fn from_value_count(count: usize) -> Option<Self> {
        match count {
            16 => Some(Self::Full4x4),
            9 => Some(Self::Matrix3x3),
            11 => Some(Self::Compact),
            _ => None,
        }
    }
}

/// The content of an intrinsics file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntrinsicsFile {
    /// The pinhole intrinsics.
    pub intrinsic: CameraIntrinsic,
    /// The image size, only stored by the compact schema.
    pub image_size: Option<ImageSize>,
    /// The schema the file was written with.
    pub schema: IntrinsicsSchema,
}

/// Format intrinsics in the requested schema.
///
/// # Errors
///
/// The compact schema needs the image size.
pub fn format_intrinsics(
    intrinsic: &CameraIntrinsic,
    schema: IntrinsicsSchema,
    image_size: Option<ImageSize>,
) -> Result<String, DatasetIoError> {
    match schema {
        IntrinsicsSchema::Full4x4 => Ok(format_matrix(&intrinsic.matrix4())),
        IntrinsicsSchema::Matrix3x3 => Ok(format_matrix(&intrinsic.matrix3())),
        IntrinsicsSchema::Compact => {
            let size = image_size.ok_or_else(|| {
                DatasetIoError::ParseError(
                    "compact intrinsics without an image size".to_string(),
                )
            })?;
            if !intrinsic.has_square_pixels() {
                log::warn!(
                    "compact intrinsics store a single focal length, dropping fy={}",
                    intrinsic.fy
                );
            }
            let p = MATRIX_TEXT_PRECISION;
            Ok(format!(
                "{:.p$} {:.p$} {:.p$} 0\n0 0 0\n0\n1\n{} {}\n",
                intrinsic.fx, intrinsic.cx, intrinsic.cy, size.height, size.width
            ))
        }
    }
}

/// Write intrinsics in the requested schema.
///
/// # Arguments
///
/// * `file_path` - The destination file.
/// * `intrinsic` - The intrinsics to write.
/// * `schema` - The file layout.
/// * `image_size` - The image size, required by [`IntrinsicsSchema::Compact`].
pub fn write_intrinsics(
    file_path: impl AsRef<Path>,
    intrinsic: &CameraIntrinsic,
    schema: IntrinsicsSchema,
    image_size: Option<ImageSize>,
) -> Result<(), DatasetIoError> {
    fs::write(file_path, format_intrinsics(intrinsic, schema, image_size)?)?;
    Ok(())
}

/// Parse intrinsics text, detecting the schema from the value count.
pub fn parse_intrinsics(text: &str) -> Result<IntrinsicsFile, DatasetIoError> {
    let values: Vec<f64> = parse_matrix_rows(text)?.into_iter().flatten().collect();
    let schema = IntrinsicsSchema::from_value_count(values.len()).ok_or_else(|| {
        DatasetIoError::ParseError(format!(
            "intrinsics with {} values, expected 16, 9 or 11",
            values.len()
        ))
    })?;

    let (k, image_size) = match schema {
        IntrinsicsSchema::Full4x4 => (
            [
                [values[0], values[1], values[2]],
                [values[4], values[5], values[6]],
                [values[8], values[9], values[10]],
            ],
            None,
        ),
        IntrinsicsSchema::Matrix3x3 => (
            [
                [values[0], values[1], values[2]],
                [values[3], values[4], values[5]],
                [values[6], values[7], values[8]],
            ],
            None,
        ),
        IntrinsicsSchema::Compact => {
            let (f, cx, cy) = (values[0], values[1], values[2]);
            let size = ImageSize {
                width: values[10] as u32,
                height: values[9] as u32,
            };
            ([[f, 0.0, cx], [0.0, f, cy], [0.0, 0.0, 1.0]], Some(size))
        }
    };

    Ok(IntrinsicsFile {
        intrinsic: CameraIntrinsic::from_matrix3(&k)?,
        image_size,
        schema,
    })
}

/// Read an intrinsics file in any of the supported schemas.
pub fn read_intrinsics(file_path: impl AsRef<Path>) -> Result<IntrinsicsFile, DatasetIoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    parse_intrinsics(&fs::read_to_string(file_path)?)
}
