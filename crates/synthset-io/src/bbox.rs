use std::{fs, path::Path};

use synthset_camera::BoundingBox;
use synthset_linalg::Mat4;

use crate::{
    error::DatasetIoError,
    matrix::{parse_matrix_rows, read_matrix_json, write_matrix_json},
};

/// Name of the bounding box file in a batch directory.
pub const BOUNDING_BOX_FILE: &str = "bounding_box.txt";

/// Name of the normalization matrix file in a batch directory.
pub const NORMALIZATION_MATRIX_FILE: &str = "normalization_matrix.json";

/// Format the single bounding box line `x_min y_min z_min x_max y_max z_max voxel`.
pub fn format_bounding_box(bbox: &BoundingBox) -> String {
    bbox.to_values()
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write the bounding box line followed by a newline.
pub fn write_bounding_box(
    file_path: impl AsRef<Path>,
    bbox: &BoundingBox,
) -> Result<(), DatasetIoError> {
    fs::write(file_path, format_bounding_box(bbox) + "\n")?;
    Ok(())
}

/// Read a bounding box file.
///
/// # Errors
///
/// Fails if the file is missing, does not hold exactly seven numbers or has `min > max`.
pub fn read_bounding_box(file_path: impl AsRef<Path>) -> Result<BoundingBox, DatasetIoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    let values: Vec<f64> = parse_matrix_rows(&fs::read_to_string(file_path)?)?
        .into_iter()
        .flatten()
        .collect();
    let values: [f64; 7] = values.as_slice().try_into().map_err(|_| {
        DatasetIoError::ParseError(format!(
            "{}: expected 7 bounding box values, got {}",
            file_path.display(),
            values.len()
        ))
    })?;
    Ok(BoundingBox::from_values(&values)?)
}

/// Write the normalization matrix as a JSON array of rows.
pub fn write_normalization_matrix(
    file_path: impl AsRef<Path>,
    m: &Mat4,
) -> Result<(), DatasetIoError> {
    write_matrix_json(file_path, m)
}

/// Read the normalization matrix JSON file.
pub fn read_normalization_matrix(file_path: impl AsRef<Path>) -> Result<Mat4, DatasetIoError> {
    read_matrix_json(file_path)
}
