use std::{fs, path::Path};

use crate::error::DatasetIoError;

/// Number of decimals used for matrix text files.
pub const MATRIX_TEXT_PRECISION: usize = 10;

/// Format a matrix as text, one row per line, values space-separated with 10 decimals.
///
/// There is no trailing newline.
///
/// Example:
///
/// ```
/// use synthset_io::matrix::format_matrix;
///
/// let text = format_matrix(&[[1.0, 0.0], [0.5, -2.0]]);
/// assert_eq!(text, "1.0000000000 0.0000000000\n0.5000000000 -2.0000000000");
/// ```
pub fn format_matrix<const R: usize, const C: usize>(m: &[[f64; C]; R]) -> String {
    m.iter()
        .map(|row| {
            row.iter()
                .map(|v| format!("{:.*}", MATRIX_TEXT_PRECISION, v))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write a matrix as text.
///
/// # Arguments
///
/// * `file_path` - The destination file.
/// * `m` - The matrix to write.
pub fn write_matrix_txt<const R: usize, const C: usize>(
    file_path: impl AsRef<Path>,
    m: &[[f64; C]; R],
) -> Result<(), DatasetIoError> {
    fs::write(file_path, format_matrix(m))?;
    Ok(())
}

/// Parse whitespace-separated rows of numbers, ignoring blank lines.
pub fn parse_matrix_rows(text: &str) -> Result<Vec<Vec<f64>>, DatasetIoError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|v| {
                    v.parse::<f64>()
                        .map_err(|e| DatasetIoError::ParseError(format!("{v:?} as number: {e}")))
                })
                .collect()
        })
        .collect()
}

/// Convert parsed rows into a fixed-size matrix, checking the shape.
pub fn rows_to_matrix<const R: usize, const C: usize>(
    rows: &[Vec<f64>],
    file_path: &Path,
) -> Result<[[f64; C]; R], DatasetIoError> {
    let shape_error = || DatasetIoError::InvalidMatrixShape {
        path: file_path.to_path_buf(),
        expected: format!("{R}x{C}"),
        found: format!(
            "{} rows with {:?} columns",
            rows.len(),
            rows.iter().map(Vec::len).collect::<Vec<_>>()
        ),
    };

    if rows.len() != R {
        return Err(shape_error());
    }
    let mut m = [[0.0; C]; R];
    for (dst, src) in m.iter_mut().zip(rows.iter()) {
        if src.len() != C {
            return Err(shape_error());
        }
        dst.copy_from_slice(src);
    }
    Ok(m)
}

/// Read a fixed-size matrix from a text file.
///
/// # Errors
///
/// Fails if the file is missing, a value is not a number or the shape is not `R x C`.
pub fn read_matrix_txt<const R: usize, const C: usize>(
    file_path: impl AsRef<Path>,
) -> Result<[[f64; C]; R], DatasetIoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    let rows = parse_matrix_rows(&fs::read_to_string(file_path)?)?;
    rows_to_matrix(&rows, file_path)
}

/// Write a matrix as a JSON array of rows.
pub fn write_matrix_json<const R: usize, const C: usize>(
    file_path: impl AsRef<Path>,
    m: &[[f64; C]; R],
) -> Result<(), DatasetIoError> {
    let rows: Vec<Vec<f64>> = m.iter().map(|row| row.to_vec()).collect();
    fs::write(file_path, serde_json::to_string(&rows)?)?;
    Ok(())
}

/// Read a fixed-size matrix from a JSON array of rows.
pub fn read_matrix_json<const R: usize, const C: usize>(
    file_path: impl AsRef<Path>,
) -> Result<[[f64; C]; R], DatasetIoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    let rows: Vec<Vec<f64>> = serde_json::from_str(&fs::read_to_string(file_path)?)?;
    rows_to_matrix(&rows, file_path)
}

/// Read a matrix from a `.json` or text file, choosing the codec by extension.
pub fn read_matrix<const R: usize, const C: usize>(
    file_path: impl AsRef<Path>,
) -> Result<[[f64; C]; R], DatasetIoError> {
    let file_path = file_path.as_ref();
    match file_path.extension().and_then(|e| e.to_str()) {
        Some("json") => read_matrix_json(file_path),
        _ => read_matrix_txt(file_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_roundtrip() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("000_camera_extrinsics.txt");

        let m = [
            [1.0, 0.0, 0.0, 0.25],
            [0.0, -1.0, 0.0, 1.5],
            [0.0, 0.0, -1.0, 10.0],
        ];
        write_matrix_txt(&path, &m)?;

        let text = fs::read_to_string(&path)?;
        assert_eq!(text.lines().count(), 3);
        assert!(!text.ends_with('\n'));
        assert_eq!(
            text.lines().next(),
            Some("1.0000000000 0.0000000000 0.0000000000 0.2500000000")
        );

        assert_eq!(read_matrix_txt::<3, 4>(&path)?, m);
        Ok(())
    }

    #[test]
    fn test_txt_wrong_shape() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("m.txt");
        fs::write(&path, "1 2 3\n4 5 6\n7 8 9\n")?;

        let res = read_matrix_txt::<3, 4>(&path);
        assert!(matches!(res, Err(DatasetIoError::InvalidMatrixShape { .. })));
        assert_eq!(read_matrix_txt::<3, 3>(&path)?[2], [7.0, 8.0, 9.0]);
        Ok(())
    }

    #[test]
    fn test_txt_bad_number() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("m.txt");
        fs::write(&path, "1 2\nx 4")?;
        assert!(matches!(
            read_matrix_txt::<2, 2>(&path),
            Err(DatasetIoError::ParseError(_))
        ));
        assert!(matches!(
            read_matrix_txt::<2, 2>(tmp_dir.path().join("missing.txt")),
            Err(DatasetIoError::FileDoesNotExist(_))
        ));
        Ok(())
    }

    #[test]
    fn test_json_roundtrip() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("normalization_matrix.json");
        let m = [
            [0.5, 0.0, 0.0, 0.0],
            [0.0, 0.5, 0.0, 0.0],
            [0.0, 0.0, 0.5, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        write_matrix_json(&path, &m)?;
        assert_eq!(read_matrix::<4, 4>(&path)?, m);
        assert!(read_matrix_json::<3, 4>(&path).is_err());
        Ok(())
    }
}
