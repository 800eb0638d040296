use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use synthset_linalg::Mat4;

use crate::error::DatasetIoError;

/// Name of the metadata file in a batch directory.
pub const METADATA_FILE: &str = "metadata.csv";

/// Header line of the metadata file.
pub const METADATA_HEADER: &str =
    "filename,m00,m01,m02,m03,m10,m11,m12,m13,m20,m21,m22,m23,m30,m31,m32,m33,focal";

const METADATA_FIELDS: usize = 18;

/// One rendered image with its camera pose and focal length.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    /// The image file name, relative to the batch directory.
    pub filename: String,
    /// The camera-to-world matrix.
    pub pose: Mat4,
    /// The focal length.
    pub focal: f64,
}

impl MetadataRow {
    /// Format the row as a CSV line without the newline.
    pub fn to_csv_line(&self) -> String {
        let mut fields = vec![self.filename.clone()];
        fields.extend(self.pose.iter().flatten().map(|v| format!("{v:?}")));
        fields.push(format!("{:?}", self.focal));
        fields.join(",")
    }

    /// Parse a CSV line.
    ///
    /// # Errors
    ///
    /// Fails with fewer than 18 fields or when a number does not parse.
    pub fn parse_csv_line(line: &str) -> Result<Self, DatasetIoError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < METADATA_FIELDS {
            return Err(DatasetIoError::ParseError(format!(
                "metadata row with {} fields, expected {METADATA_FIELDS}",
                fields.len()
            )));
        }
        let parse = |v: &str| {
            v.parse::<f64>()
                .map_err(|e| DatasetIoError::ParseError(format!("{v:?} as number: {e}")))
        };

        let mut pose = [[0.0; 4]; 4];
        for (i, value) in fields[1..17].iter().enumerate() {
            pose[i / 4][i % 4] = parse(value)?;
        }

        Ok(Self {
            filename: fields[0].to_string(),
            pose,
            focal: parse(fields[17])?,
        })
    }
}

/// Create the metadata file with only the header line, replacing any previous file.
pub fn create_metadata(file_path: impl AsRef<Path>) -> Result<(), DatasetIoError> {
    fs::write(file_path, format!("{METADATA_HEADER}\n"))?;
    Ok(())
}

/// Append a row to an existing metadata file.
pub fn append_metadata_row(
    file_path: impl AsRef<Path>,
    row: &MetadataRow,
) -> Result<(), DatasetIoError> {
    let mut file = OpenOptions::new().append(true).open(file_path)?;
    writeln!(file, "{}", row.to_csv_line())?;
    Ok(())
}

/// Read the rows of a metadata file.
///
/// The header is skipped. Rows that are short or hold unparsable numbers are
/// skipped with a warning.
pub fn read_metadata(file_path: impl AsRef<Path>) -> Result<Vec<MetadataRow>, DatasetIoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    let text = fs::read_to_string(file_path)?;

    let mut rows = Vec::new();
    for (line_no, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match MetadataRow::parse_csv_line(line) {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!(
                "{}:{}: skipping metadata row. {e}",
                file_path.display(),
                line_no + 1
            ),
        }
    }
    Ok(rows)
}
