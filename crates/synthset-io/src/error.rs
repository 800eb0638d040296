/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum DatasetIoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Error when the directory does not exist.
    #[error("Directory does not exist: {0}")]
    DirectoryDoesNotExist(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// A matrix does not have the expected number of rows or columns.
    #[error("Invalid matrix shape in {path}: expected {expected}, got {found}")]
    InvalidMatrixShape {
        /// The file holding the matrix.
        path: std::path::PathBuf,
        /// The expected shape.
        expected: String,
        /// The shape found in the file.
        found: String,
    },

    /// A value could not be parsed.
    #[error("Failed to parse {0}")]
    ParseError(String),

    /// Error to read or write JSON.
    #[error("Failed to process JSON. {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error to decode the PNG image.
    #[error("Failed to decode the png image. {0}")]
    PngDecodeError(String),

    /// Error to encode the PNG image.
    #[error("Failed to encode the png image. {0}")]
    PngEncodingError(String),

    /// Error in the zip container of an npz archive.
    #[error("Failed to process the npz archive. {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Error in an npy array header or payload.
    #[error("Invalid npy array {0}")]
    NpyError(String),

    /// Error from a camera parameter check.
    #[error(transparent)]
    Camera(#[from] synthset_camera::CameraError),
}
