use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use super::{CameraModelId, ColmapCamera, ColmapImage, ColmapPoint3d};

/// Error types for the COLMAP module.
#[derive(Debug, thiserror::Error)]
pub enum ColmapError {
    /// Error reading or writing file
    #[error("error reading or writing file")]
    IoError(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error {0}")]
    ParseError(String),

    /// The image registry rejected a row.
    #[error("Image registry error {0}")]
    RegistryError(String),
}

const CAMERAS_HEADER: &str = "# CAMERA_ID, MODEL, WIDTH, HEIGHT, FX, FY, CX, CY, K1, K2, P1, P2";
const IMAGES_HEADER: &str = "# IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME";

// zero parameters are written as integers, everything else with the shortest exact repr
fn format_param(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v:?}")
    }
}

fn data_lines(path: impl AsRef<Path>) -> Result<Vec<String>, ColmapError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    Ok(reader
        .lines()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|line| !line.starts_with('#'))
        .collect())
}

/// Write the cameras.txt file.
///
/// # Arguments
///
/// * `path` - The path to the cameras.txt file.
/// * `cameras` - The cameras to write, one line each.
pub fn write_cameras_txt(
    path: impl AsRef<Path>,
    cameras: &[ColmapCamera],
) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{CAMERAS_HEADER}")?;
    for camera in cameras {
        let params = camera
            .params
            .iter()
            .map(|v| format_param(*v))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            writer,
            "{} {} {} {} {}",
            camera.camera_id,
            camera.model_id.as_str(),
            camera.width,
            camera.height,
            params
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Format the first line of an image block.
pub fn format_image_line(image: &ColmapImage) -> String {
    let [qw, qx, qy, qz] = image.rotation;
    let [tx, ty, tz] = image.translation;
    format!(
        "{} {qw:?} {qx:?} {qy:?} {qz:?} {tx:?} {ty:?} {tz:?} {} {}",
        image.image_id, image.camera_id, image.name
    )
}

/// Write the images.txt file.
///
/// Every image block is followed by its POINTS2D line, empty for images without
/// observations.
pub fn write_images_txt(path: impl AsRef<Path>, images: &[ColmapImage]) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{IMAGES_HEADER}")?;
    for image in images {
        let points = image
            .points2d
            .iter()
            .map(|(x, y, id)| format!("{x:?} {y:?} {id}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(writer, "{}\n{}\n", format_image_line(image), points)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the points3D.txt file. No points leaves the file empty.
pub fn write_points3d_txt(
    path: impl AsRef<Path>,
    points: &[ColmapPoint3d],
) -> Result<(), ColmapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for p in points {
        let track = p
            .track
            .iter()
            .map(|(image_id, point2d_idx)| format!("{image_id} {point2d_idx}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            writer,
            "{} {:?} {:?} {:?} {} {} {} {:?} {}",
            p.point3d_id, p.xyz[0], p.xyz[1], p.xyz[2], p.rgb[0], p.rgb[1], p.rgb[2], p.error, track
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the cameras.txt file and return a vector of ColmapCamera structs.
///
/// # Arguments
///
/// * `path` - The path to the cameras.txt file.
///
/// # Returns
///
/// A vector of ColmapCamera structs.
pub fn read_cameras_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapCamera>, ColmapError> {
    data_lines(path)?
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_camera_line(line))
        .collect()
}

/// Read the points3D.txt file and return a vector of ColmapPoint3d structs.
///
/// # Arguments
///
/// * `path` - The path to the points3D.txt file.
///
/// # Returns
///
/// A vector of ColmapPoint3d structs.
pub fn read_points3d_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapPoint3d>, ColmapError> {
    data_lines(path)?
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_point3d_line(line))
        .collect()
}

/// Read the images.txt file and return a vector of ColmapImage structs.
///
/// # Arguments
///
/// * `path` - The path to the images.txt file.
///
/// # Returns
///
/// A vector of ColmapImage structs.
pub fn read_images_txt(path: impl AsRef<Path>) -> Result<Vec<ColmapImage>, ColmapError> {
    let mut lines = data_lines(path)?;
    // a final block may omit its empty POINTS2D line
    if lines.len() % 2 == 1 {
        lines.push(String::new());
    }

    lines
        .chunks(2)
        .map(|chunk| match chunk {
            [line1, line2] => parse_image_line(line1, line2),
            _ => Err(ColmapError::ParseError(
                "Invalid number of lines".to_string(),
            )),
        })
        .collect()
}

/// Whether a file exists and holds no data lines.
pub fn is_empty_model_file(path: impl AsRef<Path>) -> Result<bool, ColmapError> {
    Ok(fs::read_to_string(path)?
        .lines()
        .all(|line| line.trim().is_empty() || line.starts_with('#')))
}

/// Utility functions for parsing COLMAP text files
fn parse_part<T: std::str::FromStr>(s: &str) -> Result<T, ColmapError>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| ColmapError::ParseError(format!("{}: {}", s, e)))
}

fn parse_array<T: std::str::FromStr + Copy + Default, const N: usize>(
    parts: &[&str],
    what: &str,
) -> Result<[T; N], ColmapError>
where
    T::Err: std::fmt::Display,
{
    if parts.len() != N {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of {what} coordinates"
        )));
    }
    let mut out = [T::default(); N];
    for (dst, src) in out.iter_mut().zip(parts) {
        *dst = parse_part(src)?;
    }
    Ok(out)
}

/// Parse a camera line and return a ColmapCamera struct.
/// NOTE: The number of parameters depends on the camera model.
///       CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[0], PARAMS[1], ...
fn parse_camera_line(line: &str) -> Result<ColmapCamera, ColmapError> {
    // split the line into parts by whitespace
    let parts = line.split_whitespace().collect::<Vec<_>>();

    if parts.len() < 5 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }

    Ok(ColmapCamera {
        camera_id: parse_part(parts[0])?,
        model_id: CameraModelId::from_name(parts[1]).ok_or_else(|| {
            ColmapError::ParseError(format!("Invalid camera model id: {}", parts[1]))
        })?,
        width: parse_part(parts[2])?,
        height: parse_part(parts[3])?,
        params: parts[4..]
            .iter()
            .map(|s| parse_part(s))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// Parse a point3d line and return a ColmapPoint3d struct.
///       POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[0], TRACK[1], ...
fn parse_point3d_line(line: &str) -> Result<ColmapPoint3d, ColmapError> {
    // split the line into parts by whitespace
    let parts = line.split_whitespace().collect::<Vec<_>>();

    // check if the number of parts is correct
    if parts.len() < 8 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }

    Ok(ColmapPoint3d {
        point3d_id: parse_part(parts[0])?,
        xyz: parse_array(&parts[1..4], "xyz")?,
        rgb: parse_array(&parts[4..7], "rgb")?,
        error: parse_part(parts[7])?,
        track: parts[8..]
            .chunks_exact(2)
            .map(|chunk| -> Result<(u32, u32), ColmapError> {
                Ok((parse_part(chunk[0])?, parse_part(chunk[1])?))
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// Parse an image line and return a ColmapImage struct.
/// #   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME
/// #   POINTS2D[] as (X, Y, POINT3D_ID)
fn parse_image_line(line1: &str, line2: &str) -> Result<ColmapImage, ColmapError> {
    // split the line into parts by whitespace
    let parts1 = line1.split_whitespace().collect::<Vec<_>>();
    let parts2 = line2.split_whitespace().collect::<Vec<_>>();

    if parts1.len() < 10 {
        return Err(ColmapError::ParseError(format!(
            "Invalid number of parts: {}",
            parts1.len()
        )));
    }

    Ok(ColmapImage {
        image_id: parse_part(parts1[0])?,
        rotation: parse_array(&parts1[1..5], "rotation")?,
        translation: parse_array(&parts1[5..8], "translation")?,
        camera_id: parse_part(parts1[8])?,
        name: parts1[9..].join(" "),
        points2d: parts2
            .chunks_exact(3)
            .map(|chunk| -> Result<(f64, f64, i64), ColmapError> {
                Ok((
                    parse_part(chunk[0])?,
                    parse_part(chunk[1])?,
                    parse_part(chunk[2])?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}
