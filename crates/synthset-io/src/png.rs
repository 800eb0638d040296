use std::{fs, fs::File, io::BufWriter, path::Path};

use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use synthset_camera::ImageSize;

use crate::error::DatasetIoError;

/// An 8-bit RGB image stored row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    /// The image size.
    pub size: ImageSize,
    /// The interleaved pixel data.
    pub data: Vec<u8>,
}

fn check_png_path(file_path: &Path) -> Result<(), DatasetIoError> {
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    Ok(())
}

/// Read the dimensions from the header of a PNG file without decoding the pixels.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
pub fn read_image_size(file_path: impl AsRef<Path>) -> Result<ImageSize, DatasetIoError> {
    let file_path = file_path.as_ref();
    check_png_path(file_path)?;

    let reader = Decoder::new(File::open(file_path)?)
        .read_info()
        .map_err(|e| DatasetIoError::PngDecodeError(e.to_string()))?;
    let info = reader.info();

    Ok(ImageSize {
        width: info.width,
        height: info.height,
    })
}

/// Read a PNG image of any color type as 8-bit RGB.
///
/// Palette and low bit depth images are expanded, 16-bit samples are reduced to
/// 8 bits, gray is replicated to the three channels and alpha is dropped.
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A RGB image with three channels (rgb8).
pub fn read_image_png_rgb8(file_path: impl AsRef<Path>) -> Result<RgbImage, DatasetIoError> {
    let file_path = file_path.as_ref();
    check_png_path(file_path)?;

    let mut decoder = Decoder::new(File::open(file_path)?);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| DatasetIoError::PngDecodeError(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| DatasetIoError::PngDecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let data = match info.color_type {
        ColorType::Rgb => buf,
        ColorType::Rgba => buf
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v]).collect(),
        ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0]])
            .collect(),
        ColorType::Indexed => {
            return Err(DatasetIoError::PngDecodeError(format!(
                "{}: palette was not expanded",
                file_path.display()
            )))
        }
    };

    Ok(RgbImage {
        size: ImageSize {
            width: info.width,
            height: info.height,
        },
        data,
    })
}

/// Write an 8-bit RGB image to a PNG file.
pub fn write_image_png_rgb8(
    file_path: impl AsRef<Path>,
    size: ImageSize,
    data: &[u8],
) -> Result<(), DatasetIoError> {
    write_png_impl(file_path, data, size, BitDepth::Eight, ColorType::Rgb)
}

/// Write an 8-bit RGBA image to a PNG file.
pub fn write_image_png_rgba8(
    file_path: impl AsRef<Path>,
    size: ImageSize,
    data: &[u8],
) -> Result<(), DatasetIoError> {
    write_png_impl(file_path, data, size, BitDepth::Eight, ColorType::Rgba)
}

/// Write an 8-bit single channel image to a PNG file.
pub fn write_image_png_mono8(
    file_path: impl AsRef<Path>,
    size: ImageSize,
    data: &[u8],
) -> Result<(), DatasetIoError> {
    write_png_impl(file_path, data, size, BitDepth::Eight, ColorType::Grayscale)
}

/// Copy an image file, creating the destination directory if needed.
pub fn copy_image(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
) -> Result<(), DatasetIoError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    check_png_path(src)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

fn write_png_impl(
    file_path: impl AsRef<Path>,
    image_data: &[u8],
    image_size: ImageSize,
    depth: BitDepth,
    color_type: ColorType,
) -> Result<(), DatasetIoError> {
    let file = BufWriter::new(File::create(file_path)?);

    let mut encoder = Encoder::new(file, image_size.width, image_size.height);
    encoder.set_color(color_type);
    encoder.set_depth(depth);

    let mut writer = encoder
        .write_header()
        .map_err(|e| DatasetIoError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(image_data)
        .map_err(|e| DatasetIoError::PngEncodingError(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| DatasetIoError::PngEncodingError(e.to_string()))?;
    Ok(())
}
