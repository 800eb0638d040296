use std::{
    fs,
    path::{Path, PathBuf},
};

use synthset_camera::ImageSize;
use synthset_io::{
    metadata::{read_metadata, METADATA_FILE},
    npz::{NpyArray, NpzWriter},
    png::read_image_png_rgb8,
    DatasetIoError,
};
use synthset_linalg::flatten_rows;

use crate::ExportError;

/// Summary of an aggregate archive.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembleReport {
    /// The batch directories that contributed images, in order.
    pub batches: Vec<PathBuf>,
    /// The number of images in the archive.
    pub num_images: usize,
    /// The shared image size.
    pub image_size: ImageSize,
    /// The focal length stored in the archive.
    pub focal: f64,
}

/// List the batch directories of an input directory.
///
/// Sub-directories whose name starts with `batch`, in any case, sorted by name.
pub fn list_batch_dirs(input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ExportError> {
    let input_dir = input_dir.as_ref();
    if !input_dir.is_dir() {
        return Err(DatasetIoError::DirectoryDoesNotExist(input_dir.to_path_buf()).into());
    }

    let mut dirs = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        let is_batch = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.to_lowercase().starts_with("batch"));
        if is_batch && path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[derive(Default)]
struct Accumulator {
    images: Vec<u8>,
    poses: Vec<f64>,
    count: usize,
    size: Option<ImageSize>,
    focal: Option<f64>,
}

/// Assemble the rendered images of several batches into one `.npz` archive.
///
/// Reads `metadata.csv` of every batch directory and stores `images`
/// `(N, H, W, 3)` as `u8`, `poses` `(N, 4, 4)` and `focal` `(1,)`. Rows whose
/// image is missing or does not decode are skipped. The first focal length wins; later mismatches
/// are reported.
///
/// # Arguments
///
/// * `input_dir` - The directory holding the `batch*` sub-directories.
/// * `output_file` - The archive to write.
///
/// # Errors
///
/// Fails when images differ in size or when no image was found.
pub fn assemble_archive(
    input_dir: impl AsRef<Path>,
    output_file: impl AsRef<Path>,
) -> Result<AssembleReport, ExportError> {
    let input_dir = input_dir.as_ref();
    let output_file = output_file.as_ref();

    let mut acc = Accumulator::default();
    let mut batches = Vec::new();

    for batch_dir in list_batch_dirs(input_dir)? {
        let metadata_path = batch_dir.join(METADATA_FILE);
        if !metadata_path.is_file() {
            log::warn!("{}: no {METADATA_FILE}, skipping", batch_dir.display());
            continue;
        }

        let before = acc.count;
        for row in read_metadata(&metadata_path)? {
            let image_path = batch_dir.join(&row.filename);
            if !image_path.is_file() {
                log::warn!("{}: image not found, skipping", image_path.display());
                continue;
            }

            let image = match read_image_png_rgb8(&image_path) {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("{}: {e}, skipping", image_path.display());
                    continue;
                }
            };
            match acc.size {
                None => acc.size = Some(image.size),
                Some(size) if size != image.size => {
                    return Err(ExportError::InconsistentImageSize {
                        path: image_path,
                        width: size.width,
                        height: size.height,
                        found_width: image.size.width,
                        found_height: image.size.height,
                    })
                }
                Some(_) => {}
            }

            match acc.focal {
                None => acc.focal = Some(row.focal),
                Some(focal) if focal != row.focal => log::warn!(
                    "{}: focal {} differs from {focal}, keeping {focal}",
                    image_path.display(),
                    row.focal
                ),
                Some(_) => {}
            }

            acc.images.extend_from_slice(&image.data);
            acc.poses.extend(flatten_rows(&row.pose));
            acc.count += 1;
        }

        log::debug!("{}: {} images", batch_dir.display(), acc.count - before);
        if acc.count > before {
            batches.push(batch_dir);
        }
    }

    let (Some(size), Some(focal)) = (acc.size, acc.focal) else {
        return Err(ExportError::NoCompleteViews(input_dir.to_path_buf()));
    };

    if let Some(parent) = output_file.parent() {
        fs::create_dir_all(parent)?;
    }

    let n = acc.count;
    let mut npz = NpzWriter::create(output_file)?;
    npz.add_array(
        "images",
        &NpyArray::from_u8(
            &[n, size.height as usize, size.width as usize, 3],
            acc.images,
        )?,
    )?;
    npz.add_array("poses", &NpyArray::from_f64(&[n, 4, 4], acc.poses)?)?;
    npz.add_array("focal", &NpyArray::from_f64(&[1], vec![focal])?)?;
    npz.finish()?;

    log::info!(
        "assembled {n} images of {}x{} from {} batches into {}",
        size.width,
        size.height,
        batches.len(),
        output_file.display()
    );

    Ok(AssembleReport {
        batches,
        num_images: n,
        image_size: size,
        focal,
    })
}
