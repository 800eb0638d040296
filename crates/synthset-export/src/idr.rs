use std::{fs, path::Path};

use synthset_io::{
    npz::{NpyArray, NpzWriter},
    png::copy_image,
    record::{BatchItem, Dataset},
    DatasetIoError,
};
use synthset_linalg::{flatten_rows, mat34_to_mat4, IDENTITY4};

use crate::ExportError;

/// Name of the camera archive.
pub const CAMERAS_NPZ: &str = "cameras.npz";

/// Summary of an IDR export.
#[derive(Debug, Clone, PartialEq)]
pub struct IdrReport {
    /// Indices of the written views.
    pub written: Vec<u32>,
    /// Indices of the skipped views.
    pub skipped: Vec<u32>,
    /// Whether the batch normalization was used for `scale_mat_*`.
    pub normalized: bool,
}

/// Export a batch in the IDR layout.
///
/// For every view with a render, a mask and a projection, copies
/// `image/<idx:03>.png` and `mask/<idx:03>.png` and stores `world_mat_<idx>`
/// (the lifted projection) and `scale_mat_<idx>` in `cameras.npz`.
/// `scale_mat_*` is the batch normalization matrix, or the identity when the
/// batch has none.
///
/// # Errors
///
/// Fails when the normalization file exists but is malformed, or when no view is
/// complete.
pub fn export_idr(dataset: &Dataset, out_dir: impl AsRef<Path>) -> Result<IdrReport, ExportError> {
    let out_dir = out_dir.as_ref();

    let (scale_mat, normalized) = match &dataset.normalization {
        BatchItem::Loaded(m) => (*m, true),
        BatchItem::Missing(path) => {
            log::info!("{} not found, using identity scale matrices", path.display());
            (IDENTITY4, false)
        }
        BatchItem::Malformed(path, msg) => {
            return Err(DatasetIoError::ParseError(format!("{}: {msg}", path.display())).into())
        }
    };

    let mut complete = Vec::new();
    let mut skipped = Vec::new();
    for record in &dataset.records {
        match (&record.render, &record.mask, &record.projection) {
            (Some(render), Some(mask), Some(projection)) => {
                complete.push((record, render, mask, projection))
            }
            _ => {
                log::warn!("view {}: needs render, mask and projection, skipping", record.tag());
                skipped.push(record.index);
            }
        }
    }
    if complete.is_empty() {
        return Err(ExportError::NoCompleteViews(dataset.root.clone()));
    }

    fs::create_dir_all(out_dir)?;
    let mut npz = NpzWriter::create(out_dir.join(CAMERAS_NPZ))?;
    let scale = NpyArray::from_f64(&[4, 4], flatten_rows(&scale_mat))?;

    let mut written = Vec::with_capacity(complete.len());
    for (record, render, mask, projection) in complete {
        let tag = record.tag();
        copy_image(render, out_dir.join("image").join(format!("{tag}.png")))?;
        copy_image(mask, out_dir.join("mask").join(format!("{tag}.png")))?;

        let world_mat = NpyArray::from_f64(&[4, 4], flatten_rows(&mat34_to_mat4(projection)))?;
        npz.add_array(&format!("world_mat_{}", record.index), &world_mat)?;
        npz.add_array(&format!("scale_mat_{}", record.index), &scale)?;
        written.push(record.index);
    }
    npz.finish()?;

    log::info!(
        "exported {} views to {} ({} skipped)",
        written.len(),
        out_dir.display(),
        skipped.len()
    );

    Ok(IdrReport {
        written,
        skipped,
        normalized,
    })
}
