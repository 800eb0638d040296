mod registry;
mod text;
mod types;

pub use registry::*;
pub use text::*;
pub use types::*;

use std::{
    fs,
    path::{Path, PathBuf},
};

use synthset_camera::{projection::extrinsics_from_projection, Extrinsics, ImageSize};
use synthset_io::{
    png::{copy_image, read_image_size},
    record::{Dataset, DatasetRecord},
};
use synthset_linalg::quat::{rotation_matrix_to_quaternion, QuaternionFormula};

use crate::ExportError;

/// Where the pose of each view is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoseSource {
    /// The `<idx>_camera_extrinsics.txt` files.
    #[default]
    Extrinsics,
    /// The projection files, as `K⁻¹·P` with the batch intrinsics.
    Projection,
}

/// The directory under `sparse/` holding the text model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SparseLayout {
    /// `sparse/0`, the layout of a finished reconstruction.
    #[default]
    Numbered,
    /// `sparse/manually_created`, the input of a triangulation with known poses.
    ManuallyCreated,
}

impl SparseLayout {
    /// The directory name.
    pub fn dir_name(&self) -> &'static str {
        match self {
            SparseLayout::Numbered => "0",
            SparseLayout::ManuallyCreated => "manually_created",
        }
    }
}

/// Options of [`export_colmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColmapOptions {
    /// Where poses are read from.
    pub pose_source: PoseSource,
    /// The id of the first exported image.
    pub first_image_id: u32,
    /// The id of the single camera.
    pub camera_id: u32,
    /// The rotation to quaternion conversion.
    pub quaternion: QuaternionFormula,
    /// The sparse model directory.
    pub sparse_layout: SparseLayout,
}

impl Default for ColmapOptions {
    fn default() -> Self {
        Self {
            pose_source: PoseSource::default(),
            first_image_id: 0,
            camera_id: 1,
            quaternion: QuaternionFormula::default(),
            sparse_layout: SparseLayout::default(),
        }
    }
}

/// Summary of a COLMAP export.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapReport {
    /// The written sparse model directory.
    pub sparse_dir: PathBuf,
    /// `(view index, image id)` of every exported view.
    pub exported: Vec<(u32, u32)>,
    /// Indices of the skipped views.
    pub skipped: Vec<u32>,
    /// The camera image size.
    pub image_size: ImageSize,
}

fn view_pose(
    record: &DatasetRecord,
    dataset: &Dataset,
    source: PoseSource,
) -> Result<Option<Extrinsics>, ExportError> {
    match source {
        PoseSource::Extrinsics => Ok(record.extrinsics),
        PoseSource::Projection => {
            let Some(p) = record.projection else {
                return Ok(None);
            };
            let k = dataset.intrinsics.require()?.intrinsic;
            Ok(Some(extrinsics_from_projection(&k, &p)?))
        }
    }
}

/// Export a batch as a COLMAP sparse model with known poses.
///
/// Writes `sparse/<layout>/{cameras,images,points3D}.txt`, copies the renders to
/// `images/NNN.png` and the masks to `masks/NNN.png.png`. The `masks/` directory
/// is created even when the batch has no masks. Views without a render
/// or a pose are skipped. Image ids are sequential from
/// [`ColmapOptions::first_image_id`] in ascending view order, and the same ids are
/// handed to `registry`.
///
/// # Arguments
///
/// * `dataset` - The loaded batch.
/// * `out_dir` - The output directory, created if missing.
/// * `options` - The export options.
/// * `registry` - An optional sink mirroring the camera and images.
///
/// # Errors
///
/// Fails when the batch intrinsics are missing or malformed, or when no view is
/// complete.
pub fn export_colmap(
    dataset: &Dataset,
    out_dir: impl AsRef<Path>,
    options: &ColmapOptions,
    mut registry: Option<&mut dyn ImageRegistry>,
) -> Result<ColmapReport, ExportError> {
    let out_dir = out_dir.as_ref();
    let k = dataset.intrinsics.require()?.intrinsic;

    let mut complete = Vec::new();
    let mut skipped = Vec::new();
    for record in &dataset.records {
        let Some(render) = record.render.as_deref() else {
            log::warn!("view {}: no render, skipping", record.tag());
            skipped.push(record.index);
            continue;
        };
        match view_pose(record, dataset, options.pose_source) {
            Ok(Some(pose)) => complete.push((record, render, pose)),
            Ok(None) => {
                log::warn!("view {}: no {:?} pose, skipping", record.tag(), options.pose_source);
                skipped.push(record.index);
            }
            Err(e) => {
                log::warn!("view {}: {e}, skipping", record.tag());
                skipped.push(record.index);
            }
        }
    }

    let Some((_, first_render, _)) = complete.first() else {
        return Err(ExportError::NoCompleteViews(dataset.root.clone()));
    };

    let image_size = read_image_size(first_render).unwrap_or_else(|e| {
        log::warn!("{e}, using the principal point to size the camera");
        ImageSize {
            width: (2.0 * k.cx) as u32,
            height: (2.0 * k.cy) as u32,
        }
    });

    let sparse_dir = out_dir.join("sparse").join(options.sparse_layout.dir_name());
    fs::create_dir_all(&sparse_dir)?;
    fs::create_dir_all(out_dir.join("images"))?;
    fs::create_dir_all(out_dir.join("masks"))?;

    let camera = ColmapCamera {
        camera_id: options.camera_id,
        model_id: CameraModelId::CameraModelOpenCV,
        width: image_size.width as usize,
        height: image_size.height as usize,
        params: vec![k.fx, k.fy, k.cx, k.cy, 0.0, 0.0, 0.0, 0.0],
    };
    if let Some(registry) = registry.as_deref_mut() {
        registry.add_camera(&camera)?;
    }

    let mut images = Vec::with_capacity(complete.len());
    let mut exported = Vec::with_capacity(complete.len());
    for ((record, render, pose), image_id) in complete.into_iter().zip(options.first_image_id..) {
        let name = format!("{}.png", record.tag());
        copy_image(render, out_dir.join("images").join(&name))?;
        if let Some(mask) = &record.mask {
            copy_image(mask, out_dir.join("masks").join(format!("{name}.png")))?;
        }

        if let Some(registry) = registry.as_deref_mut() {
            registry.add_image(image_id, camera.camera_id, &name)?;
        }

        images.push(ColmapImage {
            name,
            image_id,
            camera_id: camera.camera_id,
            rotation: rotation_matrix_to_quaternion(&pose.rotation, options.quaternion),
            translation: pose.translation,
            points2d: Vec::new(),
        });
        exported.push((record.index, image_id));
    }

    write_cameras_txt(sparse_dir.join("cameras.txt"), &[camera])?;
    write_images_txt(sparse_dir.join("images.txt"), &images)?;
    write_points3d_txt(sparse_dir.join("points3D.txt"), &[])?;

    log::info!(
        "exported {} views to {} ({} skipped)",
        exported.len(),
        sparse_dir.display(),
        skipped.len()
    );

    Ok(ColmapReport {
        sparse_dir,
        exported,
        skipped,
        image_size,
    })
}
