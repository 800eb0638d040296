use std::{
    fs,
    path::{Path, PathBuf},
};

use synthset_camera::{projection::extrinsics_from_projection, CameraIntrinsic};
use synthset_io::{
    intrinsics::{write_intrinsics, IntrinsicsSchema},
    matrix::write_matrix_txt,
    png::copy_image,
    record::{Dataset, DatasetRecord, ImageSource, TrainTestSplit},
};
use synthset_linalg::{mat34_to_mat4, Mat34, Mat4};

use crate::{split::train_test_split, ExportError};

/// How output files are named.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum NsvfAddressing {
    /// `<idx>.png`, `<idx>.txt`.
    #[default]
    Plain,
    /// `0_<idx:03>` for train views and `1_<idx:03>` for test views.
    Split {
        /// The train fraction, strictly between 0 and 1.
        fraction: f64,
    },
}

/// What the pose files hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoseEncoding {
    /// The 3x4 projection matrix lifted to 4x4.
    #[default]
    LiftedProjection,
    /// The camera-to-world transform recovered as `K⁻¹·P`.
    CameraToWorld,
}

/// Options of [`export_nsvf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NsvfOptions {
    /// File naming.
    pub addressing: NsvfAddressing,
    /// Seed of the train/test split.
    pub seed: Option<u64>,
    /// Content of the pose files.
    pub pose_encoding: PoseEncoding,
    /// Which image is copied to `rgb/`.
    pub image_source: ImageSource,
}

impl Default for NsvfOptions {
    fn default() -> Self {
        Self {
            addressing: NsvfAddressing::default(),
            seed: None,
            pose_encoding: PoseEncoding::default(),
            image_source: ImageSource::Masked,
        }
    }
}

/// Summary of an NSVF export.
#[derive(Debug, Clone, PartialEq)]
pub struct NsvfReport {
    /// Tags of the written views, in view order.
    pub written: Vec<String>,
    /// Indices of the skipped views.
    pub skipped: Vec<u32>,
    /// The split used for split addressing.
    pub split: Option<TrainTestSplit>,
}

fn view_tag(record: &DatasetRecord, split: Option<&TrainTestSplit>) -> String {
    match split {
        None => record.index.to_string(),
        Some(split) if split.is_train(record.index) => format!("0_{}", record.tag()),
        Some(_) => format!("1_{}", record.tag()),
    }
}

fn encode_pose(
    projection: &Mat34,
    k: &CameraIntrinsic,
    encoding: PoseEncoding,
) -> Result<Mat4, ExportError> {
    match encoding {
        PoseEncoding::LiftedProjection => Ok(mat34_to_mat4(projection)),
        PoseEncoding::CameraToWorld => {
            Ok(extrinsics_from_projection(k, projection)?.camera_to_world())
        }
    }
}

/// Export a batch in the NSVF layout.
///
/// Writes `intrinsics.txt` (4x4), copies `bbox.txt` verbatim, and for every view
/// with an image and a projection copies `rgb/<tag>.png` and writes
/// `pose/<tag>.txt`.
///
/// When split addressing is requested, the split is drawn over the views that
/// are actually written, after pose encoding failures are skipped.
///
/// # Errors
///
/// Fails when the bounding box or the intrinsics are missing or malformed, when
/// the split fraction is invalid, or when no view is complete.
pub fn export_nsvf(
    dataset: &Dataset,
    out_dir: impl AsRef<Path>,
    options: &NsvfOptions,
) -> Result<NsvfReport, ExportError> {
    let out_dir = out_dir.as_ref();
    dataset.bounding_box.require()?;
    let k = dataset.intrinsics.require()?.intrinsic;
    let bbox_path = dataset.bounding_box_path.as_ref().ok_or_else(|| {
        synthset_io::DatasetIoError::FileDoesNotExist(
            dataset.root.join(synthset_io::bbox::BOUNDING_BOX_FILE),
        )
    })?;

    let mut complete: Vec<(&DatasetRecord, &Path, Mat4)> = Vec::new();
    let mut skipped = Vec::new();
    for record in &dataset.records {
        let (image, projection) = match (record.image(options.image_source), &record.projection) {
            (Some(image), Some(projection)) => (image, projection),
            (image, _) => {
                let what = if image.is_none() { "image" } else { "projection" };
                log::warn!("view {}: no {what}, skipping", record.tag());
                skipped.push(record.index);
                continue;
            }
        };
        match encode_pose(projection, &k, options.pose_encoding) {
            Ok(pose) => complete.push((record, image, pose)),
            Err(e) => {
                log::warn!("view {}: {e}, skipping", record.tag());
                skipped.push(record.index);
            }
        }
    }
    if complete.is_empty() {
        return Err(ExportError::NoCompleteViews(dataset.root.clone()));
    }

    let split = match options.addressing {
        NsvfAddressing::Plain => None,
        NsvfAddressing::Split { fraction } => {
            let indices = complete.iter().map(|(r, _, _)| r.index).collect::<Vec<_>>();
            Some(train_test_split(&indices, fraction, options.seed)?)
        }
    };

    let rgb_dir: PathBuf = out_dir.join("rgb");
    let pose_dir: PathBuf = out_dir.join("pose");
    fs::create_dir_all(&rgb_dir)?;
    fs::create_dir_all(&pose_dir)?;

    write_intrinsics(
        out_dir.join("intrinsics.txt"),
        &k,
        IntrinsicsSchema::Full4x4,
        None,
    )?;
    fs::copy(bbox_path, out_dir.join("bbox.txt"))?;

    let mut written = Vec::with_capacity(complete.len());
    for (record, image, pose) in complete {
        let tag = view_tag(record, split.as_ref());
        copy_image(image, rgb_dir.join(format!("{tag}.png")))?;
        write_matrix_txt(pose_dir.join(format!("{tag}.txt")), &pose)?;
        written.push(tag);
    }

    if let Some(split) = &split {
        log::info!(
            "nsvf split {}: {} train, {} test",
            split.fraction,
            split.train.len(),
            split.test.len()
        );
    }
    log::info!(
        "exported {} views to {} ({} skipped)",
        written.len(),
        out_dir.display(),
        skipped.len()
    );

    Ok(NsvfReport {
        written,
        skipped,
        split,
    })
}
