use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use synthset_camera::{BoundingBox, Extrinsics, ImageSize};
use synthset_linalg::{Mat34, Mat4};

use crate::{
    batch::{scan_batch, BatchScan, ViewFiles},
    bbox::{read_bounding_box, read_normalization_matrix},
    error::DatasetIoError,
    intrinsics::{read_intrinsics, IntrinsicsFile},
    matrix::{parse_matrix_rows, read_matrix, rows_to_matrix},
    png::read_image_size,
};

/// Which image of a view an exporter copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// The plain render, `<idx>_render.png`.
    #[default]
    Render,
    /// The masked RGBA image, `<idx>_masked_*.png`.
    Masked,
}

/// A batch-level file that may be missing or malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem<T> {
    /// No such file in the batch.
    Missing(PathBuf),
    /// The file exists but could not be read.
    Malformed(PathBuf, String),
    /// The parsed content.
    Loaded(T),
}

impl<T> BatchItem<T> {
    fn load(
        root: &Path,
        default_name: &str,
        path: Option<&PathBuf>,
        read: impl FnOnce(&Path) -> Result<T, DatasetIoError>,
    ) -> Self {
        let Some(path) = path else {
            return BatchItem::Missing(root.join(default_name));
        };
        match read(path) {
            Ok(value) => BatchItem::Loaded(value),
            Err(e) => {
                log::warn!("{}: {e}", path.display());
                BatchItem::Malformed(path.clone(), e.to_string())
            }
        }
    }

    /// The value, if it was loaded.
    pub fn value(&self) -> Option<&T> {
        match self {
            BatchItem::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// The value, or an error naming the missing or malformed file.
    pub fn require(&self) -> Result<&T, DatasetIoError> {
        match self {
            BatchItem::Loaded(value) => Ok(value),
            BatchItem::Missing(path) => Err(DatasetIoError::FileDoesNotExist(path.clone())),
            BatchItem::Malformed(path, msg) => Err(DatasetIoError::ParseError(format!(
                "{}: {msg}",
                path.display()
            ))),
        }
    }
}

/// The canonical record of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRecord {
    /// The view index.
    pub index: u32,
    /// The rendered RGB image.
    pub render: Option<PathBuf>,
    /// The masked RGBA image.
    pub masked: Option<PathBuf>,
    /// The object mask.
    pub mask: Option<PathBuf>,
    /// The depth image.
    pub depth: Option<PathBuf>,
    /// The normal image.
    pub normal: Option<PathBuf>,
    /// The world-to-camera extrinsics.
    pub extrinsics: Option<Extrinsics>,
    /// The 3x4 projection matrix.
    pub projection: Option<Mat34>,
}

impl DatasetRecord {
    fn from_view_files(index: u32, files: ViewFiles) -> Self {
        let extrinsics = files.extrinsics.as_deref().and_then(|path| {
            read_extrinsics(path)
                .map_err(|e| log::warn!("view {index:03}: dropping extrinsics. {e}"))
                .ok()
        });

        // json is the exact encoding, text the rounded one
        let projection = [files.projection_json.as_deref(), files.projection_txt.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|path| {
                read_matrix::<3, 4>(path)
                    .map_err(|e| log::warn!("view {index:03}: ignoring projection. {e}"))
                    .ok()
            });

        Self {
            index,
            render: files.render,
            masked: files.masked,
            mask: files.mask,
            depth: files.depth,
            normal: files.normal,
            extrinsics,
            projection,
        }
    }

    /// The image for the requested source.
    pub fn image(&self, source: ImageSource) -> Option<&Path> {
        match source {
            ImageSource::Render => self.render.as_deref(),
            ImageSource::Masked => self.masked.as_deref(),
        }
    }

    /// The zero-padded index used in file names.
    pub fn tag(&self) -> String {
        crate::batch::view_prefix(self.index)
    }
}

/// Read a 3x4 extrinsics file, also accepting the 4x4 homogeneous form.
pub fn read_extrinsics(file_path: impl AsRef<Path>) -> Result<Extrinsics, DatasetIoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    let rows = parse_matrix_rows(&std::fs::read_to_string(file_path)?)?;
    let rt: Mat34 = if rows.len() == 4 {
        let m: Mat4 = rows_to_matrix(&rows, file_path)?;
        [m[0], m[1], m[2]]
    } else {
        rows_to_matrix(&rows, file_path)?
    };
    Ok(Extrinsics::from_matrix34(&rt))
}

/// A partition of view indices into train and test sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainTestSplit {
    /// The requested train fraction.
    pub fraction: f64,
    /// Indices of the training views.
    pub train: BTreeSet<u32>,
    /// Indices of the test views.
    pub test: BTreeSet<u32>,
}

impl TrainTestSplit {
    /// Whether the view belongs to the training set.
    pub fn is_train(&self, index: u32) -> bool {
        self.train.contains(&index)
    }
}

/// Every record of one batch directory and its batch-level files.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// The batch directory.
    pub root: PathBuf,
    /// The per-view records in ascending index order.
    pub records: Vec<DatasetRecord>,
    /// The batch intrinsics.
    pub intrinsics: BatchItem<IntrinsicsFile>,
    /// The scene bounding box.
    pub bounding_box: BatchItem<BoundingBox>,
    /// The normalization matrix.
    pub normalization: BatchItem<Mat4>,
    /// The bounding box file, for exporters that copy it verbatim.
    pub bounding_box_path: Option<PathBuf>,
}

impl Dataset {
    /// Scan and load a batch directory.
    ///
    /// Malformed per-view files are dropped from their record with a warning.
    /// Malformed batch-level files are kept as [`BatchItem::Malformed`] so that
    /// only exporters which need them fail.
    pub fn from_batch(dir: impl AsRef<Path>) -> Result<Self, DatasetIoError> {
        Ok(Self::from_scan(scan_batch(dir)?))
    }

    /// Load the records of an existing scan.
    pub fn from_scan(scan: BatchScan) -> Self {
        let BatchScan {
            root,
            views,
            intrinsics,
            bounding_box,
            normalization,
            metadata: _,
        } = scan;

        let records = views
            .into_iter()
            .map(|(index, files)| DatasetRecord::from_view_files(index, files))
            .collect();

        Self {
            intrinsics: BatchItem::load(
                &root,
                crate::batch::CAMERA_INTRINSICS_FILE,
                intrinsics.as_ref(),
                |p| read_intrinsics(p),
            ),
            bounding_box: BatchItem::load(
                &root,
                crate::bbox::BOUNDING_BOX_FILE,
                bounding_box.as_ref(),
                |p| read_bounding_box(p),
            ),
            normalization: BatchItem::load(
                &root,
                crate::bbox::NORMALIZATION_MATRIX_FILE,
                normalization.as_ref(),
                |p| read_normalization_matrix(p),
            ),
            bounding_box_path: bounding_box,
            records,
            root,
        }
    }

    /// The image size: from the compact intrinsics if stored there, else from the
    /// header of the first image of the requested source.
    pub fn image_size(&self, source: ImageSource) -> Option<ImageSize> {
        if let Some(size) = self.intrinsics.value().and_then(|k| k.image_size) {
            return Some(size);
        }
        self.records
            .iter()
            .find_map(|r| r.image(source))
            .and_then(|path| read_image_size(path).ok())
    }

    /// The record of a view index.
    pub fn record(&self, index: u32) -> Option<&DatasetRecord> {
        self.records.iter().find(|r| r.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bbox::write_bounding_box,
        intrinsics::{write_intrinsics, IntrinsicsSchema},
        matrix::{write_matrix_json, write_matrix_txt},
        png::write_image_png_rgb8,
    };
    use std::fs;
    use synthset_camera::CameraIntrinsic;

    const RT: Mat34 = [
        [1.0, 0.0, 0.0, 0.5],
        [0.0, -1.0, 0.0, 0.0],
        [0.0, 0.0, -1.0, 4.0],
    ];

    #[test]
    fn test_dataset_from_batch() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let dir = tmp_dir.path();

        let size = ImageSize {
            width: 4,
            height: 2,
        };
        write_image_png_rgb8(dir.join("000_render.png"), size, &[0; 24])?;
        write_image_png_rgb8(dir.join("001_render.png"), size, &[0; 24])?;
        write_matrix_txt(dir.join("000_camera_extrinsics.txt"), &RT)?;
        fs::write(dir.join("001_camera_extrinsics.txt"), "1 2 3")?;
        write_matrix_txt(dir.join("001_camera_projection_matrix.txt"), &RT)?;
        write_matrix_json(dir.join("001_camera_projection_matrix.json"), &RT)?;
        write_intrinsics(
            dir.join("camera_intrinsics.txt"),
            &CameraIntrinsic {
                fx: 10.0,
                fy: 10.0,
                cx: 2.0,
                cy: 1.0,
            },
            IntrinsicsSchema::Matrix3x3,
            None,
        )?;
        fs::write(dir.join("bounding_box.txt"), "garbage")?;

        let dataset = Dataset::from_batch(dir)?;
        assert_eq!(dataset.records.len(), 2);

        let r0 = &dataset.records[0];
        assert_eq!(r0.index, 0);
        assert_eq!(r0.tag(), "000");
        assert_eq!(r0.extrinsics.map(|e| e.matrix34()), Some(RT));
        assert_eq!(r0.projection, None);

        let r1 = dataset.record(1).ok_or(DatasetIoError::ParseError("view 1".into()))?;
        assert_eq!(r1.extrinsics, None);
        assert_eq!(r1.projection, Some(RT));

        assert_eq!(dataset.intrinsics.require()?.intrinsic.fx, 10.0);
        assert!(matches!(dataset.bounding_box, BatchItem::Malformed(..)));
        assert!(dataset.bounding_box.require().is_err());
        assert!(matches!(
            dataset.normalization.require(),
            Err(DatasetIoError::FileDoesNotExist(_))
        ));
        assert_eq!(dataset.image_size(ImageSource::Render), Some(size));
        assert_eq!(dataset.image_size(ImageSource::Masked), None);
        Ok(())
    }

    #[test]
    fn test_bounding_box_path_kept() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("bounding_box.txt");
        write_bounding_box(&path, &BoundingBox::new([-1.0; 3], [1.0; 3]))?;

        let dataset = Dataset::from_batch(tmp_dir.path())?;
        assert!(dataset.records.is_empty());
        assert_eq!(dataset.bounding_box_path, Some(path));
        assert!(dataset.bounding_box.value().is_some());
        Ok(())
    }

    #[test]
    fn test_extrinsics_4x4() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("000_camera_extrinsics.txt");
        write_matrix_txt(&path, &synthset_linalg::mat34_to_mat4(&RT))?;
        assert_eq!(read_extrinsics(&path)?.matrix34(), RT);
        Ok(())
    }

    #[test]
    fn test_projection_falls_back_to_txt() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let dir = tmp_dir.path();
        let size = ImageSize {
            width: 4,
            height: 2,
        };
        write_image_png_rgb8(dir.join("000_render.png"), size, &[0; 24])?;
        fs::write(dir.join("000_camera_projection_matrix.json"), "{ not json")?;
        write_matrix_txt(dir.join("000_camera_projection_matrix.txt"), &RT)?;

        let dataset = Dataset::from_batch(dir)?;
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].projection, Some(RT));
        Ok(())
    }
}
