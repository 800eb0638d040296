use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use regex::Regex;

use crate::{
    bbox::{BOUNDING_BOX_FILE, NORMALIZATION_MATRIX_FILE},
    error::DatasetIoError,
    metadata::METADATA_FILE,
};

/// Name of the intrinsics file in a batch directory.
pub const CAMERA_INTRINSICS_FILE: &str = "camera_intrinsics.txt";

/// Format the zero-padded file prefix of a view, e.g. `007`.
pub fn view_prefix(index: u32) -> String {
    format!("{index:03}")
}

/// The per-view file kinds recognized in a batch directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViewFileKind {
    /// `<idx>_render.png`
    Render,
    /// `<idx>_mask_*.png`
    Mask,
    /// `<idx>_masked_*.png`
    Masked,
    /// `<idx>_depth_*.png`
    Depth,
    /// `<idx>_normal_*.png`
    Normal,
    /// `<idx>_camera_extrinsics.txt`
    Extrinsics,
    /// `<idx>_camera_projection_matrix.txt`
    ProjectionTxt,
    /// `<idx>_camera_projection_matrix.json`
    ProjectionJson,
}

impl ViewFileKind {
    const ALL: [ViewFileKind; 8] = [
        ViewFileKind::Render,
        ViewFileKind::Mask,
        ViewFileKind::Masked,
        ViewFileKind::Depth,
        ViewFileKind::Normal,
        ViewFileKind::Extrinsics,
        ViewFileKind::ProjectionTxt,
        ViewFileKind::ProjectionJson,
    ];

    fn pattern(&self) -> &'static str {
        match self {
            ViewFileKind::Render => r"^(\d+)_render\.png$",
            ViewFileKind::Mask => r"^(\d+)_mask_.*\.png$",
            ViewFileKind::Masked => r"^(\d+)_masked_.*\.png$",
            ViewFileKind::Depth => r"^(\d+)_depth_.*\.png$",
            ViewFileKind::Normal => r"^(\d+)_normal_.*\.png$",
            ViewFileKind::Extrinsics => r"^(\d+)_camera_extrinsics\.txt$",
            ViewFileKind::ProjectionTxt => r"^(\d+)_camera_projection_matrix\.txt$",
            ViewFileKind::ProjectionJson => r"^(\d+)_camera_projection_matrix\.json$",
        }
    }
}

/// Compiled filename patterns mapping a file name to its view index and kind.
pub struct FilePatterns {
    patterns: Vec<(ViewFileKind, Regex)>,
}

impl FilePatterns {
    /// Compile the patterns of every [`ViewFileKind`].
    pub fn new() -> Result<Self, DatasetIoError> {
        let patterns = ViewFileKind::ALL
            .iter()
            .map(|kind| {
                Regex::new(kind.pattern())
                    .map(|re| (*kind, re))
                    .map_err(|e| DatasetIoError::ParseError(format!("file pattern: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Classify a file name.
    ///
    /// Returns `None` for names that are not per-view files or whose index overflows.
    pub fn classify(&self, file_name: &str) -> Option<(u32, ViewFileKind)> {
        self.patterns.iter().find_map(|(kind, re)| {
            let caps = re.captures(file_name)?;
            let index = caps.get(1)?.as_str().parse::<u32>().ok()?;
            Some((index, *kind))
        })
    }
}

/// The files found for one view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFiles {
    /// The rendered RGB image.
    pub render: Option<PathBuf>,
    /// The object mask.
    pub mask: Option<PathBuf>,
    /// The masked RGBA image.
    pub masked: Option<PathBuf>,
    /// The depth image.
    pub depth: Option<PathBuf>,
    /// The normal image.
    pub normal: Option<PathBuf>,
    /// The 3x4 extrinsics text file.
    pub extrinsics: Option<PathBuf>,
    /// The 3x4 projection text file.
    pub projection_txt: Option<PathBuf>,
    /// The 3x4 projection JSON file.
    pub projection_json: Option<PathBuf>,
}

impl ViewFiles {
    fn slot_mut(&mut self, kind: ViewFileKind) -> &mut Option<PathBuf> {
        match kind {
            ViewFileKind::Render => &mut self.render,
            ViewFileKind::Mask => &mut self.mask,
            ViewFileKind::Masked => &mut self.masked,
            ViewFileKind::Depth => &mut self.depth,
            ViewFileKind::Normal => &mut self.normal,
            ViewFileKind::Extrinsics => &mut self.extrinsics,
            ViewFileKind::ProjectionTxt => &mut self.projection_txt,
            ViewFileKind::ProjectionJson => &mut self.projection_json,
        }
    }
}

/// The result of scanning a batch directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchScan {
    /// The scanned directory.
    pub root: PathBuf,
    /// Per-view files in ascending index order.
    pub views: BTreeMap<u32, ViewFiles>,
    /// The batch intrinsics file, if present.
    pub intrinsics: Option<PathBuf>,
    /// The bounding box file, if present.
    pub bounding_box: Option<PathBuf>,
    /// The normalization matrix file, if present.
    pub normalization: Option<PathBuf>,
    /// The metadata file, if present.
    pub metadata: Option<PathBuf>,
}

/// Scan a batch directory and group its files by view index.
///
/// Files are visited in name order; when two files claim the same slot of a
/// view, the first one is kept and the other is reported.
///
/// # Arguments
///
/// * `dir` - The batch directory.
pub fn scan_batch(dir: impl AsRef<Path>) -> Result<BatchScan, DatasetIoError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(DatasetIoError::DirectoryDoesNotExist(dir.to_path_buf()));
    }

    let patterns = FilePatterns::new()?;

    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();

    let mut scan = BatchScan {
        root: dir.to_path_buf(),
        ..Default::default()
    };

    let existing = |name: &str| {
        let path = dir.join(name);
        path.is_file().then_some(path)
    };
    scan.intrinsics = existing(CAMERA_INTRINSICS_FILE);
    scan.bounding_box = existing(BOUNDING_BOX_FILE);
    scan.normalization = existing(NORMALIZATION_MATRIX_FILE);
    scan.metadata = existing(METADATA_FILE);

    for name in names {
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some((index, kind)) = patterns.classify(name) else {
            continue;
        };
        let slot = scan.views.entry(index).or_default().slot_mut(kind);
        match slot {
            Some(kept) => log::warn!(
                "view {index:03}: ignoring {name}, already using {}",
                kept.display()
            ),
            None => *slot = Some(dir.join(name)),
        }
    }

    log::debug!("scanned {}: {} views", dir.display(), scan.views.len());

    Ok(scan)
}
