use serde::{Deserialize, Serialize};
use synthset_camera::{compute_bounding_box, normalization_matrix, ExclusionFilter};
use synthset_io::bbox::{
    write_bounding_box, write_normalization_matrix, BOUNDING_BOX_FILE, NORMALIZATION_MATRIX_FILE,
};

use crate::{
    config::ConfigError,
    plugin::{parse_options, BatchPlugin, SceneContext},
    BatchError,
};

/// Options of the `bounding_box` plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundingBoxOptions {
    /// Objects whose name matches are left out. Empty matches nothing.
    pub exclude_pattern: String,
    /// Voxel size written instead of the default; ignored unless positive.
    pub voxel_size: Option<f64>,
}

/// Writes `bounding_box.txt` once per batch.
#[derive(Debug)]
pub struct BoundingBoxPlugin {
    filter: ExclusionFilter,
    voxel_size: Option<f64>,
}

fn exclusion_filter(plugin: &str, pattern: &str) -> Result<ExclusionFilter, ConfigError> {
    ExclusionFilter::new(pattern).map_err(|e| ConfigError::InvalidValue {
        field: format!("{plugin}.exclude_pattern"),
        reason: e.to_string(),
    })
}

impl BoundingBoxPlugin {
    /// Build the plugin from its options.
    pub fn create(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        let options: BoundingBoxOptions = parse_options("bounding_box", options)?;
        Ok(Box::new(Self {
            filter: exclusion_filter("bounding_box", &options.exclude_pattern)?,
            voxel_size: options.voxel_size,
        }))
    }
}

impl BatchPlugin for BoundingBoxPlugin {
    fn name(&self) -> &'static str {
        "bounding_box"
    }

    fn on_scene_created(&mut self, ctx: &SceneContext<'_>) -> Result<(), BatchError> {
        // an empty selection is already reported
        let Some(bbox) = compute_bounding_box(ctx.objects, &self.filter, self.voxel_size) else {
            return Ok(());
        };
        let path = ctx.output_dir.join(BOUNDING_BOX_FILE);
        write_bounding_box(&path, &bbox)?;
        log::info!("bounding box written to {}", path.display());
        Ok(())
    }
}

/// Options of the `normalization_matrix` plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationOptions {
    /// Objects whose name matches are left out. Empty matches nothing.
    pub exclude_pattern: String,
    /// Also translate the box center to the origin; off writes `diag(s, s, s, 1)`.
    pub center: bool,
}

/// Writes `normalization_matrix.json` once per batch.
#[derive(Debug)]
pub struct NormalizationMatrixPlugin {
    filter: ExclusionFilter,
    center: bool,
}

impl NormalizationMatrixPlugin {
    /// Build the plugin from its options.
    pub fn create(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        let options: NormalizationOptions = parse_options("normalization_matrix", options)?;
        Ok(Box::new(Self {
            filter: exclusion_filter("normalization_matrix", &options.exclude_pattern)?,
            center: options.center,
        }))
    }
}

impl BatchPlugin for NormalizationMatrixPlugin {
    fn name(&self) -> &'static str {
        "normalization_matrix"
    }

    fn on_scene_created(&mut self, ctx: &SceneContext<'_>) -> Result<(), BatchError> {
        let Some(bbox) = compute_bounding_box(ctx.objects, &self.filter, None) else {
            return Ok(());
        };
        let path = ctx.output_dir.join(NORMALIZATION_MATRIX_FILE);
        write_normalization_matrix(&path, &normalization_matrix(&bbox, self.center))?;
        log::info!("normalization matrix written to {}", path.display());
        Ok(())
    }
}
