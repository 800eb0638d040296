use synthset_io::metadata::{append_metadata_row, create_metadata, MetadataRow, METADATA_FILE};

use crate::{
    config::ConfigError,
    plugin::{parse_options, BatchPlugin, NoOptions, SceneContext, ViewContext},
    BatchError,
};

/// Appends the camera world matrix and focal length of every render to `metadata.csv`.
#[derive(Debug, Default)]
pub struct MetadataPlugin;

impl MetadataPlugin {
    /// Build the plugin; it takes no options.
    pub fn create(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        parse_options::<NoOptions>("metadata", options)?;
        Ok(Box::new(Self))
    }
}

impl BatchPlugin for MetadataPlugin {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn on_scene_created(&mut self, ctx: &SceneContext<'_>) -> Result<(), BatchError> {
        create_metadata(ctx.output_dir.join(METADATA_FILE))?;
        Ok(())
    }

    fn on_render_completed(&mut self, ctx: &ViewContext<'_>) -> Result<(), BatchError> {
        let filename = ctx
            .render_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        append_metadata_row(
            ctx.output_dir.join(METADATA_FILE),
            &MetadataRow {
                filename,
                pose: ctx.camera.world_matrix,
                focal: ctx.camera.lens.focal_length_mm(),
            },
        )?;
        Ok(())
    }
}
