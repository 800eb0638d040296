use serde::{Deserialize, Serialize};
use synthset_camera::{derive_extrinsics, derive_intrinsics, projection_matrix};
use synthset_io::{
    batch::{view_prefix, CAMERA_INTRINSICS_FILE},
    intrinsics::{write_intrinsics, IntrinsicsSchema},
    matrix::{write_matrix_json, write_matrix_txt},
};

use crate::{
    config::ConfigError,
    host::RenderHost,
    plugin::{parse_options, BatchPlugin, NoOptions, ViewContext},
    BatchError,
};

/// Options of the `camera_intrinsics` plugin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntrinsicsOptions {
    /// The layout of `camera_intrinsics.txt`.
    pub schema: IntrinsicsSchema,
}

impl Default for IntrinsicsOptions {
    fn default() -> Self {
        Self {
            schema: IntrinsicsSchema::Matrix3x3,
        }
    }
}

/// Writes `camera_intrinsics.txt` for the first view only.
///
/// Intrinsics are assumed constant across a batch.
#[derive(Debug, Default)]
pub struct CameraIntrinsicsPlugin {
    options: IntrinsicsOptions,
    written: bool,
}

impl CameraIntrinsicsPlugin {
    /// Build the plugin from its options.
    pub fn create(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        Ok(Box::new(Self {
            options: parse_options("camera_intrinsics", options)?,
            written: false,
        }))
    }
}

impl BatchPlugin for CameraIntrinsicsPlugin {
    fn name(&self) -> &'static str {
        "camera_intrinsics"
    }

    fn on_camera_created(
        &mut self,
        ctx: &ViewContext<'_>,
        _host: &mut dyn RenderHost,
    ) -> Result<(), BatchError> {
        if self.written {
            return Ok(());
        }
        let k = derive_intrinsics(&ctx.camera.lens, ctx.render)?;
        let path = ctx.output_dir.join(CAMERA_INTRINSICS_FILE);
        write_intrinsics(
            &path,
            &k,
            self.options.schema,
            Some(ctx.render.output_size()),
        )?;
        log::info!("intrinsics written to {}", path.display());
        self.written = true;
        Ok(())
    }
}

/// Writes `<idx>_camera_extrinsics.txt` for every view.
#[derive(Debug, Default)]
pub struct CameraExtrinsicsPlugin;

impl CameraExtrinsicsPlugin {
    /// Build the plugin; it takes no options.
    pub fn create(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        parse_options::<NoOptions>("camera_extrinsics", options)?;
        Ok(Box::new(Self))
    }
}

impl BatchPlugin for CameraExtrinsicsPlugin {
    fn name(&self) -> &'static str {
        "camera_extrinsics"
    }

    fn on_camera_created(
        &mut self,
        ctx: &ViewContext<'_>,
        _host: &mut dyn RenderHost,
    ) -> Result<(), BatchError> {
        let rt = derive_extrinsics(&ctx.camera.world_matrix)?;
        write_matrix_txt(
            ctx.output_dir
                .join(format!("{}_camera_extrinsics.txt", view_prefix(ctx.index))),
            &rt.matrix34(),
        )?;
        Ok(())
    }
}

/// Options of the `camera_projection_matrix` plugin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionOptions {
    /// Write the 10-decimal text file.
    pub txt: bool,
    /// Write the exact JSON file.
    pub json: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            txt: true,
            json: false,
        }
    }
}

/// Writes `<idx>_camera_projection_matrix.{txt,json}` for every view.
#[derive(Debug, Default)]
pub struct ProjectionMatrixPlugin {
    options: ProjectionOptions,
}

impl ProjectionMatrixPlugin {
    /// Build the plugin from its options.
    pub fn create(options: &serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        let options: ProjectionOptions = parse_options("camera_projection_matrix", options)?;
        if !options.txt && !options.json {
            return Err(ConfigError::InvalidValue {
                field: "camera_projection_matrix".to_string(),
                reason: "enable txt or json".to_string(),
            });
        }
        Ok(Box::new(Self { options }))
    }
}

impl BatchPlugin for ProjectionMatrixPlugin {
    fn name(&self) -> &'static str {
        "camera_projection_matrix"
    }

    fn on_camera_created(
        &mut self,
        ctx: &ViewContext<'_>,
        _host: &mut dyn RenderHost,
    ) -> Result<(), BatchError> {
        let k = derive_intrinsics(&ctx.camera.lens, ctx.render)?;
        let p = projection_matrix(&k, &derive_extrinsics(&ctx.camera.world_matrix)?);

        let stem = ctx.output_dir.join(format!(
            "{}_camera_projection_matrix",
            view_prefix(ctx.index)
        ));
        if self.options.txt {
            write_matrix_txt(stem.with_extension("txt"), &p)?;
        }
        if self.options.json {
            write_matrix_json(stem.with_extension("json"), &p)?;
        }
        Ok(())
    }
}
