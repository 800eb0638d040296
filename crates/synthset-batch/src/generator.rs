use std::path::{Path, PathBuf};

use synthset_io::batch::view_prefix;

use crate::{
    config::BatchConfig,
    host::RenderHost,
    plugin::{PluginRegistry, SceneContext, ViewContext},
    sampling::{look_at_origin, CameraSampler},
    BatchError,
};

/// The file name of the render of a view, e.g. `007_render.png`.
pub fn render_file_name(index: u32) -> String {
    format!("{}_render.png", view_prefix(index))
}

/// Summary of a generated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// The batch directory.
    pub output_dir: PathBuf,
    /// The number of rendered views.
    pub num_views: u32,
    /// The plugins that ran, in order.
    pub plugins: Vec<&'static str>,
}

/// Render one batch of views into `output_dir`.
///
/// The host is configured first, then every plugin sees the scene once.
/// Views are placed, spawned and rendered in ascending index order; plugins
/// run after the camera is spawned and again after its render completes.
/// The first error aborts the batch and leaves the files already written.
///
/// # Arguments
///
/// * `host` - The rendering host owning the scene.
/// * `config` - The batch configuration.
/// * `registry` - Resolves the plugin names of the configuration.
/// * `output_dir` - The batch directory, created if missing.
///
/// # Returns
///
/// The number of views rendered and the plugins that ran.
pub fn generate_batch(
    host: &mut dyn RenderHost,
    config: &BatchConfig,
    registry: &PluginRegistry,
    output_dir: &Path,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    std::fs::create_dir_all(output_dir)?;

    // unknown plugins fail before the host is touched
    let mut plugins = registry.create_all(&config.plugins)?;
    let mut sampler = CameraSampler::new(config.placement.resolve()?);

    host.configure(&config.render, &config.light)?;

    let render = host.render_settings();
    let objects = host.scene_objects();
    log::info!(
        "generating {} views of {} objects into {}",
        config.num_views,
        objects.len(),
        output_dir.display()
    );

    let scene = SceneContext {
        output_dir,
        render: &render,
        objects: &objects,
    };
    for plugin in plugins.iter_mut() {
        plugin.on_scene_created(&scene)?;
    }

    for index in 0..config.num_views {
        let location = sampler.location(index, config.num_views)?;
        let camera = host.spawn_camera(&look_at_origin(&location)?, &config.camera)?;
        let render_path = output_dir.join(render_file_name(index));

        let ctx = ViewContext {
            output_dir,
            render: &render,
            index,
            camera: &camera,
            render_path: &render_path,
        };
        for plugin in plugins.iter_mut() {
            plugin.on_camera_created(&ctx, &mut *host)?;
        }

        host.render(&render_path)?;

        for plugin in plugins.iter_mut() {
            plugin.on_render_completed(&ctx)?;
        }
        log::info!(
            "view {}/{} rendered to {}",
            index + 1,
            config.num_views,
            render_path.display()
        );
    }

    Ok(BatchReport {
        output_dir: output_dir.to_path_buf(),
        num_views: config.num_views,
        plugins: plugins.iter().map(|p| p.name()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_file_name() {
        assert_eq!(render_file_name(0), "000_render.png");
        assert_eq!(render_file_name(42), "042_render.png");
        assert_eq!(render_file_name(1234), "1234_render.png");
    }
}
