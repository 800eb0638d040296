use std::{collections::BTreeMap, path::Path};

use serde::de::DeserializeOwned;
use synthset_camera::{intrinsics::RenderSettings, SceneObject};

use crate::{
    config::{ConfigError, PluginConfig},
    host::{HostCamera, RenderHost},
    plugins, BatchError,
};

/// What a plugin sees once the scene is set up.
#[derive(Debug, Clone, Copy)]
pub struct SceneContext<'a> {
    /// The batch directory.
    pub output_dir: &'a Path,
    /// The render settings in effect.
    pub render: &'a RenderSettings,
    /// Every object of the scene.
    pub objects: &'a [SceneObject],
}

/// What a plugin sees for one view.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    /// The batch directory.
    pub output_dir: &'a Path,
    /// The render settings in effect.
    pub render: &'a RenderSettings,
    /// The view index.
    pub index: u32,
    /// The evaluated camera of the view.
    pub camera: &'a HostCamera,
    /// Where the render of the view is written.
    pub render_path: &'a Path,
}

/// A capability run by the generator at fixed points of a batch.
///
/// Every hook defaults to doing nothing.
pub trait BatchPlugin {
    /// The registered name.
    fn name(&self) -> &'static str;

    /// Called once after the host is configured, before the first view.
    fn on_scene_created(&mut self, _ctx: &SceneContext<'_>) -> Result<(), BatchError> {
        Ok(())
    }

    /// Called after the camera of a view is spawned, before it is rendered.
    fn on_camera_created(
        &mut self,
        _ctx: &ViewContext<'_>,
        _host: &mut dyn RenderHost,
    ) -> Result<(), BatchError> {
        Ok(())
    }

    /// Called after the view is rendered.
    fn on_render_completed(&mut self, _ctx: &ViewContext<'_>) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Builds a plugin from its options.
pub type PluginFactory = fn(&serde_json::Value) -> Result<Box<dyn BatchPlugin>, ConfigError>;

/// Deserialize plugin options, treating `null` as the defaults.
pub fn parse_options<T: DeserializeOwned + Default>(
    plugin: &str,
    options: &serde_json::Value,
) -> Result<T, ConfigError> {
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|source| ConfigError::PluginOptions {
        plugin: plugin.to_string(),
        source,
    })
}

/// Options of plugins that take none; anything but `null` or `{}` is rejected.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoOptions {}

/// Maps plugin names to factories.
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<&'static str, PluginFactory>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in plugin.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        plugins::register_builtin(&mut registry);
        registry
    }

    /// Register a factory, replacing any previous one with the same name.
    pub fn register(&mut self, name: &'static str, factory: PluginFactory) {
        if self.factories.insert(name, factory).is_some() {
            log::debug!("plugin {name} re-registered");
        }
    }

    /// The registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the plugin a configuration entry names.
    pub fn create(&self, config: &PluginConfig) -> Result<Box<dyn BatchPlugin>, ConfigError> {
        let factory = self
            .factories
            .get(config.name.as_str())
            .ok_or_else(|| ConfigError::UnknownPlugin(config.name.clone()))?;
        factory(&config.options)
    }

    /// Build every plugin of a configuration, in order.
    pub fn create_all(
        &self,
        configs: &[PluginConfig],
    ) -> Result<Vec<Box<dyn BatchPlugin>>, ConfigError> {
        configs.iter().map(|c| self.create(c)).collect()
    }
}
