use std::path::Path;

use serde::{Deserialize, Serialize};
use synthset_camera::{
    intrinsics::{CameraLens, RenderSettings},
    CameraError,
};

use crate::{
    expr::{evaluate, ExprError},
    sampling::{HemisphereBands, Placement},
};

/// The configuration version understood by this crate.
pub const CONFIG_VERSION: u32 = 1;

/// Error types for loading and validating a batch configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading the configuration file.
    #[error("Failed to read the configuration. {0}")]
    FileError(#[from] std::io::Error),

    /// The configuration is not valid JSON for the schema.
    #[error("Invalid configuration. {0}")]
    JsonError(#[from] serde_json::Error),

    /// The configuration was written for another version.
    #[error("Unsupported configuration version {found}, expected {expected}")]
    UnsupportedVersion {
        /// The version in the file.
        found: u32,
        /// The supported version.
        expected: u32,
    },

    /// A numeric expression did not evaluate.
    #[error("Invalid expression for {field}. {source}")]
    Expression {
        /// The field holding the expression.
        field: String,
        /// The evaluation error.
        source: ExprError,
    },

    /// A value is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A lens or render setting is out of range.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// No plugin is registered under the name.
    #[error("Unknown plugin {0:?}")]
    UnknownPlugin(String),

    /// The options of a plugin do not match its schema.
    #[error("Invalid options for plugin {plugin}. {source}")]
    PluginOptions {
        /// The plugin name.
        plugin: String,
        /// The deserialization error.
        source: serde_json::Error,
    },
}

/// A number given either as a literal or as an expression such as `"pi/4"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A literal.
    Number(f64),
    /// An expression evaluated by [`crate::expr::evaluate`].
    Expression(String),
}

impl Scalar {
    /// Evaluate the scalar, naming `field` in the error.
    pub fn resolve(&self, field: &str) -> Result<f64, ConfigError> {
        match self {
            Scalar::Number(v) => Ok(*v),
            Scalar::Expression(expr) => evaluate(expr).map_err(|source| ConfigError::Expression {
                field: field.to_string(),
                source,
            }),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

/// The fixed sun light added to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightSettings {
    /// The light object name.
    pub name: String,
    /// The light strength.
    pub energy: f64,
    /// The light location in world coordinates.
    pub location: [f64; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            name: "FixedSun".to_string(),
            energy: 5.0,
            location: [5.0, -5.0, 10.0],
        }
    }
}

/// How camera locations are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)]
pub enum PlacementConfig {
    /// Uniform random on the upper hemisphere.
    Random {
        /// The sphere radius.
        radius: Scalar,
        /// Seed for reproducible locations.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Evenly spaced azimuths on inclination bands.
    Hemisphere {
        /// The first band inclination, in radians from the pole.
        inclination_start: Scalar,
        /// The inclination the bands stop before.
        inclination_stop: Scalar,
        /// The inclination step between bands.
        inclination_step: Scalar,
        /// The sphere radius.
        radius: Scalar,
    },
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig::Random {
            radius: Scalar::Number(10.0),
            seed: None,
        }
    }
}

impl PlacementConfig {
    /// Evaluate the expressions and check the ranges.
    pub fn resolve(&self) -> Result<Placement, ConfigError> {
        match self {
            PlacementConfig::Random { radius, seed } => Ok(Placement::Random {
                radius: positive("placement.radius", radius.resolve("placement.radius")?)?,
                seed: *seed,
            }),
            PlacementConfig::Hemisphere {
                inclination_start,
                inclination_stop,
                inclination_step,
                radius,
            } => Ok(Placement::Hemisphere(HemisphereBands::new(
                inclination_start.resolve("placement.inclination_start")?,
                inclination_stop.resolve("placement.inclination_stop")?,
                inclination_step.resolve("placement.inclination_step")?,
                positive("placement.radius", radius.resolve("placement.radius")?)?,
            )?)),
        }
    }
}

fn positive(field: &str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be positive, got {value}"),
        })
    }
}

/// A plugin selected by name with its own options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// The registered plugin name.
    pub name: String,
    /// Plugin specific options, checked by the plugin factory.
    #[serde(default)]
    pub options: serde_json::Value,
}

impl PluginConfig {
    /// A plugin with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: serde_json::Value::Null,
        }
    }
}

/// Everything needed to generate one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// The configuration version, [`CONFIG_VERSION`].
    pub version: u32,
    /// The number of views to render.
    pub num_views: u32,
    /// Output image settings.
    pub render: RenderSettings,
    /// Lens of every spawned camera.
    pub camera: CameraLens,
    /// The scene light.
    pub light: LightSettings,
    /// Camera placement.
    pub placement: PlacementConfig,
    /// Plugins run for every view, in order.
    pub plugins: Vec<PluginConfig>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            num_views: 1,
            render: RenderSettings {
                resolution_x: 100,
                resolution_y: 100,
                ..Default::default()
            },
            camera: CameraLens {
                focal: synthset_camera::intrinsics::FocalLength::Millimeters(35.0),
                ..Default::default()
            },
            light: LightSettings::default(),
            placement: PlacementConfig::default(),
            plugins: Vec::new(),
        }
    }
}

impl BatchConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Check the version and every value that can be checked without the host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                expected: CONFIG_VERSION,
            });
        }
        if self.num_views == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_views".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.render.validate()?;
        self.camera.validate()?;
        self.placement.resolve()?;
        Ok(())
    }
}
