//! Configuration system
//!
//! Tree construction parameters are plain serde structs so they can be
//! loaded from TOML or RON files next to the meshes they describe.

pub use serde::{Deserialize, Serialize};

use crate::bounding::fit::FitMethod;
use crate::bounding::volume::VolumeKind;
use crate::error::BvhError;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// # Tree Configuration
///
/// Parameters fixed at build time for a [`BoundingVolumeTree`].
///
/// [`BoundingVolumeTree`]: crate::spatial::tree::BoundingVolumeTree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Extra padding added around every node's volume
    pub margin: f64,
    /// Maximum number of elements stored in a leaf
    pub max_leaf_elements: usize,
    /// Box type used for every node
    pub kind: VolumeKind,
    /// Orientation fitting method for oriented boxes
    pub fit_method: FitMethod,
}

impl TreeConfig {
    /// Default configuration using the given box type
    pub fn new(kind: VolumeKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Set the node margin
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Set the maximum leaf size
    pub fn with_max_leaf_elements(mut self, count: usize) -> Self {
        self.max_leaf_elements = count;
        self
    }

    /// Set the box type
    pub fn with_kind(mut self, kind: VolumeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the oriented box fitting method
    pub fn with_fit_method(mut self, method: FitMethod) -> Self {
        self.fit_method = method;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), BvhError> {
        if self.max_leaf_elements == 0 {
            return Err(BvhError::InvalidLeafSize(self.max_leaf_elements));
        }
        if !(self.margin >= 0.0 && self.margin.is_finite()) {
            return Err(BvhError::InvalidMargin(self.margin));
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            margin: 0.0,
            max_leaf_elements: 2,
            kind: VolumeKind::Aabb,
            fit_method: FitMethod::ConvexHull,
        }
    }
}

impl Config for TreeConfig {}
