//! # Packer Configuration
//!
//! Selects which spatial index the container carries and holds the layout
//! constants of each variant.
//!
//! ## Design Goals
//!
//! - **Faithful defaults**: `PackConfig::default()` reproduces the legacy grid container
//! - **Serializable**: load from TOML or RON through [`Config`]
//! - **Type Safe**: validation before any packaging work starts

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// Edge length of a grid cell in game units
pub const DEFAULT_GRID_CELL_SIZE: f32 = 4.0;

/// A tree node becomes a leaf once every dimension is below this size
pub const DEFAULT_TREE_LEAF_SIZE: f32 = 8.0;

/// Section padding byte of the grid container
pub const DEFAULT_GRID_FILL_BYTE: u8 = 0x00;

/// Section padding byte of the tree container (uninitialized memory in legacy files)
pub const DEFAULT_TREE_FILL_BYTE: u8 = 0xCD;

/// Spatial index strategy, which also selects the container layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartitionVariant {
    /// Uniform grid of cubic cells (primary `wc01` container)
    #[default]
    Grid,
    /// Recursive longest-axis bisection tree (alternate container)
    Tree,
}

impl std::fmt::Display for PartitionVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grid => write!(f, "grid"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

impl std::str::FromStr for PartitionVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "tree" => Ok(Self::Tree),
            other => Err(ConfigError::Invalid {
                field: "variant",
                reason: format!("unknown partition variant '{other}'"),
            }),
        }
    }
}

/// # Pack Configuration
///
/// Settings for one packaging run. Changing the sizes or fill bytes produces
/// containers that no longer byte-match legacy files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Which spatial index and container layout to produce
    pub variant: PartitionVariant,
    /// Grid cell edge length
    pub grid_cell_size: f32,
    /// Tree leaf threshold (all dimensions must be below it)
    pub tree_leaf_size: f32,
    /// Padding byte for the grid container
    pub grid_fill_byte: u8,
    /// Padding byte for the tree container
    pub tree_fill_byte: u8,
}

impl PackConfig {
    /// Create a configuration for the given variant with legacy defaults
    pub fn new(variant: PartitionVariant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }

    /// Set the partition variant
    pub fn with_variant(mut self, variant: PartitionVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the grid cell size
    pub fn with_grid_cell_size(mut self, size: f32) -> Self {
        self.grid_cell_size = size;
        self
    }

    /// Set the tree leaf threshold
    pub fn with_tree_leaf_size(mut self, size: f32) -> Self {
        self.tree_leaf_size = size;
        self
    }

    /// Padding byte for the currently selected variant
    pub fn fill_byte(&self) -> u8 {
        match self.variant {
            PartitionVariant::Grid => self.grid_fill_byte,
            PartitionVariant::Tree => self.tree_fill_byte,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid_cell_size.is_finite() || self.grid_cell_size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "grid_cell_size",
                reason: format!("must be a positive finite number, got {}", self.grid_cell_size),
            });
        }
        if !self.tree_leaf_size.is_finite() || self.tree_leaf_size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "tree_leaf_size",
                reason: format!("must be a positive finite number, got {}", self.tree_leaf_size),
            });
        }
        Ok(())
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            variant: PartitionVariant::Grid,
            grid_cell_size: DEFAULT_GRID_CELL_SIZE,
            tree_leaf_size: DEFAULT_TREE_LEAF_SIZE,
            grid_fill_byte: DEFAULT_GRID_FILL_BYTE,
            tree_fill_byte: DEFAULT_TREE_FILL_BYTE,
        }
    }
}

impl Config for PackConfig {}
