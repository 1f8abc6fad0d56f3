//! Scene files: the faces and portals of one room, plus optional settings

use collision_packer::prelude::*;
use serde::{Deserialize, Serialize};

/// One room's collision input, loaded from RON or TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Packer settings; legacy grid defaults when absent
    pub config: Option<PackConfig>,
    /// Collision faces in output order
    pub faces: Vec<CollisionFace>,
    /// Portals in output order
    pub portals: Vec<Portal>,
}

impl Config for Scene {}

impl Scene {
    /// Settings to pack with: the scene's own, then the override variant if any
    pub fn pack_config(&self, variant: Option<PartitionVariant>) -> PackConfig {
        let config = self.config.clone().unwrap_or_default();
        match variant {
            Some(variant) => config.with_variant(variant),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"(
        config: Some((variant: Tree)),
        faces: [
            (
                points: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
                plane: [0.0, 1.0, 0.0, 0.0],
                layer_mask: 4,
            ),
        ],
    )"#;

    #[test]
    fn test_load_ron_scene() {
        let scene = Scene::from_str_with_format(SCENE, "room.ron").unwrap();
        assert_eq!(scene.faces.len(), 1);
        assert!(scene.portals.is_empty());
        assert_eq!(scene.pack_config(None).variant, PartitionVariant::Tree);
        assert_eq!(scene.pack_config(Some(PartitionVariant::Grid)).variant, PartitionVariant::Grid);
    }
}
