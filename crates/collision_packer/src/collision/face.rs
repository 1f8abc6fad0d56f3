//! Collision faces and portals as supplied by the caller

use serde::{Deserialize, Serialize};

use crate::collision::SurfaceMaterial;
use crate::foundation::math::{Vec3, Vec4};
use crate::format::layout::{PORTAL_NAME_LEN, PORTAL_NODE_NAME_LEN};
use crate::PackError;

/// Fewest vertices a face may have
pub const MIN_FACE_VERTICES: usize = 3;

/// Most vertices a face may have
pub const MAX_FACE_VERTICES: usize = 10;

/// Portals are always quadrilaterals
pub const PORTAL_POINT_COUNT: usize = 4;

/// Layer mask bit that keeps a face or portal active in every room layer
pub const LAYER_ALWAYS_ACTIVE: u16 = 0x4;

/// A convex planar collision polygon
///
/// The plane satisfies `normal · p - w = 0` for every vertex. The packer does
/// not re-derive or check it; that is the producer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionFace {
    /// Consistently wound vertices, 3 to 10 of them
    pub points: Vec<Vec3>,
    /// Unit normal in xyz, signed distance in w
    pub plane: Vec4,
    /// Physical material
    #[serde(default)]
    pub material: SurfaceMaterial,
    /// Room layers (game contexts) this face belongs to
    #[serde(default)]
    pub layer_mask: u16,
}

impl CollisionFace {
    /// Create a face with the default material and an empty layer mask
    pub fn new(points: Vec<Vec3>, plane: Vec4) -> Self {
        Self {
            points,
            plane,
            material: SurfaceMaterial::default(),
            layer_mask: 0,
        }
    }

    /// Set the material
    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }

    /// Set the layer mask
    pub fn with_layer_mask(mut self, layer_mask: u16) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    /// Check the vertex count; `index` is only used for the error
    pub fn validate(&self, index: usize) -> Result<(), PackError> {
        let count = self.points.len();
        if (MIN_FACE_VERTICES..=MAX_FACE_VERTICES).contains(&count) {
            Ok(())
        } else {
            Err(PackError::MalformedFace { face: index, vertex_count: count })
        }
    }
}

fn default_portal_layer_mask() -> u16 {
    LAYER_ALWAYS_ACTIVE
}

/// A quadrilateral boundary between two named zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    /// Portal name (at most 40 bytes)
    pub name: String,
    /// Zone on side 0 (at most 24 bytes)
    pub node_name_1: String,
    /// Zone on side 1 (at most 24 bytes)
    pub node_name_2: String,
    /// The four corners
    pub points: Vec<Vec3>,
    /// One bounding plane per side
    pub side_planes: Vec<Vec4>,
    /// Plane of the portal itself
    pub plane: Vec4,
    /// Room layers this portal belongs to
    #[serde(default = "default_portal_layer_mask")]
    pub layer_mask: u16,
    /// Two trailing bytes of the legacy record, carried through untouched
    #[serde(default)]
    pub trailing: [u8; 2],
}

impl Portal {
    /// Create a portal between two zones, named after them
    pub fn new(
        node_name_1: impl Into<String>,
        node_name_2: impl Into<String>,
        points: Vec<Vec3>,
        side_planes: Vec<Vec4>,
        plane: Vec4,
    ) -> Self {
        let node_name_1 = node_name_1.into();
        let node_name_2 = node_name_2.into();
        Self {
            name: format!("port_{node_name_1}_{node_name_2}"),
            node_name_1,
            node_name_2,
            points,
            side_planes,
            plane,
            layer_mask: LAYER_ALWAYS_ACTIVE,
            trailing: [0; 2],
        }
    }

    /// Check point/plane counts and name lengths
    pub fn validate(&self, index: usize) -> Result<(), PackError> {
        if self.points.len() != PORTAL_POINT_COUNT {
            return Err(PackError::MalformedPortal { portal: index, point_count: self.points.len() });
        }
        if self.side_planes.len() != PORTAL_POINT_COUNT {
            return Err(PackError::MalformedPortal { portal: index, point_count: self.side_planes.len() });
        }
        for (field, value, max) in [
            ("name", &self.name, PORTAL_NAME_LEN),
            ("node_name_1", &self.node_name_1, PORTAL_NODE_NAME_LEN),
            ("node_name_2", &self.node_name_2, PORTAL_NODE_NAME_LEN),
        ] {
            if value.len() > max {
                return Err(PackError::NameTooLong { portal: index, field, len: value.len(), max });
            }
        }
        Ok(())
    }
}
