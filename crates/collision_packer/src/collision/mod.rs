//! Collision input model and face index building
//!
//! Faces and portals arrive already decoded from whatever source format the
//! caller uses. [`FaceIndexBuilder`] turns them into pooled geometry plus
//! per-face [`FaceRecord`]s.

mod face;
mod material;
mod builder;

pub use builder::{FaceIndexBuilder, FaceRecord, IndexedGeometry};
pub use face::{CollisionFace, Portal, LAYER_ALWAYS_ACTIVE, MAX_FACE_VERTICES, MIN_FACE_VERTICES, PORTAL_POINT_COUNT};
pub use material::{CollisionFlags, SurfaceMaterial, Terrain};
