//! Geometry primitives and the deduplicating geometry pool
//!
//! - [`fixed`]: 20.12 fixed-point conversion used by the container
//! - [`Aabb`]: axis-aligned boxes for regions and face bounds
//! - [`Segment`] / [`Triangle`]: narrow-phase primitives
//! - [`GeometryPool`]: exact-match point and plane pools

pub mod fixed;
mod aabb;
mod primitives;
mod pool;

pub use aabb::Aabb;
pub use fixed::{FixedVec3, FixedVec4};
pub use pool::{GeometryPool, PoolIndex};
pub use primitives::{fan_triangles, Segment, Triangle};
