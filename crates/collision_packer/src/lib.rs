//! # Collision Packer
//!
//! Packages static collision geometry into the legacy fixed-layout room
//! collision container.
//!
//! ## Features
//!
//! - **Geometry pools**: exact-match deduplication of vertices and planes
//! - **Face index runs**: per-face `(start, count)` runs into one shared index buffer
//! - **Spatial index**: uniform 4-unit grid or longest-axis bisection tree
//! - **Byte-exact output**: offset-addressed serializer with legacy padding rules
//! - **Round-trip tooling**: reader and section-aware byte comparison
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collision_packer::prelude::*;
//!
//! fn main() -> Result<(), PackError> {
//!     let face = CollisionFace::new(
//!         vec![
//!             Vec3::new(0.0, 0.0, 0.0),
//!             Vec3::new(1.0, 0.0, 0.0),
//!             Vec3::new(0.0, 0.0, 1.0),
//!         ],
//!         Vec4::new(0.0, 1.0, 0.0, 0.0),
//!     );
//!     let bytes = pack(&[face], &[], PartitionVariant::Grid)?;
//!     assert!(bytes.starts_with(b"wc01"));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core configuration
pub mod core;

pub mod foundation;
pub mod config;
pub mod geometry;
pub mod collision;
pub mod spatial;
pub mod format;

mod packer;

#[cfg(test)]
mod tests;

pub use packer::{pack, CollisionPacker, PackError, PackStats, PackedCollision};

/// Common imports for packer users
pub mod prelude {
    pub use crate::{
        pack, CollisionPacker, PackError, PackStats, PackedCollision,
        foundation::math::{Vec3, Vec4},
        collision::{CollisionFace, CollisionFlags, Portal, SurfaceMaterial, Terrain},
        core::config::{PackConfig, PartitionVariant},
        format::{unpack, compare_containers, CollisionContainer},
        config::Config,
    };
}
