//! Binary container format
//!
//! Two layouts share their geometry sections:
//!
//! - grid container: 84-byte header with magic `wc01`, zero padding
//! - tree container: 72-byte header, padding filled with `0xCD`
//!
//! [`writer`] lays sections out and backfills the header, [`reader`] parses
//! them back, and [`compare_containers`] locates the first differing byte.

pub mod layout;
pub mod writer;
pub mod reader;
mod compare;

pub use compare::compare_containers;
pub use layout::{GridHeader, PortalRecord, Section, TreeHeader, TreeRecord};
pub use reader::{unpack, CollisionContainer, ContainerHeader};
pub use writer::{write_grid, write_tree};
