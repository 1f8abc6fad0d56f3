//! Spatial partitioning of collision faces
//!
//! Two strategies map 3D regions to the faces overlapping them. Both share
//! only the narrow-phase test in [`intersection`]; they keep no common state.
//!
//! - [`GridPartition`]: uniform cubic cells (primary container)
//! - [`TreePartition`]: longest-axis bisection down to a minimum leaf size
//!   (alternate container)

pub mod intersection;
mod grid;
mod tree;

pub use grid::{GridDimensions, GridPartition};
pub use intersection::{region_overlaps_face, FaceShape, NarrowPhaseStats, Region};
pub use tree::{TreeNode, TreePartition, LEAF_MARKER, SENTINEL_HALF_EXTENT};

use crate::PackError;

/// The spatial index built for one container
#[derive(Debug, Clone)]
pub enum SpatialIndex {
    /// Uniform grid
    Grid(GridPartition),
    /// Bisection tree
    Tree(TreePartition),
}

impl SpatialIndex {
    /// Entries and their face-index buffer
    pub fn table(&self) -> &EntryTable {
        match self {
            Self::Grid(grid) => &grid.table,
            Self::Tree(tree) => &tree.table,
        }
    }

    /// Narrow-phase counters gathered while building
    pub fn stats(&self) -> NarrowPhaseStats {
        match self {
            Self::Grid(grid) => grid.stats,
            Self::Tree(tree) => tree.stats,
        }
    }
}

/// A region's run in the shared face-index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Entry {
    /// Number of faces overlapping the region
    pub face_index_count: u16,
    /// First slot in the face-index buffer
    pub face_index_start: u16,
}

/// Face indices per region, stored as `(start, count)` runs over one buffer
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    /// Shared face-index buffer
    pub face_indices: Vec<u16>,
    /// One entry per region, in partitioner order
    pub entries: Vec<Entry>,
}

impl EntryTable {
    /// Faces of entry `entry`
    pub fn faces_of(&self, entry: &Entry) -> &[u16] {
        let start = usize::from(entry.face_index_start);
        &self.face_indices[start..start + usize::from(entry.face_index_count)]
    }

    /// Test every face against `region` and append the matches as a new entry.
    ///
    /// `first_face` offsets the recorded indices, for containers whose face
    /// array begins with portal records.
    pub(crate) fn push_region(
        &mut self,
        region: &Region,
        faces: &[FaceShape],
        first_face: usize,
        stats: &mut NarrowPhaseStats,
    ) -> Result<Entry, PackError> {
        if self.entries.len() > usize::from(u16::MAX) {
            return Err(PackError::IndexOverflow { pool: "entries", size: self.entries.len() + 1 });
        }
        let start = self.face_indices.len();
        let face_index_start = u16::try_from(start)
            .map_err(|_| PackError::IndexOverflow { pool: "face indices", size: start + 1 })?;

        for (i, face) in faces.iter().enumerate() {
            if region_overlaps_face(region, face, stats) {
                let index = first_face + i;
                let index = u16::try_from(index)
                    .map_err(|_| PackError::IndexOverflow { pool: "faces", size: index + 1 })?;
                self.face_indices.push(index);
            }
        }

        let count = self.face_indices.len() - start;
        let face_index_count = u16::try_from(count)
            .map_err(|_| PackError::IndexOverflow { pool: "face indices", size: count })?;
        let entry = Entry { face_index_count, face_index_start };
        self.entries.push(entry);
        Ok(entry)
    }
}
