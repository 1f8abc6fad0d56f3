//! Packaging pipeline
//!
//! faces/portals → pools and face records → spatial index → container bytes.
//! Each run owns all of its buffers; nothing is shared between runs.

use thiserror::Error;

use crate::collision::{CollisionFace, FaceIndexBuilder, IndexedGeometry, Portal};
use crate::config::ConfigError;
use crate::core::config::{PackConfig, PartitionVariant};
use crate::format::{write_grid, write_tree, PortalRecord};
use crate::spatial::{FaceShape, GridPartition, NarrowPhaseStats, SpatialIndex, TreePartition};

/// Packaging errors
#[derive(Error, Debug)]
pub enum PackError {
    /// Vertex count outside 3..=10
    #[error("Face {face} has {vertex_count} vertices, expected 3 to 10")]
    MalformedFace {
        /// Index of the face in the input
        face: usize,
        /// Its vertex count
        vertex_count: usize,
    },

    /// Portal without exactly four points and side planes
    #[error("Portal {portal} has {point_count} points or side planes, expected 4")]
    MalformedPortal {
        /// Index of the portal in the input
        portal: usize,
        /// The offending count
        point_count: usize,
    },

    /// Portal name longer than its fixed field
    #[error("Portal {portal} {field} is {len} bytes, field holds {max}")]
    NameTooLong {
        /// Index of the portal in the input
        portal: usize,
        /// Which name field
        field: &'static str,
        /// Length of the name
        len: usize,
        /// Field width
        max: usize,
    },

    /// A pool or index buffer no longer fits its 16-bit index fields
    #[error("Too many {pool}: {size} exceeds the 16-bit index range")]
    IndexOverflow {
        /// Which pool or buffer
        pool: &'static str,
        /// Size it would have needed
        size: usize,
    },

    /// Repacked container differs from a reference
    #[error("Byte {offset:#x} in {section} differs: expected {expected:#04x}, found {actual:#04x}")]
    FormatMismatch {
        /// Section of the reference holding the byte
        section: &'static str,
        /// Absolute offset
        offset: usize,
        /// Reference byte
        expected: u8,
        /// Repacked byte
        actual: u8,
    },

    /// Repacked container has a different length than the reference
    #[error("Container is {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Reference length
        expected: usize,
        /// Repacked length
        actual: usize,
    },

    /// A section extends past the end of the buffer
    #[error("Section {section} at {offset:#x} needs {len} bytes past the end of the buffer")]
    Truncated {
        /// Section name
        section: &'static str,
        /// Offset the section starts at
        offset: usize,
        /// Bytes the section needs
        len: usize,
    },

    /// Neither container layout matches
    #[error("Unrecognised container starting with {found:02x?}")]
    BadMagic {
        /// First four bytes of the buffer
        found: [u8; 4],
    },

    /// An index in a parsed container points outside its target section
    #[error("Index {index} into {section} is out of range")]
    DanglingIndex {
        /// Target section
        section: &'static str,
        /// The index
        index: usize,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Buffer write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sizes and counters of one packaging run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackStats {
    /// Ordinary faces packed
    pub faces: usize,
    /// Portals packed
    pub portals: usize,
    /// Distinct points
    pub points: usize,
    /// Distinct planes
    pub planes: usize,
    /// Point-index buffer length, closing indices included
    pub point_indices: usize,
    /// Face-index buffer length
    pub face_indices: usize,
    /// Grid cells or tree leaves
    pub entries: usize,
    /// Tree nodes, placeholder included (0 for the grid)
    pub tree_nodes: usize,
    /// Most faces referenced by a single entry
    pub max_entry_faces: usize,
    /// Intersection counters, degenerate segments included
    pub narrow_phase: NarrowPhaseStats,
}

impl PackStats {
    fn collect(geometry: &IndexedGeometry, index: &SpatialIndex, faces: usize, portals: usize) -> Self {
        let table = index.table();
        Self {
            faces,
            portals,
            points: geometry.pool.points().len(),
            planes: geometry.pool.planes().len(),
            point_indices: geometry.point_indices.len(),
            face_indices: table.face_indices.len(),
            entries: table.entries.len(),
            tree_nodes: match index {
                SpatialIndex::Grid(_) => 0,
                SpatialIndex::Tree(tree) => tree.nodes.len(),
            },
            max_entry_faces: table
                .entries
                .iter()
                .map(|e| usize::from(e.face_index_count))
                .max()
                .unwrap_or(0),
            narrow_phase: index.stats(),
        }
    }

    /// Zero-length face edges skipped by the narrow phase
    pub fn degenerate_segments(&self) -> usize {
        self.narrow_phase.degenerate_segments
    }
}

/// Output of a packaging run: the container plus everything it was built from
#[derive(Debug, Clone)]
pub struct PackedCollision {
    /// Serialized container
    pub bytes: Vec<u8>,
    /// Pools, point-index buffer and face records
    pub geometry: IndexedGeometry,
    /// Grid or tree with its entries
    pub index: SpatialIndex,
    /// Run statistics
    pub stats: PackStats,
}

/// Packs faces and portals into a collision container
#[derive(Debug, Clone, Default)]
pub struct CollisionPacker {
    config: PackConfig,
}

impl CollisionPacker {
    /// Create a packer, validating the configuration
    pub fn new(config: PackConfig) -> Result<Self, PackError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Run the whole pipeline over one set of faces and portals
    pub fn pack(&self, faces: &[CollisionFace], portals: &[Portal]) -> Result<PackedCollision, PackError> {
        let variant = self.config.variant;
        log::info!("Packing {} faces and {} portals into a {variant} container", faces.len(), portals.len());

        let portal_records = portals
            .iter()
            .enumerate()
            .map(|(i, portal)| PortalRecord::from_portal(portal, i))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = FaceIndexBuilder::new();
        // The tree container keeps portals in the first face slots
        let first_face = match variant {
            PartitionVariant::Grid => 0,
            PartitionVariant::Tree => {
                for (i, portal) in portals.iter().enumerate() {
                    builder.add_portal(portal, i)?;
                }
                portals.len()
            }
        };
        for (i, face) in faces.iter().enumerate() {
            builder.add_face(face, i)?;
        }
        let geometry = builder.finish();
        log::debug!(
            "Pools: {} points, {} planes, {} point indices",
            geometry.pool.points().len(),
            geometry.pool.planes().len(),
            geometry.point_indices.len()
        );

        let shapes = face_shapes(&geometry, first_face)?;
        let fill = self.config.fill_byte();
        let (bytes, index) = match variant {
            PartitionVariant::Grid => {
                let grid = GridPartition::build(&shapes, self.config.grid_cell_size)?;
                let bytes = write_grid(&geometry, &grid, &portal_records, fill)?;
                (bytes, SpatialIndex::Grid(grid))
            }
            PartitionVariant::Tree => {
                let tree = TreePartition::build(&shapes, first_face, self.config.tree_leaf_size)?;
                let bytes = write_tree(&geometry, &tree, first_face, &portal_records, fill)?;
                (bytes, SpatialIndex::Tree(tree))
            }
        };

        let stats = PackStats::collect(&geometry, &index, faces.len(), portals.len());
        if stats.degenerate_segments() > 0 {
            log::warn!("Skipped {} zero-length face edges", stats.degenerate_segments());
        }
        log::info!(
            "Packed {} bytes ({} entries, {} face indices)",
            bytes.len(),
            stats.entries,
            stats.face_indices
        );

        Ok(PackedCollision { bytes, geometry, index, stats })
    }
}

/// Pack with the legacy settings of `variant` and return only the bytes
pub fn pack(faces: &[CollisionFace], portals: &[Portal], variant: PartitionVariant) -> Result<Vec<u8>, PackError> {
    let packer = CollisionPacker::new(PackConfig::new(variant))?;
    Ok(packer.pack(faces, portals)?.bytes)
}

/// Shapes of the ordinary faces, in record order
fn face_shapes(geometry: &IndexedGeometry, first_face: usize) -> Result<Vec<FaceShape>, PackError> {
    geometry.records[first_face..]
        .iter()
        .enumerate()
        .map(|(i, record)| {
            FaceShape::from_record(geometry, record)
                .ok_or(PackError::MalformedFace { face: i, vertex_count: usize::from(record.point_index_count) })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};

    fn triangle() -> CollisionFace {
        CollisionFace::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)],
            Vec4::new(0.0, 1.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PackConfig::default().with_grid_cell_size(0.0);
        assert!(matches!(CollisionPacker::new(config), Err(PackError::Config(_))));
    }

    #[test]
    fn test_stats() {
        let packer = CollisionPacker::default();
        let packed = packer.pack(&[triangle(), triangle()], &[]).unwrap();
        assert_eq!(packed.stats.faces, 2);
        assert_eq!(packed.stats.points, 3);
        assert_eq!(packed.stats.planes, 1);
        assert_eq!(packed.stats.point_indices, 8);
        assert_eq!(packed.stats.entries, 1);
        assert_eq!(packed.stats.max_entry_faces, 2);
        assert_eq!(packed.stats.tree_nodes, 0);
    }

    #[test]
    fn test_error_messages() {
        let err = PackError::MalformedFace { face: 4, vertex_count: 11 };
        assert_eq!(err.to_string(), "Face 4 has 11 vertices, expected 3 to 10");
        let err = PackError::BadMagic { found: *b"abcd" };
        assert_eq!(err.to_string(), "Unrecognised container starting with [61, 62, 63, 64]");
    }
}
