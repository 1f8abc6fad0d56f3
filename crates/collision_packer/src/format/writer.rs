//! Container serializer
//!
//! Sections are written in a fixed order after a reserved header area. Each
//! section starts on a 4-byte boundary; the gap is filled with the
//! container's fill byte. The header is written last, once every offset is
//! known.

use std::io::{self, Cursor, Seek, SeekFrom};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::collision::IndexedGeometry;
use crate::format::layout::{
    self, GridHeader, PortalRecord, Section, TreeHeader, TreeRecord, GRID_HEADER_SIZE, SECTION_ALIGN,
    TREE_HEADER_SIZE,
};
use crate::geometry::FixedVec3;
use crate::spatial::{GridPartition, TreePartition};
use crate::PackError;

/// Sections shared by both containers, in write order
struct GeometrySections {
    points: Section,
    planes: Section,
    point_indices: Section,
    faces: Section,
}

struct SectionWriter {
    cursor: Cursor<Vec<u8>>,
    fill: u8,
}

impl SectionWriter {
    fn new(header_size: usize, fill: u8) -> Self {
        let mut cursor = Cursor::new(Vec::new());
        cursor.set_position(header_size as u64);
        Self { cursor, fill }
    }

    /// Pad to the next boundary and open a section of `count` elements
    fn begin(&mut self, name: &'static str, count: usize) -> Result<Section, PackError> {
        self.align()?;
        let position = self.cursor.position();
        let offset = u32::try_from(position)
            .map_err(|_| PackError::IndexOverflow { pool: "container bytes", size: position as usize })?;
        let count = u32::try_from(count).map_err(|_| PackError::IndexOverflow { pool: name, size: count })?;
        log::trace!("Section {name}: {count} at {offset:#x}");
        Ok(Section { count, offset })
    }

    fn align(&mut self) -> io::Result<()> {
        while self.cursor.position() % SECTION_ALIGN as u64 != 0 {
            self.cursor.write_u8(self.fill)?;
        }
        Ok(())
    }

    fn write_indices(&mut self, name: &'static str, indices: &[u16]) -> Result<Section, PackError> {
        let section = self.begin(name, indices.len())?;
        for &index in indices {
            self.cursor.write_u16::<LittleEndian>(index)?;
        }
        Ok(section)
    }

    fn write_geometry(&mut self, geometry: &IndexedGeometry) -> Result<GeometrySections, PackError> {
        let points = self.begin("points", geometry.pool.points().len())?;
        for point in geometry.pool.points() {
            layout::write_fixed_vec3(&mut self.cursor, point)?;
        }

        let planes = self.begin("planes", geometry.pool.planes().len())?;
        for plane in geometry.pool.planes() {
            layout::write_fixed_vec4(&mut self.cursor, plane)?;
        }

        let point_indices = self.write_indices("point indices", &geometry.point_indices)?;

        let faces = self.begin("faces", geometry.records.len())?;
        for record in &geometry.records {
            layout::write_face_record(&mut self.cursor, record)?;
        }

        Ok(GeometrySections { points, planes, point_indices, faces })
    }

    fn write_portals(&mut self, portals: &[PortalRecord]) -> Result<Section, PackError> {
        let section = self.begin("portals", portals.len())?;
        for portal in portals {
            portal.write_to(&mut self.cursor)?;
        }
        Ok(section)
    }

    /// Write the header at offset 0 and hand back the buffer
    fn finish<F>(mut self, write_header: F) -> Result<Vec<u8>, PackError>
    where
        F: FnOnce(&mut Cursor<Vec<u8>>) -> io::Result<()>,
    {
        self.cursor.seek(SeekFrom::Start(0))?;
        write_header(&mut self.cursor)?;
        Ok(self.cursor.into_inner())
    }
}

/// Serialize a grid container
///
/// Section order: points, planes, point indices, faces, face indices,
/// entries, portals.
pub fn write_grid(
    geometry: &IndexedGeometry,
    grid: &GridPartition,
    portals: &[PortalRecord],
    fill: u8,
) -> Result<Vec<u8>, PackError> {
    let mut writer = SectionWriter::new(GRID_HEADER_SIZE, fill);
    let sections = writer.write_geometry(geometry)?;
    let face_indices = writer.write_indices("face indices", &grid.table.face_indices)?;

    let entries = writer.begin("entries", grid.table.entries.len())?;
    for entry in &grid.table.entries {
        layout::write_grid_entry(&mut writer.cursor, entry)?;
    }

    let portals = writer.write_portals(portals)?;

    let dims = &grid.dims;
    let part = |count: u32| {
        i32::try_from(count).map_err(|_| PackError::IndexOverflow { pool: "grid cells", size: count as usize })
    };
    let header = GridHeader {
        points: sections.points,
        planes: sections.planes,
        point_indices: sections.point_indices,
        faces: sections.faces,
        face_indices,
        parts: [part(dims.parts_x)?, part(dims.parts_y)?, part(dims.parts_z)?],
        min_position: FixedVec3::from_vec3(&dims.min_position),
        entries,
        portals,
    };
    writer.finish(|cursor| header.write_to(cursor))
}

/// Serialize a tree container
///
/// `geometry` holds the portal faces first, `first_face` of them. Section
/// order: points, planes, point indices, faces, face indices, entries,
/// tree-node index, tree nodes, portals.
pub fn write_tree(
    geometry: &IndexedGeometry,
    tree: &TreePartition,
    first_face: usize,
    portals: &[PortalRecord],
    fill: u8,
) -> Result<Vec<u8>, PackError> {
    let face_count = u16::try_from(geometry.records.len())
        .map_err(|_| PackError::IndexOverflow { pool: "faces", size: geometry.records.len() })?;
    let first_face =
        u16::try_from(first_face).map_err(|_| PackError::IndexOverflow { pool: "portals", size: first_face })?;

    let mut writer = SectionWriter::new(TREE_HEADER_SIZE, fill);
    let sections = writer.write_geometry(geometry)?;
    let face_indices = writer.write_indices("face indices", &tree.table.face_indices)?;

    let entries = writer.begin("entries", tree.table.entries.len())?;
    for (entry, &leaf) in tree.table.entries.iter().zip(&tree.leaf_nodes) {
        let bounds = tree.nodes[usize::from(leaf)].bounds;
        let record = TreeRecord {
            min: FixedVec3::from_vec3(&bounds.min),
            max: FixedVec3::from_vec3(&bounds.max),
            left: entry.face_index_count,
            right: entry.face_index_start,
        };
        record.write_to(&mut writer.cursor)?;
    }

    let tree_node_indices = writer.begin("tree node indices", tree.leaf_nodes.len())?;
    for &leaf in &tree.leaf_nodes {
        writer.cursor.write_i32::<LittleEndian>(i32::from(leaf))?;
    }

    let tree_nodes = writer.begin("tree nodes", tree.nodes.len())?;
    for node in &tree.nodes {
        let record = TreeRecord {
            min: FixedVec3::from_vec3(&node.bounds.min),
            max: FixedVec3::from_vec3(&node.bounds.max),
            left: node.left,
            right: node.right,
        };
        record.write_to(&mut writer.cursor)?;
    }

    let portals = writer.write_portals(portals)?;

    let header = TreeHeader {
        points: sections.points,
        planes: sections.planes,
        point_indices: sections.point_indices,
        face_count,
        first_face,
        face_offset: sections.faces.offset,
        face_indices,
        entries,
        tree_node_indices,
        tree_nodes,
        portals,
    };
    writer.finish(|cursor| header.write_to(cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionFace, FaceIndexBuilder};
    use crate::foundation::math::{Vec3, Vec4};
    use crate::format::layout::{FACE_RECORD_SIZE, PLANE_SIZE, POINT_SIZE};
    use crate::spatial::FaceShape;

    fn triangle_geometry() -> IndexedGeometry {
        let face = CollisionFace::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)],
            Vec4::new(0.0, 1.0, 0.0, 0.0),
        );
        let mut builder = FaceIndexBuilder::new();
        builder.add_face(&face, 0).unwrap();
        builder.finish()
    }

    fn shapes(geometry: &IndexedGeometry) -> Vec<FaceShape> {
        geometry.records.iter().filter_map(|r| FaceShape::from_record(geometry, r)).collect()
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    #[test]
    fn test_grid_offsets_and_padding() {
        let geometry = triangle_geometry();
        let grid = GridPartition::build(&shapes(&geometry), 4.0).unwrap();
        let bytes = write_grid(&geometry, &grid, &[], 0).unwrap();

        let points_at = GRID_HEADER_SIZE;
        let planes_at = points_at + 3 * POINT_SIZE;
        let indices_at = planes_at + PLANE_SIZE;
        // 4 indices = 8 bytes, already aligned
        let faces_at = indices_at + 8;
        let face_indices_at = faces_at + FACE_RECORD_SIZE;
        // 1 face index = 2 bytes + 2 padding
        let entries_at = face_indices_at + 4;
        let portals_at = entries_at + 4;

        assert_eq!(&bytes[..4], b"wc01");
        assert_eq!(u32_at(&bytes, 8), points_at as u32);
        assert_eq!(u32_at(&bytes, 16), planes_at as u32);
        assert_eq!(u32_at(&bytes, 24), indices_at as u32);
        assert_eq!(u32_at(&bytes, 32), faces_at as u32);
        assert_eq!(u32_at(&bytes, 40), face_indices_at as u32);
        assert_eq!(u32_at(&bytes, 68), 1);
        assert_eq!(u32_at(&bytes, 72), entries_at as u32);
        assert_eq!(u32_at(&bytes, 76), 0);
        assert_eq!(u32_at(&bytes, 80), portals_at as u32);
        assert_eq!(bytes.len(), portals_at);
        assert_eq!(&bytes[face_indices_at..face_indices_at + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_tree_padding_uses_fill_byte() {
        let geometry = triangle_geometry();
        let tree = TreePartition::build(&shapes(&geometry), 0, 8.0).unwrap();
        let bytes = write_tree(&geometry, &tree, 0, &[], 0xCD).unwrap();

        let face_indices_at = u32_at(&bytes, 36) as usize;
        assert_eq!(&bytes[face_indices_at..face_indices_at + 4], &[0, 0, 0xCD, 0xCD]);
        assert_eq!(u32_at(&bytes, 0), 3);
        assert_eq!(u32_at(&bytes, 4), TREE_HEADER_SIZE as u32);
        assert_eq!(u16::from_le_bytes([bytes[24], bytes[25]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[26], bytes[27]]), 0);
        // two nodes: placeholder and root leaf
        assert_eq!(u32_at(&bytes, 56), 2);
    }
}
