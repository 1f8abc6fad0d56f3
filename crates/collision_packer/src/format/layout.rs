//! Record sizes, headers and primitive codecs of the container
//!
//! All integers are little-endian. Coordinates are 20.12 fixed point.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::collision::{FaceRecord, Portal, PORTAL_POINT_COUNT};
use crate::geometry::{FixedVec3, FixedVec4};
use crate::spatial::Entry;
use crate::PackError;

/// Magic at the start of a grid container
pub const GRID_MAGIC: [u8; 4] = *b"wc01";

/// Grid container header size
pub const GRID_HEADER_SIZE: usize = 84;
/// Tree container header size
pub const TREE_HEADER_SIZE: usize = 72;

/// Fixed-point `Vec3`
pub const POINT_SIZE: usize = 12;
/// Fixed-point plane
pub const PLANE_SIZE: usize = 16;
/// `u16` index
pub const INDEX_SIZE: usize = 2;
/// Face record stride
pub const FACE_RECORD_SIZE: usize = 16;
/// Grid entry stride
pub const GRID_ENTRY_SIZE: usize = 4;
/// Tree node and tree entry stride
pub const TREE_RECORD_SIZE: usize = 28;
/// Tree-node index stride
pub const TREE_NODE_INDEX_SIZE: usize = 4;
/// Portal record stride
pub const PORTAL_RECORD_SIZE: usize = 224;

/// Portal name field width
pub const PORTAL_NAME_LEN: usize = 40;
/// Portal zone name field width
pub const PORTAL_NODE_NAME_LEN: usize = 24;

/// Section boundaries fall on multiples of this
pub const SECTION_ALIGN: usize = 4;

/// Element count and absolute offset of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Section {
    /// Number of elements
    pub count: u32,
    /// Absolute byte offset
    pub offset: u32,
}

impl Section {
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let count = reader.read_u32::<LittleEndian>()?;
        let offset = reader.read_u32::<LittleEndian>()?;
        Ok(Self { count, offset })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.count)?;
        writer.write_u32::<LittleEndian>(self.offset)
    }
}

/// Header of the grid container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridHeader {
    /// Point pool
    pub points: Section,
    /// Plane pool
    pub planes: Section,
    /// Point-index buffer
    pub point_indices: Section,
    /// Face records
    pub faces: Section,
    /// Face-index buffer
    pub face_indices: Section,
    /// Cells along x, y and z
    pub parts: [i32; 3],
    /// Minimum corner of the grid
    pub min_position: FixedVec3,
    /// One entry per cell
    pub entries: Section,
    /// Portal records
    pub portals: Section,
}

impl GridHeader {
    /// Read a header, magic included; `None` when the magic does not match
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != GRID_MAGIC {
            return Ok(None);
        }
        let points = Section::read_from(reader)?;
        let planes = Section::read_from(reader)?;
        let point_indices = Section::read_from(reader)?;
        let faces = Section::read_from(reader)?;
        let face_indices = Section::read_from(reader)?;
        let mut parts = [0i32; 3];
        reader.read_i32_into::<LittleEndian>(&mut parts)?;
        let min_position = read_fixed_vec3(reader)?;
        let entries = Section::read_from(reader)?;
        let portals = Section::read_from(reader)?;
        Ok(Some(Self { points, planes, point_indices, faces, face_indices, parts, min_position, entries, portals }))
    }

    /// Write the header, magic included
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&GRID_MAGIC)?;
        self.points.write_to(writer)?;
        self.planes.write_to(writer)?;
        self.point_indices.write_to(writer)?;
        self.faces.write_to(writer)?;
        self.face_indices.write_to(writer)?;
        for part in self.parts {
            writer.write_i32::<LittleEndian>(part)?;
        }
        write_fixed_vec3(writer, &self.min_position)?;
        self.entries.write_to(writer)?;
        self.portals.write_to(writer)
    }
}

/// Header of the tree container
///
/// The face section is counted with 16-bit fields and carries the index of
/// the first ordinary face; the slots before it are portals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeHeader {
    /// Point pool
    pub points: Section,
    /// Plane pool
    pub planes: Section,
    /// Point-index buffer
    pub point_indices: Section,
    /// Face records, portals included
    pub face_count: u16,
    /// Index of the first non-portal face
    pub first_face: u16,
    /// Offset of the face records
    pub face_offset: u32,
    /// Face-index buffer
    pub face_indices: Section,
    /// One entry per leaf
    pub entries: Section,
    /// Owning leaf of each entry
    pub tree_node_indices: Section,
    /// Tree nodes, placeholder included
    pub tree_nodes: Section,
    /// Portal records
    pub portals: Section,
}

impl TreeHeader {
    /// Read a header
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let points = Section::read_from(reader)?;
        let planes = Section::read_from(reader)?;
        let point_indices = Section::read_from(reader)?;
        let face_count = reader.read_u16::<LittleEndian>()?;
        let first_face = reader.read_u16::<LittleEndian>()?;
        let face_offset = reader.read_u32::<LittleEndian>()?;
        Ok(Self {
            points,
            planes,
            point_indices,
            face_count,
            first_face,
            face_offset,
            face_indices: Section::read_from(reader)?,
            entries: Section::read_from(reader)?,
            tree_node_indices: Section::read_from(reader)?,
            tree_nodes: Section::read_from(reader)?,
            portals: Section::read_from(reader)?,
        })
    }

    /// Write the header
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.points.write_to(writer)?;
        self.planes.write_to(writer)?;
        self.point_indices.write_to(writer)?;
        writer.write_u16::<LittleEndian>(self.face_count)?;
        writer.write_u16::<LittleEndian>(self.first_face)?;
        writer.write_u32::<LittleEndian>(self.face_offset)?;
        self.face_indices.write_to(writer)?;
        self.entries.write_to(writer)?;
        self.tree_node_indices.write_to(writer)?;
        self.tree_nodes.write_to(writer)?;
        self.portals.write_to(writer)
    }

    /// Face records as a section
    pub fn faces(&self) -> Section {
        Section { count: u32::from(self.face_count), offset: self.face_offset }
    }
}

/// `{min, max, left, right}`, shared by tree nodes and tree entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeRecord {
    /// Minimum corner
    pub min: FixedVec3,
    /// Maximum corner
    pub max: FixedVec3,
    /// Left child, entry index, or face count
    pub left: u16,
    /// Right child, leaf marker, or face start
    pub right: u16,
}

impl TreeRecord {
    /// Read one record
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let min = read_fixed_vec3(reader)?;
        let max = read_fixed_vec3(reader)?;
        let left = reader.read_u16::<LittleEndian>()?;
        let right = reader.read_u16::<LittleEndian>()?;
        Ok(Self { min, max, left, right })
    }

    /// Write one record
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_fixed_vec3(writer, &self.min)?;
        write_fixed_vec3(writer, &self.max)?;
        writer.write_u16::<LittleEndian>(self.left)?;
        writer.write_u16::<LittleEndian>(self.right)
    }
}

/// A portal record with its fields still in container form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRecord {
    /// NUL-padded name
    pub name: [u8; PORTAL_NAME_LEN],
    /// NUL-padded zone name, side 0
    pub node_name_1: [u8; PORTAL_NODE_NAME_LEN],
    /// NUL-padded zone name, side 1
    pub node_name_2: [u8; PORTAL_NODE_NAME_LEN],
    /// Corners
    pub points: [FixedVec3; 4],
    /// Side planes
    pub side_planes: [FixedVec4; 4],
    /// Portal plane
    pub plane: FixedVec4,
    /// Flags; always written as 0
    pub flags: u16,
    /// Layer mask
    pub layer_mask: u16,
    /// Always 4
    pub point_count: u16,
    /// Unused trailing bytes
    pub trailing: [u8; 2],
}

impl PortalRecord {
    /// Read one record
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut name = [0u8; PORTAL_NAME_LEN];
        let mut node_name_1 = [0u8; PORTAL_NODE_NAME_LEN];
        let mut node_name_2 = [0u8; PORTAL_NODE_NAME_LEN];
        reader.read_exact(&mut name)?;
        reader.read_exact(&mut node_name_1)?;
        reader.read_exact(&mut node_name_2)?;
        let mut points = [FixedVec3::default(); 4];
        for point in &mut points {
            *point = read_fixed_vec3(reader)?;
        }
        let mut side_planes = [FixedVec4::default(); 4];
        for plane in &mut side_planes {
            *plane = read_fixed_vec4(reader)?;
        }
        let plane = read_fixed_vec4(reader)?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let layer_mask = reader.read_u16::<LittleEndian>()?;
        let point_count = reader.read_u16::<LittleEndian>()?;
        let mut trailing = [0u8; 2];
        reader.read_exact(&mut trailing)?;
        Ok(Self {
            name,
            node_name_1,
            node_name_2,
            points,
            side_planes,
            plane,
            flags,
            layer_mask,
            point_count,
            trailing,
        })
    }

    /// Write one record
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.name)?;
        writer.write_all(&self.node_name_1)?;
        writer.write_all(&self.node_name_2)?;
        for point in &self.points {
            write_fixed_vec3(writer, point)?;
        }
        for plane in &self.side_planes {
            write_fixed_vec4(writer, plane)?;
        }
        write_fixed_vec4(writer, &self.plane)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.layer_mask)?;
        writer.write_u16::<LittleEndian>(self.point_count)?;
        writer.write_all(&self.trailing)
    }
}

impl PortalRecord {
    /// Quantize a portal, checking its shape and name lengths first
    pub fn from_portal(portal: &Portal, index: usize) -> Result<Self, PackError> {
        portal.validate(index)?;
        let malformed = || PackError::MalformedPortal { portal: index, point_count: portal.points.len() };
        let points: [FixedVec3; PORTAL_POINT_COUNT] = portal
            .points
            .iter()
            .map(FixedVec3::from_vec3)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| malformed())?;
        let side_planes: [FixedVec4; PORTAL_POINT_COUNT] = portal
            .side_planes
            .iter()
            .map(FixedVec4::from_vec4)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| malformed())?;
        Ok(Self {
            name: encode_name(&portal.name),
            node_name_1: encode_name(&portal.node_name_1),
            node_name_2: encode_name(&portal.node_name_2),
            points,
            side_planes,
            plane: FixedVec4::from_vec4(&portal.plane),
            flags: 0,
            layer_mask: portal.layer_mask,
            point_count: PORTAL_POINT_COUNT as u16,
            trailing: portal.trailing,
        })
    }

    /// Expand back into a [`Portal`]
    pub fn to_portal(&self) -> Portal {
        Portal {
            name: decode_name(&self.name),
            node_name_1: decode_name(&self.node_name_1),
            node_name_2: decode_name(&self.node_name_2),
            points: self.points.iter().map(|p| p.to_vec3()).collect(),
            side_planes: self.side_planes.iter().map(|p| p.to_vec4()).collect(),
            plane: self.plane.to_vec4(),
            layer_mask: self.layer_mask,
            trailing: self.trailing,
        }
    }
}

/// Read a fixed-point `Vec3`
pub fn read_fixed_vec3<R: Read>(reader: &mut R) -> io::Result<FixedVec3> {
    let mut v = [0i32; 3];
    reader.read_i32_into::<LittleEndian>(&mut v)?;
    Ok(FixedVec3(v))
}

/// Write a fixed-point `Vec3`
pub fn write_fixed_vec3<W: Write>(writer: &mut W, v: &FixedVec3) -> io::Result<()> {
    for c in v.0 {
        writer.write_i32::<LittleEndian>(c)?;
    }
    Ok(())
}

/// Read a fixed-point plane
pub fn read_fixed_vec4<R: Read>(reader: &mut R) -> io::Result<FixedVec4> {
    let mut v = [0i32; 4];
    reader.read_i32_into::<LittleEndian>(&mut v)?;
    Ok(FixedVec4(v))
}

/// Write a fixed-point plane
pub fn write_fixed_vec4<W: Write>(writer: &mut W, v: &FixedVec4) -> io::Result<()> {
    for c in v.0 {
        writer.write_i32::<LittleEndian>(c)?;
    }
    Ok(())
}

/// Read a face record; the runtime counter is discarded
pub fn read_face_record<R: Read>(reader: &mut R) -> io::Result<FaceRecord> {
    let _counter = reader.read_u32::<LittleEndian>()?;
    let plane_index = reader.read_u16::<LittleEndian>()?;
    let flags = reader.read_u16::<LittleEndian>()?;
    let layer_mask = reader.read_u16::<LittleEndian>()?;
    let _padding = reader.read_u16::<LittleEndian>()?;
    let point_index_count = reader.read_u16::<LittleEndian>()?;
    let point_index_start = reader.read_u16::<LittleEndian>()?;
    Ok(FaceRecord { plane_index, flags, layer_mask, point_index_count, point_index_start })
}

/// Write a face record with a zeroed runtime counter
pub fn write_face_record<W: Write>(writer: &mut W, record: &FaceRecord) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(0)?;
    writer.write_u16::<LittleEndian>(record.plane_index)?;
    writer.write_u16::<LittleEndian>(record.flags)?;
    writer.write_u16::<LittleEndian>(record.layer_mask)?;
    writer.write_u16::<LittleEndian>(0)?;
    writer.write_u16::<LittleEndian>(record.point_index_count)?;
    writer.write_u16::<LittleEndian>(record.point_index_start)
}

/// Read a grid entry
pub fn read_grid_entry<R: Read>(reader: &mut R) -> io::Result<Entry> {
    let face_index_count = reader.read_u16::<LittleEndian>()?;
    let face_index_start = reader.read_u16::<LittleEndian>()?;
    Ok(Entry { face_index_count, face_index_start })
}

/// Write a grid entry
pub fn write_grid_entry<W: Write>(writer: &mut W, entry: &Entry) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(entry.face_index_count)?;
    writer.write_u16::<LittleEndian>(entry.face_index_start)
}

/// Copy `name` into a NUL-padded field; the caller has checked the length
pub fn encode_name<const N: usize>(name: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let bytes = name.as_bytes();
    let len = bytes.len().min(N);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Text of a NUL-padded field, up to the first NUL
pub fn decode_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_sizes() {
        let mut grid = Vec::new();
        GridHeader::default().write_to(&mut grid).unwrap();
        assert_eq!(grid.len(), GRID_HEADER_SIZE);

        let mut tree = Vec::new();
        TreeHeader::default().write_to(&mut tree).unwrap();
        assert_eq!(tree.len(), TREE_HEADER_SIZE);
    }

    #[test]
    fn test_record_sizes() {
        let mut buf = Vec::new();
        write_face_record(&mut buf, &FaceRecord::default()).unwrap();
        assert_eq!(buf.len(), FACE_RECORD_SIZE);

        let mut buf = Vec::new();
        TreeRecord::default().write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), TREE_RECORD_SIZE);

        let portal = PortalRecord {
            name: encode_name("port_a_b"),
            node_name_1: encode_name("a"),
            node_name_2: encode_name("b"),
            points: [FixedVec3::default(); 4],
            side_planes: [FixedVec4::default(); 4],
            plane: FixedVec4::default(),
            flags: 0,
            layer_mask: 4,
            point_count: 4,
            trailing: [0; 2],
        };
        let mut buf = Vec::new();
        portal.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), PORTAL_RECORD_SIZE);
        assert_eq!(&buf[..9], b"port_a_b\0");
        assert_eq!(PortalRecord::read_from(&mut Cursor::new(&buf)).unwrap(), portal);
    }

    #[test]
    fn test_grid_header_layout() {
        let header = GridHeader {
            points: Section { count: 3, offset: 84 },
            parts: [10, 1, 2],
            min_position: FixedVec3([4096, -8192, 0]),
            ..GridHeader::default()
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(&buf[0..4], b"wc01");
        assert_eq!(&buf[4..8], &3u32.to_le_bytes());
        assert_eq!(&buf[8..12], &84u32.to_le_bytes());
        assert_eq!(&buf[44..48], &10i32.to_le_bytes());
        assert_eq!(&buf[60..64], &(-8192i32).to_le_bytes());

        let parsed = GridHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed, Some(header));
    }

    #[test]
    fn test_wrong_magic() {
        let buf = [0u8; GRID_HEADER_SIZE];
        assert_eq!(GridHeader::read_from(&mut Cursor::new(&buf[..])).unwrap(), None);
    }

    #[test]
    fn test_face_record_layout() {
        let record = FaceRecord {
            plane_index: 2,
            flags: 0x2001,
            layer_mask: 0x4,
            point_index_count: 3,
            point_index_start: 8,
        };
        let mut buf = Vec::new();
        write_face_record(&mut buf, &record).unwrap();
        assert_eq!(buf, [0, 0, 0, 0, 2, 0, 0x01, 0x20, 4, 0, 0, 0, 3, 0, 8, 0]);
        assert_eq!(read_face_record(&mut Cursor::new(&buf)).unwrap(), record);
    }

    #[test]
    fn test_portal_record_conversion() {
        use crate::foundation::math::{Vec3, Vec4};

        let mut portal = Portal::new(
            "rmMain",
            "rmHall",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 4.0, 0.0),
                Vec3::new(0.0, 4.0, 4.0),
                Vec3::new(0.0, 0.0, 4.0),
            ],
            vec![Vec4::new(0.0, 0.0, 1.0, 0.5); 4],
            Vec4::new(1.0, 0.0, 0.0, 0.0),
        );
        portal.trailing = [0xAB, 0xCD];
        let record = PortalRecord::from_portal(&portal, 0).unwrap();
        assert_eq!(record.point_count, 4);
        assert_eq!(record.points[1], FixedVec3([0, 4 * 4096, 0]));
        assert_eq!(record.to_portal(), portal);

        // flags word at 216 is always zero, layer mask follows it
        let mut buf = Vec::new();
        record.write_to(&mut buf).unwrap();
        assert_eq!(&buf[216..220], &[0, 0, 0x04, 0x00]);
        assert_eq!(&buf[222..], &[0xAB, 0xCD]);

        portal.side_planes.pop();
        assert!(matches!(
            PortalRecord::from_portal(&portal, 2),
            Err(PackError::MalformedPortal { portal: 2, .. })
        ));
    }

    #[test]
    fn test_names() {
        let field: [u8; 8] = encode_name("rmMain");
        assert_eq!(&field, b"rmMain\0\0");
        assert_eq!(decode_name(&field), "rmMain");
        assert_eq!(decode_name(b"full"), "full");
    }
}
