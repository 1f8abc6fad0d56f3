//! Container reader
//!
//! Parses a packed buffer back into its sections. Used for round-trip checks
//! and to name the section of a byte that differs from a reference file.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::collision::{CollisionFace, FaceRecord, Portal, SurfaceMaterial};
use crate::core::config::PartitionVariant;
use crate::format::layout::{
    self, GridHeader, PortalRecord, Section, TreeHeader, TreeRecord, FACE_RECORD_SIZE, GRID_ENTRY_SIZE,
    GRID_HEADER_SIZE, GRID_MAGIC, INDEX_SIZE, PLANE_SIZE, POINT_SIZE, PORTAL_RECORD_SIZE, TREE_HEADER_SIZE,
    TREE_NODE_INDEX_SIZE, TREE_RECORD_SIZE,
};
use crate::foundation::math::Vec3;
use crate::geometry::{Aabb, FixedVec3, FixedVec4};
use crate::spatial::{Entry, GridDimensions, TreeNode};
use crate::PackError;

/// Header of either container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerHeader {
    /// Grid container
    Grid(GridHeader),
    /// Tree container
    Tree(TreeHeader),
}

/// Every section of a parsed container
#[derive(Debug, Clone)]
pub struct CollisionContainer {
    /// Parsed header
    pub header: ContainerHeader,
    /// Point pool
    pub points: Vec<FixedVec3>,
    /// Plane pool
    pub planes: Vec<FixedVec4>,
    /// Point-index buffer, closing indices included
    pub point_indices: Vec<u16>,
    /// Face records; portal faces first in a tree container
    pub faces: Vec<FaceRecord>,
    /// Face-index buffer
    pub face_indices: Vec<u16>,
    /// Per-region face runs
    pub entries: Vec<Entry>,
    /// Region of each entry (tree container only)
    pub entry_bounds: Vec<Aabb>,
    /// Owning leaf of each entry (tree container only)
    pub tree_node_indices: Vec<i32>,
    /// Tree nodes, placeholder included (tree container only)
    pub tree_nodes: Vec<TreeNode>,
    /// Portal records
    pub portals: Vec<PortalRecord>,
}

/// Parse a packed container of either kind.
///
/// Grid containers are recognised by their magic; tree containers by their
/// point section starting right after the header.
pub fn unpack(bytes: &[u8]) -> Result<CollisionContainer, PackError> {
    let magic: [u8; 4] = bytes
        .get(..4)
        .and_then(|m| m.try_into().ok())
        .ok_or(PackError::Truncated { section: "header", offset: 0, len: 4 })?;

    if magic == GRID_MAGIC {
        let header = read_header(bytes, GRID_HEADER_SIZE, GridHeader::read_from)?
            .ok_or(PackError::BadMagic { found: magic })?;
        unpack_grid(bytes, header)
    } else {
        let header = read_header(bytes, TREE_HEADER_SIZE, TreeHeader::read_from)?;
        if header.points.offset as usize != TREE_HEADER_SIZE {
            return Err(PackError::BadMagic { found: magic });
        }
        unpack_tree(bytes, header)
    }
}

fn read_header<'a, T>(
    bytes: &'a [u8],
    size: usize,
    read: impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
) -> Result<T, PackError> {
    let truncated = || PackError::Truncated { section: "header", offset: 0, len: size };
    let header = bytes.get(..size).ok_or_else(truncated)?;
    read(&mut Cursor::new(header)).map_err(|_| truncated())
}

fn unpack_grid(bytes: &[u8], header: GridHeader) -> Result<CollisionContainer, PackError> {
    let (points, planes, point_indices, faces) =
        read_geometry(bytes, header.points, header.planes, header.point_indices, header.faces)?;
    Ok(CollisionContainer {
        header: ContainerHeader::Grid(header),
        points,
        planes,
        point_indices,
        faces,
        face_indices: read_section(bytes, "face indices", header.face_indices, INDEX_SIZE, read_u16)?,
        entries: read_section(bytes, "entries", header.entries, GRID_ENTRY_SIZE, layout::read_grid_entry)?,
        entry_bounds: Vec::new(),
        tree_node_indices: Vec::new(),
        tree_nodes: Vec::new(),
        portals: read_section(bytes, "portals", header.portals, PORTAL_RECORD_SIZE, PortalRecord::read_from)?,
    })
}

fn unpack_tree(bytes: &[u8], header: TreeHeader) -> Result<CollisionContainer, PackError> {
    let (points, planes, point_indices, faces) =
        read_geometry(bytes, header.points, header.planes, header.point_indices, header.faces())?;
    let entry_records = read_section(bytes, "entries", header.entries, TREE_RECORD_SIZE, TreeRecord::read_from)?;
    let node_records = read_section(bytes, "tree nodes", header.tree_nodes, TREE_RECORD_SIZE, TreeRecord::read_from)?;

    Ok(CollisionContainer {
        header: ContainerHeader::Tree(header),
        points,
        planes,
        point_indices,
        faces,
        face_indices: read_section(bytes, "face indices", header.face_indices, INDEX_SIZE, read_u16)?,
        entries: entry_records
            .iter()
            .map(|r| Entry { face_index_count: r.left, face_index_start: r.right })
            .collect(),
        entry_bounds: entry_records.iter().map(record_bounds).collect(),
        tree_node_indices: read_section(
            bytes,
            "tree node indices",
            header.tree_node_indices,
            TREE_NODE_INDEX_SIZE,
            |r| r.read_i32::<LittleEndian>(),
        )?,
        tree_nodes: node_records
            .iter()
            .map(|r| TreeNode { bounds: record_bounds(r), left: r.left, right: r.right })
            .collect(),
        portals: read_section(bytes, "portals", header.portals, PORTAL_RECORD_SIZE, PortalRecord::read_from)?,
    })
}

type GeometrySections = (Vec<FixedVec3>, Vec<FixedVec4>, Vec<u16>, Vec<FaceRecord>);

fn read_geometry(
    bytes: &[u8],
    points: Section,
    planes: Section,
    point_indices: Section,
    faces: Section,
) -> Result<GeometrySections, PackError> {
    Ok((
        read_section(bytes, "points", points, POINT_SIZE, layout::read_fixed_vec3)?,
        read_section(bytes, "planes", planes, PLANE_SIZE, layout::read_fixed_vec4)?,
        read_section(bytes, "point indices", point_indices, INDEX_SIZE, read_u16)?,
        read_section(bytes, "faces", faces, FACE_RECORD_SIZE, layout::read_face_record)?,
    ))
}

fn read_section<'a, T>(
    bytes: &'a [u8],
    name: &'static str,
    section: Section,
    stride: usize,
    read: impl Fn(&mut Cursor<&'a [u8]>) -> io::Result<T>,
) -> Result<Vec<T>, PackError> {
    let offset = section.offset as usize;
    let count = section.count as usize;
    let len = count.saturating_mul(stride);
    let truncated = || PackError::Truncated { section: name, offset, len };
    let data = offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(truncated)?;

    let mut cursor = Cursor::new(data);
    (0..count).map(|_| read(&mut cursor).map_err(|_| truncated())).collect()
}

fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    reader.read_u16::<LittleEndian>()
}

fn record_bounds(record: &TreeRecord) -> Aabb {
    Aabb::new(record.min.to_vec3(), record.max.to_vec3())
}

impl CollisionContainer {
    /// Which partition the container holds
    pub fn variant(&self) -> PartitionVariant {
        match self.header {
            ContainerHeader::Grid(_) => PartitionVariant::Grid,
            ContainerHeader::Tree(_) => PartitionVariant::Tree,
        }
    }

    /// Index of the first ordinary face; earlier slots are portals
    pub fn first_face(&self) -> usize {
        match self.header {
            ContainerHeader::Grid(_) => 0,
            ContainerHeader::Tree(header) => usize::from(header.first_face),
        }
    }

    /// Grid shape for cells of `cell_size` (grid container only)
    pub fn grid_dimensions(&self, cell_size: f32) -> Option<GridDimensions> {
        let ContainerHeader::Grid(header) = self.header else {
            return None;
        };
        let [x, y, z] = header.parts;
        Some(GridDimensions {
            parts_x: u32::try_from(x).ok()?,
            parts_y: u32::try_from(y).ok()?,
            parts_z: u32::try_from(z).ok()?,
            min_position: header.min_position.to_vec3(),
            cell_size,
        })
    }

    /// Face indices of `entry`
    pub fn faces_of(&self, entry: &Entry) -> Option<&[u16]> {
        let start = usize::from(entry.face_index_start);
        self.face_indices.get(start..start + usize::from(entry.face_index_count))
    }

    /// Vertices of `record` as floats, closing index excluded
    pub fn face_points(&self, record: &FaceRecord) -> Result<Vec<Vec3>, PackError> {
        let start = usize::from(record.point_index_start);
        let run = self
            .point_indices
            .get(start..start + usize::from(record.point_index_count))
            .ok_or(PackError::DanglingIndex { section: "point indices", index: start })?;
        run.iter()
            .map(|&i| {
                self.points
                    .get(usize::from(i))
                    .map(|p| p.to_vec3())
                    .ok_or(PackError::DanglingIndex { section: "points", index: usize::from(i) })
            })
            .collect()
    }

    /// Ordinary faces rebuilt as input faces, in container order
    pub fn collision_faces(&self) -> Result<Vec<CollisionFace>, PackError> {
        self.faces
            .iter()
            .skip(self.first_face())
            .map(|record| {
                let plane = self
                    .planes
                    .get(usize::from(record.plane_index))
                    .ok_or(PackError::DanglingIndex { section: "planes", index: usize::from(record.plane_index) })?;
                Ok(CollisionFace {
                    points: self.face_points(record)?,
                    plane: plane.to_vec4(),
                    material: SurfaceMaterial::from_bits(record.flags),
                    layer_mask: record.layer_mask,
                })
            })
            .collect()
    }

    /// Portals rebuilt as input portals
    pub fn collision_portals(&self) -> Vec<Portal> {
        self.portals.iter().map(PortalRecord::to_portal).collect()
    }

    /// Name and start offset of every section, in file order
    pub fn sections(&self) -> Vec<(&'static str, u32)> {
        match self.header {
            ContainerHeader::Grid(h) => vec![
                ("header", 0),
                ("points", h.points.offset),
                ("planes", h.planes.offset),
                ("point indices", h.point_indices.offset),
                ("faces", h.faces.offset),
                ("face indices", h.face_indices.offset),
                ("entries", h.entries.offset),
                ("portals", h.portals.offset),
            ],
            ContainerHeader::Tree(h) => vec![
                ("header", 0),
                ("points", h.points.offset),
                ("planes", h.planes.offset),
                ("point indices", h.point_indices.offset),
                ("faces", h.face_offset),
                ("face indices", h.face_indices.offset),
                ("entries", h.entries.offset),
                ("tree node indices", h.tree_node_indices.offset),
                ("tree nodes", h.tree_nodes.offset),
                ("portals", h.portals.offset),
            ],
        }
    }

    /// Section holding byte `offset`; padding belongs to the section before it
    pub fn section_at(&self, offset: usize) -> &'static str {
        self.sections()
            .into_iter()
            .filter(|&(_, start)| start as usize <= offset)
            .last()
            .map_or("header", |(name, _)| name)
    }
}
