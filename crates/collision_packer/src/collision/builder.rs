//! Face/portal index builder
//!
//! Each face becomes a run in one shared point-index buffer:
//! `point_indices[start .. start + count]` are its vertices in order, and
//! `point_indices[start + count]` repeats the first vertex to close the loop.
//! The closing index is always written but is not part of `count`.

use crate::collision::{CollisionFace, Portal};
use crate::geometry::{GeometryPool, PoolIndex};
use crate::foundation::math::{Vec3, Vec4};
use crate::PackError;

/// A face as stored in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceRecord {
    /// Index into the plane pool
    pub plane_index: PoolIndex,
    /// Packed material word
    pub flags: u16,
    /// Room layer mask
    pub layer_mask: u16,
    /// Vertex count, excluding the closing index
    pub point_index_count: u16,
    /// First slot of this face's run in the point-index buffer
    pub point_index_start: u16,
}

/// Output of the builder: pools, the shared index buffer and per-face records
#[derive(Debug, Clone, Default)]
pub struct IndexedGeometry {
    /// Deduplicated points and planes
    pub pool: GeometryPool,
    /// Shared point-index buffer
    pub point_indices: Vec<PoolIndex>,
    /// One record per face (portals first when they were added first)
    pub records: Vec<FaceRecord>,
}

impl IndexedGeometry {
    /// The vertex indices of `record`, without the closing index
    pub fn point_run(&self, record: &FaceRecord) -> &[PoolIndex] {
        let start = usize::from(record.point_index_start);
        &self.point_indices[start..start + usize::from(record.point_index_count)]
    }

    /// The vertices of `record` as floats, in input order
    pub fn face_points(&self, record: &FaceRecord) -> Vec<Vec3> {
        self.point_run(record)
            .iter()
            .filter_map(|&i| self.pool.point(i))
            .collect()
    }
}

/// Builds pooled geometry and face records one face at a time
#[derive(Debug, Default)]
pub struct FaceIndexBuilder {
    geometry: IndexedGeometry,
}

impl FaceIndexBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ordinary face; `index` identifies it in errors
    pub fn add_face(&mut self, face: &CollisionFace, index: usize) -> Result<&FaceRecord, PackError> {
        face.validate(index)?;
        self.push_polygon(&face.points, &face.plane, face.material.to_bits(), face.layer_mask)
    }

    /// Add a portal as a face record (tree container only); portals carry no
    /// material, so the flag word is 0
    pub fn add_portal(&mut self, portal: &Portal, index: usize) -> Result<&FaceRecord, PackError> {
        portal.validate(index)?;
        self.push_polygon(&portal.points, &portal.plane, 0, portal.layer_mask)
    }

    /// Records added so far
    pub fn records(&self) -> &[FaceRecord] {
        &self.geometry.records
    }

    /// Finish building; the pools are immutable from here on
    pub fn finish(self) -> IndexedGeometry {
        self.geometry
    }

    fn push_polygon(
        &mut self,
        points: &[Vec3],
        plane: &Vec4,
        flags: u16,
        layer_mask: u16,
    ) -> Result<&FaceRecord, PackError> {
        let geometry = &mut self.geometry;
        if geometry.records.len() > usize::from(u16::MAX) {
            return Err(PackError::IndexOverflow { pool: "faces", size: geometry.records.len() + 1 });
        }

        let plane_index = geometry.pool.intern_plane(plane)?;
        let start = geometry.point_indices.len();
        let point_index_start = u16::try_from(start)
            .map_err(|_| PackError::IndexOverflow { pool: "point indices", size: start + 1 })?;

        for point in points {
            let index = geometry.pool.intern_point(point)?;
            geometry.point_indices.push(index);
        }
        // closing index
        geometry.point_indices.push(geometry.point_indices[start]);

        geometry.records.push(FaceRecord {
            plane_index,
            flags,
            layer_mask,
            point_index_count: points.len() as u16,
            point_index_start,
        });
        Ok(&geometry.records[geometry.records.len() - 1])
    }
}
