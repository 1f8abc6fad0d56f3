//! Uniform grid partition (primary container)
//!
//! Cells are cubes of one edge length anchored at the minimum corner of the
//! geometry's bounds. Entries are stored y-major, then z, then x:
//! `index = y * parts_x * parts_z + z * parts_x + x`.

use crate::foundation::math::Vec3;
use crate::geometry::Aabb;
use crate::spatial::{EntryTable, FaceShape, NarrowPhaseStats, Region};
use crate::PackError;

/// Cell counts and anchor of a grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDimensions {
    /// Cells along x
    pub parts_x: u32,
    /// Cells along y
    pub parts_y: u32,
    /// Cells along z
    pub parts_z: u32,
    /// Minimum corner of cell (0, 0, 0)
    pub min_position: Vec3,
    /// Cell edge length
    pub cell_size: f32,
}

impl GridDimensions {
    /// Smallest grid anchored at `bounds.min` whose far edge lies strictly
    /// beyond `bounds.max` on every axis
    pub fn covering(bounds: &Aabb, cell_size: f32) -> Self {
        let parts = |axis: usize| {
            let mut count = 1u32;
            while bounds.min[axis] + count as f32 * cell_size <= bounds.max[axis] {
                count += 1;
            }
            count
        };
        Self {
            parts_x: parts(0),
            parts_y: parts(1),
            parts_z: parts(2),
            min_position: bounds.min,
            cell_size,
        }
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.parts_x as usize * self.parts_y as usize * self.parts_z as usize
    }

    /// Linear entry index of cell `(x, y, z)`
    pub fn linear_index(&self, x: u32, y: u32, z: u32) -> usize {
        let (px, pz) = (self.parts_x as usize, self.parts_z as usize);
        y as usize * px * pz + z as usize * px + x as usize
    }

    /// Cell coordinates `(x, y, z)` of entry `index`, `None` past the last cell
    pub fn cell_for_entry(&self, index: usize) -> Option<(u32, u32, u32)> {
        if index >= self.cell_count() {
            return None;
        }
        let px = self.parts_x as usize;
        let xz = px * self.parts_z as usize;
        let y = index / xz;
        let z = (index - y * xz) / px;
        let x = index - y * xz - z * px;
        Some((x as u32, y as u32, z as u32))
    }

    /// Entry index of the cell containing `point`, `None` outside the grid
    pub fn entry_index_for_point(&self, point: &Vec3) -> Option<usize> {
        let offset = point - self.min_position;
        if offset.iter().any(|&d| d < 0.0) {
            return None;
        }
        let cell = |d: f32| (d / self.cell_size) as u32;
        let (x, y, z) = (cell(offset.x), cell(offset.y), cell(offset.z));
        if x >= self.parts_x || y >= self.parts_y || z >= self.parts_z {
            return None;
        }
        Some(self.linear_index(x, y, z))
    }

    /// Box of cell `(x, y, z)`
    pub fn cell_box(&self, x: u32, y: u32, z: u32) -> Aabb {
        let min = self.min_position + Vec3::new(x as f32, y as f32, z as f32) * self.cell_size;
        Aabb::new(min, min + Vec3::repeat(self.cell_size))
    }
}

/// Faces per grid cell
#[derive(Debug, Clone)]
pub struct GridPartition {
    /// Grid shape
    pub dims: GridDimensions,
    /// One entry per cell, in linear index order
    pub table: EntryTable,
    /// Narrow-phase counters
    pub stats: NarrowPhaseStats,
}

impl GridPartition {
    /// Partition `faces` into cells of `cell_size`.
    ///
    /// With no faces the grid collapses to a single empty cell at the origin.
    pub fn build(faces: &[FaceShape], cell_size: f32) -> Result<Self, PackError> {
        let bounds = faces
            .iter()
            .map(|face| face.bounds)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(|| Aabb::new(Vec3::zeros(), Vec3::zeros()));
        let dims = GridDimensions::covering(&bounds, cell_size);
        log::debug!(
            "Grid {}x{}x{} ({} cells) from {:?}",
            dims.parts_x,
            dims.parts_y,
            dims.parts_z,
            dims.cell_count(),
            dims.min_position
        );

        let cells = dims.cell_count();
        if cells > usize::from(u16::MAX) + 1 {
            return Err(PackError::IndexOverflow { pool: "entries", size: cells });
        }

        let mut table = EntryTable::default();
        let mut stats = NarrowPhaseStats::default();
        for y in 0..dims.parts_y {
            for z in 0..dims.parts_z {
                for x in 0..dims.parts_x {
                    let region = Region::new(dims.cell_box(x, y, z));
                    let entry = table.push_region(&region, faces, 0, &mut stats)?;
                    log::trace!("Cell ({x}, {y}, {z}): {} faces", entry.face_index_count);
                }
            }
        }

        Ok(Self { dims, table, stats })
    }

    /// Faces registered in the cell containing `point`
    pub fn faces_at(&self, point: &Vec3) -> &[u16] {
        self.dims
            .entry_index_for_point(point)
            .and_then(|index| self.table.entries.get(index))
            .map_or(&[][..], |entry| self.table.faces_of(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(min: Vec3, max: Vec3) -> GridDimensions {
        GridDimensions::covering(&Aabb::new(min, max), 4.0)
    }

    fn triangle(origin: Vec3) -> FaceShape {
        FaceShape::from_points(&[
            origin,
            origin + Vec3::new(1.0, 0.0, 0.0),
            origin + Vec3::new(0.0, 0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_parts_grow_past_max() {
        let d = dims(Vec3::zeros(), Vec3::new(3.5, 0.0, 7.9));
        assert_eq!((d.parts_x, d.parts_y, d.parts_z), (1, 1, 2));
    }

    #[test]
    fn test_extent_on_cell_boundary_gets_extra_cell() {
        // max must land strictly inside the last cell
        let d = dims(Vec3::zeros(), Vec3::new(4.0, 8.0, 0.0));
        assert_eq!((d.parts_x, d.parts_y, d.parts_z), (2, 3, 1));
        assert!(d.entry_index_for_point(&Vec3::new(4.0, 8.0, 0.0)).is_some());
    }

    #[test]
    fn test_linear_index_order() {
        let d = dims(Vec3::zeros(), Vec3::new(8.0, 8.0, 4.0));
        assert_eq!((d.parts_x, d.parts_y, d.parts_z), (3, 3, 2));
        assert_eq!(d.linear_index(1, 0, 0), 1);
        assert_eq!(d.linear_index(0, 0, 1), 3);
        assert_eq!(d.linear_index(0, 1, 0), 6);
        for i in 0..d.cell_count() {
            let (x, y, z) = d.cell_for_entry(i).unwrap();
            assert_eq!(d.linear_index(x, y, z), i);
        }
        assert_eq!(d.cell_for_entry(d.cell_count()), None);
    }

    #[test]
    fn test_point_lookup() {
        let d = dims(Vec3::new(-4.0, 0.0, 0.0), Vec3::new(4.0, 3.0, 3.0));
        assert_eq!(d.entry_index_for_point(&Vec3::new(-4.0, 0.0, 0.0)), Some(0));
        assert_eq!(d.entry_index_for_point(&Vec3::new(0.5, 1.0, 1.0)), Some(1));
        assert_eq!(d.entry_index_for_point(&Vec3::new(-4.1, 1.0, 1.0)), None);
        assert_eq!(d.entry_index_for_point(&Vec3::new(20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_triangle_lands_in_one_cell() {
        let faces = vec![
            triangle(Vec3::new(0.0, 0.0, 0.0)),
            triangle(Vec3::new(9.0, 0.0, 0.0)),
            triangle(Vec3::new(5.0, 1.0, 1.0)),
        ];
        let grid = GridPartition::build(&faces, 4.0).unwrap();
        assert_eq!((grid.dims.parts_x, grid.dims.parts_y, grid.dims.parts_z), (3, 1, 1));
        assert_eq!(grid.table.entries.len(), 3);

        let cells: Vec<&[u16]> = grid.table.entries.iter().map(|e| grid.table.faces_of(e)).collect();
        assert_eq!(cells[0], &[0]);
        assert_eq!(cells[1], &[2]);
        assert_eq!(cells[2], &[1]);
        assert_eq!(grid.faces_at(&Vec3::new(6.0, 1.0, 1.0)), &[2]);
    }

    #[test]
    fn test_empty_cells_still_emitted() {
        let faces = vec![triangle(Vec3::zeros()), triangle(Vec3::new(13.0, 0.0, 0.0))];
        let grid = GridPartition::build(&faces, 4.0).unwrap();
        assert_eq!(grid.table.entries.len(), 4);
        let middle = grid.table.entries[1];
        assert_eq!(middle.face_index_count, 0);
        assert_eq!(middle.face_index_start, 1);
        assert_eq!(grid.table.entries[2].face_index_start, 1);
    }

    #[test]
    fn test_no_faces() {
        let grid = GridPartition::build(&[], 4.0).unwrap();
        assert_eq!(grid.dims.cell_count(), 1);
        assert_eq!(grid.table.entries.len(), 1);
        assert!(grid.table.face_indices.is_empty());
    }
}
