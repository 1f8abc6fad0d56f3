//! Axis-aligned bounding boxes for spatial regions

use crate::foundation::math::{utils, Vec3};

/// Corner indices of each box face, wound around the face perimeter.
/// Corner `i` takes `max` on x when bit 0 is set, y for bit 1, z for bit 2.
const FACE_CORNERS: [[usize; 4]; 6] = [
    [0, 2, 6, 4], // -X
    [1, 3, 7, 5], // +X
    [0, 1, 5, 4], // -Y
    [2, 3, 7, 6], // +Y
    [0, 1, 3, 2], // -Z
    [4, 5, 7, 6], // +Z
];

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a cube centered on the origin
    pub fn cube(half_extent: f32) -> Self {
        Self {
            min: Vec3::new(-half_extent, -half_extent, -half_extent),
            max: Vec3::new(half_extent, half_extent, half_extent),
        }
    }

    /// Smallest box enclosing all points, `None` when the iterator is empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| Self {
            min: utils::component_min(&acc.min, p),
            max: utils::component_max(&acc.max, p),
        }))
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: utils::component_min(&self.min, &other.min),
            max: utils::component_max(&self.max, &other.max),
        }
    }

    /// Edge lengths along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half-open containment: `min <= p < max` on every axis.
    ///
    /// Adjacent regions share faces, so a vertex on a shared face belongs to
    /// exactly one of them.
    pub fn contains_point_half_open(&self, point: &Vec3) -> bool {
        self.contains_point_closed_on(point, [false; 3])
    }

    /// Containment that is half-open except on the axes flagged in
    /// `closed_max`, where `p <= max` also counts.
    pub fn contains_point_closed_on(&self, point: &Vec3, closed_max: [bool; 3]) -> bool {
        (0..3).all(|axis| {
            let p = point[axis];
            p >= self.min[axis] && (p < self.max[axis] || (closed_max[axis] && p <= self.max[axis]))
        })
    }

    /// Closed overlap test; touching boxes overlap
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Split at the midpoint of `axis` into (lower, upper) halves
    pub fn split(&self, axis: usize) -> (Self, Self) {
        let mid = (self.min[axis] + self.max[axis]) * 0.5;
        let mut lower = *self;
        let mut upper = *self;
        lower.max[axis] = mid;
        upper.min[axis] = mid;
        (lower, upper)
    }

    /// Corner `i`; bit 0 selects max x, bit 1 max y, bit 2 max z
    pub fn corner(&self, index: usize) -> Vec3 {
        Vec3::new(
            if index & 1 != 0 { self.max.x } else { self.min.x },
            if index & 2 != 0 { self.max.y } else { self.min.y },
            if index & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    /// All eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    /// The six faces as quads, in -X, +X, -Y, +Y, -Z, +Z order
    pub fn faces(&self) -> [[Vec3; 4]; 6] {
        let corners = self.corners();
        FACE_CORNERS.map(|quad| quad.map(|i| corners[i]))
    }

    /// The twelve edges as (start, end) pairs
    pub fn edges(&self) -> [(Vec3, Vec3); 12] {
        let corners = self.corners();
        let mut edges = [(Vec3::zeros(), Vec3::zeros()); 12];
        let mut n = 0;
        for i in 0..8 {
            for bit in [1, 2, 4] {
                if i & bit == 0 {
                    edges[n] = (corners[i], corners[i | bit]);
                    n += 1;
                }
            }
        }
        edges
    }
}
