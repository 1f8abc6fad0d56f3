//! Region/face overlap test shared by both partitioners
//!
//! Broad phase: the face's bounding box must overlap the region (closed test).
//!
//! Narrow phase, first match wins:
//! 1. a face vertex lies inside the region (half-open, `min <= p < max`,
//!    closed on upper bounds that no neighbouring region shares)
//! 2. a face edge, closing edge included, crosses one of the region's six faces
//! 3. one of the region's twelve edges crosses the face polygon
//!
//! Segment tests use fan triangulation and are bounded to the segment's
//! length. This is not a separating-axis test: a polygon that threads a region
//! corner without any of the three events above is reported as not
//! overlapping. Legacy containers were built with the same three checks, so
//! the index contents depend on keeping them exactly.

use crate::collision::{FaceRecord, IndexedGeometry};
use crate::foundation::math::Vec3;
use crate::geometry::{fan_triangles, Aabb, Segment, Triangle};

/// Counters collected while testing regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NarrowPhaseStats {
    /// Region/face pairs rejected by the bounding-box test
    pub broad_rejections: usize,
    /// Pairs accepted because a vertex lies in the region
    pub vertex_hits: usize,
    /// Pairs accepted because a face edge crosses a region face
    pub edge_hits: usize,
    /// Pairs accepted because a region edge crosses the face
    pub box_edge_hits: usize,
    /// Zero-length face edges skipped
    pub degenerate_segments: usize,
}

/// A face's vertices and bounds, resolved from the pools once per run
#[derive(Debug, Clone)]
pub struct FaceShape {
    /// Vertices followed by the closing vertex (`points[0]` repeated)
    points: Vec<Vec3>,
    /// Bounding box of the vertices
    pub bounds: Aabb,
}

impl FaceShape {
    /// Build from an open vertex loop; `None` when there are no vertices
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let bounds = Aabb::from_points(points.iter())?;
        let mut closed = points.to_vec();
        closed.push(points[0]);
        Some(Self { points: closed, bounds })
    }

    /// Build from a packed record, reading the closing index from the buffer
    pub fn from_record(geometry: &IndexedGeometry, record: &FaceRecord) -> Option<Self> {
        let start = usize::from(record.point_index_start);
        let end = start + usize::from(record.point_index_count) + 1;
        let points: Vec<Vec3> = geometry
            .point_indices
            .get(start..end)?
            .iter()
            .filter_map(|&i| geometry.pool.point(i))
            .collect();
        let vertices = points.get(..points.len().checked_sub(1)?)?;
        let bounds = Aabb::from_points(vertices.iter())?;
        Some(Self { points, bounds })
    }

    /// Vertices without the closing vertex
    pub fn vertices(&self) -> &[Vec3] {
        &self.points[..self.points.len() - 1]
    }

    /// Edges in winding order, closing edge last
    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }
}

/// A box being filled with faces, with its side triangles built once
#[derive(Debug, Clone)]
pub struct Region {
    /// Box of the region
    pub bounds: Aabb,
    /// Axes whose upper bound counts as inside
    closed_max: [bool; 3],
    /// The six sides, two triangles each
    triangles: Vec<Triangle>,
}

impl Region {
    /// Region with half-open containment on every axis
    pub fn new(bounds: Aabb) -> Self {
        Self::with_closed_max(bounds, [false; 3])
    }

    /// Region inside `outer` that closes its upper bound wherever it lies on
    /// `outer`'s upper bound. Nothing beyond `outer` can claim those points.
    pub fn within(bounds: Aabb, outer: &Aabb) -> Self {
        Self::with_closed_max(bounds, std::array::from_fn(|axis| bounds.max[axis] >= outer.max[axis]))
    }

    fn with_closed_max(bounds: Aabb, closed_max: [bool; 3]) -> Self {
        let triangles = bounds
            .faces()
            .iter()
            .flat_map(|quad| fan_triangles(quad).collect::<Vec<_>>())
            .collect();
        Self { bounds, closed_max, triangles }
    }

    /// Is `point` inside the region?
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.bounds.contains_point_closed_on(point, self.closed_max)
    }
}

/// Does `face` possibly intersect `region`?
pub fn region_overlaps_face(region: &Region, face: &FaceShape, stats: &mut NarrowPhaseStats) -> bool {
    if !region.bounds.intersects(&face.bounds) {
        stats.broad_rejections += 1;
        return false;
    }

    if face.vertices().iter().any(|p| region.contains_point(p)) {
        stats.vertex_hits += 1;
        return true;
    }

    if face_edge_crosses_region(region, face, stats) {
        stats.edge_hits += 1;
        return true;
    }

    if region_edge_crosses_face(&region.bounds, face) {
        stats.box_edge_hits += 1;
        return true;
    }

    false
}

fn face_edge_crosses_region(region: &Region, face: &FaceShape, stats: &mut NarrowPhaseStats) -> bool {
    for edge in face.edges() {
        let Some((direction, length)) = edge.direction_and_length() else {
            stats.degenerate_segments += 1;
            log::trace!("Skipping zero-length face edge at {:?}", edge.start);
            continue;
        };
        if region
            .triangles
            .iter()
            .any(|tri| tri.intersect_bounded_ray(&edge.start, &direction, length).is_some())
        {
            return true;
        }
    }
    false
}

fn region_edge_crosses_face(region: &Aabb, face: &FaceShape) -> bool {
    let face_triangles: Vec<Triangle> = fan_triangles(face.vertices()).collect();
    region.edges().iter().any(|&(start, end)| {
        let edge = Segment::new(start, end);
        face_triangles.iter().any(|tri| tri.hit_by_segment(&edge))
    })
}
