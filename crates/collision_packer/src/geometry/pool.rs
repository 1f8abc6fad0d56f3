//! Deduplicating point and plane pools
//!
//! Equality here is EXACT equality of the fixed-point representation that
//! ends up in the container, not an epsilon comparison. Two vertices that
//! quantize to different fixed-point values stay separate entries even if
//! they are a hair apart. Legacy containers were built the same way, so this
//! is what keeps the point and plane counts byte-compatible.

use std::collections::HashMap;

use crate::foundation::math::{Vec3, Vec4};
use crate::geometry::fixed::{FixedVec3, FixedVec4};
use crate::PackError;

/// Index into a pool; container index fields are 16-bit
pub type PoolIndex = u16;

/// Append-only, insertion-ordered pools of points and planes
#[derive(Debug, Clone, Default)]
pub struct GeometryPool {
    points: Vec<FixedVec3>,
    planes: Vec<FixedVec4>,
    point_lookup: HashMap<FixedVec3, PoolIndex>,
    plane_lookup: HashMap<FixedVec4, PoolIndex>,
}

impl GeometryPool {
    /// Create empty pools
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `point`, appending it if no identical entry exists
    pub fn intern_point(&mut self, point: &Vec3) -> Result<PoolIndex, PackError> {
        let key = FixedVec3::from_vec3(point);
        intern(&mut self.points, &mut self.point_lookup, key, "points")
    }

    /// Index of `plane`, appending it if no identical entry exists
    pub fn intern_plane(&mut self, plane: &Vec4) -> Result<PoolIndex, PackError> {
        let key = FixedVec4::from_vec4(plane);
        intern(&mut self.planes, &mut self.plane_lookup, key, "planes")
    }

    /// Pooled points in insertion order
    pub fn points(&self) -> &[FixedVec3] {
        &self.points
    }

    /// Pooled planes in insertion order
    pub fn planes(&self) -> &[FixedVec4] {
        &self.planes
    }

    /// Point `index` expanded to floats
    pub fn point(&self, index: PoolIndex) -> Option<Vec3> {
        self.points.get(usize::from(index)).map(|p| p.to_vec3())
    }

    /// Plane `index` expanded to floats
    pub fn plane(&self, index: PoolIndex) -> Option<Vec4> {
        self.planes.get(usize::from(index)).map(|p| p.to_vec4())
    }
}

fn intern<K: Copy + Eq + std::hash::Hash>(
    values: &mut Vec<K>,
    lookup: &mut HashMap<K, PoolIndex>,
    key: K,
    pool: &'static str,
) -> Result<PoolIndex, PackError> {
    if let Some(&index) = lookup.get(&key) {
        return Ok(index);
    }
    let index = PoolIndex::try_from(values.len())
        .map_err(|_| PackError::IndexOverflow { pool, size: values.len() + 1 })?;
    values.push(key);
    lookup.insert(key, index);
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_point_dedups_exact_matches() {
        let mut pool = GeometryPool::new();
        let a = pool.intern_point(&Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let b = pool.intern_point(&Vec3::new(4.0, 5.0, 6.0)).unwrap();
        let c = pool.intern_point(&Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!((a, b, c), (0, 1, 0));
        assert_eq!(pool.points().len(), 2);
    }

    #[test]
    fn test_no_tolerance_between_fixed_steps() {
        let mut pool = GeometryPool::new();
        let one_step = 1.0 / 4096.0;
        let a = pool.intern_point(&Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let b = pool.intern_point(&Vec3::new(1.0 + one_step, 0.0, 0.0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.points().len(), 2);
    }

    #[test]
    fn test_values_quantizing_to_same_fixed_value_merge() {
        let mut pool = GeometryPool::new();
        let a = pool.intern_point(&Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let b = pool.intern_point(&Vec3::new(1.000_01, 0.0, 0.0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_planes_are_separate_pool() {
        let mut pool = GeometryPool::new();
        pool.intern_point(&Vec3::new(0.0, 1.0, 0.0)).unwrap();
        let p0 = pool.intern_plane(&Vec4::new(0.0, 1.0, 0.0, 2.0)).unwrap();
        let p1 = pool.intern_plane(&Vec4::new(0.0, 1.0, 0.0, -2.0)).unwrap();
        let p2 = pool.intern_plane(&Vec4::new(0.0, 1.0, 0.0, 2.0)).unwrap();
        assert_eq!((p0, p1, p2), (0, 1, 0));
        assert_eq!(pool.plane(1), Some(Vec4::new(0.0, 1.0, 0.0, -2.0)));
        assert_eq!(pool.plane(2), None);
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let mut pool = GeometryPool::new();
        for i in (0..10).rev() {
            pool.intern_point(&Vec3::new(i as f32, 0.0, 0.0)).unwrap();
        }
        let xs: Vec<f32> = (0..10).map(|i| pool.point(i).unwrap().x).collect();
        assert_eq!(xs, vec![9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_point_pool_overflow() {
        let mut pool = GeometryPool::new();
        for i in 0..=u32::from(u16::MAX) {
            pool.intern_point(&Vec3::new(i as f32, 0.0, 0.0)).unwrap();
        }
        let err = pool.intern_point(&Vec3::new(-1.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, PackError::IndexOverflow { pool: "points", size: 65537 }));
    }
}
