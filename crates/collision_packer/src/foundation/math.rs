//! Math utilities and types
//!
//! Provides the vector types used by the packer. Input geometry arrives as
//! `f32` vectors; everything that reaches the container goes through the
//! fixed-point helpers in [`crate::geometry::fixed`].

pub use nalgebra::{Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (planes are stored as `normal.xyz` + `distance` in `w`)
pub type Vec4 = Vector4<f32>;

/// Math constants
pub mod constants {
    /// Tolerance used by the narrow-phase segment tests
    pub const INTERSECTION_EPSILON: f32 = 1e-5;
}

/// Math utility functions
pub mod utils {
    use super::Vec3;

    /// Component-wise minimum of two vectors
    pub fn component_min(a: &Vec3, b: &Vec3) -> Vec3 {
        Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
    }

    /// Component-wise maximum of two vectors
    pub fn component_max(a: &Vec3, b: &Vec3) -> Vec3 {
        Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
    }

    /// Index (0 = x, 1 = y, 2 = z) of the largest component; ties prefer the earlier axis
    pub fn longest_axis(size: &Vec3) -> usize {
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_axis_prefers_earlier_on_tie() {
        assert_eq!(utils::longest_axis(&Vec3::new(8.0, 8.0, 8.0)), 0);
        assert_eq!(utils::longest_axis(&Vec3::new(1.0, 8.0, 8.0)), 1);
        assert_eq!(utils::longest_axis(&Vec3::new(1.0, 2.0, 8.0)), 2);
    }

    #[test]
    fn test_component_min_max() {
        let a = Vec3::new(1.0, -2.0, 3.0);
        let b = Vec3::new(0.0, 5.0, 3.5);
        assert_eq!(utils::component_min(&a, &b), Vec3::new(0.0, -2.0, 3.0));
        assert_eq!(utils::component_max(&a, &b), Vec3::new(1.0, 5.0, 3.5));
    }
}
