//! Fixed-point representation used by the container
//!
//! Every coordinate, normal component and plane distance is stored as a
//! signed 32-bit value with 12 fractional bits. The pools compare values in
//! this representation, so two inputs that quantize to the same fixed-point
//! value are the same entry.

use crate::foundation::math::{Vec3, Vec4};

/// Number of fractional bits
pub const FRACTION_BITS: u32 = 12;

/// Fixed-point value of 1.0
pub const FIXED_ONE: i32 = 1 << FRACTION_BITS;

/// A quantized `Vec3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FixedVec3(pub [i32; 3]);

/// A quantized `Vec4` (plane normal + distance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FixedVec4(pub [i32; 4]);

/// Convert a float to fixed point, rounding to nearest (ties away from zero)
///
/// Out-of-range values saturate.
pub fn to_fixed(value: f32) -> i32 {
    (value * FIXED_ONE as f32).round() as i32
}

/// Convert a fixed-point value back to float
pub fn from_fixed(value: i32) -> f32 {
    value as f32 / FIXED_ONE as f32
}

impl FixedVec3 {
    /// Quantize a float vector
    pub fn from_vec3(v: &Vec3) -> Self {
        Self([to_fixed(v.x), to_fixed(v.y), to_fixed(v.z)])
    }

    /// Expand back to floats
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(from_fixed(self.0[0]), from_fixed(self.0[1]), from_fixed(self.0[2]))
    }
}

impl FixedVec4 {
    /// Quantize a float vector
    pub fn from_vec4(v: &Vec4) -> Self {
        Self([to_fixed(v.x), to_fixed(v.y), to_fixed(v.z), to_fixed(v.w)])
    }

    /// Expand back to floats
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            from_fixed(self.0[0]),
            from_fixed(self.0[1]),
            from_fixed(self.0[2]),
            from_fixed(self.0[3]),
        )
    }
}
