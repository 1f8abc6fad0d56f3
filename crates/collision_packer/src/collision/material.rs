//! Surface material flags
//!
//! The container stores a face's material as one 16-bit word:
//!
//! | Bits  | Meaning                 |
//! |-------|-------------------------|
//! | 0     | damaging                |
//! | 1-2   | reserved                |
//! | 3-4   | slipperiness (0..=3)    |
//! | 5-8   | terrain type            |
//! | 9     | reflects projectiles    |
//! | 10-12 | reserved                |
//! | 13    | ignore players          |
//! | 14    | ignore projectiles      |
//! | 15    | ignore scan             |

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

const SLIPPERINESS_SHIFT: u16 = 3;
const SLIPPERINESS_MASK: u16 = 0x18;
const TERRAIN_SHIFT: u16 = 5;
const TERRAIN_MASK: u16 = 0x1E0;

bitflags! {
    /// Boolean material bits; slipperiness and terrain live in [`SurfaceMaterial`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CollisionFlags: u16 {
        /// Touching the face hurts
        const DAMAGING = 0x1;
        /// Reserved
        const RESERVED_1 = 0x2;
        /// Reserved
        const RESERVED_2 = 0x4;
        /// Projectiles bounce off
        const REFLECTS_PROJECTILES = 0x200;
        /// Reserved
        const RESERVED_10 = 0x400;
        /// Reserved
        const RESERVED_11 = 0x800;
        /// Reserved
        const RESERVED_12 = 0x1000;
        /// Players pass through
        const IGNORE_PLAYERS = 0x2000;
        /// Projectiles pass through
        const IGNORE_PROJECTILES = 0x4000;
        /// Invisible to the scan visor
        const IGNORE_SCAN = 0x8000;
    }
}

/// Terrain type stored in bits 5-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Metal
    #[default]
    Metal,
    /// Orange hologram
    OrangeHolo,
    /// Green hologram
    GreenHolo,
    /// Blue hologram
    BlueHolo,
    /// Ice
    Ice,
    /// Snow
    Snow,
    /// Sand
    Sand,
    /// Rock
    Rock,
    /// Lava
    Lava,
    /// Acid
    Acid,
    /// Boss arena surface
    Gorea,
    /// Unused
    Unused,
    /// Values 12-15, carried through unchanged
    Reserved(u8),
}

impl Terrain {
    /// The 4-bit value stored in the flag word
    pub fn index(self) -> u8 {
        match self {
            Self::Metal => 0,
            Self::OrangeHolo => 1,
            Self::GreenHolo => 2,
            Self::BlueHolo => 3,
            Self::Ice => 4,
            Self::Snow => 5,
            Self::Sand => 6,
            Self::Rock => 7,
            Self::Lava => 8,
            Self::Acid => 9,
            Self::Gorea => 10,
            Self::Unused => 11,
            Self::Reserved(value) => value & 0xF,
        }
    }

    /// Decode a 4-bit terrain value
    pub fn from_index(value: u8) -> Self {
        match value & 0xF {
            0 => Self::Metal,
            1 => Self::OrangeHolo,
            2 => Self::GreenHolo,
            3 => Self::BlueHolo,
            4 => Self::Ice,
            5 => Self::Snow,
            6 => Self::Sand,
            7 => Self::Rock,
            8 => Self::Lava,
            9 => Self::Acid,
            10 => Self::Gorea,
            11 => Self::Unused,
            other => Self::Reserved(other),
        }
    }
}

/// Physical material of a collision face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceMaterial {
    /// Boolean material bits
    pub flags: CollisionFlags,
    /// Slipperiness level, 0..=3 (higher bits are dropped when packed)
    pub slipperiness: u8,
    /// Terrain type
    pub terrain: Terrain,
}

impl SurfaceMaterial {
    /// Create a material with no flags set
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            ..Default::default()
        }
    }

    /// Set the boolean flags
    pub fn with_flags(mut self, flags: CollisionFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the slipperiness level
    pub fn with_slipperiness(mut self, level: u8) -> Self {
        self.slipperiness = level;
        self
    }

    /// Pack into the container's 16-bit flag word
    pub fn to_bits(&self) -> u16 {
        self.flags.bits()
            | ((u16::from(self.slipperiness) << SLIPPERINESS_SHIFT) & SLIPPERINESS_MASK)
            | ((u16::from(self.terrain.index()) << TERRAIN_SHIFT) & TERRAIN_MASK)
    }

    /// Unpack a 16-bit flag word
    pub fn from_bits(bits: u16) -> Self {
        Self {
            flags: CollisionFlags::from_bits_truncate(bits),
            slipperiness: ((bits & SLIPPERINESS_MASK) >> SLIPPERINESS_SHIFT) as u8,
            terrain: Terrain::from_index(((bits & TERRAIN_MASK) >> TERRAIN_SHIFT) as u8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        let material = SurfaceMaterial::new(Terrain::Lava)
            .with_flags(CollisionFlags::DAMAGING | CollisionFlags::IGNORE_SCAN)
            .with_slipperiness(2);
        assert_eq!(material.to_bits(), 0x1 | (2 << 3) | (8 << 5) | 0x8000);
    }

    #[test]
    fn test_every_word_round_trips() {
        for bits in 0..=u16::MAX {
            assert_eq!(SurfaceMaterial::from_bits(bits).to_bits(), bits);
        }
    }

    #[test]
    fn test_slipperiness_is_two_bits() {
        let material = SurfaceMaterial::default().with_slipperiness(7);
        assert_eq!(SurfaceMaterial::from_bits(material.to_bits()).slipperiness, 3);
    }

    #[test]
    fn test_reserved_terrain_values() {
        assert_eq!(Terrain::from_index(13), Terrain::Reserved(13));
        assert_eq!(Terrain::Reserved(13).index(), 13);
        assert_eq!(Terrain::from_index(Terrain::Acid.index()), Terrain::Acid);
    }
}
