//! Acoustic material records as laid out in scene buffers and scene files.
//!
//! Values cover the three Steam Audio frequency bands (400 Hz, 2.5 KHz, 15 KHz).

use bytemuck::{Pod, Zeroable};

/// Acoustic properties of a surface material.
///
/// The field order and `repr(C)` layout match the library's material record and
/// the 28-byte material entries of a `.raw` scene file:
/// absorption (3 × f32), scattering (f32), transmission (3 × f32).
///
/// # Example
///
/// ```
/// use meshcrash_core::geometry::Material;
///
/// let custom = Material {
///     absorption: [0.10, 0.20, 0.30],
///     scattering: 0.05,
///     transmission: [0.10, 0.05, 0.03],
/// };
/// assert!(custom.validate().is_ok());
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Material {
    /// Fraction of sound energy absorbed at [low, mid, high] frequencies (0.0 - 1.0)
    pub absorption: [f32; 3],

    /// Fraction of sound energy scattered in a random direction on reflection (0.0 - 1.0)
    pub scattering: f32,

    /// Fraction of sound energy transmitted through the surface per band (0.0 - 1.0)
    pub transmission: [f32; 3],
}

impl Material {
    /// Material shared by every generated unit square
    pub const UNIT_SQUARE: Self = Self {
        absorption: [0.1, 0.1, 0.1],
        scattering: 0.5,
        transmission: [0.2, 0.2, 0.2],
    };

    /// Validates that all material properties are within valid range [0.0, 1.0]
    pub fn validate(&self) -> Result<(), &'static str> {
        for &val in &self.absorption {
            if !(0.0..=1.0).contains(&val) {
                return Err("Absorption values must be between 0.0 and 1.0");
            }
        }

        if !(0.0..=1.0).contains(&self.scattering) {
            return Err("Scattering value must be between 0.0 and 1.0");
        }

        for &val in &self.transmission {
            if !(0.0..=1.0).contains(&val) {
                return Err("Transmission values must be between 0.0 and 1.0");
            }
        }

        Ok(())
    }
}
