//! Math types for meshcrash

pub use glam::Vec3;

/// Axis-aligned bounding box over a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Returns `None` for an empty point set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |bounds, p| {
            Self::new(bounds.min.min(*p), bounds.max.max(*p))
        }))
    }
}

/// Maps a raw 32-bit generator output onto `[min, max]`.
///
/// `u32::MAX` lands exactly on `max`, so the range is closed on both ends.
pub fn map_unit_u32(raw: u32, min: f32, max: f32) -> f32 {
    let t = raw as f32 / u32::MAX as f32;
    min + t * (max - min)
}
