//! Static mesh buffers handed to the scene backend.
//!
//! A [`SceneGeometry`] owns the four flat arrays the library expects for a
//! static mesh: vertices, triangles, one material index per triangle, and the
//! material table. [`SceneGeometry::declare`] borrows them as a
//! [`MeshDeclaration`], optionally declaring a triangle count that differs
//! from what the buffers hold.

pub mod material;
pub mod squares;

pub use material::Material;
pub use squares::{SquareScatter, generate_squares};

use crate::error::{MeshCrashError, Result};
use crate::math::{Bounds, Vec3};
use bytemuck::{Pod, Zeroable};

/// Three indices into the vertex array.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Triangle {
    pub indices: [i32; 3],
}

impl Triangle {
    pub const fn new(a: i32, b: i32, c: i32) -> Self {
        Self { indices: [a, b, c] }
    }

    /// Shifts every index by `offset`.
    pub const fn offset(self, offset: i32) -> Self {
        let [a, b, c] = self.indices;
        Self::new(a + offset, b + offset, c + offset)
    }
}

/// Transient vertex/triangle/material buffers for one static mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGeometry {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<Triangle>,
    /// One entry per triangle, indexing into `materials`.
    pub material_indices: Vec<i32>,
    pub materials: Vec<Material>,
}

impl SceneGeometry {
    pub fn with_capacity(vertices: usize, triangles: usize, materials: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
            material_indices: Vec::with_capacity(triangles),
            materials: Vec::with_capacity(materials),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.vertices)
    }

    /// Checks that every index refers to an existing element.
    ///
    /// Generated geometry always passes. Loaded geometry is not validated on
    /// the repro path, since malformed input is the point of the exercise.
    pub fn validate(&self) -> Result<()> {
        if self.material_indices.len() != self.triangles.len() {
            return Err(MeshCrashError::Geometry(format!(
                "{} material indices for {} triangles",
                self.material_indices.len(),
                self.triangles.len()
            )));
        }

        let vertex_count = self.vertices.len();
        for (i, triangle) in self.triangles.iter().enumerate() {
            if let Some(&index) = triangle
                .indices
                .iter()
                .find(|&&index| !in_range(index, vertex_count))
            {
                return Err(MeshCrashError::Geometry(format!(
                    "triangle {} references vertex {} (vertex count {})",
                    i, index, vertex_count
                )));
            }
        }

        let material_count = self.materials.len();
        for (i, &index) in self.material_indices.iter().enumerate() {
            if !in_range(index, material_count) {
                return Err(MeshCrashError::Geometry(format!(
                    "triangle {} uses material {} (material count {})",
                    i, index, material_count
                )));
            }
        }

        for (i, material) in self.materials.iter().enumerate() {
            material
                .validate()
                .map_err(|e| MeshCrashError::Geometry(format!("material {}: {}", i, e)))?;
        }

        Ok(())
    }

    /// Borrows the buffers for mesh creation.
    ///
    /// With `triangle_count`, exactly that many triangles are declared no
    /// matter how many the buffers hold. A count above the population makes
    /// the backend read past the triangle and material index arrays.
    pub fn declare(&self, triangle_count: Option<usize>) -> MeshDeclaration<'_> {
        let population = self.triangles.len();
        let declared = triangle_count.unwrap_or(population);

        if declared < population {
            log::warn!(
                "Declaring {} of {} triangles ({} material indices stay attached)",
                declared,
                population,
                self.material_indices.len()
            );
        } else if declared > population {
            log::warn!(
                "Declaring {} triangles over {} present; the backend reads past the buffers",
                declared,
                population
            );
        }

        MeshDeclaration {
            vertices: &self.vertices,
            triangles: &self.triangles,
            material_indices: &self.material_indices,
            materials: &self.materials,
            declared_triangles: declared,
        }
    }
}

fn in_range(index: i32, len: usize) -> bool {
    usize::try_from(index).is_ok_and(|index| index < len)
}

/// Borrowed view of a [`SceneGeometry`] as declared to the scene backend.
///
/// The slices always hold the full buffers. Only `declared_triangles` is
/// passed to the backend as the triangle count.
#[derive(Debug, Clone, Copy)]
pub struct MeshDeclaration<'a> {
    pub vertices: &'a [Vec3],
    pub triangles: &'a [Triangle],
    pub material_indices: &'a [i32],
    pub materials: &'a [Material],
    declared_triangles: usize,
}

impl MeshDeclaration<'_> {
    pub fn declared_triangles(&self) -> usize {
        self.declared_triangles
    }

    /// True when the declared count matches both the triangle and the
    /// material index arrays.
    pub fn is_exact(&self) -> bool {
        self.declared_triangles == self.triangles.len()
            && self.declared_triangles == self.material_indices.len()
    }

    /// Declared triangles that have no backing triangle in the buffers.
    pub fn overrun(&self) -> usize {
        self.declared_triangles.saturating_sub(self.triangles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_square() -> SceneGeometry {
        SceneGeometry {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)],
            material_indices: vec![0, 0],
            materials: vec![Material::UNIT_SQUARE],
        }
    }

    #[test]
    fn test_triangle_layout() {
        assert_eq!(std::mem::size_of::<Triangle>(), 12);
        assert_eq!(std::mem::size_of::<Vec3>(), 12);
    }

    #[test]
    fn test_triangle_offset() {
        assert_eq!(Triangle::new(0, 2, 3).offset(8), Triangle::new(8, 10, 11));
    }

    #[test]
    fn test_validate_accepts_square() {
        let geometry = single_square();
        assert!(geometry.validate().is_ok());
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.triangle_count(), 2);
        assert_eq!(geometry.material_count(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_vertex_index() {
        let mut geometry = single_square();
        geometry.triangles[1] = Triangle::new(0, 2, 4);
        assert!(matches!(
            geometry.validate(),
            Err(MeshCrashError::Geometry(_))
        ));

        geometry.triangles[1] = Triangle::new(-1, 2, 3);
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_material_index() {
        let mut geometry = single_square();
        geometry.material_indices[0] = 1;
        assert!(geometry.validate().is_err());

        geometry.material_indices = vec![0];
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn test_declare_without_limit() {
        let geometry = single_square();
        let declaration = geometry.declare(None);
        assert_eq!(declaration.declared_triangles(), 2);
        assert!(declaration.is_exact());
        assert_eq!(declaration.overrun(), 0);
    }

    #[test]
    fn test_declare_with_limit() {
        let geometry = single_square();
        let declaration = geometry.declare(Some(1));
        assert_eq!(declaration.declared_triangles(), 1);
        assert_eq!(declaration.triangles.len(), 2);
        assert_eq!(declaration.material_indices.len(), 2);
        assert!(!declaration.is_exact());
        assert_eq!(declaration.overrun(), 0);
    }

    #[test]
    fn test_declare_count_above_population() {
        let geometry = single_square();
        let declaration = geometry.declare(Some(646));
        assert_eq!(declaration.declared_triangles(), 646);
        assert_eq!(declaration.triangles.len(), 2);
        assert!(!declaration.is_exact());
        assert_eq!(declaration.overrun(), 644);
    }

    #[test]
    fn test_declare_count_equal_to_population() {
        let geometry = single_square();
        assert!(geometry.declare(Some(2)).is_exact());
    }

    #[test]
    fn test_declare_flags_short_material_indices() {
        let mut geometry = single_square();
        geometry.material_indices.pop();
        assert!(!geometry.declare(None).is_exact());
    }

    #[test]
    fn test_bounds() {
        let bounds = single_square().bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(SceneGeometry::default().bounds(), None);
    }
}
