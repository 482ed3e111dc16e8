//! Flat binary scene files (`.raw`).
//!
//! # Layout
//!
//! Native byte order, no padding, no version field:
//!
//! | Section          | Element                           | Count          |
//! |------------------|-----------------------------------|----------------|
//! | header           | 3 × i32 (vertices, triangles, materials) | 1       |
//! | vertices         | 3 × f32                           | vertex count   |
//! | triangles        | 3 × i32                           | triangle count |
//! | material indices | i32                               | triangle count |
//! | materials        | 7 × f32                           | material count |
//!
//! In [`SizeCheck::Lenient`] mode a short file is not an error: every array is
//! sized from the header and filled from whatever bytes remain, leaving the
//! rest zeroed.

mod load_options;

pub use load_options::{LoadOptions, SizeCheck};

use crate::error::{MeshCrashError, Result};
use crate::geometry::{Material, SceneGeometry, Triangle};
use crate::math::Vec3;
use bytemuck::{Pod, Zeroable};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::mem::size_of;
use std::path::Path;

/// Default input file of the loader procedure, relative to the working directory.
pub const DEFAULT_SCENE_PATH: &str = "Scene.raw";

/// Fixed-size header of a scene file.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct SceneHeader {
    pub num_vertices: i32,
    pub num_triangles: i32,
    pub num_materials: i32,
}

impl SceneHeader {
    pub const LEN: usize = size_of::<Self>();

    /// Header describing `geometry`.
    ///
    /// Fails if a count does not fit in an i32 or if the material index array
    /// does not have one entry per triangle, since the format stores a single
    /// triangle count for both.
    pub fn for_geometry(geometry: &SceneGeometry) -> Result<Self> {
        if geometry.material_indices.len() != geometry.triangles.len() {
            return Err(MeshCrashError::SceneFile(format!(
                "cannot store {} material indices for {} triangles",
                geometry.material_indices.len(),
                geometry.triangles.len()
            )));
        }

        Ok(Self {
            num_vertices: count_to_i32(geometry.vertices.len(), "vertex")?,
            num_triangles: count_to_i32(geometry.triangles.len(), "triangle")?,
            num_materials: count_to_i32(geometry.materials.len(), "material")?,
        })
    }

    /// Vertex count with negative values read as zero.
    pub fn vertex_count(&self) -> usize {
        clamp_count(self.num_vertices)
    }

    /// Triangle count with negative values read as zero.
    pub fn triangle_count(&self) -> usize {
        clamp_count(self.num_triangles)
    }

    /// Material count with negative values read as zero.
    pub fn material_count(&self) -> usize {
        clamp_count(self.num_materials)
    }

    pub fn has_negative_count(&self) -> bool {
        self.num_vertices < 0 || self.num_triangles < 0 || self.num_materials < 0
    }

    /// Total file length implied by the header, including the header itself.
    pub fn expected_len(&self) -> usize {
        let triangle_bytes = size_of::<Triangle>() + size_of::<i32>();
        Self::LEN
            .saturating_add(self.vertex_count().saturating_mul(size_of::<Vec3>()))
            .saturating_add(self.triangle_count().saturating_mul(triangle_bytes))
            .saturating_add(self.material_count().saturating_mul(size_of::<Material>()))
    }
}

fn clamp_count(count: i32) -> usize {
    usize::try_from(count).unwrap_or(0)
}

fn count_to_i32(count: usize, what: &str) -> Result<i32> {
    i32::try_from(count).map_err(|_| {
        MeshCrashError::SceneFile(format!("{} count {} does not fit in a header", what, count))
    })
}

/// Result of reading a scene file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedScene {
    pub header: SceneHeader,
    pub geometry: SceneGeometry,
    /// Bytes the header promised but the file did not contain (zero-filled)
    pub missing_bytes: usize,
    /// Bytes left over after the last declared array
    pub trailing_bytes: usize,
}

impl LoadedScene {
    pub fn is_complete(&self) -> bool {
        self.missing_bytes == 0
    }
}

/// Loads the scene file at `path`.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadedScene> {
    let path = path.as_ref();
    log::info!("Loading scene file: {}", path.display());
    let file = File::open(path).map_err(|e| {
        MeshCrashError::SceneFile(format!("Failed to open {}: {}", path.display(), e))
    })?;
    read_from(file, options)
}

/// Reads a scene file from any byte source.
pub fn read_from<R: Read>(mut reader: R, options: &LoadOptions) -> Result<LoadedScene> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mut sections = SectionReader::new(&bytes);
    let header = sections.read_one::<SceneHeader>();

    log::debug!(
        "Scene header: {} vertices, {} triangles, {} materials ({} bytes expected, {} present)",
        header.num_vertices,
        header.num_triangles,
        header.num_materials,
        header.expected_len(),
        bytes.len()
    );

    if options.size_check == SizeCheck::Strict {
        if header.has_negative_count() {
            return Err(MeshCrashError::SceneFile(format!(
                "negative count in header {:?}",
                header
            )));
        }
        if bytes.len() < header.expected_len() {
            return Err(MeshCrashError::SceneFile(format!(
                "file holds {} bytes but header declares {}",
                bytes.len(),
                header.expected_len()
            )));
        }
    } else if header.has_negative_count() {
        log::warn!("Negative count in scene header {:?}, reading as zero", header);
    }

    let geometry = SceneGeometry {
        vertices: sections.read(header.vertex_count()),
        triangles: sections.read(header.triangle_count()),
        material_indices: sections.read(header.triangle_count()),
        materials: sections.read(header.material_count()),
    };

    let missing_bytes = sections.missing;
    let trailing_bytes = sections.remaining.len();

    if missing_bytes > 0 {
        log::warn!(
            "Scene file is {} bytes short, missing data was zero-filled",
            missing_bytes
        );
    }
    if trailing_bytes > 0 {
        log::debug!("Ignoring {} trailing bytes", trailing_bytes);
    }

    Ok(LoadedScene {
        header,
        geometry,
        missing_bytes,
        trailing_bytes,
    })
}

/// Writes `geometry` to a new file at `path`.
pub fn save(path: impl AsRef<Path>, geometry: &SceneGeometry) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_to(&mut writer, geometry)?;
    writer.flush()?;
    log::info!("Wrote scene file: {}", path.display());
    Ok(())
}

/// Serializes `geometry` in scene file layout.
pub fn write_to<W: Write>(mut writer: W, geometry: &SceneGeometry) -> Result<()> {
    let header = SceneHeader::for_geometry(geometry)?;
    writer.write_all(bytemuck::bytes_of(&header))?;
    writer.write_all(bytemuck::cast_slice(&geometry.vertices))?;
    writer.write_all(bytemuck::cast_slice(&geometry.triangles))?;
    writer.write_all(bytemuck::cast_slice(&geometry.material_indices))?;
    writer.write_all(bytemuck::cast_slice(&geometry.materials))?;
    Ok(())
}

/// Sequential reader over the file body with `fread`-style short reads.
struct SectionReader<'a> {
    remaining: &'a [u8],
    missing: usize,
}

impl<'a> SectionReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            remaining: bytes,
            missing: 0,
        }
    }

    /// Reads `count` elements, zero-filling whatever is not available.
    fn read<T: Pod>(&mut self, count: usize) -> Vec<T> {
        let mut items = vec![T::zeroed(); count];
        let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut items);
        let available = dst.len().min(self.remaining.len());

        dst[..available].copy_from_slice(&self.remaining[..available]);
        self.remaining = &self.remaining[available..];
        self.missing += dst.len() - available;
        items
    }

    fn read_one<T: Pod>(&mut self) -> T {
        self.read::<T>(1).pop().unwrap_or_else(T::zeroed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::generate_squares;
    use std::io::Cursor;

    fn header_bytes(vertices: i32, triangles: i32, materials: i32) -> Vec<u8> {
        let header = SceneHeader {
            num_vertices: vertices,
            num_triangles: triangles,
            num_materials: materials,
        };
        bytemuck::bytes_of(&header).to_vec()
    }

    fn push_f32s(bytes: &mut Vec<u8>, values: &[f32]) {
        for value in values {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
    }

    fn push_i32s(bytes: &mut Vec<u8>, values: &[i32]) {
        for value in values {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
    }

    /// One triangle over three vertices with one material, written field by field.
    fn hand_written_file() -> Vec<u8> {
        let mut bytes = header_bytes(3, 1, 1);
        push_f32s(&mut bytes, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        push_i32s(&mut bytes, &[0, 1, 2]);
        push_i32s(&mut bytes, &[0]);
        push_f32s(&mut bytes, &[0.1, 0.2, 0.3, 0.05, 0.4, 0.5, 0.6]);
        bytes
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(SceneHeader::LEN, 12);
        assert_eq!(SceneHeader::default().expected_len(), 12);
    }

    #[test]
    fn test_read_hand_written_file() {
        let bytes = hand_written_file();
        let loaded = read_from(Cursor::new(&bytes), &LoadOptions::default()).unwrap();

        assert_eq!(
            loaded.header,
            SceneHeader {
                num_vertices: 3,
                num_triangles: 1,
                num_materials: 1,
            }
        );
        assert_eq!(loaded.header.expected_len(), bytes.len());
        assert!(loaded.is_complete());
        assert_eq!(loaded.trailing_bytes, 0);

        let geometry = &loaded.geometry;
        assert_eq!(geometry.vertices[1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(geometry.vertices[2], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(geometry.triangles, vec![Triangle::new(0, 1, 2)]);
        assert_eq!(geometry.material_indices, vec![0]);
        assert_eq!(
            geometry.materials,
            vec![Material {
                absorption: [0.1, 0.2, 0.3],
                scattering: 0.05,
                transmission: [0.4, 0.5, 0.6],
            }]
        );
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn test_byte_length_matches_header_counts() {
        let geometry = generate_squares(50);
        let mut bytes = Vec::new();
        write_to(&mut bytes, &geometry).unwrap();

        // 12 + 200 * 12 + 100 * 12 + 100 * 4 + 1 * 28
        assert_eq!(bytes.len(), 4040);

        let loaded = read_from(Cursor::new(&bytes), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.header.expected_len(), bytes.len());
        assert_eq!(loaded.geometry.vertex_count(), 200);
        assert_eq!(loaded.geometry.triangle_count(), 100);
        assert_eq!(loaded.geometry, geometry);
    }

    #[test]
    fn test_truncated_file_is_zero_filled() {
        let mut bytes = hand_written_file();
        // Drop the material record and the material index.
        bytes.truncate(bytes.len() - 28 - 4);

        let loaded = read_from(Cursor::new(&bytes), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.missing_bytes, 32);
        assert!(!loaded.is_complete());
        assert_eq!(loaded.geometry.triangles, vec![Triangle::new(0, 1, 2)]);
        assert_eq!(loaded.geometry.material_indices, vec![0]);
        assert_eq!(loaded.geometry.materials, vec![Material::zeroed()]);
    }

    #[test]
    fn test_partial_element_keeps_available_bytes() {
        let mut bytes = header_bytes(1, 0, 0);
        push_f32s(&mut bytes, &[2.0]);

        let loaded = read_from(Cursor::new(&bytes), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.geometry.vertices, vec![Vec3::new(2.0, 0.0, 0.0)]);
        assert_eq!(loaded.missing_bytes, 8);
    }

    #[test]
    fn test_empty_input() {
        let loaded = read_from(Cursor::new(Vec::new()), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.header, SceneHeader::default());
        assert_eq!(loaded.missing_bytes, SceneHeader::LEN);
        assert_eq!(loaded.geometry, SceneGeometry::default());
    }

    #[test]
    fn test_negative_counts_read_as_zero() {
        let mut bytes = header_bytes(-4, 1, 0);
        push_i32s(&mut bytes, &[0, 1, 2, 0]);

        let loaded = read_from(Cursor::new(&bytes), &LoadOptions::default()).unwrap();
        assert!(loaded.geometry.vertices.is_empty());
        assert_eq!(loaded.geometry.triangles, vec![Triangle::new(0, 1, 2)]);
        assert!(loaded.is_complete());
        // Indices point at vertices the file never provided.
        assert!(loaded.geometry.validate().is_err());
    }

    #[test]
    fn test_strict_rejects_short_file() {
        let mut bytes = hand_written_file();
        bytes.pop();

        let options = LoadOptions::new().size_check(SizeCheck::Strict);
        assert!(matches!(
            read_from(Cursor::new(&bytes), &options),
            Err(MeshCrashError::SceneFile(_))
        ));
    }

    #[test]
    fn test_strict_rejects_negative_count() {
        let bytes = header_bytes(0, -1, 0);
        let options = LoadOptions::new().size_check(SizeCheck::Strict);
        assert!(read_from(Cursor::new(&bytes), &options).is_err());
    }

    #[test]
    fn test_strict_accepts_complete_file_with_trailing_bytes() {
        let mut bytes = hand_written_file();
        bytes.extend_from_slice(&[0xAB; 5]);

        let options = LoadOptions::new().size_check(SizeCheck::Strict);
        let loaded = read_from(Cursor::new(&bytes), &options).unwrap();
        assert_eq!(loaded.trailing_bytes, 5);
        assert!(loaded.is_complete());
    }

    #[test]
    fn test_write_rejects_mismatched_material_indices() {
        let mut geometry = generate_squares(1);
        geometry.material_indices.pop();

        let mut bytes = Vec::new();
        assert!(write_to(&mut bytes, &geometry).is_err());
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "meshcrash-scene-file-{}.raw",
            std::process::id()
        ));
        let geometry = generate_squares(8);

        save(&path, &geometry).unwrap();
        let loaded = load(&path, &LoadOptions::default());
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.unwrap().geometry, geometry);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load("definitely/not/here/Scene.raw", &LoadOptions::default());
        assert!(matches!(result, Err(MeshCrashError::SceneFile(_))));
    }
}
