use super::{BackendKind, SceneBackend};
use crate::error::{MeshCrashError, Result};
use crate::geometry::{Material, MeshDeclaration, Triangle};
use crate::math::Vec3;
use audionimbus::{
    Context, ContextSettings, EmbreeDevice, Point, Scene, SceneSettings, StaticMesh,
    StaticMeshSettings,
};
use audionimbus_sys as ffi;
use std::mem::size_of;
use std::ptr;

// Declared meshes hand the geometry buffers to the C API as-is.
const _: () = assert!(size_of::<Vec3>() == size_of::<ffi::IPLVector3>());
const _: () = assert!(size_of::<Triangle>() == size_of::<ffi::IPLTriangle>());
const _: () = assert!(size_of::<Material>() == size_of::<ffi::IPLMaterial>());

/// Steam Audio scene with an optional Embree device.
pub struct SteamAudioBackend {
    // Fields drop in declaration order: scene, then device, then context.
    scene: Scene,
    #[allow(dead_code)] // Must outlive the scene built on it
    embree_device: Option<EmbreeDevice>,
    #[allow(dead_code)] // Must outlive every object created from it
    context: Context,
    kind: BackendKind,
}

impl SteamAudioBackend {
    /// Creates a context, the Embree device if requested, and an empty scene.
    pub fn new(kind: BackendKind) -> Result<Self> {
        log::info!("Initializing Steam Audio scene backend ({})", kind);

        let context = Context::try_new(&ContextSettings::default()).map_err(|e| {
            MeshCrashError::SteamAudio(format!("Failed to create Steam Audio context: {}", e))
        })?;

        log::info!("Steam Audio context created");

        let embree_device = match kind {
            BackendKind::Embree => {
                let device = EmbreeDevice::new(&context).map_err(|e| {
                    MeshCrashError::SteamAudio(format!("Failed to create Embree device: {}", e))
                })?;
                log::info!("Created Embree device");
                Some(device)
            }
            BackendKind::Default => None,
        };

        let scene_settings = match &embree_device {
            Some(device) => SceneSettings::Embree {
                device: device.clone(),
            },
            None => SceneSettings::Default,
        };

        let scene = Scene::try_new(&context, &scene_settings)
            .map_err(|e| MeshCrashError::SteamAudio(format!("Failed to create scene: {}", e)))?;

        log::info!("Created Steam Audio scene");

        Ok(Self {
            scene,
            embree_device,
            context,
            kind,
        })
    }

    /// Creates the mesh through the C API with the declared triangle count.
    fn create_declared_mesh(&self, declaration: &MeshDeclaration<'_>) -> Result<DeclaredMesh> {
        let count = |what: &str, len: usize| {
            i32::try_from(len).map_err(|_| {
                MeshCrashError::Geometry(format!("{} count {} does not fit in i32", what, len))
            })
        };

        let mut settings = ffi::IPLStaticMeshSettings {
            numVertices: count("vertex", declaration.vertices.len())?,
            numTriangles: count("triangle", declaration.declared_triangles())?,
            numMaterials: count("material", declaration.materials.len())?,
            vertices: declaration.vertices.as_ptr() as *mut ffi::IPLVector3,
            triangles: declaration.triangles.as_ptr() as *mut ffi::IPLTriangle,
            materialIndices: declaration.material_indices.as_ptr() as *mut ffi::IPLint32,
            materials: declaration.materials.as_ptr() as *mut ffi::IPLMaterial,
        };

        log::warn!(
            "Creating static mesh: {} triangles declared over {} present, {} material indices",
            declaration.declared_triangles(),
            declaration.triangles.len(),
            declaration.material_indices.len()
        );

        let mut handle: ffi::IPLStaticMesh = ptr::null_mut();
        // The library reads `numTriangles` entries from both index arrays. Past
        // the end of the buffers that read is the fault under investigation.
        let status = unsafe {
            ffi::iplStaticMeshCreate(self.scene.raw_ptr(), &mut settings, &mut handle)
        };

        match status {
            ffi::IPLerror::IPL_STATUS_SUCCESS => Ok(DeclaredMesh { handle }),
            status => Err(MeshCrashError::SteamAudio(format!(
                "Failed to create static mesh: {:?}",
                status
            ))),
        }
    }
}

/// Static mesh owned by a [`SteamAudioBackend`].
pub enum SteamAudioMesh {
    /// Built through the safe bindings; buffers and declared counts agree
    Exact(StaticMesh),
    /// Built through the C API with a declared triangle count of its own
    Declared(DeclaredMesh),
}

/// Static mesh handle created directly through the C API, released on drop.
pub struct DeclaredMesh {
    handle: ffi::IPLStaticMesh,
}

impl Drop for DeclaredMesh {
    fn drop(&mut self) {
        unsafe {
            ffi::iplStaticMeshRelease(&mut self.handle);
        }
    }
}

impl SceneBackend for SteamAudioBackend {
    type Mesh = SteamAudioMesh;

    fn create_static_mesh(
        &mut self,
        declaration: &MeshDeclaration<'_>,
    ) -> Result<SteamAudioMesh> {
        if !declaration.is_exact() {
            return self.create_declared_mesh(declaration).map(SteamAudioMesh::Declared);
        }

        // Steam Audio copies these during creation.
        let vertices: Vec<Point> = declaration.vertices.iter().copied().map(to_point).collect();
        let triangles: Vec<audionimbus::Triangle> = declaration
            .triangles
            .iter()
            .copied()
            .map(to_triangle)
            .collect();
        let material_indices: Vec<usize> = declaration
            .material_indices
            .iter()
            .map(|&index| index as usize)
            .collect();
        let materials: Vec<audionimbus::Material> =
            declaration.materials.iter().copied().map(to_material).collect();

        log::debug!(
            "Creating static mesh: {} vertices, {} triangles declared, {} material indices, {} materials",
            vertices.len(),
            triangles.len(),
            material_indices.len(),
            materials.len()
        );

        StaticMesh::try_new(
            &self.scene,
            &StaticMeshSettings {
                vertices: &vertices,
                triangles: &triangles,
                material_indices: &material_indices,
                materials: &materials,
            },
        )
        .map(SteamAudioMesh::Exact)
        .map_err(|e| MeshCrashError::SteamAudio(format!("Failed to create static mesh: {}", e)))
    }

    fn add_static_mesh(&mut self, mesh: &SteamAudioMesh) {
        match mesh {
            SteamAudioMesh::Exact(mesh) => self.scene.add_static_mesh(mesh.clone()),
            SteamAudioMesh::Declared(mesh) => unsafe {
                ffi::iplStaticMeshAdd(mesh.handle, self.scene.raw_ptr());
            },
        }
    }

    fn remove_static_mesh(&mut self, mesh: &SteamAudioMesh) {
        match mesh {
            SteamAudioMesh::Exact(mesh) => self.scene.remove_static_mesh(mesh),
            SteamAudioMesh::Declared(mesh) => unsafe {
                ffi::iplStaticMeshRemove(mesh.handle, self.scene.raw_ptr());
            },
        }
    }

    fn commit(&mut self) {
        self.scene.commit();
    }

    fn save_obj(&self, path: &str) -> Result<()> {
        self.scene.save_obj(path.to_string());
        Ok(())
    }
}

impl Drop for SteamAudioBackend {
    fn drop(&mut self) {
        log::debug!("Releasing Steam Audio scene backend ({})", self.kind);
    }
}

fn to_point(vertex: Vec3) -> Point {
    Point::new(vertex.x, vertex.y, vertex.z)
}

fn to_triangle(triangle: Triangle) -> audionimbus::Triangle {
    let [a, b, c] = triangle.indices;
    audionimbus::Triangle::new(a, b, c)
}

fn to_material(material: Material) -> audionimbus::Material {
    audionimbus::Material {
        absorption: material.absorption,
        scattering: material.scattering,
        transmission: material.transmission,
    }
}
