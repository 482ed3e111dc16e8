//! Scene backends that static meshes are registered with.
//!
//! [`SceneBackend`] covers the handful of scene calls the repro procedures make.
//! [`SteamAudioBackend`] forwards them to Steam Audio. Tests drive the
//! procedures through a recording implementation instead.

mod steam_audio;

pub use steam_audio::{DeclaredMesh, SteamAudioBackend, SteamAudioMesh};

use crate::error::Result;
use crate::geometry::MeshDeclaration;

/// Ray-tracing implementation backing a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Steam Audio's built-in ray tracer
    #[default]
    Default,
    /// Intel Embree, through an Embree device owned by the backend
    Embree,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Embree => write!(f, "embree"),
        }
    }
}

/// A scene that static meshes can be created in, added to and removed from.
///
/// Meshes are released by dropping them. A mesh must not outlive the backend
/// that created it.
pub trait SceneBackend {
    type Mesh;

    /// Creates a static mesh from the declared buffers.
    ///
    /// The buffers only need to live for the duration of the call.
    fn create_static_mesh(&mut self, declaration: &MeshDeclaration<'_>) -> Result<Self::Mesh>;

    fn add_static_mesh(&mut self, mesh: &Self::Mesh);

    fn remove_static_mesh(&mut self, mesh: &Self::Mesh);

    /// Applies pending additions and removals.
    fn commit(&mut self);

    /// Exports the committed scene as a Wavefront OBJ file.
    fn save_obj(&self, path: &str) -> Result<()>;
}
