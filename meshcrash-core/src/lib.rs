//! # meshcrash core
//!
//! Building blocks for reproducing crashes in Steam Audio's static mesh and
//! scene commit paths.
//!
//! - **[`geometry`]**: mesh buffers and a deterministic scatter of unit squares
//! - **[`scene_file`]**: the flat binary `.raw` scene format, read leniently by default
//! - **[`backend`]**: the [`SceneBackend`] seam and its Steam Audio implementation
//! - **[`fault`]**: reports the module and offset of a fault before default handling
//! - **[`repro`]**: the generator and loader procedures the repro binaries run
//!
//! ## Quick Start
//!
//! ```no_run
//! use meshcrash_core::*;
//!
//! let _reporter = fault::install();
//! let desc = ReproDesc::generated_from_args(std::env::args());
//! let mut backend = SteamAudioBackend::new(desc.backend)?;
//! repro::run_generated_scenes(&mut backend, &desc)?;
//! # Ok::<(), MeshCrashError>(())
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod fault;
pub mod geometry;
pub mod math;
pub mod repro;
pub mod scene_file;

pub use backend::{BackendKind, SceneBackend, SteamAudioBackend};
pub use config::ReproDesc;
pub use error::{MeshCrashError, Result};
pub use geometry::{Material, MeshDeclaration, SceneGeometry, SquareScatter, Triangle};
pub use scene_file::{LoadOptions, LoadedScene, SceneHeader, SizeCheck};
