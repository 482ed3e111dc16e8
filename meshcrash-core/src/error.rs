//! Error types for meshcrash

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeshCrashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene file error: {0}")]
    SceneFile(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Steam Audio error: {0}")]
    SteamAudio(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, MeshCrashError>;
