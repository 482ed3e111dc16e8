use anyhow::{Context, Result};
use meshcrash_core::{ReproDesc, SteamAudioBackend, fault, repro};

/// Logs at debug level unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .init();
}

/// Generates scattered-square scenes and exports each as OBJ.
pub fn run_save_obj_crash<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let _reporter = fault::install();

    let desc = ReproDesc::generated_from_args(args);
    log::info!(
        "=== Generated scene repro (backend: {}, passes: {:?}) ===",
        desc.backend,
        desc.square_counts
    );

    let mut backend = SteamAudioBackend::new(desc.backend)
        .inspect_err(|e| log::error!("Scene setup failed: {}", e))
        .context("Failed to set up the Steam Audio scene")?;

    repro::run_generated_scenes(&mut backend, &desc)
        .inspect_err(|e| log::error!("Generated scene repro failed: {}", e))
        .context("Generated scene repro failed")?;

    log::info!("Generated scene repro completed without a fault");
    Ok(())
}

/// Loads `Scene.raw` and pushes it through static mesh creation.
pub fn run_static_mesh_crash<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let _reporter = fault::install();

    let desc = ReproDesc::loaded_from_args(args);
    log::info!(
        "=== Loaded scene repro (backend: {}, scene: {}, triangle limit: {:?}) ===",
        desc.backend,
        desc.scene_path.display(),
        desc.load_options.triangle_limit
    );

    let mut backend = SteamAudioBackend::new(desc.backend)
        .inspect_err(|e| log::error!("Scene setup failed: {}", e))
        .context("Failed to set up the Steam Audio scene")?;

    repro::run_loaded_scene(&mut backend, &desc)
        .inspect_err(|e| log::error!("Loaded scene repro failed: {}", e))
        .context("Loaded scene repro failed")?;

    log::info!("Loaded scene repro completed without a fault");
    Ok(())
}
