//! The two repro procedures.
//!
//! Both run strictly in sequence against a [`SceneBackend`]. Each mesh is
//! created, used and released within a single pass.

use crate::backend::SceneBackend;
use crate::config::ReproDesc;
use crate::error::Result;
use crate::geometry::SceneGeometry;
use crate::scene_file;

/// Generates scattered squares and exports the scene once per configured count.
///
/// Per pass: create → add → commit → export OBJ → remove → commit → release.
pub fn run_generated_scenes<B: SceneBackend>(backend: &mut B, desc: &ReproDesc) -> Result<()> {
    desc.validate()?;

    for (index, &count) in desc.square_counts.iter().enumerate() {
        let pass = index + 1;
        log::info!("Pass {}: generating {} squares", pass, count);

        let geometry = desc.scatter.generate(count);
        debug_assert!(geometry.validate().is_ok());
        log_geometry(&geometry);

        if desc.write_raw {
            scene_file::save(desc.raw_path(pass), &geometry)?;
        }

        let mesh = backend.create_static_mesh(&geometry.declare(None))?;
        log::debug!("Static mesh created");

        backend.add_static_mesh(&mesh);
        backend.commit();
        log::debug!("Static mesh added and committed");

        let obj_path = desc.obj_path(pass);
        backend.save_obj(&obj_path)?;
        log::info!("Exported scene to {}", obj_path);

        backend.remove_static_mesh(&mesh);
        backend.commit();
        drop(mesh);
        log::debug!("Static mesh removed and released");
    }

    Ok(())
}

/// Loads the scene file and pushes it through mesh creation.
///
/// The mesh is never added to the scene: create → remove → commit → release.
pub fn run_loaded_scene<B: SceneBackend>(backend: &mut B, desc: &ReproDesc) -> Result<()> {
    let loaded = scene_file::load(&desc.scene_path, &desc.load_options)?;
    log_geometry(&loaded.geometry);

    let declaration = loaded.geometry.declare(desc.load_options.triangle_limit);
    log::info!(
        "Creating static mesh with {} declared triangles",
        declaration.declared_triangles()
    );

    let mesh = backend.create_static_mesh(&declaration)?;
    log::debug!("Static mesh created");

    backend.remove_static_mesh(&mesh);
    backend.commit();
    drop(mesh);
    log::debug!("Static mesh removed and released");

    Ok(())
}

fn log_geometry(geometry: &SceneGeometry) {
    log::info!(
        "Geometry: {} vertices, {} triangles, {} materials",
        geometry.vertex_count(),
        geometry.triangle_count(),
        geometry.material_count()
    );
    if let Some(bounds) = geometry.bounds() {
        log::debug!("Bounds: min {:?}, max {:?}", bounds.min, bounds.max);
    }
}
