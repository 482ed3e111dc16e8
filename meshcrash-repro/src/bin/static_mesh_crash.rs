fn main() -> anyhow::Result<()> {
    meshcrash_repro::cli::init_logging();
    meshcrash_repro::cli::run_static_mesh_crash(std::env::args())
}
