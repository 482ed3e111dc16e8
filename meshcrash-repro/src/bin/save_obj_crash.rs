fn main() -> anyhow::Result<()> {
    meshcrash_repro::cli::init_logging();
    meshcrash_repro::cli::run_save_obj_crash(std::env::args())
}
