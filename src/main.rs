fn main() {
    #[cfg(feature = "cli")]
    blockdelta::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("blockdelta: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
