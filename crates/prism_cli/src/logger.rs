use log::LevelFilter;

/// Initialize the logger. `RUST_LOG` wins over `level` when it is set.
pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}
