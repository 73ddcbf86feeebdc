use env_logger::Env;
use log::LevelFilter;

/// Initialize the logger with the given [LevelFilter]
///
/// `RUST_LOG` still takes precedence for finer grained filtering.
pub fn initialize_logger(filter: LevelFilter) {
    env_logger::Builder::from_env(Env::default().default_filter_or(filter.as_str()))
        .format_target(false)
        .format_timestamp(None)
        .init();
}
