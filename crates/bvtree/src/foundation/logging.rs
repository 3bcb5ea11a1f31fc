//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize logging at `level` unless `RUST_LOG` overrides it
pub fn init_with_level(level: log::LevelFilter) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str())).init();
}

/// Initialize logging for unit tests; repeated calls are ignored.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
