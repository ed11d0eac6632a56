//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

use crate::config::LoggingConfig;

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default filter
///
/// `RUST_LOG` still takes precedence when it is set. Returns `false` if a
/// logger was already installed.
pub fn init_with_level(level: &str) -> bool {
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env).try_init().is_ok()
}

/// Initialize the logging system from the `[logging]` config section
pub fn init_from_config(config: &LoggingConfig) -> bool {
    init_with_level(&config.level)
}
