//! Logging utilities
//!
//! This module initializes the logging backend for the application.

/// Initialize the logger
///
/// `RUST_LOG` takes precedence over the supplied level when set.
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    env_logger::init_from_env(env);
}
