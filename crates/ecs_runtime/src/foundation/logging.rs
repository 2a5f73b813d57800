//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Panics if a logger is already installed; use [`try_init`] when that may
/// be the case.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, returning `false` if a logger was already
/// installed
pub fn try_init() -> bool {
    env_logger::Builder::from_default_env()
        .is_test(cfg!(test))
        .try_init()
        .is_ok()
}
