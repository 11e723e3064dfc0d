//! Logging setup on top of the `log` facade.
//!
//! The library itself only emits through `log::{debug, info, warn, error}`;
//! embedders that already install a logger never need to call this.

use log::LevelFilter;

/// Install `env_logger`, honouring `RUST_LOG` when set.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(debug: bool) {
    let default_level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    if builder.try_init().is_ok() {
        log::debug!("Logging initialized at {default_level}");
    }
}
