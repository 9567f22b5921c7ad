// fieldguard/src/logger.rs
//! Logger setup for the fieldguard binary and its tests.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes `env_logger`, writing to stderr.
///
/// `Some(level)` forces that level for everything; `None` defers to
/// `RUST_LOG` and falls back to `warn`. Safe to call more than once: later
/// calls are ignored.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).format_target(true);
    let _ = builder.try_init();
}

/// Maps the `--quiet` / `--debug` flags onto a level override.
pub fn level_for(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}
