use crate::config::LogLevel;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a process-wide `tracing-subscriber` from `level`, honoring `RUST_LOG` if set.
///
/// This is a convenience only; the core library never forces a particular subscriber on its
/// embedder, and a binary that wants JSON output or a different subscriber entirely is free to
/// skip this and wire `tracing` up itself.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_tracing_filter()));
    fmt().with_env_filter(filter).with_target(true).init();
}
