//! Structured log output for the encoding pipeline.
//!
//! ## Log Levels
//!
//! - **INFO**: Stage boundaries (decompose, propagate, encode)
//! - **DEBUG**: Per-variable narrowing and per-session clause counts
//! - **TRACE**: Individual split, guard and digit decisions

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "cspforge_encoder=info,cspforge_core=info";

/// Installs a global `tracing` subscriber writing to stderr.
///
/// Safe to call multiple times - only the first call has effect. Does
/// nothing if another global subscriber is already set.
pub fn init() {
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init();
    });
}

/// True once [`init`] has run.
pub fn is_initialized() -> bool {
    INIT.get().is_some()
}
