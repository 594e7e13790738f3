//! Tracing initializer for the binary. The library itself never configures
//! a subscriber or writes to stdout/stderr (`spec.md` §7: diagnostics go
//! through the caller-provided logging collaborator) — this module exists
//! only for `src/bin/patchwork.rs` to call once at startup.

use tracing_subscriber::EnvFilter;

/// Install a `tracing-subscriber` formatter honoring `RUST_LOG`, defaulting
/// to `info` when unset. Safe to call more than once; later calls are a
/// no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
