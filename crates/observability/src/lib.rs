//! Tracing/logging setup shared by the SCM binaries.

/// Initialize process-wide logging with the default filter (`info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env(), "info");
}

/// Tracing configuration (filters, output format).
pub mod tracing;
