//! Tracing/logging setup shared by processes embedding the engine.

/// Initialize process-wide logging with settings from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&ObservabilityConfig::from_env());
}

/// Initialize process-wide logging with explicit settings.
pub fn init_with(config: &ObservabilityConfig) {
    tracing::init(config);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::ObservabilityConfig;
