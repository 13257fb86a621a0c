//! Tracing, logging, and metrics setup shared by every binary in the
//! workspace.

pub mod metrics;
pub mod tracing;

/// Initialize process-wide logging. Safe to call multiple times.
pub fn init() {
    tracing::init();
}
