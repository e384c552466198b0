//! Process-wide log setup for the `maintstock` binary.

pub mod tracing;

/// Install the JSON stderr subscriber. Later calls are no-ops.
pub fn init() {
    tracing::init();
}
