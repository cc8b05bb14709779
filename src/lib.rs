//! Event-shape analysis of collider final states.
//!
//! Thrust, major, minor, and oblateness are computed by two interchangeable optimizers:
//! an exhaustive-seed baseline and a single-seed accelerated variant. The workspace crates
//! are re-exported here so binaries, tests, and benchmarks share one entry point.

pub use shapes_config as config;
pub use shapes_core as kinematics;
pub use shapes_export as export;
pub use shapes_generator as generator;
pub use shapes_harness as harness;
pub use shapes_thrust as thrust;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
