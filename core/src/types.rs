//! Shared primitive types used across the entire simulation.

/// Simulated or real time, in milliseconds.
/// Real and simulated time share the unit but never the clock.
pub type Millis = f64;

/// Stable identifier of a burning log. Assigned monotonically from 1.
pub type LogId = u64;

/// Frame counter kept by the clock. One frame = one display refresh.
pub type Frame = u64;
