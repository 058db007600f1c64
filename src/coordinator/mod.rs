//! Score coordinator.
//!
//! Decides, per restaurant, whether to serve a cached score, report a
//! computation already in flight, or launch a new one. At most one
//! computation per restaurant runs at any time, and its in-flight marker is
//! removed however the computation ends.

mod clock;
mod engine;
mod inflight;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{CoordinatorOptions, CoordinatorStats, ScoreCoordinator};
pub use inflight::{InFlightGuard, InFlightTable};
