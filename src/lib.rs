pub mod api;
pub mod args;
pub mod replay;
pub mod series;
pub mod stroke;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{CyclePhase, FlywheelImpulse, RowingMetrics, RowingProfile, StrokeDetectionType};
pub use replay::{replay, replay_in_background, CalibrationReport, CalibrationTotals, ReplayRequest};
pub use stroke::StrokeDetectionEngine;
