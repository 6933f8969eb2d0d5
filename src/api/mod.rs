pub mod config;
pub mod types;

pub use config::{RowingProfile, StrokeDetectionType, PRESET_NAMES};
pub use types::{CyclePhase, FlywheelImpulse, RowingMetrics};
