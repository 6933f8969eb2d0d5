use serde::{Deserialize, Serialize};

/// One flywheel sensor impulse, timestamps in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlywheelImpulse {
    pub raw_impulse_count: u64,
    pub delta_time: u64,
    pub total_time: u64,
    pub total_angular_displacement: f64,
    pub clean_impulse_time: u64,
    pub raw_impulse_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CyclePhase {
    #[default]
    Stopped,
    Drive,
    Recovery,
}

/// Metric snapshot; times and durations in microseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowingMetrics {
    pub distance: f64,
    pub last_rev_time: f64,
    pub last_stroke_time: f64,
    pub stroke_count: u32,
    pub drive_duration: f64,
    pub recovery_duration: f64,
    pub avg_stroke_power: f64,
    pub drag_coefficient: f64,
    pub drive_handle_forces: Vec<f64>,
}
