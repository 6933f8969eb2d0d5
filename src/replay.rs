//! Offline calibration: replays a recorded delta-time log through a fresh engine.

use std::f64::consts::PI;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::api::{FlywheelImpulse, RowingMetrics, RowingProfile};
use crate::stroke::StrokeDetectionEngine;
use crate::util::floor_to_thousand;

#[derive(Debug, Clone)]
pub struct ReplayRequest {
    pub delta_times: Vec<u64>,
    pub profile: RowingProfile,
}

impl ReplayRequest {
    pub fn new(delta_times: Vec<u64>, profile: RowingProfile) -> Result<Self> {
        profile
            .validate()
            .context("Profile cannot drive a replay")?;
        Ok(Self {
            delta_times,
            profile,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    /// One snapshot per detected stroke, then the final state.
    pub rowing_metrics: Vec<RowingMetrics>,
    /// Accepted delta-times with the stroke count inserted after each completing impulse.
    pub delta_times_log: Vec<u64>,
    pub margin_detect_count: u32,
    pub min_delta_time: Option<u64>,
    pub min_delta_time_chart_value: Option<u64>,
}

impl CalibrationReport {
    pub fn final_metrics(&self) -> Option<&RowingMetrics> {
        self.rowing_metrics.last()
    }

    /// Per-stroke snapshots, without the trailing final state.
    pub fn stroke_metrics(&self) -> &[RowingMetrics] {
        match self.rowing_metrics.split_last() {
            Some((_, strokes)) => strokes,
            None => &[],
        }
    }
}

/// Turns accepted raw delta-times into cumulative impulses, dropping sensor bounces.
#[derive(Debug, Clone)]
struct ImpulseAccumulator {
    debounce: f64,
    angular_displacement_per_impulse: f64,
    impulse_count: u64,
    total_time: u64,
    total_angular_displacement: f64,
}

impl ImpulseAccumulator {
    fn new(profile: &RowingProfile) -> Self {
        Self {
            debounce: profile.rotation_debounce_time_min * 1_000.0,
            angular_displacement_per_impulse: 2.0 * PI / profile.impulses_per_revolution as f64,
            impulse_count: 0,
            total_time: 0,
            total_angular_displacement: 0.0,
        }
    }

    fn accept(&mut self, delta_time: u64) -> Option<FlywheelImpulse> {
        if (delta_time as f64) < self.debounce {
            return None;
        }

        self.impulse_count += 1;
        self.total_time += delta_time;
        self.total_angular_displacement += self.angular_displacement_per_impulse;

        Some(FlywheelImpulse {
            raw_impulse_count: self.impulse_count,
            delta_time,
            total_time: self.total_time,
            total_angular_displacement: self.total_angular_displacement,
            clean_impulse_time: self.total_time,
            raw_impulse_time: self.total_time,
        })
    }
}

pub fn replay(request: &ReplayRequest) -> CalibrationReport {
    let profile = &request.profile;

    info!(
        "Replaying {} delta-times ({} impulses/rev, {:?} detection)",
        request.delta_times.len(),
        profile.impulses_per_revolution,
        profile.stroke_detection_type
    );

    let mut engine = StrokeDetectionEngine::new(profile.clone());
    let mut impulses = ImpulseAccumulator::new(profile);
    let mut rowing_metrics = Vec::new();
    let mut delta_times_log = Vec::with_capacity(request.delta_times.len());
    let mut min_delta_time: Option<u64> = None;
    let mut stroke_count = 0;

    for &delta_time in &request.delta_times {
        min_delta_time = Some(min_delta_time.map_or(delta_time, |min| min.min(delta_time)));

        let Some(impulse) = impulses.accept(delta_time) else {
            continue;
        };

        delta_times_log.push(delta_time);
        engine.process_data(&impulse);

        let metrics = engine.data();
        if metrics.stroke_count > stroke_count {
            stroke_count = metrics.stroke_count;
            delta_times_log.push(u64::from(stroke_count));
            rowing_metrics.push(metrics);
        }
    }

    rowing_metrics.push(engine.data());

    info!(
        "Replay finished: {} impulses kept, {} bounces dropped, {} strokes",
        impulses.impulse_count,
        request.delta_times.len() as u64 - impulses.impulse_count,
        stroke_count
    );

    CalibrationReport {
        rowing_metrics,
        delta_times_log,
        margin_detect_count: engine.margin_detect_count(),
        min_delta_time,
        min_delta_time_chart_value: min_delta_time.map(floor_to_thousand),
    }
}

/// Runs the replay on the blocking pool and resolves once with the whole report.
pub async fn replay_in_background(request: ReplayRequest) -> Result<CalibrationReport> {
    tokio::task::spawn_blocking(move || replay(&request))
        .await
        .context("Replay task failed")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceCurveExtent {
    pub len: usize,
    pub stroke_index: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationTotals {
    pub distance: f64,
    pub stroke_count: u32,
    pub last_rev_time: f64,
    pub last_stroke_time: f64,
    pub drag_coefficient: f64,
    pub drive_duration: f64,
    pub recovery_duration: f64,
    pub avg_stroke_power: f64,
    pub shortest_force_curve: Option<ForceCurveExtent>,
    pub longest_force_curve: Option<ForceCurveExtent>,
}

impl CalibrationTotals {
    pub fn from_report(report: &CalibrationReport) -> Self {
        let mut totals = Self::default();

        if let Some(last) = report.final_metrics() {
            totals.distance = last.distance;
            totals.stroke_count = last.stroke_count;
            totals.last_rev_time = last.last_rev_time;
            totals.last_stroke_time = last.last_stroke_time;
        }

        let strokes = report.stroke_metrics();
        if strokes.is_empty() {
            return totals;
        }

        let count = strokes.len() as f64;
        let mean = |field: fn(&RowingMetrics) -> f64| strokes.iter().map(field).sum::<f64>() / count;
        totals.drag_coefficient = mean(|m| m.drag_coefficient);
        totals.drive_duration = mean(|m| m.drive_duration);
        totals.recovery_duration = mean(|m| m.recovery_duration);
        totals.avg_stroke_power = mean(|m| m.avg_stroke_power);

        for (stroke_index, metrics) in strokes.iter().enumerate() {
            let extent = ForceCurveExtent {
                len: metrics.drive_handle_forces.len(),
                stroke_index,
            };
            // strict comparisons keep the earliest stroke on ties
            if totals.shortest_force_curve.map_or(true, |s| extent.len < s.len) {
                totals.shortest_force_curve = Some(extent);
            }
            if totals.longest_force_curve.map_or(true, |l| extent.len > l.len) {
                totals.longest_force_curve = Some(extent);
            }
        }

        totals
    }
}
