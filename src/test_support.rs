//! Synthetic flywheel used by the engine and replay tests.

use std::f64::consts::PI;

use crate::api::FlywheelImpulse;

/// Rower pulling a half-sine torque against quadratic air drag.
#[derive(Debug, Clone)]
pub(crate) struct SimulatedSession {
    pub strokes: usize,
    pub flywheel_inertia: f64,
    pub drag_coefficient: f64,
    pub impulses_per_revolution: u32,
    pub drive_seconds: f64,
    pub recovery_seconds: f64,
    pub peak_torque: f64,
    pub time_step: f64,
    /// Idle seconds after the last stroke.
    pub tail: f64,
}

impl Default for SimulatedSession {
    fn default() -> Self {
        Self {
            strokes: 8,
            flywheel_inertia: 0.073,
            drag_coefficient: 100e-6,
            impulses_per_revolution: 3,
            drive_seconds: 0.8,
            recovery_seconds: 1.6,
            peak_torque: 40.0,
            time_step: 1e-5,
            tail: 0.0,
        }
    }
}

/// Integrates the flywheel and returns the microsecond gaps between impulses.
pub(crate) fn flywheel_delta_times(session: &SimulatedSession) -> Vec<u64> {
    let step = 2.0 * PI / session.impulses_per_revolution as f64;
    let period = session.drive_seconds + session.recovery_seconds;
    let total = session.strokes as f64 * period + session.tail;

    let mut omega: f64 = 0.0;
    let mut angle = 0.0;
    let mut t = 0.0;
    let mut next_impulse = step;
    let mut last_impulse = 0.0;
    let mut delta_times = Vec::new();

    while t < total {
        let phase = t % period;
        let stroke = (t / period) as usize;
        let torque = if phase < session.drive_seconds && stroke < session.strokes {
            session.peak_torque * (PI * phase / session.drive_seconds).sin()
        } else {
            0.0
        };

        omega += (torque - session.drag_coefficient * omega * omega) / session.flywheel_inertia
            * session.time_step;
        omega = omega.max(0.0);
        angle += omega * session.time_step;
        t += session.time_step;

        while angle >= next_impulse {
            delta_times.push(((t - last_impulse) * 1e6 + 0.5).floor() as u64);
            last_impulse = t;
            next_impulse += step;
        }
    }

    delta_times
}

/// Accumulates raw gaps into impulses the way the replay worker does, minus debouncing.
pub(crate) fn impulses_from_delta_times(
    delta_times: &[u64],
    impulses_per_revolution: u32,
) -> Vec<FlywheelImpulse> {
    let step = 2.0 * PI / impulses_per_revolution as f64;
    let mut total_time = 0;
    let mut angle = 0.0;

    delta_times
        .iter()
        .enumerate()
        .map(|(index, &delta_time)| {
            total_time += delta_time;
            angle += step;
            FlywheelImpulse {
                raw_impulse_count: index as u64 + 1,
                delta_time,
                total_time,
                total_angular_displacement: angle,
                clean_impulse_time: total_time,
                raw_impulse_time: total_time,
            }
        })
        .collect()
}
