//! Rowing stroke phase detection.
//!
//! Consumes flywheel impulses one at a time, estimates angular velocity and
//! acceleration with a robust quadratic fit over the impulse window, derives the
//! handle torque and walks the Stopped → Drive → Recovery cycle. Drag factor, power
//! and distance are settled at the end of each recovery.

use std::collections::VecDeque;
use std::f64::consts::PI;

use log::{debug, warn};

use crate::api::{CyclePhase, FlywheelImpulse, RowingMetrics, RowingProfile, StrokeDetectionType};
use crate::series::{OlsLinear, TheilSenLinear, TheilSenQuadratic, WeightedAverage};

/// Upper bound on handle force samples per drive. Reaching it force-ends the drive;
/// this is a heuristic guard against a drive that never detects its end.
pub const MAX_DRIVE_HANDLE_FORCES: usize = 255;

/// Profile in engine units: microseconds, metres and raw drag coefficients.
#[derive(Debug, Clone)]
struct EngineSettings {
    flywheel_inertia: f64,
    sprocket_radius: f64,
    concept2_magic_number: f64,
    rowing_stopped_threshold_period: f64,
    goodness_of_fit_threshold: f64,
    max_drag_factor_recovery_period: f64,
    lower_drag_factor_threshold: f64,
    upper_drag_factor_threshold: f64,
    drag_coefficients_array_length: usize,
    stroke_detection_type: StrokeDetectionType,
    minimum_powered_torque: f64,
    minimum_drag_torque: f64,
    minimum_recovery_slope_margin: f64,
    minimum_recovery_slope: f64,
    minimum_recovery_time: f64,
    minimum_drive_time: f64,
    impulse_data_array_length: usize,
}

impl EngineSettings {
    fn from_profile(profile: &RowingProfile) -> Self {
        Self {
            flywheel_inertia: profile.flywheel_inertia,
            sprocket_radius: profile.sprocket_radius / 100.0,
            concept2_magic_number: profile.concept2_magic_number,
            rowing_stopped_threshold_period: profile.rowing_stopped_threshold_period * 1e6,
            goodness_of_fit_threshold: profile.goodness_of_fit_threshold,
            max_drag_factor_recovery_period: profile.max_drag_factor_recovery_period * 1e6,
            lower_drag_factor_threshold: profile.lower_drag_factor_threshold / 1e6,
            upper_drag_factor_threshold: profile.upper_drag_factor_threshold / 1e6,
            drag_coefficients_array_length: profile.drag_coefficients_array_length as usize,
            stroke_detection_type: profile.stroke_detection_type,
            minimum_powered_torque: profile.minimum_powered_torque,
            minimum_drag_torque: profile.minimum_drag_torque,
            minimum_recovery_slope_margin: profile.minimum_recovery_slope_margin / 1e6,
            minimum_recovery_slope: profile.minimum_recovery_slope,
            minimum_recovery_time: profile.minimum_recovery_time * 1_000.0,
            minimum_drive_time: profile.minimum_drive_time * 1_000.0,
            impulse_data_array_length: profile.impulse_data_array_length as usize,
        }
    }
}

/// Session-scoped stroke detector. One instance per impulse source.
#[derive(Debug, Clone)]
pub struct StrokeDetectionEngine {
    profile: RowingProfile,
    settings: EngineSettings,
    angular_displacement_per_impulse: f64,

    delta_times: TheilSenLinear,
    angular_distances: TheilSenQuadratic,
    delta_times_slopes: OlsLinear,
    recovery_delta_times: OlsLinear,
    drag_coefficients: WeightedAverage,
    angular_velocity_matrix: VecDeque<WeightedAverage>,
    angular_acceleration_matrix: VecDeque<WeightedAverage>,

    cycle_phase: CyclePhase,
    current_angular_velocity: f64,
    current_angular_acceleration: f64,
    current_torque: f64,
    drag_coefficient: f64,
    distance_per_angular_displacement: f64,
    margin_detect_count: u32,

    rowing_impulse_count: u64,
    rowing_total_time: f64,
    rowing_total_angular_displacement: f64,
    rev_time: f64,
    distance: f64,
    stroke_count: u32,
    stroke_time: f64,
    avg_stroke_power: f64,

    drive_start_time: f64,
    drive_start_angular_displacement: f64,
    drive_duration: f64,
    drive_total_angular_displacement: f64,
    drive_handle_forces: Vec<f64>,

    recovery_start_time: f64,
    recovery_start_angular_displacement: f64,
    recovery_start_distance: f64,
    recovery_duration: f64,
    recovery_total_angular_displacement: f64,
}

impl StrokeDetectionEngine {
    pub fn new(profile: RowingProfile) -> Self {
        let settings = EngineSettings::from_profile(&profile);
        let window = settings.impulse_data_array_length;

        let mut engine = Self {
            angular_displacement_per_impulse: (2.0 * PI) / profile.impulses_per_revolution as f64,
            delta_times: TheilSenLinear::new(window),
            angular_distances: TheilSenQuadratic::new(window),
            delta_times_slopes: OlsLinear::new(window),
            recovery_delta_times: OlsLinear::new(0),
            drag_coefficients: WeightedAverage::new(settings.drag_coefficients_array_length),
            angular_velocity_matrix: VecDeque::with_capacity(window),
            angular_acceleration_matrix: VecDeque::with_capacity(window),
            cycle_phase: CyclePhase::Stopped,
            current_angular_velocity: 0.0,
            current_angular_acceleration: 0.0,
            current_torque: 0.0,
            drag_coefficient: 0.0,
            distance_per_angular_displacement: 0.0,
            margin_detect_count: 0,
            rowing_impulse_count: 0,
            rowing_total_time: 0.0,
            rowing_total_angular_displacement: 0.0,
            rev_time: 0.0,
            distance: 0.0,
            stroke_count: 0,
            stroke_time: 0.0,
            avg_stroke_power: 0.0,
            drive_start_time: 0.0,
            drive_start_angular_displacement: 0.0,
            drive_duration: 0.0,
            drive_total_angular_displacement: 0.0,
            drive_handle_forces: Vec::with_capacity(MAX_DRIVE_HANDLE_FORCES),
            recovery_start_time: 0.0,
            recovery_start_angular_displacement: 0.0,
            recovery_start_distance: 0.0,
            recovery_duration: 0.0,
            recovery_total_angular_displacement: 0.0,
            profile,
            settings,
        };

        // both timing fits start from the session origin
        engine.delta_times.push(0.0, 0.0);
        engine.angular_distances.push(0.0, 0.0);
        engine
    }

    /// Drops all session state and re-derives the normalised settings.
    pub fn reset(&mut self) {
        *self = Self::new(self.profile.clone());
    }

    pub fn data(&self) -> RowingMetrics {
        RowingMetrics {
            distance: self.distance,
            last_rev_time: self.rev_time,
            last_stroke_time: self.stroke_time,
            stroke_count: self.stroke_count,
            drive_duration: self.drive_duration,
            recovery_duration: self.recovery_duration,
            avg_stroke_power: self.avg_stroke_power,
            drag_coefficient: self.drag_coefficient,
            drive_handle_forces: self.drive_handle_forces.clone(),
        }
    }

    pub fn profile(&self) -> &RowingProfile {
        &self.profile
    }

    pub fn cycle_phase(&self) -> CyclePhase {
        self.cycle_phase
    }

    /// How often the delta-time plateau check ended a drive.
    pub fn margin_detect_count(&self) -> u32 {
        self.margin_detect_count
    }

    pub fn current_torque(&self) -> f64 {
        self.current_torque
    }

    pub fn current_angular_velocity(&self) -> f64 {
        self.current_angular_velocity
    }

    pub fn current_angular_acceleration(&self) -> f64 {
        self.current_angular_acceleration
    }

    pub fn process_data(&mut self, impulse: &FlywheelImpulse) {
        self.delta_times
            .push(impulse.total_time as f64, impulse.delta_time as f64);
        self.angular_distances.push(
            impulse.total_time as f64 / 1e6,
            impulse.total_angular_displacement,
        );

        self.update_angular_kinematics();

        self.current_torque = self.settings.flywheel_inertia * self.current_angular_acceleration
            + self.drag_coefficient * self.current_angular_velocity.powi(2);

        if self.cycle_phase == CyclePhase::Recovery
            && self.rowing_total_time - self.recovery_start_time
                > self.settings.rowing_stopped_threshold_period
        {
            self.drive_handle_forces.clear();
            self.recovery_end();
            self.cycle_phase = CyclePhase::Stopped;
            self.drive_duration = 0.0;
            self.avg_stroke_power = 0.0;
            debug!("Recovery → Stopped at {:.0}µs", self.rowing_total_time);
            return;
        }

        if self.cycle_phase == CyclePhase::Stopped {
            if self.delta_times.len() < self.settings.impulse_data_array_length
                || !self.is_flywheel_powered()
            {
                return;
            }

            self.advance_rowing_time();
            self.rev_time = self.rowing_total_time;
            self.drive_start();
            return;
        }

        self.advance_rowing_time();

        let covered = if self.distance == 0.0 {
            self.rowing_total_angular_displacement
        } else {
            self.angular_displacement_per_impulse
        };
        self.distance += self.distance_per_angular_displacement * covered;
        if self.distance > 0.0 {
            self.rev_time = self.rowing_total_time;
        }

        match self.cycle_phase {
            CyclePhase::Drive => {
                if self.rowing_total_time - self.drive_start_time > self.settings.minimum_drive_time
                    && self.is_flywheel_unpowered()
                {
                    self.drive_end();
                    self.recovery_start();
                    return;
                }
                self.drive_update();
            }
            CyclePhase::Recovery => {
                if self.rowing_total_time - self.recovery_start_time
                    > self.settings.minimum_recovery_time
                    && self.is_flywheel_powered()
                {
                    self.recovery_end();
                    self.drive_start();
                    return;
                }
                self.recovery_update();
            }
            CyclePhase::Stopped => {}
        }
    }

    fn update_angular_kinematics(&mut self) {
        let window = self.settings.impulse_data_array_length;

        if self.angular_velocity_matrix.len() >= window {
            self.angular_velocity_matrix.pop_front();
        }
        if self.angular_acceleration_matrix.len() >= window {
            self.angular_acceleration_matrix.pop_front();
        }
        self.angular_velocity_matrix
            .push_back(WeightedAverage::new(window));
        self.angular_acceleration_matrix
            .push_back(WeightedAverage::new(window));

        let fit = self.angular_distances.goodness_of_fit();
        for (position, (velocity, acceleration)) in self
            .angular_velocity_matrix
            .iter_mut()
            .zip(self.angular_acceleration_matrix.iter_mut())
            .enumerate()
        {
            velocity.push(
                self.angular_distances.first_derivative_at_position(position),
                fit,
            );
            acceleration.push(
                self.angular_distances.second_derivative_at_position(position),
                fit,
            );
        }

        self.current_angular_velocity = self
            .angular_velocity_matrix
            .front()
            .map_or(0.0, WeightedAverage::average);
        self.current_angular_acceleration = self
            .angular_acceleration_matrix
            .front()
            .map_or(0.0, WeightedAverage::average);
    }

    // Rowing time follows the oldest impulse still in the timing window.
    fn advance_rowing_time(&mut self) {
        self.rowing_impulse_count += 1;
        self.rowing_total_time += self.delta_times.y_at_series_begin().unwrap_or(0.0);
        self.rowing_total_angular_displacement += self.angular_displacement_per_impulse;
    }

    fn is_flywheel_powered(&self) -> bool {
        self.current_torque > self.settings.minimum_powered_torque
            && self.delta_times.coefficient_a() < 0.0
    }

    fn is_flywheel_unpowered(&mut self) -> bool {
        let detection = self.settings.stroke_detection_type;

        if detection.uses_torque()
            && self.delta_times_slopes.len() >= self.settings.impulse_data_array_length
        {
            if self.current_torque < self.settings.minimum_drag_torque
                && self.delta_times.coefficient_a() > 0.0
            {
                return true;
            }

            if self.delta_times_slopes.slope().abs() < self.settings.minimum_recovery_slope_margin {
                self.margin_detect_count += 1;
                return true;
            }
        }

        detection.uses_slope()
            && self.delta_times.coefficient_a() > self.settings.minimum_recovery_slope
    }

    fn handle_force(&self) -> f64 {
        self.current_torque / self.settings.sprocket_radius
    }

    fn drive_start(&mut self) {
        debug!("Drive start at {:.0}µs", self.rowing_total_time);
        self.cycle_phase = CyclePhase::Drive;
        self.drive_start_time = self.rowing_total_time;
        self.drive_start_angular_displacement = self.rowing_total_angular_displacement;
        self.drive_handle_forces.clear();
        self.drive_handle_forces.push(self.handle_force());

        if self.settings.stroke_detection_type.uses_torque() {
            self.delta_times_slopes.reset();
            self.delta_times_slopes
                .push(self.rowing_total_time, self.delta_times.coefficient_a());
        }
    }

    fn drive_update(&mut self) {
        if self.drive_handle_forces.len() >= MAX_DRIVE_HANDLE_FORCES {
            warn!(
                "Drive force curve reached {} samples at {:.0}µs, forcing drive end",
                MAX_DRIVE_HANDLE_FORCES, self.rowing_total_time
            );
            self.drive_end();
            if self.settings.stroke_detection_type.uses_torque() {
                self.drag_coefficient = 0.0;
                self.drag_coefficients.reset();
            }
            self.recovery_start();
            return;
        }

        self.drive_handle_forces.push(self.handle_force());

        if self.settings.stroke_detection_type.uses_torque() {
            self.delta_times_slopes
                .push(self.rowing_total_time, self.delta_times.coefficient_a());
        }
    }

    fn drive_end(&mut self) {
        self.drive_duration = self.rowing_total_time - self.drive_start_time;
        self.drive_total_angular_displacement =
            self.rowing_total_angular_displacement - self.drive_start_angular_displacement;
        self.stroke_count += 1;
        self.stroke_time = self.rowing_total_time;
        debug!(
            "Drive end at {:.0}µs, stroke {} ({} force samples)",
            self.rowing_total_time,
            self.stroke_count,
            self.drive_handle_forces.len()
        );
    }

    fn recovery_start(&mut self) {
        self.cycle_phase = CyclePhase::Recovery;
        self.recovery_start_time = self.rowing_total_time;
        self.recovery_start_angular_displacement = self.rowing_total_angular_displacement;
        self.recovery_start_distance = self.distance;
        self.push_recovery_delta_time();
    }

    fn recovery_update(&mut self) {
        if self.rowing_total_time - self.recovery_start_time
            < self.settings.max_drag_factor_recovery_period
        {
            self.push_recovery_delta_time();
        }
    }

    fn push_recovery_delta_time(&mut self) {
        let delta_time = self.delta_times.y_at_series_begin().unwrap_or(0.0);
        self.recovery_delta_times
            .push(self.rowing_total_time, delta_time);
    }

    fn recovery_end(&mut self) {
        self.recovery_duration = self.rowing_total_time - self.recovery_start_time;
        self.recovery_total_angular_displacement =
            self.rowing_total_angular_displacement - self.recovery_start_angular_displacement;
        self.calculate_drag_coefficient();
        self.recovery_delta_times.reset();
        self.calculate_avg_stroke_power();

        self.distance_per_angular_displacement =
            ((self.drag_coefficient * 1e6) / self.settings.concept2_magic_number).powf(1.0 / 3.0);

        let covered = if self.distance == 0.0 {
            self.rowing_total_angular_displacement
        } else {
            self.recovery_total_angular_displacement
        };
        self.distance =
            self.recovery_start_distance + self.distance_per_angular_displacement * covered;
        if self.distance > 0.0 {
            self.rev_time = self.rowing_total_time;
        }
    }

    fn calculate_avg_stroke_power(&mut self) {
        let cycle_time = (self.drive_duration + self.recovery_duration) / 1e6;
        if cycle_time <= 0.0 {
            self.avg_stroke_power = 0.0;
            return;
        }

        let mean_angular_velocity = (self.recovery_total_angular_displacement
            + self.drive_total_angular_displacement)
            / cycle_time;
        self.avg_stroke_power = self.drag_coefficient * mean_angular_velocity.powi(3);
    }

    fn calculate_drag_coefficient(&mut self) {
        if self.recovery_duration > self.settings.max_drag_factor_recovery_period
            || self.recovery_delta_times.len() < self.settings.impulse_data_array_length
        {
            return;
        }

        let fit = self.recovery_delta_times.goodness_of_fit();
        if fit < self.settings.goodness_of_fit_threshold {
            debug!("Drag factor rejected: goodness of fit {:.4}", fit);
            return;
        }

        let candidate = (self.recovery_delta_times.slope() * self.settings.flywheel_inertia)
            / self.angular_displacement_per_impulse;

        if candidate > self.settings.upper_drag_factor_threshold
            || candidate < self.settings.lower_drag_factor_threshold
        {
            debug!("Drag factor rejected: {:.2} out of bounds", candidate * 1e6);
            return;
        }

        if self.settings.drag_coefficients_array_length < 2 {
            self.drag_coefficient = candidate;
            return;
        }

        self.drag_coefficients.push(candidate, fit);
        self.drag_coefficient = self.drag_coefficients.average();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flywheel_delta_times, impulses_from_delta_times, SimulatedSession};

    fn run(engine: &mut StrokeDetectionEngine, delta_times: &[u64]) -> Vec<RowingMetrics> {
        let mut strokes = Vec::new();
        for impulse in impulses_from_delta_times(delta_times, engine.profile().impulses_per_revolution) {
            let before = engine.data().stroke_count;
            engine.process_data(&impulse);
            let after = engine.data();
            if after.stroke_count > before {
                strokes.push(after);
            }
        }
        strokes
    }

    #[test]
    fn test_fresh_engine_is_stopped() {
        let engine = StrokeDetectionEngine::new(RowingProfile::default());
        assert_eq!(engine.cycle_phase(), CyclePhase::Stopped);
        assert_eq!(engine.data(), RowingMetrics::default());
        assert_eq!(engine.margin_detect_count(), 0);
    }

    #[test]
    fn test_no_drive_before_window_fills() {
        let profile = RowingProfile::default();
        let delta_times = flywheel_delta_times(&SimulatedSession::default());
        let impulses = impulses_from_delta_times(&delta_times, profile.impulses_per_revolution);
        let mut engine = StrokeDetectionEngine::new(profile);

        // the seeded origin plus five impulses leaves the seven-sample window short
        for impulse in &impulses[..5] {
            engine.process_data(impulse);
            assert_eq!(engine.cycle_phase(), CyclePhase::Stopped);
        }
        assert!(engine.current_torque() > 0.0);

        engine.process_data(&impulses[5]);
        assert_eq!(engine.cycle_phase(), CyclePhase::Drive);
    }

    #[test]
    fn test_detects_every_stroke() {
        let delta_times = flywheel_delta_times(&SimulatedSession::default());
        let mut engine = StrokeDetectionEngine::new(RowingProfile::default());
        let strokes = run(&mut engine, &delta_times);

        let metrics = engine.data();
        assert_eq!(metrics.stroke_count, 8);
        assert_eq!(strokes.len(), 8);
        assert_eq!(engine.cycle_phase(), CyclePhase::Recovery);

        // simulated drag factor is 100
        let drag_factor = metrics.drag_coefficient * 1e6;
        assert!((drag_factor - 100.0).abs() < 1.0, "drag factor {}", drag_factor);

        assert!(metrics.distance > 0.0);
        assert!(metrics.avg_stroke_power > 0.0);
        assert!(metrics.drive_duration > 0.0 && metrics.recovery_duration > 0.0);
        assert!(metrics.last_rev_time >= metrics.last_stroke_time);

        for pair in strokes.windows(2) {
            assert!(pair[1].last_stroke_time > pair[0].last_stroke_time);
            assert!(pair[1].distance > pair[0].distance);
        }
        for stroke in &strokes {
            assert!(!stroke.drive_handle_forces.is_empty());
            assert!(stroke.drive_handle_forces.len() < MAX_DRIVE_HANDLE_FORCES);
        }
    }

    #[test]
    fn test_detection_modes_agree_on_clean_signal() {
        let delta_times = flywheel_delta_times(&SimulatedSession::default());

        let both = RowingProfile {
            stroke_detection_type: StrokeDetectionType::Both,
            ..RowingProfile::default()
        };
        let slope = RowingProfile {
            stroke_detection_type: StrokeDetectionType::Slope,
            minimum_recovery_slope: 0.0,
            ..RowingProfile::default()
        };

        for profile in [both, slope] {
            let mut engine = StrokeDetectionEngine::new(profile);
            run(&mut engine, &delta_times);
            assert_eq!(engine.data().stroke_count, 8);
            assert_eq!(engine.margin_detect_count(), 0);
        }
    }

    #[test]
    fn test_plateau_detection_counts_margin_hits() {
        let delta_times = flywheel_delta_times(&SimulatedSession::default());
        let profile = RowingProfile {
            minimum_recovery_slope_margin: 1e6,
            ..RowingProfile::default()
        };
        let mut engine = StrokeDetectionEngine::new(profile);
        run(&mut engine, &delta_times);

        assert_eq!(engine.data().stroke_count, 8);
        assert!(engine.margin_detect_count() > 0);
    }

    #[test]
    fn test_force_curve_cap_ends_drive() {
        // the slope threshold is never crossed, so only the cap can end a drive
        let delta_times = flywheel_delta_times(&SimulatedSession::default());
        let profile = RowingProfile {
            stroke_detection_type: StrokeDetectionType::Slope,
            minimum_recovery_slope: 0.01,
            ..RowingProfile::default()
        };
        let mut engine = StrokeDetectionEngine::new(profile);
        let strokes = run(&mut engine, &delta_times);

        assert!(!strokes.is_empty());
        for stroke in &strokes {
            assert_eq!(stroke.drive_handle_forces.len(), MAX_DRIVE_HANDLE_FORCES);
        }
        assert!(engine.data().drive_handle_forces.len() <= MAX_DRIVE_HANDLE_FORCES);
    }

    #[test]
    fn test_force_curve_cap_clears_drag_in_torque_mode() {
        // neither torque check can fire, so only the cap can end a drive
        let delta_times = flywheel_delta_times(&SimulatedSession::default());
        let profile = RowingProfile {
            minimum_drag_torque: -1e9,
            minimum_recovery_slope_margin: -1.0,
            ..RowingProfile::default()
        };
        let mut engine = StrokeDetectionEngine::new(profile);
        let strokes = run(&mut engine, &delta_times);

        assert!(!strokes.is_empty());
        for stroke in &strokes {
            assert_eq!(stroke.drive_handle_forces.len(), MAX_DRIVE_HANDLE_FORCES);
            assert_eq!(stroke.drag_coefficient, 0.0);
        }
        assert_eq!(engine.margin_detect_count(), 0);
    }

    #[test]
    fn test_drag_smoothing_window() {
        let delta_times = flywheel_delta_times(&SimulatedSession::default());
        let profile = RowingProfile {
            drag_coefficients_array_length: 4,
            ..RowingProfile::default()
        };
        let mut engine = StrokeDetectionEngine::new(profile);
        run(&mut engine, &delta_times);

        assert_eq!(engine.data().stroke_count, 8);
        assert_eq!(engine.drag_coefficients.len(), 4);
        let drag_factor = engine.data().drag_coefficient * 1e6;
        assert!((drag_factor - 100.0).abs() < 1.0, "drag factor {}", drag_factor);

        let mut unsmoothed = StrokeDetectionEngine::new(RowingProfile::default());
        run(&mut unsmoothed, &delta_times);
        assert!(unsmoothed.drag_coefficients.is_empty());
    }

    #[test]
    fn test_drag_candidates_rejected() {
        let delta_times = flywheel_delta_times(&SimulatedSession::default());
        let rejecting = [
            RowingProfile {
                upper_drag_factor_threshold: 50.0,
                lower_drag_factor_threshold: 10.0,
                ..RowingProfile::default()
            },
            RowingProfile {
                goodness_of_fit_threshold: 1.1,
                ..RowingProfile::default()
            },
            // every recovery outlasts the drag fitting period
            RowingProfile {
                max_drag_factor_recovery_period: 0.5,
                ..RowingProfile::default()
            },
        ];

        for profile in rejecting {
            let mut engine = StrokeDetectionEngine::new(profile);
            let strokes = run(&mut engine, &delta_times);

            let metrics = engine.data();
            assert_eq!(metrics.stroke_count, 8);
            assert_eq!(metrics.drag_coefficient, 0.0);
            assert_eq!(metrics.distance, 0.0);
            assert!(strokes.iter().all(|m| m.drag_coefficient == 0.0));
        }
    }

    #[test]
    fn test_stale_recovery_stops() {
        let session = SimulatedSession {
            tail: 10.0,
            ..SimulatedSession::default()
        };
        let delta_times = flywheel_delta_times(&session);
        let mut engine = StrokeDetectionEngine::new(RowingProfile::default());
        run(&mut engine, &delta_times);

        let metrics = engine.data();
        assert_eq!(engine.cycle_phase(), CyclePhase::Stopped);
        assert_eq!(metrics.stroke_count, 8);
        assert_eq!(metrics.drive_duration, 0.0);
        assert_eq!(metrics.avg_stroke_power, 0.0);
        assert!(metrics.drive_handle_forces.is_empty());
        assert!(metrics.recovery_duration > 7e6);
    }

    #[test]
    fn test_reset_matches_fresh_engine() {
        let profile = RowingProfile::default();
        let delta_times = flywheel_delta_times(&SimulatedSession::default());

        let mut used = StrokeDetectionEngine::new(profile.clone());
        run(&mut used, &delta_times[..900]);
        assert!(used.data().stroke_count > 0);
        used.reset();

        let mut fresh = StrokeDetectionEngine::new(profile);
        assert_eq!(used.data(), fresh.data());
        assert_eq!(used.cycle_phase(), fresh.cycle_phase());
        assert_eq!(used.margin_detect_count(), fresh.margin_detect_count());
        assert_eq!(used.current_torque(), fresh.current_torque());

        assert_eq!(run(&mut used, &delta_times), run(&mut fresh, &delta_times));
        assert_eq!(used.data(), fresh.data());
    }

    #[test]
    fn test_caller_profile_untouched() {
        let profile = RowingProfile::default();
        let mut engine = StrokeDetectionEngine::new(profile.clone());
        run(&mut engine, &flywheel_delta_times(&SimulatedSession::default()));
        engine.reset();
        assert_eq!(engine.profile(), &profile);
    }
}
