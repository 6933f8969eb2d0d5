use anyhow::{ensure, Context};
use knuffel::{Decode, DecodeScalar};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PRESET_NAMES: [&str; 3] = ["default", "old-danube", "old-danube-6-magnet"];

#[derive(DecodeScalar, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeDetectionType {
    Torque,
    Slope,
    Both,
}

impl StrokeDetectionType {
    pub fn uses_torque(self) -> bool {
        self != StrokeDetectionType::Slope
    }

    pub fn uses_slope(self) -> bool {
        self != StrokeDetectionType::Torque
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrokeDetectionType::Torque => "torque",
            StrokeDetectionType::Slope => "slope",
            StrokeDetectionType::Both => "both",
        }
    }
}

/// Machine calibration as the user writes it.
///
/// Units: sprocket radius in cm; debounce, minimum drive and recovery time in ms;
/// stopped threshold and drag-factor recovery period in s; drag-factor bounds and the
/// recovery slope margin scaled by 1e6. The stroke engine derives its own normalised
/// copy and never changes this one.
#[derive(Decode, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowingProfile {
    #[knuffel(child, unwrap(argument))]
    pub impulses_per_revolution: u32,
    #[knuffel(child, unwrap(argument))]
    pub flywheel_inertia: f64,
    #[knuffel(child, unwrap(argument))]
    pub sprocket_radius: f64,
    #[knuffel(child, unwrap(argument))]
    pub concept2_magic_number: f64,

    // sensor signal filter
    #[knuffel(child, unwrap(argument))]
    pub rotation_debounce_time_min: f64,
    #[knuffel(child, unwrap(argument))]
    pub rowing_stopped_threshold_period: f64,

    // drag factor filter
    #[knuffel(child, unwrap(argument))]
    pub goodness_of_fit_threshold: f64,
    #[knuffel(child, unwrap(argument))]
    pub max_drag_factor_recovery_period: f64,
    #[knuffel(child, unwrap(argument))]
    pub lower_drag_factor_threshold: f64,
    #[knuffel(child, unwrap(argument))]
    pub upper_drag_factor_threshold: f64,
    #[knuffel(child, unwrap(argument))]
    pub drag_coefficients_array_length: u32,

    // stroke phase detection
    #[knuffel(child, unwrap(argument))]
    pub stroke_detection_type: StrokeDetectionType,
    #[knuffel(child, unwrap(argument))]
    pub minimum_powered_torque: f64,
    #[knuffel(child, unwrap(argument))]
    pub minimum_drag_torque: f64,
    #[knuffel(child, unwrap(argument))]
    pub minimum_recovery_slope_margin: f64,
    #[knuffel(child, unwrap(argument))]
    pub minimum_recovery_slope: f64,
    #[knuffel(child, unwrap(argument))]
    pub minimum_recovery_time: f64,
    #[knuffel(child, unwrap(argument))]
    pub minimum_drive_time: f64,
    #[knuffel(child, unwrap(argument))]
    pub impulse_data_array_length: u32,
}

impl RowingProfile {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rowing profile {}", path.display()))?;
        let profile = Self::parse(&path.display().to_string(), &content)?;
        log::info!("Loaded rowing profile from {}", path.display());
        Ok(profile)
    }

    pub fn parse(file_name: &str, content: &str) -> anyhow::Result<Self> {
        let profile: RowingProfile = knuffel::parse(file_name, content)?;
        profile
            .validate()
            .with_context(|| format!("Invalid rowing profile {}", file_name))?;
        Ok(profile)
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "old-danube" => Some(Self {
                impulses_per_revolution: 2,
                flywheel_inertia: 0.087310454 / 3.0,
                sprocket_radius: 3.2,
                concept2_magic_number: 3.54,
                rotation_debounce_time_min: 7.0,
                rowing_stopped_threshold_period: 7.0,
                goodness_of_fit_threshold: 0.752,
                max_drag_factor_recovery_period: 5.0,
                lower_drag_factor_threshold: 10.0,
                upper_drag_factor_threshold: 200.0,
                drag_coefficients_array_length: 4,
                stroke_detection_type: StrokeDetectionType::Slope,
                minimum_powered_torque: 0.186,
                minimum_drag_torque: 0.397,
                minimum_recovery_slope_margin: 0.0000151,
                minimum_recovery_slope: 0.0,
                minimum_recovery_time: 145.0,
                minimum_drive_time: 170.0,
                impulse_data_array_length: 5,
            }),
            "old-danube-6-magnet" => Some(Self {
                impulses_per_revolution: 6,
                flywheel_inertia: 0.087310454,
                sprocket_radius: 3.2,
                concept2_magic_number: 3.54,
                rotation_debounce_time_min: 4.0,
                rowing_stopped_threshold_period: 7.0,
                goodness_of_fit_threshold: 0.7,
                max_drag_factor_recovery_period: 4.0,
                lower_drag_factor_threshold: 10.0,
                upper_drag_factor_threshold: 255.0,
                drag_coefficients_array_length: 1,
                stroke_detection_type: StrokeDetectionType::Torque,
                minimum_powered_torque: 0.0,
                minimum_drag_torque: 0.209,
                minimum_recovery_slope_margin: 0.0000021,
                minimum_recovery_slope: 0.0,
                minimum_recovery_time: 145.0,
                minimum_drive_time: 170.0,
                impulse_data_array_length: 11,
            }),
            _ => None,
        }
    }

    /// Rejects profiles the stroke engine cannot produce meaningful output for.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.impulses_per_revolution > 0,
            "impulses-per-revolution must be positive"
        );
        ensure!(self.flywheel_inertia > 0.0, "flywheel-inertia must be positive");
        ensure!(self.sprocket_radius > 0.0, "sprocket-radius must be positive");
        ensure!(
            self.concept2_magic_number > 0.0,
            "concept2-magic-number must be positive"
        );
        ensure!(
            self.impulse_data_array_length >= 3,
            "impulse-data-array-length must be at least 3, got {}",
            self.impulse_data_array_length
        );
        ensure!(
            self.lower_drag_factor_threshold <= self.upper_drag_factor_threshold,
            "lower-drag-factor-threshold {} exceeds upper-drag-factor-threshold {}",
            self.lower_drag_factor_threshold,
            self.upper_drag_factor_threshold
        );
        Ok(())
    }

    /// KDL text that `parse` reads back into the same profile.
    pub fn to_kdl(&self) -> String {
        let mut out = String::new();
        let fields: [(&str, String); 19] = [
            ("impulses-per-revolution", self.impulses_per_revolution.to_string()),
            ("flywheel-inertia", kdl_float(self.flywheel_inertia)),
            ("sprocket-radius", kdl_float(self.sprocket_radius)),
            ("concept2-magic-number", kdl_float(self.concept2_magic_number)),
            ("rotation-debounce-time-min", kdl_float(self.rotation_debounce_time_min)),
            ("rowing-stopped-threshold-period", kdl_float(self.rowing_stopped_threshold_period)),
            ("goodness-of-fit-threshold", kdl_float(self.goodness_of_fit_threshold)),
            ("max-drag-factor-recovery-period", kdl_float(self.max_drag_factor_recovery_period)),
            ("lower-drag-factor-threshold", kdl_float(self.lower_drag_factor_threshold)),
            ("upper-drag-factor-threshold", kdl_float(self.upper_drag_factor_threshold)),
            ("drag-coefficients-array-length", self.drag_coefficients_array_length.to_string()),
            ("stroke-detection-type", format!("\"{}\"", self.stroke_detection_type.as_str())),
            ("minimum-powered-torque", kdl_float(self.minimum_powered_torque)),
            ("minimum-drag-torque", kdl_float(self.minimum_drag_torque)),
            ("minimum-recovery-slope-margin", kdl_float(self.minimum_recovery_slope_margin)),
            ("minimum-recovery-slope", kdl_float(self.minimum_recovery_slope)),
            ("minimum-recovery-time", kdl_float(self.minimum_recovery_time)),
            ("minimum-drive-time", kdl_float(self.minimum_drive_time)),
            ("impulse-data-array-length", self.impulse_data_array_length.to_string()),
        ];
        for (name, value) in fields {
            out.push_str(&format!("{} {}\n", name, value));
        }
        out
    }
}

// KDL needs a decimal point to read a value back as a float.
fn kdl_float(value: f64) -> String {
    let text = format!("{:?}", value);
    if text.contains(['.', 'e']) {
        text
    } else {
        format!("{}.0", text)
    }
}

impl Default for RowingProfile {
    fn default() -> Self {
        Self {
            impulses_per_revolution: 3,
            flywheel_inertia: 0.073,
            sprocket_radius: 1.5,
            concept2_magic_number: 2.8,
            rotation_debounce_time_min: 7.0,
            rowing_stopped_threshold_period: 7.0,
            goodness_of_fit_threshold: 0.97,
            max_drag_factor_recovery_period: 6.0,
            lower_drag_factor_threshold: 75.0,
            upper_drag_factor_threshold: 250.0,
            drag_coefficients_array_length: 1,
            stroke_detection_type: StrokeDetectionType::Torque,
            minimum_powered_torque: 0.0,
            minimum_drag_torque: 0.14,
            minimum_recovery_slope_margin: 0.00001,
            minimum_recovery_slope: 0.01,
            minimum_recovery_time: 800.0,
            minimum_drive_time: 400.0,
            impulse_data_array_length: 7,
        }
    }
}
