use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::Duration;

/// Smallest probability an item may carry.
pub const MIN_PROBABILITY: f64 = 0.0001;
/// Step used by probability inputs.
pub const PROBABILITY_STEP: f64 = 0.0001;
/// Delay between the last title keystroke and color assignment.
pub const TITLE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Tuning for spin planning and termination. The defaults are tolerances,
/// not calibrated values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpinConfig {
    /// Maximum |unassigned probability| that still counts as fully assigned.
    pub epsilon: f64,
    /// Distance to the target (rad) at which deceleration is considered done.
    pub angle_tolerance: f64,
    pub min_extra_turns: u32,
    pub max_extra_turns: u32,
    pub min_accel_ms: u64,
    pub max_accel_ms: u64,
    /// Constant deceleration once the wheel is released (rad/s²).
    pub friction: f64,
    /// Extra time past the computed end before the angle is snapped.
    pub cutoff_grace_ms: u64,
    /// Screen angle of the pointer in canvas coordinates (y grows downwards).
    pub pointer_angle: f64,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            angle_tolerance: 1e-3,
            min_extra_turns: 8,
            max_extra_turns: 15,
            min_accel_ms: 200,
            max_accel_ms: 700,
            friction: 2.5,
            cutoff_grace_ms: 250,
            pointer_angle: -PI / 2.0,
        }
    }
}

/// Wheel drawing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Side of the square surface in pixels.
    pub size: f64,
    pub min_font_px: f64,
    pub max_font_px: f64,
    /// Label width budget as a share of the radius.
    pub text_width_ratio: f64,
    pub font_family: String,
    pub placeholder_color: String,
    pub outline_color: String,
    pub pointer_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: 750.0,
            min_font_px: 8.0,
            max_font_px: 72.0,
            text_width_ratio: 0.8,
            font_family: "sans-serif".to_string(),
            placeholder_color: "#dadada".to_string(),
            outline_color: "#333333".to_string(),
            pointer_color: "#1b1c1d".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    /// Bisection steps needed to resolve the font range to one pixel.
    pub fn font_fit_iterations(&self) -> u32 {
        let span = (self.max_font_px - self.min_font_px).max(1.0);
        span.log2().ceil() as u32
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WheelConfig {
    pub spin: SpinConfig,
    pub render: RenderConfig,
}
