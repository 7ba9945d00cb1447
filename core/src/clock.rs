//! Simulation clock — owns simulated time, time scale, and the frame count.

use crate::{
    config::TimeScaleConfig,
    types::{Frame, Millis},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    /// Simulated milliseconds since the engine was built. Never decreases.
    pub sim_time: Millis,
    pub frame:    Frame,
    time_scale:   f64,
    default_scale: f64,
    max_scale:    f64,
}

impl SimClock {
    pub fn new(config: &TimeScaleConfig) -> Self {
        Self {
            sim_time:      0.0,
            frame:         0,
            time_scale:    config.default_scale,
            default_scale: config.default_scale,
            max_scale:     config.max_scale,
        }
    }

    /// Advance by an already scaled delta. Returns the new simulated time.
    pub fn advance(&mut self, scaled_delta: Millis) -> Millis {
        self.frame += 1;
        if scaled_delta.is_finite() && scaled_delta > 0.0 {
            self.sim_time += scaled_delta;
        }
        self.sim_time
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Apply a value from the time-scale control.
    /// Non-finite input falls back to the default; the rest clamps into
    /// `[0, max_scale]`. Returns the scale actually applied.
    pub fn set_time_scale(&mut self, value: f64) -> f64 {
        self.time_scale = if value.is_finite() {
            value.clamp(0.0, self.max_scale)
        } else {
            log::warn!("non-finite time scale {value}, using {}", self.default_scale);
            self.default_scale
        };
        self.time_scale
    }

    /// Apply raw text from the control, e.g. a slider's string value.
    pub fn set_time_scale_text(&mut self, raw: &str) -> f64 {
        let value = parse_time_scale(raw, self.default_scale);
        self.set_time_scale(value)
    }
}

/// Parse the time-scale control's text; anything unusable becomes `fallback`.
pub fn parse_time_scale(raw: &str, fallback: f64) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            log::warn!("unusable time scale input {raw:?}, using {fallback}");
            fallback
        }
    }
}

/// Render a time scale for the speed readout: `1.5x`, `2x`, `0.25x`.
pub fn format_speed(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    format!("{trimmed}x")
}
