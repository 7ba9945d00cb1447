//! Decay model: the fire's single scalar of intensity.
//!
//! Fuel only ever changes two ways:
//!   - `advance`:  continuous exponential decay over simulated time.
//!   - `add_fuel`: a fixed injection when a log lands, clamped to max.
//!
//! Everything the renderer needs (readout, ember status, flame scale
//! factors) is derived from the level on demand. No hidden state.

use crate::{config::FuelConfig, types::Millis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct FuelModel {
    config: FuelConfig,
    level:  f64,
}

impl FuelModel {
    pub fn new(config: FuelConfig) -> Self {
        Self { config, level: 0.0 }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn max(&self) -> f64 {
        self.config.max_fuel
    }

    /// Inject one log's worth of fuel. Returns the new level.
    pub fn add_fuel(&mut self) -> f64 {
        self.level = (self.level + self.config.fuel_per_log).min(self.config.max_fuel);
        self.level
    }

    /// Decay by `delta_sim_ms` of simulated time. Returns the new level.
    pub fn advance(&mut self, delta_sim_ms: Millis) -> f64 {
        if delta_sim_ms > 0.0 {
            let delta_secs = delta_sim_ms / 1000.0;
            self.level *= (-self.config.decay_rate * delta_secs).exp();
        }
        if self.level < self.config.epsilon {
            self.level = 0.0;
        }
        self.level
    }

    /// Fuel in [0, 1].
    pub fn normalized(&self) -> f64 {
        (self.level / self.config.max_fuel).clamp(0.0, 1.0)
    }

    /// Whole percent, as shown on the readout.
    pub fn percent(&self) -> i64 {
        ((self.level / self.config.max_fuel) * 100.0).round().max(0.0) as i64
    }

    pub fn readout(&self) -> String {
        format!("{}%", self.percent())
    }

    pub fn ember_status(&self, log_count: usize) -> EmberStatus {
        EmberStatus::classify(
            self.level,
            self.percent(),
            log_count,
            self.config.extinguished_threshold,
        )
    }

    pub fn visuals(&self) -> FlameVisuals {
        FlameVisuals::from_normalized(self.normalized())
    }
}

/// Ordered from coldest to hottest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmberStatus {
    Extinguished,
    Dying,
    LastEmbers,
    Glowing,
    Crackling,
}

impl EmberStatus {
    /// Lowest matching category wins. Extinguished additionally
    /// requires that no log is left on the grate.
    pub fn classify(level: f64, percent: i64, log_count: usize, out_threshold: f64) -> Self {
        if level <= out_threshold && log_count == 0 {
            Self::Extinguished
        } else if percent < 10 {
            Self::Dying
        } else if percent < 25 {
            Self::LastEmbers
        } else if percent < 65 {
            Self::Glowing
        } else {
            Self::Crackling
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Extinguished => "going out",
            Self::Dying        => "barely alive",
            Self::LastEmbers   => "last embers",
            Self::Glowing      => "glowing nicely",
            Self::Crackling    => "crackling warmly",
        }
    }
}

/// Scale factors handed to the renderer as CSS custom properties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FlameVisuals {
    pub width_scale:  f64,
    pub height_scale: f64,
    pub glow_scale:   f64,
    pub ember_scale:  f64,
    pub opacity:      f64,
}

impl FlameVisuals {
    pub fn from_normalized(n: f64) -> Self {
        let n = n.clamp(0.0, 1.0);
        // Opacity fades in steeply over the first tenth, then linearly to 1.
        let opacity = if n <= 0.1 {
            n * 5.0 * 0.3
        } else {
            (0.3 + ((n - 0.1) / 0.9) * 0.7).min(1.0)
        };
        Self {
            width_scale:  0.45 + n * 1.2,
            height_scale: 0.25 + n * 1.05,
            glow_scale:   0.5 + n * 1.4,
            ember_scale:  0.85 + n * 0.9,
            opacity,
        }
    }
}
