//! Every tunable constant of the hearth, in one structure.
//!
//! `SimConfig::default()` carries the shipped values. A JSON file may
//! override any subset: every section is `#[serde(default)]`, so a file
//! containing only `{"fuel": {"decay_rate": 0.1}}` is valid. Actions merge
//! one level deeper: `{"actions": {"work": {"cooldown_ms": 5000}}}` keeps
//! the rest of the work action as shipped.

use crate::{
    error::{SimError, SimResult},
    types::Millis,
};
use serde::{Deserialize, Deserializer, Serialize};

// ── Fuel / decay model ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FuelConfig {
    pub max_fuel: f64,
    pub fuel_per_log: f64,
    /// Exponential decay rate, per simulated second.
    pub decay_rate: f64,
    /// Below this the fire is considered out and snapped to 0.
    pub epsilon: f64,
    /// Fuel at or below this with no logs left reads as extinguished.
    pub extinguished_threshold: f64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            max_fuel: 100.0,
            fuel_per_log: 24.0,
            decay_rate: 0.06,
            epsilon: 0.01,
            extinguished_threshold: 0.5,
        }
    }
}

// ── Burning logs ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Nominal burn time of one log, simulated ms.
    pub base_burn_ms: Millis,
    /// Actual burn time is base * (min_factor + U * factor_spread).
    pub burn_min_factor: f64,
    pub burn_factor_spread: f64,
    pub max_visible_logs: usize,
    /// Half-range of the random tilt, degrees.
    pub max_rotation_deg: f64,
    /// Half-range of the random horizontal offset, px.
    pub max_offset_px: f64,
    /// Logs placed by `SimEngine::build` without paying for them.
    pub opening_logs: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_burn_ms: 65_000.0,
            burn_min_factor: 0.8,
            burn_factor_spread: 0.8,
            max_visible_logs: 8,
            max_rotation_deg: 8.0,
            max_offset_px: 70.0,
            opening_logs: 2,
        }
    }
}

// ── Fuel chart ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    /// Trailing window of simulated time kept in the history.
    pub window_ms: Millis,
    pub sample_interval_ms: Millis,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000.0,
            sample_interval_ms: 200.0,
        }
    }
}

// ── Wallet / energy ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WalletConfig {
    pub starting_wood: u32,
    pub starting_coins: u32,
    pub starting_food: u32,
    pub starting_energy: f64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            starting_wood: 6,
            starting_coins: 20,
            starting_food: 3,
            starting_energy: 80.0,
        }
    }
}

/// How the energy factor behaves as energy runs out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnergyPolicy {
    /// Slow down to `slow_factor` and stay there.
    #[default]
    Floor,
    /// Slow all the way to a standstill at zero energy.
    /// Eating still progresses because it ignores the energy factor.
    Halt,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnergyConfig {
    pub max_energy: f64,
    /// Lower bound of the energy factor under `EnergyPolicy::Floor`.
    pub slow_factor: f64,
    /// Energy drained per simulated second.
    pub decay_per_sec: f64,
    /// Extra energy every gated action costs on top of its own.
    pub base_action_cost: f64,
    /// Gated actions need strictly more energy than this.
    pub min_action_energy: f64,
    pub policy: EnergyPolicy,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            slow_factor: 0.25,
            decay_per_sec: 0.2,
            base_action_cost: 1.0,
            min_action_energy: 5.0,
            policy: EnergyPolicy::Floor,
        }
    }
}

// ── Actions ────────────────────────────────────────────────────────

/// Resources an action consumes up front.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ResourceCost {
    pub wood: u32,
    pub coins: u32,
    pub food: u32,
}

/// A signed change to the wallet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ResourceDelta {
    pub wood: i64,
    pub coins: i64,
    pub food: i64,
    pub energy: f64,
}

impl ResourceDelta {
    pub fn is_empty(&self) -> bool {
        self.wood == 0 && self.coins == 0 && self.food == 0 && self.energy == 0.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutTiming {
    /// Applied in the same call that triggers the action.
    Immediate,
    /// Deferred until the cooldown crosses zero.
    OnCooldown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScaling {
    TimeAndEnergy,
    TimeOnly,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionSpec {
    pub cost: ResourceCost,
    pub energy_cost: f64,
    pub energy_gated: bool,
    pub cooldown_ms: Millis,
    pub payout: ResourceDelta,
    pub payout_timing: PayoutTiming,
    pub scaling: CooldownScaling,
}

/// Whatever a file sets on one action. Unset fields fall back to that
/// action's shipped spec, not to zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActionOverride {
    cost: Option<ResourceCost>,
    energy_cost: Option<f64>,
    energy_gated: Option<bool>,
    cooldown_ms: Option<Millis>,
    payout: Option<ResourceDelta>,
    payout_timing: Option<PayoutTiming>,
    scaling: Option<CooldownScaling>,
}

impl ActionOverride {
    fn apply(self, base: ActionSpec) -> ActionSpec {
        ActionSpec {
            cost: self.cost.unwrap_or(base.cost),
            energy_cost: self.energy_cost.unwrap_or(base.energy_cost),
            energy_gated: self.energy_gated.unwrap_or(base.energy_gated),
            cooldown_ms: self.cooldown_ms.unwrap_or(base.cooldown_ms),
            payout: self.payout.unwrap_or(base.payout),
            payout_timing: self.payout_timing.unwrap_or(base.payout_timing),
            scaling: self.scaling.unwrap_or(base.scaling),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActionsOverride {
    add_log: ActionOverride,
    buy_wood: ActionOverride,
    buy_food: ActionOverride,
    work: ActionOverride,
    eat: ActionOverride,
    chop: ActionOverride,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionsConfig {
    pub add_log: ActionSpec,
    pub buy_wood: ActionSpec,
    pub buy_food: ActionSpec,
    pub work: ActionSpec,
    pub eat: ActionSpec,
    pub chop: ActionSpec,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            add_log: ActionSpec {
                cost: ResourceCost { wood: 1, ..Default::default() },
                energy_cost: 1.0,
                energy_gated: true,
                cooldown_ms: 0.0,
                payout: ResourceDelta::default(),
                payout_timing: PayoutTiming::Immediate,
                scaling: CooldownScaling::TimeAndEnergy,
            },
            buy_wood: ActionSpec {
                cost: ResourceCost { coins: 8, ..Default::default() },
                energy_cost: 0.0,
                energy_gated: false,
                cooldown_ms: 7_000.0,
                payout: ResourceDelta { wood: 3, ..Default::default() },
                payout_timing: PayoutTiming::OnCooldown,
                scaling: CooldownScaling::TimeAndEnergy,
            },
            buy_food: ActionSpec {
                cost: ResourceCost { coins: 5, ..Default::default() },
                energy_cost: 0.0,
                energy_gated: false,
                cooldown_ms: 6_000.0,
                payout: ResourceDelta { food: 2, ..Default::default() },
                payout_timing: PayoutTiming::OnCooldown,
                scaling: CooldownScaling::TimeAndEnergy,
            },
            work: ActionSpec {
                cost: ResourceCost::default(),
                energy_cost: 10.0,
                energy_gated: true,
                cooldown_ms: 10_000.0,
                payout: ResourceDelta { coins: 12, ..Default::default() },
                payout_timing: PayoutTiming::OnCooldown,
                scaling: CooldownScaling::TimeAndEnergy,
            },
            eat: ActionSpec {
                cost: ResourceCost { food: 1, ..Default::default() },
                energy_cost: 0.0,
                energy_gated: false,
                cooldown_ms: 4_000.0,
                payout: ResourceDelta { energy: 30.0, ..Default::default() },
                payout_timing: PayoutTiming::OnCooldown,
                scaling: CooldownScaling::TimeOnly,
            },
            chop: ActionSpec {
                cost: ResourceCost::default(),
                energy_cost: 14.0,
                energy_gated: true,
                cooldown_ms: 9_000.0,
                payout: ResourceDelta { wood: 2, ..Default::default() },
                payout_timing: PayoutTiming::OnCooldown,
                scaling: CooldownScaling::TimeAndEnergy,
            },
        }
    }
}

impl<'de> Deserialize<'de> for ActionsConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let o = ActionsOverride::deserialize(deserializer)?;
        let base = ActionsConfig::default();
        Ok(Self {
            add_log: o.add_log.apply(base.add_log),
            buy_wood: o.buy_wood.apply(base.buy_wood),
            buy_food: o.buy_food.apply(base.buy_food),
            work: o.work.apply(base.work),
            eat: o.eat.apply(base.eat),
            chop: o.chop.apply(base.chop),
        })
    }
}

// ── Time scale control ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeScaleConfig {
    /// Used at startup and whenever the control hands us garbage.
    pub default_scale: f64,
    pub max_scale: f64,
}

impl Default for TimeScaleConfig {
    fn default() -> Self {
        Self {
            default_scale: 1.0,
            max_scale: 4.0,
        }
    }
}

// ── Crackle synthesizer ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrackleConfig {
    pub sample_rate: u32,

    // Noise bed
    pub bed_secs: f32,
    pub bed_amplitude: f32,
    pub modulation_interval_ms: Millis,
    pub gain_ramp_secs: f32,
    pub stop_ramp_secs: f32,
    pub base_gain: f32,
    pub intensity_gain: f32,
    pub spark_chance: f64,
    pub spark_min: f32,
    pub spark_range: f32,
    pub max_bed_gain: f32,

    // Pop buffer
    pub pop_secs: f32,
    pub pop_attack_fraction: f32,
    pub pop_attack_exponent: f32,
    pub pop_decay_exponent: f32,
    /// One-pole low-pass coefficient applied to the pop noise (0 = off).
    pub pop_lowpass: f32,

    // Pop scheduling
    pub pop_interval_base_ms: Millis,
    pub pop_interval_intensity_ms: Millis,
    pub pop_interval_jitter_ms: Millis,

    // Pop voice
    pub pop_peak_base: f32,
    pub pop_peak_intensity: f32,
    pub burst_chance: f64,
    pub burst_base: f32,
    pub burst_intensity: f32,
    pub pop_attack_secs: f32,
    pub pop_decay_secs: f32,
    pub pop_stop_secs: f32,
}

impl Default for CrackleConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            bed_secs: 1.2,
            bed_amplitude: 0.3,
            modulation_interval_ms: 120.0,
            gain_ramp_secs: 0.08,
            stop_ramp_secs: 0.12,
            base_gain: 0.008,
            intensity_gain: 0.05,
            spark_chance: 0.25,
            spark_min: 0.05,
            spark_range: 0.12,
            max_bed_gain: 0.3,
            pop_secs: 0.08,
            pop_attack_fraction: 0.35,
            pop_attack_exponent: 1.5,
            pop_decay_exponent: 2.4,
            pop_lowpass: 0.45,
            pop_interval_base_ms: 220.0,
            pop_interval_intensity_ms: 550.0,
            pop_interval_jitter_ms: 260.0,
            pop_peak_base: 0.05,
            pop_peak_intensity: 0.3,
            burst_chance: 0.18,
            burst_base: 0.2,
            burst_intensity: 0.35,
            pop_attack_secs: 0.005,
            pop_decay_secs: 0.08,
            pop_stop_secs: 0.09,
        }
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub fuel: FuelConfig,
    pub logs: LogConfig,
    pub chart: ChartConfig,
    pub wallet: WalletConfig,
    pub energy: EnergyConfig,
    pub actions: ActionsConfig,
    pub time_scale: TimeScaleConfig,
    pub crackle: CrackleConfig,
}

impl SimConfig {
    /// Load overrides from a JSON file. Absent fields keep their defaults.
    pub fn load(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        positive("fuel.max_fuel", self.fuel.max_fuel)?;
        non_negative("fuel.fuel_per_log", self.fuel.fuel_per_log)?;
        non_negative("fuel.decay_rate", self.fuel.decay_rate)?;
        positive("logs.base_burn_ms", self.logs.base_burn_ms)?;
        if self.logs.max_visible_logs == 0 {
            return Err(invalid("logs.max_visible_logs", "must be at least 1"));
        }
        positive("chart.window_ms", self.chart.window_ms)?;
        positive("chart.sample_interval_ms", self.chart.sample_interval_ms)?;
        positive("energy.max_energy", self.energy.max_energy)?;
        if !(0.0..=1.0).contains(&self.energy.slow_factor) {
            return Err(invalid("energy.slow_factor", "must lie in [0, 1]"));
        }
        if self.energy.policy == EnergyPolicy::Floor && self.energy.slow_factor <= 0.0 {
            return Err(invalid(
                "energy.slow_factor",
                "must be above 0 under the floor policy",
            ));
        }
        non_negative("energy.decay_per_sec", self.energy.decay_per_sec)?;
        if !(0.0..=self.energy.max_energy).contains(&self.wallet.starting_energy) {
            return Err(invalid("wallet.starting_energy", "must lie in [0, max_energy]"));
        }
        for (name, spec) in [
            ("actions.add_log", &self.actions.add_log),
            ("actions.buy_wood", &self.actions.buy_wood),
            ("actions.buy_food", &self.actions.buy_food),
            ("actions.work", &self.actions.work),
            ("actions.eat", &self.actions.eat),
            ("actions.chop", &self.actions.chop),
        ] {
            if !spec.cooldown_ms.is_finite() || spec.cooldown_ms < 0.0 {
                return Err(invalid(name, "cooldown_ms must be finite and >= 0"));
            }
            if !spec.energy_cost.is_finite() || spec.energy_cost < 0.0 {
                return Err(invalid(name, "energy_cost must be finite and >= 0"));
            }
        }
        positive("time_scale.max_scale", self.time_scale.max_scale)?;
        if !(0.0..=self.time_scale.max_scale).contains(&self.time_scale.default_scale) {
            return Err(invalid("time_scale.default_scale", "must lie in [0, max_scale]"));
        }
        if self.crackle.sample_rate == 0 {
            return Err(invalid("crackle.sample_rate", "must be above 0"));
        }
        positive("crackle.modulation_interval_ms", self.crackle.modulation_interval_ms)?;
        positive("crackle.pop_interval_base_ms", self.crackle.pop_interval_base_ms)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> SimError {
    SimError::InvalidConfig { field, reason: reason.to_string() }
}

fn positive(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be finite and > 0, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be finite and >= 0, got {value}")))
    }
}
