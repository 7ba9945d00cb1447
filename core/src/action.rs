//! Cooldown/energy scheduler for the player's six actions.
//!
//! Each action pays its cost when triggered, then runs a cooldown.
//! Payouts are either applied on the spot or held "pending" until the
//! cooldown crosses zero, at which point they land exactly once.
//!
//! Cooldowns tick in real time scaled per action:
//!   - TimeAndEnergy: real * time_scale * energy_factor
//!   - TimeOnly:      real * time_scale   (eating is never slowed by fatigue)
//!
//! Invalid triggers are not errors. They come back as
//! `ActionOutcome::Rejected` and change nothing.

use crate::{
    config::{
        ActionSpec, ActionsConfig, CooldownScaling, EnergyConfig, EnergyPolicy, PayoutTiming,
        ResourceDelta,
    },
    types::Millis,
    wallet::ResourceWallet,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AddLog,
    BuyWood,
    BuyFood,
    Work,
    Eat,
    Chop,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        Self::AddLog,
        Self::BuyWood,
        Self::BuyFood,
        Self::Work,
        Self::Eat,
        Self::Chop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddLog  => "add_log",
            Self::BuyWood => "buy_wood",
            Self::BuyFood => "buy_food",
            Self::Work    => "work",
            Self::Eat     => "eat",
            Self::Chop    => "chop",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl ActionsConfig {
    pub fn spec(&self, kind: ActionKind) -> &ActionSpec {
        match kind {
            ActionKind::AddLog  => &self.add_log,
            ActionKind::BuyWood => &self.buy_wood,
            ActionKind::BuyFood => &self.buy_food,
            ActionKind::Work    => &self.work,
            ActionKind::Eat     => &self.eat,
            ActionKind::Chop    => &self.chop,
        }
    }
}

/// How much fatigue slows time-scaled work, in [0, 1].
///
/// Under `Floor` the result never drops below `slow_factor`, so the
/// hearth keeps moving even at zero energy. Under `Halt` it reaches 0.
pub fn energy_factor(energy: f64, config: &EnergyConfig) -> f64 {
    let ratio = if config.max_energy > 0.0 {
        (energy / config.max_energy).min(1.0)
    } else {
        1.0
    };
    match config.policy {
        EnergyPolicy::Floor => ratio.max(config.slow_factor),
        EnergyPolicy::Halt  => ratio.max(0.0),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    CoolingDown,
    InsufficientResources,
    TooTired,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    Fired {
        cooldown_ms: Millis,
        /// Payout applied during the trigger itself, if any.
        immediate_payout: Option<ResourceDelta>,
    },
    Rejected(RejectReason),
}

impl ActionOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, ActionOutcome::Fired { .. })
    }
}

/// One action's timer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionCooldown {
    pub remaining_ms: Millis,
    /// Paid for, payout not yet delivered.
    pub pending: bool,
}

impl ActionCooldown {
    pub fn is_ready(&self) -> bool {
        self.remaining_ms == 0.0 && !self.pending
    }

    /// Decrement by `scaled_delta`. Returns true on the frame the timer
    /// crosses from running to zero.
    fn tick(&mut self, scaled_delta: Millis) -> bool {
        if self.remaining_ms <= 0.0 || scaled_delta <= 0.0 || !scaled_delta.is_finite() {
            return false;
        }
        self.remaining_ms = (self.remaining_ms - scaled_delta).max(0.0);
        self.remaining_ms == 0.0
    }
}

/// Per-action state the presentation layer needs for its button.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ActionStatus {
    pub action: ActionKind,
    pub enabled: bool,
    pub pending: bool,
    /// Remaining / base cooldown, 0 when idle.
    pub cooldown_fraction: f64,
    pub remaining_ms: Millis,
}

/// A deferred payout that landed during `ActionScheduler::tick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedPayout {
    pub action: ActionKind,
    pub delta:  ResourceDelta,
}

#[derive(Debug, Clone)]
pub struct ActionScheduler {
    actions:   ActionsConfig,
    energy:    EnergyConfig,
    cooldowns: [ActionCooldown; 6],
}

impl ActionScheduler {
    pub fn new(actions: ActionsConfig, energy: EnergyConfig) -> Self {
        Self {
            actions,
            energy,
            cooldowns: Default::default(),
        }
    }

    pub fn spec(&self, kind: ActionKind) -> &ActionSpec {
        self.actions.spec(kind)
    }

    pub fn cooldown(&self, kind: ActionKind) -> &ActionCooldown {
        &self.cooldowns[kind.index()]
    }

    pub fn energy_factor(&self, energy: f64) -> f64 {
        energy_factor(energy, &self.energy)
    }

    /// Why a trigger would fail right now, or None if it would fire.
    pub fn check(&self, kind: ActionKind, wallet: &ResourceWallet) -> Option<RejectReason> {
        let spec = self.spec(kind);
        if !self.cooldown(kind).is_ready() {
            return Some(RejectReason::CoolingDown);
        }
        if !wallet.can_afford(&spec.cost) {
            return Some(RejectReason::InsufficientResources);
        }
        if spec.energy_gated && wallet.energy <= self.energy.min_action_energy {
            return Some(RejectReason::TooTired);
        }
        None
    }

    /// Attempt `kind`. On success the cost is paid, energy spent, the
    /// cooldown started and any immediate payout applied to `wallet`.
    pub fn try_trigger(&mut self, kind: ActionKind, wallet: &mut ResourceWallet) -> ActionOutcome {
        if let Some(reason) = self.check(kind, wallet) {
            log::debug!("{} rejected: {reason:?}", kind.name());
            return ActionOutcome::Rejected(reason);
        }

        let spec = self.actions.spec(kind).clone();
        wallet.pay(&spec.cost);
        if spec.energy_gated {
            wallet.spend_energy(spec.energy_cost + self.energy.base_action_cost);
        }

        let cooldown = &mut self.cooldowns[kind.index()];
        cooldown.remaining_ms = spec.cooldown_ms;

        // A zero-length cooldown has no crossing to wait for.
        let pay_now = spec.payout_timing == PayoutTiming::Immediate || spec.cooldown_ms <= 0.0;
        let immediate_payout = if pay_now {
            if !spec.payout.is_empty() {
                wallet.apply(&spec.payout);
            }
            Some(spec.payout)
        } else {
            cooldown.pending = true;
            None
        };

        log::debug!(
            "{} fired: cooldown={:.0}ms pending={} wallet=({}w {}c {}f {:.1}e)",
            kind.name(),
            spec.cooldown_ms,
            cooldown.pending,
            wallet.wood,
            wallet.coins,
            wallet.food,
            wallet.energy
        );

        ActionOutcome::Fired {
            cooldown_ms: spec.cooldown_ms,
            immediate_payout,
        }
    }

    /// Advance every cooldown by one frame of real time and deliver
    /// payouts whose cooldown reached zero on this frame.
    pub fn tick(
        &mut self,
        real_delta: Millis,
        time_scale: f64,
        energy_factor: f64,
        wallet: &mut ResourceWallet,
    ) -> Vec<CompletedPayout> {
        let mut completed = Vec::new();
        for kind in ActionKind::ALL {
            let spec = self.actions.spec(kind);
            let factor = match spec.scaling {
                CooldownScaling::TimeAndEnergy => time_scale * energy_factor,
                CooldownScaling::TimeOnly      => time_scale,
            };
            let cooldown = &mut self.cooldowns[kind.index()];
            let crossed = cooldown.tick(real_delta * factor);
            if crossed && cooldown.pending {
                cooldown.pending = false;
                wallet.apply(&spec.payout);
                log::debug!("{} payout applied: {:?}", kind.name(), spec.payout);
                completed.push(CompletedPayout { action: kind, delta: spec.payout });
            }
        }
        completed
    }

    pub fn status(&self, kind: ActionKind, wallet: &ResourceWallet) -> ActionStatus {
        let cooldown = self.cooldown(kind);
        let base = self.spec(kind).cooldown_ms;
        let cooldown_fraction = if base > 0.0 {
            (cooldown.remaining_ms / base).clamp(0.0, 1.0)
        } else {
            0.0
        };
        ActionStatus {
            action: kind,
            enabled: self.check(kind, wallet).is_none(),
            pending: cooldown.pending,
            cooldown_fraction,
            remaining_ms: cooldown.remaining_ms,
        }
    }

    pub fn statuses(&self, wallet: &ResourceWallet) -> Vec<ActionStatus> {
        ActionKind::ALL
            .iter()
            .map(|kind| self.status(*kind, wallet))
            .collect()
    }
}
