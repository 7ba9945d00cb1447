use crate::config::{ResourceCost, ResourceDelta, WalletConfig};
use serde::{Deserialize, Serialize};

/// The player's stock. Counts never go negative; energy stays in
/// `[0, max_energy]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceWallet {
    pub wood:   u32,
    pub coins:  u32,
    pub food:   u32,
    pub energy: f64,
    max_energy: f64,
}

impl ResourceWallet {
    pub fn new(config: &WalletConfig, max_energy: f64) -> Self {
        Self {
            wood:   config.starting_wood,
            coins:  config.starting_coins,
            food:   config.starting_food,
            energy: config.starting_energy.clamp(0.0, max_energy),
            max_energy,
        }
    }

    pub fn max_energy(&self) -> f64 {
        self.max_energy
    }

    pub fn can_afford(&self, cost: &ResourceCost) -> bool {
        self.wood >= cost.wood && self.coins >= cost.coins && self.food >= cost.food
    }

    /// Deduct `cost`. Callers check `can_afford` first; this saturates anyway.
    pub fn pay(&mut self, cost: &ResourceCost) {
        self.wood = self.wood.saturating_sub(cost.wood);
        self.coins = self.coins.saturating_sub(cost.coins);
        self.food = self.food.saturating_sub(cost.food);
    }

    pub fn spend_energy(&mut self, amount: f64) {
        self.energy = (self.energy - amount.max(0.0)).max(0.0);
    }

    /// Continuous drain, `rate` per simulated second.
    pub fn drain_energy(&mut self, rate_per_sec: f64, delta_sim_ms: f64) {
        if delta_sim_ms > 0.0 {
            self.spend_energy(rate_per_sec * delta_sim_ms / 1000.0);
        }
    }

    pub fn apply(&mut self, delta: &ResourceDelta) {
        self.wood = add_signed(self.wood, delta.wood);
        self.coins = add_signed(self.coins, delta.coins);
        self.food = add_signed(self.food, delta.food);
        self.energy = (self.energy + delta.energy).clamp(0.0, self.max_energy);
    }

    /// Energy as a whole percent of max.
    pub fn energy_percent(&self) -> i64 {
        ((self.energy / self.max_energy) * 100.0).round() as i64
    }
}

fn add_signed(value: u32, delta: i64) -> u32 {
    (value as i64 + delta).clamp(0, u32::MAX as i64) as u32
}
