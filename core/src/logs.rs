//! The logs currently on the grate.
//!
//! A bounded FIFO: insertion order is burn order is eviction order.
//! Logs burn down in simulated time and leave when spent or when a new
//! log pushes the oldest off a full grate.

use crate::{
    config::LogConfig,
    rng::SubsystemRng,
    types::{LogId, Millis},
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntity {
    pub id:           LogId,
    pub remaining_ms: Millis,
    pub total_ms:     Millis,
    pub rotation_deg: f64,
    pub offset_px:    f64,
}

impl LogEntity {
    /// Fraction of burn time left, in [0, 1].
    pub fn burn_ratio(&self) -> f64 {
        if self.total_ms <= 0.0 {
            return 0.0;
        }
        (self.remaining_ms / self.total_ms).clamp(0.0, 1.0)
    }

    pub fn visuals(&self, stack_index: usize) -> LogVisuals {
        LogVisuals::new(self, stack_index)
    }
}

/// Per-log numbers for the renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LogVisuals {
    pub id:           LogId,
    pub burn_ratio:   f64,
    pub width_px:     f64,
    pub height_px:    f64,
    pub bottom_px:    f64,
    pub offset_px:    f64,
    pub rotation_deg: f64,
    pub scale_y:      f64,
    pub opacity:      f64,
    pub glow_blur_px: f64,
    pub glowing:      bool,
    pub z_index:      usize,
}

impl LogVisuals {
    fn new(log: &LogEntity, stack_index: usize) -> Self {
        let r = log.burn_ratio();
        Self {
            id:           log.id,
            burn_ratio:   r,
            width_px:     70.0 + r * 50.0,
            height_px:    16.0 + r * 12.0,
            bottom_px:    24.0 + stack_index as f64 * 4.0,
            offset_px:    log.offset_px,
            rotation_deg: log.rotation_deg,
            scale_y:      0.85 + r * 0.25,
            opacity:      0.4 + r * 0.5,
            glow_blur_px: 10.0 * r,
            glowing:      r > 0.35,
            z_index:      10 + stack_index,
        }
    }
}

/// What happened to the grate during one `burn` or `add` call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LogChanges {
    pub added:      Option<LogId>,
    pub evicted:    Vec<LogId>,
    pub burned_out: Vec<LogId>,
}

#[derive(Debug, Clone)]
pub struct LogPile {
    config:  LogConfig,
    logs:    VecDeque<LogEntity>,
    next_id: LogId,
}

impl LogPile {
    pub fn new(config: LogConfig) -> Self {
        let capacity = config.max_visible_logs;
        Self {
            config,
            logs: VecDeque::with_capacity(capacity),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_visible_logs
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntity> {
        self.logs.iter()
    }

    pub fn get(&self, id: LogId) -> Option<&LogEntity> {
        self.logs.iter().find(|l| l.id == id)
    }

    /// Place a new log, evicting the oldest first if the grate is full.
    pub fn add(&mut self, rng: &mut SubsystemRng) -> LogChanges {
        let mut changes = LogChanges::default();
        while self.logs.len() >= self.config.max_visible_logs {
            if let Some(oldest) = self.logs.pop_front() {
                log::debug!("log {} evicted from full grate", oldest.id);
                changes.evicted.push(oldest.id);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        let factor = self.config.burn_min_factor + rng.next_f64() * self.config.burn_factor_spread;
        let total_ms = self.config.base_burn_ms * factor;
        let offset_px = rng.centered(self.config.max_offset_px);
        let rotation_deg = rng.centered(self.config.max_rotation_deg);

        self.logs.push_back(LogEntity {
            id,
            remaining_ms: total_ms,
            total_ms,
            rotation_deg,
            offset_px,
        });
        changes.added = Some(id);
        changes
    }

    /// Burn every log by `delta_sim_ms`, dropping the spent ones.
    pub fn burn(&mut self, delta_sim_ms: Millis) -> LogChanges {
        let mut changes = LogChanges::default();
        if delta_sim_ms <= 0.0 {
            return changes;
        }
        for log in self.logs.iter_mut() {
            log.remaining_ms -= delta_sim_ms;
        }
        self.logs.retain(|log| {
            let alive = log.remaining_ms > 0.0;
            if !alive {
                changes.burned_out.push(log.id);
            }
            alive
        });
        changes
    }

    pub fn visuals(&self) -> Vec<LogVisuals> {
        self.logs
            .iter()
            .enumerate()
            .map(|(i, log)| log.visuals(i))
            .collect()
    }
}
