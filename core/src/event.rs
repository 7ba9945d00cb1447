//! Everything the engine did, as data.
//!
//! `SimEngine::advance` and `SimEngine::trigger` return the events they
//! produced. Nothing reads them back inside the core; they exist for the
//! runner's log, for tests, and for the determinism check.

use crate::{
    action::ActionKind,
    config::ResourceDelta,
    crackle::CrackleState,
    fuel::EmberStatus,
    types::{LogId, Millis},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        seed: u64,
    },
    TimeScaleChanged {
        sim_time: Millis,
        time_scale: f64,
    },

    // ── Fire events ────────────────────────────────
    LogAdded {
        sim_time: Millis,
        log_id: LogId,
        burn_ms: Millis,
        fuel_after: f64,
    },
    LogBurnedOut {
        sim_time: Millis,
        log_id: LogId,
    },
    LogEvicted {
        sim_time: Millis,
        log_id: LogId,
    },
    EmberStatusChanged {
        sim_time: Millis,
        from: EmberStatus,
        to: EmberStatus,
    },

    // ── Player action events ───────────────────────
    ActionTriggered {
        sim_time: Millis,
        action: ActionKind,
        cooldown_ms: Millis,
    },
    PayoutApplied {
        sim_time: Millis,
        action: ActionKind,
        delta: ResourceDelta,
    },

    // ── Audio events ───────────────────────────────
    AudioStateChanged {
        from: CrackleState,
        to: CrackleState,
    },
}

impl SimEvent {
    /// Stable snake_case name, matching the serialized `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::RunInitialized { .. }     => "run_initialized",
            SimEvent::TimeScaleChanged { .. }   => "time_scale_changed",
            SimEvent::LogAdded { .. }           => "log_added",
            SimEvent::LogBurnedOut { .. }       => "log_burned_out",
            SimEvent::LogEvicted { .. }         => "log_evicted",
            SimEvent::EmberStatusChanged { .. } => "ember_status_changed",
            SimEvent::ActionTriggered { .. }    => "action_triggered",
            SimEvent::PayoutApplied { .. }      => "payout_applied",
            SimEvent::AudioStateChanged { .. }  => "audio_state_changed",
        }
    }
}
