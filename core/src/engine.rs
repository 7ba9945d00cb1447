//! The frame loop. One engine owns the whole hearth.
//!
//! FRAME ORDER (fixed, documented, never reordered):
//!   1. Energy factor from the wallet's current energy
//!   2. Scaled delta = real * time_scale * energy_factor; clock advances
//!   3. Logs burn by the scaled delta; spent logs leave the grate
//!   4. Fuel decays by the scaled delta; due chart samples are recorded
//!   5. Cooldowns tick by the *real* delta (each applies its own scaling)
//!   6. Energy drains by the scaled delta
//!   7. Crackle intensity follows normalized fuel
//!   8. Ember status change detection
//!   9. Crackle timers tick by the *real* delta
//!
//! RULES:
//!   - All simulation state lives here and is mutated only through
//!     `advance` and `trigger`. Nothing else holds a `&mut`.
//!   - All randomness flows through the RngBank.
//!   - Audio timers read real time and write only to the audio output.

use crate::{
    action::{ActionKind, ActionOutcome, ActionScheduler},
    audio_output::{AudioOutput, OfflineOutput},
    clock::{format_speed, SimClock},
    command::PlayerCommand,
    config::SimConfig,
    crackle::{CrackleState, CrackleSynth},
    error::SimResult,
    event::SimEvent,
    fuel::{EmberStatus, FuelModel},
    history::{FuelHistory, SampleClock},
    logs::{LogChanges, LogPile},
    rng::{RngBank, RngSlot, SubsystemRng},
    types::Millis,
    view::{AudioView, FrameView, PresentationSink, WalletView},
    wallet::ResourceWallet,
};

pub struct SimEngine {
    pub clock:      SimClock,
    seed:           u64,
    config:         SimConfig,
    fuel:           FuelModel,
    logs:           LogPile,
    wallet:         ResourceWallet,
    actions:        ActionScheduler,
    history:        FuelHistory,
    sample_clock:   SampleClock,
    crackle:        CrackleSynth,
    log_rng:        SubsystemRng,
    ember_status:   EmberStatus,
    last_frame:     Option<Millis>,
    startup_events: Vec<SimEvent>,
}

impl SimEngine {
    /// A cold hearth: no fuel, no logs, starting wallet.
    /// Fails only if `config` does not validate.
    pub fn new(seed: u64, config: SimConfig, output: Box<dyn AudioOutput>) -> SimResult<Self> {
        config.validate()?;
        let rng_bank = RngBank::new(seed);
        let fuel = FuelModel::new(config.fuel.clone());
        let logs = LogPile::new(config.logs.clone());
        let ember_status = fuel.ember_status(logs.len());

        let mut crackle = CrackleSynth::new(
            config.crackle.clone(),
            output,
            rng_bank.for_slot(RngSlot::Crackle),
        );
        crackle.set_intensity(fuel.normalized());

        log::info!("hearth initialised: seed={seed}");
        Ok(Self {
            clock:          SimClock::new(&config.time_scale),
            seed,
            fuel,
            logs,
            wallet:         ResourceWallet::new(&config.wallet, config.energy.max_energy),
            actions:        ActionScheduler::new(config.actions.clone(), config.energy.clone()),
            history:        FuelHistory::new(config.chart.window_ms),
            sample_clock:   SampleClock::new(&config.chart),
            crackle,
            log_rng:        rng_bank.for_slot(RngSlot::Logs),
            ember_status,
            last_frame:     None,
            startup_events: vec![SimEvent::RunInitialized { seed }],
            config,
        })
    }

    /// A lit hearth, the way the page opens: first chart sample, the
    /// configured opening logs placed for free, second chart sample.
    /// Call this instead of new() unless a test needs a cold start.
    pub fn build(seed: u64, config: SimConfig, output: Box<dyn AudioOutput>) -> SimResult<Self> {
        let mut engine = SimEngine::new(seed, config, output)?;
        engine.record_sample();
        for _ in 0..engine.config.logs.opening_logs {
            let mut events = engine.place_log();
            engine.startup_events.append(&mut events);
        }
        if let Some(event) = engine.detect_ember_change() {
            engine.startup_events.push(event);
        }
        engine.crackle.set_intensity(engine.fuel.normalized());
        engine.record_sample();
        Ok(engine)
    }

    /// Default config, offline audio. For tests and tooling.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        let config = SimConfig::default();
        let output = Box::new(OfflineOutput::new(config.crackle.sample_rate));
        SimEngine::build(seed, config, output)
    }

    // ── Frame loop ─────────────────────────────────────────────────

    /// Drive one frame from a host timestamp (e.g. a refresh callback).
    /// The first call only establishes the baseline.
    pub fn frame(&mut self, now_ms: Millis) -> Vec<SimEvent> {
        let real_delta = match self.last_frame {
            Some(prev) if now_ms.is_finite() => (now_ms - prev).max(0.0),
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_frame = Some(now_ms);
        }
        self.advance(real_delta)
    }

    /// Advance the whole hearth by `real_delta` ms of wall-clock time.
    pub fn advance(&mut self, real_delta: Millis) -> Vec<SimEvent> {
        let real_delta = if real_delta.is_finite() { real_delta.max(0.0) } else { 0.0 };
        let mut events = Vec::new();

        // 1–2. Scaled simulated delta.
        let energy_factor = self.actions.energy_factor(self.wallet.energy);
        let time_scale = self.clock.time_scale();
        let scaled = real_delta * time_scale * energy_factor;
        let sim_time = self.clock.advance(scaled);

        // 3. Logs.
        let changes = self.logs.burn(scaled);
        self.push_log_events(&changes, &mut events);

        // 4. Fuel and chart.
        self.fuel.advance(scaled);
        let due = self.sample_clock.feed(scaled);
        for _ in 0..due {
            self.history.record_sample(sim_time, self.fuel.level());
        }
        self.history.trim(sim_time);

        // 5. Cooldowns, on real time.
        let payouts = self.actions.tick(real_delta, time_scale, energy_factor, &mut self.wallet);
        for payout in payouts {
            events.push(SimEvent::PayoutApplied {
                sim_time,
                action: payout.action,
                delta:  payout.delta,
            });
        }

        // 6. Fatigue.
        self.wallet.drain_energy(self.config.energy.decay_per_sec, scaled);

        // 7–8. Derived state.
        self.crackle.set_intensity(self.fuel.normalized());
        events.extend(self.detect_ember_change());

        // 9. Audio timers.
        self.crackle.tick(real_delta);

        if !events.is_empty() {
            log::debug!(
                "frame={} sim_time={sim_time:.0} fuel={:.2} logs={} events={}",
                self.clock.frame,
                self.fuel.level(),
                self.logs.len(),
                events.len()
            );
        }
        events
    }

    /// Run `real_ms` of wall-clock time in fixed frames of `frame_ms`.
    /// Used by the headless runner and tests.
    pub fn run_for(&mut self, real_ms: Millis, frame_ms: Millis) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if frame_ms.is_nan() || frame_ms <= 0.0 || !real_ms.is_finite() {
            return events;
        }
        let mut left = real_ms;
        while left > 0.0 {
            let step = left.min(frame_ms);
            events.extend(self.advance(step));
            left -= step;
        }
        events
    }

    /// Hand the current derived state to a renderer.
    pub fn render(&self, sink: &mut dyn PresentationSink) {
        sink.present(&self.view());
    }

    // ── Player input ───────────────────────────────────────────────

    /// Apply one command from the presentation layer. Commands that
    /// cannot run right now are silently ignored.
    pub fn trigger(&mut self, command: &PlayerCommand) -> Vec<SimEvent> {
        match command {
            PlayerCommand::ToggleAudio => self.toggle_audio(),
            PlayerCommand::SetTimeScale { value } => self.set_time_scale(*value),
            other => match other.action() {
                Some(kind) => self.perform(kind).1,
                None => Vec::new(),
            },
        }
    }

    /// Attempt a cooldown-gated action.
    pub fn perform(&mut self, kind: ActionKind) -> (ActionOutcome, Vec<SimEvent>) {
        let outcome = self.actions.try_trigger(kind, &mut self.wallet);
        let mut events = Vec::new();
        let ActionOutcome::Fired { cooldown_ms, immediate_payout } = outcome else {
            return (outcome, events);
        };

        let sim_time = self.clock.sim_time;
        events.push(SimEvent::ActionTriggered {
            sim_time,
            action: kind,
            cooldown_ms,
        });
        if let Some(delta) = immediate_payout.filter(|d| !d.is_empty()) {
            events.push(SimEvent::PayoutApplied { sim_time, action: kind, delta });
        }
        if kind == ActionKind::AddLog {
            events.extend(self.place_log());
            events.extend(self.detect_ember_change());
            self.crackle.set_intensity(self.fuel.normalized());
        }
        (outcome, events)
    }

    pub fn set_time_scale(&mut self, value: f64) -> Vec<SimEvent> {
        let before = self.clock.time_scale();
        let applied = self.clock.set_time_scale(value);
        self.time_scale_events(before, applied)
    }

    /// Raw text from the speed control.
    pub fn set_time_scale_text(&mut self, raw: &str) -> Vec<SimEvent> {
        let before = self.clock.time_scale();
        let applied = self.clock.set_time_scale_text(raw);
        self.time_scale_events(before, applied)
    }

    fn time_scale_events(&self, before: f64, applied: f64) -> Vec<SimEvent> {
        if applied == before {
            return Vec::new();
        }
        log::debug!("time scale {before} -> {applied}");
        vec![SimEvent::TimeScaleChanged {
            sim_time:   self.clock.sim_time,
            time_scale: applied,
        }]
    }

    /// Play if silent, silence if playing. Does nothing once disabled.
    pub fn toggle_audio(&mut self) -> Vec<SimEvent> {
        let from = self.crackle.state();
        match from {
            CrackleState::Disabled => {}
            CrackleState::Playing => self.crackle.stop(),
            CrackleState::Uninitialized | CrackleState::Ready | CrackleState::Suspended => {
                self.crackle.set_intensity(self.fuel.normalized());
                self.crackle.start();
            }
        }
        let to = self.crackle.state();
        if from == to {
            Vec::new()
        } else {
            vec![SimEvent::AudioStateChanged { from, to }]
        }
    }

    // ── Read access ────────────────────────────────────────────────

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn fuel(&self) -> &FuelModel {
        &self.fuel
    }

    pub fn logs(&self) -> &LogPile {
        &self.logs
    }

    pub fn wallet(&self) -> &ResourceWallet {
        &self.wallet
    }

    /// Direct wallet access for tooling and tests. Gameplay goes through
    /// `trigger`.
    pub fn wallet_mut(&mut self) -> &mut ResourceWallet {
        &mut self.wallet
    }

    pub fn actions(&self) -> &ActionScheduler {
        &self.actions
    }

    pub fn history(&self) -> &FuelHistory {
        &self.history
    }

    pub fn crackle(&self) -> &CrackleSynth {
        &self.crackle
    }

    /// For tooling that pulls rendered audio out of the output.
    pub fn crackle_mut(&mut self) -> &mut CrackleSynth {
        &mut self.crackle
    }

    pub fn ember_status(&self) -> EmberStatus {
        self.ember_status
    }

    pub fn energy_factor(&self) -> f64 {
        self.actions.energy_factor(self.wallet.energy)
    }

    /// Events produced while building the engine.
    pub fn startup_events(&self) -> &[SimEvent] {
        &self.startup_events
    }

    pub fn view(&self) -> FrameView {
        let sim_time = self.clock.sim_time;
        let status = self.fuel.ember_status(self.logs.len());
        FrameView {
            frame:        self.clock.frame,
            sim_time,
            time_scale:   self.clock.time_scale(),
            speed_label:  format_speed(self.clock.time_scale()),
            fuel:         self.fuel.level(),
            fuel_readout: self.fuel.readout(),
            ember_status: status,
            ember_label:  status.label().to_string(),
            flame:        self.fuel.visuals(),
            log_count:    self.logs.len(),
            logs:         self.logs.visuals(),
            chart:        self.history.project(sim_time, self.fuel.max()),
            wallet: WalletView {
                wood:           self.wallet.wood,
                coins:          self.wallet.coins,
                food:           self.wallet.food,
                energy:         self.wallet.energy,
                energy_percent: self.wallet.energy_percent(),
                energy_factor:  self.energy_factor(),
            },
            actions: self.actions.statuses(&self.wallet),
            audio:   AudioView::from_state(self.crackle.state()),
        }
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Put a log on the grate and feed the fire. No cost checks.
    fn place_log(&mut self) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let changes = self.logs.add(&mut self.log_rng);
        self.push_log_events(&changes, &mut events);
        let fuel_after = self.fuel.add_fuel();
        self.record_sample();

        if let Some(log_id) = changes.added {
            let burn_ms = self.logs.get(log_id).map(|l| l.total_ms).unwrap_or_default();
            events.push(SimEvent::LogAdded {
                sim_time: self.clock.sim_time,
                log_id,
                burn_ms,
                fuel_after,
            });
        }
        events
    }

    fn record_sample(&mut self) {
        self.history.record_sample(self.clock.sim_time, self.fuel.level());
    }

    fn push_log_events(&self, changes: &LogChanges, events: &mut Vec<SimEvent>) {
        let sim_time = self.clock.sim_time;
        for &log_id in &changes.evicted {
            events.push(SimEvent::LogEvicted { sim_time, log_id });
        }
        for &log_id in &changes.burned_out {
            events.push(SimEvent::LogBurnedOut { sim_time, log_id });
        }
    }

    fn detect_ember_change(&mut self) -> Option<SimEvent> {
        let now = self.fuel.ember_status(self.logs.len());
        if now == self.ember_status {
            return None;
        }
        let from = std::mem::replace(&mut self.ember_status, now);
        log::debug!("ember status {from:?} -> {now:?}");
        Some(SimEvent::EmberStatusChanged {
            sim_time: self.clock.sim_time,
            from,
            to: now,
        })
    }
}
