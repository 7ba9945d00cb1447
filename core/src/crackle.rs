//! Crackle synthesizer: a noise bed plus randomly timed pops.
//!
//! STATE MACHINE:
//!   Uninitialized ──start──▶ Ready ──▶ Playing ◀──start── Suspended
//!                                        │                    ▲
//!                                        └───────stop─────────┘
//!   Any failure to build or resume the output lands in Disabled, which
//!   is terminal. Every call that does not fit the current state is a no-op.
//!
//! TIMERS:
//!   Both timers are polled counters advanced by `tick` with *real*
//!   elapsed time. The time-scale slider never speeds up the audio.
//!   They write only to the `AudioOutput`, never to simulation state.
//!   The same real time moves the output clock, so each pop is stamped
//!   with the sample it should start on.

use crate::{
    audio_output::{AudioOutput, CrackleBuffers, PopVoice},
    config::CrackleConfig,
    rng::SubsystemRng,
    types::Millis,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrackleState {
    Uninitialized,
    Ready,
    Playing,
    Suspended,
    Disabled,
}

pub struct CrackleSynth {
    config:       CrackleConfig,
    output:       Box<dyn AudioOutput>,
    rng:          SubsystemRng,
    state:        CrackleState,
    intensity:    f64,
    /// Real ms since the bed gain was last re-rolled.
    modulation_elapsed: Millis,
    /// Real ms until the next pop fires.
    until_next_pop: Millis,
}

impl CrackleSynth {
    pub fn new(config: CrackleConfig, output: Box<dyn AudioOutput>, rng: SubsystemRng) -> Self {
        Self {
            config,
            output,
            rng,
            state: CrackleState::Uninitialized,
            intensity: 0.0,
            modulation_elapsed: 0.0,
            until_next_pop: 0.0,
        }
    }

    pub fn state(&self) -> CrackleState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == CrackleState::Playing
    }

    pub fn is_disabled(&self) -> bool {
        self.state == CrackleState::Disabled
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn output(&self) -> &dyn AudioOutput {
        self.output.as_ref()
    }

    pub fn output_mut(&mut self) -> &mut dyn AudioOutput {
        self.output.as_mut()
    }

    /// Begin or resume playback. Returns whether audio is now playing.
    pub fn start(&mut self) -> bool {
        match self.state {
            CrackleState::Disabled => return false,
            CrackleState::Playing => return true,
            CrackleState::Uninitialized => {
                let buffers = build_buffers(&self.config, self.output.sample_rate(), &mut self.rng);
                if let Err(e) = self.output.install(buffers) {
                    log::warn!("crackle disabled: {e}");
                    self.state = CrackleState::Disabled;
                    return false;
                }
                self.state = CrackleState::Ready;
                log::info!("crackle buffers built");
            }
            CrackleState::Ready | CrackleState::Suspended => {}
        }

        if let Err(e) = self.output.resume() {
            log::warn!("crackle disabled: {e}");
            self.state = CrackleState::Disabled;
            return false;
        }
        self.state = CrackleState::Playing;
        self.modulation_elapsed = 0.0;
        self.update_gain();
        self.until_next_pop = self.next_pop_interval();
        log::info!("crackle playing at intensity {:.2}", self.intensity);
        true
    }

    /// Fade out and suspend. Only meaningful while playing.
    pub fn stop(&mut self) {
        if self.state != CrackleState::Playing {
            return;
        }
        self.modulation_elapsed = 0.0;
        self.until_next_pop = 0.0;
        self.output.ramp_gain(0.0, self.config.stop_ramp_secs);
        self.output.suspend();
        self.state = CrackleState::Suspended;
        log::info!("crackle suspended");
    }

    /// Set how hot the fire is. Clamped to [0, 1]; NaN reads as 0.
    pub fn set_intensity(&mut self, value: f64) {
        self.intensity = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        if self.is_playing() {
            self.update_gain();
        }
    }

    /// Advance both real-time timers by `real_delta_ms`.
    pub fn tick(&mut self, real_delta_ms: Millis) {
        if !self.is_playing() || !real_delta_ms.is_finite() || real_delta_ms <= 0.0 {
            return;
        }
        self.output.advance_clock(real_delta_ms);

        // A stalled host (background tab, debugger) does not get a
        // backlog of gain changes or a machine-gun of pops on return:
        // each timer fires at most once per tick.
        self.modulation_elapsed += real_delta_ms;
        if self.modulation_elapsed >= self.config.modulation_interval_ms {
            self.modulation_elapsed %= self.config.modulation_interval_ms;
            self.update_gain();
        }

        self.until_next_pop -= real_delta_ms;
        if self.until_next_pop <= 0.0 {
            self.trigger_pop();
            self.until_next_pop = self.until_next_pop.max(0.0) + self.next_pop_interval();
        }
    }

    /// Re-roll the bed gain: a base that tracks intensity plus an
    /// occasional spark, ramped so it never clicks.
    fn update_gain(&mut self) {
        let c = &self.config;
        let i = self.intensity as f32;
        let base = c.base_gain + i * c.intensity_gain;
        let spark = if self.rng.chance(c.spark_chance) {
            i * (c.spark_min + self.rng.next_f64() as f32 * c.spark_range)
        } else {
            0.0
        };
        let target = (base + spark).min(c.max_bed_gain);
        self.output.ramp_gain(target, c.gain_ramp_secs);
    }

    fn trigger_pop(&mut self) {
        let c = &self.config;
        let i = self.intensity as f32;
        let burst = if self.rng.chance(c.burst_chance) {
            c.burst_base + i * c.burst_intensity
        } else {
            0.0
        };
        let peak = (c.pop_peak_base + i * c.pop_peak_intensity + burst).min(1.0);
        self.output.play_pop(PopVoice {
            peak,
            attack_secs: c.pop_attack_secs,
            decay_secs:  c.pop_decay_secs,
            stop_secs:   c.pop_stop_secs,
        });
    }

    /// Hotter fire, shorter gaps.
    fn next_pop_interval(&mut self) -> Millis {
        let c = &self.config;
        c.pop_interval_base_ms
            + (1.0 - self.intensity) * c.pop_interval_intensity_ms
            + self.rng.next_f64() * c.pop_interval_jitter_ms
    }
}

/// Build the looping bed and the pop template.
pub fn build_buffers(config: &CrackleConfig, sample_rate: u32, rng: &mut SubsystemRng) -> CrackleBuffers {
    let rate = sample_rate as f32;

    let bed_len = (rate * config.bed_secs).round() as usize;
    let bed = (0..bed_len)
        .map(|_| rng.next_signed() as f32 * config.bed_amplitude)
        .collect();

    let pop_len = (rate * config.pop_secs).round() as usize;
    let attack_len = (pop_len as f32 * config.pop_attack_fraction).max(1.0);
    let mut pop = Vec::with_capacity(pop_len);
    let mut filtered = 0.0f32;
    for k in 0..pop_len {
        let noise = rng.next_signed() as f32;
        filtered += (noise - filtered) * (1.0 - config.pop_lowpass);
        let attack = (k as f32 / attack_len).min(1.0);
        let decay = 1.0 - k as f32 / pop_len as f32;
        let envelope = attack.powf(config.pop_attack_exponent) * decay.powf(config.pop_decay_exponent);
        pop.push(filtered * envelope);
    }

    CrackleBuffers { sample_rate, bed, pop }
}
