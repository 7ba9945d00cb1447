//! The boundary between the crackle synth and whatever makes sound.
//!
//! The synth decides *what* to play and *when*; an `AudioOutput` owns the
//! actual graph. Two implementations ship here:
//!   - `OfflineOutput`: mixes into a sample buffer on demand. Used by the
//!     headless runner and by tests.
//!   - `UnsupportedOutput`: the host has no audio. Installing always fails,
//!     which parks the synth in `CrackleState::Disabled`.

use crate::{
    error::{SimError, SimResult},
    types::Millis,
};
use std::any::Any;

/// Buffers built once, lazily, on the first start.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackleBuffers {
    pub sample_rate: u32,
    /// Looping noise bed.
    pub bed: Vec<f32>,
    /// One pop's worth of shaped, filtered noise.
    pub pop: Vec<f32>,
}

/// Gain envelope for a single pop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopVoice {
    pub peak:        f32,
    pub attack_secs: f32,
    pub decay_secs:  f32,
    pub stop_secs:   f32,
}

impl PopVoice {
    /// Linear rise to `peak`, then exponential fall to 0.0001 at `decay_secs`.
    pub fn gain_at(&self, t: f32) -> f32 {
        if t < 0.0 || t >= self.stop_secs {
            return 0.0;
        }
        if t < self.attack_secs {
            return self.peak * (t / self.attack_secs);
        }
        const FLOOR: f32 = 0.0001;
        let peak = self.peak.max(FLOOR);
        let span = (self.decay_secs - self.attack_secs).max(f32::EPSILON);
        let progress = ((t - self.attack_secs) / span).min(1.0);
        peak * (FLOOR / peak).powf(progress)
    }
}

pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Take ownership of the buffers and start the looping bed (silent).
    /// Failing here means audio is unsupported on this host.
    fn install(&mut self, buffers: CrackleBuffers) -> SimResult<()>;

    /// Start or continue producing sound.
    fn resume(&mut self) -> SimResult<()>;

    fn suspend(&mut self);

    /// Cancel any scheduled ramp and move master gain linearly to `target`.
    fn ramp_gain(&mut self, target: f32, over_secs: f32);

    /// Move the output clock forward by real elapsed time. Pops are
    /// scheduled at the clock's current position.
    fn advance_clock(&mut self, real_delta_ms: Millis);

    /// Schedule a pop at the current output time.
    fn play_pop(&mut self, voice: PopVoice);

    /// For downcasting in tests and tooling only.
    /// The synth never uses this.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct UnsupportedOutput;

impl AudioOutput for UnsupportedOutput {
    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn install(&mut self, _buffers: CrackleBuffers) -> SimResult<()> {
        Err(SimError::AudioUnavailable("no audio output on this host".into()))
    }

    fn resume(&mut self) -> SimResult<()> {
        Err(SimError::AudioUnavailable("no audio output on this host".into()))
    }

    fn suspend(&mut self) {}

    fn ramp_gain(&mut self, _target: f32, _over_secs: f32) {}

    fn advance_clock(&mut self, _real_delta_ms: Millis) {}

    fn play_pop(&mut self, _voice: PopVoice) {}

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

#[derive(Debug, Clone, Copy)]
struct ActiveVoice {
    voice: PopVoice,
    /// Output sample at which the pop begins.
    start: u64,
    /// Samples from `start` until the pop is silent for good.
    len:   u64,
}

impl ActiveVoice {
    fn end(&self) -> u64 {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy)]
struct GainRamp {
    target: f32,
    step:   f32,
    left:   usize,
}

/// Renders the crackle into memory.
///
/// Two clocks run here. `clock` is advanced by the synth with real time
/// and stamps each pop with its start sample; `cursor` is the next sample
/// `render` will produce. A pop sounds once the cursor reaches its start,
/// so a renderer that keeps pace with the synth hears pops spaced the way
/// they were scheduled. Voices that end before the later of the two
/// clocks are dropped unheard.
#[derive(Debug)]
pub struct OfflineOutput {
    sample_rate: u32,
    buffers:     Option<CrackleBuffers>,
    running:     bool,
    bed_pos:     usize,
    gain:        f32,
    ramp:        Option<GainRamp>,
    voices:      Vec<ActiveVoice>,
    pops_played: u64,
    clock:       f64,
    cursor:      u64,
}

impl OfflineOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            buffers: None,
            running: false,
            bed_pos: 0,
            gain: 0.0,
            ramp: None,
            voices: Vec::new(),
            pops_played: 0,
            clock: 0.0,
            cursor: 0,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current master gain (mid-ramp values included).
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Where the current ramp is heading, or the settled gain.
    pub fn gain_target(&self) -> f32 {
        self.ramp.map(|r| r.target).unwrap_or(self.gain)
    }

    pub fn pops_played(&self) -> u64 {
        self.pops_played
    }

    /// Pops scheduled or sounding that have not yet ended.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Current output time in samples: the later of the scheduling clock
    /// and the render cursor.
    pub fn now(&self) -> u64 {
        (self.clock.floor() as u64).max(self.cursor)
    }

    /// Next sample `render` will produce.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    fn prune_voices(&mut self) {
        let now = self.now();
        self.voices.retain(|v| v.end() > now);
    }

    fn voice_len(&self, voice: &PopVoice) -> u64 {
        let by_envelope = (voice.stop_secs.max(0.0) * self.sample_rate as f32).ceil() as u64;
        let by_template = self.buffers.as_ref().map_or(0, |b| b.pop.len() as u64);
        by_envelope.min(by_template)
    }

    /// Produce `frames` mono samples. Silence while suspended.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames];
        if !self.running {
            return out;
        }
        let Some(buffers) = self.buffers.as_ref() else {
            return out;
        };
        let rate = self.sample_rate as f32;

        for sample in out.iter_mut() {
            if let Some(mut ramp) = self.ramp.take() {
                if ramp.left <= 1 {
                    self.gain = ramp.target;
                } else {
                    self.gain += ramp.step;
                    ramp.left -= 1;
                    self.ramp = Some(ramp);
                }
            }

            let mut mix = if buffers.bed.is_empty() {
                0.0
            } else {
                let s = buffers.bed[self.bed_pos];
                self.bed_pos = (self.bed_pos + 1) % buffers.bed.len();
                s
            };

            let n = self.cursor;
            for active in self.voices.iter().filter(|v| v.start <= n && n < v.end()) {
                let position = (n - active.start) as usize;
                if let Some(raw) = buffers.pop.get(position) {
                    mix += raw * active.voice.gain_at(position as f32 / rate);
                }
            }
            self.cursor += 1;

            // Pops route through the master gain, same as the bed.
            // Soft-limit to avoid clipping.
            *sample = (mix * self.gain).tanh() * 0.9;
        }
        self.prune_voices();
        out
    }
}

impl AudioOutput for OfflineOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn install(&mut self, buffers: CrackleBuffers) -> SimResult<()> {
        if buffers.sample_rate != self.sample_rate {
            return Err(SimError::AudioUnavailable(format!(
                "buffers built at {} Hz for a {} Hz output",
                buffers.sample_rate, self.sample_rate
            )));
        }
        self.buffers = Some(buffers);
        self.bed_pos = 0;
        self.gain = 0.0;
        self.ramp = None;
        self.voices.clear();
        self.clock = 0.0;
        self.cursor = 0;
        Ok(())
    }

    fn resume(&mut self) -> SimResult<()> {
        if self.buffers.is_none() {
            return Err(SimError::AudioUnavailable("resume before install".into()));
        }
        self.running = true;
        Ok(())
    }

    fn suspend(&mut self) {
        self.running = false;
        self.voices.clear();
    }

    fn ramp_gain(&mut self, target: f32, over_secs: f32) {
        let samples = (over_secs.max(0.0) * self.sample_rate as f32).round() as usize;
        if samples == 0 {
            self.gain = target;
            self.ramp = None;
            return;
        }
        self.ramp = Some(GainRamp {
            target,
            step: (target - self.gain) / samples as f32,
            left: samples,
        });
    }

    fn advance_clock(&mut self, real_delta_ms: Millis) {
        if !self.running || !real_delta_ms.is_finite() || real_delta_ms <= 0.0 {
            return;
        }
        self.clock += real_delta_ms / 1_000.0 * self.sample_rate as f64;
        self.prune_voices();
    }

    fn play_pop(&mut self, voice: PopVoice) {
        if !self.running {
            return;
        }
        self.prune_voices();
        let len = self.voice_len(&voice);
        if len == 0 {
            return;
        }
        self.pops_played += 1;
        self.voices.push(ActiveVoice { voice, start: self.now(), len });
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
