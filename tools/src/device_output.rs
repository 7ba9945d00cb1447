//! Crackle on the host's default output device.
//!
//! The mixing is `OfflineOutput`'s; this wraps it as a rodio source the
//! audio thread pulls from. The synth talks to the same mixer through a
//! mutex, so pops land at the device's current playback position.

use hearth_core::{
    audio_output::{AudioOutput, CrackleBuffers, OfflineOutput, PopVoice},
    error::SimResult,
    types::Millis,
};
use rodio::{OutputStream, Sink};
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Samples mixed per lock of the shared mixer (about 10 ms at 48 kHz).
const BLOCK: usize = 512;

type SharedMixer = Arc<Mutex<OfflineOutput>>;

fn lock(mixer: &SharedMixer) -> MutexGuard<'_, OfflineOutput> {
    mixer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Endless mono stream pulled by the audio thread.
struct MixerSource {
    mixer:       SharedMixer,
    sample_rate: u32,
    block:       Vec<f32>,
    pos:         usize,
}

impl Iterator for MixerSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.block.len() {
            self.block = lock(&self.mixer).render(BLOCK);
            self.pos = 0;
        }
        let sample = self.block.get(self.pos).copied().unwrap_or(0.0);
        self.pos += 1;
        Some(sample)
    }
}

impl rodio::Source for MixerSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

pub struct DeviceOutput {
    mixer:       SharedMixer,
    sample_rate: u32,
    sink:        Sink,
    _stream:     OutputStream,
}

impl DeviceOutput {
    /// Open the default device. The sink starts paused until `resume`.
    pub fn open(sample_rate: u32) -> anyhow::Result<Self> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        let mixer: SharedMixer = Arc::new(Mutex::new(OfflineOutput::new(sample_rate)));
        sink.pause();
        sink.append(MixerSource {
            mixer: Arc::clone(&mixer),
            sample_rate,
            block: Vec::new(),
            pos: 0,
        });
        Ok(Self { mixer, sample_rate, sink, _stream: stream })
    }
}

impl AudioOutput for DeviceOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn install(&mut self, buffers: CrackleBuffers) -> SimResult<()> {
        lock(&self.mixer).install(buffers)
    }

    fn resume(&mut self) -> SimResult<()> {
        lock(&self.mixer).resume()?;
        self.sink.play();
        Ok(())
    }

    fn suspend(&mut self) {
        lock(&self.mixer).suspend();
        self.sink.pause();
    }

    fn ramp_gain(&mut self, target: f32, over_secs: f32) {
        lock(&self.mixer).ramp_gain(target, over_secs);
    }

    // The device's own playback position is the output clock.
    fn advance_clock(&mut self, _real_delta_ms: Millis) {}

    fn play_pop(&mut self, voice: PopVoice) {
        lock(&self.mixer).play_pop(voice);
    }

    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
