//! Rolling fuel history for the chart.
//!
//! Samples are taken on a fixed cadence of *simulated* time, so the chart
//! scrolls faster when the time scale goes up. The buffer holds at most
//! one window of simulated time; older samples fall off the front.

use crate::{config::ChartConfig, types::Millis};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FuelSample {
    pub time:  Millis,
    pub value: f64,
}

/// A sample projected into the chart's unit square.
/// `x` runs 0 (window start) → 1 (now); `y` is fuel / max, 0 at the bottom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

impl ChartPoint {
    /// Pixel coordinates on a canvas with the origin at the top left.
    pub fn to_canvas(&self, width: f64, height: f64) -> (f64, f64) {
        (self.x * width, height - self.y * height)
    }
}

#[derive(Debug, Clone)]
pub struct FuelHistory {
    window_ms: Millis,
    samples:   VecDeque<FuelSample>,
}

impl FuelHistory {
    pub fn new(window_ms: Millis) -> Self {
        Self {
            window_ms,
            samples: VecDeque::new(),
        }
    }

    pub fn window_ms(&self) -> Millis {
        self.window_ms
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &FuelSample> {
        self.samples.iter()
    }

    pub fn oldest(&self) -> Option<&FuelSample> {
        self.samples.front()
    }

    pub fn latest(&self) -> Option<&FuelSample> {
        self.samples.back()
    }

    /// Append a sample taken at `sim_time` and trim the window behind it.
    pub fn record_sample(&mut self, sim_time: Millis, value: f64) {
        self.samples.push_back(FuelSample { time: sim_time, value });
        self.trim(sim_time);
    }

    /// Drop samples that fell out of the window as of `sim_time`.
    /// The frame loop calls this on frames that record nothing.
    pub fn trim(&mut self, sim_time: Millis) {
        let cutoff = sim_time - self.window_ms;
        while self.samples.front().is_some_and(|s| s.time < cutoff) {
            self.samples.pop_front();
        }
    }

    /// Map retained samples into the unit square as seen at `sim_time`.
    pub fn project(&self, sim_time: Millis, max_value: f64) -> Vec<ChartPoint> {
        let window_start = sim_time - self.window_ms;
        self.samples
            .iter()
            .filter(|s| s.time >= window_start)
            .map(|s| ChartPoint {
                x: ((s.time - window_start) / self.window_ms).clamp(0.0, 1.0),
                y: (s.value / max_value).clamp(0.0, 1.0),
            })
            .collect()
    }
}

/// Accumulates scaled simulated time and says how many samples are due.
#[derive(Debug, Clone)]
pub struct SampleClock {
    interval_ms:  Millis,
    max_catch_up: u64,
    accumulated:  Millis,
}

impl SampleClock {
    pub fn new(config: &ChartConfig) -> Self {
        let max_catch_up = (config.window_ms / config.sample_interval_ms).ceil().max(1.0) as u64;
        Self {
            interval_ms: config.sample_interval_ms,
            max_catch_up,
            accumulated: 0.0,
        }
    }

    /// Feed one frame's simulated delta; returns the number of samples due.
    ///
    /// A single huge frame could owe thousands of samples, all stamped with
    /// the same time. Anything past one window's worth would be trimmed
    /// straight away, so the owed count is capped and the remainder dropped.
    pub fn feed(&mut self, scaled_delta: Millis) -> u64 {
        if scaled_delta > 0.0 && scaled_delta.is_finite() {
            self.accumulated += scaled_delta;
        }
        let due = (self.accumulated / self.interval_ms).floor() as u64;
        if due == 0 {
            return 0;
        }
        self.accumulated -= due as f64 * self.interval_ms;
        due.min(self.max_catch_up)
    }

    pub fn accumulated(&self) -> Millis {
        self.accumulated
    }
}
