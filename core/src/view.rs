//! What the presentation layer gets to see.
//!
//! The core never touches a DOM, a canvas or a terminal. Once per frame
//! the engine builds a `FrameView` of plain numbers and strings and hands
//! it to a `PresentationSink`; the sink decides how to draw it.

use crate::{
    action::ActionStatus,
    crackle::CrackleState,
    fuel::{EmberStatus, FlameVisuals},
    history::ChartPoint,
    logs::LogVisuals,
    types::{Frame, Millis},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletView {
    pub wood:           u32,
    pub coins:          u32,
    pub food:           u32,
    pub energy:         f64,
    pub energy_percent: i64,
    pub energy_factor:  f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioView {
    pub state:        CrackleState,
    pub label:        String,
    pub aria_pressed: bool,
    pub disabled:     bool,
}

impl AudioView {
    pub fn from_state(state: CrackleState) -> Self {
        let (label, aria_pressed, disabled) = match state {
            CrackleState::Playing => ("Mute crackle", true, false),
            CrackleState::Disabled => ("Audio unsupported", false, true),
            CrackleState::Uninitialized | CrackleState::Ready | CrackleState::Suspended => {
                ("Play crackle", false, false)
            }
        };
        Self {
            state,
            label: label.to_string(),
            aria_pressed,
            disabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameView {
    pub frame:          Frame,
    pub sim_time:       Millis,
    pub time_scale:     f64,
    pub speed_label:    String,
    pub fuel:           f64,
    pub fuel_readout:   String,
    pub ember_status:   EmberStatus,
    pub ember_label:    String,
    pub flame:          FlameVisuals,
    pub log_count:      usize,
    pub logs:           Vec<LogVisuals>,
    pub chart:          Vec<ChartPoint>,
    pub wallet:         WalletView,
    pub actions:        Vec<ActionStatus>,
    pub audio:          AudioView,
}

impl FrameView {
    /// A line chart needs two points.
    pub fn chart_drawable(&self) -> bool {
        self.chart.len() >= 2
    }
}

/// Anything that can draw a frame: a canvas bridge, a terminal, a test.
pub trait PresentationSink {
    fn present(&mut self, view: &FrameView);
}

/// Keeps every frame it is shown. Handy in tests and replays.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<FrameView>,
}

impl PresentationSink for RecordingSink {
    fn present(&mut self, view: &FrameView) {
        self.frames.push(view.clone());
    }
}
