//! Hearth — a fireplace simulation core.
//!
//! A fuel scalar that decays and is fed by logs, a small wood/coins/food/
//! energy economy gated by cooldowns, a rolling fuel chart, and a
//! procedural crackle. `engine::SimEngine` owns all of it; renderers
//! only ever see a `view::FrameView`.

pub mod action;
pub mod audio_output;
pub mod clock;
pub mod command;
pub mod config;
pub mod crackle;
pub mod engine;
pub mod error;
pub mod event;
pub mod fuel;
pub mod history;
pub mod logs;
pub mod rng;
pub mod types;
pub mod view;
pub mod wallet;
