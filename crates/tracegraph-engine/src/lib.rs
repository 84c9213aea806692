//! Layout, trace playback and sonification for live code-structure graphs.
//!
//! A [`graph::EngineState`] takes an analysis result and up to two traces
//! (the live run and a recorded "ghost" run). Hosts call
//! [`graph::EngineState::tick_frame`] from their render loop and
//! [`graph::EngineState::advance_playback`] with elapsed time, then read node
//! positions and per-channel active state. [`app::TraceGraphPlugin`] does the
//! wiring for bevy apps.

pub mod app;
pub mod audio;
pub mod graph;
pub mod playback;
pub mod util;

pub use audio::{tone_for, ToneSink, ToneTrigger, Waveform};
pub use graph::{EngineState, ForceLayout, GraphModel, LayoutState};
pub use playback::{PlaybackEvent, PlaybackScheduler, StepEvent};
pub use util::config::EngineConfig;
