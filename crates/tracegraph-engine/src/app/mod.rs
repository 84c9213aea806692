use bevy::prelude::*;
use crossbeam_channel::Sender;

use crate::app::events::PlaybackFired;
use crate::app::resources::FeedRx;
use crate::audio::{NullSink, ToneSink, ToneTrigger};
use crate::graph::EngineState;
use crate::util::config::{self, EngineConfig};

pub mod events;
pub mod resources;

/// Hooks the engine into a bevy app: feeds are drained, the layout steps once
/// per frame and playback advances by the frame's wall time.
pub struct TraceGraphPlugin {
    cfg: EngineConfig,
    tones: Option<Sender<ToneTrigger>>,
}

impl TraceGraphPlugin {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg, tones: None }
    }

    /// Reads the user config file, falling back to defaults.
    pub fn from_disk() -> Self {
        Self::new(config::load_or_default())
    }

    pub fn with_tones(mut self, tx: Sender<ToneTrigger>) -> Self {
        self.tones = Some(tx);
        self
    }
}

impl Plugin for TraceGraphPlugin {
    fn build(&self, app: &mut App) {
        let sink: Box<dyn ToneSink> = match &self.tones {
            Some(tx) => Box::new(tx.clone()),
            None => Box::new(NullSink),
        };
        app.add_event::<PlaybackFired>()
            .insert_resource(EngineState::new(self.cfg.clone(), sink))
            .add_systems(Update, (pump_feed, tick_layout, tick_playback).chain());
    }
}

fn pump_feed(
    mut st: ResMut<EngineState>,
    rx: Option<Res<FeedRx>>,
    mut out: EventWriter<PlaybackFired>,
) {
    let Some(rx) = rx else {
        return;
    };
    for feed in rx.0.try_iter().take(1_000) {
        for evt in st.apply(feed) {
            out.send(PlaybackFired(evt));
        }
    }
}

pub fn tick_layout(time: Res<Time>, mut st: ResMut<EngineState>) {
    st.tick_frame(time.delta_seconds());
}

pub fn tick_playback(
    time: Res<Time>,
    mut st: ResMut<EngineState>,
    mut out: EventWriter<PlaybackFired>,
) {
    for evt in st.advance_playback(time.delta()) {
        out.send(PlaybackFired(evt));
    }
}
