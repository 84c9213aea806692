use bevy::prelude::Resource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracegraph_core::{ChannelName, Feed, GraphInput, Trace};

use crate::audio::{NullSink, ToneSink};
use crate::graph::layout::{ForceLayout, LayoutState};
use crate::graph::model::GraphModel;
use crate::graph::particles::ParticleField;
use crate::playback::{PlaybackEvent, PlaybackScheduler};
use crate::util::config::EngineConfig;

/// Everything the renderer and audio backend read from, in one place.
///
/// Layout advances on frame ticks, playback on its own millisecond clock;
/// both are fed from the same host loop but neither waits on the other.
#[derive(Resource)]
pub struct EngineState {
    cfg: EngineConfig,
    graph: Arc<GraphModel>,
    layout: LayoutState,
    forces: ForceLayout,
    particles: ParticleField,
    scheduler: PlaybackScheduler,
    playback_clock: Duration,
    rng: StdRng,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Box::new(NullSink))
    }
}

impl EngineState {
    pub fn new(cfg: EngineConfig, sink: Box<dyn ToneSink>) -> Self {
        Self::with_rng(cfg, sink, StdRng::from_entropy())
    }

    /// Deterministic initial placement, for tests and reproducible replays.
    pub fn with_rng(cfg: EngineConfig, sink: Box<dyn ToneSink>, rng: StdRng) -> Self {
        Self {
            forces: ForceLayout::new(cfg.layout.clone()),
            scheduler: PlaybackScheduler::new(cfg.playback.clone(), cfg.audio.clone(), sink),
            cfg,
            graph: Arc::new(GraphModel::default()),
            layout: LayoutState::default(),
            particles: ParticleField::default(),
            playback_clock: Duration::ZERO,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn set_sink(&mut self, sink: Box<dyn ToneSink>) {
        self.scheduler.set_sink(sink);
    }

    // ----- Apply incoming data -----
    pub fn apply(&mut self, feed: Feed) -> Vec<PlaybackEvent> {
        match feed {
            Feed::Graph { graph } => self.load_graph(graph),
            Feed::LiveTrace { trace } => self.bind(ChannelName::Live, Some(Trace::Live(trace))),
            Feed::GhostTrace { trace } => self.bind(ChannelName::Ghost, Some(Trace::Ghost(trace))),
            Feed::Clear { channel } => self.bind(channel, None),
        }
    }

    pub fn load_graph(&mut self, input: GraphInput) -> Vec<PlaybackEvent> {
        let model = Arc::new(GraphModel::from_input(input));
        tracing::info!(
            nodes = model.len(),
            links = model.links().len(),
            "graph loaded"
        );
        self.layout
            .sync(&model, self.cfg.layout.initial_spread, &mut self.rng);
        self.particles.sync(&model, &mut self.rng);
        self.graph = Arc::clone(&model);
        self.scheduler.set_graph(model)
    }

    pub fn bind(&mut self, channel: ChannelName, trace: Option<Trace>) -> Vec<PlaybackEvent> {
        self.scheduler.bind(channel, trace)
    }

    pub fn set_looping(&mut self, channel: ChannelName, looping: bool) {
        self.scheduler.set_looping(channel, looping);
    }

    // ----- Ticks -----
    pub fn tick_frame(&mut self, dt_secs: f32) {
        self.forces.step(&mut self.layout, dt_secs);
        let dt = dt_secs.min(self.cfg.layout.max_dt_secs());
        self.particles.tick(dt, self.cfg.particles.speed);
    }

    pub fn advance_playback(&mut self, dt: Duration) -> Vec<PlaybackEvent> {
        self.playback_clock += dt;
        let target = u64::try_from(self.playback_clock.as_millis()).unwrap_or(u64::MAX);
        self.scheduler.advance_to(target)
    }
}
