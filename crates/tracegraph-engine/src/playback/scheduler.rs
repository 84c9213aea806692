use std::collections::BTreeMap;
use std::sync::Arc;
use tracegraph_core::{ChannelName, NodeId, Trace};

use crate::audio::{tone_for, NullSink, ToneSink};
use crate::graph::model::GraphModel;
use crate::playback::channel::{ActiveLink, StepEvent, TraceChannel};
use crate::util::config::{AudioConfig, PlaybackConfig};

/// Upper bound on steps run by one `advance_to` call. Anything still due
/// afterwards runs on the next call, stamped with its own due time.
pub const MAX_STEPS_PER_ADVANCE: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub channel: ChannelName,
    pub at_ms: u64,
    pub event: StepEvent,
}

/// Owns every channel and the clock they run on.
///
/// Time only moves through [`PlaybackScheduler::advance_to`]; due steps run
/// in deadline order (ties: live before ghost) and each node visit sends
/// exactly one tone to the sink.
pub struct PlaybackScheduler {
    clock_ms: u64,
    graph: Arc<GraphModel>,
    channels: BTreeMap<ChannelName, TraceChannel>,
    cfg: PlaybackConfig,
    audio: AudioConfig,
    sink: Box<dyn ToneSink>,
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new(PlaybackConfig::default(), AudioConfig::default(), Box::new(NullSink))
    }
}

impl PlaybackScheduler {
    pub fn new(cfg: PlaybackConfig, audio: AudioConfig, sink: Box<dyn ToneSink>) -> Self {
        let mut channels = BTreeMap::new();
        for name in [ChannelName::Live, ChannelName::Ghost] {
            let mut ch = TraceChannel::new(name);
            ch.set_looping(match name {
                ChannelName::Live => cfg.loop_live,
                ChannelName::Ghost => cfg.loop_ghost,
            });
            channels.insert(name, ch);
        }
        Self {
            clock_ms: 0,
            graph: Arc::new(GraphModel::default()),
            channels,
            cfg,
            audio,
            sink,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn graph(&self) -> &Arc<GraphModel> {
        &self.graph
    }

    pub fn set_sink(&mut self, sink: Box<dyn ToneSink>) {
        self.sink = sink;
    }

    pub fn set_audio(&mut self, audio: AudioConfig) {
        self.audio = audio;
    }

    /// Install a new graph. Every pending step belongs to the old line index,
    /// so all timers are cancelled first and bound traces restart from entry 0.
    pub fn set_graph(&mut self, graph: Arc<GraphModel>) -> Vec<PlaybackEvent> {
        for ch in self.channels.values_mut() {
            ch.cancel();
        }
        self.graph = graph;
        let now = self.clock_ms;
        for ch in self.channels.values_mut() {
            if ch.trace().is_some() {
                ch.restart(now);
            }
        }
        self.run_due()
    }

    /// Attach (or with `None`, detach) a trace. Only the named channel is touched.
    pub fn bind(&mut self, name: ChannelName, trace: Option<Trace>) -> Vec<PlaybackEvent> {
        let now = self.clock_ms;
        let ch = self.channel_mut(name);
        ch.bind(trace, now);
        tracing::debug!(channel = %name, len = ch.len(), "trace bound");
        self.run_due()
    }

    pub fn set_looping(&mut self, name: ChannelName, looping: bool) {
        self.channel_mut(name).set_looping(looping);
    }

    pub fn advance_by(&mut self, ms: u64) -> Vec<PlaybackEvent> {
        self.advance_to(self.clock_ms.saturating_add(ms))
    }

    /// Move the clock forward, running every step due on the way.
    pub fn advance_to(&mut self, target_ms: u64) -> Vec<PlaybackEvent> {
        let mut fired = Vec::new();
        let mut steps = 0usize;
        while let Some((name, due)) = self.earliest_due() {
            if due > target_ms {
                break;
            }
            if steps == MAX_STEPS_PER_ADVANCE {
                tracing::warn!(steps, due, target_ms, "playback backlog deferred");
                break;
            }
            self.clock_ms = self.clock_ms.max(due);
            self.fire(name, &mut fired);
            steps += 1;
        }
        self.clock_ms = self.clock_ms.max(target_ms);
        fired
    }

    /// When the next step of any channel is due, if one is pending.
    pub fn next_deadline(&self) -> Option<u64> {
        self.earliest_due().map(|(_, due)| due)
    }

    pub fn is_idle(&self) -> bool {
        self.next_deadline().is_none()
    }

    pub fn channel(&self, name: ChannelName) -> Option<&TraceChannel> {
        self.channels.get(&name)
    }

    pub fn channels(&self) -> impl Iterator<Item = &TraceChannel> + '_ {
        self.channels.values()
    }

    pub fn active_node(&self, name: ChannelName) -> Option<&NodeId> {
        self.channel(name).and_then(TraceChannel::active_node)
    }

    pub fn active_link(&self, name: ChannelName) -> Option<&ActiveLink> {
        self.channel(name).and_then(TraceChannel::active_link)
    }

    fn run_due(&mut self) -> Vec<PlaybackEvent> {
        self.advance_to(self.clock_ms)
    }

    fn earliest_due(&self) -> Option<(ChannelName, u64)> {
        self.channels
            .values()
            .filter_map(|ch| ch.timer().map(|t| (ch.name(), t.due_ms)))
            .min_by_key(|(_, due)| *due)
    }

    fn fire(&mut self, name: ChannelName, fired: &mut Vec<PlaybackEvent>) {
        let now = self.clock_ms;
        let mut out = Vec::new();
        let Some(ch) = self.channels.get_mut(&name) else {
            return;
        };
        let Some(at) = ch.fire(now, &self.graph, &self.cfg, &mut out) else {
            return;
        };
        for event in out {
            if let StepEvent::Visit { kind, .. } = &event {
                if self.audio.enabled {
                    self.sink.trigger(tone_for(*kind));
                }
            }
            fired.push(PlaybackEvent {
                channel: name,
                at_ms: at,
                event,
            });
        }
    }

    fn channel_mut(&mut self, name: ChannelName) -> &mut TraceChannel {
        self.channels
            .entry(name)
            .or_insert_with(|| TraceChannel::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneTrigger;
    use crate::graph::model::tests::{link, node};
    use crossbeam_channel::Receiver;
    use tracegraph_core::{GhostEntry, GhostTrace, GraphInput, LiveTrace, NodeType};

    fn graph() -> Arc<GraphModel> {
        Arc::new(GraphModel::from_input(GraphInput {
            nodes: vec![
                node("f", NodeType::Function, Some(1)),
                node("loop", NodeType::Loop, Some(2)),
                node("if", NodeType::Decision, Some(3)),
                node("x", NodeType::Statement, Some(4)),
            ],
            links: vec![link("f", "loop"), link("loop", "if"), link("if", "x")],
            error: None,
        }))
    }

    fn scheduler() -> (PlaybackScheduler, Receiver<ToneTrigger>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut s = PlaybackScheduler::new(
            PlaybackConfig::default(),
            AudioConfig::default(),
            Box::new(tx),
        );
        s.set_graph(graph());
        (s, rx)
    }

    fn visits(events: &[PlaybackEvent], channel: ChannelName) -> Vec<(u64, String)> {
        events
            .iter()
            .filter(|e| e.channel == channel)
            .filter_map(|e| match &e.event {
                StepEvent::Visit { node, .. } => Some((e.at_ms, node.0.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ghost_playback_follows_recorded_spacing() {
        let (mut s, _rx) = scheduler();
        let ghost = GhostTrace(
            [(1, 0), (2, 100), (3, 100), (4, 400)]
                .into_iter()
                .map(|(line, timestamp_ms)| GhostEntry { line, timestamp_ms })
                .collect(),
        );
        let mut events = s.bind(ChannelName::Ghost, Some(ghost.into()));
        events.extend(s.advance_by(10_000));

        assert_eq!(
            visits(&events, ChannelName::Ghost),
            vec![
                (0, "f".to_string()),
                (100, "loop".to_string()),
                (150, "if".to_string()),
                (450, "x".to_string()),
            ]
        );
        let finished = events
            .iter()
            .find(|e| e.event == StepEvent::Finished)
            .map(|e| e.at_ms);
        assert_eq!(finished, Some(450 + PlaybackConfig::default().ghost_tail_ms));
    }

    #[test]
    fn channels_do_not_disturb_each_other() {
        let (mut s, _rx) = scheduler();
        let ghost = GhostTrace(vec![
            GhostEntry { line: 4, timestamp_ms: 0 },
            GhostEntry { line: 3, timestamp_ms: 300 },
            GhostEntry { line: 2, timestamp_ms: 600 },
        ]);
        s.bind(ChannelName::Ghost, Some(ghost.into()));
        s.bind(ChannelName::Live, Some(LiveTrace(vec![1, 2, 3]).into()));
        let mut events = s.advance_by(250);

        // rebinding live mid-flight leaves the ghost cursor alone
        events.extend(s.bind(ChannelName::Live, Some(LiveTrace(vec![4]).into())));
        events.extend(s.advance_by(2_000));

        assert_eq!(
            visits(&events, ChannelName::Ghost),
            vec![(300, "if".to_string()), (600, "loop".to_string())]
        );
        assert_eq!(visits(&events, ChannelName::Live), vec![(250, "x".to_string())]);
        assert_eq!(s.channel(ChannelName::Ghost).unwrap().cursor(), 3);
    }

    #[test]
    fn rebinding_leaves_no_stale_timer() {
        let (mut s, _rx) = scheduler();
        s.bind(ChannelName::Live, Some(LiveTrace(vec![1, 2, 3, 4]).into()));
        s.advance_by(700);
        assert_eq!(s.active_node(ChannelName::Live), Some(&NodeId::from("loop")));

        let events = s.bind(ChannelName::Live, Some(LiveTrace(vec![4, 4]).into()));
        let mut all = events;
        all.extend(s.advance_by(60_000));
        for e in &all {
            if let StepEvent::Visit { node, .. } = &e.event {
                assert_eq!(node.0, "x", "event from the old trace: {e:?}");
            }
        }
        let times: Vec<u64> = visits(&all, ChannelName::Live).into_iter().map(|(t, _)| t).collect();
        assert_eq!(times, vec![700, 1200]);
    }

    #[test]
    fn one_tone_per_visit_including_revisits() {
        let (mut s, rx) = scheduler();
        s.bind(ChannelName::Live, Some(LiveTrace(vec![2, 2, 99, 2]).into()));
        s.advance_by(10_000);
        let tones: Vec<_> = rx.try_iter().collect();
        assert_eq!(tones, vec![tone_for(NodeType::Loop); 3]);
    }

    #[test]
    fn muted_audio_sends_nothing() {
        let (mut s, rx) = scheduler();
        s.set_audio(AudioConfig { enabled: false });
        s.bind(ChannelName::Live, Some(LiveTrace(vec![1, 2]).into()));
        s.advance_by(10_000);
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn new_graph_restarts_bound_traces() {
        let (mut s, _rx) = scheduler();
        s.bind(ChannelName::Live, Some(LiveTrace(vec![1, 2, 3]).into()));
        s.advance_by(600);
        assert_eq!(s.channel(ChannelName::Live).unwrap().cursor(), 2);

        let events = s.set_graph(graph());
        assert_eq!(visits(&events, ChannelName::Live), vec![(600, "f".to_string())]);
        assert_eq!(s.channel(ChannelName::Live).unwrap().cursor(), 1);
        assert_eq!(s.next_deadline(), Some(1100));
    }

    #[test]
    fn zero_step_looping_trace_stays_bounded() {
        let cfg = PlaybackConfig {
            live_step_ms: 0,
            loop_live: true,
            ..PlaybackConfig::default()
        };
        let mut s = PlaybackScheduler::new(cfg, AudioConfig { enabled: false }, Box::new(NullSink));
        s.set_graph(graph());

        let events = s.bind(ChannelName::Live, Some(LiveTrace(vec![1]).into()));
        assert_eq!(visits(&events, ChannelName::Live), vec![(0, "f".to_string())]);

        let events = s.advance_by(10);
        let times: Vec<u64> = visits(&events, ChannelName::Live).into_iter().map(|(t, _)| t).collect();
        assert_eq!(times, (1..=10).collect::<Vec<u64>>());

        let events = s.advance_by(1_000_000);
        assert_eq!(events.len(), MAX_STEPS_PER_ADVANCE);
        assert_eq!(events.last().map(|e| e.at_ms), Some(10 + MAX_STEPS_PER_ADVANCE as u64));
        assert!(s.next_deadline().is_some_and(|due| due <= s.now_ms()));
    }

    #[test]
    fn empty_graph_never_activates_a_node() {
        let mut s = PlaybackScheduler::default();
        s.set_graph(Arc::new(GraphModel::default()));
        s.bind(ChannelName::Live, Some(LiveTrace(vec![1, 2, 3]).into()));
        assert!(s.active_node(ChannelName::Live).is_none());
        let events = s.advance_by(10_000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, StepEvent::Finished);
        assert!(s.is_idle());
    }
}
