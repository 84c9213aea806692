use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tracegraph_core::{ChannelName, Feed, GhostEntry, GhostTrace, GraphInput, LiveTrace, NodeId, NodeType};
use tracegraph_engine::{tone_for, EngineConfig, EngineState, PlaybackEvent, StepEvent, ToneTrigger};

const GRAPH: &str = r#"{
    "nodes": [
        {"id": 0, "type": "function", "label": "Func: main", "lineno": 1},
        {"id": 1, "type": "loop", "label": "Loop: For i", "lineno": 2}
    ],
    "links": [{"source": 0, "target": 1}, {"source": 1, "target": 7}]
}"#;

fn engine() -> (EngineState, Receiver<ToneTrigger>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut st = EngineState::with_rng(EngineConfig::default(), Box::new(tx), StdRng::seed_from_u64(1));
    let graph = GraphInput::from_json(GRAPH).expect("graph json");
    st.apply(Feed::Graph { graph });
    (st, rx)
}

fn run(st: &mut EngineState, total_ms: u64) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    for _ in 0..(total_ms / 10) {
        st.tick_frame(0.010);
        events.extend(st.advance_playback(Duration::from_millis(10)));
    }
    events
}

#[test]
fn live_trace_end_to_end() {
    let (mut st, tones) = engine();
    let mut events = st.apply(Feed::LiveTrace {
        trace: LiveTrace(vec![1, 2, 2, 2]),
    });
    events.extend(run(&mut st, 3_000));

    let a = NodeId::from("0");
    let b = NodeId::from("1");
    let expected = vec![
        (0, StepEvent::Visit { node: a.clone(), kind: NodeType::Function, revisit: false }),
        (500, StepEvent::Visit { node: b.clone(), kind: NodeType::Loop, revisit: false }),
        (500, StepEvent::Traverse { from: a, to: b.clone(), linked: true }),
        (1000, StepEvent::Visit { node: b.clone(), kind: NodeType::Loop, revisit: true }),
        (1500, StepEvent::Visit { node: b, kind: NodeType::Loop, revisit: true }),
        (2000, StepEvent::Finished),
    ];
    let got: Vec<_> = events.into_iter().map(|e| (e.at_ms, e.event)).collect();
    assert_eq!(got, expected);

    let tones: Vec<_> = tones.try_iter().collect();
    assert_eq!(
        tones,
        vec![
            tone_for(NodeType::Function),
            tone_for(NodeType::Loop),
            tone_for(NodeType::Loop),
            tone_for(NodeType::Loop),
        ]
    );
    assert!(st.scheduler().active_node(ChannelName::Live).is_none());
    assert!(st.scheduler().active_link(ChannelName::Live).is_none());
}

#[test]
fn live_and_ghost_run_side_by_side() {
    let (mut st, _tones) = engine();
    st.apply(Feed::GhostTrace {
        trace: GhostTrace(vec![
            GhostEntry { line: 2, timestamp_ms: 10_000 },
            GhostEntry { line: 1, timestamp_ms: 10_120 },
        ]),
    });
    st.apply(Feed::LiveTrace {
        trace: LiveTrace(vec![1, 2]),
    });

    run(&mut st, 200);
    assert_eq!(st.scheduler().active_node(ChannelName::Ghost), Some(&NodeId::from("0")));
    assert_eq!(st.scheduler().active_node(ChannelName::Live), Some(&NodeId::from("0")));

    // ghost tail ends at 620ms, live is mid-trace until 1000ms
    run(&mut st, 500);
    assert_eq!(st.scheduler().active_node(ChannelName::Ghost), None);
    assert_eq!(st.scheduler().active_node(ChannelName::Live), Some(&NodeId::from("1")));
    assert!(st.scheduler().channel(ChannelName::Ghost).unwrap().is_finished());
}

#[test]
fn distinct_active_nodes_follow_trace_order() {
    let (mut st, _tones) = engine();
    let trace = vec![1, 5, 2, 2, 1, -1, 2];
    let mut events = st.apply(Feed::LiveTrace {
        trace: LiveTrace(trace.clone()),
    });
    events.extend(run(&mut st, 5_000));

    let mut distinct: Vec<String> = Vec::new();
    for e in &events {
        if let StepEvent::Visit { node, .. } = &e.event {
            if distinct.last() != Some(&node.0) {
                distinct.push(node.0.clone());
            }
        }
    }
    assert_eq!(distinct, vec!["0", "1", "0", "1"]);
    assert!(st.layout().iter().all(|(_, p)| p.is_finite()));
}
