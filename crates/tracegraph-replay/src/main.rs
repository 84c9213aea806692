mod args;

use anyhow::{Context, Result};
use args::parse_args;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracegraph_core::{Feed, GhostTrace, GraphInput, LiveTrace};
use tracegraph_engine::util::config;
use tracegraph_engine::{EngineState, PlaybackEvent, StepEvent, ToneTrigger};

const FRAME: Duration = Duration::from_millis(16);

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;

    let mut cfg = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_default(),
    };
    args.apply_to(&mut cfg);
    let horizon_ms = args.horizon_ms(&cfg);

    let graph = GraphInput::from_json(&read_file(&args.graph)?)
        .with_context(|| format!("parse graph {}", args.graph.display()))?;
    let live = match &args.live {
        Some(path) => Some(
            LiveTrace::from_json(&read_file(path)?)
                .with_context(|| format!("parse live trace {}", path.display()))?,
        ),
        None => None,
    };
    let ghost = match &args.ghost {
        Some(path) => Some(
            GhostTrace::from_json(&read_file(path)?)
                .with_context(|| format!("parse ghost trace {}", path.display()))?,
        ),
        None => None,
    };

    // Stand-in for an audio backend: owns the receiving end, logs each tone.
    let (tone_tx, tone_rx) = crossbeam_channel::unbounded::<ToneTrigger>();
    let audio = std::thread::spawn(move || {
        let mut played = 0usize;
        for tone in tone_rx.iter() {
            played += 1;
            tracing::info!(
                frequency = tone.frequency,
                duration_ms = tone.duration_ms,
                waveform = ?tone.waveform,
                "tone"
            );
        }
        played
    });

    let mut st = EngineState::new(cfg, Box::new(tone_tx));
    let mut total = log_events(st.apply(Feed::Graph { graph }));
    if let Some(trace) = ghost {
        total += log_events(st.apply(Feed::GhostTrace { trace }));
    }
    if let Some(trace) = live {
        total += log_events(st.apply(Feed::LiveTrace { trace }));
    }

    let mut ticker = args.realtime.then(|| tokio::time::interval(FRAME));
    let mut elapsed = Duration::ZERO;
    while !st.scheduler().is_idle() {
        if let Some(limit) = horizon_ms {
            if elapsed >= Duration::from_millis(limit) {
                tracing::warn!(limit_ms = limit, "stopping at time limit");
                break;
            }
        }
        if let Some(t) = ticker.as_mut() {
            t.tick().await;
        }
        st.tick_frame(FRAME.as_secs_f32());
        total += log_events(st.advance_playback(FRAME));
        elapsed += FRAME;
    }

    for (id, p) in st.layout().iter() {
        tracing::debug!(node = %id, x = p.x, y = p.y, z = p.z, "final position");
    }
    tracing::info!(
        events = total,
        elapsed_ms = elapsed.as_millis() as u64,
        energy = st.layout().kinetic_energy(),
        "replay finished"
    );

    // dropping the engine drops the sender, which ends the audio thread
    drop(st);
    let played = audio
        .join()
        .map_err(|_| anyhow::anyhow!("audio thread panicked"))?;
    tracing::info!(tones = played, "audio drained");
    Ok(())
}

fn log_events(events: Vec<PlaybackEvent>) -> usize {
    for e in &events {
        match &e.event {
            StepEvent::Visit {
                node,
                kind,
                revisit,
            } => tracing::info!(
                channel = %e.channel,
                at_ms = e.at_ms,
                node = %node,
                kind = kind.as_str(),
                revisit,
                "visit"
            ),
            StepEvent::Traverse { from, to, linked } => tracing::info!(
                channel = %e.channel,
                at_ms = e.at_ms,
                from = %from,
                to = %to,
                linked,
                "traverse"
            ),
            StepEvent::Finished => {
                tracing::info!(channel = %e.channel, at_ms = e.at_ms, "finished")
            }
        }
    }
    events.len()
}
