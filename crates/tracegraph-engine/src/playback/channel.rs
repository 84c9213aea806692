use tracegraph_core::{ChannelName, NodeId, NodeType, Trace};

use crate::graph::model::GraphModel;
use crate::util::config::PlaybackConfig;

const MIN_STEP_DELAY_MS: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveLink {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// `revisit` is set when the previous resolved step landed on the same node.
    Visit {
        node: NodeId,
        kind: NodeType,
        revisit: bool,
    },
    /// Active node changed. `linked` tells whether the graph joins the two.
    Traverse {
        from: NodeId,
        to: NodeId,
        linked: bool,
    },
    Finished,
}

/// The one pending step of a channel. Dropping it is cancelling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimer {
    pub due_ms: u64,
}

/// Plays one trace against one graph, a step per timer expiry.
#[derive(Debug, Clone)]
pub struct TraceChannel {
    name: ChannelName,
    trace: Option<Trace>,
    looping: bool,

    cursor: usize,
    active_node: Option<NodeId>,
    active_link: Option<ActiveLink>,
    last_advance_ms: Option<u64>,

    timer: Option<StepTimer>,
    finished: bool,
}

impl TraceChannel {
    pub fn new(name: ChannelName) -> Self {
        Self {
            name,
            trace: None,
            looping: false,
            cursor: 0,
            active_node: None,
            active_link: None,
            last_advance_ms: None,
            timer: None,
            finished: false,
        }
    }

    pub fn name(&self) -> ChannelName {
        self.name
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.trace.as_ref().map(Trace::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    pub fn active_node(&self) -> Option<&NodeId> {
        self.active_node.as_ref()
    }

    pub fn active_link(&self) -> Option<&ActiveLink> {
        self.active_link.as_ref()
    }

    pub fn last_advance_ms(&self) -> Option<u64> {
        self.last_advance_ms
    }

    pub fn timer(&self) -> Option<StepTimer> {
        self.timer
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn cancel(&mut self) {
        self.timer = None;
    }

    /// Swap in a new trace (or none). Any pending step of the old one is
    /// cancelled before state is reset; a new trace starts at `now_ms`.
    pub fn bind(&mut self, trace: Option<Trace>, now_ms: u64) {
        self.cancel();
        self.trace = trace;
        self.restart(now_ms);
    }

    /// Start the current trace over from its first entry.
    pub fn restart(&mut self, now_ms: u64) {
        self.cancel();
        self.cursor = 0;
        self.active_node = None;
        self.active_link = None;
        self.last_advance_ms = None;
        self.finished = false;
        if self.trace.is_some() {
            self.timer = Some(StepTimer { due_ms: now_ms });
        }
    }

    /// Run the pending step if it is due by `now_ms`. Events are appended in
    /// emission order; the next timer is armed only after they are out.
    /// Returns the step's scheduled time when one ran.
    pub fn fire(
        &mut self,
        now_ms: u64,
        model: &GraphModel,
        cfg: &PlaybackConfig,
        out: &mut Vec<StepEvent>,
    ) -> Option<u64> {
        let timer = self.timer?;
        if timer.due_ms > now_ms {
            return None;
        }
        self.timer = None;
        let at = timer.due_ms;
        let Some(trace) = self.trace.as_ref() else {
            return None;
        };
        let len = trace.len();

        if self.cursor >= len {
            if !(self.looping && len > 0) {
                self.active_node = None;
                self.active_link = None;
                self.finished = true;
                self.last_advance_ms = Some(at);
                out.push(StepEvent::Finished);
                tracing::debug!(channel = %self.name, at, "channel finished");
                return Some(at);
            }
            self.cursor = 0;
        }

        let idx = self.cursor;
        let resolved = trace.line_at(idx).and_then(|line| model.node_for_line(line));
        if let Some(node) = resolved {
            let revisit = self.active_node.as_ref() == Some(&node.id);
            out.push(StepEvent::Visit {
                node: node.id.clone(),
                kind: node.kind,
                revisit,
            });
            if !revisit {
                if let Some(prev) = self.active_node.take() {
                    out.push(StepEvent::Traverse {
                        linked: model.is_linked(&prev, &node.id),
                        from: prev.clone(),
                        to: node.id.clone(),
                    });
                    self.active_link = Some(ActiveLink {
                        from: prev,
                        to: node.id.clone(),
                    });
                }
            }
            self.active_node = Some(node.id.clone());
        }

        let delay = step_delay(trace, idx, cfg);
        self.cursor = idx + 1;
        self.last_advance_ms = Some(at);
        self.timer = Some(StepTimer {
            due_ms: at.saturating_add(delay),
        });
        Some(at)
    }
}

/// Delay between entry `idx` and whatever comes after it (the next entry, or
/// the end of the trace). Never zero, so a looping channel always moves time.
fn step_delay(trace: &Trace, idx: usize, cfg: &PlaybackConfig) -> u64 {
    let delay = match trace {
        Trace::Live(_) => cfg.live_step_ms,
        Trace::Ghost(g) => match (g.0.get(idx), g.0.get(idx + 1)) {
            (Some(cur), Some(next)) => {
                let gap = next.timestamp_ms.saturating_sub(cur.timestamp_ms).max(0) as u64;
                gap.max(cfg.ghost_min_delay_ms)
            }
            _ => cfg.ghost_tail_ms,
        },
    };
    delay.max(MIN_STEP_DELAY_MS)
}
