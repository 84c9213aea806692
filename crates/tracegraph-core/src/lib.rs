use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Function,
    Loop,
    Decision,
    Statement,
    Operation,
    #[default]
    Unknown,
}

impl NodeType {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "function" => Self::Function,
            "loop" => Self::Loop,
            "decision" => Self::Decision,
            "statement" => Self::Statement,
            "operation" => Self::Operation,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Loop => "loop",
            Self::Decision => "decision",
            Self::Statement => "statement",
            Self::Operation => "operation",
            Self::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(de)?;
        Ok(Self::parse(&raw))
    }
}

/// Ids as emitted by the analysis service: integers today, strings elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Str(String),
}

impl From<RawId> for NodeId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => NodeId(n.to_string()),
            RawId::Str(s) => NodeId(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInput {
    pub id: RawId,
    #[serde(rename = "type", default)]
    pub kind: NodeType,
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "lineNumber", skip_serializing_if = "Option::is_none")]
    pub lineno: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkInput {
    pub source: RawId,
    pub target: RawId,
}

/// Analysis result: `{ nodes: [{id, type, label, lineno}], links: [{source, target}] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub nodes: Vec<NodeInput>,
    #[serde(default)]
    pub links: Vec<LinkInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GraphInput {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// One entry of a live trace: a bare line number or a full tracer frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiveEntry {
    Line(i64),
    Frame(TraceFrame),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    // the tracer reports -1 for a frame that only carries an error
    #[serde(default = "missing_line")]
    pub line: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn missing_line() -> i64 {
    -1
}

impl LiveEntry {
    pub fn line(&self) -> i64 {
        match self {
            Self::Line(n) => *n,
            Self::Frame(f) => f.line,
        }
    }
}

/// Ordered visited lines, played back at a uniform step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LiveEntry>", into = "Vec<i64>")]
pub struct LiveTrace(pub Vec<i64>);

impl From<Vec<LiveEntry>> for LiveTrace {
    fn from(entries: Vec<LiveEntry>) -> Self {
        Self(entries.iter().map(LiveEntry::line).collect())
    }
}

impl From<LiveTrace> for Vec<i64> {
    fn from(t: LiveTrace) -> Self {
        t.0
    }
}

impl LiveTrace {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostEntry {
    pub line: i64,
    #[serde(rename = "timestamp", alias = "timestampMs")]
    pub timestamp_ms: i64,
}

/// A recorded run, replayed with its original wall-clock spacing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GhostTrace(pub Vec<GhostEntry>);

impl GhostTrace {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trace {
    Live(LiveTrace),
    Ghost(GhostTrace),
}

impl Trace {
    pub fn len(&self) -> usize {
        match self {
            Self::Live(t) => t.0.len(),
            Self::Ghost(t) => t.0.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn line_at(&self, idx: usize) -> Option<i64> {
        match self {
            Self::Live(t) => t.0.get(idx).copied(),
            Self::Ghost(t) => t.0.get(idx).map(|e| e.line),
        }
    }
}

impl From<LiveTrace> for Trace {
    fn from(t: LiveTrace) -> Self {
        Self::Live(t)
    }
}

impl From<GhostTrace> for Trace {
    fn from(t: GhostTrace) -> Self {
        Self::Ghost(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelName {
    Live,
    Ghost,
}

impl ChannelName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Ghost => "ghost",
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine accepts from its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Feed {
    Graph { graph: GraphInput },
    LiveTrace { trace: LiveTrace },
    GhostTrace { trace: GhostTrace },
    Clear { channel: ChannelName },
}
