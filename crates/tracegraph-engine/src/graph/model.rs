use std::collections::{HashMap, HashSet};
use tracegraph_core::{GraphInput, NodeId, NodeType};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeType,
    pub label: String,
    pub line: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
}

/// Immutable snapshot of one analysis result.
///
/// Links whose endpoints are unknown are dropped here, so nothing
/// downstream ever sees a dangling reference. The line index is built
/// once per model; first node on a line wins.
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    slots: HashMap<NodeId, usize>,
    links: Vec<Link>,
    lines: HashMap<i64, NodeId>,
    linked: HashSet<(NodeId, NodeId)>,
}

impl GraphModel {
    pub fn from_input(input: GraphInput) -> Self {
        if let Some(err) = &input.error {
            tracing::warn!(error = %err, "analysis reported an error; using empty graph");
            return Self::default();
        }

        let mut model = Self::default();
        for n in input.nodes {
            let id = NodeId::from(n.id);
            if model.slots.contains_key(&id) {
                tracing::debug!(%id, "duplicate node id ignored");
                continue;
            }
            if let Some(line) = n.lineno {
                model.lines.entry(line).or_insert_with(|| id.clone());
            }
            model.slots.insert(id.clone(), model.nodes.len());
            model.nodes.push(Node {
                id,
                kind: n.kind,
                label: n.label,
                line: n.lineno,
            });
        }

        let mut seen: HashSet<Link> = HashSet::new();
        let mut dropped = 0usize;
        for l in input.links {
            let link = Link {
                source: NodeId::from(l.source),
                target: NodeId::from(l.target),
            };
            if !(model.slots.contains_key(&link.source) && model.slots.contains_key(&link.target)) {
                dropped += 1;
                continue;
            }
            if !seen.insert(link.clone()) {
                continue;
            }
            model
                .linked
                .insert(undirected(&link.source, &link.target));
            model.links.push(link);
        }
        if dropped > 0 {
            tracing::debug!(dropped, "dropped links with unknown endpoints");
        }

        model
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.slots.get(id).map(|&i| &self.nodes[i])
    }

    pub fn slot(&self, id: &NodeId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn node_for_line(&self, line: i64) -> Option<&Node> {
        self.lines.get(&line).and_then(|id| self.node(id))
    }

    /// True if a link joins `a` and `b` in either direction.
    pub fn is_linked(&self, a: &NodeId, b: &NodeId) -> bool {
        self.linked.contains(&undirected(a, b))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn undirected(a: &NodeId, b: &NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}
