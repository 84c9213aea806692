use bevy::prelude::Vec3;
use rand::Rng;
use std::collections::HashMap;
use tracegraph_core::NodeId;

use crate::graph::model::GraphModel;
use crate::util::config::LayoutConfig;

/// Widest cube new nodes are scattered in.
const MAX_SPREAD: f32 = 1.0e6;

/// Per-node position and velocity, owned by the layout alone.
///
/// Slots follow the node order of the model last passed to [`LayoutState::sync`];
/// link endpoints are resolved to slots at the same time.
#[derive(Debug, Default, Clone)]
pub struct LayoutState {
    ids: Vec<NodeId>,
    slots: HashMap<NodeId, usize>,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    springs: Vec<(usize, usize)>,
}

impl LayoutState {
    /// Re-target the layout at a new model. Ids present before keep their
    /// position and velocity; new ids are scattered in a cube around the origin.
    pub fn sync<R: Rng>(&mut self, model: &GraphModel, spread: f32, rng: &mut R) {
        let spread = if spread.is_finite() {
            spread.abs().min(MAX_SPREAD)
        } else {
            LayoutConfig::default().initial_spread
        };
        let half = (spread * 0.5).max(f32::EPSILON);
        let mut ids = Vec::with_capacity(model.len());
        let mut slots = HashMap::with_capacity(model.len());
        let mut positions = Vec::with_capacity(model.len());
        let mut velocities = Vec::with_capacity(model.len());
        let mut kept = 0usize;

        for node in model.nodes() {
            let (p, v) = match self.slots.get(&node.id) {
                Some(&old) => {
                    kept += 1;
                    (self.positions[old], self.velocities[old])
                }
                None => (
                    Vec3::new(
                        rng.gen_range(-half..half),
                        rng.gen_range(-half..half),
                        rng.gen_range(-half..half),
                    ),
                    Vec3::ZERO,
                ),
            };
            slots.insert(node.id.clone(), ids.len());
            ids.push(node.id.clone());
            positions.push(p);
            velocities.push(v);
        }

        let springs = model
            .links()
            .iter()
            .filter_map(|l| Some((*slots.get(&l.source)?, *slots.get(&l.target)?)))
            .collect();

        tracing::debug!(nodes = ids.len(), kept, "layout synced");
        *self = Self {
            ids,
            slots,
            positions,
            velocities,
            springs,
        };
    }

    pub fn position(&self, id: &NodeId) -> Option<Vec3> {
        self.slots.get(id).map(|&i| self.positions[i])
    }

    pub fn velocity(&self, id: &NodeId) -> Option<Vec3> {
        self.slots.get(id).map(|&i| self.velocities[i])
    }

    /// Pin a node somewhere (e.g. after a drag). Returns false for unknown ids.
    pub fn set_position(&mut self, id: &NodeId, p: Vec3) -> bool {
        match self.slots.get(id) {
            Some(&i) if p.is_finite() => {
                self.positions[i] = p;
                self.velocities[i] = Vec3::ZERO;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, Vec3)> + '_ {
        self.ids.iter().zip(self.positions.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.velocities.iter().map(|v| 0.5 * v.length_squared()).sum()
    }
}

/// Force-directed layout: all-pairs repulsion, pull to origin, springs on links.
///
/// Repulsion is O(n²) per tick. That is fine for the tens of nodes a single
/// source file produces; past a few hundred nodes a spatial grid would be needed.
#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    pub cfg: LayoutConfig,
}

impl ForceLayout {
    pub fn new(cfg: LayoutConfig) -> Self {
        Self { cfg }
    }

    pub fn step(&self, st: &mut LayoutState, dt: f32) {
        let n = st.len();
        if n == 0 || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt = dt.min(self.cfg.max_dt_secs());
        let eps_sq = self.cfg.epsilon_sq.max(f32::MIN_POSITIVE);
        let damping = self.cfg.damping.clamp(0.0, 1.0);
        let max_step = self.cfg.max_step.max(0.001);

        // All forces read last tick's positions; nothing moves until integration.
        let mut forces = vec![Vec3::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = st.positions[i] - st.positions[j];
                let dist_sq = d.length_squared();
                if dist_sq < eps_sq {
                    continue;
                }
                // |f| = repulsion / dist, along d / dist
                let f = d * (self.cfg.repulsion / dist_sq);
                if !f.is_finite() {
                    continue;
                }
                forces[i] += f;
                forces[j] -= f;
            }
        }

        for (f, p) in forces.iter_mut().zip(st.positions.iter()) {
            let pull = -*p * self.cfg.centering;
            if pull.is_finite() {
                *f += pull;
            }
        }

        for &(a, b) in &st.springs {
            if a == b {
                continue;
            }
            let f = (st.positions[b] - st.positions[a]) * self.cfg.spring;
            if !f.is_finite() {
                continue;
            }
            forces[a] += f;
            forces[b] -= f;
        }

        for i in 0..n {
            let mut v = (st.velocities[i] + forces[i] * dt) * damping;
            if !v.is_finite() {
                v = Vec3::ZERO;
            }
            st.velocities[i] = v;

            let mut step = v * dt * self.cfg.speed;
            if step.length() > max_step {
                step = step.normalize_or_zero() * max_step;
            }
            let next = st.positions[i] + step;
            if next.is_finite() {
                st.positions[i] = next;
            }
        }
    }
}
