use bevy::prelude::Vec3;
use rand::Rng;
use std::collections::HashMap;

use crate::graph::layout::LayoutState;
use crate::graph::model::{GraphModel, Link};

/// One pulse per link, travelling source -> target and wrapping around.
#[derive(Debug, Default, Clone)]
pub struct ParticleField {
    pulses: Vec<(Link, f32)>,
}

impl ParticleField {
    /// Links seen before keep their phase; new links start at a random one.
    pub fn sync<R: Rng>(&mut self, model: &GraphModel, rng: &mut R) {
        let pulses: Vec<(Link, f32)> = {
            let old: HashMap<&Link, f32> = self.pulses.iter().map(|(l, p)| (l, *p)).collect();
            model
                .links()
                .iter()
                .map(|l| {
                    let phase = old.get(l).copied().unwrap_or_else(|| rng.gen_range(0.0..1.0));
                    (l.clone(), phase)
                })
                .collect()
        };
        self.pulses = pulses;
    }

    pub fn tick(&mut self, dt: f32, speed: f32) {
        let advance = dt * speed;
        if !advance.is_finite() || advance <= 0.0 {
            return;
        }
        for (_, phase) in self.pulses.iter_mut() {
            *phase = (*phase + advance).rem_euclid(1.0);
        }
    }

    pub fn phase(&self, link: &Link) -> Option<f32> {
        self.pulses.iter().find(|(l, _)| l == link).map(|(_, p)| *p)
    }

    /// World positions for every pulse whose endpoints are laid out.
    pub fn positions<'a>(
        &'a self,
        layout: &'a LayoutState,
    ) -> impl Iterator<Item = (&'a Link, Vec3)> + 'a {
        self.pulses.iter().filter_map(move |(link, phase)| {
            let a = layout.position(&link.source)?;
            let b = layout.position(&link.target)?;
            Some((link, a.lerp(b, *phase)))
        })
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }
}
