//! The single authoritative collection of live bodies.
//!
//! Systems never add or remove bodies while iterating. They push intents
//! into [`Commands`] and the simulation hands those to
//! [`Registry::apply`] at the tick boundary.

use crate::sim::body::{Body, BodyId, BodyKind};
use glam::Vec3;
use log::debug;

#[derive(Debug, Default)]
pub struct Registry {
    bodies: Vec<Body>,
    next_id: u32,
}

/// Membership changes requested during a tick.
#[derive(Debug, Default)]
pub struct Commands {
    spawn: Vec<Body>,
    despawn: Vec<BodyId>,
}

impl Commands {
    pub fn spawn(&mut self, body: Body) {
        self.spawn.push(body);
    }

    pub fn despawn(&mut self, id: BodyId) {
        if !self.despawn.contains(&id) {
            self.despawn.push(id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spawn.is_empty() && self.despawn.is_empty()
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawn.len()
    }
}

/// What [`Registry::apply`] actually changed.
#[derive(Debug, Default)]
pub struct Applied {
    pub spawned: Vec<(BodyId, BodyKind)>,
    pub removed: Vec<(BodyId, BodyKind)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body and returns the id it was given.
    pub fn register(&mut self, mut body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.id = id;
        debug!("registered {} {} ({})", body.kind.label(), body.name, id);
        self.bodies.push(body);
        id
    }

    /// Removes a body, keeping the iteration order of the rest.
    pub fn unregister(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.bodies.iter().position(|b| b.id == id)?;
        let body = self.bodies.remove(idx);
        debug!("unregistered {} {} ({})", body.kind.label(), body.name, id);
        Some(body)
    }

    /// Applies deferred despawns first, then spawns.
    pub fn apply(&mut self, commands: Commands) -> Applied {
        let mut applied = Applied::default();
        for id in commands.despawn {
            if let Some(body) = self.unregister(id) {
                applied.removed.push((id, body.kind));
            }
        }
        for body in commands.spawn {
            let kind = body.kind;
            let id = self.register(body);
            applied.spawned.push((id, kind));
        }
        applied
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Live bodies of `kind`: Active and Fragmenting, never Destroyed.
    pub fn find_all(&self, kind: BodyKind) -> impl Iterator<Item = &Body> {
        self.bodies
            .iter()
            .filter(move |b| b.kind == kind && b.is_alive())
    }

    pub fn count(&self, kind: BodyKind) -> usize {
        self.find_all(kind).count()
    }

    /// Closest live body of `kind`; on a tie the earliest registered wins.
    pub fn find_nearest(&self, point: Vec3, kind: BodyKind) -> Option<&Body> {
        let mut best: Option<(&Body, f32)> = None;
        for body in self.find_all(kind) {
            let dist = body.position.distance_squared(point);
            match best {
                Some((_, best_dist)) if best_dist <= dist => {}
                _ => best = Some((body, dist)),
            }
        }
        best.map(|(body, _)| body)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Drops every body, cancelling whatever timers they still held, and
    /// restarts id numbering.
    pub fn clear(&mut self) {
        for body in &mut self.bodies {
            body.cancel_timers();
        }
        self.bodies.clear();
        self.next_id = 0;
    }
}
