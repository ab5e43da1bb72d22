//! Contact handling and the `Active → Fragmenting → Destroyed` lifecycle.
//!
//! The engine never changes registry membership itself. Destroyed bodies
//! and new fragments go through [`Commands`] and appear or disappear at the
//! tick boundary.

use crate::sim::body::{Body, BodyId, BodyKind, Lifecycle};
use crate::sim::config::{CollisionConfig, FragmentationProfile};
use crate::sim::event::SimEvent;
use crate::sim::registry::{Commands, Registry};
use crate::sim::sampling::{random_rotation, random_unit_vector, sample};
use crate::sim::timer::Countdown;
use glam::Vec3;
use log::{debug, info, warn};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A touching pair as reported by a broad phase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    pub point: Vec3,
}

/// Every pair of live, solid bodies whose spheres overlap, in registry order.
///
/// Quadratic in the number of bodies, which is fine for a single system.
pub fn sphere_overlaps(registry: &Registry) -> Vec<Contact> {
    let solid: Vec<&Body> = registry
        .iter()
        .filter(|b| b.is_active() && b.kind != BodyKind::Fragment)
        .collect();

    let mut contacts = Vec::new();
    for (i, a) in solid.iter().enumerate() {
        for b in &solid[i + 1..] {
            let reach = a.radius() + b.radius();
            let offset = b.position - a.position;
            if offset.length_squared() < reach * reach {
                let t = if reach > 0.0 { a.radius() / reach } else { 0.5 };
                contacts.push(Contact {
                    a: a.id,
                    b: b.id,
                    point: a.position + offset * t,
                });
            }
        }
    }
    contacts
}

pub struct CollisionEngine<'a> {
    config: &'a CollisionConfig,
}

impl<'a> CollisionEngine<'a> {
    pub fn new(config: &'a CollisionConfig) -> Self {
        Self { config }
    }

    pub fn resolve(
        &self,
        contacts: &[Contact],
        registry: &mut Registry,
        rng: &mut ChaCha8Rng,
        commands: &mut Commands,
        events: &mut Vec<SimEvent>,
    ) {
        for contact in contacts {
            let kinds = match (registry.get(contact.a), registry.get(contact.b)) {
                (Some(a), Some(b)) if a.id != b.id && a.is_active() && b.is_active() => {
                    (a.kind, b.kind)
                }
                _ => {
                    debug!("ignoring stale contact {} / {}", contact.a, contact.b);
                    continue;
                }
            };
            if kinds.0 == BodyKind::Fragment || kinds.1 == BodyKind::Fragment {
                continue;
            }

            events.push(SimEvent::Collided {
                a: contact.a,
                b: contact.b,
                point: contact.point,
            });

            match kinds {
                (BodyKind::Planet, BodyKind::Planet) => {
                    // The first body of the pair breaks; the other is untouched.
                    info!("planet collision: {} breaks apart", contact.a);
                    self.fragment(contact.a, contact.point, registry, rng, commands, events);
                }
                (kind_a, kind_b) => {
                    if breaks_on_impact(kind_a) {
                        self.fragment(contact.a, contact.point, registry, rng, commands, events);
                    }
                    if breaks_on_impact(kind_b) {
                        self.fragment(contact.b, contact.point, registry, rng, commands, events);
                    }
                }
            }
        }
    }

    /// Starts fragmenting `id`. Does nothing if the body already collided.
    pub fn fragment(
        &self,
        id: BodyId,
        point: Vec3,
        registry: &mut Registry,
        rng: &mut ChaCha8Rng,
        commands: &mut Commands,
        events: &mut Vec<SimEvent>,
    ) {
        let Some(body) = registry.get_mut(id) else {
            return;
        };
        if body.has_collided {
            return;
        }
        body.has_collided = true;
        body.visible = false;
        body.velocity = Vec3::ZERO;

        let profile = self.profile_for(body.kind);
        let debris = self.debris(body, point, profile, rng);
        let emitted = debris.len();
        for piece in debris {
            commands.spawn(piece);
        }

        match profile.fade_duration {
            Some(fade) if fade > 0.0 => {
                body.lifecycle = Lifecycle::Fragmenting {
                    fade: Countdown::new(fade),
                };
            }
            _ => {
                body.lifecycle = Lifecycle::Destroyed;
                body.opacity = 0.0;
                commands.despawn(id);
            }
        }

        events.push(SimEvent::Fragmented {
            id,
            fragments: emitted,
        });
    }

    fn profile_for(&self, kind: BodyKind) -> FragmentationProfile {
        match kind {
            BodyKind::Asteroid => self.config.asteroid,
            BodyKind::Projectile => self.config.projectile,
            _ => self.config.planet,
        }
    }

    fn debris(
        &self,
        parent: &Body,
        point: Vec3,
        profile: FragmentationProfile,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Body> {
        if profile.fragment_count == 0 {
            return Vec::new();
        }
        let Some(template) = self.config.fragment_template else {
            warn!(
                "no fragment template configured; {} breaks without debris",
                parent.name
            );
            return Vec::new();
        };

        (0..profile.fragment_count)
            .map(|k| {
                let speed = sample(rng, template.min_speed, template.max_speed);
                let lifetime = sample(rng, template.min_lifetime, template.max_lifetime);
                Body::new(
                    BodyKind::Fragment,
                    format!("{} shard {}", parent.name, k + 1),
                    point,
                    template.scale,
                )
                .with_velocity(random_unit_vector(rng) * speed)
                .with_rotation(random_rotation(rng))
                .with_color(parent.color)
                .with_lifetime(lifetime)
            })
            .collect()
    }
}

fn breaks_on_impact(kind: BodyKind) -> bool {
    matches!(kind, BodyKind::Asteroid | BodyKind::Projectile)
}

/// Advances fades and lifetimes, and culls free bodies that left the system.
pub fn advance_timers(registry: &mut Registry, dt: f32, cull_distance: f32, commands: &mut Commands) {
    let cull_sq = cull_distance * cull_distance;
    for body in registry.iter_mut() {
        let expired = match &mut body.lifecycle {
            Lifecycle::Destroyed => continue,
            Lifecycle::Fragmenting { fade } => {
                let done = fade.tick(dt);
                body.opacity = 1.0 - fade.progress();
                done
            }
            Lifecycle::Active => {
                let timed_out = body.lifetime.as_mut().is_some_and(|t| t.tick(dt));
                let strayed = body.kind.is_free() && body.position.length_squared() > cull_sq;
                if strayed {
                    debug!("{} ({}) left the system", body.name, body.id);
                }
                timed_out || strayed
            }
        };

        if expired {
            body.lifecycle = Lifecycle::Destroyed;
            body.opacity = 0.0;
            body.visible = false;
            commands.despawn(body.id);
        }
    }
}
