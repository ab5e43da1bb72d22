//! Per-tick motion: orbits, self-rotation and free flight.
//!
//! Orbiters are processed in hierarchy order (Sun → Planet → Moon) so a moon
//! always reads the position its planet reached in the same tick. Processing
//! them in plain registry order would leave moons one tick behind.

use crate::sim::body::{orbit_offset, Body, BodyId};
use crate::sim::registry::Registry;
use glam::{Quat, Vec3};
use log::{error, warn};
use std::collections::BTreeMap;

/// Parent chains longer than this are treated as cycles.
const MAX_ORBIT_DEPTH: usize = 8;

#[derive(Debug, Default)]
pub struct MotionReport {
    /// Bodies whose state became non-finite this tick.
    pub faulted: Vec<BodyId>,
    /// Orbiters that lost their parent and now drift freely.
    pub orphaned: Vec<BodyId>,
}

pub fn advance(registry: &mut Registry, dt: f32) -> MotionReport {
    let mut report = MotionReport::default();
    let bodies = registry.bodies_mut();

    let index: BTreeMap<BodyId, usize> =
        bodies.iter().enumerate().map(|(i, b)| (b.id, i)).collect();

    let mut orbiters: Vec<(usize, usize)> = {
        let view: &[Body] = bodies;
        view.iter()
            .enumerate()
            .filter(|(_, b)| b.is_active() && b.orbit.is_some())
            .map(|(i, _)| (orbit_depth(view, &index, i), i))
            .collect()
    };
    orbiters.sort_by_key(|(depth, _)| *depth);

    for (_, i) in orbiters {
        let Some(orbit) = bodies[i].orbit else {
            continue;
        };
        let parent_position = index
            .get(&orbit.parent)
            .map(|&p| &bodies[p])
            .filter(|parent| parent.is_alive())
            .map(|parent| parent.position);

        let body = &mut bodies[i];
        match parent_position {
            Some(center) => {
                let degrees = orbit.angular_speed * dt;
                body.position = rotate_about(body.position, center, degrees, orbit.radius)
                    .unwrap_or_else(|| center + orbit_offset(orbit.radius, orbit.phase));
            }
            None => {
                warn!(
                    "{} ({}) lost its parent {}; continuing without an orbit",
                    body.name, body.id, orbit.parent
                );
                body.orbit = None;
                report.orphaned.push(body.id);
            }
        }
    }

    for body in bodies.iter_mut() {
        if !body.is_alive() {
            continue;
        }
        if body.is_active() {
            if let Some(speed) = body.self_rotation {
                let spin = Quat::from_rotation_y((speed * dt).to_radians());
                body.rotation = (spin * body.rotation).normalize();
            }
        }
        if body.orbit.is_none() {
            integrate(body, dt);
        }
        if !(body.position.is_finite() && body.velocity.is_finite()) {
            error!(
                "{} ({}) reached a non-finite state; removing it",
                body.name, body.id
            );
            report.faulted.push(body.id);
        }
    }

    report
}

/// Rotates `position` by `degrees` about the vertical axis through `center`,
/// then snaps it back onto the sphere of `radius` around `center`.
///
/// Returns `None` when the body sits exactly on its center and has no
/// direction left to project along.
pub fn rotate_about(position: Vec3, center: Vec3, degrees: f32, radius: f32) -> Option<Vec3> {
    let spin = Quat::from_rotation_y(degrees.to_radians());
    let rotated = spin * (position - center);
    let direction = rotated.try_normalize()?;
    Some(center + direction * radius)
}

fn integrate(body: &mut Body, dt: f32) {
    if let Some(ramp) = body.ramp.as_mut() {
        ramp.timer.tick(dt);
        let speed = ramp.current();
        body.velocity = body.velocity.normalize_or_zero() * speed;
        if ramp.timer.is_finished() {
            body.ramp = None;
        }
    }
    body.position += body.velocity * dt;
}

fn orbit_depth(bodies: &[Body], index: &BTreeMap<BodyId, usize>, start: usize) -> usize {
    let mut depth = 0;
    let mut current = start;
    while let Some(orbit) = bodies[current].orbit {
        depth += 1;
        if depth >= MAX_ORBIT_DEPTH {
            break;
        }
        match index.get(&orbit.parent) {
            Some(&parent) => current = parent,
            None => break,
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BodyKind, Orbit, SpeedRamp};
    use crate::sim::timer::Countdown;
    use approx::assert_relative_eq;

    fn sun(registry: &mut Registry, position: Vec3) -> BodyId {
        registry.register(Body::new(BodyKind::Sun, "Sun", position, 2.0))
    }

    fn orbiter(kind: BodyKind, parent: BodyId, center: Vec3, radius: f32, speed: f32) -> Body {
        let orbit = Orbit {
            parent,
            radius,
            angular_speed: speed,
            phase: 0.0,
        };
        Body::new(kind, "orbiter", center + orbit.offset_at(0.0), 0.5).with_orbit(orbit)
    }

    #[test]
    fn orbit_advances_by_angular_speed() {
        let mut registry = Registry::new();
        let sun_id = sun(&mut registry, Vec3::ZERO);
        let planet = registry.register(orbiter(BodyKind::Planet, sun_id, Vec3::ZERO, 10.0, 90.0));

        for _ in 0..4 {
            advance(&mut registry, 0.25);
        }

        let position = registry.get(planet).unwrap().position;
        assert_relative_eq!(position.x, 10.0, epsilon = 1e-3);
        assert_relative_eq!(position.z, 0.0, epsilon = 1e-3);
        assert_eq!(position.y, 0.0);
    }

    #[test]
    fn radius_is_restored_after_every_step() {
        let mut registry = Registry::new();
        let sun_id = sun(&mut registry, Vec3::ZERO);
        let planet = registry.register(orbiter(BodyKind::Planet, sun_id, Vec3::ZERO, 7.5, 13.0));
        registry.get_mut(planet).unwrap().position *= 1.2;

        for _ in 0..1000 {
            advance(&mut registry, 0.02);
            let distance = registry.get(planet).unwrap().position.length();
            assert_relative_eq!(distance, 7.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn moons_follow_the_planet_in_the_same_tick() {
        let mut registry = Registry::new();
        let sun_id = sun(&mut registry, Vec3::ZERO);
        let moon_slot = Body::new(BodyKind::Moon, "placeholder", Vec3::ZERO, 0.1);
        // Register the moon before its planet so registry order is wrong.
        let moon = registry.register(moon_slot);
        let planet = registry.register(orbiter(BodyKind::Planet, sun_id, Vec3::ZERO, 10.0, 30.0));
        let planet_start = registry.get(planet).unwrap().position;
        {
            let body = registry.get_mut(moon).unwrap();
            body.orbit = Some(Orbit {
                parent: planet,
                radius: 1.5,
                angular_speed: 45.0,
                phase: 0.0,
            });
            body.position = planet_start + Vec3::new(0.0, 0.0, 1.5);
        }

        advance(&mut registry, 0.1);

        let planet_now = registry.get(planet).unwrap().position;
        let moon_now = registry.get(moon).unwrap().position;
        assert_relative_eq!(moon_now.distance(planet_now), 1.5, epsilon = 1e-4);
    }

    #[test]
    fn orphaned_moon_drops_its_orbit() {
        let mut registry = Registry::new();
        let sun_id = sun(&mut registry, Vec3::ZERO);
        let planet = registry.register(orbiter(BodyKind::Planet, sun_id, Vec3::ZERO, 10.0, 30.0));
        let moon = registry.register(orbiter(BodyKind::Moon, planet, Vec3::new(0.0, 0.0, 10.0), 1.0, 45.0));
        registry.unregister(planet);

        let report = advance(&mut registry, 0.1);
        assert_eq!(report.orphaned, vec![moon]);
        assert!(registry.get(moon).unwrap().orbit.is_none());
    }

    #[test]
    fn self_rotation_turns_about_the_vertical_axis() {
        let mut registry = Registry::new();
        let id = registry.register(
            Body::new(BodyKind::Sun, "Sun", Vec3::ZERO, 2.0).with_self_rotation(90.0),
        );
        advance(&mut registry, 1.0);

        let body = registry.get(id).unwrap();
        let forward = body.rotation * Vec3::Z;
        assert_relative_eq!(forward.x, 1.0, epsilon = 1e-5);
        assert_eq!(body.position, Vec3::ZERO);
    }

    #[test]
    fn free_bodies_fly_straight() {
        let mut registry = Registry::new();
        let id = registry.register(
            Body::new(BodyKind::Asteroid, "rock", Vec3::ZERO, 1.0).with_velocity(Vec3::new(2.0, 0.0, -1.0)),
        );
        advance(&mut registry, 0.5);
        assert_eq!(registry.get(id).unwrap().position, Vec3::new(1.0, 0.0, -0.5));
    }

    #[test]
    fn projectile_ramp_reaches_its_target_speed() {
        let mut registry = Registry::new();
        let mut shot = Body::new(BodyKind::Projectile, "shot", Vec3::ZERO, 0.2).with_velocity(Vec3::X * 10.0);
        shot.ramp = Some(SpeedRamp {
            initial: 10.0,
            target: 15.0,
            timer: Countdown::new(1.0),
        });
        let id = registry.register(shot);

        for _ in 0..4 {
            advance(&mut registry, 0.25);
        }
        let body = registry.get(id).unwrap();
        assert_relative_eq!(body.velocity.length(), 15.0, epsilon = 1e-4);
        assert!(body.ramp.is_none());
    }

    #[test]
    fn non_finite_bodies_are_reported_without_stopping_others() {
        let mut registry = Registry::new();
        let bad = registry.register(
            Body::new(BodyKind::Asteroid, "bad", Vec3::ZERO, 1.0).with_velocity(Vec3::splat(f32::NAN)),
        );
        let good = registry.register(
            Body::new(BodyKind::Asteroid, "good", Vec3::ZERO, 1.0).with_velocity(Vec3::X),
        );

        let report = advance(&mut registry, 1.0);
        assert_eq!(report.faulted, vec![bad]);
        assert_eq!(registry.get(good).unwrap().position, Vec3::X);
    }
}
