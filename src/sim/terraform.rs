//! Planet recolouring and the alignment beacon raised once every planet has
//! been visited.
//!
//! The planet counters live in [`SystemContext`], which the simulation owns
//! and passes to whoever needs it.

use crate::sim::body::{BodyId, BodyKind, Color};
use crate::sim::config::TerraformConfig;
use crate::sim::event::SimEvent;
use crate::sim::registry::Registry;
use crate::sim::timer::Countdown;
use glam::Vec3;
use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const NEON_COLORS: &[Color] = &[
    Color::rgb(1.0, 0.0, 0.0),
    Color::rgb(0.0, 1.0, 0.0),
    Color::rgb(1.0, 0.0, 1.0),
    Color::rgb(1.0, 0.647, 0.0),
    Color::rgb(1.0, 0.75, 0.8),
    Color::rgb(0.0, 1.0, 1.0),
    Color::rgb(1.0, 0.92, 0.016),
    Color::rgb(0.5, 0.0, 1.0),
    Color::rgb(0.75, 1.0, 0.0),
    Color::rgb(1.0, 0.5, 0.31),
    Color::rgb(0.2, 1.0, 0.8),
    Color::rgb(0.0, 1.0, 0.5),
    Color::rgb(1.0, 0.36, 0.36),
    Color::rgb(0.0, 0.78, 1.0),
    Color::rgb(0.94, 0.0, 0.54),
    Color::rgb(1.0, 1.0, 0.2),
    Color::rgb(0.4, 0.8, 1.0),
    Color::rgb(0.9, 0.1, 0.2),
];

pub fn random_neon(rng: &mut ChaCha8Rng) -> Color {
    NEON_COLORS[rng.gen_range(0..NEON_COLORS.len())]
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorFade {
    pub from: Color,
    pub to: Color,
    pub timer: Countdown,
}

/// The pulsing line raised when the whole system has been terraformed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Beacon {
    pub color: Color,
    pub raised_at: f64,
}

impl Beacon {
    /// Ping-pongs between 0 and 1 at `speed` cycles per second.
    pub fn pulse(&self, now: f64, speed: f32) -> f32 {
        let t = ((now - self.raised_at).max(0.0) * f64::from(speed)).rem_euclid(2.0);
        (if t > 1.0 { 2.0 - t } else { t }) as f32
    }

    pub fn width(&self, now: f64, config: &TerraformConfig) -> f32 {
        let pulse = self.pulse(now, config.beacon_pulse_speed);
        config.beacon_min_width + (config.beacon_max_width - config.beacon_min_width) * pulse
    }
}

/// Shared planet bookkeeping.
#[derive(Debug, Default)]
pub struct SystemContext {
    total_planets: usize,
    changed: BTreeSet<BodyId>,
    beacon: Option<Beacon>,
}

impl SystemContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_planets(&self) -> usize {
        self.total_planets
    }

    pub fn changed_planets(&self) -> usize {
        self.changed.len()
    }

    pub fn beacon(&self) -> Option<&Beacon> {
        self.beacon.as_ref()
    }

    /// Returns `true` the first time a planet is recorded.
    pub fn register_changed(&mut self, id: BodyId) -> bool {
        let inserted = self.changed.insert(id);
        if inserted {
            info!("planet {} changed colour; {} changed in total", id, self.changed.len());
        }
        inserted
    }

    /// Recounts planets, forgets destroyed ones and raises the beacon once
    /// every live planet has changed.
    pub fn refresh(
        &mut self,
        registry: &Registry,
        rng: &mut ChaCha8Rng,
        now: f64,
        events: &mut Vec<SimEvent>,
    ) {
        let live: BTreeSet<BodyId> = registry.find_all(BodyKind::Planet).map(|p| p.id).collect();
        if live.len() != self.total_planets {
            self.total_planets = live.len();
            debug!("total planets updated: {}", self.total_planets);
        }
        self.changed.retain(|id| live.contains(id));

        if self.beacon.is_none() && self.total_planets > 0 && self.changed.len() == self.total_planets {
            let beacon = Beacon {
                color: random_neon(rng),
                raised_at: now,
            };
            info!("every planet has been terraformed; beacon raised");
            self.beacon = Some(beacon);
            events.push(SimEvent::Aligned);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Recolours the nearest planet within reach of `point`.
pub fn interact(
    registry: &mut Registry,
    point: Vec3,
    config: &TerraformConfig,
    context: &mut SystemContext,
    rng: &mut ChaCha8Rng,
    events: &mut Vec<SimEvent>,
) -> Option<BodyId> {
    let (id, distance) = registry
        .find_nearest(point, BodyKind::Planet)
        .filter(|p| p.is_active())
        .map(|p| (p.id, p.position.distance(point)))?;
    if distance >= config.interaction_distance {
        debug!("nearest planet {} is out of reach ({distance:.1})", id);
        return None;
    }

    let target = random_neon(rng);
    let planet = registry.get_mut(id)?;
    planet.color_fade = Some(ColorFade {
        from: planet.color,
        to: target,
        timer: Countdown::new(config.fade_duration),
    });
    if context.register_changed(id) {
        events.push(SimEvent::Terraformed { id });
    }
    Some(id)
}

pub fn advance_color_fades(registry: &mut Registry, dt: f32) {
    for body in registry.iter_mut() {
        let Some(fade) = body.color_fade.as_mut() else {
            continue;
        };
        let done = fade.timer.tick(dt);
        body.color = if done {
            fade.to
        } else {
            fade.from.lerp(fade.to, fade.timer.progress())
        };
        if done || fade.timer.is_cancelled() {
            body.color_fade = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::Body;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn planets(registry: &mut Registry, n: usize) -> Vec<BodyId> {
        (0..n)
            .map(|i| {
                registry.register(Body::new(
                    BodyKind::Planet,
                    format!("P{i}"),
                    Vec3::new(10.0 * (i as f32 + 1.0), 0.0, 0.0),
                    0.5,
                ))
            })
            .collect()
    }

    #[test]
    fn interaction_fades_the_nearest_planet() {
        let mut registry = Registry::new();
        let ids = planets(&mut registry, 2);
        let mut context = SystemContext::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut events = Vec::new();
        let config = TerraformConfig::default();

        let hit = interact(
            &mut registry,
            Vec3::new(19.0, 0.0, 0.0),
            &config,
            &mut context,
            &mut rng,
            &mut events,
        );
        assert_eq!(hit, Some(ids[1]));
        assert_eq!(events, vec![SimEvent::Terraformed { id: ids[1] }]);

        let target = registry.get(ids[1]).unwrap().color_fade.unwrap().to;
        advance_color_fades(&mut registry, 0.5);
        assert!(registry.get(ids[1]).unwrap().color_fade.is_some());
        advance_color_fades(&mut registry, 0.5);
        let planet = registry.get(ids[1]).unwrap();
        assert!(planet.color_fade.is_none());
        assert_eq!(planet.color, target);
    }

    #[test]
    fn out_of_reach_does_nothing() {
        let mut registry = Registry::new();
        planets(&mut registry, 1);
        let mut context = SystemContext::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut events = Vec::new();
        let config = TerraformConfig {
            interaction_distance: 5.0,
            ..TerraformConfig::default()
        };
        let hit = interact(
            &mut registry,
            Vec3::new(-50.0, 0.0, 0.0),
            &config,
            &mut context,
            &mut rng,
            &mut events,
        );
        assert!(hit.is_none());
        assert_eq!(context.changed_planets(), 0);
    }

    #[test]
    fn beacon_rises_once_all_planets_changed() {
        let mut registry = Registry::new();
        let ids = planets(&mut registry, 2);
        let mut context = SystemContext::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut events = Vec::new();

        context.register_changed(ids[0]);
        context.refresh(&registry, &mut rng, 1.0, &mut events);
        assert!(context.beacon().is_none());

        context.register_changed(ids[1]);
        context.refresh(&registry, &mut rng, 2.0, &mut events);
        context.refresh(&registry, &mut rng, 3.0, &mut events);
        assert_eq!(events, vec![SimEvent::Aligned]);
        assert!(context.beacon().is_some());
    }

    #[test]
    fn no_beacon_for_an_empty_system() {
        let registry = Registry::new();
        let mut context = SystemContext::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut events = Vec::new();
        context.refresh(&registry, &mut rng, 0.0, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn beacon_pulse_ping_pongs() {
        let beacon = Beacon {
            color: Color::WHITE,
            raised_at: 10.0,
        };
        let config = TerraformConfig::default();
        assert_relative_eq!(beacon.pulse(10.0, 1.0), 0.0);
        assert_relative_eq!(beacon.pulse(10.5, 1.0), 0.5);
        assert_relative_eq!(beacon.pulse(11.0, 1.0), 1.0);
        assert_relative_eq!(beacon.pulse(11.25, 1.0), 0.75);
        assert_relative_eq!(beacon.width(11.0, &config), config.beacon_max_width);
    }
}
