use crate::sim::body::{Body, BodyId, BodyKind, Color};
use crate::sim::config::{SpawnVolume, SpawnerConfig};
use crate::sim::registry::{Commands, Registry};
use crate::sim::sampling::{point_in_cuboid, random_rotation, random_unit_vector, sample};
use crate::sim::timer::Countdown;
use glam::Vec3;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum SpawnerState {
    /// No planet to aim at yet; re-checks when `retry` runs out.
    WaitingForPlanets { retry: Countdown },
    /// Spawns one asteroid each time `next` runs out.
    Spawning { next: Countdown },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AsteroidSpawnRequest {
    pub target: BodyId,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Sends asteroids at randomly chosen planets on a fixed interval.
#[derive(Clone, Debug)]
pub struct AsteroidSpawner {
    state: SpawnerState,
    spawned: u32,
}

impl Default for AsteroidSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl AsteroidSpawner {
    pub fn new() -> Self {
        Self {
            // A zero-length retry checks for planets on the very first tick.
            state: SpawnerState::WaitingForPlanets {
                retry: Countdown::new(0.0),
            },
            spawned: 0,
        }
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn update(
        &mut self,
        dt: f32,
        config: &SpawnerConfig,
        registry: &Registry,
        rng: &mut ChaCha8Rng,
        commands: &mut Commands,
    ) {
        if !config.enabled {
            return;
        }

        match &mut self.state {
            SpawnerState::WaitingForPlanets { retry } => {
                if !retry.tick(dt) {
                    return;
                }
                if registry.find_all(BodyKind::Planet).any(Body::is_active) {
                    info!("planets found; asteroid spawning starts");
                    self.state = SpawnerState::Spawning {
                        next: Countdown::new(first_spawn_delay(config)),
                    };
                } else {
                    debug!("waiting for planets to spawn");
                    retry.restart(config.retry_interval);
                }
            }
            SpawnerState::Spawning { next } => {
                if !next.tick(dt) {
                    return;
                }
                match plan_spawn(config, registry, rng) {
                    Some(request) => {
                        next.restart(config.spawn_interval);
                        self.spawned += 1;
                        let asteroid = build_asteroid(self.spawned, &request, config, rng);
                        debug!(
                            "asteroid {} launched at {} from {}",
                            self.spawned, request.target, request.position
                        );
                        commands.spawn(asteroid);
                    }
                    None => {
                        warn!("no planet left to target; asteroid spawner is waiting again");
                        self.state = SpawnerState::WaitingForPlanets {
                            retry: Countdown::new(config.retry_interval),
                        };
                    }
                }
            }
        }
    }
}

/// Delay before the first asteroid once planets are seen. A planet may have
/// appeared up to one `retry_interval` before the check noticed it, so the
/// first spawn still lands within one `spawn_interval` of that planet.
pub fn first_spawn_delay(config: &SpawnerConfig) -> f32 {
    let budget = (config.spawn_interval - config.retry_interval).max(0.0);
    config.startup_delay.min(budget)
}

/// Picks a live planet and an intercept course towards it.
pub fn plan_spawn(
    config: &SpawnerConfig,
    registry: &Registry,
    rng: &mut ChaCha8Rng,
) -> Option<AsteroidSpawnRequest> {
    let targets: Vec<&Body> = registry
        .find_all(BodyKind::Planet)
        .filter(|p| p.is_active())
        .collect();
    let target = targets.choose(rng)?;

    let position = match config.volume {
        SpawnVolume::Shell { radius } => random_unit_vector(rng) * radius,
        SpawnVolume::Cuboid { min, max } => point_in_cuboid(rng, min, max),
    };
    let speed = sample(rng, config.min_speed, config.max_speed);
    let velocity = (target.position - position).normalize_or_zero() * speed;

    Some(AsteroidSpawnRequest {
        target: target.id,
        position,
        velocity,
    })
}

fn build_asteroid(
    serial: u32,
    request: &AsteroidSpawnRequest,
    config: &SpawnerConfig,
    rng: &mut ChaCha8Rng,
) -> Body {
    Body::new(
        BodyKind::Asteroid,
        format!("Asteroid {serial}"),
        request.position,
        config.asteroid_scale,
    )
    .with_velocity(request.velocity)
    .with_rotation(random_rotation(rng))
    .with_color(Color::ASTEROID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn tick(
        spawner: &mut AsteroidSpawner,
        config: &SpawnerConfig,
        registry: &mut Registry,
        rng: &mut ChaCha8Rng,
        dt: f32,
    ) -> usize {
        let mut commands = Commands::default();
        spawner.update(dt, config, registry, rng, &mut commands);
        let spawned = commands.pending_spawns();
        registry.apply(commands);
        spawned
    }

    #[test]
    fn waits_for_a_planet_then_spawns_within_one_interval() {
        let config = SpawnerConfig::default();
        let mut registry = Registry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut spawner = AsteroidSpawner::new();

        for _ in 0..200 {
            assert_eq!(tick(&mut spawner, &config, &mut registry, &mut rng, 0.25), 0);
        }
        assert!(matches!(
            spawner.state(),
            SpawnerState::WaitingForPlanets { .. }
        ));

        registry.register(Body::new(BodyKind::Planet, "Astra", Vec3::new(0.0, 0.0, 8.0), 0.5));
        let ticks_per_interval = (config.spawn_interval / 0.25) as usize;
        let mut first_spawn = None;
        for step in 1..=ticks_per_interval {
            if tick(&mut spawner, &config, &mut registry, &mut rng, 0.25) > 0 {
                first_spawn = Some(step);
                break;
            }
        }
        assert!(first_spawn.is_some(), "no asteroid within one spawn interval");
        assert_eq!(registry.count(BodyKind::Asteroid), 1);
    }

    #[test]
    fn asteroids_are_aimed_at_their_target() {
        let config = SpawnerConfig::default();
        let mut registry = Registry::new();
        let planet = registry.register(Body::new(BodyKind::Planet, "Astra", Vec3::new(3.0, 0.0, 4.0), 0.5));
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let request = plan_spawn(&config, &registry, &mut rng).unwrap();
        assert_eq!(request.target, planet);
        assert_relative_eq!(request.position.length(), 100.0, epsilon = 1e-3);

        let heading = request.velocity.normalize();
        let expected = (Vec3::new(3.0, 0.0, 4.0) - request.position).normalize();
        assert_relative_eq!(heading.dot(expected), 1.0, epsilon = 1e-5);
        let speed = request.velocity.length();
        assert!((config.min_speed - 1e-4..=config.max_speed + 1e-4).contains(&speed));
    }

    #[test]
    fn returns_to_waiting_when_targets_vanish() {
        let config = SpawnerConfig::default();
        let mut registry = Registry::new();
        let planet = registry.register(Body::new(BodyKind::Planet, "Astra", Vec3::X * 8.0, 0.5));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut spawner = AsteroidSpawner::new();

        tick(&mut spawner, &config, &mut registry, &mut rng, 0.25);
        assert!(matches!(spawner.state(), SpawnerState::Spawning { .. }));

        registry.unregister(planet);
        for _ in 0..8 {
            tick(&mut spawner, &config, &mut registry, &mut rng, 0.25);
        }
        assert!(matches!(
            spawner.state(),
            SpawnerState::WaitingForPlanets { .. }
        ));
        assert_eq!(registry.count(BodyKind::Asteroid), 0);
    }

    #[test]
    fn disabled_spawner_never_spawns() {
        let config = SpawnerConfig {
            enabled: false,
            ..SpawnerConfig::default()
        };
        let mut registry = Registry::new();
        registry.register(Body::new(BodyKind::Planet, "Astra", Vec3::X * 8.0, 0.5));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut spawner = AsteroidSpawner::new();
        for _ in 0..100 {
            assert_eq!(tick(&mut spawner, &config, &mut registry, &mut rng, 0.25), 0);
        }
    }

    #[test]
    fn first_spawn_lands_within_one_interval_for_any_arrival_time() {
        let config = SpawnerConfig {
            spawn_interval: 1.0,
            startup_delay: 1.0,
            retry_interval: 0.5,
            ..SpawnerConfig::default()
        };
        let dt = 0.05;
        let limit = config.spawn_interval + dt;

        for offset in 0..10 {
            let mut registry = Registry::new();
            let mut rng = ChaCha8Rng::seed_from_u64(offset);
            let mut spawner = AsteroidSpawner::new();
            for _ in 0..(20 + offset) {
                tick(&mut spawner, &config, &mut registry, &mut rng, dt);
            }

            registry.register(Body::new(BodyKind::Planet, "Astra", Vec3::X * 8.0, 0.5));
            let mut latency = 0.0;
            loop {
                latency += dt;
                if tick(&mut spawner, &config, &mut registry, &mut rng, dt) > 0 {
                    break;
                }
                assert!(latency <= limit, "offset {offset}: no asteroid after {latency}s");
            }
            assert!(latency <= limit, "offset {offset}: first asteroid after {latency}s");
        }
    }

    #[test]
    fn startup_delay_leaves_room_for_the_retry_check() {
        let config = SpawnerConfig {
            spawn_interval: 1.0,
            startup_delay: 1.0,
            retry_interval: 0.5,
            ..SpawnerConfig::default()
        };
        assert_relative_eq!(first_spawn_delay(&config), 0.5);

        let slow_retry = SpawnerConfig {
            retry_interval: 3.0,
            ..config
        };
        assert_eq!(first_spawn_delay(&slow_retry), 0.0);
        assert_relative_eq!(first_spawn_delay(&SpawnerConfig::default()), 1.0);
    }
}
