use crate::sim::body::{orbit_offset, Body, BodyId, BodyKind, Color, Orbit, PlanetProfile};
use crate::sim::config::SystemConfig;
use crate::sim::error::SimResult;
use crate::sim::naming::{moon_name, random_history, random_resource, NamePool};
use crate::sim::orbit::{orbit_bands, orbit_speed_for_radius, OrbitBand};
use crate::sim::registry::Registry;
use crate::sim::sampling::{random_rotation, sample};
use glam::Vec3;
use log::{info, warn};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

const PLANET_PALETTE: &[Color] = &[
    Color::rgb(0.36, 0.52, 0.86),
    Color::rgb(0.78, 0.42, 0.25),
    Color::rgb(0.42, 0.7, 0.38),
    Color::rgb(0.85, 0.78, 0.55),
    Color::rgb(0.6, 0.45, 0.75),
    Color::rgb(0.5, 0.8, 0.85),
    Color::rgb(0.7, 0.7, 0.72),
];

/// Bodies placed by one generator run, in registration order.
#[derive(Clone, Debug, Default)]
pub struct SolarSystem {
    pub sun: Option<BodyId>,
    pub planets: Vec<BodyId>,
    pub moons: Vec<BodyId>,
    pub bands: Vec<OrbitBand>,
    /// Planets dropped because no overlap-free angle was found.
    pub skipped: usize,
}

pub struct SystemGenerator<'a> {
    config: &'a SystemConfig,
    rng: &'a mut ChaCha8Rng,
    names: NamePool,
    bands: Vec<OrbitBand>,
}

impl<'a> SystemGenerator<'a> {
    /// Fails when the orbit bands cannot be built from `config`.
    pub fn new(config: &'a SystemConfig, rng: &'a mut ChaCha8Rng) -> SimResult<Self> {
        let bands = orbit_bands(config.orbit_count, config.min_distance, config.max_distance)?;
        let names = NamePool::shuffled(rng);
        Ok(Self {
            config,
            rng,
            names,
            bands,
        })
    }

    pub fn generate(&mut self, registry: &mut Registry) -> SolarSystem {
        let sun = self.make_sun();
        let sun_scale = sun.scale;
        let sun_id = registry.register(sun);

        let mut system = SolarSystem {
            sun: Some(sun_id),
            bands: self.bands.clone(),
            ..SolarSystem::default()
        };
        let mut placed: Vec<(Vec3, f32)> = vec![(Vec3::ZERO, sun_scale)];

        for i in 0..self.config.planet_count {
            let Some(planet) = self.make_planet(i, sun_id, &placed) else {
                system.skipped += 1;
                continue;
            };
            placed.push((planet.position, planet.scale));
            let moons = self.make_moons(&planet);
            let planet_id = registry.register(planet);
            system.planets.push(planet_id);

            for mut moon in moons {
                if let Some(orbit) = moon.orbit.as_mut() {
                    orbit.parent = planet_id;
                }
                system.moons.push(registry.register(moon));
            }
        }

        info!(
            "generated system: {} planets, {} moons, {} skipped",
            system.planets.len(),
            system.moons.len(),
            system.skipped
        );
        system
    }

    fn make_sun(&mut self) -> Body {
        Body::new(BodyKind::Sun, "Sun", Vec3::ZERO, self.config.sun_scale)
            .with_self_rotation(self.config.sun_rotation_speed)
            .with_color(Color::SUN)
    }

    /// Picks a band and an angle that keep clear of every placed body,
    /// nudging the angle forward on each failed attempt.
    fn make_planet(&mut self, index: usize, sun: BodyId, placed: &[(Vec3, f32)]) -> Option<Body> {
        let config = self.config;
        let band = self.bands[self.rng.gen_range(0..self.bands.len())];
        let scale = sample(self.rng, config.planet_min_scale, config.planet_max_scale);
        let mut angle: f32 = self.rng.gen_range(0.0..360.0);

        let name = self.names.name(index);
        for _ in 0..=config.placement_attempts {
            let position = orbit_offset(band.radius, angle);
            let clear = placed
                .iter()
                .all(|(other, other_scale)| other.distance(position) >= other_scale + scale);
            if clear {
                let speed = orbit_speed_for_radius(
                    band.radius,
                    config.min_distance,
                    config.max_distance,
                    config.min_orbit_speed,
                    config.max_orbit_speed,
                );
                let orbit = Orbit {
                    parent: sun,
                    radius: band.radius,
                    angular_speed: speed,
                    phase: angle,
                };
                let spin = sample(self.rng, config.min_self_rotation, config.max_self_rotation);
                let color = PLANET_PALETTE[self.rng.gen_range(0..PLANET_PALETTE.len())];
                let mut planet = Body::new(BodyKind::Planet, name, position, scale)
                    .with_orbit(orbit)
                    .with_self_rotation(spin)
                    .with_rotation(random_rotation(self.rng))
                    .with_color(color);
                planet.profile = Some(PlanetProfile {
                    resource: random_resource(self.rng).to_string(),
                    history: random_history(self.rng).to_string(),
                });
                return Some(planet);
            }
            angle = (angle + self.rng.gen_range(15.0..45.0)) % 360.0;
        }

        warn!(
            "could not place {} on band {} without overlap; skipping it",
            name, band.index
        );
        None
    }

    /// Moons are built with a placeholder parent; the caller fills in the
    /// planet id once it is registered.
    fn make_moons(&mut self, planet: &Body) -> Vec<Body> {
        let config = self.config;
        let count = self.rng.gen_range(config.moons_per_planet.clone());
        (0..count)
            .map(|k| {
                let scale = sample(self.rng, config.moon_min_scale, config.moon_max_scale);
                let gap = sample(self.rng, config.moon_min_offset, config.moon_max_offset);
                let orbit = Orbit {
                    parent: BodyId::UNASSIGNED,
                    radius: planet.radius() + scale * 0.5 + gap,
                    angular_speed: config.moon_orbit_speed,
                    phase: self.rng.gen_range(0.0..360.0),
                };
                Body::new(
                    BodyKind::Moon,
                    moon_name(&planet.name, k),
                    planet.position + orbit.offset_at(0.0),
                    scale,
                )
                .with_orbit(orbit)
                .with_color(Color::rgb(0.75, 0.75, 0.7))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::error::SimError;
    use rand::SeedableRng;

    fn run(seed: u64, config: &SystemConfig) -> (Registry, SolarSystem) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut registry = Registry::new();
        let system = SystemGenerator::new(config, &mut rng)
            .expect("valid config")
            .generate(&mut registry);
        (registry, system)
    }

    #[test]
    fn generation_is_deterministic() {
        let config = SystemConfig::default();
        let (r1, s1) = run(123, &config);
        let (r2, s2) = run(123, &config);

        assert_eq!(s1.planets.len(), s2.planets.len());
        assert_eq!(r1.len(), r2.len());
        for (a, b) in r1.iter().zip(r2.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.position, b.position);
            assert_eq!(a.scale, b.scale);
        }
    }

    #[test]
    fn planets_sit_on_bands_without_overlap() {
        let config = SystemConfig {
            planet_count: 20,
            ..SystemConfig::default()
        };
        for seed in 0..20 {
            let (registry, system) = run(seed, &config);
            let radii: Vec<f32> = system.bands.iter().map(|b| b.radius).collect();
            let planets: Vec<&Body> = registry.find_all(BodyKind::Planet).collect();
            assert_eq!(planets.len() + system.skipped, 20);

            for planet in &planets {
                let orbit = planet.orbit.expect("planets orbit the sun");
                assert!(radii.contains(&orbit.radius), "{} off-band", planet.name);
                assert_eq!(planet.position.y, 0.0);
                assert!((planet.position.length() - orbit.radius).abs() < 1e-3);
                assert!(planet.profile.is_some());
            }
            for (i, a) in planets.iter().enumerate() {
                for b in &planets[i + 1..] {
                    assert!(
                        a.position.distance(b.position) >= a.scale + b.scale,
                        "{} overlaps {} (seed {seed})",
                        a.name,
                        b.name
                    );
                }
            }
        }
    }

    #[test]
    fn planets_take_names_from_the_pool_in_order() {
        let config = SystemConfig {
            planet_count: 3,
            moons_per_planet: 0..=0,
            ..SystemConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let expected = NamePool::shuffled(&mut rng.clone());
        let mut registry = Registry::new();
        let system = SystemGenerator::new(&config, &mut rng)
            .unwrap()
            .generate(&mut registry);

        assert_eq!(system.skipped, 0);
        for (i, id) in system.planets.iter().enumerate() {
            assert_eq!(registry.get(*id).unwrap().name, expected.name(i));
        }
    }

    #[test]
    fn moons_orbit_their_planet() {
        let config = SystemConfig {
            planet_count: 4,
            moons_per_planet: 2..=2,
            ..SystemConfig::default()
        };
        let (registry, system) = run(5, &config);
        assert_eq!(system.moons.len(), system.planets.len() * 2);

        for id in &system.moons {
            let moon = registry.get(*id).unwrap();
            let orbit = moon.orbit.unwrap();
            let planet = registry.get(orbit.parent).expect("parent registered");
            assert_eq!(planet.kind, BodyKind::Planet);
            assert!(moon.name.starts_with(&planet.name));
            assert!((moon.position.distance(planet.position) - orbit.radius).abs() < 1e-3);
            let surface_gap = orbit.radius - planet.radius() - moon.radius();
            assert!(surface_gap >= config.moon_min_offset - 1e-4, "{} overlaps", moon.name);
        }
    }

    #[test]
    fn zero_orbit_count_fails_before_generating() {
        let config = SystemConfig {
            orbit_count: 0,
            ..SystemConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            SystemGenerator::new(&config, &mut rng),
            Err(SimError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn crowded_band_skips_planets_instead_of_overlapping() {
        let config = SystemConfig {
            planet_count: 30,
            orbit_count: 1,
            min_distance: 3.0,
            max_distance: 3.0,
            sun_scale: 0.5,
            planet_min_scale: 1.0,
            planet_max_scale: 1.0,
            moons_per_planet: 0..=0,
            ..SystemConfig::default()
        };
        let (registry, system) = run(9, &config);
        // A ring of radius 3 fits at most 9 unit planets spaced 2 apart.
        assert!(system.skipped > 0);
        assert!(registry.count(BodyKind::Planet) <= 9);
    }
}
