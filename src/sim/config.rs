//! Runtime configuration.
//!
//! Every section implements `Default` with the values the game shipped with,
//! and `#[serde(default)]` lets a JSON document override any subset:
//!
//! ```json
//! { "system": { "planet_count": 12 }, "spawner": { "spawn_interval": 4.0 } }
//! ```
//!
//! Call [`SimConfig::validate`] (done by `Simulation::new`) before using a
//! hand-built config.

use crate::sim::error::{SimError, SimResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub system: SystemConfig,
    pub collision: CollisionConfig,
    pub spawner: SpawnerConfig,
    pub projectile: ProjectileConfig,
    pub terraform: TerraformConfig,
    pub clock: ClockConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub planet_count: usize,
    pub orbit_count: usize,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Degrees per second at the innermost band.
    pub min_orbit_speed: f32,
    /// Degrees per second at the outermost band.
    pub max_orbit_speed: f32,
    pub sun_scale: f32,
    pub sun_rotation_speed: f32,
    pub planet_min_scale: f32,
    pub planet_max_scale: f32,
    pub min_self_rotation: f32,
    pub max_self_rotation: f32,
    /// Angle perturbations tried before a planet that overlaps is dropped.
    pub placement_attempts: u32,
    pub moons_per_planet: RangeInclusive<usize>,
    pub moon_min_scale: f32,
    pub moon_max_scale: f32,
    /// Gap between the planet surface and the moon orbit.
    pub moon_min_offset: f32,
    pub moon_max_offset: f32,
    pub moon_orbit_speed: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            planet_count: 8,
            orbit_count: 5,
            min_distance: 5.0,
            max_distance: 20.0,
            min_orbit_speed: 5.0,
            max_orbit_speed: 15.0,
            sun_scale: 2.0,
            sun_rotation_speed: 5.0,
            planet_min_scale: 0.2,
            planet_max_scale: 1.0,
            min_self_rotation: 10.0,
            max_self_rotation: 40.0,
            placement_attempts: 24,
            moons_per_planet: 0..=1,
            moon_min_scale: 0.05,
            moon_max_scale: 0.15,
            moon_min_offset: 0.5,
            moon_max_offset: 1.0,
            moon_orbit_speed: 30.0,
        }
    }
}

/// How a body of one kind breaks apart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FragmentationProfile {
    pub fragment_count: usize,
    /// `None` destroys the body in the same tick it breaks.
    pub fade_duration: Option<f32>,
}

/// Shape of the pieces left behind by a fragmenting body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentTemplate {
    pub scale: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_lifetime: f32,
    pub max_lifetime: f32,
}

impl Default for FragmentTemplate {
    fn default() -> Self {
        Self {
            scale: 0.1,
            min_speed: 2.0,
            max_speed: 6.0,
            min_lifetime: 3.0,
            max_lifetime: 5.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Run the built-in sphere overlap pass in addition to reported contacts.
    pub broad_phase: bool,
    /// Free bodies further than this from the origin are removed. Must lie
    /// beyond the asteroid spawn volume.
    pub cull_distance: f32,
    /// `None` disables fragment emission entirely.
    pub fragment_template: Option<FragmentTemplate>,
    pub planet: FragmentationProfile,
    pub asteroid: FragmentationProfile,
    pub projectile: FragmentationProfile,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            broad_phase: true,
            cull_distance: 150.0,
            fragment_template: Some(FragmentTemplate::default()),
            planet: FragmentationProfile {
                fragment_count: 34,
                fade_duration: None,
            },
            asteroid: FragmentationProfile {
                fragment_count: 5,
                fade_duration: Some(1.0),
            },
            projectile: FragmentationProfile {
                fragment_count: 3,
                fade_duration: Some(0.5),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SpawnVolume {
    /// Points on the surface of a sphere around the origin.
    Shell { radius: f32 },
    /// Points anywhere inside an axis-aligned box.
    Cuboid { min: Vec3, max: Vec3 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub enabled: bool,
    pub spawn_interval: f32,
    /// Pause between the first planet showing up and the first asteroid.
    pub startup_delay: f32,
    /// How often the spawner re-checks for planets while waiting.
    pub retry_interval: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub asteroid_scale: f32,
    pub volume: SpawnVolume,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_interval: 2.0,
            startup_delay: 1.0,
            retry_interval: 0.5,
            min_speed: 3.0,
            max_speed: 8.0,
            asteroid_scale: 1.0,
            volume: SpawnVolume::Shell { radius: 100.0 },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub min_speed: f32,
    pub max_speed: f32,
    /// Final speed as a multiple of the launch speed.
    pub acceleration_scale: f32,
    pub acceleration_duration: f32,
    pub scale: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            min_speed: 10.0,
            max_speed: 20.0,
            acceleration_scale: 1.5,
            acceleration_duration: 5.0,
            scale: 0.2,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    pub interaction_distance: f32,
    pub fade_duration: f32,
    pub beacon_min_width: f32,
    pub beacon_max_width: f32,
    pub beacon_pulse_speed: f32,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            interaction_distance: 1000.0,
            fade_duration: 1.0,
            beacon_min_width: 10.0,
            beacon_max_width: 100.0,
            beacon_pulse_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub fixed_dt: f32,
    /// Upper bound on fixed steps run by one `advance` call.
    pub max_steps_per_frame: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 0.02,
            max_steps_per_frame: 8,
        }
    }
}

impl SimConfig {
    pub fn from_json(text: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        let system = &self.system;
        if system.orbit_count == 0 {
            return Err(SimError::invalid("system.orbit_count", "must be at least 1"));
        }
        non_negative("system.min_distance", system.min_distance)?;
        ordered("system.min_distance", system.min_distance, system.max_distance)?;
        ordered(
            "system.min_orbit_speed",
            system.min_orbit_speed,
            system.max_orbit_speed,
        )?;
        positive("system.sun_scale", system.sun_scale)?;
        positive("system.planet_min_scale", system.planet_min_scale)?;
        ordered(
            "system.planet_min_scale",
            system.planet_min_scale,
            system.planet_max_scale,
        )?;
        ordered(
            "system.min_self_rotation",
            system.min_self_rotation,
            system.max_self_rotation,
        )?;
        if system.moons_per_planet.start() > system.moons_per_planet.end() {
            return Err(SimError::invalid("system.moons_per_planet", "start exceeds end"));
        }
        positive("system.moon_min_scale", system.moon_min_scale)?;
        ordered(
            "system.moon_min_scale",
            system.moon_min_scale,
            system.moon_max_scale,
        )?;
        non_negative("system.moon_min_offset", system.moon_min_offset)?;
        ordered(
            "system.moon_min_offset",
            system.moon_min_offset,
            system.moon_max_offset,
        )?;

        let collision = &self.collision;
        positive("collision.cull_distance", collision.cull_distance)?;
        if let Some(template) = &collision.fragment_template {
            positive("collision.fragment_template.scale", template.scale)?;
            non_negative("collision.fragment_template.min_speed", template.min_speed)?;
            ordered(
                "collision.fragment_template.min_speed",
                template.min_speed,
                template.max_speed,
            )?;
            positive(
                "collision.fragment_template.min_lifetime",
                template.min_lifetime,
            )?;
            ordered(
                "collision.fragment_template.min_lifetime",
                template.min_lifetime,
                template.max_lifetime,
            )?;
        }
        for (field, profile) in [
            ("collision.planet.fade_duration", &collision.planet),
            ("collision.asteroid.fade_duration", &collision.asteroid),
            ("collision.projectile.fade_duration", &collision.projectile),
        ] {
            if let Some(fade) = profile.fade_duration {
                non_negative(field, fade)?;
            }
        }

        let spawner = &self.spawner;
        positive("spawner.spawn_interval", spawner.spawn_interval)?;
        non_negative("spawner.startup_delay", spawner.startup_delay)?;
        positive("spawner.retry_interval", spawner.retry_interval)?;
        non_negative("spawner.min_speed", spawner.min_speed)?;
        ordered("spawner.min_speed", spawner.min_speed, spawner.max_speed)?;
        positive("spawner.asteroid_scale", spawner.asteroid_scale)?;
        let reach = match spawner.volume {
            SpawnVolume::Shell { radius } => {
                positive("spawner.volume.radius", radius)?;
                radius
            }
            SpawnVolume::Cuboid { min, max } => {
                if !(min.is_finite() && max.is_finite() && (max - min).is_finite()) {
                    return Err(SimError::invalid(
                        "spawner.volume",
                        "cuboid bounds and extent must be finite",
                    ));
                }
                if min.cmpgt(max).any() {
                    return Err(SimError::invalid(
                        "spawner.volume",
                        "cuboid min must not exceed max on any axis",
                    ));
                }
                min.abs().max(max.abs()).length()
            }
        };
        if reach >= collision.cull_distance {
            return Err(SimError::invalid(
                "collision.cull_distance",
                format!("must exceed the spawn volume reach of {reach}"),
            ));
        }

        let projectile = &self.projectile;
        non_negative("projectile.min_speed", projectile.min_speed)?;
        ordered("projectile.min_speed", projectile.min_speed, projectile.max_speed)?;
        positive("projectile.acceleration_scale", projectile.acceleration_scale)?;
        non_negative(
            "projectile.acceleration_duration",
            projectile.acceleration_duration,
        )?;
        positive("projectile.scale", projectile.scale)?;

        let terraform = &self.terraform;
        non_negative("terraform.interaction_distance", terraform.interaction_distance)?;
        non_negative("terraform.fade_duration", terraform.fade_duration)?;
        ordered(
            "terraform.beacon_min_width",
            terraform.beacon_min_width,
            terraform.beacon_max_width,
        )?;

        positive("clock.fixed_dt", self.clock.fixed_dt)?;
        if self.clock.max_steps_per_frame == 0 {
            return Err(SimError::invalid(
                "clock.max_steps_per_frame",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!("must be zero or more, got {value}"),
        ))
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> SimResult<()> {
    if !(min.is_finite() && max.is_finite() && (max - min).is_finite()) {
        return Err(SimError::invalid(
            field,
            format!("range {min}..{max} is not finite"),
        ));
    }
    if min <= max {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!("range is empty: min {min} > max {max}"),
        ))
    }
}
