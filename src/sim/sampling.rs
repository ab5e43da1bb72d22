use glam::{Quat, Vec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

/// Uniformly distributed direction on the unit sphere.
pub fn random_unit_vector(rng: &mut ChaCha8Rng) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let theta: f32 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

pub fn random_rotation(rng: &mut ChaCha8Rng) -> Quat {
    let axis = random_unit_vector(rng);
    Quat::from_axis_angle(axis, rng.gen_range(0.0..TAU))
}

pub fn point_in_cuboid(rng: &mut ChaCha8Rng, min: Vec3, max: Vec3) -> Vec3 {
    Vec3::new(
        sample(rng, min.x, max.x),
        sample(rng, min.y, max.y),
        sample(rng, min.z, max.z),
    )
}

/// Uniform in `[min, max]`; a collapsed range yields `min`.
pub fn sample(rng: &mut ChaCha8Rng, min: f32, max: f32) -> f32 {
    if min < max {
        rng.gen_range(min..=max)
    } else {
        min
    }
}
