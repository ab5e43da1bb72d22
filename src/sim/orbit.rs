use crate::sim::error::{SimError, SimResult};
use serde::Serialize;

/// One of the discrete radii planets may be placed on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OrbitBand {
    pub index: usize,
    pub radius: f32,
}

/// Evenly spaced bands from `min_distance` (inclusive) towards
/// `max_distance` (exclusive): `min + i * (max - min) / count`.
pub fn orbit_bands(count: usize, min_distance: f32, max_distance: f32) -> SimResult<Vec<OrbitBand>> {
    if count == 0 {
        return Err(SimError::invalid("system.orbit_count", "must be at least 1"));
    }
    if !(min_distance.is_finite() && max_distance.is_finite()) || min_distance > max_distance {
        return Err(SimError::invalid(
            "system.min_distance",
            format!("range is empty: min {min_distance} > max {max_distance}"),
        ));
    }

    let step = (max_distance - min_distance) / count as f32;
    Ok((0..count)
        .map(|index| OrbitBand {
            index,
            radius: min_distance + index as f32 * step,
        })
        .collect())
}

/// Orbital speed grows linearly from the inner band to the outer edge.
pub fn orbit_speed_for_radius(
    radius: f32,
    min_distance: f32,
    max_distance: f32,
    min_speed: f32,
    max_speed: f32,
) -> f32 {
    let span = max_distance - min_distance;
    let t = if span > 0.0 {
        ((radius - min_distance) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    min_speed + (max_speed - min_speed) * t
}
