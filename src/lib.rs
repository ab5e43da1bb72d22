use glam::Vec3;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

mod logger;
pub mod sim;

pub use sim::body::{Body, BodyId, BodyKind};
pub use sim::config::SimConfig;
pub use sim::error::{SimError, SimResult};
pub use sim::event::SimEvent;
pub use sim::Simulation;

thread_local! {
    static SIM: RefCell<Option<Simulation>> = RefCell::new(None);
}

fn with_sim_mut<R>(f: impl FnOnce(&mut Simulation) -> R) -> Result<R, &'static str> {
    SIM.with(|cell| {
        let mut opt = cell.borrow_mut();
        match opt.as_mut() {
            Some(sim) => Ok(f(sim)),
            None => Err("simulation not initialized"),
        }
    })
}

fn error_json(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

fn setup() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::Logger::init(log::LevelFilter::Info);
}

fn install(sim: SimResult<Simulation>) -> String {
    match sim {
        Ok(sim) => {
            let snapshot = sim.snapshot_json();
            SIM.with(|s| *s.borrow_mut() = Some(sim));
            snapshot
        }
        Err(e) => {
            log::error!("simulation init failed: {e}");
            error_json(e)
        }
    }
}

/// Builds a system with the default configuration and returns its first
/// snapshot.
#[wasm_bindgen]
pub fn init_simulation(seed: u64) -> String {
    setup();
    install(Simulation::with_seed(seed))
}

#[wasm_bindgen]
pub fn init_simulation_with_config(seed: u64, config_json: &str) -> String {
    setup();
    install(SimConfig::from_json(config_json).and_then(|config| Simulation::new(seed, config)))
}

#[wasm_bindgen]
pub fn step(dt: f32) -> String {
    match with_sim_mut(|sim| {
        sim.step(dt);
        sim.snapshot_json()
    }) {
        Ok(v) => v,
        Err(e) => error_json(e),
    }
}

/// Runs as many fixed steps as `frame_dt` covers. Returns the step count,
/// or -1 before initialization.
#[wasm_bindgen]
pub fn advance(frame_dt: f32) -> i32 {
    with_sim_mut(|sim| sim.advance(frame_dt) as i32).unwrap_or(-1)
}

#[wasm_bindgen]
pub fn snapshot() -> String {
    match with_sim_mut(|sim| sim.snapshot_json()) {
        Ok(v) => v,
        Err(e) => error_json(e),
    }
}

/// Drains the event log as a JSON array.
#[wasm_bindgen]
pub fn take_events() -> String {
    match with_sim_mut(|sim| serde_json::to_string(&sim.take_events())) {
        Ok(Ok(v)) => v,
        Ok(Err(e)) => error_json(e),
        Err(e) => error_json(e),
    }
}

#[wasm_bindgen]
pub fn report_contact(a: u32, b: u32, x: f32, y: f32, z: f32) -> bool {
    with_sim_mut(|sim| sim.report_contact(BodyId(a), BodyId(b), Vec3::new(x, y, z))).is_ok()
}

#[wasm_bindgen]
pub fn fire_projectile(ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) -> bool {
    with_sim_mut(|sim| sim.fire_projectile(Vec3::new(ox, oy, oz), Vec3::new(dx, dy, dz)))
        .unwrap_or(false)
}

/// Returns the id of the terraformed planet, or -1 when nothing was in reach.
#[wasm_bindgen]
pub fn interact(x: f32, y: f32, z: f32) -> i64 {
    match with_sim_mut(|sim| sim.interact(Vec3::new(x, y, z))) {
        Ok(Some(id)) => i64::from(id.0),
        _ => -1,
    }
}

#[wasm_bindgen]
pub fn despawn(id: u32) -> String {
    match with_sim_mut(|sim| sim.despawn(BodyId(id))) {
        Ok(Ok(body)) => serde_json::to_string(&sim::view::BodyView::from(&body))
            .unwrap_or_else(error_json),
        Ok(Err(e)) => error_json(e),
        Err(e) => error_json(e),
    }
}

#[wasm_bindgen]
pub fn reset(seed: u64) -> String {
    match with_sim_mut(|sim| sim.reset(seed).map(|()| sim.snapshot_json())) {
        Ok(Ok(v)) => v,
        Ok(Err(e)) => error_json(e),
        Err(e) => error_json(e),
    }
}

/// Orbit radii for a standalone preview, without building a simulation.
#[wasm_bindgen]
pub fn orbit_bands(count: usize, min_distance: f32, max_distance: f32) -> String {
    match sim::orbit::orbit_bands(count, min_distance, max_distance) {
        Ok(bands) => serde_json::to_string(&bands).unwrap_or_else(error_json),
        Err(e) => error_json(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_before_init_report_an_error() {
        SIM.with(|s| *s.borrow_mut() = None);
        assert!(snapshot().contains("not initialized"));
        assert_eq!(advance(0.1), -1);
        assert!(!report_contact(0, 1, 0.0, 0.0, 0.0));
    }

    #[test]
    fn init_and_step_return_snapshots() {
        let first = init_simulation(42);
        assert!(first.contains("\"bodies\""));
        let next = step(0.02);
        assert!(next.contains("\"tick\":1"));
        assert!(advance(0.04) >= 1);
    }

    #[test]
    fn bad_config_is_reported_as_json() {
        let out = init_simulation_with_config(1, r#"{"system": {"orbit_count": 0}}"#);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value["error"].as_str().unwrap().contains("orbit_count"));
    }

    #[test]
    fn orbit_bands_preview() {
        let out = orbit_bands(5, 5.0, 20.0);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 5);
        assert!(orbit_bands(0, 5.0, 20.0).contains("error"));
    }
}
