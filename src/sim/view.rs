use crate::sim::body::{Body, BodyId, Color};
use crate::sim::event::SimEvent;
use crate::sim::orbit::OrbitBand;
use crate::sim::spawner::SpawnerState;
use crate::sim::Simulation;
use serde::Serialize;

#[derive(Serialize)]
pub struct BodyView {
    id: BodyId,
    name: String,
    kind: &'static str,
    state: &'static str,
    position: [f32; 3],
    rotation: [f32; 4],
    scale: f32,
    color: Color,
    opacity: f32,
    visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<BodyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<String>,
}

#[derive(Serialize)]
pub struct BeaconView {
    color: Color,
    width: f32,
    alpha: f32,
}

#[derive(Serialize)]
pub struct SimulationView<'a> {
    seed: u64,
    tick: u64,
    elapsed: f64,
    spawner: &'static str,
    total_planets: usize,
    changed_planets: usize,
    beacon: Option<BeaconView>,
    bands: &'a [OrbitBand],
    bodies: Vec<BodyView>,
    events: &'a [SimEvent],
}

impl From<&Body> for BodyView {
    fn from(body: &Body) -> Self {
        let profile = body.profile.as_ref();
        Self {
            id: body.id,
            name: body.name.clone(),
            kind: body.kind.label(),
            state: body.lifecycle.label(),
            position: body.position.to_array(),
            rotation: body.rotation.to_array(),
            scale: body.scale,
            color: body.color,
            opacity: body.opacity,
            visible: body.visible,
            parent: body.orbit.map(|o| o.parent),
            resource: profile.map(|p| p.resource.clone()),
            history: profile.map(|p| p.history.clone()),
        }
    }
}

impl<'a> From<&'a Simulation> for SimulationView<'a> {
    fn from(sim: &'a Simulation) -> Self {
        let terraform = &sim.config().terraform;
        let now = sim.elapsed();
        let beacon = sim.context().beacon().map(|b| {
            let alpha = b.pulse(now, terraform.beacon_pulse_speed);
            BeaconView {
                color: Color { a: alpha, ..b.color },
                width: b.width(now, terraform),
                alpha,
            }
        });
        let spawner = match sim.spawner().state() {
            SpawnerState::WaitingForPlanets { .. } => "waiting_for_planets",
            SpawnerState::Spawning { .. } => "spawning",
        };

        Self {
            seed: sim.seed(),
            tick: sim.tick_count(),
            elapsed: now,
            spawner,
            total_planets: sim.context().total_planets(),
            changed_planets: sim.context().changed_planets(),
            beacon,
            bands: &sim.system().bands,
            bodies: sim.registry().iter().map(BodyView::from).collect(),
            events: sim.events(),
        }
    }
}
