pub mod body;
pub mod collision;
pub mod config;
pub mod error;
pub mod event;
pub mod kinematics;
pub mod naming;
pub mod orbit;
pub mod registry;
pub mod sampling;
pub mod spawner;
pub mod system;
pub mod terraform;
pub mod timer;
pub mod view;

use body::{Body, BodyId, BodyKind, SpeedRamp};
use collision::{CollisionEngine, Contact};
use config::SimConfig;
use error::{SimError, SimResult};
use event::SimEvent;
use glam::{Quat, Vec3};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use registry::{Commands, Registry};
use sampling::sample;
use spawner::AsteroidSpawner;
use std::collections::VecDeque;
use system::{SolarSystem, SystemGenerator};
use terraform::SystemContext;
use timer::Countdown;
use view::SimulationView;

/// Older undrained events are dropped past this many.
pub const EVENT_BACKLOG: usize = 1024;

/// The simulation root: owns the registry and drives every system once per
/// tick in a fixed order.
pub struct Simulation {
    seed: u64,
    config: SimConfig,
    rng: ChaCha8Rng,
    registry: Registry,
    context: SystemContext,
    spawner: AsteroidSpawner,
    system: SolarSystem,
    /// Intents from outside the tick, applied at the next boundary.
    commands: Commands,
    pending_contacts: Vec<Contact>,
    /// Events of the current tick.
    events: Vec<SimEvent>,
    /// Events of earlier ticks not yet handed out by `take_events`.
    backlog: VecDeque<SimEvent>,
    tick: u64,
    elapsed: f64,
    accumulator: f32,
    projectiles_fired: u32,
}

impl Simulation {
    pub fn new(seed: u64, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let mut sim = Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            registry: Registry::new(),
            context: SystemContext::new(),
            spawner: AsteroidSpawner::new(),
            system: SolarSystem::default(),
            commands: Commands::default(),
            pending_contacts: Vec::new(),
            events: Vec::new(),
            backlog: VecDeque::new(),
            tick: 0,
            elapsed: 0.0,
            accumulator: 0.0,
            projectiles_fired: 0,
        };
        sim.populate()?;
        Ok(sim)
    }

    pub fn with_seed(seed: u64) -> SimResult<Self> {
        Self::new(seed, SimConfig::default())
    }

    fn populate(&mut self) -> SimResult<()> {
        self.system = {
            let mut generator = SystemGenerator::new(&self.config.system, &mut self.rng)?;
            generator.generate(&mut self.registry)
        };
        self.context
            .refresh(&self.registry, &mut self.rng, self.elapsed, &mut self.events);
        Ok(())
    }

    /// Runs one tick of `dt` seconds.
    ///
    /// Order within a tick: motion, contacts, collision response, timers,
    /// spawning, then registry changes. Nothing joins or leaves the registry
    /// before the last stage.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            warn!("ignoring step with dt = {dt}");
            return;
        }
        self.archive_events();
        let mut commands = std::mem::take(&mut self.commands);

        let motion = kinematics::advance(&mut self.registry, dt);
        for id in motion.faulted {
            commands.despawn(id);
        }
        self.events
            .extend(motion.orphaned.into_iter().map(|id| SimEvent::Orphaned { id }));

        let mut contacts = std::mem::take(&mut self.pending_contacts);
        if self.config.collision.broad_phase {
            contacts.extend(collision::sphere_overlaps(&self.registry));
        }
        let engine = CollisionEngine::new(&self.config.collision);
        engine.resolve(
            &contacts,
            &mut self.registry,
            &mut self.rng,
            &mut commands,
            &mut self.events,
        );

        collision::advance_timers(
            &mut self.registry,
            dt,
            self.config.collision.cull_distance,
            &mut commands,
        );
        terraform::advance_color_fades(&mut self.registry, dt);
        self.spawner.update(
            dt,
            &self.config.spawner,
            &self.registry,
            &mut self.rng,
            &mut commands,
        );

        let applied = self.registry.apply(commands);
        for (id, kind) in applied.removed {
            self.events.push(SimEvent::Destroyed { id, kind });
        }
        for (id, kind) in applied.spawned {
            self.events.push(SimEvent::Spawned { id, kind });
        }

        self.tick += 1;
        self.elapsed += f64::from(dt);
        self.context
            .refresh(&self.registry, &mut self.rng, self.elapsed, &mut self.events);
    }

    /// Feeds a variable frame time into the fixed-step clock and returns the
    /// number of steps run.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !(frame_dt.is_finite() && frame_dt > 0.0) {
            return 0;
        }
        let fixed = self.config.clock.fixed_dt;
        let max_steps = self.config.clock.max_steps_per_frame;
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= fixed && steps < max_steps {
            self.step(fixed);
            self.accumulator -= fixed;
            steps += 1;
        }
        if self.accumulator >= fixed {
            debug!("dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator = 0.0;
        }
        steps
    }

    /// Queues a contact from an external collision detector.
    pub fn report_contact(&mut self, a: BodyId, b: BodyId, point: Vec3) {
        self.pending_contacts.push(Contact { a, b, point });
    }

    /// Queues a body to join the registry at the next tick boundary.
    pub fn spawn(&mut self, body: Body) {
        self.commands.spawn(body);
    }

    /// Queues a projectile. Returns `false` for a zero direction.
    pub fn fire_projectile(&mut self, origin: Vec3, direction: Vec3) -> bool {
        let Some(heading) = direction.try_normalize() else {
            warn!("cannot fire a projectile without a direction");
            return false;
        };
        let config = &self.config.projectile;
        let speed = sample(&mut self.rng, config.min_speed, config.max_speed);
        self.projectiles_fired += 1;

        let mut projectile = Body::new(
            BodyKind::Projectile,
            format!("Projectile {}", self.projectiles_fired),
            origin,
            config.scale,
        )
        .with_velocity(heading * speed)
        .with_rotation(Quat::from_rotation_arc(Vec3::Z, heading));
        projectile.ramp = Some(SpeedRamp {
            initial: speed,
            target: speed * config.acceleration_scale,
            timer: Countdown::new(config.acceleration_duration),
        });
        self.commands.spawn(projectile);
        true
    }

    /// Terraforms the nearest planet within reach of `point`.
    pub fn interact(&mut self, point: Vec3) -> Option<BodyId> {
        terraform::interact(
            &mut self.registry,
            point,
            &self.config.terraform,
            &mut self.context,
            &mut self.rng,
            &mut self.events,
        )
    }

    /// Removes a body right away, revoking its pending timers.
    pub fn despawn(&mut self, id: BodyId) -> SimResult<Body> {
        let mut body = self.registry.unregister(id).ok_or(SimError::UnknownBody(id))?;
        body.cancel_timers();
        self.events.push(SimEvent::Destroyed {
            id,
            kind: body.kind,
        });
        Ok(body)
    }

    /// Clears every body and timer and generates a fresh system.
    pub fn reset(&mut self, seed: u64) -> SimResult<()> {
        info!("resetting simulation with seed {seed}");
        self.registry.clear();
        self.context.clear();
        self.spawner = AsteroidSpawner::new();
        self.commands = Commands::default();
        self.pending_contacts.clear();
        self.events.clear();
        self.backlog.clear();
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.tick = 0;
        self.elapsed = 0.0;
        self.accumulator = 0.0;
        self.projectiles_fired = 0;
        self.populate()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &SystemContext {
        &self.context
    }

    pub fn spawner(&self) -> &AsteroidSpawner {
        &self.spawner
    }

    pub fn system(&self) -> &SolarSystem {
        &self.system
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Events of the last tick, plus any raised by intents since then.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Drains every event recorded since the last call, oldest first, up to
    /// [`EVENT_BACKLOG`] of them.
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        self.archive_events();
        self.backlog.drain(..).collect()
    }

    fn archive_events(&mut self) {
        self.backlog.extend(self.events.drain(..));
        let overflow = self.backlog.len().saturating_sub(EVENT_BACKLOG);
        if overflow > 0 {
            debug!("dropping {overflow} undrained events");
            self.backlog.drain(..overflow);
        }
    }

    pub fn snapshot_json(&self) -> String {
        let view = SimulationView::from(self);
        serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string())
    }
}
