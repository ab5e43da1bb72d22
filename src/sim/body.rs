use crate::sim::terraform::ColorFade;
use crate::sim::timer::Countdown;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Placeholder carried by bodies that have not been registered yet.
    pub const UNASSIGNED: BodyId = BodyId(u32::MAX);
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Sun,
    Planet,
    Moon,
    Asteroid,
    Fragment,
    Projectile,
}

impl BodyKind {
    pub fn label(self) -> &'static str {
        match self {
            BodyKind::Sun => "Sun",
            BodyKind::Planet => "Planet",
            BodyKind::Moon => "Moon",
            BodyKind::Asteroid => "Asteroid",
            BodyKind::Fragment => "Fragment",
            BodyKind::Projectile => "Projectile",
        }
    }

    /// Bodies that move under their own velocity rather than on an orbit.
    pub fn is_free(self) -> bool {
        matches!(
            self,
            BodyKind::Asteroid | BodyKind::Fragment | BodyKind::Projectile
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Lifecycle {
    Active,
    /// Hidden and fading out; destroyed when the fade runs out.
    Fragmenting { fade: Countdown },
    Destroyed,
}

impl Lifecycle {
    pub fn label(&self) -> &'static str {
        match self {
            Lifecycle::Active => "Active",
            Lifecycle::Fragmenting { .. } => "Fragmenting",
            Lifecycle::Destroyed => "Destroyed",
        }
    }
}

/// Circular orbit in the horizontal plane around another body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub parent: BodyId,
    pub radius: f32,
    /// Degrees per second about the vertical axis.
    pub angular_speed: f32,
    /// Starting angle in degrees.
    pub phase: f32,
}

impl Orbit {
    /// Offset from the parent after `elapsed` seconds of steady motion.
    pub fn offset_at(&self, elapsed: f32) -> Vec3 {
        orbit_offset(self.radius, self.phase + self.angular_speed * elapsed)
    }
}

/// `(sin a * r, 0, cos a * r)` for an angle in degrees.
pub fn orbit_offset(radius: f32, angle_degrees: f32) -> Vec3 {
    let angle = angle_degrees.to_radians();
    Vec3::new(angle.sin() * radius, 0.0, angle.cos() * radius)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const SUN: Color = Color::rgb(1.0, 0.85, 0.3);
    pub const ASTEROID: Color = Color::rgb(0.55, 0.5, 0.45);
    pub const EMBER: Color = Color::rgb(1.0, 0.6, 0.1);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// Flavour text handed out to planets at generation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetProfile {
    pub resource: String,
    pub history: String,
}

/// Linear speed-up applied to projectiles after launch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedRamp {
    pub initial: f32,
    pub target: f32,
    pub timer: Countdown,
}

impl SpeedRamp {
    pub fn current(&self) -> f32 {
        self.initial + (self.target - self.initial) * self.timer.progress()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub name: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub mass: f32,
    pub orbit: Option<Orbit>,
    /// Degrees per second about the vertical axis.
    pub self_rotation: Option<f32>,
    pub lifecycle: Lifecycle,
    pub has_collided: bool,
    pub lifetime: Option<Countdown>,
    pub ramp: Option<SpeedRamp>,
    pub visible: bool,
    pub opacity: f32,
    pub color: Color,
    pub color_fade: Option<ColorFade>,
    pub profile: Option<PlanetProfile>,
}

impl Body {
    pub fn new(kind: BodyKind, name: impl Into<String>, position: Vec3, scale: f32) -> Self {
        Self {
            id: BodyId::UNASSIGNED,
            kind,
            name: name.into(),
            position,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale,
            mass: scale,
            orbit: None,
            self_rotation: None,
            lifecycle: Lifecycle::Active,
            has_collided: false,
            lifetime: None,
            ramp: None,
            visible: true,
            opacity: 1.0,
            color: Color::WHITE,
            color_fade: None,
            profile: None,
        }
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_self_rotation(mut self, degrees_per_second: f32) -> Self {
        self.self_rotation = Some(degrees_per_second);
        self
    }

    pub fn with_lifetime(mut self, seconds: f32) -> Self {
        self.lifetime = Some(Countdown::new(seconds));
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Collider radius of a unit sphere scaled by `scale`.
    pub fn radius(&self) -> f32 {
        self.scale * 0.5
    }

    pub fn is_active(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Active)
    }

    pub fn is_alive(&self) -> bool {
        !matches!(self.lifecycle, Lifecycle::Destroyed)
    }

    /// Revokes every pending timer owned by this body.
    pub fn cancel_timers(&mut self) {
        if let Lifecycle::Fragmenting { fade } = &mut self.lifecycle {
            fade.cancel();
        }
        if let Some(lifetime) = self.lifetime.as_mut() {
            lifetime.cancel();
        }
        if let Some(ramp) = self.ramp.as_mut() {
            ramp.timer.cancel();
        }
        if let Some(fade) = self.color_fade.as_mut() {
            fade.timer.cancel();
        }
    }
}
