use serde::{Deserialize, Serialize};

/// A revocable countdown advanced by the simulation tick.
///
/// Elapsed time is kept in `f64` so that summing many `f32` steps does not
/// drift across a boundary: twenty steps of 0.25 s finish a 5 s countdown on
/// the twentieth step, never the nineteenth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    duration: f64,
    elapsed: f64,
    cancelled: bool,
}

impl Countdown {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: f64::from(duration.max(0.0)),
            elapsed: 0.0,
            cancelled: false,
        }
    }

    /// Advances by `dt` and reports whether the countdown has run out.
    /// A cancelled countdown never finishes.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.cancelled {
            return false;
        }
        self.elapsed += f64::from(dt);
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        !self.cancelled && self.elapsed >= self.duration
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Fraction of the duration that has passed, clamped to `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn restart(&mut self, duration: f32) {
        *self = Self::new(duration);
    }
}
