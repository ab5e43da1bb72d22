use crate::sim::body::{BodyId, BodyKind};
use glam::Vec3;
use serde::Serialize;

/// Something the render layer may want to react to, recorded per tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Spawned { id: BodyId, kind: BodyKind },
    Destroyed { id: BodyId, kind: BodyKind },
    Collided { a: BodyId, b: BodyId, point: Vec3 },
    Fragmented { id: BodyId, fragments: usize },
    /// An orbiter's parent is gone; it now flies freely.
    Orphaned { id: BodyId },
    Terraformed { id: BodyId },
    /// Every live planet has been terraformed.
    Aligned,
}
