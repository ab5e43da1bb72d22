//! Error types for the simulation.
//!
//! Only setup can fail: bad configuration is rejected before any body
//! exists. Everything that goes wrong during a tick is logged and degraded
//! instead of returned.

use crate::sim::body::BodyId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value is outside the range the generator can use.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// An operation referenced a body that is not registered.
    #[error("no live body with id {0}")]
    UnknownBody(BodyId),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
