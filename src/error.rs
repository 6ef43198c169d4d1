use crate::config::ConfigError;
use crate::mapping::GeomId;
use crate::observability::logging::LoggingError;
use crate::tracker::memory::MemoryError;
use thiserror::Error;

/// Errors surfaced by the trigger emulation stages.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// A mutator was called on a locked record, or a lock transition was invalid.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A record failed validation when it was locked.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// Two primitives share the same channel at the same clocktick.
    #[error("duplicate channel {geom_id} at clocktick {clocktick}")]
    DuplicateChannel { geom_id: GeomId, clocktick: u32 },
    /// A value does not fit its fixed-width encoding.
    #[error("value {value} overflows the {width}-bit {field} encoding")]
    InvalidMultiplicity {
        field: &'static str,
        value: u32,
        width: u32,
    },
    /// Clockticks went backwards in an ordered stream.
    #[error("{stream} clocktick {current} arrived after {previous}")]
    OrderingViolation {
        stream: &'static str,
        previous: u32,
        current: u32,
    },
    /// No electronic id exists for the geometry id. The pipeline drops such
    /// channels and logs this message instead of failing the replay.
    #[error("geometry id {0} has no electronic mapping")]
    UnmappedChannel(GeomId),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

impl TriggerError {
    pub(crate) fn locked(what: &str) -> Self {
        TriggerError::InvalidState(format!("{what} is locked"))
    }
}
