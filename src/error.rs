// src/error.rs

use crate::types::LaneId;
use thiserror::Error;

/// A lane's sample could not be obtained this cycle. Transient: the control
/// loop substitutes the last-known count and keeps going.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("no sample available for lane {0}")]
    Unavailable(LaneId),
}

/// The actuation channel failed. Transient during operation (a stale command
/// is corrected next cycle); opening the channel is fatal at startup.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("command transmission failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal startup-only configuration problems. The controller refuses to start
/// on any of these.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("no lanes configured")]
    NoLanes,
    #[error("duplicate lane id {0}")]
    DuplicateLane(LaneId),
    #[error("primary lane {0} is not among the configured lanes")]
    PrimaryNotConfigured(LaneId),
}
