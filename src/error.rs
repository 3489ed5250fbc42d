use thiserror::Error;

use crate::minefield::protocol::MessageParseError;

/// Errors that stop a reconstruction for the turn being processed.
#[derive(Error, Debug)]
pub enum StarfoldError {
    #[error("unsupported map shape {0}: only spherical (wraparound) maps are handled")]
    UnsupportedMapShape(i32),

    #[error("snapshot field missing or malformed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error(transparent)]
    MessageParse(#[from] MessageParseError),

    #[error("planet {0} not found in turn snapshot")]
    UnknownPlanet(u32),

    #[error("unknown auto-tax policy '{0}' (expected Growth, Growth+, Flat 70 or Flat 40)")]
    UnknownPolicy(String),

    #[error("no turn snapshots found in {0}")]
    NoTurns(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StarfoldError>;
