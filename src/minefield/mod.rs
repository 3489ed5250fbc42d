//! Minefield reconstruction from host narration messages.

pub mod engine;
pub mod field;
pub mod protocol;
pub mod resume;
pub mod statistics;

pub use engine::{
    handle_countermining, reconstruct, MinefieldSet, MinefieldSettings, MinefieldTimeline,
    MinefieldTracker, TurnState,
};
pub use field::Minefield;
pub use protocol::{decode, MessageParseError, MineEvent};
pub use resume::{Divergence, HistoryFingerprint, Resume, SavedTimeline};
pub use statistics::TurnStatistics;
