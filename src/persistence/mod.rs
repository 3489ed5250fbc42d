pub mod snapshot;
pub mod turns;

pub use snapshot::{SnapshotEntry, SnapshotError, SnapshotStore};
pub use turns::{load_turn_directory, load_turn_file, turn_filename};
