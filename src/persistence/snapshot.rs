//! On-disk store of reconstructed minefield timelines.
//!
//! Each file holds a [`SavedTimeline`]: the timeline plus the fingerprint of
//! the turn files it was built from, so a later run can tell whether the
//! saved turns still hold before extending them.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::minefield::SavedTimeline;

/// Bumped whenever the encoded layout of [`SavedTimeline`] changes.
const FORMAT_VERSION: u32 = 1;

const PREFIX: &str = "minefields-t";
const SUFFIX: &str = ".bin";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Encoding error: {0}")]
    Codec(#[from] bincode::Error),
    #[error(
        "{}: written by format version {}, expected {}",
        .path.display(),
        .found,
        FORMAT_VERSION
    )]
    Version { path: PathBuf, found: u32 },
    #[error("Corrupt snapshot {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: &'static str },
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile<T> {
    version: u32,
    saved: T,
}

/// A snapshot file found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub last_turn: u32,
    /// Milliseconds since the epoch at save time.
    pub saved_at: u64,
    pub file_size: u64,
}

fn file_name(last_turn: u32, saved_at: u64) -> String {
    format!("{}{}-{}{}", PREFIX, last_turn, saved_at, SUFFIX)
}

/// `minefields-t{turn}-{millis}.bin`
fn parse_file_name(name: &str) -> Option<(u32, u64)> {
    let rest = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let (turn, saved_at) = rest.split_once('-')?;
    Some((turn.parse().ok()?, saved_at.parse().ok()?))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Checks that hold for any timeline the tracker produced.
fn validate(saved: &SavedTimeline, path: &Path) -> Result<(), SnapshotError> {
    let corrupt = |reason| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    let timeline = &saved.timeline;
    if !timeline
        .turns
        .iter()
        .all(|(turn, state)| state.statistics.turn == *turn)
    {
        return Err(corrupt("statistics filed under the wrong turn"));
    }
    let observed_last = saved.fingerprint.turns.keys().next_back().copied();
    if observed_last != timeline.last_turn() {
        return Err(corrupt("fingerprint does not cover the stored turns"));
    }
    Ok(())
}

/// Directory of saved timelines, pruned to the newest `keep` on every save.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    keep: usize,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        SnapshotStore {
            dir: dir.into(),
            keep: keep.max(1),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(&config.snapshot_directory, config.max_snapshots as usize)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `saved` next to a hidden temporary name, sync it, and rename it
    /// into place, then prune old files.
    pub fn save(&self, saved: &SavedTimeline) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.dir)?;

        let last_turn = saved.timeline.last_turn().unwrap_or(0);
        let name = file_name(last_turn, now_millis());
        let target = self.dir.join(&name);
        let tmp = self.dir.join(format!(".{}.tmp", name));

        let written = write_file(&tmp, saved).and_then(|bytes| {
            fs::rename(&tmp, &target)?;
            Ok(bytes)
        });
        let bytes = match written {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
        };
        debug!(path = %target.display(), last_turn, bytes, "Saved minefield snapshot");

        for removed in self.prune()? {
            debug!(path = %removed.display(), "Pruned minefield snapshot");
        }
        Ok(target)
    }

    /// Snapshot files in the store, newest first.
    pub fn entries(&self) -> Result<Vec<SnapshotEntry>, SnapshotError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Some((last_turn, saved_at)) = entry.file_name().to_str().and_then(parse_file_name)
            else {
                continue;
            };
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(SnapshotEntry {
                path: entry.path(),
                last_turn,
                saved_at,
                file_size: metadata.len(),
            });
        }
        entries.sort_by(|a, b| {
            b.saved_at
                .cmp(&a.saved_at)
                .then(b.last_turn.cmp(&a.last_turn))
        });
        Ok(entries)
    }

    /// Decode and validate one snapshot file.
    pub fn load(&self, path: &Path) -> Result<SavedTimeline, SnapshotError> {
        let reader = BufReader::new(File::open(path)?);
        let file: SnapshotFile<SavedTimeline> = bincode::deserialize_from(reader)?;
        if file.version != FORMAT_VERSION {
            return Err(SnapshotError::Version {
                path: path.to_path_buf(),
                found: file.version,
            });
        }
        validate(&file.saved, path)?;
        Ok(file.saved)
    }

    /// The newest snapshot that loads, skipping unreadable ones.
    pub fn latest(&self) -> Result<Option<SavedTimeline>, SnapshotError> {
        for entry in self.entries()? {
            match self.load(&entry.path) {
                Ok(saved) => return Ok(Some(saved)),
                Err(e) => {
                    warn!(
                        path = %entry.path.display(),
                        error = %e,
                        "Unusable minefield snapshot, trying older"
                    );
                }
            }
        }
        Ok(None)
    }

    /// Remove all but the newest `keep` snapshots. Returns removed paths.
    pub fn prune(&self) -> Result<Vec<PathBuf>, SnapshotError> {
        let entries = self.entries()?;
        let mut removed = Vec::new();
        for entry in entries.iter().skip(self.keep) {
            fs::remove_file(&entry.path)?;
            removed.push(entry.path.clone());
        }
        Ok(removed)
    }
}

fn write_file(path: &Path, saved: &SavedTimeline) -> Result<u64, SnapshotError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let envelope = SnapshotFile {
        version: FORMAT_VERSION,
        saved,
    };
    bincode::serialize_into(&mut writer, &envelope)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}
