//! Incremental reconstruction on top of a saved timeline.
//!
//! A saved timeline may only be extended when the inputs it was built from
//! are unchanged: a turn file that arrives late (another player's view of an
//! old turn) or different settings would have produced different fields, so
//! the timeline is rebuilt from scratch instead.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::galaxy::GameHistory;
use crate::minefield::engine::{reconstruct, MinefieldSettings, MinefieldTimeline};
use crate::Result;

/// What the reconstruction saw of one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnObservations {
    /// Players with a turn file for this turn.
    pub players: Vec<u32>,
    /// Deduplicated ids of messages reporting on this turn.
    pub message_ids: Vec<u32>,
    /// Ids of every ship seen on this turn.
    pub ship_ids: Vec<u32>,
}

/// The inputs a timeline was reconstructed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryFingerprint {
    pub settings: MinefieldSettings,
    pub robot_owners: BTreeSet<u32>,
    pub turns: BTreeMap<u32, TurnObservations>,
}

/// First reason a saved timeline no longer matches the turn files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    Settings,
    RobotOwners,
    Turn(u32),
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Settings => f.write_str("reconstruction settings changed"),
            Divergence::RobotOwners => f.write_str("robot owners changed"),
            Divergence::Turn(turn) => write!(f, "observations of turn {} changed", turn),
        }
    }
}

impl HistoryFingerprint {
    pub fn of(history: &GameHistory, settings: MinefieldSettings) -> Self {
        let mut turns: BTreeMap<u32, TurnObservations> = BTreeMap::new();
        for (player, turn) in history.files() {
            turns.entry(turn).or_default().players.push(player);
        }
        for (turn, messages) in history.messages_by_turn() {
            turns.entry(turn).or_default().message_ids = messages.iter().map(|m| m.id).collect();
        }
        for (turn, observations) in turns.iter_mut() {
            observations.players.sort_unstable();
            observations.ship_ids = history.ships_seen_on(*turn).iter().map(|s| s.id).collect();
        }
        HistoryFingerprint {
            settings,
            robot_owners: history.robot_owner_ids(),
            turns,
        }
    }

    /// Where `current` departs from `self` on any turn up to `last_turn`.
    ///
    /// Turn `last_turn + 1` reads ships seen on `last_turn`, so nothing after
    /// `last_turn` can invalidate the turns already reconstructed.
    pub fn divergence(&self, current: &HistoryFingerprint, last_turn: u32) -> Option<Divergence> {
        if self.settings != current.settings {
            return Some(Divergence::Settings);
        }
        if self.robot_owners != current.robot_owners {
            return Some(Divergence::RobotOwners);
        }
        let saved: Vec<_> = self.turns.range(..=last_turn).collect();
        let now: Vec<_> = current.turns.range(..=last_turn).collect();
        if saved == now {
            return None;
        }
        let first = saved
            .iter()
            .zip(&now)
            .find(|(a, b)| a != b)
            .map(|(a, b)| *a.0.min(b.0))
            .or_else(|| saved.get(now.len()).or(now.get(saved.len())).map(|(t, _)| **t));
        Some(Divergence::Turn(first.unwrap_or(last_turn)))
    }
}

/// A timeline stored together with the inputs it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTimeline {
    pub fingerprint: HistoryFingerprint,
    pub timeline: MinefieldTimeline,
}

/// How [`SavedTimeline::resume`] arrived at its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// The saved turns were kept and `added` turns reconstructed after them.
    Extended { added: usize },
    /// Nothing usable was saved, or the saved inputs changed.
    Rebuilt { reason: Option<Divergence> },
}

impl SavedTimeline {
    pub fn build(history: &GameHistory, settings: MinefieldSettings) -> Result<Self> {
        Ok(SavedTimeline {
            fingerprint: HistoryFingerprint::of(history, settings),
            timeline: reconstruct(history, settings)?,
        })
    }

    /// Bring `saved` up to date with `history`. The result always equals a
    /// full reconstruction of `history`.
    pub fn resume(
        saved: Option<SavedTimeline>,
        history: &GameHistory,
        settings: MinefieldSettings,
    ) -> Result<(Self, Resume)> {
        let current = HistoryFingerprint::of(history, settings);
        let mut timeline = MinefieldTimeline::default();
        let mut reason = None;
        if let Some(saved) = saved {
            if let Some(last_turn) = saved.timeline.last_turn() {
                match saved.fingerprint.divergence(&current, last_turn) {
                    None => timeline = saved.timeline,
                    Some(divergence) => {
                        info!(last_turn, %divergence, "Saved minefields are stale");
                        reason = Some(divergence);
                    }
                }
            }
        }

        let reused = timeline.last_turn().is_some();
        let added = timeline.extend(history, settings)?;
        let how = if reused {
            Resume::Extended { added }
        } else {
            Resume::Rebuilt { reason }
        };
        let resumed = SavedTimeline {
            fingerprint: current,
            timeline,
        };
        Ok((resumed, how))
    }
}
