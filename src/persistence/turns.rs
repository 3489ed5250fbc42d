use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{Result, StarfoldError};
use crate::galaxy::{GameHistory, TurnSnapshot};

/// `turn-p{player}-t{turn}.json`
pub fn turn_filename(player_id: u32, turn: u32) -> String {
    format!("turn-p{}-t{}.json", player_id, turn)
}

fn parse_turn_filename(filename: &str) -> Option<(u32, u32)> {
    let stem = filename.strip_suffix(".json")?;
    let rest = stem.strip_prefix("turn-p")?;
    let (player_str, turn_str) = rest.split_once("-t")?;
    let player = player_str.parse::<u32>().ok()?;
    let turn = turn_str.parse::<u32>().ok()?;
    Some((player, turn))
}

pub fn load_turn_file(path: &Path) -> Result<TurnSnapshot> {
    let content = fs::read_to_string(path)?;
    TurnSnapshot::from_json(&content)
}

/// Load every turn file of one game into a [`GameHistory`].
///
/// The file name decides the player and turn a snapshot is filed under.
/// A malformed file aborts the load.
pub fn load_turn_directory(dir: &Path) -> Result<GameHistory> {
    let mut entries: Vec<(u32, u32, PathBuf)> = Vec::new();
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let parsed = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_turn_filename);
            if let Some((player, turn)) = parsed {
                entries.push((player, turn, path));
            }
        }
    }

    if entries.is_empty() {
        return Err(StarfoldError::NoTurns(dir.display().to_string()));
    }

    let loaded: Vec<(u32, u32, TurnSnapshot)> = entries
        .par_iter()
        .map(|(player, turn, path)| {
            load_turn_file(path).map(|snapshot| (*player, *turn, snapshot))
        })
        .collect::<Result<_>>()?;

    let mut history = GameHistory::new();
    for (player, turn, snapshot) in loaded {
        if snapshot.turn() != turn || snapshot.player_id() != player {
            warn!(
                player,
                turn,
                snapshot_player = snapshot.player_id(),
                snapshot_turn = snapshot.turn(),
                "Turn file name disagrees with its contents"
            );
        }
        history.insert(player, turn, snapshot);
    }

    info!(
        files = history.len(),
        players = history.players().len(),
        last_turn = history.last_turn().unwrap_or(0),
        "Loaded turn history"
    );
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::fixtures::snapshot;
    use tempfile::TempDir;

    fn write_turn(dir: &Path, player: u32, turn: u32) {
        let content = serde_json::to_string(&snapshot(player, turn)).unwrap();
        fs::write(dir.join(turn_filename(player, turn)), content).unwrap();
    }

    #[test]
    fn filename_round_trip() {
        assert_eq!(turn_filename(3, 41), "turn-p3-t41.json");
        assert_eq!(parse_turn_filename("turn-p3-t41.json"), Some((3, 41)));
        assert!(parse_turn_filename("turn-p3.json").is_none());
        assert!(parse_turn_filename("turn-px-t1.json").is_none());
        assert!(parse_turn_filename("minefields-turn3-100.bin").is_none());
    }

    #[test]
    fn loads_all_players_and_turns() {
        let dir = TempDir::new().unwrap();
        for turn in 1..=3 {
            write_turn(dir.path(), 1, turn);
            write_turn(dir.path(), 2, turn);
        }
        fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let history = load_turn_directory(dir.path()).unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history.players().into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(history.last_turn(), Some(3));
        assert!(history.turn(2, 2).is_some());
    }

    #[test]
    fn accepts_rst_envelope() {
        let dir = TempDir::new().unwrap();
        let wrapped = serde_json::json!({ "rst": snapshot(4, 9) });
        fs::write(dir.path().join(turn_filename(4, 9)), wrapped.to_string()).unwrap();

        let history = load_turn_directory(dir.path()).unwrap();
        assert_eq!(history.turn(4, 9).unwrap().turn(), 9);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_turn_directory(dir.path()).unwrap_err(),
            StarfoldError::NoTurns(_)
        ));
        assert!(matches!(
            load_turn_directory(&dir.path().join("missing")).unwrap_err(),
            StarfoldError::NoTurns(_)
        ));
    }

    #[test]
    fn malformed_file_aborts_load() {
        let dir = TempDir::new().unwrap();
        write_turn(dir.path(), 1, 1);
        fs::write(dir.path().join(turn_filename(1, 2)), "{\"planets\": [}").unwrap();

        assert!(matches!(
            load_turn_directory(dir.path()).unwrap_err(),
            StarfoldError::Snapshot(_)
        ));
    }
}
