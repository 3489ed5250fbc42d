pub mod records;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub use records::{
    Hull, MapSettings, Message, Planet, PlayerInfo, Race, Relation, Ship, Starbase,
    MISSION_MINE_SWEEP, ROBOT_RACE_ID,
};

/// One player's view of the galaxy for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    #[serde(default)]
    pub planets: Vec<Planet>,
    #[serde(default)]
    pub ships: Vec<Ship>,
    #[serde(default)]
    pub starbases: Vec<Starbase>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub settings: MapSettings,
    pub player: PlayerInfo,
    #[serde(default)]
    pub players: Vec<PlayerInfo>,
    #[serde(default)]
    pub races: Vec<Race>,
    #[serde(default)]
    pub hulls: Vec<Hull>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl TurnSnapshot {
    /// Parse a turn result document, accepting both the bare result and the
    /// `{"rst": {...}}` envelope returned by the game server.
    pub fn from_json(content: &str) -> crate::Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(content)?;
        if let Some(rst) = value.get_mut("rst") {
            value = rst.take();
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn turn(&self) -> u32 {
        self.settings.turn
    }

    pub fn player_id(&self) -> u32 {
        self.player.id
    }

    /// Planets, optionally restricted to one owner.
    pub fn planets(&self, owner: Option<u32>) -> impl Iterator<Item = &Planet> {
        self.planets
            .iter()
            .filter(move |p| owner.is_none_or(|o| p.ownerid == o))
    }

    pub fn ships(&self, owner: Option<u32>) -> impl Iterator<Item = &Ship> {
        self.ships
            .iter()
            .filter(move |s| owner.is_none_or(|o| s.ownerid == o))
    }

    /// Starbases, optionally restricted to those orbiting planets of one owner.
    pub fn starbases(&self, owner: Option<u32>) -> Vec<&Starbase> {
        match owner {
            None => self.starbases.iter().collect(),
            Some(owner) => {
                let owned: BTreeSet<u32> = self.planets(Some(owner)).map(|p| p.id).collect();
                self.starbases
                    .iter()
                    .filter(|sb| owned.contains(&sb.planetid))
                    .collect()
            }
        }
    }

    pub fn planet(&self, id: u32) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == id)
    }

    /// Race adjective of the viewing player (e.g. "Fed", "Cyborg").
    pub fn player_race_name(&self) -> Option<&str> {
        self.races
            .iter()
            .find(|r| r.id == self.player.raceid)
            .map(|r| r.adjective.as_str())
    }

    pub fn hull(&self, id: u32) -> Option<&Hull> {
        self.hulls.iter().find(|h| h.id == id)
    }

    pub fn player_info(&self, id: u32) -> Option<&PlayerInfo> {
        self.players
            .iter()
            .chain(std::iter::once(&self.player))
            .find(|p| p.id == id)
    }

    /// Race adjective of any player in the game.
    pub fn race_name_of(&self, player_id: u32) -> Option<&str> {
        let raceid = self.player_info(player_id)?.raceid;
        self.races
            .iter()
            .find(|r| r.id == raceid)
            .map(|r| r.adjective.as_str())
    }

    /// `#rrggbb` colour the viewer gave `player_id` on the diplomacy screen.
    pub fn diplomacy_colour(&self, player_id: u32) -> Option<String> {
        self.relations
            .iter()
            .find(|r| r.playertoid == player_id && !r.color.is_empty())
            .map(|r| format!("#{}", r.color.trim_start_matches('#')))
    }

    /// Player ids whose minefields use robot density scaling.
    pub fn robot_owner_ids(&self) -> BTreeSet<u32> {
        self.players
            .iter()
            .chain(std::iter::once(&self.player))
            .filter(|p| p.raceid == ROBOT_RACE_ID)
            .map(|p| p.id)
            .collect()
    }
}

/// Every stored turn of one game, keyed by (player, turn).
#[derive(Debug, Clone, Default)]
pub struct GameHistory {
    turns: BTreeMap<(u32, u32), TurnSnapshot>,
}

impl GameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player_id: u32, turn: u32, snapshot: TurnSnapshot) {
        self.turns.insert((player_id, turn), snapshot);
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn turn(&self, player_id: u32, turn: u32) -> Option<&TurnSnapshot> {
        self.turns.get(&(player_id, turn))
    }

    /// (player, turn) keys of every stored turn file, in key order.
    pub fn files(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.turns.keys().copied()
    }

    pub fn players(&self) -> BTreeSet<u32> {
        self.turns.keys().map(|(p, _)| *p).collect()
    }

    pub fn last_turn(&self) -> Option<u32> {
        self.turns.keys().map(|(_, t)| *t).max()
    }

    /// Latest stored turn for one player.
    pub fn latest_for(&self, player_id: u32) -> Option<&TurnSnapshot> {
        self.turns
            .range((player_id, 0)..=(player_id, u32::MAX))
            .next_back()
            .map(|(_, snap)| snap)
    }

    /// One player's snapshots in turn order.
    pub fn turns_for(&self, player_id: u32) -> impl Iterator<Item = &TurnSnapshot> {
        self.turns
            .range((player_id, 0)..=(player_id, u32::MAX))
            .map(|(_, snap)| snap)
    }

    /// All players' snapshots of one turn.
    pub fn snapshots_for_turn(&self, turn: u32) -> impl Iterator<Item = &TurnSnapshot> {
        self.turns
            .iter()
            .filter(move |((_, t), _)| *t == turn)
            .map(|(_, snap)| snap)
    }

    /// Messages from every player's turns, deduplicated by message id and
    /// grouped by the turn they report on. Within a turn they are ordered by id.
    pub fn messages_by_turn(&self) -> BTreeMap<u32, Vec<&Message>> {
        let mut by_id: BTreeMap<u32, &Message> = BTreeMap::new();
        for snap in self.turns.values() {
            for msg in &snap.messages {
                by_id.entry(msg.id).or_insert(msg);
            }
        }
        let mut by_turn: BTreeMap<u32, Vec<&Message>> = BTreeMap::new();
        for msg in by_id.into_values() {
            by_turn.entry(msg.turn).or_default().push(msg);
        }
        by_turn
    }

    /// Ships seen by any player on the given turn, deduplicated by ship id.
    pub fn ships_seen_on(&self, turn: u32) -> Vec<&Ship> {
        let mut by_id: BTreeMap<u32, &Ship> = BTreeMap::new();
        for snap in self.snapshots_for_turn(turn) {
            for ship in &snap.ships {
                by_id.entry(ship.id).or_insert(ship);
            }
        }
        by_id.into_values().collect()
    }

    /// Robot owners known from any stored turn.
    pub fn robot_owner_ids(&self) -> BTreeSet<u32> {
        self.turns
            .values()
            .flat_map(|snap| snap.robot_owner_ids())
            .collect()
    }
}
