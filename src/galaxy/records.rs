use serde::{Deserialize, Serialize};

/// Ship mission code for "sweep mines".
pub const MISSION_MINE_SWEEP: i32 = 1;

/// Host race id of the Robotic Imperium; their minefields are four times less dense.
pub const ROBOT_RACE_ID: u32 = 9;

/// A planet as reported in a turn result. Field names follow the host wire schema.
///
/// Every economic field is required: a snapshot missing one fails to load
/// instead of silently producing a zeroed colony.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: u32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub ownerid: u32,
    pub temp: i32,
    pub clans: i32,
    pub nativeclans: i32,
    pub megacredits: i32,
    pub supplies: i32,
    pub factories: i32,
    pub mines: i32,
    pub nativetaxrate: i32,
    pub colonisttaxrate: i32,
    pub nativehappypoints: i32,
    pub colonisthappypoints: i32,
    pub nativegovernment: i32,
    pub nativeracename: String,
    pub neutronium: i32,
    pub duranium: i32,
    pub tritanium: i32,
    pub molybdenum: i32,
    pub groundneutronium: i32,
    pub groundduranium: i32,
    pub groundtritanium: i32,
    pub groundmolybdenum: i32,
    pub densityneutronium: i32,
    pub densityduranium: i32,
    pub densitytritanium: i32,
    pub densitymolybdenum: i32,
}

/// A ship sighting. Cargo is only reported for the viewing player's own ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub ownerid: u32,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub hullid: u32,
    #[serde(default)]
    pub mission: i32,
    /// Fuel on board.
    #[serde(default)]
    pub neutronium: i32,
    #[serde(default)]
    pub megacredits: i32,
    #[serde(default)]
    pub supplies: i32,
    #[serde(default)]
    pub duranium: i32,
    #[serde(default)]
    pub tritanium: i32,
    #[serde(default)]
    pub molybdenum: i32,
    #[serde(default)]
    pub targetx: i32,
    #[serde(default)]
    pub targety: i32,
    #[serde(default)]
    pub warp: i32,
    /// Total mass as seen by the viewer's scanners.
    #[serde(default)]
    pub mass: i32,
    /// Percent damage.
    #[serde(default)]
    pub damage: i32,
    /// Turn the sighting was last refreshed; 0 when not reported.
    #[serde(default)]
    pub infoturn: u32,
}

impl Ship {
    /// Whether the ship was sweeping mines with fuel left to move.
    pub fn is_active_sweeper(&self) -> bool {
        self.mission == MISSION_MINE_SWEEP && self.neutronium > 0
    }

    pub fn target(&self) -> (i32, i32) {
        (self.targetx, self.targety)
    }

    pub fn is_moving(&self) -> bool {
        self.target() != (self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Starbase {
    pub id: u32,
    pub planetid: u32,
    pub enginetechlevel: i32,
    pub hulltechlevel: i32,
    pub beamtechlevel: i32,
    pub torptechlevel: i32,
}

impl Starbase {
    pub fn total_tech(&self) -> i32 {
        self.enginetechlevel + self.hulltechlevel + self.beamtechlevel + self.torptechlevel
    }
}

/// A free-text game message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u32,
    pub messagetype: i32,
    #[serde(default)]
    pub headline: String,
    pub body: String,
    pub x: i32,
    pub y: i32,
    pub target: i32,
    pub ownerid: u32,
    pub turn: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    #[serde(default)]
    pub turn: u32,
    pub mapshape: i32,
    pub mapwidth: i32,
    pub mapheight: i32,
}

impl MapSettings {
    pub fn is_spherical(&self) -> bool {
        self.mapshape == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: u32,
    pub raceid: u32,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: u32,
    pub adjective: String,
}

/// A hull design from the game's component list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub mass: i32,
    #[serde(default)]
    pub cargo: i32,
    #[serde(default)]
    pub fueltank: i32,
}

/// The viewer's diplomatic stance towards another player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub playertoid: u32,
    /// Map colour chosen on the diplomacy screen, `rrggbb` without the `#`.
    #[serde(default)]
    pub color: String,
}
