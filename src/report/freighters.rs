//! Where one player's freighters have been seen, turn by turn.

use std::collections::{BTreeMap, BTreeSet};

use crate::galaxy::{GameHistory, Hull, TurnSnapshot};
use crate::report::overlay::{shade, Layer, Markup};

/// Hull names counted as freighters.
pub const FREIGHTER_HULLS: [&str; 16] = [
    "Small Deep Space Freighter",
    "Medium Deep Space Freighter",
    "Large Deep Space Freighter",
    "Super Transport Freighter",
    "Neutronic Fuel Carrier",
    "Small Transport",
    "Medium Transport",
    "Dwarfstar Class Transport",
    "Dwarfstar II Class Transport",
    "Outrider Class Transport",
    "Aries Class Transport",
    "Gemini Class Transport",
    "Sagittarius Class Transport",
    "Skyfire Class Transport",
    "Taurus Class Transport",
    "Dungeon Class Stargate",
];

const SHORT_HULL_NAMES: [(u32, &str); 47] = [
    (14, "NFC"),
    (15, "SDSF"),
    (16, "MDSF"),
    (17, "LDSF"),
    (18, "STF"),
    (27, "Swift"),
    (28, "Fearless"),
    (69, "SSD"),
    (102, "Scorpius Light"),
    (104, "Refinery"),
    (107, "Ore Condenser"),
    (109, "Freighter ©"),
    (120, "D9 USVA"),
    (203, "Arm. Nest"),
    (207, "Dur R"),
    (208, "Trit R"),
    (209, "Molyb R"),
    (1001, "Outrider Transport"),
    (1010, "Arkham Destroyer"),
    (1021, "Reptile Escort"),
    (1025, "Saurian Frigate"),
    (1030, "Valiant Storm"),
    (1032, "Bright Light"),
    (1033, "Deth Armoured"),
    (1038, "D3 Frigate"),
    (1040, "Pest Light"),
    (1041, "Shield Gen"),
    (1047, "Red Storm"),
    (1048, "Skyfire Transport"),
    (1049, "Madonzilla ©"),
    (1050, "Bloodfang Stealth"),
    (1059, "Med Trans"),
    (1062, "Sky Garnet F"),
    (1085, "Iron Tug"),
    (1089, "Iron Command"),
    (1090, "Sage Repair"),
    (1093, "Heavy Transport"),
    (1095, "Joe Light"),
    (1098, "Taurus Transport"),
    (2010, "Arkham Cruiser"),
    (2011, "Thor Heavy"),
    (2033, "Deth Stealth"),
    (2035, "Saurian Heavy"),
    (2038, "D3 Cruiser"),
    (2102, "Scorpius Heavy"),
    (3004, "Vendetta Stealth"),
    (3033, "Deth Heavy"),
];

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// Compact hull name for tables and map labels.
///
/// Known hulls use a fixed abbreviation. Otherwise "X Class ..." names keep
/// what precedes "Class", and a leading model number such as "B200" is used
/// on its own.
pub fn short_hull_name(hull: &Hull) -> String {
    if let Some((_, short)) = SHORT_HULL_NAMES.iter().find(|(id, _)| *id == hull.id) {
        return short.to_string();
    }
    let name = hull.name.as_str();
    let first = name.split(' ').next().unwrap_or_default();
    if first.is_empty() {
        return name.to_string();
    }
    if let Some(end) = name.rfind(" Class ") {
        let base = &name[..end];
        let short = if has_digit(first) { first } else { base };
        return short.to_string();
    }
    let rest = &name[first.len()..];
    let two_words = rest
        .strip_prefix(' ')
        .is_some_and(|r| r.starts_with(|c: char| c != ' '));
    if two_words && has_digit(first) {
        return first.to_string();
    }
    name.to_string()
}

/// Short name for a hull id, falling back to the id when the hull list lacks it.
pub fn hull_label(turn: &TurnSnapshot, hull_id: u32) -> String {
    turn.hull(hull_id)
        .map_or_else(|| format!("Hull {}", hull_id), short_hull_name)
}

/// Ids of the freighter hulls in a turn's hull list.
pub fn freighter_hull_ids(turn: &TurnSnapshot) -> BTreeSet<u32> {
    turn.hulls
        .iter()
        .filter(|h| FREIGHTER_HULLS.contains(&h.name.as_str()))
        .map(|h| h.id)
        .collect()
}

/// One freighter as seen on one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct FreighterSighting {
    pub turn: u32,
    pub ship_id: u32,
    pub name: String,
    /// `P{id}-{username}`
    pub owner: String,
    pub race: String,
    pub position: (i32, i32),
    pub target: (i32, i32),
    pub warp: i32,
    pub mass: i32,
    pub hull_id: u32,
}

/// Every sighting of `player_id`'s freighters in `viewer`'s turns, oldest first.
pub fn freighter_sightings(
    history: &GameHistory,
    viewer: u32,
    player_id: u32,
) -> Vec<FreighterSighting> {
    let Some(latest) = history.latest_for(viewer) else {
        return Vec::new();
    };
    let freighters = freighter_hull_ids(latest);

    let mut sightings = Vec::new();
    for turn in history.turns_for(viewer) {
        let owner = turn
            .player_info(player_id)
            .map_or_else(|| format!("P{}", player_id), |p| format!("P{}-{}", p.id, p.username));
        let race = turn.race_name_of(player_id).unwrap_or("unknown").to_string();
        for ship in turn.ships(Some(player_id)) {
            if !freighters.contains(&ship.hullid) {
                continue;
            }
            sightings.push(FreighterSighting {
                turn: if ship.infoturn > 0 { ship.infoturn } else { turn.turn() },
                ship_id: ship.id,
                name: ship.name.clone(),
                owner: owner.clone(),
                race: race.clone(),
                position: (ship.x, ship.y),
                target: ship.target(),
                warp: ship.warp,
                mass: ship.mass,
                hull_id: ship.hullid,
            });
        }
    }
    sightings
}

/// Display row of the freighter table.
#[derive(Debug, Clone, PartialEq)]
pub struct FreighterRow {
    pub turn: u32,
    /// `S{id}-{name}`
    pub ship: String,
    pub location: String,
    /// Blank when the ship is not moving.
    pub target: String,
    pub warp: i32,
    pub mass: i32,
    pub hull: String,
}

pub fn build_freighter_report(
    history: &GameHistory,
    viewer: u32,
    player_id: u32,
) -> Vec<FreighterRow> {
    let Some(latest) = history.latest_for(viewer) else {
        return Vec::new();
    };
    freighter_sightings(history, viewer, player_id)
        .into_iter()
        .map(|s| {
            let location = format!("{},{}", s.position.0, s.position.1);
            let target = if s.target == s.position {
                String::new()
            } else {
                format!("{},{}", s.target.0, s.target.1)
            };
            FreighterRow {
                turn: s.turn,
                ship: format!("S{}-{}", s.ship_id, s.name),
                location,
                target,
                warp: s.warp,
                mass: s.mass,
                hull: hull_label(latest, s.hull_id),
            }
        })
        .collect()
}

/// Sightings from the last four turns are drawn lighter than the base colour,
/// the six turns before that a little darker, anything older darker still.
fn age_colour(base: &str, turn: u32, latest_turn: u32) -> String {
    let age = latest_turn as i64 - turn as i64;
    if age < 4 {
        shade(base, 0.1)
    } else if age < 10 {
        shade(base, -0.1)
    } else {
        shade(base, -0.25)
    }
}

/// Starmap layer of freighter sightings: a labelled point per position, a
/// circle of one turn's travel, and a line to each reported destination.
pub fn freighter_layer(
    sightings: &[FreighterSighting],
    base_colour: &str,
    latest_turn: u32,
) -> Layer {
    let race = sightings.first().map_or("unknown", |s| s.race.as_str());
    let mut layer = Layer::new(format!("{} Freighters", race));

    let mut points: BTreeMap<(i32, i32), Vec<(String, String)>> = BTreeMap::new();
    let mut circles: BTreeMap<(i32, i32), Vec<(i32, String)>> = BTreeMap::new();
    let mut lines: BTreeMap<(i32, i32), Vec<((i32, i32), String)>> = BTreeMap::new();

    // newest first, so each position takes the colour of its latest sighting
    for s in sightings.iter().rev() {
        let colour = age_colour(base_colour, s.turn, latest_turn);
        let label = format!("S{}-T{}", s.ship_id, s.turn);
        points
            .entry(s.position)
            .or_default()
            .push((label, colour.clone()));
        circles
            .entry(s.position)
            .or_default()
            .push((s.warp * s.warp, colour.clone()));
        if s.target != s.position {
            lines.entry(s.position).or_default().push((s.target, colour));
        }
    }

    for ((x, y), items) in &points {
        let mut text = items
            .iter()
            .take(3)
            .map(|(label, _)| label.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if items.len() > 3 {
            text.push_str("...");
        }
        layer.markups.push(Markup::point(*x, *y, text, &items[0].1));
    }
    for ((x, y), items) in &circles {
        let (r, colour) = &items[0];
        layer.markups.push(Markup::circle(*x, *y, *r, colour));
    }
    for (from, items) in &lines {
        let colour = &items[0].1;
        for (to, _) in items {
            layer.markups.push(Markup::line(*from, *to, colour));
        }
    }
    layer
}
