//! Military intelligence: sightings of one enemy's ships around a point.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::galaxy::GameHistory;
use crate::report::freighters::hull_label;
use crate::report::overlay::{Layer, Markup};
use crate::space::geometry::distance;

const MILINT_COLOUR: &str = "#ff0";

/// Area and period to search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MilintQuery {
    /// Player whose turns are searched.
    pub viewer: u32,
    /// Player whose ships are reported.
    pub target: u32,
    pub from_turn: u32,
    pub centre: (i32, i32),
    pub radius: f64,
}

/// One enemy ship seen on one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    pub turn: u32,
    pub ship_id: u32,
    pub name: String,
    pub hull: String,
    pub position: (i32, i32),
    pub warp: i32,
    pub mass: i32,
    /// Light years since the previous sighting of the same ship.
    pub moved: i32,
    pub note: String,
}

/// Every sighting in the query area, grouped by ship and ordered by turn.
pub fn collect_sightings(
    history: &GameHistory,
    query: &MilintQuery,
) -> BTreeMap<u32, Vec<Sighting>> {
    let mut by_ship: BTreeMap<u32, Vec<Sighting>> = BTreeMap::new();
    if query.target == query.viewer {
        return by_ship;
    }
    let Some(latest) = history.latest_for(query.viewer) else {
        return by_ship;
    };

    for turn in history.turns_for(query.viewer) {
        if turn.turn() < query.from_turn {
            continue;
        }
        for ship in turn.ships(Some(query.target)) {
            let position = (ship.x, ship.y);
            if distance(query.centre, position) >= query.radius {
                continue;
            }
            let seen = by_ship.entry(ship.id).or_default();
            let moved = seen
                .last()
                .map_or(0, |prev| distance(prev.position, position).round() as i32);
            let note = if ship.damage > 0 {
                format!("{}% damaged", ship.damage)
            } else {
                String::new()
            };
            seen.push(Sighting {
                turn: turn.turn(),
                ship_id: ship.id,
                name: ship.name.clone(),
                hull: hull_label(latest, ship.hullid),
                position,
                warp: ship.warp,
                mass: ship.mass,
                moved,
                note,
            });
        }
    }
    by_ship
}

/// Latest sighting of one ship with a summary of its history.
#[derive(Debug, Clone, PartialEq)]
pub struct MilintRow {
    pub ship_id: u32,
    /// `S{id} {hull}`
    pub label: String,
    pub name: String,
    pub turn: u32,
    pub position: (i32, i32),
    /// Lowest warp the ship was seen moving at, as a proxy for its engine.
    pub engine: String,
    /// `min - max` over all sightings, or a single value.
    pub mass_range: String,
    pub moved: i32,
    pub note: String,
}

/// One row per ship at its latest sighting, most recent first.
pub fn build_milint_report(history: &GameHistory, query: &MilintQuery) -> Vec<MilintRow> {
    let mut rows: Vec<MilintRow> = collect_sightings(history, query)
        .into_iter()
        .filter_map(|(ship_id, seen)| {
            let latest = seen.last()?;
            let min_warp = seen.iter().map(|s| s.warp).filter(|w| *w > 0).min().unwrap_or(0);
            let min_mass = seen.iter().map(|s| s.mass).min().unwrap_or(0);
            let max_mass = seen.iter().map(|s| s.mass).max().unwrap_or(0);
            let mass_range = if min_mass == max_mass {
                min_mass.to_string()
            } else {
                format!("{} - {}", min_mass, max_mass)
            };
            Some(MilintRow {
                ship_id,
                label: format!("S{} {}", ship_id, latest.hull),
                name: latest.name.clone(),
                turn: latest.turn,
                position: latest.position,
                engine: format!("W{}", min_warp.max(1)),
                mass_range,
                moved: latest.moved,
                note: latest.note.clone(),
            })
        })
        .collect();
    rows.sort_by_key(|r| (Reverse(r.turn), r.ship_id));
    rows
}

/// One labelled point per location listing the ships last seen there, latest
/// turn first.
pub fn milint_layer(rows: &[MilintRow]) -> Layer {
    let mut by_location: BTreeMap<(i32, i32), BTreeMap<Reverse<u32>, Vec<&str>>> =
        BTreeMap::new();
    for row in rows {
        by_location
            .entry(row.position)
            .or_default()
            .entry(Reverse(row.turn))
            .or_default()
            .push(row.label.as_str());
    }

    let mut layer = Layer::new("MilInt");
    for ((x, y), turns) in by_location {
        let mut lines = Vec::new();
        for (Reverse(turn), labels) in turns {
            let Some((first, rest)) = labels.split_first() else {
                continue;
            };
            lines.push(format!("T{} {}", turn, first));
            lines.extend(rest.iter().map(|label| format!("  {}", label)));
        }
        if lines.is_empty() {
            continue;
        }
        layer.markups.push(Markup::point(x, y, lines.join("\n"), MILINT_COLOUR));
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::fixtures::{ship, snapshot};
    use crate::galaxy::Hull;

    fn query() -> MilintQuery {
        MilintQuery {
            viewer: 1,
            target: 4,
            from_turn: 2,
            centre: (1000, 1000),
            radius: 200.0,
        }
    }

    fn game() -> GameHistory {
        let mut history = GameHistory::new();
        for turn in 1..=4u32 {
            let mut snap = snapshot(1, turn);
            snap.hulls = vec![Hull {
                id: 15,
                name: "Small Deep Space Freighter".to_string(),
                mass: 30,
                cargo: 70,
                fueltank: 200,
            }];

            let mut raider = ship(40, 900 + 30 * turn as i32, 1000, 4);
            raider.name = "Raider".to_string();
            raider.warp = if turn == 3 { 0 } else { 9 - turn as i32 };
            raider.mass = 150 + 10 * turn as i32;
            let mut far = ship(41, 1500, 1500, 4);
            far.warp = 9;
            let mut ours = ship(42, 1000, 1000, 1);
            ours.warp = 9;
            snap.ships = vec![raider, far, ours];
            if turn == 2 {
                let mut scout = ship(43, 1050, 1050, 4);
                scout.hullid = 77;
                scout.damage = 30;
                snap.ships.push(scout);
            }
            history.insert(1, turn, snap);
        }
        history
    }

    #[test]
    fn sightings_are_filtered_by_owner_area_and_turn() {
        let by_ship = collect_sightings(&game(), &query());
        assert_eq!(by_ship.keys().copied().collect::<Vec<_>>(), vec![40, 43]);
        let raider = &by_ship[&40];
        assert_eq!(raider.iter().map(|s| s.turn).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(raider[0].moved, 0);
        assert_eq!(raider[1].moved, 30);
        assert_eq!(raider[0].hull, "SDSF");
        assert_eq!(by_ship[&43][0].hull, "Hull 77");
        assert_eq!(by_ship[&43][0].note, "30% damaged");
    }

    #[test]
    fn own_ships_are_never_reported() {
        let own = MilintQuery {
            target: 1,
            ..query()
        };
        assert!(collect_sightings(&game(), &own).is_empty());
    }

    #[test]
    fn report_keeps_latest_per_ship() {
        let rows = build_milint_report(&game(), &query());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ship_id, 40);
        assert_eq!(rows[0].turn, 4);
        assert_eq!(rows[0].label, "S40 SDSF");
        assert_eq!(rows[0].position, (1020, 1000));
        assert_eq!(rows[0].engine, "W5");
        assert_eq!(rows[0].mass_range, "170 - 190");
        assert_eq!(rows[1].ship_id, 43);
        assert_eq!(rows[1].engine, "W1");
        assert_eq!(rows[1].mass_range, "100");
    }

    fn row(ship_id: u32, label: &str, turn: u32) -> MilintRow {
        MilintRow {
            ship_id,
            label: label.to_string(),
            name: String::new(),
            turn,
            position: (10, 20),
            engine: "W9".to_string(),
            mass_range: "100".to_string(),
            moved: 0,
            note: String::new(),
        }
    }

    #[test]
    fn layer_lists_latest_turn_first() {
        let mut elsewhere = row(4, "S4 STF", 1);
        elsewhere.position = (500, 500);
        let rows = vec![
            row(1, "S1 SDSF", 3),
            row(2, "S2 LDSF", 5),
            row(3, "S3 MDSF", 5),
            elsewhere,
        ];
        let layer = milint_layer(&rows);
        assert_eq!(layer.name, "MilInt");
        assert_eq!(layer.markups.len(), 2);
        assert!(matches!(
            &layer.markups[0],
            Markup::Point { text, color, .. }
                if text == "T5 S2 LDSF\n  S3 MDSF\nT3 S1 SDSF" && color == "#ff0"
        ));
        assert!(matches!(
            &layer.markups[1],
            Markup::Point { x: 500, text, .. } if text == "T1 S4 STF"
        ));
    }
}
