use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::galaxy::{GameHistory, Message, Ship};
use crate::minefield::field::Minefield;
use crate::minefield::protocol::{decode, MineEvent};
use crate::minefield::statistics::{compute_statistics, TurnStatistics};
use crate::space::geometry::distance;
use crate::Result;

/// Live minefields keyed by id.
pub type MinefieldSet = BTreeMap<u32, Minefield>;

/// Tunables of the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinefieldSettings {
    pub decay_rate: f64,
    /// First turn the sweeper sanity check runs on.
    pub sanity_check_from_turn: u32,
    /// Light years added to a field's radius when looking for sweepers.
    pub sanity_check_margin: f64,
    pub sanity_check_min_sweepers: usize,
}

impl Default for MinefieldSettings {
    fn default() -> Self {
        MinefieldSettings {
            decay_rate: 0.05,
            sanity_check_from_turn: 4,
            sanity_check_margin: 200.0,
            sanity_check_min_sweepers: 2,
        }
    }
}

impl MinefieldSettings {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        MinefieldSettings {
            decay_rate: config.mine_decay_rate,
            sanity_check_from_turn: config.sanity_check_from_turn,
            sanity_check_margin: config.sanity_check_margin,
            sanity_check_min_sweepers: config.sanity_check_min_sweepers,
        }
    }
}

/// Mutual destruction of overlapping enemy minefields of the same kind.
///
/// Pairs are visited in (owner, id) order; each step removes one unit from
/// both fields while both have units and their radii still reach each other.
/// Returns the total number of units destroyed.
pub fn handle_countermining(fields: &mut MinefieldSet) -> i64 {
    let mut ordered: Vec<Minefield> = std::mem::take(fields).into_values().collect();
    ordered.sort_by_key(|f| (f.owner_id, f.id));

    let mut destroyed = 0_i64;
    for i in 0..ordered.len() {
        let (head, tail) = ordered.split_at_mut(i + 1);
        let lhs = &mut head[i];
        for rhs in tail.iter_mut() {
            if rhs.is_web != lhs.is_web || rhs.owner_id == lhs.owner_id {
                continue;
            }
            let dist = lhs.distance_to(rhs);
            while lhs.mine_units > 0
                && rhs.mine_units > 0
                && dist <= (lhs.radius + rhs.radius) as f64
            {
                lhs.update(-1);
                rhs.update(-1);
                destroyed += 2;
            }
        }
    }

    *fields = ordered.into_iter().map(|f| (f.id, f)).collect();
    destroyed
}

/// Advances the minefield picture one turn at a time.
#[derive(Debug, Clone)]
pub struct MinefieldTracker {
    settings: MinefieldSettings,
    robot_owners: BTreeSet<u32>,
}

/// Fields touched by this turn's events.
#[derive(Debug, Default)]
struct Observed {
    /// Unit count reported outright; no decay this turn.
    authoritative: BTreeSet<u32>,
    /// Seen by a sweep, scoop or scan; exempt from the sanity check.
    scanned: BTreeSet<u32>,
}

impl MinefieldTracker {
    pub fn new(settings: MinefieldSettings, robot_owners: BTreeSet<u32>) -> Self {
        MinefieldTracker {
            settings,
            robot_owners,
        }
    }

    /// Compute turn `turn` from the previous turn's fields.
    ///
    /// `messages` are this turn's messages in id order; `previous_sweepers`
    /// are every ship seen on the previous turn. A malformed lay or collision
    /// report aborts the turn; other bad reports are skipped.
    pub fn advance_turn(
        &self,
        turn: u32,
        previous: &MinefieldSet,
        messages: &[&Message],
        previous_sweepers: &[&Ship],
    ) -> Result<(MinefieldSet, TurnStatistics)> {
        let mut fields = previous.clone();
        let mut observed = Observed::default();
        let mut applied = 0_u32;
        let mut skipped = 0_u32;

        let mut events: Vec<MineEvent> = Vec::with_capacity(messages.len());
        for msg in messages {
            match decode(msg) {
                Ok(MineEvent::Unknown) => {}
                Ok(event) => events.push(event),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(turn, message_id = msg.id, error = %e, "Skipping unreadable minefield report");
                    skipped += 1;
                }
            }
        }

        // lay, then collisions, then sweeps / scoops / scans
        for phase in 0..3 {
            for event in &events {
                let event_phase = match event {
                    MineEvent::LayMines { .. } => 0,
                    MineEvent::Collision { .. } => 1,
                    _ => 2,
                };
                if event_phase != phase {
                    continue;
                }
                match self.apply(turn, event, &mut fields, &mut observed) {
                    Some(true) => applied += 1,
                    Some(false) => {}
                    None => skipped += 1,
                }
            }
        }

        for field in fields.values_mut() {
            if !observed.authoritative.contains(&field.id) {
                field.decay(self.settings.decay_rate);
            }
        }

        let countermined = handle_countermining(&mut fields);
        if countermined > 0 {
            debug!(turn, units = countermined, "Countermining");
        }

        fields.retain(|_, f| !f.is_empty());

        let evicted = if turn >= self.settings.sanity_check_from_turn {
            self.sanity_check(turn, previous, &mut fields, &observed, previous_sweepers)
        } else {
            0
        };

        let mut stats = compute_statistics(turn, &fields);
        stats.events_applied = applied;
        stats.events_skipped = skipped;
        stats.units_countermined = countermined;
        stats.sanity_evictions = evicted;
        Ok((fields, stats))
    }

    /// Apply one event. `Some(true)` when a field changed, `Some(false)` for
    /// informational events, `None` when the referenced field is unknown.
    fn apply(
        &self,
        turn: u32,
        event: &MineEvent,
        fields: &mut MinefieldSet,
        observed: &mut Observed,
    ) -> Option<bool> {
        let id = match *event {
            MineEvent::LayMines {
                minefield_id,
                owner_id,
                x,
                y,
                is_web,
                units,
                ..
            } => {
                let robot = self.robot_owners.contains(&owner_id);
                let field = Minefield::new(minefield_id, owner_id, (x, y), is_web, robot, units);
                fields.insert(minefield_id, field);
                observed.authoritative.insert(minefield_id);
                return Some(true);
            }
            MineEvent::Collision { minefield_id, .. }
            | MineEvent::Sweep { minefield_id, .. }
            | MineEvent::Scoop { minefield_id, .. }
            | MineEvent::ScanEnemy { minefield_id, .. }
            | MineEvent::ScanOwn { minefield_id, .. } => minefield_id,
            MineEvent::Detonations { .. }
            | MineEvent::Strike { .. }
            | MineEvent::Glory
            | MineEvent::Unknown => return Some(false),
        };

        let Some(field) = fields.get_mut(&id) else {
            warn!(turn, minefield_id = id, ?event, "Report for unknown minefield, skipping");
            return None;
        };
        match *event {
            MineEvent::Collision { radius, .. } => field.set_radius(radius),
            MineEvent::Sweep { remaining, .. } => field.set_mines(remaining),
            MineEvent::Scoop { scooped, .. } => field.scoop(scooped),
            MineEvent::ScanEnemy { units, .. } | MineEvent::ScanOwn { units, .. } => {
                field.set_mines(units)
            }
            _ => {}
        }
        if event.is_authoritative() {
            observed.authoritative.insert(id);
        }
        if !matches!(event, MineEvent::Collision { .. }) {
            observed.scanned.insert(id);
        }
        Some(true)
    }

    /// Drop fields nobody reported on although enough enemy sweepers passed
    /// close to where they were. Returns the number of fields removed.
    fn sanity_check(
        &self,
        turn: u32,
        previous: &MinefieldSet,
        fields: &mut MinefieldSet,
        observed: &Observed,
        previous_sweepers: &[&Ship],
    ) -> u32 {
        let sweepers: Vec<&Ship> = previous_sweepers
            .iter()
            .copied()
            .filter(|s| s.is_active_sweeper())
            .collect();
        if sweepers.len() < self.settings.sanity_check_min_sweepers {
            return 0;
        }

        let doomed: Vec<u32> = fields
            .keys()
            .copied()
            .filter(|id| !observed.scanned.contains(id) && !observed.authoritative.contains(id))
            .filter_map(|id| previous.get(&id))
            .filter(|before| {
                let reach = self.settings.sanity_check_margin + before.radius as f64;
                let passing = sweepers
                    .iter()
                    .filter(|s| s.ownerid != before.owner_id)
                    .filter(|s| distance((s.x, s.y), before.position()) <= reach)
                    .count();
                passing >= self.settings.sanity_check_min_sweepers
            })
            .map(|before| before.id)
            .collect();

        for id in &doomed {
            fields.remove(id);
            info!(turn, minefield_id = id, "Minefield not seen by passing sweepers, removed");
        }
        doomed.len() as u32
    }
}

/// One reconstructed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub minefields: MinefieldSet,
    pub statistics: TurnStatistics,
}

/// Minefields for every turn of a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinefieldTimeline {
    pub turns: BTreeMap<u32, TurnState>,
}

impl MinefieldTimeline {
    pub fn last_turn(&self) -> Option<u32> {
        self.turns.keys().next_back().copied()
    }

    pub fn at(&self, turn: u32) -> Option<&TurnState> {
        self.turns.get(&turn)
    }

    pub fn latest(&self) -> Option<&TurnState> {
        self.turns.values().next_back()
    }

    /// Reconstruct the turns after the last one already held, up to the last
    /// turn in `history`. Returns the number of turns added.
    pub fn extend(&mut self, history: &GameHistory, settings: MinefieldSettings) -> Result<usize> {
        let messages = history.messages_by_turn();
        let last = history
            .last_turn()
            .into_iter()
            .chain(messages.keys().next_back().copied())
            .max()
            .unwrap_or(0);
        let first = self.last_turn().map_or(1, |t| t + 1);
        let tracker = MinefieldTracker::new(settings, history.robot_owner_ids());

        let mut current = self
            .latest()
            .map(|state| state.minefields.clone())
            .unwrap_or_default();
        let mut added = 0;
        for turn in first..=last {
            let turn_messages = messages.get(&turn).map(Vec::as_slice).unwrap_or(&[]);
            let sweepers = history.ships_seen_on(turn.saturating_sub(1));
            let (next, statistics) =
                tracker.advance_turn(turn, &current, turn_messages, &sweepers)?;
            debug!(
                turn,
                live = statistics.live_fields,
                units = statistics.total_units,
                "Minefields reconstructed"
            );
            current = next.clone();
            self.turns.insert(
                turn,
                TurnState {
                    minefields: next,
                    statistics,
                },
            );
            added += 1;
        }
        Ok(added)
    }
}

/// Reconstruct minefields for every turn from the messages of all players.
pub fn reconstruct(history: &GameHistory, settings: MinefieldSettings) -> Result<MinefieldTimeline> {
    let mut timeline = MinefieldTimeline::default();
    timeline.extend(history, settings)?;
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::fixtures::{message, ship, snapshot};
    use crate::galaxy::{PlayerInfo, MISSION_MINE_SWEEP, ROBOT_RACE_ID};
    use crate::StarfoldError;

    const LAY_4900: &str = "We have converted our torpedoes into deep space mines. \
        The minefield now contains 4900 mine units and is 70 light years in radius.";

    fn lay(id: u32, turn: u32, field: i32, owner: u32, x: i32, y: i32, units: i32) -> Message {
        let radius = (units as f64).sqrt() as i32;
        let mut msg = message(
            id,
            3,
            turn,
            field,
            &format!(
                "We have converted our torpedoes into deep space mines. \
                 The minefield now contains {} mine units and is {} light years in radius.",
                units, radius
            ),
        );
        msg.ownerid = owner;
        msg.x = x;
        msg.y = y;
        msg
    }

    fn field(id: u32, owner: u32, x: i32, y: i32, units: i32) -> Minefield {
        Minefield::new(id, owner, (x, y), false, false, units)
    }

    fn set(fields: Vec<Minefield>) -> MinefieldSet {
        fields.into_iter().map(|f| (f.id, f)).collect()
    }

    fn sweeper(id: u32, x: i32, y: i32, owner: u32) -> Ship {
        let mut s = ship(id, x, y, owner);
        s.mission = MISSION_MINE_SWEEP;
        s
    }

    #[test]
    fn lay_then_decay() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let msg = message(1, 3, 1, 5, LAY_4900);
        let (turn1, stats1) = tracker
            .advance_turn(1, &MinefieldSet::new(), &[&msg], &[])
            .unwrap();
        assert_eq!(turn1[&5].mine_units, 4900);
        assert_eq!(stats1.events_applied, 1);

        let (turn2, _) = tracker.advance_turn(2, &turn1, &[], &[]).unwrap();
        assert_eq!(turn2[&5].mine_units, 4654);
        assert_eq!(turn2[&5].radius, 68);
        // previous turn untouched
        assert_eq!(turn1[&5].mine_units, 4900);
    }

    #[test]
    fn equal_fields_annihilate() {
        let mut fields = set(vec![field(1, 1, 0, 0, 10), field(2, 2, 2, 0, 10)]);
        assert_eq!(fields[&1].radius, 3);
        let destroyed = handle_countermining(&mut fields);
        assert_eq!(fields[&1].mine_units, 0);
        assert_eq!(fields[&2].mine_units, 0);
        assert_eq!(destroyed, 20);
    }

    #[test]
    fn larger_field_survives() {
        let mut fields = set(vec![field(1, 1, 0, 0, 20), field(2, 2, 2, 0, 5)]);
        handle_countermining(&mut fields);
        assert_eq!(fields[&1].mine_units, 15);
        assert_eq!(fields[&2].mine_units, 0);
        assert_eq!(fields[&1].radius, 3);
    }

    #[test]
    fn countermining_ignores_allies_distance_and_kind() {
        let mut web = field(3, 2, 0, 0, 100);
        web.is_web = true;
        web.set_mines(100);
        let mut fields = set(vec![
            field(1, 1, 0, 0, 100),
            field(2, 1, 0, 0, 100),
            web,
            field(4, 3, 500, 500, 100),
        ]);
        assert_eq!(handle_countermining(&mut fields), 0);
        assert!(fields.values().all(|f| f.mine_units == 100));
    }

    #[test]
    fn countermining_during_turn_removes_empty_fields() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let a = lay(1, 1, 1, 1, 0, 0, 400);
        let b = lay(2, 1, 2, 2, 10, 0, 100);
        let (fields, stats) = tracker.advance_turn(1, &MinefieldSet::new(), &[&a, &b], &[]).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[&1].mine_units, 300);
        assert_eq!(stats.units_countermined, 200);
    }

    #[test]
    fn sweep_and_scan_set_units_without_decay() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let previous = set(vec![field(5, 1, 0, 0, 1000), field(6, 2, 1000, 1000, 1000)]);
        let sweep = message(
            3,
            4,
            2,
            5,
            "Firing beam weapons at random, wide setting to clear mines. 600 mines remain.",
        );
        let scan = message(4, 19, 2, 6, "We have detected an enemy minefield. It contains 512 mine units.");
        let (fields, _) = tracker.advance_turn(2, &previous, &[&sweep, &scan], &[]).unwrap();
        assert_eq!(fields[&5].mine_units, 600);
        assert_eq!(fields[&6].mine_units, 512);
    }

    #[test]
    fn scoop_subtracts_and_decays() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let previous = set(vec![field(5, 1, 0, 0, 1000)]);
        let scoop = message(
            3,
            4,
            2,
            -1,
            "We have scooped up mines from our minefield #5. 100 units have been converted into 25 torpedos.",
        );
        let (fields, _) = tracker.advance_turn(2, &previous, &[&scoop], &[]).unwrap();
        // 900 after the scoop, then 900 - 45 - 1
        assert_eq!(fields[&5].mine_units, 854);
    }

    #[test]
    fn collision_sets_radius() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let previous = set(vec![field(5, 1, 0, 0, 1000)]);
        let hit = message(
            3,
            3,
            2,
            5,
            "Minefield 5 has come in contact with the Omega Star Cluster and has been partly destroyed. It is now 12 light years accross.",
        );
        let (fields, _) = tracker.advance_turn(2, &previous, &[&hit], &[]).unwrap();
        assert_eq!(fields[&5].radius, 12);
        assert_eq!(fields[&5].mine_units, 144);
    }

    #[test]
    fn unknown_minefield_is_skipped() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let previous = set(vec![field(5, 1, 0, 0, 1000)]);
        let sweep = message(
            3,
            4,
            2,
            99,
            "Firing beam weapons at random, wide setting to clear mines. 10 mines remain.",
        );
        let (fields, stats) = tracker.advance_turn(2, &previous, &[&sweep], &[]).unwrap();
        assert_eq!(stats.events_skipped, 1);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[&5].mine_units, 949);
    }

    #[test]
    fn malformed_lay_aborts_turn() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let bad = message(
            3,
            3,
            2,
            5,
            "We have converted our torpedoes into deep space mines. The minefield is large.",
        );
        let err = tracker.advance_turn(2, &MinefieldSet::new(), &[&bad], &[]).unwrap_err();
        assert!(matches!(err, StarfoldError::MessageParse(_)), "{}", err);
    }

    #[test]
    fn robot_owner_scales_radius() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::from([1]));
        let msg = message(1, 3, 1, 5, LAY_4900);
        let (fields, _) = tracker.advance_turn(1, &MinefieldSet::new(), &[&msg], &[]).unwrap();
        assert!(fields[&5].is_robot_owned);
        assert_eq!(fields[&5].radius, 140);
    }

    #[test]
    fn sanity_check_evicts_unseen_fields() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let previous = set(vec![field(5, 1, 0, 0, 1000), field(6, 1, 2000, 2000, 1000)]);
        let a = sweeper(1, 100, 100, 2);
        let b = sweeper(2, 150, 0, 3);
        let own = sweeper(3, 0, 0, 1);

        let (fields, stats) = tracker.advance_turn(4, &previous, &[], &[&a, &b, &own]).unwrap();
        assert!(!fields.contains_key(&5));
        assert!(fields.contains_key(&6));
        assert_eq!(stats.sanity_evictions, 1);

        // not yet active before turn 4
        let (early, _) = tracker.advance_turn(3, &previous, &[], &[&a, &b]).unwrap();
        assert!(early.contains_key(&5));
    }

    #[test]
    fn sanity_check_spares_scanned_fields_and_idle_ships() {
        let tracker = MinefieldTracker::new(MinefieldSettings::default(), BTreeSet::new());
        let previous = set(vec![field(5, 1, 0, 0, 1000)]);
        let a = sweeper(1, 100, 100, 2);
        let mut b = sweeper(2, 150, 0, 3);
        b.neutronium = 0;
        let (fields, _) = tracker.advance_turn(5, &previous, &[], &[&a, &b]).unwrap();
        assert!(fields.contains_key(&5));

        let b = sweeper(2, 150, 0, 3);
        let scan = message(9, 19, 5, 5, "We have scanned our minefield. It contains 700 mine units.");
        let (fields, _) = tracker.advance_turn(5, &previous, &[&scan], &[&a, &b]).unwrap();
        assert_eq!(fields[&5].mine_units, 700);
    }

    #[test]
    fn reconstruct_from_history() {
        let mut history = GameHistory::new();
        let mut t1 = snapshot(1, 1);
        t1.messages = vec![message(1, 3, 1, 5, LAY_4900)];
        let mut t2 = snapshot(2, 2);
        t2.players = vec![PlayerInfo { id: 2, raceid: ROBOT_RACE_ID, username: String::new() }];
        let t3 = snapshot(1, 3);
        history.insert(1, 1, t1);
        history.insert(2, 2, t2);
        history.insert(1, 3, t3);

        let timeline = reconstruct(&history, MinefieldSettings::default()).unwrap();
        assert_eq!(timeline.last_turn(), Some(3));
        assert_eq!(timeline.at(2).unwrap().minefields[&5].mine_units, 4654);
        assert_eq!(timeline.at(3).unwrap().statistics.live_fields, 1);

        let mut partial = MinefieldTimeline::default();
        partial.turns.insert(1, timeline.at(1).unwrap().clone());
        let added = partial.extend(&history, MinefieldSettings::default()).unwrap();
        assert_eq!(added, 2);
        assert_eq!(partial, timeline);
    }
}
