use std::cmp::Reverse;

use serde::Serialize;

use crate::econ::{calc_auto_tax, AutoTaxPolicy, ColonistRace, Colony, PlanetResources, TaxationWarning};
use crate::error::{Result, StarfoldError};
use crate::galaxy::{Planet, Ship, TurnSnapshot};
use crate::space::Cluster;

/// One owned planet with the cargo of the player's ships in orbit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconRow {
    /// Clique index; 0 for isolated planets.
    pub sector: usize,
    /// Planet id of the allocated starbase, 0 when out of reach.
    pub starbase: u32,
    pub planet_id: u32,
    pub planet_name: String,
    pub temperature: i32,
    pub has_starbase: bool,
    pub megacredits: i32,
    pub supplies: i32,
    /// Planet stock only; ship fuel is not counted.
    pub neutronium: i32,
    pub duranium: i32,
    pub tritanium: i32,
    pub molybdenum: i32,
    pub ship_ids: Vec<u32>,
}

fn econ_row(planet: &Planet, ships: &[&Ship], sector: usize, starbase: u32, has_starbase: bool) -> EconRow {
    let cargo = |on_planet: i32, pick: fn(&Ship) -> i32| {
        on_planet + ships.iter().map(|s| pick(s)).sum::<i32>()
    };
    EconRow {
        sector,
        starbase,
        planet_id: planet.id,
        planet_name: planet.name.clone(),
        temperature: planet.temp,
        has_starbase,
        megacredits: cargo(planet.megacredits, |s| s.megacredits),
        supplies: cargo(planet.supplies, |s| s.supplies),
        neutronium: planet.neutronium,
        duranium: cargo(planet.duranium, |s| s.duranium),
        tritanium: cargo(planet.tritanium, |s| s.tritanium),
        molybdenum: cargo(planet.molybdenum, |s| s.molybdenum),
        ship_ids: ships.iter().map(|s| s.id).collect(),
    }
}

/// Economy overview of the viewing player's planets, grouped by sector and
/// starbase (highest first), then by planet id.
pub fn build_econ_report(cluster: &Cluster, max_hops: u32) -> Vec<EconRow> {
    let turn = cluster.turn();
    let player = turn.player_id();
    let ships = cluster.ships_by_planets(Some(player));
    let allocation = cluster.allocate_planets_to_starbases(max_hops);
    let starbase_planets: Vec<u32> = turn
        .starbases(Some(player))
        .iter()
        .map(|sb| sb.planetid)
        .collect();

    let mut rows: Vec<EconRow> = turn
        .planets(Some(player))
        .map(|p| {
            let on_planet = ships.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
            econ_row(
                p,
                on_planet,
                cluster.sector_of(p.id).unwrap_or(0),
                allocation.get(&p.id).copied().unwrap_or(0),
                starbase_planets.contains(&p.id),
            )
        })
        .collect();
    rows.sort_by_key(|r| (Reverse(r.sector), Reverse(r.starbase), r.planet_id));
    rows
}

/// Projected state of one colony after a future turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub turn: u32,
    pub clans: i32,
    pub native_clans: i32,
    pub colonist_happiness: i32,
    pub native_happiness: i32,
    pub megacredits: i32,
    pub supplies: i32,
    /// Native tax rate in force during the turn.
    pub native_tax_rate: i32,
    pub minerals: PlanetResources,
    pub warnings: Vec<TaxationWarning>,
}

/// Project a planet's colony `turns` turns ahead. With an auto-tax policy the
/// native tax rate is re-chosen before every turn.
pub fn build_forecast(
    turn: &TurnSnapshot,
    planet_id: u32,
    turns: usize,
    hiss_effect: i32,
    nebula_bonus: bool,
    policy: Option<AutoTaxPolicy>,
) -> Result<Vec<ForecastRow>> {
    let planet = turn
        .planet(planet_id)
        .ok_or(StarfoldError::UnknownPlanet(planet_id))?;
    let race = ColonistRace::from_name(turn.player_race_name().unwrap_or_default());
    let colony = Colony::from_planet(planet, race);
    let mut minerals = PlanetResources::from_planet(planet);

    let steps: Vec<(i32, Colony, Vec<TaxationWarning>)> = match policy {
        None => colony
            .project(turns, hiss_effect, nebula_bonus)
            .into_iter()
            .map(|(next, warnings)| (colony.native_tax_rate, next, warnings))
            .collect(),
        Some(policy) => {
            let mut out = Vec::with_capacity(turns);
            let mut current = colony;
            for _ in 0..turns {
                current.native_tax_rate = calc_auto_tax(&current, policy);
                let (next, warnings) = current.advance(hiss_effect, nebula_bonus);
                out.push((current.native_tax_rate, next.clone(), warnings));
                current = next;
            }
            out
        }
    };

    let rows = steps
        .into_iter()
        .zip(1u32..)
        .map(|((native_tax_rate, colony, warnings), offset)| {
            minerals = minerals.update_mining(colony.mines);
            ForecastRow {
                turn: turn.turn() + offset,
                clans: colony.clans,
                native_clans: colony.native_clans,
                colonist_happiness: colony.colonist_happiness,
                native_happiness: colony.native_happiness,
                megacredits: colony.megacredits,
                supplies: colony.supplies,
                native_tax_rate,
                minerals,
                warnings,
            }
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::fixtures::{planet, ship, snapshot};
    use crate::galaxy::Starbase;

    fn starbase(id: u32, planet_id: u32, tech: i32) -> Starbase {
        Starbase {
            id,
            planetid: planet_id,
            enginetechlevel: tech,
            hulltechlevel: tech,
            beamtechlevel: tech,
            torptechlevel: tech,
        }
    }

    /// Two sectors: planets 1-3 in a chain near the origin, 4-5 far away,
    /// and planet 6 isolated.
    fn econ_turn() -> TurnSnapshot {
        let mut turn = snapshot(1, 20);
        turn.planets = vec![
            planet(1, 1000, 1000, 1),
            planet(2, 1060, 1000, 1),
            planet(3, 1120, 1000, 1),
            planet(4, 1500, 1500, 1),
            planet(5, 1550, 1500, 1),
            planet(6, 1800, 500, 1),
            planet(7, 1180, 1000, 2),
        ];
        turn.starbases = vec![starbase(1, 1, 5), starbase(2, 4, 2)];
        let mut freighter = ship(10, 1060, 1000, 1);
        freighter.megacredits = 500;
        freighter.supplies = 30;
        freighter.duranium = 7;
        freighter.neutronium = 80;
        let mut second = ship(11, 1060, 1000, 1);
        second.megacredits = 5;
        turn.ships = vec![freighter, second, ship(12, 1060, 1000, 2), ship(13, 1200, 1200, 1)];
        turn
    }

    #[test]
    fn rows_cover_owned_planets_only() {
        let turn = econ_turn();
        let cluster = Cluster::from_turn(&turn, 81.5).unwrap();
        let rows = build_econ_report(&cluster, 3);
        let ids: Vec<u32> = rows.iter().map(|r| r.planet_id).collect();
        assert_eq!(ids.len(), 6);
        assert!(!ids.contains(&7));
    }

    #[test]
    fn rows_sorted_by_sector_then_starbase_descending() {
        let turn = econ_turn();
        let cluster = Cluster::from_turn(&turn, 81.5).unwrap();
        let rows = build_econ_report(&cluster, 3);
        let keys: Vec<(usize, u32, u32)> =
            rows.iter().map(|r| (r.sector, r.starbase, r.planet_id)).collect();
        let mut expected = keys.clone();
        expected.sort_by_key(|&(s, b, id)| (Reverse(s), Reverse(b), id));
        assert_eq!(keys, expected);
        // isolated planet comes last
        assert_eq!(rows.last().map(|r| (r.planet_id, r.sector)), Some((6, 0)));
    }

    #[test]
    fn ship_cargo_summed_except_fuel() {
        let turn = econ_turn();
        let cluster = Cluster::from_turn(&turn, 81.5).unwrap();
        let rows = build_econ_report(&cluster, 3);
        let row = rows.iter().find(|r| r.planet_id == 2).unwrap();
        assert_eq!(row.megacredits, 100 + 500 + 5);
        assert_eq!(row.supplies, 50 + 30);
        assert_eq!(row.duranium, 20 + 7);
        assert_eq!(row.neutronium, 10);
        assert_eq!(row.ship_ids, vec![10, 11]);
        assert_eq!(row.starbase, 1);
        assert!(!row.has_starbase);
    }

    #[test]
    fn starbase_allocation_reported() {
        let turn = econ_turn();
        let cluster = Cluster::from_turn(&turn, 81.5).unwrap();
        let rows = build_econ_report(&cluster, 3);
        let by_id = |id: u32| rows.iter().find(|r| r.planet_id == id).unwrap();
        assert_eq!(by_id(1).starbase, 1);
        assert!(by_id(1).has_starbase);
        assert_eq!(by_id(3).starbase, 1);
        assert_eq!(by_id(5).starbase, 4);
        assert_eq!(by_id(6).starbase, 0);
    }

    #[test]
    fn forecast_unknown_planet_is_an_error() {
        let turn = econ_turn();
        assert!(matches!(
            build_forecast(&turn, 99, 5, 0, false, None).unwrap_err(),
            StarfoldError::UnknownPlanet(99)
        ));
    }

    #[test]
    fn forecast_rows_follow_turns() {
        let turn = econ_turn();
        let rows = build_forecast(&turn, 1, 4, 0, false, None).unwrap();
        assert_eq!(rows.len(), 4);
        let turns: Vec<u32> = rows.iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![21, 22, 23, 24]);
        assert!(rows.iter().all(|r| r.colonist_happiness <= 100));
        assert!(rows.windows(2).all(|w| w[1].megacredits >= w[0].megacredits));
        // mining only ever adds to orbital stocks
        assert!(rows[0].minerals.duranium.orbital >= 20);
    }

    #[test]
    fn forecast_with_policy_sets_native_tax() {
        let mut turn = econ_turn();
        if let Some(p) = turn.planets.iter_mut().find(|p| p.id == 1) {
            p.nativeclans = 20000;
            p.nativeracename = "Humanoid".to_string();
            p.nativegovernment = 5;
            p.nativehappypoints = 100;
        }
        let rows = build_forecast(&turn, 1, 3, 0, false, Some(AutoTaxPolicy::Growth)).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| (0..=100).contains(&r.native_tax_rate)));
        assert!(rows[0].native_tax_rate > 0);
    }
}
