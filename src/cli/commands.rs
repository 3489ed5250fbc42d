use std::path::Path;

use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::econ::AutoTaxPolicy;
use crate::galaxy::{GameHistory, TurnSnapshot};
use crate::minefield::{MinefieldSettings, Resume, SavedTimeline};
use crate::persistence::{self, SnapshotStore};
use crate::report::{
    build_econ_report, build_forecast, build_freighter_report, build_milint_report,
    freighter_layer, freighter_sightings, milint_layer, minefield_layer, owner_colour,
    sector_layer, MilintQuery,
};
use crate::space::Cluster;

/// Which player's view of which turn a command looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnSelector {
    pub player: Option<u32>,
    pub turn: Option<u32>,
}

pub fn load_history(config: &AnalysisConfig) -> Result<GameHistory, String> {
    persistence::load_turn_directory(Path::new(&config.turn_directory))
        .map_err(|e| format!("Failed to load turns: {}", e))
}

/// Resolve a selector to one snapshot. Without a player the lowest player id
/// is used; without a turn, that player's latest.
pub fn select_turn(history: &GameHistory, selector: TurnSelector) -> Result<&TurnSnapshot, String> {
    let player = match selector.player {
        Some(p) => p,
        None => history
            .players()
            .into_iter()
            .next()
            .ok_or_else(|| "No players in turn history".to_string())?,
    };
    let snapshot = match selector.turn {
        Some(t) => history.turn(player, t),
        None => history.latest_for(player),
    };
    snapshot.ok_or_else(|| match selector.turn {
        Some(t) => format!("No turn {} for player {}", t, player),
        None => format!("No turns for player {}", player),
    })
}

fn write_overlay(path: &str, json: String) -> Result<(), String> {
    std::fs::write(path, json).map_err(|e| format!("Cannot write {}: {}", path, e))?;
    println!("Overlay written to {}", path);
    Ok(())
}

/// Bring the minefield timeline up to date with the turn files, resuming
/// from the newest saved snapshot when its inputs still match.
pub fn update_timeline(
    config: &AnalysisConfig,
    history: &GameHistory,
) -> Result<SavedTimeline, String> {
    let store = SnapshotStore::from_config(config);
    let saved = store.latest().unwrap_or_else(|e| {
        warn!(error = %e, "Cannot read minefield snapshots, reconstructing from turn 1");
        None
    });
    let (resumed, how) =
        SavedTimeline::resume(saved, history, MinefieldSettings::from_config(config))
            .map_err(|e| format!("Minefield reconstruction failed: {}", e))?;
    match how {
        Resume::Extended { added } => info!(added, "Minefield timeline extended"),
        Resume::Rebuilt { reason } => info!(
            reason = ?reason,
            turns = resumed.timeline.turns.len(),
            "Minefield timeline reconstructed"
        ),
    }
    Ok(resumed)
}

/// Reconstruct minefields and print the fields alive at one turn.
pub fn minefields(
    config: &AnalysisConfig,
    turn: Option<u32>,
    save: bool,
    overlay: Option<&str>,
) -> Result<(), String> {
    let history = load_history(config)?;
    let saved = update_timeline(config, &history)?;
    let timeline = &saved.timeline;

    let state = match turn {
        Some(t) => timeline.at(t),
        None => timeline.latest(),
    }
    .ok_or_else(|| match turn {
        Some(t) => format!("Turn {} has not been reconstructed", t),
        None => "No turns reconstructed".to_string(),
    })?;
    let stats = &state.statistics;

    println!("=== Minefields (turn {}) ===", stats.turn);
    println!(
        "Live: {} ({} web) | Units: {} | Largest radius: {}",
        stats.live_fields, stats.web_fields, stats.total_units, stats.largest_radius
    );
    println!(
        "Events: {} applied, {} skipped | Countermined: {} | Sanity evictions: {}",
        stats.events_applied, stats.events_skipped, stats.units_countermined, stats.sanity_evictions
    );
    println!();
    println!("--- Units by owner ---");
    for (owner, units) in &stats.units_by_owner {
        println!("  Player {}: {}", owner, units);
    }
    println!();
    println!("--- Fields ---");
    if state.minefields.is_empty() {
        println!("  (none)");
    }
    for field in state.minefields.values() {
        println!("  {}", field);
    }

    if save {
        let path = SnapshotStore::from_config(config)
            .save(&saved)
            .map_err(|e| format!("Cannot save snapshot: {}", e))?;
        println!("\nSnapshot saved to {}", path.display());
    }

    if let Some(path) = overlay {
        let layer = minefield_layer(&format!("Minefields T{}", stats.turn), &state.minefields);
        let json = layer.to_json().map_err(|e| format!("Cannot encode overlay: {}", e))?;
        write_overlay(path, json)?;
    }

    Ok(())
}

/// Print jump-connected sectors and the starbase each owned planet falls to.
pub fn sectors(
    config: &AnalysisConfig,
    selector: TurnSelector,
    overlay: Option<&str>,
) -> Result<(), String> {
    let history = load_history(config)?;
    let turn = select_turn(&history, selector)?;
    let cluster = Cluster::from_turn(turn, config.max_jump_distance).map_err(|e| e.to_string())?;
    let allocation = cluster.allocate_planets_to_starbases(config.max_starbase_hops);

    println!(
        "=== Sectors (player {}, turn {}) ===",
        turn.player_id(),
        turn.turn()
    );
    println!("Map: {}", cluster.map);
    println!();
    for (index, sector) in cluster.cliques.iter().enumerate() {
        let label = if index == 0 {
            "Isolated".to_string()
        } else {
            format!("Sector {}", index)
        };
        let ids: Vec<String> = sector.iter().map(|id| format!("P{}", id)).collect();
        println!("{:<10} {:>4}  {}", label, sector.len(), ids.join(" "));
    }

    println!();
    println!("--- Starbase allocation ---");
    if allocation.is_empty() {
        println!("  (none)");
    }
    for (planet, base) in &allocation {
        let hops = cluster
            .paths
            .get(base)
            .and_then(|reach| reach.get(planet))
            .copied()
            .unwrap_or(0);
        println!("  P{} -> starbase at P{} ({} hops)", planet, base, hops);
    }

    if let Some(path) = overlay {
        let layer = sector_layer(&format!("Sectors T{}", turn.turn()), &cluster);
        let json = layer.to_json().map_err(|e| format!("Cannot encode overlay: {}", e))?;
        write_overlay(path, json)?;
    }

    Ok(())
}

/// Print the economy table for the owned planets of one turn.
pub fn econ(config: &AnalysisConfig, selector: TurnSelector) -> Result<(), String> {
    let history = load_history(config)?;
    let turn = select_turn(&history, selector)?;
    let cluster = Cluster::from_turn(turn, config.max_jump_distance).map_err(|e| e.to_string())?;
    let rows = build_econ_report(&cluster, config.max_starbase_hops);

    println!("=== Econ (player {}, turn {}) ===", turn.player_id(), turn.turn());
    println!(
        "{:>6} {:>8} {:<24} {:>7} {:>8} {:>6} {:>6} {:>6} {:>6}  {}",
        "Sector", "Starbase", "Planet", "MCr", "Supplies", "Neu", "Dur", "Tri", "Mol", "Ships"
    );
    println!("{}", "-".repeat(100));
    for row in &rows {
        let marker = if row.has_starbase { "*" } else { " " };
        let planet = format!("{}P{}-{}", marker, row.planet_id, row.planet_name);
        let ships: Vec<String> = row.ship_ids.iter().map(|id| format!("S{}", id)).collect();
        println!(
            "{:>6} {:>8} {:<24} {:>7} {:>8} {:>6} {:>6} {:>6} {:>6}  {}",
            row.sector,
            row.starbase,
            planet,
            row.megacredits,
            row.supplies,
            row.neutronium,
            row.duranium,
            row.tritanium,
            row.molybdenum,
            ships.join(" ")
        );
    }
    println!("\n{} planet(s)", rows.len());
    Ok(())
}

/// Options for the colony forecast.
#[derive(Debug, Clone, Default)]
pub struct ForecastOptions {
    pub turns: Option<usize>,
    pub hiss_effect: i32,
    pub nebula_bonus: bool,
    pub policy: Option<String>,
}

/// Print a turn-by-turn forecast for one planet.
pub fn colony(
    config: &AnalysisConfig,
    selector: TurnSelector,
    planet_id: u32,
    options: &ForecastOptions,
) -> Result<(), String> {
    let policy = options
        .policy
        .as_deref()
        .map(str::parse::<AutoTaxPolicy>)
        .transpose()
        .map_err(|e| e.to_string())?;
    let history = load_history(config)?;
    let turn = select_turn(&history, selector)?;
    let turns = options.turns.unwrap_or(config.forecast_turns);
    let rows = build_forecast(
        turn,
        planet_id,
        turns,
        options.hiss_effect,
        options.nebula_bonus,
        policy,
    )
    .map_err(|e| e.to_string())?;

    let policy_label = policy.map_or("manual".to_string(), |p| p.to_string());
    println!("=== Colony P{} (from turn {}, {}) ===", planet_id, turn.turn(), policy_label);
    println!(
        "{:>5} {:>8} {:>8} {:>5} {:>5} {:>4} {:>7} {:>8}  {}",
        "Turn", "Clans", "Natives", "CHap", "NHap", "NTax", "MCr", "Supplies", "Warnings"
    );
    println!("{}", "-".repeat(80));
    for row in &rows {
        let warnings: Vec<String> = row.warnings.iter().map(|w| w.to_string()).collect();
        println!(
            "{:>5} {:>8} {:>8} {:>5} {:>5} {:>4} {:>7} {:>8}  {}",
            row.turn,
            row.clans,
            row.native_clans,
            row.colonist_happiness,
            row.native_happiness,
            row.native_tax_rate,
            row.megacredits,
            row.supplies,
            warnings.join(" ")
        );
    }
    if let Some(last) = rows.last() {
        println!();
        println!("--- Minerals after turn {} (orbital / ground) ---", last.turn);
        for (name, stock) in last.minerals.stocks() {
            println!("  {:<11} {:>6} / {:>6}", name, stock.orbital, stock.ground);
        }
    }
    Ok(())
}

/// Print every sighting of one player's freighters in the viewer's turns.
pub fn freighters(
    config: &AnalysisConfig,
    viewer: Option<u32>,
    player_id: u32,
    overlay: Option<&str>,
) -> Result<(), String> {
    let history = load_history(config)?;
    let latest = select_turn(&history, TurnSelector { player: viewer, turn: None })?;
    let viewer = latest.player_id();
    let rows = build_freighter_report(&history, viewer, player_id);

    println!("=== Freighters of player {} (seen by player {}) ===", player_id, viewer);
    println!(
        "{:>4} {:<28} {:<10} {:<10} {:>4} {:>6}  {}",
        "T", "Ship", "Loc", "Tgt", "Warp", "Mass", "Hull"
    );
    println!("{}", "-".repeat(80));
    for row in &rows {
        println!(
            "{:>4} {:<28} {:<10} {:<10} {:>4} {:>6}  {}",
            row.turn, row.ship, row.location, row.target, row.warp, row.mass, row.hull
        );
    }
    println!("\n{} sighting(s)", rows.len());

    if let Some(path) = overlay {
        let colour = latest
            .diplomacy_colour(player_id)
            .unwrap_or_else(|| owner_colour(player_id).to_string());
        let sightings = freighter_sightings(&history, viewer, player_id);
        let layer = freighter_layer(&sightings, &colour, latest.turn());
        let json = layer.to_json().map_err(|e| format!("Cannot encode overlay: {}", e))?;
        write_overlay(path, json)?;
    }
    Ok(())
}

/// Search area for the military intelligence report.
#[derive(Debug, Clone, Copy)]
pub struct MilintOptions {
    pub viewer: Option<u32>,
    pub target: u32,
    pub from_turn: u32,
    pub x: i32,
    pub y: i32,
    pub radius: f64,
}

/// Print the latest sighting of each of one enemy's ships near a point.
pub fn milint(
    config: &AnalysisConfig,
    options: MilintOptions,
    overlay: Option<&str>,
) -> Result<(), String> {
    let history = load_history(config)?;
    let viewer = select_turn(&history, TurnSelector { player: options.viewer, turn: None })?
        .player_id();
    let query = MilintQuery {
        viewer,
        target: options.target,
        from_turn: options.from_turn,
        centre: (options.x, options.y),
        radius: options.radius,
    };
    let rows = build_milint_report(&history, &query);

    println!(
        "=== MilInt: player {} within {} ly of ({}, {}) from turn {} ===",
        query.target, query.radius, options.x, options.y, query.from_turn
    );
    println!(
        "{:<22} {:<20} {:>4} {:<10} {:>4} {:<11} {:>5}  {}",
        "Ship", "Name", "T", "Loc", "Eng", "Mass", "Moved", "Note"
    );
    println!("{}", "-".repeat(90));
    for row in &rows {
        let loc = format!("{},{}", row.position.0, row.position.1);
        println!(
            "{:<22} {:<20} {:>4} {:<10} {:>4} {:<11} {:>5}  {}",
            row.label, row.name, row.turn, loc, row.engine, row.mass_range, row.moved, row.note
        );
    }
    println!("\n{} ship(s)", rows.len());

    if let Some(path) = overlay {
        let json = milint_layer(&rows)
            .to_json()
            .map_err(|e| format!("Cannot encode overlay: {}", e))?;
        write_overlay(path, json)?;
    }
    Ok(())
}

/// List saved minefield timeline snapshots.
pub fn list_snapshots(config: &AnalysisConfig) -> Result<(), String> {
    let store = SnapshotStore::from_config(config);
    let snapshot_dir = store.dir();
    let snapshots = store
        .entries()
        .map_err(|e| format!("Error listing snapshots: {}", e))?;

    if snapshots.is_empty() {
        println!("No snapshots found in {}", snapshot_dir.display());
        return Ok(());
    }

    println!("{:<40} {:>8} {:>12}", "File", "Turn", "Size");
    println!("{}", "-".repeat(62));
    for s in &snapshots {
        let name = s.path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        println!("{:<40} {:>8} {:>9} KB", name, s.last_turn, s.file_size / 1024);
    }
    println!("\n{} snapshot(s) in {}", snapshots.len(), snapshot_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::fixtures::{message, planet, ship, snapshot};
    use crate::minefield::reconstruct;
    use crate::persistence::turn_filename;
    use tempfile::TempDir;

    const LAY_400: &str = "We have converted our torpedoes into deep space mines. \
        The minefield now contains 400 mine units and is 20 light years in radius.";

    fn game_dir() -> (TempDir, AnalysisConfig) {
        let dir = TempDir::new().unwrap();
        let turns = dir.path().join("turns");
        std::fs::create_dir_all(&turns).unwrap();
        for t in 1..=3 {
            let mut snap = snapshot(1, t);
            snap.planets = vec![
                planet(1, 1000, 1000, 1),
                planet(2, 1050, 1000, 1),
                planet(3, 1800, 500, 0),
            ];
            if t == 1 {
                snap.messages = vec![message(11, 3, 1, 21, LAY_400)];
            }
            if t == 3 {
                snap.ships = vec![ship(50, 1020, 1000, 2)];
            }
            std::fs::write(
                turns.join(turn_filename(1, t)),
                serde_json::to_string(&snap).unwrap(),
            )
            .unwrap();
        }
        let config = AnalysisConfig {
            turn_directory: turns.display().to_string(),
            snapshot_directory: dir.path().join("snapshots").display().to_string(),
            ..AnalysisConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn select_turn_defaults_to_latest() {
        let (_dir, config) = game_dir();
        let history = load_history(&config).unwrap();
        let snap = select_turn(&history, TurnSelector::default()).unwrap();
        assert_eq!(snap.turn(), 3);
        let snap = select_turn(&history, TurnSelector { player: Some(1), turn: Some(2) }).unwrap();
        assert_eq!(snap.turn(), 2);
        assert!(select_turn(&history, TurnSelector { player: Some(5), turn: None }).is_err());
    }

    #[test]
    fn minefields_saves_and_resumes() {
        let (_dir, config) = game_dir();
        minefields(&config, None, true, None).unwrap();
        let saved = SnapshotStore::from_config(&config).entries().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].last_turn, 3);

        let history = load_history(&config).unwrap();
        let resumed = update_timeline(&config, &history).unwrap();
        assert_eq!(resumed.timeline.last_turn(), Some(3));
        assert_eq!(resumed.timeline.at(1).map(|s| s.statistics.live_fields), Some(1));
    }

    #[test]
    fn late_turn_file_matches_full_reconstruction() {
        let (_dir, config) = game_dir();
        minefields(&config, None, true, None).unwrap();

        // another player's turn 2 arrives after the save
        let mut late = snapshot(2, 2);
        let mut lay = message(12, 3, 2, 22, LAY_400);
        lay.ownerid = 2;
        lay.x = 1900;
        late.messages = vec![lay];
        std::fs::write(
            Path::new(&config.turn_directory).join(turn_filename(2, 2)),
            serde_json::to_string(&late).unwrap(),
        )
        .unwrap();

        let history = load_history(&config).unwrap();
        let resumed = update_timeline(&config, &history).unwrap();
        let full = reconstruct(&history, MinefieldSettings::from_config(&config)).unwrap();
        assert_eq!(resumed.timeline, full);
        assert!(resumed.timeline.at(2).unwrap().minefields.contains_key(&22));
    }

    #[test]
    fn minefields_writes_overlay() {
        let (dir, config) = game_dir();
        let path = dir.path().join("overlay.json");
        minefields(&config, Some(1), false, path.to_str()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["markups"][0]["type"], "circle");
        assert_eq!(json["markups"][0]["r"], 20);
    }

    #[test]
    fn unknown_policy_rejected_before_loading() {
        let config = AnalysisConfig {
            turn_directory: "/nonexistent/turns".to_string(),
            ..AnalysisConfig::default()
        };
        let options = ForecastOptions {
            policy: Some("Greedy".to_string()),
            ..ForecastOptions::default()
        };
        let err = colony(&config, TurnSelector::default(), 1, &options).unwrap_err();
        assert!(err.contains("Greedy"));
    }

    #[test]
    fn reports_run_on_saved_turns() {
        let (_dir, config) = game_dir();
        sectors(&config, TurnSelector::default(), None).unwrap();
        econ(&config, TurnSelector::default()).unwrap();
        colony(&config, TurnSelector::default(), 1, &ForecastOptions::default()).unwrap();
        assert!(colony(&config, TurnSelector::default(), 42, &ForecastOptions::default()).is_err());
        list_snapshots(&config).unwrap();
    }

    #[test]
    fn fleet_reports_write_overlays() {
        let (dir, config) = game_dir();
        let freighter_path = dir.path().join("freighters.json");
        freighters(&config, None, 2, freighter_path.to_str()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&freighter_path).unwrap()).unwrap();
        assert_eq!(json["name"], "unknown Freighters");

        let milint_path = dir.path().join("milint.json");
        let options = MilintOptions {
            viewer: Some(1),
            target: 2,
            from_turn: 1,
            x: 1000,
            y: 1000,
            radius: 100.0,
        };
        milint(&config, options, milint_path.to_str()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&milint_path).unwrap()).unwrap();
        assert_eq!(json["name"], "MilInt");
        assert_eq!(json["markups"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["markups"][0]["text"], "T3 S50 Hull 15");
    }
}
