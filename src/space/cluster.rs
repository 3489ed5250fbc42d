use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::galaxy::{Ship, Starbase, TurnSnapshot};
use crate::space::geometry::{distance, warp_well_points};
use crate::space::kdtree::{KdTree, SpatialPoint};
use crate::space::map::SphericalMap;
use crate::Result;

/// Warp 9 travel distance per turn.
pub const MAX_JUMP_DISTANCE: f64 = 81.5;
/// Planets further than this many hops from a starbase are not allocated to it.
pub const MAX_STARBASE_HOPS: u32 = 3;

/// One-hop neighbours per planet as `(distance, planet id)`, nearest first.
pub type Neighbours = BTreeMap<u32, Vec<(f64, u32)>>;

/// Planet sets connected by chained jumps. Index 0 holds every isolated planet.
pub type Cliques = Vec<BTreeSet<u32>>;

/// Hop counts: `paths[from][to]`, only within a clique.
pub type ShortestPaths = BTreeMap<u32, BTreeMap<u32, u32>>;

/// Find the planets reachable from each planet in one jump.
///
/// A candidate from the coarse search at `max_jump + 5` only counts when one
/// of its warp-well points lies within `max_jump + 0.5` of the source (or a
/// mirror image of the source on a wrapped map).
pub fn build_neighbours(
    planets: &[SpatialPoint],
    map: Option<&SphericalMap>,
    max_jump: f64,
) -> Neighbours {
    let tree = KdTree::build(planets);
    let by_id: BTreeMap<u32, SpatialPoint> = planets.iter().map(|p| (p.id, *p)).collect();

    planets
        .par_iter()
        .map(|root| {
            let sources: Vec<(i32, i32)> = match map {
                Some(map) => map.project(root.xy()).to_vec(),
                None => vec![root.xy()],
            };

            // closest projection per candidate
            let mut candidates: BTreeMap<u32, ((i32, i32), f64)> = BTreeMap::new();
            for source in sources {
                for (d, p) in tree.range_search(source, max_jump + 5.0) {
                    if p.id == root.id {
                        continue;
                    }
                    let closer = candidates.get(&p.id).is_none_or(|(_, best)| *best > d);
                    if closer {
                        candidates.insert(p.id, (source, d));
                    }
                }
            }

            let mut reachable: Vec<(f64, u32)> = candidates
                .into_iter()
                .filter_map(|(id, (source, _))| {
                    let target = by_id.get(&id)?;
                    warp_well_points(target.xy())
                        .map(|w| distance(source, w))
                        .find(|d| *d < max_jump + 0.5)
                        .map(|d| (d, id))
                })
                .collect();
            reachable.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            (root.id, reachable)
        })
        .collect()
}

/// Partition planets into connected sets. Planets without neighbours all go
/// into the first set.
pub fn build_cliques(neighbours: &Neighbours) -> Cliques {
    let mut cliques: Cliques = vec![BTreeSet::new()];
    let mut visited: BTreeSet<u32> = BTreeSet::new();

    for &lead in neighbours.keys() {
        if !visited.insert(lead) {
            continue;
        }
        let mut clique = BTreeSet::from([lead]);
        let mut frontier = vec![lead];
        while let Some(p) = frontier.pop() {
            for &(_, q) in neighbours.get(&p).map(Vec::as_slice).unwrap_or(&[]) {
                if visited.insert(q) {
                    clique.insert(q);
                    frontier.push(q);
                }
            }
        }
        if clique.len() == 1 {
            cliques[0].insert(lead);
        } else {
            cliques.push(clique);
        }
    }
    cliques
}

fn hop_counts(start: u32, neighbours: &Neighbours) -> BTreeMap<u32, u32> {
    let mut steps = BTreeMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        let here = steps[&node];
        for &(_, next) in neighbours.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
            steps.entry(next).or_insert_with(|| {
                queue.push_back(next);
                here + 1
            });
        }
    }
    steps
}

/// Breadth-first hop counts from every planet to every planet of its clique.
pub fn shortest_paths(cliques: &Cliques, neighbours: &Neighbours) -> ShortestPaths {
    let mut paths: ShortestPaths = cliques
        .first()
        .into_iter()
        .flatten()
        .map(|&p| (p, BTreeMap::from([(p, 0)])))
        .collect();

    let starts: Vec<u32> = cliques.iter().skip(1).flatten().copied().collect();
    let connected: ShortestPaths = starts
        .par_iter()
        .map(|&start| (start, hop_counts(start, neighbours)))
        .collect();
    paths.extend(connected);
    paths
}

/// Assign owned planets to the nearest owned starbase within `max_hops`.
///
/// Starbases claim planets in descending order of total tech level; a later
/// starbase only takes a planet over when it is strictly closer, so ties go to
/// the better-equipped base. Returns planet id -> starbase planet id.
pub fn allocate_planets_to_starbases(
    paths: &ShortestPaths,
    owned_planets: &BTreeSet<u32>,
    starbases: &[&Starbase],
    max_hops: u32,
) -> BTreeMap<u32, u32> {
    let mut ranked: Vec<(i32, u32)> = starbases
        .iter()
        .map(|sb| (sb.total_tech(), sb.planetid))
        .collect();
    ranked.sort_unstable_by(|a, b| b.cmp(a));

    let mut allocation: BTreeMap<u32, u32> = BTreeMap::new();
    for (_, base) in ranked {
        let Some(reach) = paths.get(&base) else {
            warn!(planet_id = base, "Starbase planet missing from path table, skipping");
            continue;
        };
        for (&planet, &hops) in reach {
            if hops > max_hops || !owned_planets.contains(&planet) {
                continue;
            }
            let replace = match allocation.get(&planet) {
                None => true,
                Some(prev) => paths
                    .get(prev)
                    .and_then(|from_prev| from_prev.get(&planet))
                    .is_none_or(|&prev_hops| prev_hops > hops),
            };
            if replace {
                allocation.insert(planet, base);
            }
        }
    }
    allocation
}

/// Jump-connectivity of one player's view of the galaxy.
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    turn: &'a TurnSnapshot,
    pub map: SphericalMap,
    tree: KdTree,
    pub neighbours: Neighbours,
    pub cliques: Cliques,
    pub paths: ShortestPaths,
}

impl<'a> Cluster<'a> {
    pub fn from_turn(turn: &'a TurnSnapshot, max_jump: f64) -> Result<Self> {
        let map = SphericalMap::from_settings(&turn.settings)?;
        let points: Vec<SpatialPoint> = turn
            .planets(None)
            .map(|p| SpatialPoint::new(p.id, p.x, p.y))
            .collect();
        let tree = KdTree::build(&points);
        let neighbours = build_neighbours(&points, Some(&map), max_jump);
        let cliques = build_cliques(&neighbours);
        let paths = shortest_paths(&cliques, &neighbours);
        debug!(
            turn = turn.turn(),
            planets = points.len(),
            sectors = cliques.len() - 1,
            isolated = cliques[0].len(),
            "Cluster built"
        );
        Ok(Cluster {
            turn,
            map,
            tree,
            neighbours,
            cliques,
            paths,
        })
    }

    pub fn turn(&self) -> &'a TurnSnapshot {
        self.turn
    }

    /// Index into `cliques` of the set holding `planet_id`. 0 means isolated.
    pub fn sector_of(&self, planet_id: u32) -> Option<usize> {
        self.cliques.iter().position(|c| c.contains(&planet_id))
    }

    /// Ships sitting exactly on a planet, keyed by planet id. Ships in deep
    /// space are left out.
    pub fn ships_by_planets(&self, owner: Option<u32>) -> BTreeMap<u32, Vec<&'a Ship>> {
        let mut by_planet: BTreeMap<u32, Vec<&'a Ship>> = BTreeMap::new();
        for ship in self.turn.ships(owner) {
            if let Some((_, planet)) = self.tree.range_search((ship.x, ship.y), 0.0).first() {
                by_planet.entry(planet.id).or_default().push(ship);
            }
        }
        by_planet
    }

    /// Allocation of the viewing player's planets to their starbases.
    pub fn allocate_planets_to_starbases(&self, max_hops: u32) -> BTreeMap<u32, u32> {
        let player = self.turn.player_id();
        let owned: BTreeSet<u32> = self.turn.planets(Some(player)).map(|p| p.id).collect();
        let starbases = self.turn.starbases(Some(player));
        allocate_planets_to_starbases(&self.paths, &owned, &starbases, max_hops)
    }
}
