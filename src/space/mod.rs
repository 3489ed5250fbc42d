//! Jump-range connectivity between star systems: k-d tree search, warp-well
//! adjacency, sectors (cliques), hop counts and starbase catchment areas.

pub mod cluster;
pub mod geometry;
pub mod kdtree;
pub mod map;

pub use cluster::{
    allocate_planets_to_starbases, build_cliques, build_neighbours, shortest_paths, Cliques,
    Cluster, Neighbours, ShortestPaths, MAX_JUMP_DISTANCE, MAX_STARBASE_HOPS,
};
pub use kdtree::{KdTree, SpatialPoint};
pub use map::SphericalMap;
