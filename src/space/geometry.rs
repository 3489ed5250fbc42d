//! Planar geometry on game coordinates (light years).
//!
//! Coordinates in the game are integers; distances are Euclidean in f64.
use glam::DVec2;

/// Discrete capture points of a warp well, relative to the planet centre.
/// A ship arriving on any of these points is pulled into orbit.
pub const WARP_WELL_OFFSETS: [(i32, i32); 19] = [
    (0, 0),
    (0, -3),
    (-3, 0),
    (0, 3),
    (3, 0),
    (-2, -2),
    (-2, 2),
    (2, 2),
    (2, -2),
    (-1, -2),
    (1, -2),
    (-2, -1),
    (2, -1),
    (-2, 1),
    (2, 1),
    (1, 2),
    (-1, 2),
    (0, 2),
    (0, -2),
];

pub fn to_vec(x: i32, y: i32) -> DVec2 {
    DVec2::new(x as f64, y as f64)
}

pub fn sq_distance(a: (i32, i32), b: (i32, i32)) -> f64 {
    to_vec(a.0, a.1).distance_squared(to_vec(b.0, b.1))
}

pub fn distance(a: (i32, i32), b: (i32, i32)) -> f64 {
    to_vec(a.0, a.1).distance(to_vec(b.0, b.1))
}

/// Shortest distance on a map that wraps around after `width` x `height`.
pub fn toroidal_distance(a: (i32, i32), b: (i32, i32), width: i32, height: i32) -> f64 {
    let wrap = |d: i32, span: i32| {
        if span <= 0 {
            return d.abs();
        }
        let d = d.rem_euclid(span);
        d.min(span - d)
    };
    let dx = wrap(a.0 - b.0, width);
    let dy = wrap(a.1 - b.1, height);
    DVec2::new(dx as f64, dy as f64).length()
}

/// The planet centre and its warp-well capture points.
pub fn warp_well_points(centre: (i32, i32)) -> impl Iterator<Item = (i32, i32)> {
    WARP_WELL_OFFSETS
        .iter()
        .map(move |(dx, dy)| (centre.0 + dx, centre.1 + dy))
}
