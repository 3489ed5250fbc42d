use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::space::geometry::sq_distance;

/// A star system position indexed by the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialPoint {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

impl SpatialPoint {
    pub fn new(id: u32, x: i32, y: i32) -> Self {
        SpatialPoint { id, x, y }
    }

    pub fn xy(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn coord(&self, axis: usize) -> i32 {
        if axis == 0 { self.x } else { self.y }
    }
}

#[derive(Debug, Clone)]
struct Node {
    point: SpatialPoint,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static 2-d tree, median split on alternating axes. Nodes live in one arena.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

/// Max-heap entry ordered by squared distance, ties broken by id.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f64,
    point: SpatialPoint,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.point.id.cmp(&other.point.id))
    }
}

fn by_distance(a: &(f64, SpatialPoint), b: &(f64, SpatialPoint)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id))
}

impl KdTree {
    pub fn build(points: &[SpatialPoint]) -> Self {
        let mut nodes = Vec::with_capacity(points.len());
        let mut work = points.to_vec();
        let root = Self::build_node(&mut nodes, &mut work, 0);
        KdTree { nodes, root }
    }

    fn build_node(nodes: &mut Vec<Node>, points: &mut [SpatialPoint], depth: usize) -> Option<usize> {
        let axis = depth % 2;
        points.sort_by_key(|p| p.coord(axis));
        let median = points.len() / 2;
        let (below, rest) = points.split_at_mut(median);
        let (mid, above) = rest.split_first_mut()?;
        let point = *mid;
        let left = Self::build_node(nodes, below, depth + 1);
        let right = Self::build_node(nodes, above, depth + 1);
        nodes.push(Node { point, left, right });
        Some(nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All points within `max_distance` of `target`, nearest first.
    pub fn range_search(&self, target: (i32, i32), max_distance: f64) -> Vec<(f64, SpatialPoint)> {
        let max_sq = max_distance * max_distance;
        let mut found = Vec::new();
        let mut stack: Vec<(usize, usize)> = self.root.map(|r| (r, 0)).into_iter().collect();

        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            let dist_sq = sq_distance(target, node.point.xy());
            if dist_sq <= max_sq {
                found.push((dist_sq, node.point));
            }

            let axis = depth % 2;
            let diff = (if axis == 0 { target.0 } else { target.1 } - node.point.coord(axis)) as f64;
            let (near, far) = if diff < 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };
            if let Some(near) = near {
                stack.push((near, depth + 1));
            }
            if diff * diff <= max_sq {
                if let Some(far) = far {
                    stack.push((far, depth + 1));
                }
            }
        }

        let mut result: Vec<_> = found.into_iter().map(|(d, p)| (d.sqrt(), p)).collect();
        result.sort_by(by_distance);
        result
    }

    /// The `k` points nearest to `target`, nearest first.
    pub fn k_nearest(&self, target: (i32, i32), k: usize) -> Vec<(f64, SpatialPoint)> {
        if k == 0 {
            return Vec::new();
        }
        let mut best = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = self.root {
            self.nearest_from(root, 0, target, k, &mut best);
        }
        let mut result: Vec<_> = best
            .into_iter()
            .map(|c| (c.dist_sq.sqrt(), c.point))
            .collect();
        result.sort_by(by_distance);
        result
    }

    fn nearest_from(
        &self,
        idx: usize,
        depth: usize,
        target: (i32, i32),
        k: usize,
        best: &mut BinaryHeap<Candidate>,
    ) {
        let node = &self.nodes[idx];
        let candidate = Candidate {
            dist_sq: sq_distance(target, node.point.xy()),
            point: node.point,
        };
        if best.len() < k {
            best.push(candidate);
        } else if best.peek().is_some_and(|worst| candidate < *worst) {
            best.pop();
            best.push(candidate);
        }

        let axis = depth % 2;
        let diff = (if axis == 0 { target.0 } else { target.1 } - node.point.coord(axis)) as f64;
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.nearest_from(near, depth + 1, target, k, best);
        }
        let worst = best.peek().map_or(f64::INFINITY, |c| c.dist_sq);
        if best.len() < k || diff * diff < worst {
            if let Some(far) = far {
                self.nearest_from(far, depth + 1, target, k, best);
            }
        }
    }
}
