//! A* pathfinding over the tile registry
//!
//! Every registered tile is traversable with uniform step cost 1, so the hex
//! distance heuristic is admissible and consistent and the first time the
//! goal is popped the path is shortest. Among equally short paths the choice
//! is unspecified.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::grid::hex::HexCoord;
use crate::grid::tiles::TileRegistry;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    coord: HexCoord,
    g_cost: u32,
    h_cost: u32,
}

impl PathNode {
    fn f_cost(&self) -> u32 {
        self.g_cost + self.h_cost
    }
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; prefer the node closer to the goal on f ties
        other
            .f_cost()
            .cmp(&self.f_cost())
            .then_with(|| other.h_cost.cmp(&self.h_cost))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a shortest tile path using A*
///
/// The returned path includes both `start` and `goal`. Returns None when
/// either endpoint is not registered or no connected path exists.
pub fn find_path(tiles: &TileRegistry, start: HexCoord, goal: HexCoord) -> Option<Vec<HexCoord>> {
    if !tiles.contains(start) || !tiles.contains(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut g_scores: HashMap<HexCoord, u32> = HashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        g_cost: 0,
        h_cost: start.distance(&goal),
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return Some(reconstruct_path(&came_from, current.coord));
        }

        // Skip stale heap entries superseded by a cheaper route
        let best_g = g_scores.get(&current.coord).copied().unwrap_or(u32::MAX);
        if current.g_cost > best_g {
            continue;
        }

        for neighbor in current.coord.neighbors() {
            if !tiles.contains(neighbor) {
                continue;
            }

            let tentative_g = current.g_cost + 1;
            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    coord: neighbor,
                    g_cost: tentative_g,
                    h_cost: neighbor.distance(&goal),
                });
            }
        }
    }

    None // No path found
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &HashMap<HexCoord, HexCoord>, mut current: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Number of steps in a path (tiles minus one)
pub fn path_length(path: &[HexCoord]) -> usize {
    path.len().saturating_sub(1)
}
