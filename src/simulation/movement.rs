//! Tile-path following with timed interpolation
//!
//! One transit is active at a time. A path requested while moving does not
//! replace the current one immediately: only its final tile is remembered,
//! and once the in-flight transit lands the executor re-paths from wherever
//! it is. Repeated requests while busy overwrite each other.

use std::collections::VecDeque;

use rand::Rng;

use crate::core::types::Vec2;
use crate::grid::hex::{HexCoord, HexLayout};
use crate::grid::pathfinding::find_path;
use crate::grid::tiles::TileRegistry;

/// A straight-line hop between two world positions
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transit {
    from: Vec2,
    to: Vec2,
    /// Tile entered on completion; None for in-tile nudges
    tile: Option<HexCoord>,
    duration: f32,
    elapsed: f32,
}

impl Transit {
    fn position(&self) -> Vec2 {
        if self.duration <= 0.0 {
            return self.to;
        }
        self.from.lerp(&self.to, self.elapsed / self.duration)
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Outcome of advancing an executor by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementStep {
    pub position: Vec2,
    /// Last tile entered this tick, if any
    pub entered: Option<HexCoord>,
    /// A queued destination that could not be reached from here
    pub unreachable: Option<HexCoord>,
}

/// Per-agent movement state
#[derive(Debug, Clone)]
pub struct MovementExecutor {
    queue: VecDeque<HexCoord>,
    queued_destination: Option<HexCoord>,
    transit: Option<Transit>,
    /// World units per second
    speed: f32,
}

impl MovementExecutor {
    pub fn new(speed: f32) -> Self {
        Self {
            queue: VecDeque::new(),
            queued_destination: None,
            transit: None,
            speed,
        }
    }

    /// Follow `path`, or remember its end if already moving
    pub fn set_path(&mut self, path: &[HexCoord], current: HexCoord) {
        let Some(&last) = path.last() else {
            return;
        };
        if self.is_travelling() {
            self.queued_destination = Some(last);
            return;
        }
        // An idle nudge is abandoned for real travel
        self.transit = None;
        self.queue = path.iter().copied().collect();
        if self.queue.front() == Some(&current) {
            self.queue.pop_front();
        }
    }

    /// Drop the transit, the queue and any queued destination
    pub fn clear_path(&mut self) {
        self.transit = None;
        self.queue.clear();
        self.queued_destination = None;
    }

    pub fn is_moving(&self) -> bool {
        self.transit.is_some() || !self.queue.is_empty() || self.queued_destination.is_some()
    }

    /// Moving between tiles, as opposed to idle or nudging inside one
    pub fn is_travelling(&self) -> bool {
        self.transit.map(|t| t.tile.is_some()).unwrap_or(false)
            || !self.queue.is_empty()
            || self.queued_destination.is_some()
    }

    pub fn queued_destination(&self) -> Option<HexCoord> {
        self.queued_destination
    }

    /// Short move within the current tile; ignored while travelling
    pub fn nudge(&mut self, from: Vec2, to: Vec2) -> bool {
        if self.is_travelling() {
            return false;
        }
        self.transit = Some(self.hop(from, to, None));
        true
    }

    fn hop(&self, from: Vec2, to: Vec2, tile: Option<HexCoord>) -> Transit {
        let duration = if self.speed > 0.0 {
            from.distance(&to) / self.speed
        } else {
            0.0
        };
        Transit {
            from,
            to,
            tile,
            duration,
            elapsed: 0.0,
        }
    }

    /// Integrate `dt` seconds of motion
    ///
    /// Leftover time after a transit lands carries into the next one, so a
    /// large `dt` can cross several tiles.
    pub fn advance(
        &mut self,
        dt: f32,
        position: Vec2,
        current: HexCoord,
        tiles: &TileRegistry,
        layout: &HexLayout,
    ) -> MovementStep {
        let mut step = MovementStep {
            position,
            entered: None,
            unreachable: None,
        };
        let mut tile = current;
        let mut remaining = dt.max(0.0);

        loop {
            if self.transit.is_none() && !self.start_next(step.position, tile, tiles, layout, &mut step) {
                break;
            }
            let Some(transit) = self.transit.as_mut() else {
                break;
            };

            transit.elapsed += remaining;
            step.position = transit.position();
            if !transit.is_complete() {
                break;
            }

            remaining = transit.elapsed - transit.duration;
            step.position = transit.to;
            if let Some(entered) = transit.tile {
                tile = entered;
                step.entered = Some(entered);
            }
            self.transit = None;

            // A pending re-route preempts the rest of the old path
            if self.queued_destination.is_some() {
                self.queue.clear();
            }
            if remaining <= 0.0 {
                break;
            }
        }
        step
    }

    /// Begin the next transit; false when there is nothing left to do
    fn start_next(
        &mut self,
        position: Vec2,
        tile: HexCoord,
        tiles: &TileRegistry,
        layout: &HexLayout,
        step: &mut MovementStep,
    ) -> bool {
        if self.queue.is_empty() {
            let Some(destination) = self.queued_destination.take() else {
                return false;
            };
            match find_path(tiles, tile, destination) {
                Some(path) => {
                    self.queue = path.into_iter().collect();
                    if self.queue.front() == Some(&tile) {
                        self.queue.pop_front();
                    }
                }
                None => {
                    step.unreachable = Some(destination);
                    return false;
                }
            }
        }

        let Some(next) = self.queue.pop_front() else {
            // Re-routed onto the tile we already stand on: settle at its center
            let center = layout.to_world(tile);
            if position.distance(&center) <= f32::EPSILON {
                return false;
            }
            self.transit = Some(self.hop(position, center, None));
            return true;
        };
        self.transit = Some(self.hop(position, layout.to_world(next), Some(next)));
        true
    }
}

/// Random point inside a tile, at most `fraction * hex_size` from its center
pub fn random_point_in_tile<R: Rng>(
    layout: &HexLayout,
    coord: HexCoord,
    fraction: f32,
    rng: &mut R,
) -> Vec2 {
    let center = layout.to_world(coord);
    let max_offset = layout.size * fraction.clamp(0.0, 0.5);
    if max_offset <= 0.0 {
        return center;
    }
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let radius = rng.gen_range(0.0..=max_offset);
    center + Vec2::new(angle.cos() * radius, angle.sin() * radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tiles::Terrain;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (TileRegistry, HexLayout) {
        (TileRegistry::hexagon(6, Terrain::Meadow), HexLayout::new(1.0))
    }

    /// Run until idle, tracking the tile like the world does
    fn run(
        mover: &mut MovementExecutor,
        mut pos: Vec2,
        mut tile: HexCoord,
        tiles: &TileRegistry,
        layout: &HexLayout,
        dt: f32,
        max_steps: usize,
    ) -> (Vec2, HexCoord, Vec<HexCoord>) {
        let mut visited = Vec::new();
        for _ in 0..max_steps {
            if !mover.is_moving() {
                break;
            }
            let step = mover.advance(dt, pos, tile, tiles, layout);
            pos = step.position;
            if let Some(entered) = step.entered {
                tile = entered;
                visited.push(entered);
            }
        }
        (pos, tile, visited)
    }

    #[test]
    fn test_follows_path_to_end() {
        let (tiles, layout) = setup();
        let start = HexCoord::new(0, 0);
        let goal = HexCoord::new(3, 0);
        let path = find_path(&tiles, start, goal).unwrap();

        let mut mover = MovementExecutor::new(2.0);
        mover.set_path(&path, start);
        assert!(mover.is_moving());

        let (pos, tile, visited) = run(&mut mover, layout.to_world(start), start, &tiles, &layout, 0.1, 500);
        assert_eq!(tile, goal);
        assert_eq!(visited.len(), 3);
        assert!(pos.distance(&layout.to_world(goal)) < 1e-4);
        assert!(!mover.is_moving());
    }

    #[test]
    fn test_transit_takes_distance_over_speed() {
        let (tiles, layout) = setup();
        let start = HexCoord::new(0, 0);
        let next = HexCoord::new(1, 0);
        let hop = layout.to_world(start).distance(&layout.to_world(next));

        let mut mover = MovementExecutor::new(1.0);
        mover.set_path(&[start, next], start);

        let half = mover.advance(hop / 2.0, layout.to_world(start), start, &tiles, &layout);
        assert!(half.entered.is_none());
        assert!(mover.is_moving());

        let done = mover.advance(hop / 2.0 + 1e-4, half.position, start, &tiles, &layout);
        assert_eq!(done.entered, Some(next));
        assert!(!mover.is_moving());
    }

    #[test]
    fn test_second_request_reroutes_instead_of_concatenating() {
        let (tiles, layout) = setup();
        let start = HexCoord::new(0, 0);
        let a = HexCoord::new(4, 0);
        let b = HexCoord::new(-3, 0);

        let mut mover = MovementExecutor::new(2.0);
        mover.set_path(&find_path(&tiles, start, a).unwrap(), start);
        let first = mover.advance(0.1, layout.to_world(start), start, &tiles, &layout);

        mover.set_path(&find_path(&tiles, start, b).unwrap(), start);
        assert_eq!(mover.queued_destination(), Some(b));

        let (_, tile, visited) = run(&mut mover, first.position, start, &tiles, &layout, 0.1, 1000);
        assert_eq!(tile, b);
        // Only the in-flight hop toward A was completed
        assert_eq!(visited[0], HexCoord::new(1, 0));
        assert!(!visited.contains(&a));
    }

    #[test]
    fn test_last_queued_request_wins() {
        let (tiles, layout) = setup();
        let start = HexCoord::new(0, 0);

        let mut mover = MovementExecutor::new(2.0);
        mover.set_path(&find_path(&tiles, start, HexCoord::new(3, 0)).unwrap(), start);
        mover.set_path(&[start, HexCoord::new(0, 3)], start);
        mover.set_path(&[start, HexCoord::new(-2, 2)], start);
        assert_eq!(mover.queued_destination(), Some(HexCoord::new(-2, 2)));

        let (_, tile, _) = run(&mut mover, layout.to_world(start), start, &tiles, &layout, 0.1, 1000);
        assert_eq!(tile, HexCoord::new(-2, 2));
    }

    #[test]
    fn test_clear_path_is_idempotent() {
        let (tiles, layout) = setup();
        let start = HexCoord::new(0, 0);
        let mut mover = MovementExecutor::new(2.0);
        mover.set_path(&find_path(&tiles, start, HexCoord::new(2, 0)).unwrap(), start);
        mover.advance(0.1, layout.to_world(start), start, &tiles, &layout);

        mover.clear_path();
        assert!(!mover.is_moving());
        mover.clear_path();
        assert!(!mover.is_moving());
        assert!(!mover.is_travelling());
    }

    #[test]
    fn test_unreachable_queued_destination_reported() {
        let (mut tiles, layout) = setup();
        let island = HexCoord::new(20, 20);
        tiles.insert(crate::grid::tiles::Tile::new(island, Terrain::Meadow));
        let start = HexCoord::new(0, 0);

        let mut mover = MovementExecutor::new(2.0);
        mover.set_path(&[start, HexCoord::new(1, 0)], start);
        mover.set_path(&[island], start);

        let mut pos = layout.to_world(start);
        let mut tile = start;
        let mut reported = None;
        for _ in 0..100 {
            let step = mover.advance(0.1, pos, tile, &tiles, &layout);
            pos = step.position;
            tile = step.entered.unwrap_or(tile);
            if step.unreachable.is_some() {
                reported = step.unreachable;
                break;
            }
        }
        assert_eq!(reported, Some(island));
        assert!(!mover.is_moving());
    }

    #[test]
    fn test_nudge_stays_in_tile() {
        let (tiles, layout) = setup();
        let coord = HexCoord::new(2, -1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut mover = MovementExecutor::new(2.0);

        for _ in 0..50 {
            let target = random_point_in_tile(&layout, coord, 0.3, &mut rng);
            assert_eq!(layout.from_world(target), coord);
            assert!(mover.nudge(layout.to_world(coord), target));
            let step = mover.advance(10.0, layout.to_world(coord), coord, &tiles, &layout);
            assert!(step.entered.is_none());
            assert_eq!(step.position, target);
        }
    }

    #[test]
    fn test_set_path_replaces_nudge() {
        let (tiles, layout) = setup();
        let start = HexCoord::new(0, 0);
        let mut mover = MovementExecutor::new(2.0);
        mover.nudge(layout.to_world(start), layout.to_world(start) + Vec2::new(0.2, 0.0));

        mover.set_path(&[start, HexCoord::new(0, 1)], start);
        assert!(mover.queued_destination().is_none());
        let (_, tile, _) = run(&mut mover, layout.to_world(start), start, &tiles, &layout, 0.2, 100);
        assert_eq!(tile, HexCoord::new(0, 1));
    }
}
