//! Hex coordinate system (axial coordinates)
//!
//! Uses axial coordinates (q, r) for easy neighbor calculation. World
//! positions use a pointy-top layout.

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

const SQRT_3: f32 = 1.732_050_8;

/// Axial hex coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Manhattan distance in cube space
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Get all 6 neighboring hex coordinates
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let mut out = [*self; 6];
        for (slot, dir) in out.iter_mut().zip(HexDirection::all()) {
            *slot = *self + dir.offset();
        }
        out
    }

    /// Get all hexes within range (inclusive), i.e. the hex disk
    pub fn hexes_in_range(&self, range: u32) -> Vec<HexCoord> {
        let range = range as i32;
        let mut results = Vec::with_capacity((3 * range * (range + 1) + 1) as usize);
        for q in -range..=range {
            for r in (-range).max(-q - range)..=range.min(-q + range) {
                results.push(HexCoord::new(self.q + q, self.r + r));
            }
        }
        results
    }

    /// Round fractional axial coordinates to the containing hex
    fn round(q: f32, r: f32) -> Self {
        let s = -q - r;
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }
}

impl std::ops::Add for HexCoord {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.q + rhs.q, self.r + rhs.r)
    }
}

/// Direction enum for hex neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// Get the hex offset for this direction
    pub fn offset(&self) -> HexCoord {
        match self {
            HexDirection::East => HexCoord::new(1, 0),
            HexDirection::NorthEast => HexCoord::new(1, -1),
            HexDirection::NorthWest => HexCoord::new(0, -1),
            HexDirection::West => HexCoord::new(-1, 0),
            HexDirection::SouthWest => HexCoord::new(-1, 1),
            HexDirection::SouthEast => HexCoord::new(0, 1),
        }
    }

    /// All directions
    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::East,
            HexDirection::NorthEast,
            HexDirection::NorthWest,
            HexDirection::West,
            HexDirection::SouthWest,
            HexDirection::SouthEast,
        ]
    }
}

/// Conversion between hex coordinates and world positions (pointy-top)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HexLayout {
    /// Center-to-corner distance
    pub size: f32,
}

impl HexLayout {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    /// World position of a tile's center
    pub fn to_world(&self, coord: HexCoord) -> Vec2 {
        let q = coord.q as f32;
        let r = coord.r as f32;
        Vec2::new(
            self.size * (SQRT_3 * q + SQRT_3 / 2.0 * r),
            self.size * 1.5 * r,
        )
    }

    /// Tile containing a world position
    pub fn from_world(&self, pos: Vec2) -> HexCoord {
        let q = (SQRT_3 / 3.0 * pos.x - pos.y / 3.0) / self.size;
        let r = (2.0 / 3.0 * pos.y) / self.size;
        HexCoord::round(q, r)
    }

    /// Radius of the circle inscribed in a tile
    pub fn inner_radius(&self) -> f32 {
        self.size * SQRT_3 / 2.0
    }
}

impl Default for HexLayout {
    fn default() -> Self {
        Self::new(1.0)
    }
}
