//! Tile registry: coordinate -> tile state (terrain, resources, fog)

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::grid::hex::HexCoord;

/// Fog of war state for a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FogState {
    #[default]
    Hidden, // Never seen
    Revealed, // Seen before, not currently observed
    Visible,  // Currently observed by a player agent
}

/// Terrain category of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Meadow,
    FlowerField,
    Grove,
    Rock,
}

impl Terrain {
    /// Resource a fresh tile of this terrain starts with
    pub fn max_resource(&self) -> u32 {
        match self {
            Terrain::Meadow => 0,
            Terrain::FlowerField => 30,
            Terrain::Grove => 15,
            Terrain::Rock => 0,
        }
    }
}

/// A single tile on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub coord: HexCoord,
    pub terrain: Terrain,
    resource: u32,
    /// Highest resource this tile has held; display only
    pub max_resource: u32,
    pub fog: FogState,
}

impl Tile {
    pub fn new(coord: HexCoord, terrain: Terrain) -> Self {
        let amount = terrain.max_resource();
        Self {
            coord,
            terrain,
            resource: amount,
            max_resource: amount,
            fog: FogState::Hidden,
        }
    }

    pub fn with_resource(mut self, amount: u32) -> Self {
        self.resource = amount;
        self.max_resource = self.max_resource.max(amount);
        self
    }

    pub fn resource(&self) -> u32 {
        self.resource
    }

    pub fn has_resource(&self) -> bool {
        self.resource > 0
    }

    /// Fraction of the historical maximum still present, for coloring
    pub fn richness(&self) -> f32 {
        if self.max_resource == 0 {
            0.0
        } else {
            self.resource as f32 / self.max_resource as f32
        }
    }
}

/// The full tile map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileRegistry {
    tiles: AHashMap<HexCoord, Tile>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hexagonal map of the given radius around the origin, all one terrain
    pub fn hexagon(radius: u32, terrain: Terrain) -> Self {
        let mut registry = Self::new();
        for coord in HexCoord::new(0, 0).hexes_in_range(radius) {
            registry.insert(Tile::new(coord, terrain));
        }
        registry
    }

    /// Insert or replace a tile
    pub fn insert(&mut self, tile: Tile) {
        self.tiles.insert(tile.coord, tile);
    }

    pub fn get(&self, coord: HexCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn get_mut(&mut self, coord: HexCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    pub fn contains(&self, coord: HexCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Registered neighbors of a coordinate
    pub fn neighbors(&self, coord: HexCoord) -> Vec<&Tile> {
        coord
            .neighbors()
            .iter()
            .filter_map(|n| self.tiles.get(n))
            .collect()
    }

    /// Resource amount at a coordinate, 0 when unregistered
    pub fn resource_at(&self, coord: HexCoord) -> u32 {
        self.get(coord).map(|t| t.resource).unwrap_or(0)
    }

    /// Set terrain and refill to that terrain's amount
    pub fn set_terrain(&mut self, coord: HexCoord, terrain: Terrain) {
        if let Some(tile) = self.get_mut(coord) {
            *tile = Tile {
                fog: tile.fog,
                ..Tile::new(coord, terrain)
            };
        }
    }

    /// Explicit reset: the only way a tile's resource goes back up
    pub fn reset_resource(&mut self, coord: HexCoord, amount: u32) -> bool {
        match self.get_mut(coord) {
            Some(tile) => {
                tile.resource = amount;
                tile.max_resource = tile.max_resource.max(amount);
                true
            }
            None => false,
        }
    }

    /// Withdraw up to `max` units, returns the amount actually taken
    pub fn withdraw_resource(&mut self, coord: HexCoord, max: u32) -> u32 {
        match self.get_mut(coord) {
            Some(tile) => {
                let taken = max.min(tile.resource);
                tile.resource -= taken;
                taken
            }
            None => 0,
        }
    }

    pub fn fog(&self, coord: HexCoord) -> FogState {
        self.get(coord).map(|t| t.fog).unwrap_or_default()
    }

    pub(crate) fn set_fog(&mut self, coord: HexCoord, fog: FogState) {
        if let Some(tile) = self.get_mut(coord) {
            tile.fog = fog;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexagon_size() {
        let tiles = TileRegistry::hexagon(2, Terrain::Meadow);
        assert_eq!(tiles.len(), 19);
        assert!(tiles.contains(HexCoord::new(2, -2)));
        assert!(!tiles.contains(HexCoord::new(3, 0)));
    }

    #[test]
    fn test_neighbors_only_registered() {
        let tiles = TileRegistry::hexagon(1, Terrain::Meadow);
        assert_eq!(tiles.neighbors(HexCoord::new(0, 0)).len(), 6);
        // Edge tile: center + two ring neighbors
        assert_eq!(tiles.neighbors(HexCoord::new(1, 0)).len(), 3);
        assert!(tiles.neighbors(HexCoord::new(10, 10)).is_empty());
    }

    #[test]
    fn test_withdraw_never_goes_negative() {
        let mut tiles = TileRegistry::hexagon(1, Terrain::Meadow);
        let coord = HexCoord::new(0, 0);
        tiles.reset_resource(coord, 5);

        assert_eq!(tiles.withdraw_resource(coord, 3), 3);
        assert_eq!(tiles.withdraw_resource(coord, 3), 2);
        assert_eq!(tiles.withdraw_resource(coord, 3), 0);
        assert_eq!(tiles.resource_at(coord), 0);
    }

    #[test]
    fn test_withdraw_missing_tile() {
        let mut tiles = TileRegistry::new();
        assert_eq!(tiles.withdraw_resource(HexCoord::new(0, 0), 3), 0);
        assert!(!tiles.reset_resource(HexCoord::new(0, 0), 3));
    }

    #[test]
    fn test_terrain_sets_max_resource() {
        let tile = Tile::new(HexCoord::new(0, 0), Terrain::FlowerField);
        assert_eq!(tile.resource(), 30);
        assert_eq!(tile.max_resource, 30);
        assert_eq!(tile.richness(), 1.0);
    }

    #[test]
    fn test_set_terrain_keeps_fog() {
        let mut tiles = TileRegistry::hexagon(1, Terrain::Meadow);
        let coord = HexCoord::new(1, 0);
        tiles.set_fog(coord, FogState::Revealed);
        tiles.set_terrain(coord, Terrain::Grove);
        assert_eq!(tiles.fog(coord), FogState::Revealed);
        assert_eq!(tiles.resource_at(coord), 15);
    }
}
