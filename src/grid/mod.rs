//! Hex grid: coordinates, tile registry and pathfinding

pub mod hex;
pub mod pathfinding;
pub mod tiles;

pub use hex::{HexCoord, HexDirection, HexLayout};
pub use pathfinding::{find_path, path_length};
pub use tiles::{FogState, Terrain, Tile, TileRegistry};
