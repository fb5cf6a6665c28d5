//! Activity radius: how far from its hive a faction may act

use crate::grid::hex::HexCoord;

/// Distance within which an action is always allowed, whatever the radius
pub const ALWAYS_ALLOWED_DISTANCE: u32 = 1;

/// True when `target` is within `radius` of the hive, or adjacent to it
pub fn in_range(hive: HexCoord, target: HexCoord, radius: u32) -> bool {
    let distance = hive.distance(&target);
    distance <= ALWAYS_ALLOWED_DISTANCE || distance <= radius
}

/// Who authorises a fight: a hive with its radius, or a queen standing by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Hive { coord: HexCoord, radius: u32 },
    /// Homeless agents only act next to their queen
    Queen { coord: HexCoord },
}

impl Authority {
    pub fn allows(&self, target: HexCoord) -> bool {
        match *self {
            Authority::Hive { coord, radius } => in_range(coord, target, radius),
            Authority::Queen { coord } => in_range(coord, target, ALWAYS_ALLOWED_DISTANCE),
        }
    }
}
