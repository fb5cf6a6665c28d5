//! Enemy AI: target selection, wasp brains and raid waves

pub mod enemy;
pub mod targeting;
pub mod wave;

pub use enemy::{EnemyBrain, EnemyRole};
pub use targeting::{find_target, redirect_sheltered_queen, Leash, TargetQuery, TargetTier};
pub use wave::WaveSpawner;
