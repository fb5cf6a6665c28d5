//! Hivefront - hex-grid hive and wasp tactical simulation core

pub mod agents;
pub mod ai;
pub mod behavior;
pub mod core;
pub mod grid;
pub mod hive;
pub mod simulation;
