//! Fog of war and structure discovery through `World`

use hivefront::core::{Faction, SimulationConfig};
use hivefront::grid::{FogState, HexCoord};
use hivefront::simulation::{SimEventKind, World};

fn world() -> World {
    let mut config = SimulationConfig::default();
    config.enemy.guard_max = 0;
    World::new(config, 21).unwrap()
}

#[test]
fn test_fog_follows_player_vision() {
    let mut world = world();
    let range = world.config().visibility.queen_vision_range;
    let queen = world.spawn_queen(Faction::Player, HexCoord::new(0, 0)).unwrap();

    assert_eq!(world.tiles().fog(HexCoord::new(1, 0)), FogState::Hidden);
    world.tick(0.1);
    assert_eq!(world.tiles().fog(HexCoord::new(1, 0)), FogState::Visible);
    assert_eq!(
        world.tiles().fog(HexCoord::new(range as i32 + 1, 0)),
        FogState::Hidden
    );

    world.set_position(queen, -6, 0).unwrap();
    world.tick(0.1);
    assert_eq!(world.tiles().fog(HexCoord::new(1, 0)), FogState::Revealed);
    assert_eq!(world.tiles().fog(HexCoord::new(-6, 0)), FogState::Visible);
}

#[test]
fn test_enemy_structure_discovered_once() {
    let mut world = world();
    let queen = world.spawn_queen(Faction::Player, HexCoord::new(0, 0)).unwrap();
    let nest = world.found_hive(Faction::Enemy, HexCoord::new(6, 0)).unwrap();

    world.tick(0.1);
    assert!(!world.visibility().is_discovered(nest));

    world.set_position(queen, 4, 0).unwrap();
    world.tick(0.1);
    world.set_position(queen, 0, 0).unwrap();
    world.tick(0.1);
    world.set_position(queen, 4, 0).unwrap();
    world.tick(0.1);

    let discoveries: Vec<_> = world
        .drain_events()
        .into_iter()
        .filter_map(|e| match e.kind {
            SimEventKind::StructureDiscovered { agent, at } => Some((agent, at)),
            _ => None,
        })
        .collect();
    assert_eq!(discoveries, vec![(nest, HexCoord::new(6, 0))]);
}

#[test]
fn test_remembered_structures_stay_render_eligible() {
    let mut world = world();
    let queen = world.spawn_queen(Faction::Player, HexCoord::new(4, 0)).unwrap();
    let nest = world.found_hive(Faction::Enemy, HexCoord::new(6, 0)).unwrap();
    world.tick(0.1);

    world.set_position(queen, -4, 0).unwrap();
    world.tick(0.1);

    let nest_agent = world.agents().get(nest).unwrap().clone();
    assert!(!world.visibility().is_visible(nest_agent.coord()));
    assert!(world.visibility().is_render_eligible(&nest_agent));
}

#[test]
fn test_enemy_vision_does_not_reveal() {
    let mut world = world();
    world.found_hive(Faction::Enemy, HexCoord::new(0, 0)).unwrap();
    world.tick(0.1);
    assert_eq!(world.visibility().visible_count(), 0);
    assert_eq!(world.tiles().fog(HexCoord::new(0, 0)), FogState::Hidden);
}
