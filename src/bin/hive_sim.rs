//! Headless hive simulation runner
//!
//! Builds a demo map (player hive and queen, flower fields, a wasp hive and
//! a raid spawner), runs it for a fixed number of ticks and prints a summary.

use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use hivefront::agents::AgentKind;
use hivefront::core::{AgentId, Faction, HiveError, Result, SimulationConfig};
use hivefront::grid::{HexCoord, Terrain};
use hivefront::simulation::{SimEventKind, World, WorldSummary};

/// Headless hive simulation - runs a demo scenario and reports the outcome
#[derive(Parser, Debug)]
#[command(name = "hive_sim")]
#[command(about = "Run the hive simulation without a UI and print a summary")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to run
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// TOML config file; omitted keys use built-in defaults
    #[arg(long)]
    config: Option<String>,

    /// Override grid.map_radius
    #[arg(long, value_parser = clap::value_parser!(u32).range(6..))]
    map_radius: Option<u32>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Debug-level logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    ticks: u64,
    resources_delivered: u32,
    attacks: usize,
    deaths: usize,
    rejected_commands: usize,
    summary: WorldSummary,
}

#[derive(Default)]
struct Tally {
    delivered: u32,
    attacks: usize,
    deaths: usize,
    rejected: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose { "hivefront=debug" } else { "hivefront=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(radius) = args.map_radius {
        config.grid.map_radius = radius;
    }

    let mut world = World::new(config, args.seed)?;
    let fields = build_demo(&mut world)?;
    info!(seed = args.seed, ticks = args.ticks, "running demo scenario");

    let mut tally = Tally::default();
    for tick in 0..args.ticks {
        // Every half second, put idle workers to work on the nearest field
        if tick % 5 == 0 {
            assign_idle_workers(&mut world, &fields);
        }
        world.tick(args.dt);

        for event in world.drain_events() {
            match event.kind {
                SimEventKind::ResourcesDelivered { amount, .. } => tally.delivered += amount,
                SimEventKind::Attacked { .. } => tally.attacks += 1,
                SimEventKind::Despawned { .. } => tally.deaths += 1,
                SimEventKind::CommandRejected { .. } => tally.rejected += 1,
                _ => {}
            }
        }
    }

    let report = RunReport {
        seed: args.seed,
        ticks: args.ticks,
        resources_delivered: tally.delivered,
        attacks: tally.attacks,
        deaths: tally.deaths,
        rejected_commands: tally.rejected,
        summary: world.summary(),
    };

    match args.format.as_str() {
        "text" => print_text(&report),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Lay out the scenario; returns the flower field tiles
fn build_demo(world: &mut World) -> Result<Vec<HexCoord>> {
    let radius = world.config().grid.map_radius as i32;

    let fields: Vec<HexCoord> = [(2, 0), (2, -1), (3, -1), (-2, 2), (-1, 2), (0, -3)]
        .into_iter()
        .map(|(q, r)| HexCoord::new(q, r))
        .collect();
    if fields.iter().any(|&f| !world.tiles().contains(f)) {
        return Err(HiveError::Config("map too small for the demo fields".into()));
    }
    for &field in &fields {
        world.tiles_mut().set_terrain(field, Terrain::FlowerField);
    }
    world.tiles_mut().set_terrain(HexCoord::new(1, 1), Terrain::Rock);

    world.found_hive(Faction::Player, HexCoord::new(0, 0))?;
    world.spawn_queen(Faction::Player, HexCoord::new(0, 1))?;

    let wasp_nest = HexCoord::new(radius * 2 / 3, -(radius / 3));
    world.found_hive(Faction::Enemy, wasp_nest)?;
    world.add_wave_spawner(HexCoord::new(-(radius - 1), radius / 2))?;
    Ok(fields)
}

fn assign_idle_workers(world: &mut World, fields: &[HexCoord]) {
    let idle: Vec<(AgentId, HexCoord)> = world
        .agents()
        .of_faction(Faction::Player)
        .filter(|a| a.kind == AgentKind::Worker)
        .filter(|a| world.worker_state(a.id).map(|s| s.is_idle()).unwrap_or(false))
        .map(|a| (a.id, a.coord()))
        .collect();

    for (worker, at) in idle {
        let nearest = fields
            .iter()
            .filter(|&&f| world.tiles().resource_at(f) > 0)
            .min_by_key(|f| f.distance(&at))
            .copied();
        let Some(field) = nearest else {
            return;
        };
        if let Err(err) = world.issue_command_to_tile(worker, field) {
            debug!(agent = %worker, error = %err, "demo gather order refused");
        }
    }
}

fn print_text(report: &RunReport) {
    let s = &report.summary;
    println!("Hive Simulation Result");
    println!("======================");
    println!("Seed: {}", report.seed);
    println!("Ticks: {} ({:.1}s simulated)", s.tick, s.elapsed);
    println!("Player stockpile: {}", s.player_resources);
    println!("Resources delivered: {}", report.resources_delivered);
    println!("Attacks: {}  Deaths: {}", report.attacks, report.deaths);
    println!("Rejected commands: {}", report.rejected_commands);
    println!("Waves launched: {}", s.waves_launched);
    println!("Visible tiles: {}", s.visible_tiles);
    println!();
    println!("Units:");
    for (kind, count) in &s.units {
        println!("  {}: {}", kind, count);
    }
    println!("Worker states:");
    for (state, count) in &s.worker_states {
        println!("  {}: {}", state, count);
    }
    println!("Hives:");
    for hive in &s.hives {
        println!(
            "  {:?} at ({}, {}) workers={} relocation={}",
            hive.faction, hive.coord.q, hive.coord.r, hive.workers, hive.relocation
        );
    }
}
