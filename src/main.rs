use anyhow::Result;
use clap::Parser;
use log::info;

use flood_transit::simulation::{
    demo_scenario, FloodModel, SimConfig, SimWorld, DEFAULT_BUS_CAPACITY, DEFAULT_END_TIME,
    DEFAULT_SECONDS_PER_TICK,
};

#[derive(Parser)]
#[command(name = "flood_transit")]
#[command(about = "Bus network simulation under a rising flood")]
struct Cli {
    /// Re-search walks around flooded roads instead of abandoning routes
    #[arg(long)]
    disaster_resistant: bool,

    /// Simulated seconds per tick
    #[arg(long, default_value_t = DEFAULT_SECONDS_PER_TICK)]
    seconds_per_tick: f64,

    /// Stop the run at this simulated time, in seconds
    #[arg(long, default_value_t = DEFAULT_END_TIME)]
    end_time: f64,

    /// Water level at the start of the run, in metres
    #[arg(long, default_value = "0")]
    start_water_level: f64,

    /// Water level reached at the end of the flood, in metres
    #[arg(long, default_value = "20")]
    end_water_level: f64,

    /// Seconds for the water to rise from start to end level
    #[arg(long, default_value = "14400")]
    flood_duration: f64,

    /// Seats per bus
    #[arg(long, default_value_t = DEFAULT_BUS_CAPACITY)]
    bus_capacity: usize,

    /// Allow walks to reuse a connection
    #[arg(long)]
    no_trail: bool,

    /// Seed for the demo passenger demand
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Print a summary every N ticks
    #[arg(long, default_value = "15")]
    summary_every: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = SimConfig {
        flood: FloodModel::new(cli.start_water_level, cli.end_water_level, cli.flood_duration),
        seconds_per_tick: cli.seconds_per_tick,
        end_time: cli.end_time,
        disaster_resistant: cli.disaster_resistant,
        trail: !cli.no_trail,
        bus_capacity: cli.bus_capacity,
    };

    run_headless(config, cli.seed, cli.summary_every)
}

/// Run the demo scenario to completion without graphics
fn run_headless(config: SimConfig, seed: u64, summary_every: u32) -> Result<()> {
    println!("Running flood transit simulation in headless mode...");
    println!(
        "Tick: {}s, End: {}s, Disaster resistant: {}",
        config.seconds_per_tick, config.end_time, config.disaster_resistant
    );
    println!();

    let scenario = demo_scenario(seed)?;
    let mut world = SimWorld::new(scenario, config)?;

    println!("Initial state:");
    world.print_summary();
    println!();

    let mut tick: u32 = 0;
    while !world.is_complete() {
        world.tick();
        tick += 1;

        if summary_every > 0 && tick % summary_every == 0 {
            println!("--- After tick {} ({:.0}s simulated time) ---", tick, world.time);
            world.print_summary();
            println!();
        }
    }

    info!("Run finished after {} ticks", tick);

    println!("=== Final State ===");
    world.print_summary();
    println!();
    println!("{}", world.passenger_outcomes());
    Ok(())
}
