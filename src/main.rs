use anyhow::Result;
use clap::Parser;

use gravity::Simulation;

#[derive(Parser, Debug)]
struct Args {
    /// Number of particles to simulate
    #[arg(short = 'n', long, default_value_t = 100)]
    particles: usize,

    /// Number of timesteps to run
    #[arg(short, long, default_value_t = 1000)]
    steps: usize,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut sim = match args.seed {
        Some(seed) => Simulation::with_seed(seed),
        None => Simulation::new(),
    };
    sim.init_particles(args.particles)?;

    let start = std::time::Instant::now();
    sim.run_simulation(args.steps)?;
    let elapsed = start.elapsed();

    println!("Elapsed: {:?}", elapsed);
    println!(
        "{} of {} particles remain after {} steps",
        sim.particles().len(),
        args.particles,
        args.steps
    );
    Ok(())
}
