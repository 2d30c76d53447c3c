//! Obstacle Search CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use obstacle_search::core::MissionSource;
use obstacle_search::d2::{select_flight_segment, SpiralGenerator};
use obstacle_search_runner::{
    load_search_config, run_generation, CommandGateway, DirectoryStore, QgcMissionPlan,
    SyntheticGateway,
};

#[derive(Parser)]
#[command(name = "obstacle-search")]
#[command(about = "Search-based obstacle placement for UAV mission testing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate test cases for a mission
    Generate {
        /// QGroundControl mission plan (.plan)
        plan: PathBuf,

        /// Number of simulations allowed
        budget: u64,

        /// Search configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root folder for generated tests
        #[arg(short, long, default_value = "generated_tests")]
        output: PathBuf,

        /// Simulator command; synthetic distances are used when omitted
        #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "CMD")]
        simulator: Vec<String>,

        /// RNG seed (overrides the configuration file)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the reference segment and spiral candidates for a mission
    Candidates {
        /// QGroundControl mission plan (.plan)
        plan: PathBuf,

        /// Search configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            plan,
            budget,
            config,
            output,
            simulator,
            seed,
        } => {
            let mut config = load_search_config(config.as_deref())?;
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            let mission = QgcMissionPlan::load(&plan)?;
            let mut store = DirectoryStore::create(&output, &config)?;

            let report = if simulator.is_empty() {
                log::warn!("No simulator command given, using synthetic distances");
                let gateway = SyntheticGateway::for_search(config.seed);
                run_generation(config, &mission, gateway, &mut store, budget)?
            } else {
                let gateway = CommandGateway::new(&simulator)?;
                run_generation(config, &mission, gateway, &mut store, budget)?
            };

            println!("Evaluations:      {}", report.evaluations);
            println!("Restarts:         {}", report.restarts);
            println!("Failed:           {}", report.failed_evaluations);
            if report.has_measurement() {
                println!(
                    "Best distance:    {:.3} m at {}",
                    report.best_fitness.value(),
                    report.best
                );
            } else {
                println!("Best distance:    none (every evaluation failed)");
            }
            println!("{} test cases generated", store.saved());
            println!("output folder: {}", store.folder().display());
        }

        Commands::Candidates { plan, config } => {
            let config = load_search_config(config.as_deref())?;
            let mission = QgcMissionPlan::load(&plan)?;
            let segments = mission.trajectory_segments()?;
            let segment = select_flight_segment(&config.area, &segments)?;
            let spiral = SpiralGenerator::new(&config, segment)?;

            println!("Mission legs:     {}", segments.len());
            println!(
                "Reference leg:    ({:.2}, {:.2}) -> ({:.2}, {:.2}), {:.1} m inside the area",
                segment.start.x,
                segment.start.y,
                segment.end.x,
                segment.end.y,
                segment.length()
            );
            println!("Spiral points:    {}", spiral.points().len());
            println!(
                "Candidates:       {} within {:.1} m",
                spiral.candidates().len(),
                spiral.threshold()
            );
            for p in spiral.candidates().iter().take(10) {
                println!("  ({:.1}, {:.1})", p.x, p.y);
            }
        }
    }

    Ok(())
}
