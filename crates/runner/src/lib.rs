//! Command-line runner for obstacle search.
//!
//! This crate provides:
//! - QGroundControl mission plan loading
//! - Simulator gateways (external process, synthetic)
//! - Test case storage in timestamped output folders

mod error;
mod mission;
mod settings;
mod simulator;
mod store;

pub use error::{Result, RunnerError};
pub use mission::{latlon_to_local, GeoWaypoint, QgcMissionPlan};
pub use settings::load_search_config;
pub use simulator::{CommandGateway, SyntheticGateway};
pub use store::{DirectoryStore, RunSummary};

use obstacle_search::core::{FitnessGateway, SearchReport};
use obstacle_search::{ObstacleSearch, SearchConfig};

/// Runs a full search and writes its summary next to the stored cases.
pub fn run_generation<G>(
    config: SearchConfig,
    mission: &QgcMissionPlan,
    gateway: G,
    store: &mut DirectoryStore,
    budget: u64,
) -> Result<SearchReport>
where
    G: FitnessGateway + 'static,
{
    let mut search = ObstacleSearch::new(config, mission, gateway, &mut *store)?;
    let report = search.run(budget)?;
    drop(search);

    let path = store.write_summary(&RunSummary::new(budget, &report))?;
    log::info!("Run summary written to {}", path.display());
    Ok(report)
}
