//! # Obstacle Search
//!
//! Search-based generation of obstacle placements that bring a simulated
//! drone as close as possible to collision while it flies a planned mission.
//!
//! This crate provides:
//! - **Candidate generation**: golden-angle spiral around the mission's main leg
//! - **Validity checks**: exact overlap and containment tests for rotated boxes
//! - **Hill climbing**: budgeted local search with restarts on stagnation
//! - **Simulator boundary**: deadline-bounded fitness evaluation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use obstacle_search::core::{CollectCases, SearchConfig};
//! use obstacle_search::d2::ObstacleSearch;
//!
//! let config = SearchConfig::default().with_seed(42);
//! let mut search = ObstacleSearch::new(config, &mission, simulator, CollectCases::new())?;
//! let report = search.run(200)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `d2` (default): ground-plane placement search
//! - `serde`: Serialization support

/// Core types and the generic search machinery.
pub use obstacle_search_core as core;

/// Ground-plane placement search.
#[cfg(feature = "d2")]
pub use obstacle_search_d2 as d2;

// Re-export commonly used types at root level
pub use obstacle_search_core::{
    CasePersistence, Error, Fitness, FitnessGateway, MissionSource, Result, SearchConfig,
    SearchReport,
};

#[cfg(feature = "d2")]
pub use obstacle_search_d2::ObstacleSearch;
