//! # Obstacle Search Core
//!
//! Core types and abstractions for search-based obstacle placement.
//!
//! This crate provides the data model, configuration, error type and the
//! generic search machinery shared by the 2D placement crate.
//!
//! ## Core Components
//!
//! - **Data model**: `Point2D`, `GenerationArea`, `FlightSegment`,
//!   `ObstacleConfiguration`, `ObstacleSpec`
//! - **Configuration**: one immutable `SearchConfig` injected into every component
//! - **Hill climbing**: `ClimbRunner` with budget tracking and restart on stagnation
//! - **Fitness boundary**: `FitnessGateway` and the deadline-bounded `DeadlineGateway`
//! - **Collaborators**: `MissionSource`, `CasePersistence`
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod climb;
pub mod config;
pub mod error;
pub mod fitness;
pub mod geometry;
pub mod obstacle;
pub mod persistence;
pub mod result;
pub mod transform;

// Re-exports
pub use climb::{ClimbConfig, ClimbProblem, ClimbResult, ClimbRunner};
pub use config::{MutationOperator, SearchConfig, SpiralParams};
pub use error::{Error, Result};
pub use fitness::{
    CancelToken, DeadlineGateway, EvaluationError, Fitness, FitnessGateway, ObstacleDistances,
};
pub use geometry::{FlightSegment, GenerationArea, Point2D};
pub use obstacle::{
    ConfigurationHistory, ObstacleConfiguration, ObstacleDimensions, ObstaclePose, ObstacleSpec,
};
pub use persistence::{CasePersistence, CollectCases, DiscardCases, InterestingCase, MissionSource};
pub use result::SearchReport;
pub use transform::Transform2D;
