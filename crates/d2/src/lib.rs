//! # Obstacle Search 2D
//!
//! Ground-plane placement of two box obstacles next to a planned flight.
//!
//! ## Pipeline
//!
//! 1. [`segment::select_flight_segment`] picks the trajectory leg with the
//!    longest portion inside the generation area.
//! 2. [`spiral::SpiralGenerator`] lays a golden-angle spiral around the leg's
//!    midpoint and keeps the grid-snapped points close to the flight line.
//! 3. [`candidates::CandidatePool`] hands out unused point pairs as fresh parents.
//! 4. [`mutation::MutationEngine`] derives valid, never-seen neighbors, checked
//!    by [`validator::GeometryValidator`].
//! 5. [`search::ObstacleSearch`] drives the hill climber and sends every
//!    candidate through [`codec::ConfigurationCodec`] to the simulator.

pub mod candidates;
pub mod codec;
pub mod mutation;
pub mod search;
pub mod segment;
pub mod spiral;
pub mod validator;

// Re-exports
pub use candidates::CandidatePool;
pub use codec::ConfigurationCodec;
pub use mutation::MutationEngine;
pub use search::{ObstacleProblem, ObstacleSearch};
pub use segment::{clip_segment, select_flight_segment};
pub use spiral::{distance_to_line, SpiralGenerator};
pub use validator::{footprints_intersect, Footprint, GeometryValidator};
