//! Conversion from the search vector to simulator obstacle records.

use obstacle_search_core::{ObstacleConfiguration, ObstacleDimensions, ObstacleSpec};

/// Turns configurations into the box records the simulator consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationCodec {
    dims: ObstacleDimensions,
}

impl ConfigurationCodec {
    /// Creates a codec stamping every obstacle with `dims`.
    pub fn new(dims: ObstacleDimensions) -> Self {
        Self { dims }
    }

    /// Fixed obstacle dimensions.
    pub fn dimensions(&self) -> &ObstacleDimensions {
        &self.dims
    }

    /// Builds both obstacle records.
    pub fn to_obstacle_specs(&self, config: &ObstacleConfiguration) -> [ObstacleSpec; 2] {
        [0, 1].map(|i| ObstacleSpec::from_pose(config.pose(i), &self.dims))
    }
}
