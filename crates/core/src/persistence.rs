//! Collaborator traits for the mission source and case persistence.

use crate::fitness::ObstacleDistances;
use crate::geometry::FlightSegment;
use crate::obstacle::{ObstacleConfiguration, ObstacleSpec};
use crate::Result;

/// Supplies the planned trajectory as straight segments between waypoints.
pub trait MissionSource {
    /// Returns the trajectory legs in flight order.
    fn trajectory_segments(&self) -> Result<Vec<FlightSegment>>;
}

impl MissionSource for [FlightSegment] {
    fn trajectory_segments(&self) -> Result<Vec<FlightSegment>> {
        Ok(self.to_vec())
    }
}

impl MissionSource for Vec<FlightSegment> {
    fn trajectory_segments(&self) -> Result<Vec<FlightSegment>> {
        Ok(self.clone())
    }
}

/// A configuration whose closest approach beat the interesting-distance threshold.
#[derive(Debug, Clone)]
pub struct InterestingCase {
    /// 1-based index of the evaluation within the budget.
    pub evaluation: u64,
    /// Reference segment the candidates were generated around.
    pub segment: FlightSegment,
    /// The configuration that was simulated.
    pub configuration: ObstacleConfiguration,
    /// Obstacles as sent to the simulator.
    pub obstacles: [ObstacleSpec; 2],
    /// Closest approach, in meters.
    pub fitness: f64,
    /// Raw simulator output, including artifact paths.
    pub outcome: ObstacleDistances,
}

/// Stores interesting cases. The search only decides *whether* to persist.
pub trait CasePersistence {
    /// Stores one case under its evaluation index.
    fn persist(&mut self, case: &InterestingCase) -> Result<()>;
}

/// Discards every case.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardCases;

impl CasePersistence for DiscardCases {
    fn persist(&mut self, _case: &InterestingCase) -> Result<()> {
        Ok(())
    }
}

/// Keeps cases in memory, in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct CollectCases {
    /// Persisted cases.
    pub cases: Vec<InterestingCase>,
}

impl CollectCases {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CasePersistence for CollectCases {
    fn persist(&mut self, case: &InterestingCase) -> Result<()> {
        self.cases.push(case.clone());
        Ok(())
    }
}

impl<P: CasePersistence + ?Sized> CasePersistence for &mut P {
    fn persist(&mut self, case: &InterestingCase) -> Result<()> {
        (**self).persist(case)
    }
}

impl<P: CasePersistence + ?Sized> CasePersistence for Box<P> {
    fn persist(&mut self, case: &InterestingCase) -> Result<()> {
        (**self).persist(case)
    }
}
