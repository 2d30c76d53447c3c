//! On-disk storage of interesting test cases.
//!
//! Each run writes into its own timestamped folder. An interesting case `n`
//! produces `parameters_{n}.json` plus a copy of every simulator artifact named
//! `test_{n}.<ext>` (a suffix `_k` separates artifacts sharing an extension).
//! When the run ends, `report.json` summarizes it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use obstacle_search::core::{
    CasePersistence, FlightSegment, GenerationArea, InterestingCase, ObstacleConfiguration,
    ObstacleSpec, SearchConfig, SearchReport, SpiralParams,
};

use crate::error::Result;

#[derive(Serialize)]
struct CaseParameters<'a> {
    evaluation: u64,
    segment: &'a FlightSegment,
    area: &'a GenerationArea,
    spiral: &'a SpiralParams,
    configuration: &'a ObstacleConfiguration,
    obstacles: &'a [ObstacleSpec; 2],
    distances: &'a [f64],
    minimum_distance: f64,
    artifacts: &'a [PathBuf],
}

/// Summary of a finished run, written as `report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Evaluations requested.
    pub budget: u64,
    /// Evaluations spent.
    pub evaluations: u64,
    /// Configuration with the smallest distance.
    pub best_configuration: ObstacleConfiguration,
    /// Obstacles of the best configuration.
    pub best_obstacles: [ObstacleSpec; 2],
    /// None when no evaluation produced a distance.
    pub best_distance: Option<f64>,
    /// Parent held when the run stopped.
    pub final_configuration: ObstacleConfiguration,
    /// Distance of the final parent, if measured.
    pub final_distance: Option<f64>,
    /// Reference flight segment.
    pub segment: FlightSegment,
    /// Parents drawn, including the first.
    pub initializations: u32,
    /// Stagnation restarts.
    pub restarts: u32,
    /// Fresh parents drawn because mutation got stuck.
    pub mutation_reseeds: u32,
    /// Simulations that failed or timed out.
    pub failed_evaluations: u64,
    /// Cases handed to the store.
    pub interesting_cases: u64,
    /// Configurations generated during the run.
    pub distinct_configurations: usize,
    /// Candidate threshold at the end, in meters.
    pub final_threshold: f64,
    /// Whether the run stopped early.
    pub cancelled: bool,
    /// Wall-clock time in milliseconds.
    pub computation_time_ms: u64,
    /// Best distance after each evaluation.
    pub fitness_history: Vec<Option<f64>>,
    /// Parent distance after each evaluation.
    pub parent_fitness_history: Vec<Option<f64>>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl RunSummary {
    /// Builds the summary of a report.
    pub fn new(budget: u64, report: &SearchReport) -> Self {
        Self {
            budget,
            evaluations: report.evaluations,
            best_configuration: report.best,
            best_obstacles: report.best_obstacles,
            best_distance: finite(report.best_fitness.value()),
            final_configuration: report.final_parent,
            final_distance: finite(report.final_parent_fitness.value()),
            segment: report.segment,
            initializations: report.initializations,
            restarts: report.restarts,
            mutation_reseeds: report.mutation_reseeds,
            failed_evaluations: report.failed_evaluations,
            interesting_cases: report.interesting_cases,
            distinct_configurations: report.history_size,
            final_threshold: report.final_threshold,
            cancelled: report.cancelled,
            computation_time_ms: report.computation_time_ms,
            fitness_history: report.fitness_history.iter().copied().map(finite).collect(),
            parent_fitness_history: report
                .parent_fitness_history
                .iter()
                .copied()
                .map(finite)
                .collect(),
        }
    }
}

/// Writes interesting cases into one output folder.
#[derive(Debug)]
pub struct DirectoryStore {
    folder: PathBuf,
    area: GenerationArea,
    spiral: SpiralParams,
    saved: usize,
}

impl DirectoryStore {
    /// Creates a fresh `<root>/<dd-mm-HH-MM-SS>/` folder.
    pub fn create(root: impl AsRef<Path>, config: &SearchConfig) -> Result<Self> {
        let stamp = chrono::Local::now().format("%d-%m-%H-%M-%S").to_string();
        Self::in_folder(root.as_ref().join(stamp), config)
    }

    /// Uses `folder` as is, creating it if needed.
    pub fn in_folder(folder: impl Into<PathBuf>, config: &SearchConfig) -> Result<Self> {
        let folder = folder.into();
        fs::create_dir_all(&folder)?;
        log::info!("Output folder: {}", folder.display());
        Ok(Self {
            folder,
            area: config.area,
            spiral: config.spiral,
            saved: 0,
        })
    }

    /// Output folder.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Cases written so far.
    pub fn saved(&self) -> usize {
        self.saved
    }

    /// Copies artifacts as `test_{n}.<ext>` and returns the stored paths.
    fn copy_artifacts(&self, evaluation: u64, artifacts: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut per_extension: HashMap<String, usize> = HashMap::new();
        let mut stored = Vec::with_capacity(artifacts.len());

        for source in artifacts {
            let ext = source
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            let seen = per_extension.entry(ext.clone()).or_insert(0);
            let stem = if *seen == 0 {
                format!("test_{evaluation}")
            } else {
                format!("test_{evaluation}_{seen}")
            };
            *seen += 1;

            let name = if ext.is_empty() {
                stem
            } else {
                format!("{stem}.{ext}")
            };
            let target = self.folder.join(name);
            fs::copy(source, &target)?;
            stored.push(target);
        }
        Ok(stored)
    }

    /// Writes one case.
    pub fn write_case(&mut self, case: &InterestingCase) -> Result<PathBuf> {
        let artifacts = self.copy_artifacts(case.evaluation, &case.outcome.artifacts)?;
        let parameters = CaseParameters {
            evaluation: case.evaluation,
            segment: &case.segment,
            area: &self.area,
            spiral: &self.spiral,
            configuration: &case.configuration,
            obstacles: &case.obstacles,
            distances: &case.outcome.distances,
            minimum_distance: case.fitness,
            artifacts: &artifacts,
        };

        let path = self
            .folder
            .join(format!("parameters_{}.json", case.evaluation));
        fs::write(&path, serde_json::to_string_pretty(&parameters)?)?;
        self.saved += 1;
        log::info!("Test case saved to {}", path.display());
        Ok(path)
    }

    /// Writes `report.json`.
    pub fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf> {
        let path = self.folder.join("report.json");
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        Ok(path)
    }
}

impl CasePersistence for DirectoryStore {
    fn persist(&mut self, case: &InterestingCase) -> obstacle_search::Result<()> {
        self.write_case(case)
            .map(|_| ())
            .map_err(|e| obstacle_search::Error::Persistence(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obstacle_search::core::{ObstacleDistances, ObstacleDimensions, Point2D};
    use tempfile::TempDir;

    fn case(evaluation: u64, artifacts: Vec<PathBuf>) -> InterestingCase {
        let configuration = ObstacleConfiguration::new([-15.0, 20.0, 0.0, 10.0, 30.0, 40.0]);
        let dims = ObstacleDimensions::default();
        InterestingCase {
            evaluation,
            segment: FlightSegment::new(Point2D::new(-30.0, 25.0), Point2D::new(20.0, 25.0)),
            configuration,
            obstacles: [
                ObstacleSpec::from_pose(configuration.pose(0), &dims),
                ObstacleSpec::from_pose(configuration.pose(1), &dims),
            ],
            fitness: 2.5,
            outcome: ObstacleDistances::new(vec![2.5, 9.0]).with_artifacts(artifacts),
        }
    }

    #[test]
    fn test_create_uses_timestamped_subfolder() {
        let root = TempDir::new().unwrap();
        let store = DirectoryStore::create(root.path(), &SearchConfig::default()).unwrap();
        assert!(store.folder().is_dir());
        assert_eq!(store.folder().parent(), Some(root.path()));
    }

    #[test]
    fn test_write_case_parameters() {
        let dir = TempDir::new().unwrap();
        let mut store = DirectoryStore::in_folder(dir.path(), &SearchConfig::default()).unwrap();
        let path = store.write_case(&case(7, Vec::new())).unwrap();

        assert_eq!(path, dir.path().join("parameters_7.json"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["evaluation"], 7);
        assert_eq!(json["minimum_distance"], 2.5);
        assert_eq!(json["configuration"][5], 40.0);
        assert_eq!(json["obstacles"][0]["length"], 20.0);
        assert_eq!(json["spiral"]["num_points"], 3500);
        assert_eq!(json["segment"]["start"]["x"], -30.0);
        assert_eq!(store.saved(), 1);
    }

    #[test]
    fn test_artifacts_are_copied_by_extension() {
        let sim = TempDir::new().unwrap();
        let log = sim.path().join("flight.ulg");
        let plot = sim.path().join("flight.png");
        let extra = sim.path().join("other.png");
        for f in [&log, &plot, &extra] {
            fs::write(f, b"data").unwrap();
        }

        let out = TempDir::new().unwrap();
        let mut store = DirectoryStore::in_folder(out.path(), &SearchConfig::default()).unwrap();
        store.write_case(&case(3, vec![log, plot, extra])).unwrap();

        assert!(out.path().join("test_3.ulg").is_file());
        assert!(out.path().join("test_3.png").is_file());
        assert!(out.path().join("test_3_1.png").is_file());
    }

    #[test]
    fn test_missing_artifact_is_persistence_error() {
        let out = TempDir::new().unwrap();
        let mut store = DirectoryStore::in_folder(out.path(), &SearchConfig::default()).unwrap();
        let missing = out.path().join("does-not-exist.ulg");
        let result = store.persist(&case(1, vec![missing]));
        assert!(matches!(result, Err(obstacle_search::Error::Persistence(_))));
        assert_eq!(store.saved(), 0);
    }
}
