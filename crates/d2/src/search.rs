//! The obstacle search driver.
//!
//! [`ObstacleProblem`] plugs the 2D components (candidate pool, validator,
//! mutation engine, codec) and the external collaborators (simulator gateway,
//! case persistence) into the generic hill climber from the core crate.
//! [`ObstacleSearch`] wires everything up from a configuration and a mission.
//!
//! # Example
//!
//! ```rust,ignore
//! use obstacle_search_core::{CollectCases, SearchConfig};
//! use obstacle_search_d2::ObstacleSearch;
//!
//! let mut search = ObstacleSearch::new(config, &mission, simulator, CollectCases::new())?;
//! let report = search.run(200)?;
//! println!("closest approach {:.2}m", report.best_fitness.value());
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use rand::prelude::*;
use rand::rngs::StdRng;

use obstacle_search_core::{
    CancelToken, CasePersistence, ClimbConfig, ClimbProblem, ClimbRunner, ConfigurationHistory,
    DeadlineGateway, Fitness, FitnessGateway, FlightSegment, InterestingCase, MissionSource,
    ObstacleConfiguration, Result, SearchConfig, SearchReport,
};

use crate::candidates::CandidatePool;
use crate::codec::ConfigurationCodec;
use crate::mutation::MutationEngine;
use crate::segment::select_flight_segment;
use crate::spiral::SpiralGenerator;
use crate::validator::GeometryValidator;

/// Obstacle placement as a hill-climbing problem.
pub struct ObstacleProblem<G, P> {
    interesting_distance: f64,
    segment: FlightSegment,
    codec: ConfigurationCodec,
    pool: CandidatePool,
    mutation: MutationEngine,
    history: ConfigurationHistory,
    gateway: DeadlineGateway<G>,
    persistence: P,
    interesting_cases: u64,
}

impl<G, P> ObstacleProblem<G, P>
where
    G: FitnessGateway + 'static,
    P: CasePersistence,
{
    /// Builds the problem around an already selected flight segment.
    pub fn new(
        config: &SearchConfig,
        segment: FlightSegment,
        gateway: G,
        persistence: P,
    ) -> Result<Self> {
        let spiral = SpiralGenerator::new(config, segment)?;
        let validator = GeometryValidator::new(config.area, &config.obstacle);

        Ok(Self {
            interesting_distance: config.interesting_distance,
            segment,
            codec: ConfigurationCodec::new(config.obstacle),
            pool: CandidatePool::new(spiral, config),
            mutation: MutationEngine::new(config, validator),
            history: ConfigurationHistory::new(),
            gateway: DeadlineGateway::with_timeout_ms(gateway, config.evaluation_timeout_ms),
            persistence,
            interesting_cases: 0,
        })
    }

    /// Reference segment.
    pub fn segment(&self) -> &FlightSegment {
        &self.segment
    }

    /// Every configuration tried so far.
    pub fn history(&self) -> &ConfigurationHistory {
        &self.history
    }

    /// Candidate pool.
    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    /// Geometry validator.
    pub fn validator(&self) -> &GeometryValidator {
        self.mutation.validator()
    }

    /// Configuration codec.
    pub fn codec(&self) -> &ConfigurationCodec {
        &self.codec
    }

    /// Case persistence collaborator.
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Cases handed to persistence so far.
    pub fn interesting_cases(&self) -> u64 {
        self.interesting_cases
    }

    fn persist(&mut self, case: InterestingCase) {
        self.interesting_cases += 1;
        if let Err(e) = self.persistence.persist(&case) {
            log::warn!(
                "Failed to persist interesting case {}: {}",
                case.evaluation,
                e
            );
        }
    }
}

impl<G, P> ClimbProblem for ObstacleProblem<G, P>
where
    G: FitnessGateway + 'static,
    P: CasePersistence,
{
    type Solution = ObstacleConfiguration;

    fn initial_solution<R: Rng>(&mut self, rng: &mut R) -> Result<ObstacleConfiguration> {
        let naive = self.pool.draw_configuration(rng)?;
        if self.mutation.validator().is_valid(&naive) && self.history.insert(naive) {
            return Ok(naive);
        }

        log::debug!("Naive parent {} is invalid or already tried, repairing", naive);
        let pool = &mut self.pool;
        self.mutation
            .mutate_or_reseed(&naive, &mut self.history, rng, |rng| {
                pool.draw_configuration(rng)
            })
    }

    fn neighbor<R: Rng>(
        &mut self,
        parent: &ObstacleConfiguration,
        rng: &mut R,
    ) -> Result<ObstacleConfiguration> {
        let pool = &mut self.pool;
        self.mutation
            .mutate_or_reseed(parent, &mut self.history, rng, |rng| {
                pool.draw_configuration(rng)
            })
    }

    fn evaluate(&mut self, solution: &ObstacleConfiguration, evaluation: u64) -> Fitness {
        let obstacles = self.codec.to_obstacle_specs(solution);
        // Fresh token per evaluation: a timeout cancels only the call that hit it.
        let cancel = CancelToken::new();
        let outcome = self.gateway.evaluate(&obstacles, &cancel);
        let fitness = Fitness::from_outcome(&outcome);

        match outcome {
            Ok(distances) => match fitness {
                Fitness::Measured(value) => {
                    log::info!(
                        "Evaluation {}: {} -> closest approach {:.3}m",
                        evaluation,
                        solution,
                        value
                    );
                    if value < self.interesting_distance {
                        self.persist(InterestingCase {
                            evaluation,
                            segment: self.segment,
                            configuration: *solution,
                            obstacles,
                            fitness: value,
                            outcome: distances,
                        });
                    }
                }
                Fitness::Failed => {
                    log::warn!(
                        "Evaluation {}: simulator reported no usable distance for {}",
                        evaluation,
                        solution
                    );
                }
            },
            Err(e) => {
                log::warn!("Evaluation {} failed for {}: {}", evaluation, solution, e);
            }
        }

        fitness
    }

    fn on_accept(&mut self, evaluation: u64, solution: &ObstacleConfiguration, fitness: Fitness) {
        log::debug!(
            "Evaluation {}: accepted {} at {:.3}m",
            evaluation,
            solution,
            fitness.value()
        );
    }

    fn on_restart(&mut self, evaluation: u64, stagnation: u32) {
        log::warn!(
            "No improvement in {} children (evaluation {}), restarting from a fresh pair",
            stagnation,
            evaluation
        );
    }
}

/// Search-based obstacle placement driver.
pub struct ObstacleSearch<G, P>
where
    G: FitnessGateway + 'static,
    P: CasePersistence,
{
    seed: Option<u64>,
    runner: ClimbRunner<ObstacleProblem<G, P>>,
}

impl<G, P> ObstacleSearch<G, P>
where
    G: FitnessGateway + 'static,
    P: CasePersistence,
{
    /// Validates `config`, selects the reference segment from `mission` and
    /// prepares the candidate pool.
    pub fn new<M>(config: SearchConfig, mission: &M, gateway: G, persistence: P) -> Result<Self>
    where
        M: MissionSource + ?Sized,
    {
        config.validate()?;

        let segments = mission.trajectory_segments()?;
        let segment = select_flight_segment(&config.area, &segments)?;
        log::info!(
            "Reference segment ({:.2}, {:.2}) -> ({:.2}, {:.2}), {:.1}m inside the area",
            segment.start.x,
            segment.start.y,
            segment.end.x,
            segment.end.y,
            segment.length()
        );

        let problem = ObstacleProblem::new(&config, segment, gateway, persistence)?;
        let mut climb = ClimbConfig::new().with_stagnation_limit(config.stagnation_limit);
        if config.time_limit_ms > 0 {
            climb = climb.with_time_limit(Duration::from_millis(config.time_limit_ms));
        }

        Ok(Self {
            seed: config.seed,
            runner: ClimbRunner::new(climb, problem),
        })
    }

    /// Returns a handle that stops the search before its next evaluation.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.runner.cancel_handle()
    }

    /// The underlying problem.
    pub fn problem(&self) -> &ObstacleProblem<G, P> {
        self.runner.problem()
    }

    /// Consumes the search and returns the problem, e.g. to recover the
    /// persistence collaborator.
    pub fn into_problem(self) -> ObstacleProblem<G, P> {
        self.runner.into_problem()
    }

    /// Runs `budget` evaluations with the configured seed, or OS entropy if
    /// none is set.
    pub fn run(&mut self, budget: u64) -> Result<SearchReport> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(budget, &mut rng)
    }

    /// Runs `budget` evaluations with a specific RNG.
    ///
    /// A second run continues with the same history and candidate pool.
    pub fn run_with_rng<R: Rng>(&mut self, budget: u64, rng: &mut R) -> Result<SearchReport> {
        self.runner.config_mut().budget = budget;
        log::info!("Starting obstacle search with a budget of {} evaluations", budget);

        let result = self.runner.run_with_rng(rng)?;
        let problem = self.runner.problem();

        let report = SearchReport {
            best: result.best,
            best_obstacles: problem.codec.to_obstacle_specs(&result.best),
            best_fitness: result.best_fitness,
            final_parent: result.parent,
            final_parent_fitness: result.parent_fitness,
            segment: problem.segment,
            evaluations: result.evaluations,
            initializations: result.initializations,
            restarts: result.restarts,
            mutation_reseeds: problem.mutation.reseeds(),
            failed_evaluations: result.failed_evaluations,
            interesting_cases: problem.interesting_cases,
            history_size: problem.history.len(),
            final_threshold: problem.pool.threshold(),
            cancelled: result.cancelled,
            computation_time_ms: result.elapsed.as_millis() as u64,
            fitness_history: result.history,
            parent_fitness_history: result.parent_history,
        };

        log::info!(
            "Search finished: {} evaluations, best {} at {:.3}m, {} restarts, {} failures",
            report.evaluations,
            report.best,
            report.best_fitness.value(),
            report.restarts,
            report.failed_evaluations
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obstacle_search_core::{
        CollectCases, DiscardCases, Error, EvaluationError, MutationOperator, ObstacleDistances,
        ObstacleSpec, Point2D,
    };
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    fn mission() -> Vec<FlightSegment> {
        vec![
            FlightSegment::new(Point2D::new(-60.0, 0.0), Point2D::new(-60.0, 25.0)),
            FlightSegment::new(Point2D::new(-60.0, 25.0), Point2D::new(60.0, 25.0)),
        ]
    }

    /// Returns the call count as the closest approach, so every child is worse.
    #[derive(Clone, Default)]
    struct Counting {
        calls: Arc<AtomicU64>,
    }

    impl FitnessGateway for Counting {
        fn evaluate(
            &mut self,
            _obstacles: &[ObstacleSpec; 2],
            _cancel: &CancelToken,
        ) -> std::result::Result<ObstacleDistances, EvaluationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ObstacleDistances::new(vec![n as f64, 100.0]))
        }
    }

    /// Measures once, then fails every call.
    struct FailAfterFirst {
        calls: u64,
    }

    impl FitnessGateway for FailAfterFirst {
        fn evaluate(
            &mut self,
            _obstacles: &[ObstacleSpec; 2],
            _cancel: &CancelToken,
        ) -> std::result::Result<ObstacleDistances, EvaluationError> {
            self.calls += 1;
            if self.calls == 1 {
                Ok(ObstacleDistances::new(vec![12.5, 30.0]))
            } else {
                Err(EvaluationError::Simulator("no distance".into()))
            }
        }
    }

    /// Records every pair it is asked to simulate.
    #[derive(Clone, Default)]
    struct Recording {
        seen: Arc<Mutex<Vec<[ObstacleSpec; 2]>>>,
    }

    impl FitnessGateway for Recording {
        fn evaluate(
            &mut self,
            obstacles: &[ObstacleSpec; 2],
            _cancel: &CancelToken,
        ) -> std::result::Result<ObstacleDistances, EvaluationError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(*obstacles);
            // Closer to the origin is "better".
            let d = obstacles[0].x.hypot(obstacles[0].y - 25.0);
            Ok(ObstacleDistances::new(vec![d, 40.0]))
        }
    }

    /// Waits until cancelled.
    struct Hanging;

    impl FitnessGateway for Hanging {
        fn evaluate(
            &mut self,
            _obstacles: &[ObstacleSpec; 2],
            cancel: &CancelToken,
        ) -> std::result::Result<ObstacleDistances, EvaluationError> {
            while !cancel.is_cancelled() {
                std::thread::sleep(Duration::from_millis(2));
            }
            Err(EvaluationError::Cancelled)
        }
    }

    #[test]
    fn test_budget_of_one_reports_single_parent() {
        let gateway = Counting::default();
        let calls = gateway.calls.clone();
        let mut search =
            ObstacleSearch::new(SearchConfig::default(), &mission(), gateway, DiscardCases)
                .unwrap();
        let report = search
            .run_with_rng(1, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.evaluations, 1);
        assert_eq!(report.initializations, 1);
        assert_eq!(report.best, report.final_parent);
        assert_eq!(report.best_fitness, Fitness::Measured(1.0));
        assert_eq!(report.final_parent_fitness, Fitness::Measured(1.0));
        assert_eq!(report.history_size, 1);
    }

    #[test]
    fn test_failure_never_replaces_measured_parent() {
        let mut search = ObstacleSearch::new(
            SearchConfig::default().with_stagnation_limit(100),
            &mission(),
            FailAfterFirst { calls: 0 },
            DiscardCases,
        )
        .unwrap();
        let report = search
            .run_with_rng(25, &mut StdRng::seed_from_u64(2))
            .unwrap();

        assert_eq!(report.evaluations, 25);
        assert_eq!(report.failed_evaluations, 24);
        assert_eq!(report.best_fitness, Fitness::Measured(12.5));
        assert_eq!(report.final_parent_fitness, Fitness::Measured(12.5));
        assert_eq!(report.best, report.final_parent);
    }

    #[test]
    fn test_stagnation_restarts_draw_new_parents() {
        let config = SearchConfig::default().with_stagnation_limit(3);
        let mut search =
            ObstacleSearch::new(config, &mission(), Counting::default(), DiscardCases).unwrap();
        let report = search
            .run_with_rng(13, &mut StdRng::seed_from_u64(3))
            .unwrap();

        // init, 3 rejects, restart ... three times, then a final restart.
        assert_eq!(report.restarts, 3);
        assert_eq!(report.initializations, 4);
        assert_eq!(report.best_fitness, Fitness::Measured(1.0));
        assert_eq!(report.final_parent_fitness, Fitness::Measured(13.0));
        assert_eq!(search.problem().pool().draws(), 4 + report.mutation_reseeds as u64);
    }

    #[test]
    fn test_evaluated_configurations_are_valid_and_distinct() {
        let gateway = Recording::default();
        let seen = gateway.seen.clone();
        let mut search = ObstacleSearch::new(
            SearchConfig::default().with_mutation_operator(MutationOperator::Block),
            &mission(),
            gateway,
            DiscardCases,
        )
        .unwrap();
        let report = search
            .run_with_rng(120, &mut StdRng::seed_from_u64(4))
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 120);
        assert_eq!(report.history_size, 120);

        let validator = search.problem().validator();
        let mut distinct = HashSet::new();
        for pair in seen.iter() {
            let config = ObstacleConfiguration::new([
                pair[0].x,
                pair[0].y,
                pair[0].rotation,
                pair[1].x,
                pair[1].y,
                pair[1].rotation,
            ]);
            assert!(validator.is_valid(&config));
            assert!(distinct.insert(config));
        }

        // The best configuration was actually simulated.
        assert!(distinct.contains(&report.best));
    }

    #[test]
    fn test_parent_fitness_only_rises_on_restart() {
        let run = |stagnation: u32| {
            let config = SearchConfig::default().with_stagnation_limit(stagnation);
            let mut search =
                ObstacleSearch::new(config, &mission(), Recording::default(), DiscardCases)
                    .unwrap();
            search
                .run_with_rng(80, &mut StdRng::seed_from_u64(8))
                .unwrap()
        };

        let single = run(1000);
        assert_eq!(single.restarts, 0);
        assert_eq!(single.parent_fitness_history.len(), 80);
        assert!(single
            .parent_fitness_history
            .windows(2)
            .all(|w| w[1] <= w[0]));
        assert_eq!(
            single.parent_fitness_history.last().copied(),
            Some(single.final_parent_fitness.value())
        );

        let restarted = run(1);
        assert!(restarted.restarts > 0);
        let rises = restarted
            .parent_fitness_history
            .windows(2)
            .filter(|w| w[1] > w[0])
            .count();
        assert!(rises <= restarted.restarts as usize);
    }

    #[test]
    fn test_time_limit_stops_before_budget() {
        struct Slow;

        impl FitnessGateway for Slow {
            fn evaluate(
                &mut self,
                _obstacles: &[ObstacleSpec; 2],
                _cancel: &CancelToken,
            ) -> std::result::Result<ObstacleDistances, EvaluationError> {
                std::thread::sleep(Duration::from_millis(10));
                Ok(ObstacleDistances::new(vec![20.0, 20.0]))
            }
        }

        let config = SearchConfig::default().with_time_limit(40);
        let mut search = ObstacleSearch::new(config, &mission(), Slow, DiscardCases).unwrap();
        let report = search
            .run_with_rng(10_000, &mut StdRng::seed_from_u64(10))
            .unwrap();

        assert!(report.evaluations >= 1);
        assert!(report.evaluations < 100);
        assert!(!report.cancelled);
    }

    #[test]
    fn test_interesting_cases_are_persisted() {
        let mut cases = CollectCases::new();
        let config = SearchConfig::default().with_interesting_distance(5.0);
        let mut search =
            ObstacleSearch::new(config, &mission(), Counting::default(), &mut cases).unwrap();
        let report = search
            .run_with_rng(10, &mut StdRng::seed_from_u64(5))
            .unwrap();
        drop(search);

        // Distances 1..=4 are below 5 m.
        assert_eq!(report.interesting_cases, 4);
        let indices: Vec<u64> = cases.cases.iter().map(|c| c.evaluation).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(cases.cases[0].fitness, 1.0);
        assert_eq!(cases.cases[0].outcome.distances, vec![1.0, 100.0]);
    }

    #[test]
    fn test_timeouts_count_as_failures() {
        let config = SearchConfig::default().with_evaluation_timeout(20);
        let mut search = ObstacleSearch::new(config, &mission(), Hanging, DiscardCases).unwrap();
        let report = search
            .run_with_rng(3, &mut StdRng::seed_from_u64(6))
            .unwrap();

        assert_eq!(report.evaluations, 3);
        assert_eq!(report.failed_evaluations, 3);
        assert!(!report.has_measurement());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = SearchConfig::default().with_seed(77);
        let run = || {
            let gateway = Recording::default();
            let mut search =
                ObstacleSearch::new(config.clone(), &mission(), gateway, DiscardCases).unwrap();
            search.run(30).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.best, b.best);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_mission_outside_area_is_rejected() {
        let far = vec![FlightSegment::new(
            Point2D::new(500.0, 500.0),
            Point2D::new(600.0, 500.0),
        )];
        let result = ObstacleSearch::new(
            SearchConfig::default(),
            &far,
            Counting::default(),
            DiscardCases,
        );
        assert!(matches!(result, Err(Error::NoFlightSegment)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = ObstacleSearch::new(
            SearchConfig::default().with_threshold(-1.0),
            &mission(),
            Counting::default(),
            DiscardCases,
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_cancelled_search_stops() {
        let mut search = ObstacleSearch::new(
            SearchConfig::default(),
            &mission(),
            Counting::default(),
            DiscardCases,
        )
        .unwrap();
        search.cancel_handle().store(true, Ordering::Relaxed);
        assert!(matches!(search.run(10), Err(Error::Cancelled)));
    }
}
