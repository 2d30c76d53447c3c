//! Integration tests for obstacle-search-core.

use obstacle_search_core::climb::{ClimbConfig, ClimbProblem, ClimbRunner};
use obstacle_search_core::fitness::{
    CancelToken, DeadlineGateway, EvaluationError, Fitness, FitnessGateway, ObstacleDistances,
};
use obstacle_search_core::obstacle::{ObstacleConfiguration, ObstacleDimensions, ObstacleSpec};
use obstacle_search_core::transform::Transform2D;
use obstacle_search_core::Result;

mod transform_tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_corners_by_rotation() {
        // 20 x 2 footprint rotated by 90 degrees around (5, 20).
        let t = Transform2D::from_degrees(5.0, 20.0, 90.0);
        let corners = t.transform_array([(10.0, 1.0), (-10.0, 1.0), (-10.0, -1.0), (10.0, -1.0)]);

        assert_relative_eq!(corners[0].0, 4.0, epsilon = 1e-10);
        assert_relative_eq!(corners[0].1, 30.0, epsilon = 1e-10);
        assert_relative_eq!(corners[2].0, 6.0, epsilon = 1e-10);
        assert_relative_eq!(corners[2].1, 10.0, epsilon = 1e-10);
    }
}

mod obstacle_tests {
    use super::*;

    #[test]
    fn test_spec_from_pose_uses_fixed_dimensions() {
        let config = ObstacleConfiguration::new([1.0, 2.0, 30.0, 4.0, 5.0, 60.0]);
        let dims = ObstacleDimensions::default();
        let spec = ObstacleSpec::from_pose(config.pose(1), &dims);

        assert_eq!(spec.x, 4.0);
        assert_eq!(spec.y, 5.0);
        assert_eq!(spec.rotation, 60.0);
        assert_eq!(spec.length, 20.0);
        assert_eq!(spec.width, 2.0);
        assert_eq!(spec.height, 25.0);
        assert_eq!(spec.z, 0.0);
    }
}

mod climb_with_gateway_tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    /// Fails every other call; otherwise reports the x offset of the first obstacle.
    struct Flaky {
        calls: u32,
    }

    impl FitnessGateway for Flaky {
        fn evaluate(
            &mut self,
            obstacles: &[ObstacleSpec; 2],
            _cancel: &CancelToken,
        ) -> std::result::Result<ObstacleDistances, EvaluationError> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                return Err(EvaluationError::Simulator("px4 crashed".into()));
            }
            Ok(ObstacleDistances::new(vec![obstacles[0].x.abs(), 30.0]))
        }
    }

    struct Shift {
        gateway: DeadlineGateway<Flaky>,
        dims: ObstacleDimensions,
    }

    impl ClimbProblem for Shift {
        type Solution = ObstacleConfiguration;

        fn initial_solution<R: Rng>(&mut self, _rng: &mut R) -> Result<ObstacleConfiguration> {
            Ok(ObstacleConfiguration::new([12.0, 20.0, 0.0, 0.0, 30.0, 0.0]))
        }

        fn neighbor<R: Rng>(
            &mut self,
            parent: &ObstacleConfiguration,
            rng: &mut R,
        ) -> Result<ObstacleConfiguration> {
            let step = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            Ok(parent.with_value(0, parent.get(0) + step))
        }

        fn evaluate(&mut self, solution: &ObstacleConfiguration, _evaluation: u64) -> Fitness {
            let specs = [
                ObstacleSpec::from_pose(solution.pose(0), &self.dims),
                ObstacleSpec::from_pose(solution.pose(1), &self.dims),
            ];
            Fitness::from_outcome(&self.gateway.evaluate(&specs, &CancelToken::new()))
        }
    }

    #[test]
    fn test_failures_never_replace_measured_parent() {
        let problem = Shift {
            gateway: DeadlineGateway::with_timeout_ms(Flaky { calls: 0 }, 5_000),
            dims: ObstacleDimensions::default(),
        };
        let config = ClimbConfig::new().with_budget(60).with_stagnation_limit(8);
        let mut runner = ClimbRunner::new(config, problem);
        let result = runner.run_with_rng(&mut StdRng::seed_from_u64(11)).unwrap();

        assert_eq!(result.evaluations, 60);
        assert_eq!(result.failed_evaluations, 30);
        assert!(!result.best_fitness.is_failed());
        assert!(!result.parent_fitness.is_failed());
        assert!(result.history.iter().all(|f| f.is_finite()));
        assert!(result.best_fitness.value() <= 12.0);
    }
}
