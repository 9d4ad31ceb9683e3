use fieldplan_core::{DistanceMatrix, RoutingParams};
use rstest::{fixture, rstest};

use super::*;

/// Stops on a line at the given offsets with the depot at 0, appended last.
fn line_problem(offsets: &[i64], params: RoutingParams) -> RoutingProblem {
    let position = |node: usize| offsets.get(node).copied().unwrap_or(0);
    let matrix = DistanceMatrix::from_fn(offsets.len() + 1, |from, to| {
        position(from).abs_diff(position(to))
    });
    RoutingProblem::new(matrix, params).expect("valid problem")
}

#[fixture]
fn params() -> RoutingParams {
    RoutingParams {
        num_vehicles: 3,
        max_distance_meters: 100,
        distance_slack: 0,
        distance_slack_penalty: 1,
        slack_routes: 3,
        time_limit_seconds: 5,
    }
}

fn quick() -> VrpSolverConfig {
    VrpSolverConfig { max_generations: 20 }
}

#[rstest]
fn routes_every_stop_within_the_cap(params: RoutingParams) {
    let problem = line_problem(&[10, 20, 30, 40, 45], params);
    let routes = VrpRoutingSolver::with_config(quick())
        .solve(&problem)
        .expect("solve should succeed");
    assert!(problem.check_solution(&routes).is_ok(), "{routes:?}");
}

#[rstest]
fn splits_stops_when_one_vehicle_cannot_reach_all(params: RoutingParams) {
    let problem = line_problem(&[45, 40, 5], RoutingParams {
        max_distance_meters: 90,
        ..params
    });
    let routes = VrpRoutingSolver::with_config(quick())
        .solve(&problem)
        .expect("solve should succeed");
    assert!(problem.check_solution(&routes).is_ok());
}

#[rstest]
fn unreachable_stop_is_infeasible(params: RoutingParams) {
    let problem = line_problem(&[10, 80], params);
    let err = VrpRoutingSolver::new()
        .solve(&problem)
        .expect_err("stop 1 needs 160 m");
    assert!(matches!(err, RoutingError::Infeasible { .. }));
}

#[rstest]
fn too_few_vehicles_is_infeasible(params: RoutingParams) {
    // Stops on opposite sides of the depot cannot share a vehicle.
    let problem = line_problem(&[45, -45], RoutingParams {
        num_vehicles: 1,
        slack_routes: 1,
        ..params
    });
    let err = VrpRoutingSolver::with_config(quick())
        .solve(&problem)
        .expect_err("both stops need their own vehicle");
    assert!(matches!(err, RoutingError::Infeasible { .. }));
}

#[rstest]
fn depot_without_stops_has_no_routes(params: RoutingParams) {
    let problem = line_problem(&[], params);
    assert_eq!(VrpRoutingSolver::new().solve(&problem), Ok(Vec::new()));
}

#[rstest]
#[expect(clippy::indexing_slicing, reason = "test matrix has known dimensions")]
fn tour_visits_every_stop_once() {
    let xs = [0_u64, 30, 10, 20, 50];
    let problem = TspProblem::new(DistanceMatrix::from_fn(xs.len(), |a, b| {
        xs[a].abs_diff(xs[b])
    }))
    .expect("valid problem");
    let order = VrpTourSolver::with_config(quick())
        .solve(&problem)
        .expect("tour should solve");
    assert!(problem.check_order(&order).is_ok(), "{order:?}");
    assert_eq!(problem.tour_cost(&order), 100);
}

#[rstest]
fn empty_tour_is_empty() {
    let problem = TspProblem::new(DistanceMatrix::from_fn(1, |_, _| 0)).expect("valid problem");
    assert_eq!(VrpTourSolver::new().solve(&problem), Ok(Vec::new()));
}
