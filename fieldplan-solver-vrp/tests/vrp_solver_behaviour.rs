//! Behavioural tests for the `vrp-core` backends using rstest-bdd.

use std::cell::RefCell;

use fieldplan_core::test_support::{metric_crs, scattered_targets, square_region};
use fieldplan_core::{
    DepotParams, DistanceMatrix, Layer, PlanningConfig, PlanningError, RoutingError,
    RoutingParams, RoutingProblem, TessellationParams, VehicleRoutingSolver,
};
use fieldplan_planner::{IlpSetCoverSolver, Planner, PlanningReport};
use fieldplan_solver_vrp::{VrpRoutingSolver, VrpSolverConfig, VrpTourSolver};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

type VrpPlanner = Planner<IlpSetCoverSolver, VrpRoutingSolver, VrpTourSolver>;

#[derive(Default)]
struct VrpWorld {
    stops: RefCell<Vec<(f64, f64)>>,
    params: RefCell<RoutingParams>,
    problem: RefCell<Option<RoutingProblem>>,
    routes: RefCell<Option<Result<Vec<Vec<usize>>, RoutingError>>>,
    planner: RefCell<Option<VrpPlanner>>,
    report: RefCell<Option<Result<PlanningReport, PlanningError>>>,
}

impl VrpWorld {
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn routes(&self) -> Result<Vec<Vec<usize>>, RoutingError> {
        self.routes
            .borrow()
            .clone()
            .expect("routing should run before assertions")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn problem(&self) -> RoutingProblem {
        self.problem
            .borrow()
            .clone()
            .expect("routing should run before assertions")
    }
}

const fn quick() -> VrpSolverConfig {
    VrpSolverConfig {
        max_generations: 20,
    }
}

#[fixture]
fn world() -> VrpWorld {
    VrpWorld::default()
}

#[given("six stops spread around a depot")]
fn given_six_stops(world: &VrpWorld) {
    world.stops.replace(vec![
        (20.0, 0.0),
        (0.0, 20.0),
        (-20.0, 0.0),
        (0.0, -20.0),
        (30.0, 30.0),
        (-30.0, -30.0),
    ]);
}

#[given("a stop 70 metres from the depot")]
fn given_far_stop(world: &VrpWorld) {
    world.stops.replace(vec![(10.0, 0.0), (70.0, 0.0)]);
}

#[given("a fleet of three vehicles with a 120 metre cap")]
fn given_fleet(world: &VrpWorld) {
    world.params.replace(RoutingParams {
        num_vehicles: 3,
        max_distance_meters: 120,
        distance_slack: 10,
        distance_slack_penalty: 1,
        slack_routes: 2,
        time_limit_seconds: 5,
    });
}

#[when("the vrp-core router solves the depot")]
#[expect(
    clippy::expect_used,
    clippy::float_arithmetic,
    reason = "behaviour tests use expect for readable failures and float coordinates"
)]
fn when_router_solves(world: &VrpWorld) {
    let mut points = world.stops.borrow().clone();
    points.push((0.0, 0.0));
    let at = |node: usize| points.get(node).copied().unwrap_or_default();
    let matrix = DistanceMatrix::from_fn(points.len(), |from, to| {
        let ((ax, ay), (bx, by)) = (at(from), at(to));
        whole_metres((ax - bx).hypot(ay - by))
    });
    let problem =
        RoutingProblem::new(matrix, world.params.borrow().clone()).expect("valid problem");
    let routes = VrpRoutingSolver::with_config(quick()).solve(&problem);
    world.problem.replace(Some(problem));
    world.routes.replace(Some(routes));
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "test distances are small and non-negative"
)]
fn whole_metres(metres: f64) -> u64 {
    metres.ceil() as u64
}

#[then("every stop is routed exactly once")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_every_stop_routed(world: &VrpWorld) {
    let routes = world.routes().expect("expected routing success");
    let mut visited: Vec<usize> = routes.into_iter().flatten().collect();
    visited.sort_unstable();
    assert_eq!(visited, (0..world.stops.borrow().len()).collect::<Vec<_>>());
}

#[then("no route exceeds the cap")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_within_cap(world: &VrpWorld) {
    let problem = world.problem();
    let routes = world.routes().expect("expected routing success");
    for route in &routes {
        assert!(problem.transit(route) <= 120, "{route:?}");
    }
}

#[then("routing fails as infeasible")]
fn then_infeasible(world: &VrpWorld) {
    assert!(matches!(
        world.routes(),
        Err(RoutingError::Infeasible { .. })
    ));
}

#[given("a planner using the vrp-core backends")]
fn given_vrp_planner(world: &VrpWorld) {
    let config = PlanningConfig {
        tessellation: TessellationParams::default()
            .with_target_cell_area_square_meters(2_500.0)
            .with_seed(5),
        depots: DepotParams {
            depot_radius_meters: 80.0,
            grid_density: 4,
        },
        routing: RoutingParams {
            num_vehicles: 6,
            max_distance_meters: 400,
            distance_slack: 20,
            distance_slack_penalty: 10,
            slack_routes: 3,
            time_limit_seconds: 2,
        },
    };
    world.planner.replace(Some(Planner::with_solvers(
        config,
        IlpSetCoverSolver,
        VrpRoutingSolver::with_config(quick()),
        VrpTourSolver::with_config(quick()),
    )));
}

#[when("a 150 metre square field with 20 targets is planned")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn when_field_planned(world: &VrpWorld) {
    let region = square_region(150.0);
    let targets = Layer::new(metric_crs(), scattered_targets(20, region.extent(), 8));
    let outcome = world
        .planner
        .borrow()
        .as_ref()
        .expect("planner should be configured first")
        .plan(&region, &targets);
    world.report.replace(Some(outcome));
}

#[then("every target is on a micro route")]
#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn then_targets_routed(world: &VrpWorld) {
    let report = world
        .report
        .borrow()
        .clone()
        .expect("planning should run before assertions")
        .expect("expected planning success");
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    let routed: usize = report
        .micro_routes
        .iter()
        .map(|route| route.target_ids.len())
        .sum();
    assert_eq!(routed, 20);
}

#[scenario(path = "tests/features/vrp_solver.feature", index = 0)]
fn depot_is_routed(world: VrpWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/vrp_solver.feature", index = 1)]
fn far_stop_is_infeasible(world: VrpWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/vrp_solver.feature", index = 2)]
fn planner_runs_on_vrp_core(world: VrpWorld) {
    let _ = world;
}
