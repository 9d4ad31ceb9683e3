//! `vrp-core` modelling helpers shared by the routing and tour solvers.
//!
//! Both solvers hand `vrp-core` the same integer matrix they were given, with
//! durations equal to distances. A vehicle's latest return time then acts as
//! its distance cap, which is how the macro-routing cap is enforced.

use std::sync::Arc;

use fieldplan_core::{DistanceMatrix, RoutingProblem};
use vrp_core::models::common::{Location, Profile};
use vrp_core::models::problem::TravelTime;
use vrp_core::models::solution::Route as VrpRoute;
use vrp_core::prelude::*;

custom_dimension!(VehicleSlot typeof usize);

/// Integer metres as a `vrp-core` cost.
#[expect(
    clippy::cast_precision_loss,
    reason = "route costs are far below 2^52 metres"
)]
pub(crate) const fn metres(value: u64) -> f64 {
    value as f64
}

/// Row-major copy of a [`DistanceMatrix`] used as both distance and duration.
pub(crate) struct MatrixTransportCost {
    size: usize,
    costs: Vec<f64>,
}

impl MatrixTransportCost {
    pub(crate) fn new(matrix: &DistanceMatrix<u64>) -> Self {
        let costs = matrix
            .rows()
            .flat_map(|row| row.iter().map(|&cost| metres(cost)))
            .collect();
        Self {
            size: matrix.size(),
            costs,
        }
    }

    fn cost(&self, from: Location, to: Location) -> f64 {
        let result = from
            .checked_mul(self.size)
            .and_then(|offset| offset.checked_add(to))
            .and_then(|index| self.costs.get(index))
            .copied();
        debug_assert!(
            result.is_some(),
            "matrix lookup failed: from={from}, to={to}"
        );
        result.unwrap_or(f64::MAX)
    }
}

impl TransportCost for MatrixTransportCost {
    // The trait passes the route and departure time for time-dependent
    // costs; a static matrix ignores both.
    fn distance(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> Cost {
        self.cost(from, to)
    }

    fn duration(
        &self,
        _route: &VrpRoute,
        from: Location,
        to: Location,
        _departure: TravelTime,
    ) -> f64 {
        self.cost(from, to)
    }

    fn distance_approx(&self, profile: &Profile, from: usize, to: usize) -> f64 {
        self.duration_approx(profile, from, to)
    }

    fn duration_approx(&self, _profile: &Profile, from: usize, to: usize) -> f64 {
        self.cost(from, to)
    }
}

/// Job locations of a solved route in visiting order. Start and end
/// activities carry no job and are skipped.
pub(crate) fn visited_locations(route: &VrpRoute) -> Vec<Location> {
    route
        .tour
        .all_activities()
        .filter(|activity| activity.job.is_some())
        .map(|activity| activity.place.location)
        .collect()
}

/// Vehicle slot a solved route was driven by.
pub(crate) fn vehicle_slot(route: &VrpRoute) -> usize {
    route
        .actor
        .vehicle
        .dimens
        .get_vehicle_slot()
        .copied()
        .unwrap_or(usize::MAX)
}

/// Scores a solution with [`RoutingProblem::objective`]: transit plus the
/// soft lower-bound penalty on the penalised vehicle slots.
struct PlanObjective {
    problem: RoutingProblem,
}

impl FeatureObjective for PlanObjective {
    fn fitness(&self, solution: &InsertionContext) -> Cost {
        let routes: Vec<Vec<usize>> = solution
            .solution
            .routes
            .iter()
            .map(|route_ctx| visited_locations(route_ctx.route()))
            .collect();
        metres(self.problem.objective(&routes))
    }

    fn estimate(&self, _move_ctx: &MoveContext<'_>) -> Cost {
        // The penalty depends on the ranking of whole routes, so insertions
        // are guided by the transport objective alone.
        0.0
    }
}

fn backend_error(err: &impl std::fmt::Display) -> String {
    err.to_string()
}

/// Goal for macro routing: assign every cell, then minimise the combined
/// objective, then raw distance.
pub(crate) fn routing_goal(
    problem: &RoutingProblem,
    transport: Arc<dyn TransportCost>,
) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let plan_feature = FeatureBuilder::default()
        .with_name("min-plan-objective")
        .with_objective(PlanObjective {
            problem: problem.clone(),
        })
        .build()?;
    let transport_feature = TransportFeatureBuilder::new("min-distance")
        .set_transport_cost(transport)
        .set_time_constrained(true)
        .build_minimize_distance()?;

    GoalContextBuilder::with_features(&[minimize_unassigned, plan_feature, transport_feature])?
        .build()
}

/// One job per stop and one vehicle per slot, all based at the depot with a
/// latest return at the distance cap.
pub(crate) fn routing_model(
    problem: &RoutingProblem,
    transport: Arc<dyn TransportCost>,
    goal: GoalContext,
) -> GenericResult<Problem> {
    let jobs = (0..problem.stop_count())
        .map(|stop| {
            SingleBuilder::default()
                .id(format!("stop{stop}").as_str())
                .location(stop)?
                .build_as_job()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let depot = problem.depot();
    let cap = metres(problem.params().max_distance_meters);
    let vehicles = (0..problem.params().num_vehicles)
        .map(|slot| {
            VehicleBuilder::default()
                .id(format!("vehicle{slot}").as_str())
                .dimension(|dimens| {
                    dimens.set_vehicle_slot(slot);
                })
                .add_detail(
                    VehicleDetailBuilder::default()
                        .set_start_location(depot)
                        .set_start_time(0.0)
                        .set_end_location(depot)
                        .set_end_time(cap)
                        .build()?,
                )
                .build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(vehicles.into_iter())
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

/// Goal for closed tours: visit every stop, then minimise distance.
pub(crate) fn tour_goal(transport: Arc<dyn TransportCost>) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-distance")
        .set_transport_cost(transport)
        .set_time_constrained(false)
        .build_minimize_distance()?;
    GoalContextBuilder::with_features(&[minimize_unassigned, transport_feature])?.build()
}

/// One job per stop and a single vehicle starting and ending at node 0.
pub(crate) fn tour_model(
    stop_count: usize,
    transport: Arc<dyn TransportCost>,
    goal: GoalContext,
) -> GenericResult<Problem> {
    let jobs = (1..=stop_count)
        .map(|node| {
            SingleBuilder::default()
                .id(format!("target{node}").as_str())
                .location(node)?
                .build_as_job()
        })
        .collect::<Result<Vec<_>, _>>()?;
    let vehicle = VehicleBuilder::default()
        .id("surveyor")
        .add_detail(
            VehicleDetailBuilder::default()
                .set_start_location(0)
                .set_end_location(0)
                .build()?,
        )
        .build()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(std::iter::once(vehicle))
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

/// Run the `vrp-core` search on `problem`.
pub(crate) fn run_search(
    problem: Problem,
    max_generations: usize,
    max_seconds: Option<u64>,
) -> Result<Solution, String> {
    let shared = Arc::new(problem);
    let max_time = max_seconds.map(|seconds| usize::try_from(seconds).unwrap_or(usize::MAX));
    let config = VrpConfigBuilder::new(shared.clone())
        .prebuild()
        .map_err(|err| backend_error(&err))?
        .with_max_generations(Some(max_generations))
        .with_max_time(max_time)
        .build()
        .map_err(|err| backend_error(&err))?;
    vrp_core::solver::Solver::new(shared, config)
        .solve()
        .map_err(|err| backend_error(&err))
}
