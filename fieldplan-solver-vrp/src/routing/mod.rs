//! `vrp-core` backends for the macro-routing and tour traits.

use std::sync::Arc;
use std::time::Instant;

use fieldplan_core::{
    RoutingError, RoutingProblem, TspError, TspProblem, TspSolver, VehicleRoutingSolver,
};
use log::debug;

use crate::vrp::{
    MatrixTransportCost, routing_goal, routing_model, run_search, tour_goal, tour_model,
    vehicle_slot, visited_locations,
};

/// Configuration for the `vrp-core` solvers.
#[derive(Debug, Clone)]
pub struct VrpSolverConfig {
    /// Upper bound on `vrp-core` generations.
    pub max_generations: usize,
}

impl Default for VrpSolverConfig {
    fn default() -> Self {
        Self {
            max_generations: 50,
        }
    }
}

/// Distance-capped vehicle routing using the `vrp-core` metaheuristics.
///
/// Every vehicle slot becomes a `vrp-core` vehicle whose latest return time
/// equals the distance cap. The search minimises unassigned stops first, then
/// [`RoutingProblem::objective`]. The problem's time limit bounds the search
/// alongside the generation budget. Any stop left unassigned makes the whole
/// depot infeasible.
#[derive(Debug, Clone, Default)]
pub struct VrpRoutingSolver {
    config: VrpSolverConfig,
}

impl VrpRoutingSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: VrpSolverConfig) -> Self {
        Self { config }
    }
}

impl VehicleRoutingSolver for VrpRoutingSolver {
    fn solve(&self, problem: &RoutingProblem) -> Result<Vec<Vec<usize>>, RoutingError> {
        if problem.stop_count() == 0 {
            return Ok(Vec::new());
        }
        if let Some(stop) = problem.unservable_stop() {
            return Err(RoutingError::Infeasible {
                reason: format!(
                    "stop {stop} cannot be reached and left within {} m",
                    problem.params().max_distance_meters
                ),
            });
        }
        let started_at = Instant::now();
        let backend = |message: String| RoutingError::Backend { message };

        let transport = Arc::new(MatrixTransportCost::new(problem.matrix()));
        let goal = routing_goal(problem, transport.clone()).map_err(|err| backend(err.to_string()))?;
        let model =
            routing_model(problem, transport, goal).map_err(|err| backend(err.to_string()))?;
        let solution = run_search(
            model,
            self.config.max_generations,
            Some(problem.params().time_limit_seconds),
        )
        .map_err(backend)?;

        if !solution.unassigned.is_empty() {
            return Err(RoutingError::Infeasible {
                reason: format!(
                    "{} of {} stops left unassigned with {} vehicles",
                    solution.unassigned.len(),
                    problem.stop_count(),
                    problem.params().num_vehicles
                ),
            });
        }

        let mut slotted: Vec<(usize, Vec<usize>)> = solution
            .routes
            .iter()
            .map(|route| (vehicle_slot(route), visited_locations(route)))
            .filter(|(_, stops)| !stops.is_empty())
            .collect();
        slotted.sort_by_key(|(slot, _)| *slot);
        let routes: Vec<Vec<usize>> = slotted.into_iter().map(|(_, stops)| stops).collect();
        debug!(
            "vrp-core routed {} stops into {} routes in {:?} (objective {})",
            problem.stop_count(),
            routes.len(),
            started_at.elapsed(),
            problem.objective(&routes)
        );
        Ok(routes)
    }
}

/// Closed tours using a single `vrp-core` vehicle.
#[derive(Debug, Clone, Default)]
pub struct VrpTourSolver {
    config: VrpSolverConfig,
}

impl VrpTourSolver {
    /// Construct a solver using default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a solver with explicit configuration.
    #[must_use]
    pub const fn with_config(config: VrpSolverConfig) -> Self {
        Self { config }
    }
}

impl TspSolver for VrpTourSolver {
    fn solve(&self, problem: &TspProblem) -> Result<Vec<usize>, TspError> {
        let stops = problem.stop_count();
        if stops == 0 {
            return Ok(Vec::new());
        }
        let backend = |message: String| TspError::Backend { message };

        let transport = Arc::new(MatrixTransportCost::new(problem.matrix()));
        let goal = tour_goal(transport.clone()).map_err(|err| backend(err.to_string()))?;
        let model = tour_model(stops, transport, goal).map_err(|err| backend(err.to_string()))?;
        let solution = run_search(model, self.config.max_generations, None).map_err(backend)?;

        let order: Vec<usize> = solution.routes.iter().flat_map(visited_locations).collect();
        if order.len() != stops {
            return Err(backend(format!(
                "tour visits {} of {stops} stops",
                order.len()
            )));
        }
        debug!(
            "vrp-core toured {stops} stops at cost {}",
            problem.tour_cost(&order)
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests;
