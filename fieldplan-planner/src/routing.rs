//! Native capacitated routing backend.
//!
//! Routes are built one vehicle at a time by repeatedly following the most
//! constrained arc that still lets the vehicle return within the cap, then
//! improved by first-improvement local search (relocating a stop anywhere in
//! the fleet, and reversing a segment inside one route) against the full
//! objective until no move helps, the pass budget runs out or the time limit
//! passes.

use std::cmp::Reverse;
use std::time::Instant;

use fieldplan_core::{RoutingError, RoutingProblem, VehicleRoutingSolver};
use log::debug;

/// Construction plus local-search solver for [`RoutingProblem`]s.
///
/// # Examples
///
/// ```
/// use fieldplan_core::{DistanceMatrix, RoutingParams, RoutingProblem, VehicleRoutingSolver};
/// use fieldplan_planner::InsertionRoutingSolver;
///
/// # fn main() -> Result<(), fieldplan_core::RoutingError> {
/// // Two stops 100 m either side of the depot (node 2).
/// let positions = [0_u64, 200, 100];
/// let matrix = DistanceMatrix::from_fn(3, |a, b| positions[a].abs_diff(positions[b]));
/// let params = RoutingParams {
///     num_vehicles: 2,
///     max_distance_meters: 250,
///     slack_routes: 2,
///     ..RoutingParams::default()
/// };
/// let problem = RoutingProblem::new(matrix, params)?;
/// let routes = InsertionRoutingSolver::default().solve(&problem)?;
/// assert_eq!(routes.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InsertionRoutingSolver {
    improvement_passes: usize,
}

impl Default for InsertionRoutingSolver {
    fn default() -> Self {
        Self {
            improvement_passes: 256,
        }
    }
}

impl InsertionRoutingSolver {
    /// Cap the number of improving moves; zero keeps the constructed routes.
    #[must_use]
    pub const fn with_improvement_passes(mut self, passes: usize) -> Self {
        self.improvement_passes = passes;
        self
    }
}

impl VehicleRoutingSolver for InsertionRoutingSolver {
    fn solve(&self, problem: &RoutingProblem) -> Result<Vec<Vec<usize>>, RoutingError> {
        if let Some(stop) = problem.unservable_stop() {
            return Err(RoutingError::Infeasible {
                reason: format!(
                    "stop {stop} needs {} but the cap is {}",
                    problem.transit(&[stop]),
                    problem.params().max_distance_meters
                ),
            });
        }
        let deadline = Instant::now() + problem.params().time_limit();
        let mut routes = construct(problem)?;
        let constructed = problem.objective(&routes);
        let moves = improve(problem, &mut routes, deadline, self.improvement_passes);
        routes.retain(|route| !route.is_empty());
        routes.sort_by_key(|route| Reverse(problem.credited_distance(route)));
        debug!(
            "routed {} stops on {} vehicles: objective {constructed} -> {} after {moves} moves",
            problem.stop_count(),
            routes.len(),
            problem.objective(&routes)
        );
        Ok(routes)
    }
}

/// Build routes vehicle by vehicle.
///
/// Among stops the vehicle can still reach and return from, the one leaving
/// the least spare distance under the cap wins (the most constrained arc);
/// ties prefer the shorter leg, then the lowest index.
fn construct(problem: &RoutingProblem) -> Result<Vec<Vec<usize>>, RoutingError> {
    let depot = problem.depot();
    let cap = problem.params().max_distance_meters;
    let mut pending = vec![true; problem.stop_count()];
    let mut remaining = problem.stop_count();
    let mut routes = Vec::new();
    while remaining > 0 {
        if routes.len() == problem.params().num_vehicles {
            return Err(RoutingError::Infeasible {
                reason: format!(
                    "{remaining} stops left after filling {} vehicles",
                    routes.len()
                ),
            });
        }
        let mut route = Vec::new();
        let mut current = depot;
        let mut travelled = 0_u64;
        loop {
            let next = pending
                .iter()
                .enumerate()
                .filter(|(_, waiting)| **waiting)
                .filter_map(|(stop, _)| {
                    let leg = problem.arc(current, stop);
                    let total = travelled
                        .saturating_add(leg)
                        .saturating_add(problem.arc(stop, depot));
                    cap.checked_sub(total).map(|spare| (spare, leg, stop))
                })
                .min();
            let Some((_, leg, stop)) = next else {
                break;
            };
            if let Some(waiting) = pending.get_mut(stop) {
                *waiting = false;
            }
            route.push(stop);
            remaining -= 1;
            travelled = travelled.saturating_add(leg);
            current = stop;
        }
        if route.is_empty() {
            return Err(RoutingError::Infeasible {
                reason: "no remaining stop fits on an empty vehicle".to_owned(),
            });
        }
        routes.push(route);
    }
    Ok(routes)
}

enum Step {
    Improved,
    Exhausted,
    OutOfTime,
}

/// Apply improving moves until none is left; returns how many were applied.
fn improve(
    problem: &RoutingProblem,
    routes: &mut Vec<Vec<usize>>,
    deadline: Instant,
    passes: usize,
) -> usize {
    if routes.len() < problem.params().num_vehicles {
        routes.resize(problem.params().num_vehicles, Vec::new());
    }
    let mut best = problem.objective(routes);
    let mut applied = 0;
    while applied < passes {
        let step = match relocate(problem, routes, &mut best, deadline) {
            Step::Exhausted => reverse_segment(problem, routes, &mut best, deadline),
            other => other,
        };
        match step {
            Step::Improved => applied += 1,
            Step::Exhausted | Step::OutOfTime => break,
        }
    }
    applied
}

fn within_cap(problem: &RoutingProblem, route: &[usize]) -> bool {
    problem.transit(route) <= problem.params().max_distance_meters
}

/// Fleet with the stop at `position` of route `from` taken out.
fn without_stop(
    routes: &[Vec<usize>],
    from: usize,
    position: usize,
) -> Option<(Vec<Vec<usize>>, usize)> {
    let mut without = routes.to_vec();
    let route = without.get_mut(from)?;
    if position >= route.len() {
        return None;
    }
    let stop = route.remove(position);
    Some((without, stop))
}

/// Move one stop to another position, possibly on another vehicle.
fn relocate(
    problem: &RoutingProblem,
    routes: &mut Vec<Vec<usize>>,
    best: &mut u64,
    deadline: Instant,
) -> Step {
    let lengths: Vec<usize> = routes.iter().map(Vec::len).collect();
    for (from, &length) in lengths.iter().enumerate() {
        for position in 0..length {
            let Some((without, stop)) = without_stop(routes, from, position) else {
                continue;
            };
            if !without.get(from).is_some_and(|route| within_cap(problem, route)) {
                continue;
            }
            for (to, target) in without.iter().enumerate() {
                for slot in 0..=target.len() {
                    if to == from && slot == position {
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Step::OutOfTime;
                    }
                    let mut receiving = target.clone();
                    receiving.insert(slot, stop);
                    if !within_cap(problem, &receiving) {
                        continue;
                    }
                    let mut candidate = without.clone();
                    if let Some(route) = candidate.get_mut(to) {
                        *route = receiving;
                    }
                    let score = problem.objective(&candidate);
                    if score < *best {
                        *best = score;
                        *routes = candidate;
                        return Step::Improved;
                    }
                }
            }
        }
    }
    Step::Exhausted
}

/// Reverse a stretch of stops inside one route (2-opt).
fn reverse_segment(
    problem: &RoutingProblem,
    routes: &mut [Vec<usize>],
    best: &mut u64,
    deadline: Instant,
) -> Step {
    for index in 0..routes.len() {
        let Some(current) = routes.get(index).cloned() else {
            continue;
        };
        for start in 0..current.len() {
            for end in start + 1..current.len() {
                if Instant::now() >= deadline {
                    return Step::OutOfTime;
                }
                let mut candidate = current.clone();
                if let Some(segment) = candidate.get_mut(start..=end) {
                    segment.reverse();
                }
                if !within_cap(problem, &candidate) {
                    continue;
                }
                let Some(slot) = routes.get_mut(index) else {
                    continue;
                };
                *slot = candidate;
                let score = problem.objective(routes);
                if score < *best {
                    *best = score;
                    return Step::Improved;
                }
                if let Some(route) = routes.get_mut(index) {
                    route.clone_from(&current);
                }
            }
        }
    }
    Step::Exhausted
}
