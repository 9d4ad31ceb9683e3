//! Pluggable optimisation backends.
//!
//! The planner talks to its three combinatorial solvers through these traits
//! so exact and heuristic backends can be swapped without touching stage
//! orchestration. Problems are plain data; solvers must be `Send + Sync` so
//! per-depot and per-route solves can run on worker threads.

use std::cmp::Reverse;
use std::collections::HashSet;

use thiserror::Error;

use crate::matrix::DistanceMatrix;
use crate::params::RoutingParams;

/// Errors returned by [`SetCoverSolver::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetCoverError {
    /// No candidate covers an element, so no cover exists.
    #[error("element {element} cannot be covered by any candidate")]
    Infeasible {
        /// First uncoverable element.
        element: usize,
    },
    /// A covering list referenced a candidate outside the problem.
    #[error("element {element} references unknown candidate {candidate}")]
    InvalidCandidate {
        /// Element holding the bad reference.
        element: usize,
        /// Out-of-range candidate index.
        candidate: usize,
    },
    /// The backend failed for another reason.
    #[error("set-cover backend failed: {message}")]
    Backend {
        /// Backend diagnostic.
        message: String,
    },
}

/// A minimum set-cover instance.
///
/// Element `i` is covered by the candidates listed in `covering[i]`.
///
/// # Examples
///
/// ```
/// use fieldplan_core::SetCoverProblem;
///
/// # fn main() -> Result<(), fieldplan_core::SetCoverError> {
/// let problem = SetCoverProblem::new(3, vec![vec![0, 2], vec![1, 2]])?;
/// assert!(problem.is_cover(&[2]));
/// assert_eq!(problem.first_uncovered(&[0]), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCoverProblem {
    candidate_count: usize,
    covering: Vec<Vec<usize>>,
}

impl SetCoverProblem {
    /// Build an instance, checking every candidate reference.
    pub fn new(candidate_count: usize, covering: Vec<Vec<usize>>) -> Result<Self, SetCoverError> {
        for (element, candidates) in covering.iter().enumerate() {
            if let Some(&candidate) = candidates.iter().find(|&&c| c >= candidate_count) {
                return Err(SetCoverError::InvalidCandidate { element, candidate });
            }
        }
        Ok(Self {
            candidate_count,
            covering,
        })
    }

    /// Number of candidates.
    #[must_use]
    pub const fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    /// Number of elements to cover.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.covering.len()
    }

    /// Covering candidates for each element.
    #[must_use]
    pub fn covering(&self) -> &[Vec<usize>] {
        &self.covering
    }

    /// First element no candidate covers.
    #[must_use]
    pub fn uncoverable_element(&self) -> Option<usize> {
        self.covering.iter().position(Vec::is_empty)
    }

    /// First element not covered by `selected`.
    #[must_use]
    pub fn first_uncovered(&self, selected: &[usize]) -> Option<usize> {
        let chosen: HashSet<usize> = selected.iter().copied().collect();
        self.covering
            .iter()
            .position(|candidates| !candidates.iter().any(|c| chosen.contains(c)))
    }

    /// Whether `selected` covers every element.
    #[must_use]
    pub fn is_cover(&self, selected: &[usize]) -> bool {
        self.first_uncovered(selected).is_none()
    }
}

/// Selects a minimum set of candidates covering every element.
pub trait SetCoverSolver: Send + Sync {
    /// Return selected candidate indices in ascending order.
    fn solve(&self, problem: &SetCoverProblem) -> Result<Vec<usize>, SetCoverError>;
}

/// Errors returned by [`VehicleRoutingSolver::solve`] and problem construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The problem itself is malformed.
    #[error("invalid routing problem: {reason}")]
    InvalidProblem {
        /// Explanation.
        reason: String,
    },
    /// No assignment satisfies the distance cap with the available fleet.
    #[error("routing infeasible: {reason}")]
    Infeasible {
        /// Explanation.
        reason: String,
    },
    /// A backend returned routes that break the problem's constraints.
    #[error("routing solution rejected: {reason}")]
    InvalidSolution {
        /// Explanation.
        reason: String,
    },
    /// The backend failed for another reason.
    #[error("routing backend failed: {message}")]
    Backend {
        /// Backend diagnostic.
        message: String,
    },
}

/// A single-depot, distance-capped vehicle routing instance.
///
/// Nodes `0..n` are stops and node `n` (the last row) is the depot. Costs are
/// integral metres. Each vehicle's transit (sum of arc costs from depot back to
/// depot) must not exceed `max_distance_meters`. The first
/// [`RoutingParams::penalised_vehicles`] vehicle slots carry a soft lower bound
/// at `max_distance_meters`: every node a route touches before returning may
/// pad the cumulative distance by up to `distance_slack`, and any remaining
/// shortfall costs `distance_slack_penalty` per metre. Routes fill slots
/// longest-credit first, which minimises the total penalty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingProblem {
    matrix: DistanceMatrix<u64>,
    params: RoutingParams,
}

impl RoutingProblem {
    /// Build an instance whose depot is the matrix's last node.
    pub fn new(matrix: DistanceMatrix<u64>, params: RoutingParams) -> Result<Self, RoutingError> {
        if matrix.size() == 0 {
            return Err(RoutingError::InvalidProblem {
                reason: "matrix must contain the depot node".to_owned(),
            });
        }
        params
            .validate()
            .map_err(|err| RoutingError::InvalidProblem {
                reason: err.to_string(),
            })?;
        Ok(Self { matrix, params })
    }

    /// Cost matrix including the depot.
    #[must_use]
    pub const fn matrix(&self) -> &DistanceMatrix<u64> {
        &self.matrix
    }

    /// Routing parameters.
    #[must_use]
    pub const fn params(&self) -> &RoutingParams {
        &self.params
    }

    /// Depot node index.
    #[must_use]
    pub const fn depot(&self) -> usize {
        self.matrix.size().saturating_sub(1)
    }

    /// Number of stops to serve.
    #[must_use]
    pub const fn stop_count(&self) -> usize {
        self.depot()
    }

    /// Arc cost; out-of-range nodes cost `u64::MAX`.
    #[must_use]
    pub fn arc(&self, from: usize, to: usize) -> u64 {
        self.matrix.get(from, to).unwrap_or(u64::MAX)
    }

    /// Transit of a depot-anchored route visiting `stops` in order.
    #[must_use]
    pub fn transit(&self, stops: &[usize]) -> u64 {
        let depot = self.depot();
        std::iter::once(depot)
            .chain(stops.iter().copied())
            .zip(stops.iter().copied().chain(std::iter::once(depot)))
            .fold(0_u64, |total, (from, to)| total.saturating_add(self.arc(from, to)))
    }

    /// Distance credited toward the soft lower bound: transit plus slack at
    /// the start node and every stop.
    #[must_use]
    pub fn credited_distance(&self, stops: &[usize]) -> u64 {
        let padded_nodes = u64::try_from(stops.len()).unwrap_or(u64::MAX).saturating_add(1);
        self.transit(stops)
            .saturating_add(self.params.distance_slack.saturating_mul(padded_nodes))
    }

    /// Soft lower-bound penalty for a penalised slot holding `stops`.
    #[must_use]
    pub fn shortfall_penalty(&self, stops: &[usize]) -> u64 {
        self.params
            .max_distance_meters
            .saturating_sub(self.credited_distance(stops))
            .saturating_mul(self.params.distance_slack_penalty)
    }

    /// Total objective: arc costs plus soft lower-bound penalties.
    ///
    /// Empty routes in `routes` are ignored; unused penalised slots are charged
    /// as empty routes.
    #[must_use]
    pub fn objective(&self, routes: &[Vec<usize>]) -> u64 {
        let mut used: Vec<&[usize]> = routes
            .iter()
            .filter(|route| !route.is_empty())
            .map(Vec::as_slice)
            .collect();
        let transit = used
            .iter()
            .fold(0_u64, |total, stops| total.saturating_add(self.transit(stops)));
        used.sort_by_key(|stops| Reverse(self.credited_distance(stops)));
        let penalised = self.params.penalised_vehicles();
        let empty: &[usize] = &[];
        let penalty = (0..penalised)
            .map(|slot| self.shortfall_penalty(used.get(slot).copied().unwrap_or(empty)))
            .fold(0_u64, u64::saturating_add);
        transit.saturating_add(penalty)
    }

    /// First stop that no single vehicle can serve within the cap.
    #[must_use]
    pub fn unservable_stop(&self) -> Option<usize> {
        (0..self.stop_count())
            .find(|&stop| self.transit(&[stop]) > self.params.max_distance_meters)
    }

    /// Check that `routes` visit every stop exactly once within the fleet
    /// size and distance cap.
    pub fn check_solution(&self, routes: &[Vec<usize>]) -> Result<(), RoutingError> {
        let used = routes.iter().filter(|route| !route.is_empty()).count();
        if used > self.params.num_vehicles {
            return Err(RoutingError::InvalidSolution {
                reason: format!("{used} routes exceed {} vehicles", self.params.num_vehicles),
            });
        }
        let mut seen = vec![false; self.stop_count()];
        for route in routes {
            for &stop in route {
                match seen.get_mut(stop) {
                    Some(flag) if !*flag => *flag = true,
                    Some(_) => {
                        return Err(RoutingError::InvalidSolution {
                            reason: format!("stop {stop} visited twice"),
                        });
                    }
                    None => {
                        return Err(RoutingError::InvalidSolution {
                            reason: format!("unknown stop {stop}"),
                        });
                    }
                }
            }
            let transit = self.transit(route);
            if transit > self.params.max_distance_meters {
                return Err(RoutingError::InvalidSolution {
                    reason: format!(
                        "route transit {transit} exceeds cap {}",
                        self.params.max_distance_meters
                    ),
                });
            }
        }
        if let Some(stop) = seen.iter().position(|visited| !visited) {
            return Err(RoutingError::InvalidSolution {
                reason: format!("stop {stop} was not visited"),
            });
        }
        Ok(())
    }
}

/// Solves a [`RoutingProblem`].
pub trait VehicleRoutingSolver: Send + Sync {
    /// Return one stop sequence per used vehicle, in vehicle-slot order.
    /// Sequences exclude the depot; empty sequences may be returned and are
    /// discarded by the caller.
    fn solve(&self, problem: &RoutingProblem) -> Result<Vec<Vec<usize>>, RoutingError>;
}

/// Errors returned by [`TspSolver::solve`] and problem construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TspError {
    /// The problem itself is malformed.
    #[error("invalid tour problem: {reason}")]
    InvalidProblem {
        /// Explanation.
        reason: String,
    },
    /// A backend returned an order that is not a permutation of the stops.
    #[error("tour rejected: {reason}")]
    InvalidSolution {
        /// Explanation.
        reason: String,
    },
    /// The backend failed for another reason.
    #[error("tour backend failed: {message}")]
    Backend {
        /// Backend diagnostic.
        message: String,
    },
}

/// A closed tour instance anchored at node 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TspProblem {
    matrix: DistanceMatrix<u64>,
}

impl TspProblem {
    /// Build an instance; node 0 is the start and end.
    pub fn new(matrix: DistanceMatrix<u64>) -> Result<Self, TspError> {
        if matrix.size() == 0 {
            return Err(TspError::InvalidProblem {
                reason: "matrix must contain the anchor node".to_owned(),
            });
        }
        Ok(Self { matrix })
    }

    /// Cost matrix.
    #[must_use]
    pub const fn matrix(&self) -> &DistanceMatrix<u64> {
        &self.matrix
    }

    /// Number of nodes to visit besides the anchor.
    #[must_use]
    pub const fn stop_count(&self) -> usize {
        self.matrix.size().saturating_sub(1)
    }

    /// Arc cost; out-of-range nodes cost `u64::MAX`.
    #[must_use]
    pub fn arc(&self, from: usize, to: usize) -> u64 {
        self.matrix.get(from, to).unwrap_or(u64::MAX)
    }

    /// Cost of the closed tour `0 → order… → 0`.
    #[must_use]
    pub fn tour_cost(&self, order: &[usize]) -> u64 {
        std::iter::once(0)
            .chain(order.iter().copied())
            .zip(order.iter().copied().chain(std::iter::once(0)))
            .fold(0_u64, |total, (from, to)| total.saturating_add(self.arc(from, to)))
    }

    /// Check that `order` visits each of `1..=stop_count` exactly once.
    pub fn check_order(&self, order: &[usize]) -> Result<(), TspError> {
        let mut seen = vec![false; self.matrix.size()];
        for &node in order {
            match seen.get_mut(node) {
                Some(flag) if node != 0 && !*flag => *flag = true,
                _ => {
                    return Err(TspError::InvalidSolution {
                        reason: format!("node {node} is repeated, unknown or the anchor"),
                    });
                }
            }
        }
        if order.len() != self.stop_count() {
            return Err(TspError::InvalidSolution {
                reason: format!("visited {} of {} stops", order.len(), self.stop_count()),
            });
        }
        Ok(())
    }
}

/// Orders the stops of a [`TspProblem`].
pub trait TspSolver: Send + Sync {
    /// Return the visiting order of nodes `1..=stop_count`, excluding the
    /// anchor.
    fn solve(&self, problem: &TspProblem) -> Result<Vec<usize>, TspError>;
}
