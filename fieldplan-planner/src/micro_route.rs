//! Per-route micro routing over individual targets.

use fieldplan_core::geometry::{distance, path_length};
use fieldplan_core::{DistanceMatrix, MicroRoute, Target, TspError, TspProblem, TspSolver};
use geo::{Coord, LineString};
use log::debug;

/// Metres are scaled by this factor before truncation to integer costs.
pub const COST_SCALE: f64 = 1000.0;

/// Integer cost matrix over `points`: Euclidean distance scaled by
/// [`COST_SCALE`] and truncated.
#[must_use]
pub fn scaled_matrix(points: &[Coord<f64>]) -> DistanceMatrix<u64> {
    DistanceMatrix::from_fn(points.len(), |from, to| {
        match (points.get(from), points.get(to)) {
            (Some(a), Some(b)) => scaled_cost(distance(*a, *b)),
            _ => 0,
        }
    })
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "truncating scaled non-negative metres is the cost model"
)]
fn scaled_cost(metres: f64) -> u64 {
    (metres * COST_SCALE) as u64
}

/// A solved closed tour from the depot through some targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour<'a> {
    /// Targets in visiting order.
    pub targets: Vec<&'a Target>,
    /// Depot, targets in order, depot.
    pub path: LineString<f64>,
    /// Euclidean length of `path`.
    pub total_distance: f64,
}

/// Order `targets` into a closed tour from `depot`.
///
/// # Errors
///
/// Returns the solver's [`TspError`], or [`TspError::InvalidSolution`] when
/// its order is not a permutation of the targets.
pub fn solve_tour<'a>(
    depot: Coord<f64>,
    targets: &[&'a Target],
    solver: &dyn TspSolver,
) -> Result<Tour<'a>, TspError> {
    let points: Vec<Coord<f64>> = std::iter::once(depot)
        .chain(targets.iter().map(|target| target.location))
        .collect();
    let problem = TspProblem::new(scaled_matrix(&points))?;
    let order = solver.solve(&problem)?;
    problem.check_order(&order)?;

    let ordered: Vec<&Target> = order
        .iter()
        .filter_map(|&node| targets.get(node.wrapping_sub(1)).copied())
        .collect();
    let path: LineString<f64> = std::iter::once(depot)
        .chain(ordered.iter().map(|target| target.location))
        .chain(std::iter::once(depot))
        .collect();
    let total_distance = path_length(&path);
    debug!(
        "tour over {} targets: {total_distance:.1} m (scaled cost {})",
        ordered.len(),
        problem.tour_cost(&order)
    );
    Ok(Tour {
        targets: ordered,
        path,
        total_distance,
    })
}

/// Build the micro route for one macro route from its solved tour.
#[must_use]
pub fn micro_route(route_id: &str, depot_id: &str, cells: &[usize], tour: &Tour<'_>) -> MicroRoute {
    MicroRoute {
        id: route_id.to_owned(),
        depot_id: depot_id.to_owned(),
        cells: cells.to_vec(),
        target_ids: tour.targets.iter().map(|target| target.id.clone()).collect(),
        path: tour.path.clone(),
        total_distance: tour.total_distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsp::CheapestArcTspSolver;
    use rstest::rstest;

    #[rstest]
    fn matrix_truncates_scaled_metres() {
        let matrix = scaled_matrix(&[Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }]);
        assert_eq!(matrix.get(0, 1), Some(1414));
        assert_eq!(matrix.get(1, 1), Some(0));
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "lengths compared within a tolerance")]
    fn tour_starts_and_ends_at_the_depot() {
        let targets = [
            Target::new("a", Coord { x: 10.0, y: 0.0 }),
            Target::new("b", Coord { x: 10.0, y: 10.0 }),
            Target::new("c", Coord { x: 0.0, y: 10.0 }),
        ];
        let refs: Vec<&Target> = targets.iter().collect();
        let depot = Coord { x: 0.0, y: 0.0 };
        let tour = solve_tour(depot, &refs, &CheapestArcTspSolver).expect("tour");

        assert_eq!(tour.path.0.first(), Some(&depot));
        assert_eq!(tour.path.0.last(), Some(&depot));
        assert_eq!(tour.path.0.len(), 5);
        assert!((tour.total_distance - 40.0).abs() < 1e-9);
        let mut ids: Vec<&str> = tour.targets.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "lengths compared within a tolerance")]
    fn micro_route_copies_tour_order() {
        let targets = [Target::new("only", Coord { x: 3.0, y: 4.0 })];
        let refs: Vec<&Target> = targets.iter().collect();
        let tour = solve_tour(Coord::zero(), &refs, &CheapestArcTspSolver).expect("tour");
        let route = micro_route("depot_1_R0", "depot_1", &[7, 8], &tour);
        assert_eq!(route.target_ids, vec!["only".to_owned()]);
        assert_eq!(route.cells, vec![7, 8]);
        assert!((route.total_distance - 10.0).abs() < 1e-12);
    }
}
