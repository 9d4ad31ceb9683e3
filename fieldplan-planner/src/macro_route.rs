//! Per-depot macro routing over cell centroids.

use fieldplan_core::geometry::distance;
use fieldplan_core::{
    Cell, Depot, DistanceMatrix, MacroRoute, RoutingError, RoutingParams, RoutingProblem,
    VehicleRoutingSolver,
};
use geo::{Coord, LineString};
use log::debug;

/// A cell handed to macro routing together with its workload in metres.
#[derive(Debug, Clone, Copy)]
pub struct RoutableCell<'a> {
    /// The cell.
    pub cell: &'a Cell,
    /// In-cell travel estimate added to every arc entering the cell.
    pub workload: f64,
}

/// Integer cost matrix for one depot's cells.
///
/// Nodes `0..n` are the cells and node `n` is the depot. An arc costs the
/// centroid distance plus the workload of the cell it enters; both legs
/// between a cell and the depot also carry that cell's workload. Costs are
/// rounded up to whole metres.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "arc costs add metres")]
pub fn workload_matrix(depot: Coord<f64>, cells: &[RoutableCell<'_>]) -> DistanceMatrix<u64> {
    let depot_node = cells.len();
    let position = |node: usize| cells.get(node).map_or(depot, |entry| entry.cell.centroid());
    let workload = |node: usize| cells.get(node).map_or(0.0, |entry| entry.workload);
    DistanceMatrix::from_fn(cells.len() + 1, |from, to| {
        if from == to {
            return 0;
        }
        let extra = if to == depot_node {
            workload(from)
        } else {
            workload(to)
        };
        whole_metres(distance(position(from), position(to)) + extra)
    })
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "costs are finite, non-negative metres"
)]
fn whole_metres(metres: f64) -> u64 {
    metres.ceil() as u64
}

/// Route one depot's cells.
///
/// Returns the non-empty routes in solver slot order with ids
/// `{depot}_R{k}` numbered from zero. A depot with no cells yields no routes.
///
/// # Errors
///
/// Returns the solver's [`RoutingError`], or
/// [`RoutingError::InvalidSolution`] when its routes break the cap, miss a
/// cell or exceed the fleet.
pub fn route_depot(
    depot: &Depot,
    cells: &[RoutableCell<'_>],
    params: &RoutingParams,
    solver: &dyn VehicleRoutingSolver,
) -> Result<Vec<MacroRoute>, RoutingError> {
    if cells.is_empty() {
        return Ok(Vec::new());
    }
    let problem = RoutingProblem::new(workload_matrix(depot.location, cells), params.clone())?;
    debug!("routing {} cells from depot {}", cells.len(), depot.id);
    let routes = solver.solve(&problem)?;
    problem.check_solution(&routes)?;
    debug!(
        "depot {} routed with objective {}",
        depot.id,
        problem.objective(&routes)
    );

    Ok(routes
        .into_iter()
        .filter(|stops| !stops.is_empty())
        .enumerate()
        .map(|(sequence, stops)| {
            let visited: Vec<&Cell> = stops
                .iter()
                .filter_map(|&stop| cells.get(stop).map(|entry| entry.cell))
                .collect();
            let path: LineString<f64> = std::iter::once(depot.location)
                .chain(visited.iter().map(|cell| cell.centroid()))
                .chain(std::iter::once(depot.location))
                .collect();
            MacroRoute {
                id: MacroRoute::id_for(&depot.id, sequence),
                depot_id: depot.id.clone(),
                cells: visited.iter().map(|cell| cell.id).collect(),
                path,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::InsertionRoutingSolver;
    use fieldplan_core::test_support::grid_cells;
    use rstest::{fixture, rstest};

    #[fixture]
    fn cells() -> Vec<Cell> {
        grid_cells(3, 1, 10.0)
    }

    fn routable<'a>(cells: &'a [Cell], workloads: &[f64]) -> Vec<RoutableCell<'a>> {
        cells
            .iter()
            .zip(workloads)
            .map(|(cell, &workload)| RoutableCell { cell, workload })
            .collect()
    }

    #[rstest]
    fn matrix_adds_workload_of_the_entered_cell(cells: Vec<Cell>) {
        let entries = routable(&cells, &[0.0, 2.5, 0.0]);
        let matrix = workload_matrix(Coord { x: 5.0, y: 5.0 }, &entries);
        assert_eq!(matrix.size(), 4);
        assert_eq!(matrix.get(0, 1), Some(13));
        assert_eq!(matrix.get(1, 0), Some(10));
        assert_eq!(matrix.get(3, 1), Some(13));
        assert_eq!(matrix.get(1, 3), Some(13));
        assert_eq!(matrix.get(3, 0), Some(0));
        assert_eq!(matrix.get(2, 2), Some(0));
    }

    #[rstest]
    fn routes_visit_every_cell_within_the_cap(cells: Vec<Cell>) {
        let depot = Depot::new("depot_0", Coord { x: 15.0, y: 5.0 }, 50.0);
        let entries = routable(&cells, &[3.0, 0.0, 3.0]);
        let params = RoutingParams {
            num_vehicles: 4,
            max_distance_meters: 30,
            slack_routes: 4,
            time_limit_seconds: 1,
            ..RoutingParams::default()
        };
        let routes = route_depot(&depot, &entries, &params, &InsertionRoutingSolver::default())
            .expect("routes");
        let mut visited: Vec<usize> = routes.iter().flat_map(|r| r.cells.clone()).collect();
        visited.sort_unstable();
        assert_eq!(visited, vec![0, 1, 2]);
        for (sequence, route) in routes.iter().enumerate() {
            assert_eq!(route.id, format!("depot_0_R{sequence}"));
            assert_eq!(route.path.0.first(), Some(&depot.location));
            assert_eq!(route.path.0.last(), Some(&depot.location));
        }
    }

    #[rstest]
    fn depots_without_cells_have_no_routes() {
        let depot = Depot::new("idle", Coord { x: 0.0, y: 0.0 }, 10.0);
        let routes = route_depot(
            &depot,
            &[],
            &RoutingParams::default(),
            &InsertionRoutingSolver::default(),
        )
        .expect("routes");
        assert!(routes.is_empty());
    }

    #[rstest]
    fn unreachable_cells_fail_the_depot(cells: Vec<Cell>) {
        let depot = Depot::new("depot_0", Coord { x: 15.0, y: 5.0 }, 50.0);
        let entries = routable(&cells, &[0.0, 0.0, 0.0]);
        let params = RoutingParams {
            num_vehicles: 3,
            max_distance_meters: 15,
            slack_routes: 3,
            ..RoutingParams::default()
        };
        let result = route_depot(&depot, &entries, &params, &InsertionRoutingSolver::default());
        assert!(matches!(result, Err(RoutingError::Infeasible { .. })));
    }
}
