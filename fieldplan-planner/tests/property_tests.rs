//! Property-based tests for the planning stages.
//!
//! # Invariants tested
//!
//! - **Tiling:** tessellated cells cover the region without overlap.
//! - **Coverage:** every cell lies inside the disc of some placed depot.
//! - **Association:** the closest depot is one of the covering depots and
//!   re-running association changes nothing.
//! - **Macro routing:** each cell is routed exactly once and no route exceeds
//!   the distance cap.
//! - **Micro routing:** tours visit each target once and start and end at the
//!   depot.
//! - **Geometry helpers:** spanning-tree workloads never exceed a path through
//!   the same points, and the enclosing circle holds every point.
#![expect(
    clippy::expect_used,
    reason = "property tests use expect for readable failures"
)]


use std::collections::HashSet;

use fieldplan_core::geometry::distance;
use fieldplan_core::test_support::{grid_cells, square_region};
use fieldplan_core::{
    Depot, DepotParams, PlanningError, RoutingParams, RoutingProblem, SetCoverProblem,
    SetCoverSolver, Target, TessellationParams,
};
use fieldplan_planner::associate::associate;
use fieldplan_planner::depots::{candidate_locations, coverage_matrix, place_depots};
use fieldplan_planner::enclosing::minimum_enclosing_circle;
use fieldplan_planner::macro_route::{RoutableCell, route_depot, workload_matrix};
use fieldplan_planner::micro_route::solve_tour;
use fieldplan_planner::tessellate::tessellate;
use fieldplan_planner::workload::spanning_tree_weight;
use fieldplan_planner::{
    CheapestArcTspSolver, GreedySetCoverSolver, IlpSetCoverSolver, InsertionRoutingSolver,
};
use geo::Coord;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use proptest_support::{assert_cells_tile_region, points_strategy, region_strategy, targets_at};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Cells partition the region: their areas sum to the region's area and
    /// ids are dense.
    #[test]
    fn tessellation_tiles_the_region(region in region_strategy(), seed in any::<u64>()) {
        let params = TessellationParams::default().with_target_cell_area_square_meters(1_500.0);
        let count = params.target_cell_count(region.area()).expect("region holds a cell");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = tessellate(region.outline(), count, 8, 1e-3, &mut rng)
            .expect("tessellation succeeds");

        prop_assert!(!outcome.cells.is_empty());
        prop_assert!(outcome.cells.len() <= count);
        for (index, cell) in outcome.cells.iter().enumerate() {
            prop_assert_eq!(cell.id, index);
            prop_assert!(cell.area() > 0.0);
        }
        assert_cells_tile_region(&outcome.cells, &region, 1e-6)?;
    }

    /// Every cell fits inside the disc of at least one placed depot, and the
    /// exact solver never places more depots than the greedy one.
    #[test]
    fn placed_depots_cover_every_cell(
        columns in 1_usize..5,
        rows in 1_usize..5,
        radius in 30.0_f64..90.0,
    ) {
        let cells = grid_cells(columns, rows, 20.0);
        let region = square_region(100.0);
        let params = DepotParams { depot_radius_meters: radius, grid_density: 4 };
        let depots = place_depots(&cells, &region, &params, &IlpSetCoverSolver)
            .expect("placement succeeds");

        for cell in &cells {
            prop_assert!(
                depots.iter().any(|depot| depot.covers(cell)),
                "cell {} is uncovered", cell.id
            );
        }

        let candidates = candidate_locations(&cells, &region, params.grid_spacing());
        let problem = SetCoverProblem::new(
            candidates.len(),
            coverage_matrix(&candidates, &cells, radius),
        )
        .expect("valid problem");
        let greedy = GreedySetCoverSolver.solve(&problem).expect("greedy solves");
        prop_assert!(depots.len() <= greedy.len());
    }

    /// The closest depot is always a covering one, and association is a pure
    /// function of its inputs.
    #[test]
    fn association_is_consistent_and_idempotent(
        sites in points_strategy(1, 6, 80.0),
        radius in 10.0_f64..80.0,
    ) {
        let cells = grid_cells(4, 4, 20.0);
        let depots: Vec<Depot> = sites
            .iter()
            .enumerate()
            .map(|(index, site)| Depot::new(format!("d{index}"), *site, radius))
            .collect();
        let first = associate(&depots, &cells);
        let second = associate(&depots, &cells);
        prop_assert_eq!(&first, &second);

        for association in &first {
            match &association.closest_depot {
                Some(closest) => {
                    prop_assert!(association.associated_depots.contains(closest));
                }
                None => {
                    prop_assert!(association.associated_depots.is_empty());
                }
            }
        }
    }

    /// Routes visit each cell once and respect the distance cap.
    #[test]
    fn macro_routes_respect_the_cap(
        workloads in proptest::collection::vec(0.0_f64..40.0, 9),
        cap in 260_u64..600,
    ) {
        let cells = grid_cells(3, 3, 20.0);
        let depot = Depot::new("d0", Coord { x: 30.0, y: 30.0 }, 60.0);
        let routable: Vec<RoutableCell<'_>> = cells
            .iter()
            .zip(&workloads)
            .map(|(cell, &workload)| RoutableCell { cell, workload })
            .collect();
        let params = RoutingParams {
            num_vehicles: 9,
            max_distance_meters: cap,
            distance_slack: 10,
            distance_slack_penalty: 5,
            slack_routes: 4,
            time_limit_seconds: 1,
        };
        let routes = route_depot(&depot, &routable, &params, &InsertionRoutingSolver::default())
            .expect("every single-cell round trip fits the cap");

        let mut visited: Vec<usize> = routes.iter().flat_map(|route| route.cells.clone()).collect();
        visited.sort_unstable();
        prop_assert_eq!(visited, (0..9).collect::<Vec<_>>());

        let problem = RoutingProblem::new(workload_matrix(depot.location, &routable), params)
            .expect("valid problem");
        for route in &routes {
            let stops: Vec<usize> = route.cells.clone();
            prop_assert!(problem.transit(&stops) <= cap);
        }
    }

    /// Tours are closed at the depot and visit every target exactly once.
    #[test]
    fn micro_tours_are_closed_permutations(points in points_strategy(1, 25, 150.0)) {
        let targets = targets_at(&points);
        let refs: Vec<&Target> = targets.iter().collect();
        let depot = Coord { x: 75.0, y: 75.0 };
        let tour = solve_tour(depot, &refs, &CheapestArcTspSolver).expect("tour solves");

        prop_assert_eq!(tour.path.0.first().copied(), Some(depot));
        prop_assert_eq!(tour.path.0.last().copied(), Some(depot));
        let ids: HashSet<&str> = tour.targets.iter().map(|target| target.id.as_str()).collect();
        prop_assert_eq!(ids.len(), targets.len());
        prop_assert_eq!(tour.targets.len(), targets.len());
    }

    /// A spanning tree is never longer than a path through the same points.
    #[test]
    #[expect(clippy::float_arithmetic, reason = "lengths compared within a tolerance")]
    fn spanning_tree_is_no_longer_than_any_path(points in points_strategy(0, 20, 100.0)) {
        let path: f64 = points
            .iter()
            .zip(points.iter().skip(1))
            .map(|(&from, &to)| distance(from, to))
            .sum();
        prop_assert!(spanning_tree_weight(&points) <= path + 1e-9);
    }

    /// The enclosing circle holds every point.
    #[test]
    #[expect(clippy::float_arithmetic, reason = "containment uses a relative tolerance")]
    fn enclosing_circle_holds_every_point(points in points_strategy(1, 30, 100.0)) {
        let circle = minimum_enclosing_circle(&points).expect("non-empty input");
        for point in &points {
            prop_assert!(distance(circle.centre, *point) <= circle.radius * (1.0 + 1e-9) + 1e-9);
        }
    }
}

#[test]
fn tiny_region_has_no_cells() {
    let params = TessellationParams::default().with_target_cell_area_square_meters(1_500.0);
    let region = square_region(10.0);
    assert!(matches!(
        params.target_cell_count(region.area()),
        Err(PlanningError::InvalidArgument { .. })
    ));
}
