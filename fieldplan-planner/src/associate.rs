//! Cell-to-depot association.
//!
//! Coverage is recomputed here from the depot discs rather than trusted from
//! placement, so depots edited by hand between stages are handled the same way
//! as freshly placed ones.

use fieldplan_core::geometry::exterior_vertices;
use fieldplan_core::{Cell, CellAssociation, Depot};
use geo::{ConvexHull, Coord, MultiPoint, Point};

use crate::enclosing::minimum_enclosing_circle;

/// Associate each cell with every depot covering it and pick the closest.
///
/// Distance is measured between the depot and the cell centroid. Equal
/// distances go to the depot listed first. Cells no depot covers get an empty
/// association.
#[must_use]
pub fn associate(depots: &[Depot], cells: &[Cell]) -> Vec<CellAssociation> {
    cells
        .iter()
        .map(|cell| {
            let covering: Vec<&Depot> = depots.iter().filter(|depot| depot.covers(cell)).collect();
            let closest = covering
                .iter()
                .map(|depot| (*depot, depot.distance_to(cell.centroid())))
                .fold(None, |best: Option<(&Depot, f64)>, (depot, distance)| {
                    match best {
                        Some((_, nearest)) if nearest <= distance => best,
                        _ => Some((depot, distance)),
                    }
                });
            CellAssociation {
                cell_id: cell.id,
                associated_depots: covering.iter().map(|depot| depot.id.clone()).collect(),
                closest_depot: closest.map(|(depot, _)| depot.id.clone()),
                distance: closest.map(|(_, distance)| distance),
            }
        })
        .collect()
}

/// Copy of `depots` with `min_enclosing_radius` set from the cells they are
/// closest to.
///
/// The radius is that of the smallest circle around the convex hull of those
/// cells; depots closest to no cell get 0.
#[must_use]
pub fn with_enclosing_radii(
    depots: &[Depot],
    cells: &[Cell],
    associations: &[CellAssociation],
) -> Vec<Depot> {
    depots
        .iter()
        .map(|depot| {
            let vertices: Vec<Point<f64>> = cells
                .iter()
                .zip(associations)
                .filter(|(_, association)| association.closest_depot.as_ref() == Some(&depot.id))
                .flat_map(|(cell, _)| exterior_vertices(cell.geometry()).map(Point::from))
                .collect();
            let hull: Vec<Coord<f64>> = if vertices.is_empty() {
                Vec::new()
            } else {
                MultiPoint::new(vertices)
                    .convex_hull()
                    .exterior()
                    .coords()
                    .copied()
                    .collect()
            };
            let mut placed = depot.clone();
            placed.min_enclosing_radius =
                minimum_enclosing_circle(&hull).map_or(0.0, |circle| circle.radius);
            placed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldplan_core::test_support::grid_cells;
    use rstest::{fixture, rstest};

    /// Two depots over a 3×1 strip of 10 m cells; the middle cell is covered
    /// by both and equidistant from each.
    #[fixture]
    fn strip() -> (Vec<Depot>, Vec<Cell>) {
        let cells = grid_cells(3, 1, 10.0);
        let depots = vec![
            Depot::new("west", Coord { x: 10.0, y: 5.0 }, 16.0),
            Depot::new("east", Coord { x: 20.0, y: 5.0 }, 16.0),
        ];
        (depots, cells)
    }

    #[rstest]
    fn closest_depot_breaks_ties_by_order(strip: (Vec<Depot>, Vec<Cell>)) {
        let (depots, cells) = strip;
        let associations = associate(&depots, &cells);
        let [first, middle, last] = associations.as_slice() else {
            panic!("expected three associations, got {associations:?}");
        };
        assert_eq!(first.closest_depot.as_deref(), Some("west"));
        assert_eq!(middle.associated_depots, vec!["west", "east"]);
        assert_eq!(middle.closest_depot.as_deref(), Some("west"));
        assert_eq!(middle.distance, Some(5.0));
        assert_eq!(last.closest_depot.as_deref(), Some("east"));
    }

    #[rstest]
    fn reversed_depots_flip_the_tie(strip: (Vec<Depot>, Vec<Cell>)) {
        let (mut depots, cells) = strip;
        depots.reverse();
        let associations = associate(&depots, &cells);
        let middle = associations.get(1).and_then(|association| association.closest_depot.as_deref());
        assert_eq!(middle, Some("east"));
    }

    #[rstest]
    fn uncovered_cells_have_no_closest_depot() {
        let cells = grid_cells(2, 1, 10.0);
        let depots = vec![Depot::new("only", Coord { x: 5.0, y: 5.0 }, 8.0)];
        let associations = associate(&depots, &cells);
        let [covered, uncovered] = associations.as_slice() else {
            panic!("expected two associations, got {associations:?}");
        };
        assert!(covered.is_covered());
        assert!(!uncovered.is_covered());
        assert_eq!(uncovered.closest_depot, None);
        assert_eq!(uncovered.distance, None);
    }

    #[rstest]
    fn association_is_idempotent(strip: (Vec<Depot>, Vec<Cell>)) {
        let (depots, cells) = strip;
        assert_eq!(associate(&depots, &cells), associate(&depots, &cells));
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "radii compared within a tolerance")]
    fn enclosing_radius_spans_homed_cells(strip: (Vec<Depot>, Vec<Cell>)) {
        let (depots, cells) = strip;
        let associations = associate(&depots, &cells);
        let placed = with_enclosing_radii(&depots, &cells, &associations);
        let [west, east] = placed.as_slice() else {
            panic!("expected two depots, got {placed:?}");
        };
        // West is closest to cells 0 and 1: a 20 × 10 rectangle.
        assert!((west.min_enclosing_radius - 500.0_f64.sqrt() / 2.0).abs() < 1e-9);
        // East holds only cell 2: a 10 × 10 square.
        assert!((east.min_enclosing_radius - 50.0_f64.sqrt()).abs() < 1e-9);
    }

    #[rstest]
    fn idle_depots_have_zero_radius() {
        let cells = grid_cells(1, 1, 10.0);
        let depots = vec![
            Depot::new("near", Coord { x: 5.0, y: 5.0 }, 10.0),
            Depot::new("far", Coord { x: 6.0, y: 5.0 }, 10.0),
        ];
        let associations = associate(&depots, &cells);
        let placed = with_enclosing_radii(&depots, &cells, &associations);
        let [near, far] = placed.as_slice() else {
            panic!("expected two depots, got {placed:?}");
        };
        assert!(near.min_enclosing_radius > 0.0);
        assert_eq!(far.min_enclosing_radius, 0.0);
    }
}
