//! Point-in-cell lookup backed by an R-tree of cell bounding boxes.

use fieldplan_core::Cell;
use geo::{BoundingRect, Coord, Intersects, Point};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

type CellEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Spatial join from points to the cells containing them.
///
/// Points on a shared edge touch several cells; the lowest cell id wins so
/// every point maps to at most one cell.
#[derive(Debug)]
pub struct CellIndex<'a> {
    cells: &'a [Cell],
    tree: RTree<CellEnvelope>,
}

impl<'a> CellIndex<'a> {
    /// Index `cells`.
    #[must_use]
    pub fn new(cells: &'a [Cell]) -> Self {
        let envelopes = cells
            .iter()
            .enumerate()
            .filter_map(|(position, cell)| {
                let rect = cell.geometry().bounding_rect()?;
                let envelope =
                    Rectangle::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
                Some(GeomWithData::new(envelope, position))
            })
            .collect();
        Self {
            cells,
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Cell containing `coord`, boundary included.
    #[must_use]
    pub fn locate(&self, coord: Coord<f64>) -> Option<&'a Cell> {
        let point = Point::from(coord);
        let envelope = AABB::from_point([coord.x, coord.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| self.cells.get(entry.data))
            .filter(|cell| cell.geometry().intersects(&point))
            .min_by_key(|cell| cell.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldplan_core::test_support::grid_cells;
    use rstest::rstest;

    #[rstest]
    #[case(Coord { x: 5.0, y: 5.0 }, Some(0))]
    #[case(Coord { x: 15.0, y: 5.0 }, Some(1))]
    #[case(Coord { x: 15.0, y: 15.0 }, Some(3))]
    #[case(Coord { x: 10.0, y: 5.0 }, Some(0))]
    #[case(Coord { x: 25.0, y: 5.0 }, None)]
    fn locates_containing_cell(#[case] coord: Coord<f64>, #[case] expected: Option<usize>) {
        let cells = grid_cells(2, 2, 10.0);
        let index = CellIndex::new(&cells);
        assert_eq!(index.locate(coord).map(|cell| cell.id), expected);
    }
}
