//! Depot placement by geometric set cover.
//!
//! Candidates are every cell centroid followed by a regular grid over the
//! cells' extent, clipped to the region. A candidate covers a cell when the
//! cell lies entirely inside the candidate's service disc. The selected set is
//! checked against the coverage matrix before it is returned, so a backend that
//! claims success without covering every cell is caught here.

use fieldplan_core::{
    Cell, DepotParams, Depot, PlanningError, Region, SetCoverProblem, SetCoverSolver,
};
use fieldplan_core::geometry::disc_contains;
use geo::{BoundingRect, Coord, Rect};
use log::info;

/// Candidate depot sites: cell centroids in cell order, then grid points
/// spaced `spacing` apart that fall inside `region`.
///
/// The grid is laid out column by column from the lower-left corner of the
/// cells' extent and stops short of the upper bound.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "grid coordinates are offsets from the extent corner with small indices"
)]
pub fn candidate_locations(cells: &[Cell], region: &Region, spacing: f64) -> Vec<Coord<f64>> {
    let mut candidates: Vec<Coord<f64>> = cells.iter().map(Cell::centroid).collect();
    let Some(extent) = cells_extent(cells) else {
        return candidates;
    };
    if !(spacing.is_finite() && spacing > 0.0) {
        return candidates;
    }
    let steps = |span: f64| grid_steps(span, spacing);
    let (min, max) = (extent.min(), extent.max());
    for column in 0..steps(max.x - min.x) {
        let x = min.x + column as f64 * spacing;
        for row in 0..steps(max.y - min.y) {
            let y = min.y + row as f64 * spacing;
            let point = Coord { x, y };
            if region.contains(point) {
                candidates.push(point);
            }
        }
    }
    candidates
}

/// For each cell, the candidates whose disc of `radius` contains it.
///
/// This is the coverage matrix in sparse row form; row `i` belongs to
/// `cells[i]`.
#[must_use]
pub fn coverage_matrix(candidates: &[Coord<f64>], cells: &[Cell], radius: f64) -> Vec<Vec<usize>> {
    cells
        .iter()
        .map(|cell| {
            candidates
                .iter()
                .enumerate()
                .filter(|(_, site)| disc_contains(**site, radius, cell.geometry()))
                .map(|(index, _)| index)
                .collect()
        })
        .collect()
}

/// Select the fewest depots whose discs cover every cell.
///
/// `cells` and `region` must share a metric CRS. Depot ids are derived from
/// the candidate index, so they are stable for a given tessellation.
///
/// # Errors
///
/// [`PlanningError::InvalidArgument`] for unusable parameters or an empty cell
/// set, [`PlanningError::Placement`] when the solver fails, and
/// [`PlanningError::CoverageViolated`] when its answer leaves a cell
/// uncovered.
pub fn place_depots(
    cells: &[Cell],
    region: &Region,
    params: &DepotParams,
    solver: &dyn SetCoverSolver,
) -> Result<Vec<Depot>, PlanningError> {
    params.validate()?;
    if cells.is_empty() {
        return Err(PlanningError::invalid_argument(
            "depot placement needs at least one cell",
        ));
    }

    let candidates = candidate_locations(cells, region, params.grid_spacing());
    let covering = coverage_matrix(&candidates, cells, params.depot_radius_meters);
    let problem =
        SetCoverProblem::new(candidates.len(), covering).map_err(PlanningError::Placement)?;
    let selected = solver.solve(&problem).map_err(PlanningError::Placement)?;
    if let Some(element) = problem.first_uncovered(&selected) {
        let cell_id = cells.get(element).map_or(element, |cell| cell.id);
        return Err(PlanningError::CoverageViolated { cell_id });
    }

    let depots: Vec<Depot> = selected
        .into_iter()
        .filter_map(|index| {
            candidates.get(index).map(|site| {
                Depot::new(
                    Depot::id_for_candidate(index),
                    *site,
                    params.depot_radius_meters,
                )
            })
        })
        .collect();
    info!(
        "placed {} depots over {} cells from {} candidates",
        depots.len(),
        cells.len(),
        candidates.len()
    );
    Ok(depots)
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "span and spacing are positive and finite"
)]
fn grid_steps(span: f64, spacing: f64) -> usize {
    (span / spacing).ceil() as usize
}

fn cells_extent(cells: &[Cell]) -> Option<Rect<f64>> {
    cells
        .iter()
        .filter_map(|cell| cell.geometry().bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })
}
