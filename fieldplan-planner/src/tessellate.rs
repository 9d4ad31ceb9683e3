//! Centroidal Voronoi tessellation of a region.
//!
//! Seeds are sampled uniformly inside the region, then repeatedly replaced by
//! the centroids of their region-clipped Voronoi cells (Lloyd relaxation)
//! until no seed moves further than the tolerance or the iteration budget
//! runs out. Running out is not an error: the last tessellation is kept.

use fieldplan_core::geometry::distance;
use fieldplan_core::{Cell, PlanningError};
use geo::{Area, BooleanOps, BoundingRect, Centroid, Contains, Coord, MultiPolygon, Point, Rect};
use log::debug;
use rand::Rng;

use crate::voronoi::voronoi_cells;

/// Samples drawn per requested seed before sampling gives up.
const ATTEMPTS_PER_SEED: usize = 1_000;

/// Cells smaller than this fraction of the region are discarded as slivers.
const SLIVER_FRACTION: f64 = 1e-12;

/// Result of a tessellation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    /// Cells with dense ids `0..n`; they cover the region and do not overlap.
    pub cells: Vec<Cell>,
    /// Lloyd iterations performed.
    pub iterations: usize,
    /// Whether the largest seed shift fell below the tolerance.
    pub converged: bool,
    /// Largest seed shift in the final iteration.
    pub max_shift: f64,
}

/// Tessellate `outline` into `cell_count` roughly equal-area cells.
///
/// `outline` must be in a metric CRS. The random source decides the initial
/// seeds; a seeded generator makes the run reproducible.
///
/// # Errors
///
/// [`PlanningError::InvalidArgument`] for a zero cell count or iteration
/// budget, [`PlanningError::SeedSampling`] when seeds cannot be placed inside
/// the outline, and [`PlanningError::Degenerate`] when an iteration clips every
/// cell away.
#[expect(
    clippy::float_arithmetic,
    reason = "the sliver threshold scales with the region area"
)]
pub fn tessellate<R: Rng + ?Sized>(
    outline: &MultiPolygon<f64>,
    cell_count: usize,
    max_iterations: usize,
    tolerance: f64,
    rng: &mut R,
) -> Result<Tessellation, PlanningError> {
    if cell_count == 0 {
        return Err(PlanningError::invalid_argument("cell count must be positive"));
    }
    if max_iterations == 0 {
        return Err(PlanningError::invalid_argument(
            "max iterations must be at least one",
        ));
    }
    let extent = outline
        .bounding_rect()
        .ok_or_else(|| PlanningError::invalid_argument("region outline is empty"))?;
    let bounds = padded(extent);
    let min_area = outline.unsigned_area() * SLIVER_FRACTION;

    let mut seeds = sample_seeds(outline, extent, cell_count, rng)?;
    let mut pieces: Vec<(usize, MultiPolygon<f64>)> = Vec::new();
    let mut iterations = 0;
    let mut max_shift = f64::INFINITY;
    for iteration in 0..max_iterations {
        pieces = voronoi_cells(&seeds, bounds)
            .into_iter()
            .enumerate()
            .filter_map(|(seed, polygon)| polygon.map(|clip| (seed, clip)))
            .map(|(seed, polygon)| (seed, outline.intersection(&polygon)))
            .filter(|(_, piece)| piece.unsigned_area() > min_area)
            .collect();
        if pieces.is_empty() {
            return Err(PlanningError::Degenerate { iteration });
        }

        let (next, shift) = relax(&seeds, &pieces);
        iterations = iteration + 1;
        max_shift = shift;
        debug!(
            "tessellation iteration {iteration}: {} cells, max shift {shift:.6}",
            pieces.len()
        );
        seeds = next;
        if shift < tolerance {
            break;
        }
    }

    let cells = pieces
        .into_iter()
        .enumerate()
        .map(|(id, (_, geometry))| Cell::new(id, geometry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Tessellation {
        cells,
        iterations,
        converged: max_shift < tolerance,
        max_shift,
    })
}

/// Draw `count` seeds uniformly from the interior of `outline`.
fn sample_seeds<R: Rng + ?Sized>(
    outline: &MultiPolygon<f64>,
    extent: Rect<f64>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Coord<f64>>, PlanningError> {
    let (min, max) = (extent.min(), extent.max());
    let budget = count.saturating_mul(ATTEMPTS_PER_SEED);
    let mut seeds = Vec::with_capacity(count);
    let mut attempts = 0;
    while seeds.len() < count {
        if attempts == budget || min.x >= max.x || min.y >= max.y {
            return Err(PlanningError::SeedSampling {
                requested: count,
                accepted: seeds.len(),
                attempts,
            });
        }
        attempts += 1;
        let candidate = Coord {
            x: rng.gen_range(min.x..max.x),
            y: rng.gen_range(min.y..max.y),
        };
        if outline.contains(&Point::from(candidate)) {
            seeds.push(candidate);
        }
    }
    Ok(seeds)
}

/// Move each surviving seed to its piece's centroid and report the largest
/// move. Seeds whose cell vanished are dropped.
fn relax(seeds: &[Coord<f64>], pieces: &[(usize, MultiPolygon<f64>)]) -> (Vec<Coord<f64>>, f64) {
    let mut shift: f64 = 0.0;
    let next = pieces
        .iter()
        .filter_map(|(seed, piece)| {
            let centroid = piece.centroid()?.0;
            let previous = seeds.get(*seed).copied().unwrap_or(centroid);
            shift = shift.max(distance(previous, centroid));
            Some(centroid)
        })
        .collect();
    (next, shift)
}

/// Extent grown by a margin so that no seed sits on the clipping boundary.
#[expect(clippy::float_arithmetic, reason = "margin is a fraction of the diagonal")]
fn padded(extent: Rect<f64>) -> Rect<f64> {
    let margin = extent.width().hypot(extent.height()) * 0.05 + 1.0;
    let delta = Coord {
        x: margin,
        y: margin,
    };
    Rect::new(extent.min() - delta, extent.max() + delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldplan_core::test_support::square;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn field() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![square(Coord::zero(), 200.0)])
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "areas compared within a tolerance")]
    fn cells_cover_the_region(field: MultiPolygon<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let result = tessellate(&field, 12, 15, 1e-3, &mut rng).expect("tessellates");
        assert_eq!(result.cells.len(), 12);
        let total: f64 = result.cells.iter().map(Cell::area).sum();
        assert!((total - 40_000.0).abs() < 1e-6 * 40_000.0);
        for (index, cell) in result.cells.iter().enumerate() {
            assert_eq!(cell.id, index);
        }
    }

    #[rstest]
    #[expect(clippy::float_arithmetic, reason = "compares the area ratio")]
    fn relaxation_balances_areas(field: MultiPolygon<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = tessellate(&field, 8, 40, 1e-6, &mut rng).expect("tessellates");
        let areas: Vec<f64> = result.cells.iter().map(Cell::area).collect();
        let largest = areas.iter().copied().fold(0.0, f64::max);
        let smallest = areas.iter().copied().fold(f64::INFINITY, f64::min);
        assert!(largest / smallest < 2.0, "areas {areas:?}");
    }

    #[rstest]
    fn same_seed_same_cells(field: MultiPolygon<f64>) {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            tessellate(&field, 6, 5, 1e-3, &mut rng).expect("tessellates")
        };
        assert_eq!(run(11), run(11));
    }

    #[rstest]
    fn exhausted_budget_keeps_last_result(field: MultiPolygon<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let result = tessellate(&field, 10, 1, 1e-12, &mut rng).expect("tessellates");
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert_eq!(result.cells.len(), 10);
    }

    #[rstest]
    fn zero_cells_is_rejected(field: MultiPolygon<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = tessellate(&field, 0, 5, 1e-3, &mut rng);
        assert!(matches!(result, Err(PlanningError::InvalidArgument { .. })));
    }

    #[rstest]
    fn empty_outline_is_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = tessellate(&MultiPolygon::new(Vec::new()), 3, 5, 1e-3, &mut rng);
        assert!(matches!(result, Err(PlanningError::InvalidArgument { .. })));
    }
}
