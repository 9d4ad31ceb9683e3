//! Bounded Voronoi cells by half-plane clipping.
//!
//! Each seed's cell starts as the bounding rectangle and is cut by the
//! perpendicular bisector with every neighbour, nearest first. Once the
//! nearest remaining neighbour is more than twice the cell's circumradius away
//! no further bisector can reach the cell and the scan stops.

use geo::{Coord, LineString, Polygon, Rect};

/// Bisector cuts shorter than this are treated as coincident seeds.
const COINCIDENT_SEEDS: f64 = 1e-12;

/// Voronoi cell of every seed, clipped to `bounds`.
///
/// A seed that coincides with an earlier seed gets `None` so that no two
/// cells overlap.
pub(crate) fn voronoi_cells(seeds: &[Coord<f64>], bounds: Rect<f64>) -> Vec<Option<Polygon<f64>>> {
    seeds
        .iter()
        .enumerate()
        .map(|(index, &seed)| voronoi_cell(index, seed, seeds, bounds))
        .collect()
}

#[expect(
    clippy::float_arithmetic,
    reason = "bisectors are computed in floating point"
)]
fn voronoi_cell(
    index: usize,
    seed: Coord<f64>,
    seeds: &[Coord<f64>],
    bounds: Rect<f64>,
) -> Option<Polygon<f64>> {
    let mut neighbours: Vec<(f64, usize, Coord<f64>)> = seeds
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != index)
        .map(|(other, &site)| (squared_distance(seed, site), other, site))
        .collect();
    neighbours.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let (min, max) = (bounds.min(), bounds.max());
    let mut ring = vec![
        min,
        Coord { x: max.x, y: min.y },
        max,
        Coord { x: min.x, y: max.y },
    ];
    for (gap, other, site) in neighbours {
        if gap <= COINCIDENT_SEEDS {
            if other < index {
                return None;
            }
            continue;
        }
        let reach = ring
            .iter()
            .map(|vertex| squared_distance(seed, *vertex))
            .fold(0.0, f64::max);
        // A bisector at distance d/2 can only cut the cell if d/2 < reach.
        if gap > 4.0 * reach {
            break;
        }
        let normal = site - seed;
        let midpoint = Coord {
            x: (seed.x + site.x) / 2.0,
            y: (seed.y + site.y) / 2.0,
        };
        ring = clip_half_plane(&ring, normal, dot(normal, midpoint));
        if ring.len() < 3 {
            return None;
        }
    }
    Some(Polygon::new(LineString::from(ring), Vec::new()))
}

/// Keep the part of a convex ring where `normal · p <= offset`.
#[expect(
    clippy::float_arithmetic,
    reason = "edge intersections interpolate in floating point"
)]
fn clip_half_plane(ring: &[Coord<f64>], normal: Coord<f64>, offset: f64) -> Vec<Coord<f64>> {
    let mut clipped = Vec::with_capacity(ring.len() + 1);
    let successors = ring.iter().cycle().skip(1);
    for (&current, &next) in ring.iter().zip(successors) {
        let here = dot(normal, current) - offset;
        let there = dot(normal, next) - offset;
        if here <= 0.0 {
            clipped.push(current);
        }
        if (here < 0.0 && there > 0.0) || (here > 0.0 && there < 0.0) {
            let t = here / (here - there);
            clipped.push(current + (next - current) * t);
        }
    }
    clipped
}

#[expect(clippy::float_arithmetic, reason = "dot product")]
const fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

fn squared_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let delta = a - b;
    dot(delta, delta)
}
