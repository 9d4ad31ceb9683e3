//! Small planar geometry helpers shared by the planning stages.
//!
//! All functions assume metric coordinates.

use geo::{Coord, Distance, Euclidean, Length, LineString, MapCoords, MultiPolygon};

use crate::crs::CoordTransform;

/// Slack applied to disc containment so vertices lying exactly on the
/// boundary still count as inside after floating-point noise.
pub const CONTAINMENT_EPSILON: f64 = 1e-9;

/// Euclidean distance between two coordinates.
#[must_use]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Euclidean.distance(a, b)
}

/// Whether `geometry` lies entirely inside the closed disc around `centre`.
///
/// A disc is convex, so a polygon is inside it exactly when every exterior
/// vertex is. Interior rings sit inside their exterior and need no check.
///
/// # Examples
///
/// ```
/// use geo::{Coord, MultiPolygon, Rect};
/// use fieldplan_core::geometry::disc_contains;
///
/// let square = MultiPolygon::new(vec![
///     Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 }).to_polygon(),
/// ]);
/// assert!(disc_contains(Coord { x: 0.0, y: 0.0 }, 1.5, &square));
/// assert!(!disc_contains(Coord { x: 0.0, y: 0.0 }, 1.0, &square));
/// ```
#[must_use]
pub fn disc_contains(centre: Coord<f64>, radius: f64, geometry: &MultiPolygon<f64>) -> bool {
    let limit = radius + CONTAINMENT_EPSILON;
    !geometry.0.is_empty()
        && geometry
            .iter()
            .flat_map(|polygon| polygon.exterior().coords())
            .all(|vertex| distance(centre, *vertex) <= limit)
}

/// Length of a polyline.
#[must_use]
pub fn path_length(path: &LineString<f64>) -> f64 {
    Euclidean.length(path)
}

/// Every exterior vertex of a multipolygon, in ring order.
pub fn exterior_vertices(geometry: &MultiPolygon<f64>) -> impl Iterator<Item = Coord<f64>> + '_ {
    geometry
        .iter()
        .flat_map(|polygon| polygon.exterior().coords().copied())
}

pub(crate) fn map_multi_polygon(
    geometry: &MultiPolygon<f64>,
    transform: &CoordTransform,
) -> MultiPolygon<f64> {
    geometry.map_coords(|coord| transform.apply(coord))
}

pub(crate) fn map_line_string(
    path: &LineString<f64>,
    transform: &CoordTransform,
) -> LineString<f64> {
    path.map_coords(|coord| transform.apply(coord))
}
