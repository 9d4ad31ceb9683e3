//! Smallest enclosing circle (Welzl's algorithm, iterative form).

use fieldplan_core::geometry::distance;
use geo::Coord;

/// Relative slack when testing whether a point lies in a circle.
const INSIDE_TOLERANCE: f64 = 1e-9;

/// A circle in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Centre.
    pub centre: Coord<f64>,
    /// Radius.
    pub radius: f64,
}

#[expect(
    clippy::float_arithmetic,
    reason = "circle constructions are floating-point geometry"
)]
impl Circle {
    fn contains(&self, point: Coord<f64>) -> bool {
        distance(self.centre, point) <= self.radius * (1.0 + INSIDE_TOLERANCE) + INSIDE_TOLERANCE
    }

    fn through_two(a: Coord<f64>, b: Coord<f64>) -> Self {
        let centre = Coord {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        };
        Self {
            centre,
            radius: distance(a, b) / 2.0,
        }
    }

    /// Circumcircle, or the circle over the farthest pair when the points
    /// are collinear.
    fn through_three(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> Self {
        let (bx, by) = (b.x - a.x, b.y - a.y);
        let (cx, cy) = (c.x - a.x, c.y - a.y);
        let det = 2.0 * (bx * cy - by * cx);
        if det.abs() <= f64::EPSILON * (bx.abs() + by.abs() + cx.abs() + cy.abs()).powi(2) {
            return [
                Self::through_two(a, b),
                Self::through_two(a, c),
                Self::through_two(b, c),
            ]
            .into_iter()
            .fold(Self::through_two(a, a), |widest, circle| {
                if circle.radius > widest.radius {
                    circle
                } else {
                    widest
                }
            });
        }
        let b_norm = bx * bx + by * by;
        let c_norm = cx * cx + cy * cy;
        let offset = Coord {
            x: (cy * b_norm - by * c_norm) / det,
            y: (bx * c_norm - cx * b_norm) / det,
        };
        Self {
            centre: a + offset,
            radius: offset.x.hypot(offset.y),
        }
    }
}

/// Smallest circle containing every point, or `None` for no points.
///
/// # Examples
///
/// ```
/// use fieldplan_planner::enclosing::minimum_enclosing_circle;
/// use geo::Coord;
///
/// let square = [
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 2.0, y: 0.0 },
///     Coord { x: 2.0, y: 2.0 },
///     Coord { x: 0.0, y: 2.0 },
/// ];
/// let circle = minimum_enclosing_circle(&square).unwrap();
/// assert!((circle.radius - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[must_use]
pub fn minimum_enclosing_circle(points: &[Coord<f64>]) -> Option<Circle> {
    let (&first, rest) = points.split_first()?;
    let mut circle = Circle {
        centre: first,
        radius: 0.0,
    };
    for (i, &p) in rest.iter().enumerate() {
        if circle.contains(p) {
            continue;
        }
        // `p` lies on the boundary of the circle enclosing points[..=i+1].
        circle = Circle {
            centre: p,
            radius: 0.0,
        };
        let before_p = points.get(..=i).unwrap_or(&[]);
        for (j, &q) in before_p.iter().enumerate() {
            if circle.contains(q) {
                continue;
            }
            circle = Circle::through_two(p, q);
            for &r in before_p.get(..j).unwrap_or(&[]) {
                if !circle.contains(r) {
                    circle = Circle::through_three(p, q, r);
                }
            }
        }
    }
    Some(circle)
}
