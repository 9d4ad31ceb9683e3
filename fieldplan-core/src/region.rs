//! The work region outline.

use geo::{Area, BoundingRect, Contains, Coord, MultiPolygon, Point, Polygon, Rect};
use thiserror::Error;

use crate::crs::{Crs, Reproject};
use crate::geometry::{exterior_vertices, map_multi_polygon};

/// Reasons a region outline is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    /// The outline contained no polygons.
    #[error("region outline contains no polygons")]
    Empty,
    /// A coordinate was NaN or infinite.
    #[error("region outline contains a non-finite coordinate")]
    NonFiniteCoordinate,
    /// A polygon's exterior ring had fewer than three distinct vertices.
    #[error("region polygon {index} has a degenerate exterior ring")]
    DegenerateRing {
        /// Position of the offending polygon within the outline.
        index: usize,
    },
    /// The outline encloses no area.
    #[error("region outline encloses zero area")]
    ZeroArea,
}

/// A validated work-region outline.
///
/// # Examples
///
/// ```
/// use geo::{Coord, MultiPolygon, Rect};
/// use fieldplan_core::{Crs, LocalProjection, Region};
///
/// # fn main() -> Result<(), fieldplan_core::RegionError> {
/// let square = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 100.0 });
/// let region = Region::new(
///     Crs::Local(LocalProjection::at_null_island()),
///     MultiPolygon::new(vec![square.to_polygon()]),
/// )?;
/// assert!((region.area() - 10_000.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Optional human-readable name carried through to target provenance.
    pub name: Option<String>,
    crs: Crs,
    outline: MultiPolygon<f64>,
}

impl Region {
    /// Validate and wrap an outline.
    pub fn new(crs: Crs, outline: MultiPolygon<f64>) -> Result<Self, RegionError> {
        if outline.0.is_empty() {
            return Err(RegionError::Empty);
        }
        if exterior_vertices(&outline).any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(RegionError::NonFiniteCoordinate);
        }
        for (index, polygon) in outline.iter().enumerate() {
            // Closed rings repeat the first vertex, so a triangle has four.
            if polygon.exterior().0.len() < 4 {
                return Err(RegionError::DegenerateRing { index });
            }
        }
        if outline.unsigned_area() <= 0.0 {
            return Err(RegionError::ZeroArea);
        }
        Ok(Self {
            name: None,
            crs,
            outline,
        })
    }

    /// Wrap a single polygon.
    pub fn from_polygon(crs: Crs, polygon: Polygon<f64>) -> Result<Self, RegionError> {
        Self::new(crs, MultiPolygon::new(vec![polygon]))
    }

    /// Attach a name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// CRS of the outline.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// The outline geometry.
    #[must_use]
    pub const fn outline(&self) -> &MultiPolygon<f64> {
        &self.outline
    }

    /// Enclosed area in the square units of the CRS.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.outline.unsigned_area()
    }

    /// Axis-aligned extent.
    ///
    /// A validated outline always has one; the fallback is a zero-sized box at
    /// the origin.
    #[must_use]
    pub fn extent(&self) -> Rect<f64> {
        self.outline
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(Coord::zero(), Coord::zero()))
    }

    /// Whether `coord` lies strictly inside the outline.
    #[must_use]
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        self.outline.contains(&Point::from(coord))
    }

    /// Reproject into `target`.
    #[must_use]
    pub fn to_crs(&self, target: Crs) -> Self {
        let transform = self.crs.transform_to(target);
        Self {
            name: self.name.clone(),
            crs: target,
            outline: map_multi_polygon(&self.outline, &transform),
        }
    }
}

impl Reproject for Region {
    fn reproject(&self, transform: &crate::CoordTransform) -> Self {
        Self {
            name: self.name.clone(),
            crs: transform.target(),
            outline: map_multi_polygon(&self.outline, transform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalProjection;
    use geo::polygon;
    use rstest::rstest;

    fn metric() -> Crs {
        Crs::Local(LocalProjection::at_null_island())
    }

    #[rstest]
    fn rejects_empty_outline() {
        let result = Region::new(metric(), MultiPolygon::new(Vec::new()));
        assert_eq!(result, Err(RegionError::Empty));
    }

    #[rstest]
    fn rejects_zero_area() {
        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        let result = Region::from_polygon(metric(), flat);
        assert_eq!(result, Err(RegionError::ZeroArea));
    }

    #[rstest]
    fn rejects_non_finite_vertices() {
        let bad = polygon![(x: 0.0, y: 0.0), (x: f64::NAN, y: 0.0), (x: 1.0, y: 1.0)];
        let result = Region::from_polygon(metric(), bad);
        assert_eq!(result, Err(RegionError::NonFiniteCoordinate));
    }

    #[rstest]
    fn contains_excludes_outside_points() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let region = Region::from_polygon(metric(), square).expect("valid region");
        assert!(region.contains(Coord { x: 5.0, y: 5.0 }));
        assert!(!region.contains(Coord { x: 11.0, y: 5.0 }));
    }

    #[rstest]
    fn to_crs_round_trips_area() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)];
        let region = Region::from_polygon(metric(), square)
            .expect("valid region")
            .with_name("field");
        let geographic = region.to_crs(Crs::Wgs84);
        assert!(geographic.area() < 1.0);
        let back = geographic.to_crs(metric());
        assert!((back.area() - 10_000.0).abs() < 1e-3);
        assert_eq!(back.name.as_deref(), Some("field"));
    }
}
