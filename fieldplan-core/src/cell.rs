//! Work cells produced by tessellation.

use geo::{Area, Centroid, Coord, MultiPolygon};
use thiserror::Error;

use crate::crs::{CoordTransform, Reproject};
use crate::geometry::map_multi_polygon;

/// Errors returned by [`Cell::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// The geometry has no centroid because it is empty.
    #[error("cell {id} has an empty geometry")]
    EmptyGeometry {
        /// Identifier of the rejected cell.
        id: usize,
    },
}

/// One polygon of a region's tessellation.
///
/// Geometry is a multipolygon because clipping a Voronoi cell against a
/// concave region may split it.
///
/// # Examples
///
/// ```
/// use geo::{Coord, MultiPolygon, Rect};
/// use fieldplan_core::Cell;
///
/// # fn main() -> Result<(), fieldplan_core::CellError> {
/// let square = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 2.0, y: 2.0 });
/// let cell = Cell::new(7, MultiPolygon::new(vec![square.to_polygon()]))?;
/// let centroid = cell.centroid();
/// assert!((centroid.x - 1.0).abs() < 1e-9 && (centroid.y - 1.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Dense identifier, stable within one tessellation run.
    pub id: usize,
    geometry: MultiPolygon<f64>,
    centroid: Coord<f64>,
}

impl Cell {
    /// Build a cell and derive its centroid.
    pub fn new(id: usize, geometry: MultiPolygon<f64>) -> Result<Self, CellError> {
        let centroid = geometry
            .centroid()
            .ok_or(CellError::EmptyGeometry { id })?
            .0;
        Ok(Self {
            id,
            geometry,
            centroid,
        })
    }

    /// Cell outline.
    #[must_use]
    pub const fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Area-weighted centroid.
    #[must_use]
    pub const fn centroid(&self) -> Coord<f64> {
        self.centroid
    }

    /// Area in the square units of the owning layer's CRS.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }
}

impl Reproject for Cell {
    // The supported projections are affine, so the centroid maps exactly.
    fn reproject(&self, transform: &CoordTransform) -> Self {
        Self {
            id: self.id,
            geometry: map_multi_polygon(&self.geometry, transform),
            centroid: transform.apply(self.centroid),
        }
    }
}
