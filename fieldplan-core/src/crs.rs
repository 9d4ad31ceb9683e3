//! Coordinate reference systems and reprojection.
//!
//! Two families of CRS are modelled: the geographic display CRS (WGS84
//! longitude/latitude) used for interchange, and local metric projections
//! used for every distance and area computation. [`LocalProjection`] is an
//! equirectangular projection anchored at an origin; it is affine, so
//! centroids and straight segments survive the round trip unchanged.

use geo::{Coord, Rect};
use thiserror::Error;

/// Mean Earth radius (IUGG) used to convert degrees to metres.
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

/// Latitudes beyond this bound are rejected as projection origins.
const MAX_ORIGIN_LATITUDE: f64 = 85.0;

/// Errors raised when constructing a projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrsError {
    /// The origin was not a finite, usable longitude/latitude pair.
    #[error("invalid projection origin ({longitude}, {latitude})")]
    InvalidOrigin {
        /// Supplied longitude in degrees.
        longitude: f64,
        /// Supplied latitude in degrees.
        latitude: f64,
    },
}

/// Equirectangular metric projection centred on an origin.
///
/// Coordinates are metres east (`x`) and north (`y`) of the origin.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use fieldplan_core::LocalProjection;
///
/// # fn main() -> Result<(), fieldplan_core::CrsError> {
/// let projection = LocalProjection::new(Coord { x: -105.0, y: 40.0 })?;
/// let metres = projection.forward(Coord { x: -105.0, y: 40.001 });
/// assert!((metres.y - 111.19).abs() < 0.01);
/// let back = projection.inverse(metres);
/// assert!((back.y - 40.001).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalProjection {
    origin: Coord<f64>,
}

impl LocalProjection {
    /// Build a projection anchored at `origin` (longitude, latitude in degrees).
    pub fn new(origin: Coord<f64>) -> Result<Self, CrsError> {
        let usable = origin.x.is_finite()
            && origin.y.is_finite()
            && (-180.0..=180.0).contains(&origin.x)
            && origin.y.abs() <= MAX_ORIGIN_LATITUDE;
        if !usable {
            return Err(CrsError::InvalidOrigin {
                longitude: origin.x,
                latitude: origin.y,
            });
        }
        Ok(Self { origin })
    }

    /// Projection anchored where the equator meets the prime meridian.
    ///
    /// Handy for data that is already metric and never leaves the processing
    /// frame.
    #[must_use]
    pub const fn at_null_island() -> Self {
        Self {
            origin: Coord { x: 0.0, y: 0.0 },
        }
    }

    /// Origin longitude/latitude in degrees.
    #[must_use]
    pub const fn origin(&self) -> Coord<f64> {
        self.origin
    }

    fn metres_per_radian_east(&self) -> f64 {
        EARTH_MEAN_RADIUS_METERS * self.origin.y.to_radians().cos()
    }

    /// Project a longitude/latitude coordinate into metres.
    #[must_use]
    pub fn forward(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (coord.x - self.origin.x).to_radians() * self.metres_per_radian_east(),
            y: (coord.y - self.origin.y).to_radians() * EARTH_MEAN_RADIUS_METERS,
        }
    }

    /// Map projected metres back to longitude/latitude.
    #[must_use]
    pub fn inverse(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + (coord.x / self.metres_per_radian_east()).to_degrees(),
            y: self.origin.y + (coord.y / EARTH_MEAN_RADIUS_METERS).to_degrees(),
        }
    }
}

/// Coordinate reference system tag carried by every spatial collection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Crs {
    /// Geographic longitude/latitude (EPSG:4326). The display CRS.
    #[default]
    Wgs84,
    /// Local metric projection. The processing CRS.
    Local(LocalProjection),
}

impl Crs {
    /// Whether coordinates are angular rather than metric.
    #[must_use]
    pub const fn is_geographic(&self) -> bool {
        matches!(self, Self::Wgs84)
    }

    /// Choose the metric frame in which data tagged with `self` is processed.
    ///
    /// Geographic data is projected around the centre of `extent`; data that is
    /// already metric stays in its own frame.
    pub fn processing_frame(&self, extent: Rect<f64>) -> Result<Self, CrsError> {
        match self {
            Self::Wgs84 => LocalProjection::new(extent.center()).map(Self::Local),
            Self::Local(_) => Ok(*self),
        }
    }

    /// Coordinate transform from `self` into `target`.
    #[must_use]
    pub const fn transform_to(&self, target: Self) -> CoordTransform {
        CoordTransform {
            from: *self,
            to: target,
        }
    }
}

/// A coordinate mapping between two CRSs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordTransform {
    from: Crs,
    to: Crs,
}

impl CoordTransform {
    /// Whether the transform leaves coordinates untouched.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Target CRS of the transform.
    #[must_use]
    pub const fn target(&self) -> Crs {
        self.to
    }

    /// Apply the transform to one coordinate.
    #[must_use]
    pub fn apply(&self, coord: Coord<f64>) -> Coord<f64> {
        if self.is_identity() {
            return coord;
        }
        let geographic = match self.from {
            Crs::Wgs84 => coord,
            Crs::Local(projection) => projection.inverse(coord),
        };
        match self.to {
            Crs::Wgs84 => geographic,
            Crs::Local(projection) => projection.forward(geographic),
        }
    }
}

/// Entities whose coordinates can be mapped into another CRS.
pub trait Reproject {
    /// Return a copy with every coordinate passed through `transform`.
    #[must_use]
    fn reproject(&self, transform: &CoordTransform) -> Self;
}

/// A CRS-tagged collection of homogeneous entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<T> {
    /// CRS of every feature's coordinates.
    pub crs: Crs,
    /// Features in stable order.
    pub features: Vec<T>,
}

impl<T> Layer<T> {
    /// Wrap `features` tagged with `crs`.
    #[must_use]
    pub const fn new(crs: Crs, features: Vec<T>) -> Self {
        Self { crs, features }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the layer holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over the features.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.features.iter()
    }
}

impl<T: Reproject> Layer<T> {
    /// Reproject every feature into `target`.
    #[must_use]
    pub fn to_crs(&self, target: Crs) -> Self {
        let transform = self.crs.transform_to(target);
        Self {
            crs: target,
            features: self
                .features
                .iter()
                .map(|feature| feature.reproject(&transform))
                .collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Layer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
