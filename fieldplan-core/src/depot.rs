//! Depots: fixed bases that vehicles leave from and return to.

use geo::Coord;

use crate::cell::Cell;
use crate::crs::{CoordTransform, Reproject};
use crate::geometry::{disc_contains, distance};

/// A selected depot location.
///
/// `radius` and `min_enclosing_radius` are always metres, whatever CRS the
/// owning layer uses; coverage tests are only meaningful in a metric frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Depot {
    /// Identifier unique within one placement run, e.g. `depot_12`.
    pub id: String,
    /// Depot position.
    pub location: Coord<f64>,
    /// Maximum serviceable distance in metres.
    pub radius: f64,
    /// Radius of the smallest circle enclosing the cells homed on this depot.
    /// Zero until association has run.
    pub min_enclosing_radius: f64,
}

impl Depot {
    /// Depot identifier derived from a candidate index.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldplan_core::Depot;
    ///
    /// assert_eq!(Depot::id_for_candidate(4), "depot_4");
    /// ```
    #[must_use]
    pub fn id_for_candidate(index: usize) -> String {
        format!("depot_{index}")
    }

    /// Create a depot with an unset enclosing radius.
    #[must_use]
    pub fn new(id: impl Into<String>, location: Coord<f64>, radius: f64) -> Self {
        Self {
            id: id.into(),
            location,
            radius,
            min_enclosing_radius: 0.0,
        }
    }

    /// Whether the cell lies entirely inside this depot's service disc.
    #[must_use]
    pub fn covers(&self, cell: &Cell) -> bool {
        disc_contains(self.location, self.radius, cell.geometry())
    }

    /// Distance from the depot to `coord`.
    #[must_use]
    pub fn distance_to(&self, coord: Coord<f64>) -> f64 {
        distance(self.location, coord)
    }
}

impl Reproject for Depot {
    fn reproject(&self, transform: &CoordTransform) -> Self {
        Self {
            location: transform.apply(self.location),
            ..self.clone()
        }
    }
}
