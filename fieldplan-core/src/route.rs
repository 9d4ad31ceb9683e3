//! Macro and micro routes.

use geo::{Coord, LineString};

use crate::crs::{CoordTransform, Reproject};
use crate::geometry::{map_line_string, path_length};

/// A depot-anchored route through an ordered sequence of cells.
///
/// # Examples
///
/// ```
/// use geo::line_string;
/// use fieldplan_core::MacroRoute;
///
/// let route = MacroRoute {
///     id: MacroRoute::id_for("depot_3", 0),
///     depot_id: "depot_3".into(),
///     cells: vec![4, 1],
///     path: line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0), (x: 0.0, y: 0.0)],
/// };
/// assert_eq!(route.id, "depot_3_R0");
/// assert!((route.length() - 10.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MacroRoute {
    /// Identifier of the form `{depot_id}_R{sequence}`.
    pub id: String,
    /// Anchoring depot.
    pub depot_id: String,
    /// Visited cell identifiers in visit order.
    pub cells: Vec<usize>,
    /// Depot, visited cell centroids, depot.
    pub path: LineString<f64>,
}

impl MacroRoute {
    /// Route identifier for the `sequence`-th surviving route of a depot.
    #[must_use]
    pub fn id_for(depot_id: &str, sequence: usize) -> String {
        format!("{depot_id}_R{sequence}")
    }

    /// Geometric length of the path in CRS units.
    #[must_use]
    pub fn length(&self) -> f64 {
        path_length(&self.path)
    }
}

impl Reproject for MacroRoute {
    fn reproject(&self, transform: &CoordTransform) -> Self {
        Self {
            path: map_line_string(&self.path, transform),
            ..self.clone()
        }
    }
}

/// An ordered tour over the targets linked to one macro route.
#[derive(Debug, Clone, PartialEq)]
pub struct MicroRoute {
    /// Identifier of the parent macro route.
    pub id: String,
    /// Depot the tour starts and ends at.
    pub depot_id: String,
    /// Cells carried over from the parent macro route.
    pub cells: Vec<usize>,
    /// Target identifiers in visit order.
    pub target_ids: Vec<String>,
    /// Depot, targets in visit order, depot.
    pub path: LineString<f64>,
    /// Metres travelled along `path`, measured in the processing frame.
    pub total_distance: f64,
}

impl MicroRoute {
    /// Ordered points, first and last being the depot.
    #[must_use]
    pub fn ordered_points(&self) -> &[Coord<f64>] {
        &self.path.0
    }
}

impl Reproject for MicroRoute {
    fn reproject(&self, transform: &CoordTransform) -> Self {
        Self {
            path: map_line_string(&self.path, transform),
            ..self.clone()
        }
    }
}
