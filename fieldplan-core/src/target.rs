//! Point targets and their links to macro routes.

use geo::Coord;

use crate::crs::{CoordTransform, Reproject};

/// A point to visit, produced by an upstream detection pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Globally unique identifier, typically a UUID.
    pub id: String,
    /// Target position.
    pub location: Coord<f64>,
    /// Name of the region the target was detected in.
    pub region_name: Option<String>,
    /// Version of the region outline used during detection.
    pub region_outline_version: Option<String>,
}

impl Target {
    /// Create a target without provenance tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::Coord;
    /// use fieldplan_core::Target;
    ///
    /// let target = Target::new("t-1", Coord { x: 1.0, y: 2.0 });
    /// assert!(target.region_name.is_none());
    /// ```
    #[must_use]
    pub fn new(id: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            location,
            region_name: None,
            region_outline_version: None,
        }
    }

    /// Attach provenance tags.
    #[must_use]
    pub fn with_provenance(
        mut self,
        region_name: impl Into<String>,
        outline_version: impl Into<String>,
    ) -> Self {
        self.region_name = Some(region_name.into());
        self.region_outline_version = Some(outline_version.into());
        self
    }
}

impl Reproject for Target {
    fn reproject(&self, transform: &CoordTransform) -> Self {
        Self {
            location: transform.apply(self.location),
            ..self.clone()
        }
    }
}

/// The macro route serving a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteAssignment {
    /// Macro route identifier.
    pub route_id: String,
    /// Depot the route is anchored at.
    pub depot_id: String,
}

/// A target joined to its containing cell and, if routed, its macro route.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetLink {
    /// The linked target.
    pub target: Target,
    /// Cell containing the target.
    pub cell_id: usize,
    /// Route serving the cell; `None` when the cell is unrouted.
    pub route: Option<RouteAssignment>,
}

impl TargetLink {
    /// Whether the target can take part in micro routing.
    #[must_use]
    pub const fn is_routed(&self) -> bool {
        self.route.is_some()
    }
}

impl Reproject for TargetLink {
    fn reproject(&self, transform: &CoordTransform) -> Self {
        Self {
            target: self.target.reproject(transform),
            cell_id: self.cell_id,
            route: self.route.clone(),
        }
    }
}
