//! Cell-to-depot association records and intra-cell workloads.

use crate::cell::Cell;
use crate::crs::{CoordTransform, Reproject};

/// Depots able to service one cell, and the cell's home depot.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAssociation {
    /// Cell being described.
    pub cell_id: usize,
    /// Every depot whose service disc fully contains the cell, in depot order.
    pub associated_depots: Vec<String>,
    /// Nearest covering depot by centroid distance.
    pub closest_depot: Option<String>,
    /// Metres from the cell centroid to `closest_depot`.
    pub distance: Option<f64>,
}

impl CellAssociation {
    /// Whether at least one depot covers the cell.
    #[must_use]
    pub const fn is_covered(&self) -> bool {
        self.closest_depot.is_some()
    }
}

/// Estimated in-cell travel for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellWorkload {
    /// Cell being described.
    pub cell_id: usize,
    /// Targets falling inside the cell.
    pub target_count: usize,
    /// Minimum spanning tree weight over those targets, in metres.
    pub workload: f64,
}

impl CellWorkload {
    /// Workload for a cell with no targets.
    #[must_use]
    pub const fn empty(cell_id: usize) -> Self {
        Self {
            cell_id,
            target_count: 0,
            workload: 0.0,
        }
    }
}

/// A cell annotated with its association and workload, as handed downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedCell {
    /// The cell itself.
    pub cell: Cell,
    /// Depot association for the cell.
    pub association: CellAssociation,
    /// Workload estimate for the cell.
    pub workload: CellWorkload,
}

impl Reproject for AnnotatedCell {
    fn reproject(&self, transform: &CoordTransform) -> Self {
        Self {
            cell: self.cell.reproject(transform),
            association: self.association.clone(),
            workload: self.workload,
        }
    }
}
