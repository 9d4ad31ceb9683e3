//! Errors that abort a planning stage outright.
//!
//! Per-unit optimisation failures are not errors at this level; they are
//! collected as [`UnitFailure`](crate::UnitFailure) values so the rest of the
//! run can proceed.

use thiserror::Error;

use crate::cell::CellError;
use crate::crs::CrsError;
use crate::region::RegionError;
use crate::solver::SetCoverError;

/// Errors raised by planning stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// A caller-supplied argument was rejected before any computation.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable explanation.
        reason: String,
    },
    /// The region outline failed validation.
    #[error("invalid region: {0}")]
    InvalidRegion(#[from] RegionError),
    /// A processing projection could not be built for the input.
    #[error("cannot build processing frame: {0}")]
    InvalidCrs(#[from] CrsError),
    /// A tessellation pass clipped every Voronoi cell away.
    #[error("tessellation iteration {iteration} produced no valid cells")]
    Degenerate {
        /// Zero-based iteration that failed.
        iteration: usize,
    },
    /// Rejection sampling could not place enough seeds inside the region.
    #[error("placed {accepted} of {requested} seeds after {attempts} attempts")]
    SeedSampling {
        /// Seeds requested.
        requested: usize,
        /// Seeds placed before giving up.
        accepted: usize,
        /// Samples drawn.
        attempts: usize,
    },
    /// The set-cover backend failed to select depots.
    #[error("depot placement failed: {0}")]
    Placement(#[source] SetCoverError),
    /// The selected depots leave a cell uncovered.
    #[error("selected depots leave cell {cell_id} uncovered")]
    CoverageViolated {
        /// First uncovered cell.
        cell_id: usize,
    },
    /// A generated cell geometry was unusable.
    #[error(transparent)]
    Cell(#[from] CellError),
}

impl PlanningError {
    /// Shorthand for [`PlanningError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
