//! Partial-success reporting.
//!
//! A planning run always finishes with an account of what was produced and
//! what was left out, so a person can patch gaps by hand.

use std::fmt;

/// A unit of work whose optimisation failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailedUnit {
    /// Depot selection failed; every cell is left without a depot.
    Placement,
    /// Macro routing failed for a depot; its cells are unrouted.
    Depot(String),
    /// Micro routing failed for a macro route.
    Route(String),
}

impl fmt::Display for FailedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placement => f.write_str("depot placement"),
            Self::Depot(id) => write!(f, "depot {id}"),
            Self::Route(id) => write!(f, "route {id}"),
        }
    }
}

/// A failed unit and the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    /// What failed.
    pub unit: FailedUnit,
    /// Backend diagnostic.
    pub reason: String,
}

impl UnitFailure {
    /// Record a failure, logging it as a warning.
    pub fn record(unit: FailedUnit, reason: impl fmt::Display) -> Self {
        let failure = Self {
            unit,
            reason: reason.to_string(),
        };
        log::warn!("{failure}");
        failure
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.unit, self.reason)
    }
}

/// Data-quality findings. Processing continues; the entity is excluded
/// downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataQualityWarning {
    /// No depot's service disc contains the cell.
    UncoveredCell {
        /// Affected cell.
        cell_id: usize,
    },
    /// The target lies outside every cell.
    TargetOutsideCells {
        /// Affected target.
        target_id: String,
    },
    /// The cell belongs to a depot but appears in no macro route.
    UnroutedCell {
        /// Affected cell.
        cell_id: usize,
    },
    /// The target's cell is unrouted, so it is left out of micro routing.
    UnlinkedTarget {
        /// Affected target.
        target_id: String,
    },
}

impl DataQualityWarning {
    /// Log the warning and hand it back for collection.
    #[must_use]
    pub fn logged(self) -> Self {
        log::warn!("{self}");
        self
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UncoveredCell { cell_id } => write!(f, "cell {cell_id} has no covering depot"),
            Self::TargetOutsideCells { target_id } => {
                write!(f, "target {target_id} lies outside every cell")
            }
            Self::UnroutedCell { cell_id } => write!(f, "cell {cell_id} is in no macro route"),
            Self::UnlinkedTarget { target_id } => {
                write!(f, "target {target_id} has no macro route")
            }
        }
    }
}

/// Counts of what a planning run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanSummary {
    /// Cells produced by tessellation.
    pub cells: usize,
    /// Depots placed.
    pub depots: usize,
    /// Cells without a covering depot.
    pub uncovered_cells: usize,
    /// Macro routes produced.
    pub macro_routes: usize,
    /// Cells left out of every macro route.
    pub unrouted_cells: usize,
    /// Targets joined to a routed cell.
    pub linked_targets: usize,
    /// Targets inside an unrouted cell.
    pub unlinked_targets: usize,
    /// Targets outside every cell.
    pub dropped_targets: usize,
    /// Micro routes produced.
    pub micro_routes: usize,
}
