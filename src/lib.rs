//! Facade crate for the fieldplan logistics planner.
//!
//! This crate re-exports the core domain types and the planning pipeline, and
//! exposes the optional `vrp-core` solvers and filesystem asset store behind
//! feature flags.

#![forbid(unsafe_code)]

pub use fieldplan_core::{
    AnnotatedCell, Cell, CellAssociation, CellWorkload, Crs, DataQualityWarning, Depot,
    DepotParams, DistanceMatrix, FailedUnit, Layer, LocalProjection, MacroRoute, MicroRoute,
    PlanSummary, PlanningConfig, PlanningError, Region, RouteAssignment, RoutingError,
    RoutingParams, RoutingProblem, SetCoverError, SetCoverProblem, SetCoverSolver, Target,
    TargetLink, TessellationParams, TspError, TspProblem, TspSolver, UnitFailure,
    VehicleRoutingSolver,
};
pub use fieldplan_planner::{
    CheapestArcTspSolver, GreedySetCoverSolver, IlpSetCoverSolver, InsertionRoutingSolver,
    Planner, PlanningReport,
};

#[cfg(feature = "serde")]
pub use fieldplan_core::{AssetStore, FromFeature, StoreError, ToFeature, WireError};

#[cfg(feature = "test-support")]
pub use fieldplan_core::test_support;

#[cfg(feature = "solver-vrp")]
pub use fieldplan_solver_vrp::{VrpRoutingSolver, VrpSolverConfig, VrpTourSolver};

#[cfg(feature = "store-fs")]
pub use fieldplan_fs::FsAssetStore;
