//! Core domain types for field-logistics planning.
//!
//! The crate defines the entities exchanged between planning stages (regions,
//! cells, depots, associations, targets and routes), the CRS model used to
//! move them between display and processing frames, the solver strategy
//! traits that stages call through, and the error and report types a planning
//! run produces. With the `serde` feature it also provides GeoJSON
//! interchange and the asset-store contract.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod association;
pub mod cell;
pub mod crs;
pub mod depot;
pub mod error;
pub mod geometry;
pub mod matrix;
pub mod params;
pub mod region;
pub mod report;
pub mod route;
pub mod solver;
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub mod store;
pub mod target;
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub mod wire;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use association::{AnnotatedCell, CellAssociation, CellWorkload};
pub use cell::{Cell, CellError};
pub use crs::{CoordTransform, Crs, CrsError, Layer, LocalProjection, Reproject};
pub use depot::Depot;
pub use error::PlanningError;
pub use matrix::{DistanceMatrix, MatrixError};
#[cfg(feature = "serde")]
pub use params::ConfigError;
pub use params::{DepotParams, PlanningConfig, RoutingParams, TessellationParams};
pub use region::{Region, RegionError};
pub use report::{DataQualityWarning, FailedUnit, PlanSummary, UnitFailure};
pub use route::{MacroRoute, MicroRoute};
pub use solver::{
    RoutingError, RoutingProblem, SetCoverError, SetCoverProblem, SetCoverSolver, TspError,
    TspProblem, TspSolver, VehicleRoutingSolver,
};
#[cfg(feature = "serde")]
pub use store::{AssetStore, StoreError};
pub use target::{RouteAssignment, Target, TargetLink};
#[cfg(feature = "serde")]
pub use wire::{FromFeature, ToFeature, WireError};
