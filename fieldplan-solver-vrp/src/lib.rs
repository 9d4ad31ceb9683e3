//! `vrp-core` solver backends for field planning.
//!
//! This crate provides [`VrpRoutingSolver`] and [`VrpTourSolver`],
//! implementations of the [`VehicleRoutingSolver`](fieldplan_core::VehicleRoutingSolver)
//! and [`TspSolver`](fieldplan_core::TspSolver) traits backed by the
//! `vrp-core` metaheuristics. They trade the speed of the planner's native
//! heuristics for a broader search, and plug into the planner through
//! `Planner::with_solvers`.
//!
//! Both solvers hand `vrp-core` the problem's integer matrix unchanged. Macro
//! routing models every vehicle slot as a `vrp-core` vehicle with a time
//! window equal to the distance cap; tours use a single vehicle anchored at
//! node 0. Modelling and search failures surface as the traits' `Backend`
//! errors.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod routing;
mod vrp;

pub use routing::{VrpRoutingSolver, VrpSolverConfig, VrpTourSolver};
