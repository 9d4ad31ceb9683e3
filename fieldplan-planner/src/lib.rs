//! Planning stages for field logistics.
//!
//! The crate turns a region outline and a set of survey targets into a plan:
//! equal-area cells from a centroidal Voronoi tessellation, the fewest depots
//! whose service discs cover every cell, macro routes that sweep each depot's
//! cells under a distance cap, and micro routes that order the targets on
//! every macro route into a closed tour.
//!
//! [`Planner`] runs the stages individually or end to end. Optimisation
//! backends sit behind the [`fieldplan_core`] solver traits; this crate ships
//! native ones ([`IlpSetCoverSolver`], [`InsertionRoutingSolver`] and
//! [`CheapestArcTspSolver`]) and accepts any other implementation through
//! [`Planner::with_solvers`]. The stage building blocks are public in their
//! own modules for callers that need finer control.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod associate;
pub mod depots;
pub mod enclosing;
pub mod link;
pub mod macro_route;
pub mod micro_route;
mod planner;
mod routing;
mod set_cover;
pub mod spatial;
pub mod tessellate;
mod tsp;
mod voronoi;
pub mod workload;

pub use planner::{
    Associated, MacroRouting, MicroRouting, Planner, PlanningReport, TargetLinking, Tessellated,
    TessellationStats,
};
pub use routing::InsertionRoutingSolver;
pub use set_cover::{GreedySetCoverSolver, IlpSetCoverSolver};
pub use tsp::CheapestArcTspSolver;
