//! Stage orchestration and the planning report.
//!
//! Every public stage takes CRS-tagged layers, projects them into a metric
//! processing frame, runs the stage and hands the result back in the CRS of
//! its primary input. [`Planner::plan`] runs all six stages inside a single
//! frame and projects only the final layers, so no stage sees round-trip
//! projection noise.

use std::collections::{HashMap, HashSet};

use fieldplan_core::{
    AnnotatedCell, Cell, CellAssociation, Crs, DataQualityWarning, Depot, FailedUnit,
    Layer, MacroRoute, MicroRoute, PlanSummary, PlanningConfig, PlanningError, Region,
    SetCoverSolver, Target, TargetLink, TspSolver, UnitFailure, VehicleRoutingSolver,
};
use geo::{BoundingRect, Coord, Rect};
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::associate::{associate, with_enclosing_radii};
use crate::depots::place_depots;
use crate::link::link_targets;
use crate::macro_route::{RoutableCell, route_depot};
use crate::micro_route::{micro_route, solve_tour};
use crate::routing::InsertionRoutingSolver;
use crate::set_cover::IlpSetCoverSolver;
use crate::spatial::CellIndex;
use crate::tessellate::{Tessellation, tessellate};
use crate::tsp::CheapestArcTspSolver;
use crate::workload::cell_workloads;

/// How the tessellation run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationStats {
    /// Lloyd iterations performed.
    pub iterations: usize,
    /// Whether seeds settled within the tolerance.
    pub converged: bool,
    /// Largest seed shift in the final iteration.
    pub max_shift: f64,
}

/// Output of [`Planner::tessellate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellated {
    /// Cells in the region's CRS.
    pub cells: Layer<Cell>,
    /// Convergence details.
    pub stats: TessellationStats,
}

/// Output of [`Planner::associate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Associated {
    /// Depots with `min_enclosing_radius` filled in.
    pub depots: Layer<Depot>,
    /// Cells with association and workload.
    pub cells: Layer<AnnotatedCell>,
    /// Uncovered cells and targets outside every cell.
    pub warnings: Vec<DataQualityWarning>,
}

/// Output of [`Planner::route_macro`].
#[derive(Debug, Clone, PartialEq)]
pub struct MacroRouting {
    /// Routes of every depot that routed successfully.
    pub routes: Layer<MacroRoute>,
    /// Depots whose routing failed.
    pub failures: Vec<UnitFailure>,
    /// Covered cells that ended up in no route.
    pub warnings: Vec<DataQualityWarning>,
}

/// Output of [`Planner::link_targets`].
#[derive(Debug, Clone, PartialEq)]
pub struct TargetLinking {
    /// Targets inside some cell, with the route serving that cell if any.
    pub links: Layer<TargetLink>,
    /// Targets outside every cell or inside an unrouted cell.
    pub warnings: Vec<DataQualityWarning>,
}

/// Output of [`Planner::route_micro`].
#[derive(Debug, Clone, PartialEq)]
pub struct MicroRouting {
    /// One route per macro route that has linked targets.
    pub routes: Layer<MicroRoute>,
    /// Macro routes whose tour could not be solved.
    pub failures: Vec<UnitFailure>,
}

/// Everything a planning run produced, in the region's CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanningReport {
    /// Annotated cells.
    pub cells: Layer<AnnotatedCell>,
    /// Placed depots.
    pub depots: Layer<Depot>,
    /// Macro routes.
    pub macro_routes: Layer<MacroRoute>,
    /// Target-to-route links.
    pub target_links: Layer<TargetLink>,
    /// Micro routes.
    pub micro_routes: Layer<MicroRoute>,
    /// How tessellation ended.
    pub tessellation: TessellationStats,
    /// Units whose optimisation failed.
    pub failures: Vec<UnitFailure>,
    /// Data-quality findings.
    pub warnings: Vec<DataQualityWarning>,
}

impl PlanningReport {
    /// Counts of what was produced and what was left out.
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        let count = |wanted: fn(&DataQualityWarning) -> bool| {
            self.warnings.iter().filter(|warning| wanted(warning)).count()
        };
        let linked = self.target_links.iter().filter(|link| link.is_routed()).count();
        PlanSummary {
            cells: self.cells.len(),
            depots: self.depots.len(),
            uncovered_cells: count(|w| matches!(w, DataQualityWarning::UncoveredCell { .. })),
            macro_routes: self.macro_routes.len(),
            unrouted_cells: count(|w| matches!(w, DataQualityWarning::UnroutedCell { .. })),
            linked_targets: linked,
            unlinked_targets: self.target_links.len() - linked,
            dropped_targets: count(|w| matches!(w, DataQualityWarning::TargetOutsideCells { .. })),
            micro_routes: self.micro_routes.len(),
        }
    }

    /// Whether every cell and target was routed without failures.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }
}

/// Runs the planning stages with pluggable solvers.
///
/// # Examples
///
/// ```
/// use fieldplan_core::{Layer, PlanningConfig, TessellationParams};
/// use fieldplan_core::test_support::{metric_crs, square_region};
/// use fieldplan_planner::Planner;
///
/// # fn main() -> Result<(), fieldplan_core::PlanningError> {
/// let mut config = PlanningConfig::default();
/// config.tessellation = TessellationParams::default()
///     .with_target_cell_area_square_meters(10_000.0)
///     .with_seed(42);
/// let planner = Planner::new(config);
/// let region = square_region(300.0);
/// let report = planner.plan(&region, &Layer::new(metric_crs(), Vec::new()))?;
/// assert_eq!(report.summary().cells, 9);
/// assert_eq!(report.summary().uncovered_cells, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Planner<C = IlpSetCoverSolver, V = InsertionRoutingSolver, T = CheapestArcTspSolver> {
    config: PlanningConfig,
    set_cover: C,
    router: V,
    tour: T,
}

impl Planner {
    /// Planner with the native solvers.
    #[must_use]
    pub fn new(config: PlanningConfig) -> Self {
        Self::with_solvers(
            config,
            IlpSetCoverSolver,
            InsertionRoutingSolver::default(),
            CheapestArcTspSolver,
        )
    }
}

impl<C, V, T> Planner<C, V, T>
where
    C: SetCoverSolver,
    V: VehicleRoutingSolver,
    T: TspSolver,
{
    /// Planner with explicit solver backends.
    pub const fn with_solvers(config: PlanningConfig, set_cover: C, router: V, tour: T) -> Self {
        Self {
            config,
            set_cover,
            router,
            tour,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// Partition `region` into roughly equal-area cells.
    ///
    /// # Errors
    ///
    /// Invalid parameters, a region smaller than one cell, seed sampling
    /// failure or a degenerate iteration.
    pub fn tessellate(&self, region: &Region) -> Result<Tessellated, PlanningError> {
        self.config.tessellation.validate()?;
        let frame = region.crs().processing_frame(region.extent())?;
        let outcome = self.tessellate_local(&region.to_crs(frame))?;
        let stats = tessellation_stats(&outcome);
        Ok(Tessellated {
            cells: Layer::new(frame, outcome.cells).to_crs(region.crs()),
            stats,
        })
    }

    /// Select the fewest depots covering every cell.
    ///
    /// # Errors
    ///
    /// Invalid parameters, no cells, or a placement failure.
    pub fn place_depots(
        &self,
        cells: &Layer<Cell>,
        region: &Region,
    ) -> Result<Layer<Depot>, PlanningError> {
        self.config.depots.validate()?;
        if cells.is_empty() {
            return Err(PlanningError::invalid_argument(
                "depot placement needs at least one cell",
            ));
        }
        let frame = frame_for(cells.crs, cells.iter().flat_map(cell_coords))?;
        let depots = place_depots(
            &cells.to_crs(frame).features,
            &region.to_crs(frame),
            &self.config.depots,
            &self.set_cover,
        )?;
        Ok(Layer::new(frame, depots).to_crs(cells.crs))
    }

    /// Associate cells with covering depots and estimate their workloads.
    ///
    /// # Errors
    ///
    /// Only when no processing frame can be built for the cells.
    pub fn associate(
        &self,
        depots: &Layer<Depot>,
        cells: &Layer<Cell>,
        targets: &Layer<Target>,
    ) -> Result<Associated, PlanningError> {
        let frame = frame_for(cells.crs, cells.iter().flat_map(cell_coords))?;
        let parts = associate_local(
            &depots.to_crs(frame).features,
            &cells.to_crs(frame).features,
            &targets.to_crs(frame).features,
        );
        let mut warnings = parts.uncovered;
        warnings.extend(outside_warnings(parts.outside));
        Ok(Associated {
            depots: Layer::new(frame, parts.depots).to_crs(cells.crs),
            cells: Layer::new(frame, parts.cells).to_crs(cells.crs),
            warnings,
        })
    }

    /// Route each depot's cells into distance-capped macro routes.
    ///
    /// # Errors
    ///
    /// Invalid routing parameters. Per-depot solver failures are reported in
    /// the result instead.
    pub fn route_macro(
        &self,
        depots: &Layer<Depot>,
        cells: &Layer<AnnotatedCell>,
    ) -> Result<MacroRouting, PlanningError> {
        self.config.routing.validate()?;
        let frame = frame_for(
            cells.crs,
            cells.iter().flat_map(|annotated| cell_coords(&annotated.cell)),
        )?;
        let (routes, failures, warnings) = self.route_macro_local(
            &depots.to_crs(frame).features,
            &cells.to_crs(frame).features,
        );
        Ok(MacroRouting {
            routes: Layer::new(frame, routes).to_crs(cells.crs),
            failures,
            warnings,
        })
    }

    /// Join targets to cells and the routes serving them.
    #[must_use]
    pub fn link_targets(
        &self,
        targets: &Layer<Target>,
        cells: &Layer<Cell>,
        routes: &Layer<MacroRoute>,
    ) -> TargetLinking {
        let local = targets.to_crs(cells.crs);
        let (links, warnings) = link_local(&local.features, &cells.features, &routes.features);
        TargetLinking {
            links: Layer::new(cells.crs, links).to_crs(targets.crs),
            warnings,
        }
    }

    /// Solve one closed tour per macro route over its linked targets.
    ///
    /// # Errors
    ///
    /// Only when no processing frame can be built for the depots.
    pub fn route_micro(
        &self,
        links: &Layer<TargetLink>,
        routes: &Layer<MacroRoute>,
        depots: &Layer<Depot>,
    ) -> Result<MicroRouting, PlanningError> {
        let frame = frame_for(depots.crs, depots.iter().map(|depot| depot.location))?;
        let (micro, failures) = self.route_micro_local(
            &links.to_crs(frame).features,
            &routes.features,
            &depots.to_crs(frame).features,
        );
        Ok(MicroRouting {
            routes: Layer::new(frame, micro).to_crs(routes.crs),
            failures,
        })
    }

    /// Run every stage over `region` and `targets`.
    ///
    /// Placement and routing failures are recorded in the report and the run
    /// carries on with whatever was produced.
    ///
    /// # Errors
    ///
    /// Invalid configuration or region, and tessellation failures, since no
    /// later stage can run without cells.
    pub fn plan(
        &self,
        region: &Region,
        targets: &Layer<Target>,
    ) -> Result<PlanningReport, PlanningError> {
        self.config.validate()?;
        let crs = region.crs();
        let frame = crs.processing_frame(region.extent())?;
        let local_region = region.to_crs(frame);
        let local_targets = targets.to_crs(frame).features;

        let outcome = self.tessellate_local(&local_region)?;
        let tessellation = tessellation_stats(&outcome);
        let cells = outcome.cells;

        let mut failures = Vec::new();
        let mut warnings = Vec::new();
        let depots = match place_depots(&cells, &local_region, &self.config.depots, &self.set_cover)
        {
            Ok(depots) => depots,
            Err(err @ (PlanningError::Placement(_) | PlanningError::CoverageViolated { .. })) => {
                failures.push(UnitFailure::record(FailedUnit::Placement, err));
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let parts = associate_local(&depots, &cells, &local_targets);
        warnings.extend(parts.uncovered);

        let (macro_routes, macro_failures, unrouted) =
            self.route_macro_local(&parts.depots, &parts.cells);
        failures.extend(macro_failures);
        warnings.extend(unrouted);

        let (links, link_warnings) = link_local(&local_targets, &cells, &macro_routes);
        warnings.extend(link_warnings);

        let (micro_routes, micro_failures) =
            self.route_micro_local(&links, &macro_routes, &parts.depots);
        failures.extend(micro_failures);

        let report = PlanningReport {
            cells: Layer::new(frame, parts.cells).to_crs(crs),
            depots: Layer::new(frame, parts.depots).to_crs(crs),
            macro_routes: Layer::new(frame, macro_routes).to_crs(crs),
            target_links: Layer::new(frame, links).to_crs(crs),
            micro_routes: Layer::new(frame, micro_routes).to_crs(crs),
            tessellation,
            failures,
            warnings,
        };
        let summary = report.summary();
        info!(
            "planned {} cells, {} depots, {} macro routes, {} micro routes; {} failures, {} warnings",
            summary.cells,
            summary.depots,
            summary.macro_routes,
            summary.micro_routes,
            report.failures.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    fn tessellate_local(&self, region: &Region) -> Result<Tessellation, PlanningError> {
        let params = &self.config.tessellation;
        let count = params.target_cell_count(region.area())?;
        let mut rng = params
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let outcome = tessellate(
            region.outline(),
            count,
            params.max_iterations,
            params.tolerance,
            &mut rng,
        )?;
        info!(
            "tessellated {:.0} m² into {} cells after {} iterations (converged: {})",
            region.area(),
            outcome.cells.len(),
            outcome.iterations,
            outcome.converged
        );
        Ok(outcome)
    }

    fn route_macro_local(
        &self,
        depots: &[Depot],
        cells: &[AnnotatedCell],
    ) -> (Vec<MacroRoute>, Vec<UnitFailure>, Vec<DataQualityWarning>) {
        let results: Vec<_> = depots
            .par_iter()
            .map(|depot| {
                let homed: Vec<RoutableCell<'_>> = cells
                    .iter()
                    .filter(|annotated| {
                        annotated.association.closest_depot.as_deref() == Some(depot.id.as_str())
                    })
                    .map(|annotated| RoutableCell {
                        cell: &annotated.cell,
                        workload: annotated.workload.workload,
                    })
                    .collect();
                route_depot(depot, &homed, &self.config.routing, &self.router)
            })
            .collect();

        let mut routes = Vec::new();
        let mut failures = Vec::new();
        for (depot, result) in depots.iter().zip(results) {
            match result {
                Ok(depot_routes) => routes.extend(depot_routes),
                Err(err) => failures.push(UnitFailure::record(
                    FailedUnit::Depot(depot.id.clone()),
                    err,
                )),
            }
        }

        let routed: HashSet<usize> = routes.iter().flat_map(|route| route.cells.iter().copied()).collect();
        let warnings = cells
            .iter()
            .filter(|annotated| {
                annotated.association.is_covered() && !routed.contains(&annotated.cell.id)
            })
            .map(|annotated| {
                DataQualityWarning::UnroutedCell {
                    cell_id: annotated.cell.id,
                }
                .logged()
            })
            .collect();
        info!(
            "macro routing produced {} routes from {} depots ({} failed)",
            routes.len(),
            depots.len(),
            failures.len()
        );
        (routes, failures, warnings)
    }

    fn route_micro_local(
        &self,
        links: &[TargetLink],
        routes: &[MacroRoute],
        depots: &[Depot],
    ) -> (Vec<MicroRoute>, Vec<UnitFailure>) {
        let mut members: HashMap<&str, Vec<&Target>> = HashMap::new();
        for link in links {
            if let Some(assignment) = &link.route {
                members
                    .entry(assignment.route_id.as_str())
                    .or_default()
                    .push(&link.target);
            }
        }
        let locations: HashMap<&str, Coord<f64>> = depots
            .iter()
            .map(|depot| (depot.id.as_str(), depot.location))
            .collect();

        let results: Vec<Option<Result<MicroRoute, UnitFailure>>> = routes
            .par_iter()
            .map(|route| {
                let targets = members.get(route.id.as_str()).filter(|t| !t.is_empty())?;
                let fail = |reason: String| UnitFailure::record(FailedUnit::Route(route.id.clone()), reason);
                let Some(depot) = locations.get(route.depot_id.as_str()) else {
                    return Some(Err(fail(format!("unknown depot {}", route.depot_id))));
                };
                Some(
                    solve_tour(*depot, targets, &self.tour)
                        .map(|tour| micro_route(&route.id, &route.depot_id, &route.cells, &tour))
                        .map_err(|err| fail(err.to_string())),
                )
            })
            .collect();

        let mut micro = Vec::new();
        let mut failures = Vec::new();
        for result in results.into_iter().flatten() {
            match result {
                Ok(route) => micro.push(route),
                Err(failure) => failures.push(failure),
            }
        }
        info!(
            "micro routing produced {} routes ({} failed)",
            micro.len(),
            failures.len()
        );
        (micro, failures)
    }
}

struct AssociationParts {
    depots: Vec<Depot>,
    cells: Vec<AnnotatedCell>,
    uncovered: Vec<DataQualityWarning>,
    outside: Vec<String>,
}

fn associate_local(depots: &[Depot], cells: &[Cell], targets: &[Target]) -> AssociationParts {
    let associations: Vec<CellAssociation> = associate(depots, cells);
    let placed = with_enclosing_radii(depots, cells, &associations);
    let index = CellIndex::new(cells);
    let workloads = cell_workloads(cells, targets, &index);

    let uncovered = associations
        .iter()
        .filter(|association| !association.is_covered())
        .map(|association| {
            DataQualityWarning::UncoveredCell {
                cell_id: association.cell_id,
            }
            .logged()
        })
        .collect();
    let annotated: Vec<AnnotatedCell> = cells
        .iter()
        .zip(associations)
        .zip(workloads.workloads)
        .map(|((cell, association), workload)| AnnotatedCell {
            cell: cell.clone(),
            association,
            workload,
        })
        .collect();
    info!(
        "associated {} cells with {} depots",
        annotated.len(),
        placed.len()
    );
    AssociationParts {
        depots: placed,
        cells: annotated,
        uncovered,
        outside: workloads.outside,
    }
}

fn link_local(
    targets: &[Target],
    cells: &[Cell],
    routes: &[MacroRoute],
) -> (Vec<TargetLink>, Vec<DataQualityWarning>) {
    let index = CellIndex::new(cells);
    let outcome = link_targets(targets, &index, routes);
    let mut warnings: Vec<DataQualityWarning> = outcome
        .unrouted()
        .map(|link| {
            DataQualityWarning::UnlinkedTarget {
                target_id: link.target.id.clone(),
            }
            .logged()
        })
        .collect();
    warnings.extend(outside_warnings(outcome.outside));
    info!(
        "linked {} of {} targets to cells",
        outcome.links.len(),
        targets.len()
    );
    (outcome.links, warnings)
}

fn outside_warnings(outside: Vec<String>) -> impl Iterator<Item = DataQualityWarning> {
    outside
        .into_iter()
        .map(|target_id| DataQualityWarning::TargetOutsideCells { target_id }.logged())
}

const fn tessellation_stats(outcome: &Tessellation) -> TessellationStats {
    TessellationStats {
        iterations: outcome.iterations,
        converged: outcome.converged,
        max_shift: outcome.max_shift,
    }
}

fn cell_coords(cell: &Cell) -> impl Iterator<Item = Coord<f64>> + '_ {
    fieldplan_core::geometry::exterior_vertices(cell.geometry())
}

/// Processing frame for data in `crs` spanning `coords`.
fn frame_for(crs: Crs, coords: impl Iterator<Item = Coord<f64>>) -> Result<Crs, PlanningError> {
    let points: geo::MultiPoint<f64> = coords.map(geo::Point::from).collect();
    let extent = points
        .bounding_rect()
        .unwrap_or_else(|| Rect::new(Coord::zero(), Coord::zero()));
    crs.processing_frame(extent).map_err(PlanningError::from)
}
