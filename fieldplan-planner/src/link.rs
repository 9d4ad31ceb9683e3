//! Linking targets to the macro routes that serve their cells.

use std::collections::HashMap;

use fieldplan_core::{MacroRoute, RouteAssignment, Target, TargetLink};

use crate::spatial::CellIndex;

/// Targets joined to cells and routes.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome {
    /// One link per target that lies inside a cell, in target order.
    pub links: Vec<TargetLink>,
    /// Ids of targets outside every cell.
    pub outside: Vec<String>,
}

impl LinkOutcome {
    /// Links whose cell is in no macro route.
    pub fn unrouted(&self) -> impl Iterator<Item = &TargetLink> {
        self.links.iter().filter(|link| !link.is_routed())
    }
}

/// Which route serves each cell. A cell listed by several routes keeps the
/// first.
#[must_use]
pub fn route_lookup(routes: &[MacroRoute]) -> HashMap<usize, RouteAssignment> {
    let mut lookup = HashMap::new();
    for route in routes {
        for &cell_id in &route.cells {
            lookup.entry(cell_id).or_insert_with(|| RouteAssignment {
                route_id: route.id.clone(),
                depot_id: route.depot_id.clone(),
            });
        }
    }
    lookup
}

/// Join every target to its cell and that cell's route.
#[must_use]
pub fn link_targets(targets: &[Target], index: &CellIndex<'_>, routes: &[MacroRoute]) -> LinkOutcome {
    let lookup = route_lookup(routes);
    let mut links = Vec::with_capacity(targets.len());
    let mut outside = Vec::new();
    for target in targets {
        match index.locate(target.location) {
            Some(cell) => links.push(TargetLink {
                target: target.clone(),
                cell_id: cell.id,
                route: lookup.get(&cell.id).cloned(),
            }),
            None => outside.push(target.id.clone()),
        }
    }
    LinkOutcome { links, outside }
}
