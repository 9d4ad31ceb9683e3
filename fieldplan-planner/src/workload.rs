//! Per-cell workload estimates.
//!
//! A cell's workload is the weight of the Euclidean minimum spanning tree
//! over the targets inside it: a cheap lower bound on the walking needed to
//! visit them all once inside the cell.

use std::collections::HashMap;

use fieldplan_core::geometry::distance;
use fieldplan_core::{Cell, CellWorkload, Target};
use geo::Coord;
use petgraph::unionfind::UnionFind;

use crate::spatial::CellIndex;

/// Weight of the Euclidean minimum spanning tree over `points`.
///
/// Kruskal's algorithm over the complete graph. Fewer than two points give 0.
///
/// # Examples
///
/// ```
/// use fieldplan_planner::workload::spanning_tree_weight;
/// use geo::Coord;
///
/// let corners = [
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 3.0, y: 0.0 },
///     Coord { x: 3.0, y: 4.0 },
/// ];
/// assert_eq!(spanning_tree_weight(&corners), 7.0);
/// ```
#[must_use]
pub fn spanning_tree_weight(points: &[Coord<f64>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut edges: Vec<(f64, usize, usize)> = points
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| {
            points
                .iter()
                .enumerate()
                .skip(i + 1)
                .map(move |(j, &b)| (distance(a, b), i, j))
        })
        .collect();
    edges.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut components = UnionFind::<usize>::new(points.len());
    edges
        .into_iter()
        .filter(|&(_, a, b)| components.union(a, b))
        .take(points.len() - 1)
        .map(|(length, _, _)| length)
        .sum()
}

/// Workloads for every cell plus the targets that fell outside all cells.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadOutcome {
    /// One entry per cell, in cell order.
    pub workloads: Vec<CellWorkload>,
    /// Ids of targets no cell contains.
    pub outside: Vec<String>,
}

/// Join `targets` to `cells` and compute each cell's workload.
///
/// Cells without targets get a zero workload.
#[must_use]
pub fn cell_workloads(cells: &[Cell], targets: &[Target], index: &CellIndex<'_>) -> WorkloadOutcome {
    let mut members: HashMap<usize, Vec<Coord<f64>>> = HashMap::new();
    let mut outside = Vec::new();
    for target in targets {
        match index.locate(target.location) {
            Some(cell) => members.entry(cell.id).or_default().push(target.location),
            None => outside.push(target.id.clone()),
        }
    }
    let workloads = cells
        .iter()
        .map(|cell| {
            members
                .get(&cell.id)
                .map_or_else(
                    || CellWorkload::empty(cell.id),
                    |points| CellWorkload {
                        cell_id: cell.id,
                        target_count: points.len(),
                        workload: spanning_tree_weight(points),
                    },
                )
        })
        .collect();
    WorkloadOutcome { workloads, outside }
}
