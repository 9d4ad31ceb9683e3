//! Native closed-tour backend.

use fieldplan_core::{TspError, TspProblem, TspSolver};
use log::debug;

/// Nearest-arc tour construction followed by 2-opt descent.
///
/// Starting at the anchor, the tour repeatedly follows the cheapest arc to an
/// unvisited node (lowest index on ties), then reverses segments while that
/// shortens the tour. Costs are integers, so the descent always terminates.
///
/// # Examples
///
/// ```
/// use fieldplan_core::{DistanceMatrix, TspProblem, TspSolver};
/// use fieldplan_planner::CheapestArcTspSolver;
///
/// # fn main() -> Result<(), fieldplan_core::TspError> {
/// let xs = [0_u64, 30, 10, 20];
/// let problem = TspProblem::new(DistanceMatrix::from_fn(4, |a, b| xs[a].abs_diff(xs[b])))?;
/// assert_eq!(CheapestArcTspSolver.solve(&problem)?, vec![2, 3, 1]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestArcTspSolver;

impl TspSolver for CheapestArcTspSolver {
    fn solve(&self, problem: &TspProblem) -> Result<Vec<usize>, TspError> {
        let mut order = nearest_arc_tour(problem);
        let constructed = problem.tour_cost(&order);
        let moves = two_opt(problem, &mut order);
        debug!(
            "tour over {} stops: cost {constructed} -> {} after {moves} moves",
            problem.stop_count(),
            problem.tour_cost(&order)
        );
        Ok(order)
    }
}

fn nearest_arc_tour(problem: &TspProblem) -> Vec<usize> {
    let mut pending: Vec<usize> = (1..=problem.stop_count()).collect();
    let mut order = Vec::with_capacity(pending.len());
    let mut current = 0;
    while !pending.is_empty() {
        let (slot, _) = pending
            .iter()
            .enumerate()
            .fold((0, u64::MAX), |best, (slot, &node)| {
                let cost = problem.arc(current, node);
                if cost < best.1 { (slot, cost) } else { best }
            });
        current = pending.remove(slot);
        order.push(current);
    }
    order
}

/// Reverse `order[start..=end]` while that lowers the tour cost.
fn two_opt(problem: &TspProblem, order: &mut [usize]) -> usize {
    let len = order.len();
    let mut moves = 0;
    let mut improved = true;
    while improved {
        improved = false;
        for start in 0..len {
            for end in start + 1..len {
                if !reversal_shortens(problem, order, start, end) {
                    continue;
                }
                if let Some(segment) = order.get_mut(start..=end) {
                    segment.reverse();
                }
                moves += 1;
                improved = true;
            }
        }
    }
    moves
}

/// Whether reversing `order[start..=end]` lowers the tour cost.
///
/// The change is computed from the two boundary arcs plus the segment's
/// internal arcs, which differ when the matrix is asymmetric.
fn reversal_shortens(problem: &TspProblem, order: &[usize], start: usize, end: usize) -> bool {
    let Some(segment) = order.get(start..=end) else {
        return false;
    };
    let (Some(&first), Some(&last)) = (segment.first(), segment.last()) else {
        return false;
    };
    let before = start
        .checked_sub(1)
        .and_then(|previous| order.get(previous))
        .copied()
        .unwrap_or(0);
    let after = order.get(end + 1).copied().unwrap_or(0);
    let arcs = || segment.iter().copied().zip(segment.iter().copied().skip(1));
    let forward: u64 = arcs().map(|(from, to)| problem.arc(from, to)).sum();
    let backward: u64 = arcs().map(|(from, to)| problem.arc(to, from)).sum();
    let current = problem.arc(before, first) + forward + problem.arc(last, after);
    let reversed = problem.arc(before, last) + backward + problem.arc(first, after);
    reversed < current
}
