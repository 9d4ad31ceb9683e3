//! Set-cover backends.

use fieldplan_core::{SetCoverError, SetCoverProblem, SetCoverSolver};
use good_lp::{
    Expression, ProblemVariables, Solution, SolverModel, Variable, constraint, default_solver,
    variable,
};
use log::debug;

/// Exact minimum set cover as a binary integer program.
///
/// Minimises the number of selected candidates subject to every element being
/// covered at least once. Each candidate's unit weight is raised by
/// `j / (m * (m + 1))`, which sums to less than one, so among minimum covers
/// the one with the smallest candidate indices wins.
///
/// # Examples
///
/// ```
/// use fieldplan_core::{SetCoverProblem, SetCoverSolver};
/// use fieldplan_planner::IlpSetCoverSolver;
///
/// # fn main() -> Result<(), fieldplan_core::SetCoverError> {
/// let problem = SetCoverProblem::new(3, vec![vec![0, 2], vec![1, 2], vec![2]])?;
/// assert_eq!(IlpSetCoverSolver.solve(&problem)?, vec![2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IlpSetCoverSolver;

impl SetCoverSolver for IlpSetCoverSolver {
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "objective weights are fractional and candidate counts are small"
    )]
    fn solve(&self, problem: &SetCoverProblem) -> Result<Vec<usize>, SetCoverError> {
        if let Some(element) = problem.uncoverable_element() {
            return Err(SetCoverError::Infeasible { element });
        }
        if problem.element_count() == 0 {
            return Ok(Vec::new());
        }

        let count = problem.candidate_count() as f64;
        let tie_break = 1.0 / (count * (count + 1.0));
        let mut vars = ProblemVariables::new();
        let picks: Vec<Variable> = (0..problem.candidate_count())
            .map(|_| vars.add(variable().binary()))
            .collect();
        let objective: Expression = picks
            .iter()
            .enumerate()
            .map(|(index, &pick)| pick * (1.0 + index as f64 * tie_break))
            .sum();

        let mut model = vars.minimise(objective).using(default_solver);
        for candidates in problem.covering() {
            let covered: Expression = candidates
                .iter()
                .filter_map(|&candidate| picks.get(candidate))
                .map(|&pick| Expression::from(pick))
                .sum();
            model = model.with(constraint!(covered >= 1.0));
        }

        debug!(
            "solving set cover: {} elements, {} candidates",
            problem.element_count(),
            problem.candidate_count()
        );
        let solution = model.solve().map_err(|err| SetCoverError::Backend {
            message: err.to_string(),
        })?;
        Ok(picks
            .iter()
            .enumerate()
            .filter(|(_, pick)| solution.value(**pick) > 0.5)
            .map(|(index, _)| index)
            .collect())
    }
}

/// Greedy set cover: repeatedly take the candidate covering the most
/// uncovered elements, then drop candidates made redundant by later picks.
///
/// Within a factor of `ln n` of optimal and much faster than the exact
/// solver on large instances. Ties go to the lowest candidate index.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySetCoverSolver;

impl SetCoverSolver for GreedySetCoverSolver {
    fn solve(&self, problem: &SetCoverProblem) -> Result<Vec<usize>, SetCoverError> {
        if let Some(element) = problem.uncoverable_element() {
            return Err(SetCoverError::Infeasible { element });
        }

        let mut covers: Vec<Vec<usize>> = vec![Vec::new(); problem.candidate_count()];
        for (element, candidates) in problem.covering().iter().enumerate() {
            for &candidate in candidates {
                if let Some(list) = covers.get_mut(candidate) {
                    list.push(element);
                }
            }
        }

        let mut covered = vec![false; problem.element_count()];
        let mut remaining = problem.element_count();
        let mut selected = Vec::new();
        while remaining > 0 {
            let fresh = |candidate: usize| {
                covers.get(candidate).map_or(0, |elements| {
                    elements
                        .iter()
                        .filter(|&&element| covered.get(element).is_some_and(|done| !done))
                        .count()
                })
            };
            let Some((best, best_gain)) = (0..covers.len())
                .map(|candidate| (candidate, fresh(candidate)))
                .fold(None, |best: Option<(usize, usize)>, (candidate, gain)| match best {
                    Some((_, top)) if top >= gain => best,
                    _ => Some((candidate, gain)),
                })
                .filter(|&(_, gain)| gain > 0)
            else {
                let element = covered.iter().position(|done| !done).unwrap_or(0);
                return Err(SetCoverError::Infeasible { element });
            };
            for &element in covers.get(best).map_or(&[][..], Vec::as_slice) {
                if let Some(done) = covered.get_mut(element) {
                    *done = true;
                }
            }
            remaining -= best_gain;
            selected.push(best);
        }

        // Drop picks whose elements are all covered by other picks, newest
        // first since early picks cover the most.
        let mut position = selected.len();
        while position > 0 {
            position -= 1;
            let mut trial = selected.clone();
            trial.remove(position);
            if problem.is_cover(&trial) {
                selected = trial;
            }
        }
        selected.sort_unstable();
        Ok(selected)
    }
}
