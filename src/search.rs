//! Search strategies over candidate lattice dimensions.
//!
//! Every strategy drives a synthesis oracle over the (m, n) grid and
//! reports the smallest-area solution it finds together with the number
//! of oracle calls and the accumulated solver time. Lattice solvability
//! is pointwise monotone (a solvable shape stays solvable when either
//! dimension grows, by duplicating a border row or column), which
//! justifies the pruning and bound updates below.

use std::time::Duration;

use log::{debug, info};

use crate::synth::{SynthOutcome, Synthesizer};
use crate::timing::Timer;
use crate::Error;

/// A synthesis oracle over candidate dimensions.
pub trait Oracle {
    fn synthesize(&mut self, m: usize, n: usize, timer: &mut Timer)
        -> Result<SynthOutcome, Error>;
}

impl Oracle for Synthesizer<'_> {
    fn synthesize(
        &mut self,
        m: usize,
        n: usize,
        timer: &mut Timer,
    ) -> Result<SynthOutcome, Error> {
        Synthesizer::synthesize(self, m, n, timer)
    }
}

/// The best solution a search found, with the statistics of the solver
/// run that produced it.
#[derive(Debug, Clone)]
pub struct Solution {
    pub height: usize,
    pub width: usize,
    pub outcome: SynthOutcome,
}

impl Solution {
    fn new(height: usize, width: usize, outcome: SynthOutcome) -> Self {
        debug_assert!(outcome.found);
        Self {
            height,
            width,
            outcome,
        }
    }

    pub fn area(&self) -> usize {
        self.height * self.width
    }
}

/// Result of a dimension search.
///
/// The formula statistics are those of the solver run that produced the
/// solution, or of the last probe when no solution was found.
#[derive(Debug)]
pub struct SearchResult {
    pub solution: Option<Solution>,
    pub steps: usize,
    pub time: Duration,
    pub num_variables: usize,
    pub num_clauses: usize,
    pub unfolding_steps: Option<usize>,
}

/// The strategies differ only in the order they probe the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Simple,
    MinimizedSplit,
    BinaryPartition,
    Saddleback,
}

/// Bounds of a search: the area lower bound from the degree inequalities
/// and the naive upper bound dimensions of the dual-product construction.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub lower_area: usize,
    pub upper: (usize, usize),
}

/// Runs a search strategy to completion.
pub fn run(
    strategy: Strategy,
    oracle: &mut dyn Oracle,
    bounds: Bounds,
    upper_override: Option<(usize, usize)>,
) -> Result<SearchResult, Error> {
    let mut search = Search::new(oracle);
    let solution = match strategy {
        Strategy::Simple => {
            let (m, n) = upper_override.unwrap_or(bounds.upper);
            search.simple(m, n)?
        }
        Strategy::MinimizedSplit => search.minimized_split(bounds)?,
        Strategy::BinaryPartition => search.binary_partition(bounds)?,
        Strategy::Saddleback => search.saddleback(bounds)?,
    };
    if let Some(solution) = &solution {
        info!(
            "Search found a {}x{} lattice in {} oracle calls",
            solution.height, solution.width, search.steps
        );
    } else {
        info!("Search found no lattice in {} oracle calls", search.steps);
    }
    let (num_variables, num_clauses, unfolding_steps) = match &solution {
        Some(solution) => (
            solution.outcome.num_variables,
            solution.outcome.num_clauses,
            solution.outcome.unfolding_steps,
        ),
        None => search.last_stats,
    };
    Ok(SearchResult {
        solution,
        steps: search.steps,
        time: search.timer.elapsed(),
        num_variables,
        num_clauses,
        unfolding_steps,
    })
}

struct Search<'o> {
    oracle: &'o mut dyn Oracle,
    timer: Timer,
    steps: usize,
    last_stats: (usize, usize, Option<usize>),
}

impl<'o> Search<'o> {
    fn new(oracle: &'o mut dyn Oracle) -> Self {
        Self {
            oracle,
            timer: Timer::new(),
            steps: 0,
            last_stats: (0, 0, None),
        }
    }

    fn probe(&mut self, m: usize, n: usize) -> Result<SynthOutcome, Error> {
        self.steps += 1;
        let outcome = self.oracle.synthesize(m, n, &mut self.timer)?;
        self.last_stats = (
            outcome.num_variables,
            outcome.num_clauses,
            outcome.unfolding_steps,
        );
        debug!(
            "Probe {}x{}: {}",
            m,
            n,
            if outcome.found { "solvable" } else { "unsolvable" }
        );
        Ok(outcome)
    }

    /// A single attempt at the upper bound.
    fn simple(&mut self, m: usize, n: usize) -> Result<Option<Solution>, Error> {
        let outcome = self.probe(m, n)?;
        Ok(if outcome.found {
            Some(Solution::new(m, n, outcome))
        } else {
            None
        })
    }

    /// Binary search on the area, probing the maximal shapes within the
    /// current area budget.
    fn minimized_split(&mut self, bounds: Bounds) -> Result<Option<Solution>, Error> {
        let mut lower = bounds.lower_area;
        let mut upper = bounds.upper.0 * bounds.upper.1;
        let mut best: Option<Solution> = None;
        let mut failed: Vec<(usize, usize)> = Vec::new();

        while lower <= upper {
            let mid = (lower + upper) / 2;
            let mut found = false;

            let mut candidates = split_candidates(mid, &failed);
            candidates.sort_by_key(|&(m, n)| std::cmp::Reverse(m * n));
            for (m, n) in candidates {
                let outcome = self.probe(m, n)?;
                if outcome.found {
                    upper = m * n - 1;
                    best = Some(Solution::new(m, n, outcome));
                    found = true;
                    break;
                }
                failed.push((m, n));
            }

            if !found {
                lower = mid + 1;
            }
        }
        Ok(best)
    }

    /// Recursive rectangle partitioning with a one-dimensional binary
    /// minimum search along the bisecting line.
    fn binary_partition(&mut self, bounds: Bounds) -> Result<Option<Solution>, Error> {
        self.partition(bounds.lower_area, (1, 1), bounds.upper)
    }

    fn partition(
        &mut self,
        lower_area: usize,
        lower: (usize, usize),
        upper: (usize, usize),
    ) -> Result<Option<Solution>, Error> {
        let (lower_m, lower_n) = lower;
        let (upper_m, upper_n) = upper;

        if lower_m > upper_m || lower_n > upper_n || upper_m * upper_n < lower_area {
            return Ok(None);
        }
        if upper_m * lower_n < lower_area {
            return self.partition(lower_area, (lower_m, lower_n + 1), upper);
        }
        if lower_m * upper_n < lower_area {
            return self.partition(lower_area, (lower_m + 1, lower_n), upper);
        }

        let results = if upper_m - lower_m > upper_n - lower_n {
            // bisect along a row, searching for the minimal feasible width
            let mid = lower_m + (upper_m - lower_m) / 2;
            let line: Vec<(usize, usize)> = (lower_n..=upper_n).map(|n| (mid, n)).collect();
            let (line_best, parting) = self.binary_minimum(&line)?;
            let parting_n = parting.map_or(upper_n + 1, |index| line[index].1);
            vec![
                line_best,
                self.partition(lower_area, (mid + 1, lower_n), (upper_m, parting_n - 1))?,
                self.partition(lower_area, (lower_m, parting_n), (mid - 1, upper_n))?,
            ]
        } else {
            // bisect along a column, searching for the minimal feasible height
            let mid = lower_n + (upper_n - lower_n) / 2;
            let line: Vec<(usize, usize)> = (lower_m..=upper_m).map(|m| (m, mid)).collect();
            let (line_best, parting) = self.binary_minimum(&line)?;
            let parting_m = parting.map_or(upper_m + 1, |index| line[index].0);
            vec![
                line_best,
                self.partition(lower_area, (parting_m, lower_n), (upper_m, mid - 1))?,
                self.partition(lower_area, (lower_m, mid + 1), (parting_m - 1, upper_n))?,
            ]
        };

        Ok(results
            .into_iter()
            .flatten()
            .min_by_key(|solution| solution.area()))
    }

    /// Finds the first solvable entry of a line of shapes that is
    /// monotone in solvability.
    fn binary_minimum(
        &mut self,
        line: &[(usize, usize)],
    ) -> Result<(Option<Solution>, Option<usize>), Error> {
        let mut low = 0usize;
        let mut high = line.len();
        let mut best: Option<(usize, Solution)> = None;

        while low < high {
            let mid = (low + high) / 2;
            let (m, n) = line[mid];
            let outcome = self.probe(m, n)?;
            if outcome.found {
                best = Some((mid, Solution::new(m, n, outcome)));
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        Ok(match best {
            Some((index, solution)) => (Some(solution), Some(index)),
            None => (None, None),
        })
    }

    /// Staircase walk from the top-right corner of the dimension grid.
    fn saddleback(&mut self, bounds: Bounds) -> Result<Option<Solution>, Error> {
        let (upper_m, upper_n) = bounds.upper;
        let mut best: Option<Solution> = None;
        let mut row = 1;
        let mut column = upper_n as isize;

        while row <= upper_m && column >= 1 {
            let width = column as usize;
            if row * width < bounds.lower_area {
                row += 1;
                continue;
            }
            let outcome = self.probe(row, width)?;
            if outcome.found {
                if best
                    .as_ref()
                    .map_or(true, |b| row * width <= b.area())
                {
                    best = Some(Solution::new(row, width, outcome));
                }
                column -= 1;
            } else {
                row += 1;
            }
        }
        Ok(best)
    }
}

/// Maximal shapes with area at most `budget` that are not dominated by an
/// already failed shape.
fn split_candidates(budget: usize, failed: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut candidates = Vec::new();
    for m in 1..=budget {
        let n = budget / m;
        if (m + 1) * n <= budget {
            continue;
        }
        if failed.iter().any(|&(fm, fn_)| m <= fm && n <= fn_) {
            continue;
        }
        candidates.push((m, n));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Oracle backed by a solvability predicate, for strategy tests.
    struct FakeOracle<F: FnMut(usize, usize) -> bool> {
        solvable: F,
        calls: usize,
    }

    impl<F: FnMut(usize, usize) -> bool> FakeOracle<F> {
        fn new(solvable: F) -> Self {
            Self { solvable, calls: 0 }
        }
    }

    impl<F: FnMut(usize, usize) -> bool> Oracle for FakeOracle<F> {
        fn synthesize(
            &mut self,
            m: usize,
            n: usize,
            _timer: &mut Timer,
        ) -> Result<SynthOutcome, Error> {
            self.calls += 1;
            Ok(SynthOutcome {
                found: (self.solvable)(m, n),
                lattice: None,
                num_variables: 0,
                num_clauses: 0,
                unfolding_steps: None,
            })
        }
    }

    /// Minimum area of a solvable shape within the bounds, by brute force.
    fn brute_force_minimum(
        solvable: impl Fn(usize, usize) -> bool,
        upper: (usize, usize),
    ) -> Option<usize> {
        let mut best = None;
        for m in 1..=upper.0 {
            for n in 1..=upper.1 {
                if solvable(m, n) {
                    let area = m * n;
                    if best.map_or(true, |b| area < b) {
                        best = Some(area);
                    }
                }
            }
        }
        best
    }

    fn monotone_cases() -> Vec<(fn(usize, usize) -> bool, (usize, usize))> {
        vec![
            (|m, n| m >= 2 && n >= 2, (4, 4)),
            (|m, n| m >= 3 || n >= 4, (5, 5)),
            (|m, n| m * n >= 6 && m >= 2, (6, 4)),
            (|m, n| m >= 1 && n >= 1, (3, 3)),
            (|m, n| m >= 4 && n >= 1, (4, 2)),
        ]
    }

    #[test]
    fn saddleback_is_optimal_on_monotone_oracles() {
        for (solvable, upper) in monotone_cases() {
            let mut oracle = FakeOracle::new(solvable);
            let bounds = Bounds {
                lower_area: 1,
                upper,
            };
            let result = run(Strategy::Saddleback, &mut oracle, bounds, None).unwrap();
            let expected = brute_force_minimum(solvable, upper);
            assert_eq!(result.solution.map(|s| s.area()), expected);
            assert!(oracle.calls <= upper.0 + upper.1);
        }
    }

    #[test]
    fn binary_partition_is_optimal_on_monotone_oracles() {
        for (solvable, upper) in monotone_cases() {
            let mut oracle = FakeOracle::new(solvable);
            let bounds = Bounds {
                lower_area: 1,
                upper,
            };
            let result = run(Strategy::BinaryPartition, &mut oracle, bounds, None).unwrap();
            let expected = brute_force_minimum(solvable, upper);
            assert_eq!(result.solution.map(|s| s.area()), expected);
        }
    }

    #[test]
    fn minimized_split_is_optimal_on_monotone_oracles() {
        for (solvable, upper) in monotone_cases() {
            let mut oracle = FakeOracle::new(solvable);
            let bounds = Bounds {
                lower_area: 1,
                upper,
            };
            let result = run(Strategy::MinimizedSplit, &mut oracle, bounds, None).unwrap();
            let expected = brute_force_minimum(solvable, upper);
            assert_eq!(result.solution.map(|s| s.area()), expected);
        }
    }

    #[test]
    fn simple_probes_only_the_upper_bound() {
        let mut oracle = FakeOracle::new(|m, n| m >= 2 && n >= 2);
        let bounds = Bounds {
            lower_area: 1,
            upper: (3, 3),
        };
        let result = run(Strategy::Simple, &mut oracle, bounds, None).unwrap();
        assert_eq!(oracle.calls, 1);
        assert_eq!(result.steps, 1);
        let solution = result.solution.unwrap();
        assert_eq!((solution.height, solution.width), (3, 3));

        let mut oracle = FakeOracle::new(|m, n| m >= 2 && n >= 2);
        let result = run(Strategy::Simple, &mut oracle, bounds, Some((1, 3))).unwrap();
        assert!(result.solution.is_none());
    }

    #[test]
    fn searches_respect_the_area_lower_bound() {
        let mut probed_below = false;
        {
            let mut oracle = FakeOracle::new(|m, n| {
                if m * n < 4 {
                    probed_below = true;
                }
                m >= 2 && n >= 2
            });
            let bounds = Bounds {
                lower_area: 4,
                upper: (4, 4),
            };
            let result = run(Strategy::Saddleback, &mut oracle, bounds, None).unwrap();
            assert_eq!(result.solution.unwrap().area(), 4);
        }
        assert!(!probed_below);
    }
}
