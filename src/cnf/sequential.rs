//! Sequential-counter cardinality constraints for the k = 1 case.
//!
//! Uses the counter encoding of Sinz: Towards an Optimal CNF Encoding of
//! Boolean Cardinality Constraints.

use super::{reify_clause, reify_clauses, AuxAllocator, ClauseSink, Lit};

fn counter_clauses(lits: &[Lit], aux: &mut AuxAllocator) -> Vec<Vec<Lit>> {
    let len = lits.len();
    if len < 2 {
        // a single literal never exceeds the bound
        return Vec::new();
    }

    let counters: Vec<Lit> = (0..len - 1).map(|_| aux.fresh_lit()).collect();
    let mut clauses = Vec::with_capacity(3 * len - 4);

    clauses.push(vec![!lits[0], counters[0]]);
    clauses.push(vec![!lits[len - 1], !counters[len - 2]]);
    for i in 1..len - 1 {
        clauses.push(vec![!lits[i], counters[i]]);
        clauses.push(vec![!counters[i - 1], counters[i]]);
        clauses.push(vec![!lits[i], !counters[i - 1]]);
    }
    clauses
}

/// At most one of the given literals is true.
pub(crate) fn at_most_one(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    lits: &[Lit],
    eq: Option<Lit>,
) {
    assert!(!lits.is_empty(), "literals must not be empty");
    let clauses = counter_clauses(lits, aux);
    match eq {
        None => {
            for clause in &clauses {
                sink.add_clause(clause);
            }
        }
        // an empty clause set leaves the equivalence literal unconstrained
        Some(eq) if !clauses.is_empty() => reify_clauses(sink, aux, &clauses, eq),
        Some(_) => {}
    }
}

/// At least one of the given literals is true.
pub(crate) fn at_least_one(sink: &mut impl ClauseSink, lits: &[Lit], eq: Option<Lit>) {
    assert!(!lits.is_empty(), "literals must not be empty");
    match eq {
        None => sink.add_clause(lits),
        Some(eq) => reify_clause(sink, lits, eq),
    }
}

/// Exactly one of the given literals is true.
pub(crate) fn equals_one(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    lits: &[Lit],
    eq: Option<Lit>,
) {
    assert!(!lits.is_empty(), "literals must not be empty");
    at_most_one(sink, aux, lits, eq);
    at_least_one(sink, lits, eq);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::test_util::{all_assignments, count_ones, sat_under, var_lits};

    #[test]
    fn at_most_one_matches_semantics() {
        for len in 1..=5 {
            let lits = var_lits(len);
            let mut clauses = Vec::new();
            let mut aux = AuxAllocator::new();
            at_most_one(&mut clauses, &mut aux, &lits, None);
            for mask in all_assignments(len) {
                let expected = count_ones(mask) <= 1;
                assert_eq!(sat_under(&clauses, &lits, mask, &[]), expected);
            }
        }
    }

    #[test]
    fn at_least_one_matches_semantics() {
        let lits = var_lits(4);
        let mut clauses = Vec::new();
        at_least_one(&mut clauses, &lits, None);
        for mask in all_assignments(4) {
            assert_eq!(sat_under(&clauses, &lits, mask, &[]), count_ones(mask) >= 1);
        }
    }

    #[test]
    fn equals_one_matches_semantics() {
        let lits = var_lits(4);
        let mut clauses = Vec::new();
        let mut aux = AuxAllocator::new();
        equals_one(&mut clauses, &mut aux, &lits, None);
        for mask in all_assignments(4) {
            assert_eq!(sat_under(&clauses, &lits, mask, &[]), count_ones(mask) == 1);
        }
    }

    #[test]
    fn reified_at_most_one_is_forced_by_violations() {
        let lits = var_lits(4);
        let mut clauses = Vec::new();
        let mut aux = AuxAllocator::new();
        let eq = aux.fresh_lit();
        at_most_one(&mut clauses, &mut aux, &lits, Some(eq));
        for mask in all_assignments(4) {
            // asserting the equivalence literal enforces the bound
            let expected = count_ones(mask) <= 1;
            assert_eq!(sat_under(&clauses, &lits, mask, &[eq]), expected);
            // the negated equivalence literal is never contradictory
            assert!(sat_under(&clauses, &lits, mask, &[!eq]) || expected);
        }
    }
}
