//! Cardinality constraints over sets of literals.
//!
//! Dispatches between the sequential-counter encoding (bound 1) and the
//! cardinality network (all other bounds), with guards for the degenerate
//! bounds so callers never have to special-case them.

use super::{cardnet, sequential, AuxAllocator, ClauseSink, Lit};

fn trivially_true(sink: &mut impl ClauseSink, eq: Option<Lit>) {
    if let Some(eq) = eq {
        sink.add_clause(&[eq]);
    }
}

fn trivially_false(sink: &mut impl ClauseSink, eq: Option<Lit>) {
    match eq {
        None => sink.add_clause(&[]),
        Some(eq) => sink.add_clause(&[!eq]),
    }
}

/// At most `bound` of the given literals are true.
pub(crate) fn at_most(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    lits: &[Lit],
    bound: usize,
    eq: Option<Lit>,
) {
    assert!(!lits.is_empty(), "literals must not be empty");
    if bound >= lits.len() {
        trivially_true(sink, eq);
    } else if bound == 1 {
        sequential::at_most_one(sink, aux, lits, eq);
    } else {
        cardnet::at_most(sink, aux, lits, bound, eq);
    }
}

/// At least `bound` of the given literals are true.
pub(crate) fn at_least(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    lits: &[Lit],
    bound: usize,
    eq: Option<Lit>,
) {
    assert!(!lits.is_empty(), "literals must not be empty");
    if bound == 0 {
        trivially_true(sink, eq);
    } else if bound > lits.len() {
        trivially_false(sink, eq);
    } else if bound == 1 {
        sequential::at_least_one(sink, lits, eq);
    } else {
        cardnet::at_least(sink, aux, lits, bound, eq);
    }
}

/// Exactly `bound` of the given literals are true.
pub(crate) fn equals(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    lits: &[Lit],
    bound: usize,
    eq: Option<Lit>,
) {
    assert!(!lits.is_empty(), "literals must not be empty");
    if bound > lits.len() {
        trivially_false(sink, eq);
    } else if bound == 1 {
        sequential::equals_one(sink, aux, lits, eq);
    } else {
        at_most(sink, aux, lits, bound, eq);
        at_least(sink, aux, lits, bound, eq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::test_util::{all_assignments, count_ones, sat_under, var_lits};

    #[test]
    fn dispatch_matches_semantics_for_all_bounds() {
        for len in 1..=5 {
            let lits = var_lits(len);
            for bound in 0..=len + 1 {
                let mut am = Vec::new();
                let mut al = Vec::new();
                let mut e = Vec::new();
                let mut aux = AuxAllocator::new();
                at_most(&mut am, &mut aux, &lits, bound, None);
                at_least(&mut al, &mut aux, &lits, bound, None);
                equals(&mut e, &mut aux, &lits, bound, None);
                for mask in all_assignments(len) {
                    let ones = count_ones(mask);
                    assert_eq!(sat_under(&am, &lits, mask, &[]), ones <= bound);
                    assert_eq!(sat_under(&al, &lits, mask, &[]), ones >= bound);
                    assert_eq!(sat_under(&e, &lits, mask, &[]), ones == bound);
                }
            }
        }
    }

    #[test]
    fn counter_and_network_agree_on_bound_one() {
        for len in 2..=5 {
            let lits = var_lits(len);
            let mut counter = Vec::new();
            let mut net = Vec::new();
            let mut aux = AuxAllocator::new();
            sequential::at_most_one(&mut counter, &mut aux, &lits, None);
            cardnet::at_most(&mut net, &mut aux, &lits, 1, None);
            for mask in all_assignments(len) {
                assert_eq!(
                    sat_under(&counter, &lits, mask, &[]),
                    sat_under(&net, &lits, mask, &[])
                );
            }
        }
    }

    #[test]
    fn at_most_one_with_common_literal_is_satisfiable() {
        // one of a, b, c together with at most one of them
        let lits = var_lits(3);
        let mut clauses = Vec::new();
        let mut aux = AuxAllocator::new();
        at_most(&mut clauses, &mut aux, &lits, 1, None);
        clauses.push(lits.clone());
        let models: Vec<u64> = all_assignments(3)
            .filter(|&mask| sat_under(&clauses, &lits, mask, &[]))
            .collect();
        assert_eq!(models, vec![0b001, 0b010, 0b100]);
    }

    #[test]
    fn saturated_at_least_with_blocking_clause_is_unsatisfiable() {
        // all of a, b, c together with one of them negated
        let lits = var_lits(3);
        let mut clauses = Vec::new();
        let mut aux = AuxAllocator::new();
        at_least(&mut clauses, &mut aux, &lits, 3, None);
        clauses.push(lits.iter().map(|&l| !l).collect());
        assert!(all_assignments(3).all(|mask| !sat_under(&clauses, &lits, mask, &[])));
    }
}
