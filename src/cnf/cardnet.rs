//! Sorting-network cardinality constraints for general bounds.
//!
//! Builds the cardinality network of Asin et al.: pairwise half sorters
//! combined by h-mergers, with a final s-merger retaining the top k + 1
//! outputs. The network is one-directional: inputs force sorted outputs
//! upwards, so bounding the (k + 1)-th output encodes "at most k".

use super::{reify_clause, AuxAllocator, ClauseSink, Lit};

fn merger_basic(sink: &mut impl ClauseSink, c1: Lit, c2: Lit, a: Lit, b: Lit) {
    sink.add_clause(&[!a, !b, c2]);
    sink.add_clause(&[!a, c1]);
    sink.add_clause(&[!b, c1]);
}

fn merger_recursive(sink: &mut impl ClauseSink, d: &[Lit], e: &[Lit], c: &[Lit], len: usize) {
    for i in 1..=len {
        sink.add_clause(&[!d[i], !e[i - 1], c[2 * i]]);
        sink.add_clause(&[!d[i], c[2 * i - 1]]);
        sink.add_clause(&[!e[i - 1], c[2 * i - 1]]);
    }
}

fn even_half(seq: &[Lit]) -> Vec<Lit> {
    seq.iter().copied().step_by(2).collect()
}

fn odd_half(seq: &[Lit]) -> Vec<Lit> {
    seq.iter().copied().skip(1).step_by(2).collect()
}

/// Merges two sorted sequences of equal power-of-two length L into a
/// sorted sequence of length 2L.
fn h_merger(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    a: &[Lit],
    b: &[Lit],
) -> Vec<Lit> {
    assert_eq!(a.len(), b.len(), "merger inputs of unequal length");
    let len = a.len();
    assert!(len > 0, "merger input of length 0");

    if len == 1 {
        let (c1, c2) = (aux.fresh_lit(), aux.fresh_lit());
        merger_basic(sink, c1, c2, a[0], b[0]);
        return vec![c1, c2];
    }

    let d = h_merger(sink, aux, &even_half(a), &even_half(b));
    let e = h_merger(sink, aux, &odd_half(a), &odd_half(b));
    let c: Vec<Lit> = (0..2 * len + 1).map(|_| aux.fresh_lit()).collect();
    merger_recursive(sink, &d, &e, &c, len - 1);

    let mut merged = Vec::with_capacity(2 * len);
    merged.push(d[0]);
    merged.extend_from_slice(&c[1..2 * len - 1]);
    merged.push(*e.last().unwrap());
    merged
}

/// Sorts a power-of-two length sequence.
fn half_sorter(sink: &mut impl ClauseSink, aux: &mut AuxAllocator, seq: &[Lit]) -> Vec<Lit> {
    let len = seq.len();
    assert!(len >= 2, "sorter input must have length >= 2");

    if len == 2 {
        return h_merger(sink, aux, &seq[..1], &seq[1..]);
    }
    let fst = half_sorter(sink, aux, &seq[..len / 2]);
    let snd = half_sorter(sink, aux, &seq[len / 2..]);
    h_merger(sink, aux, &fst, &snd)
}

/// Simplified merger retaining only the top half of the merged outputs.
fn s_merger(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    a: &[Lit],
    b: &[Lit],
) -> Vec<Lit> {
    assert_eq!(a.len(), b.len(), "merger inputs of unequal length");
    let len = a.len();
    assert!(len > 0, "merger input of length 0");

    if len == 1 {
        let (c1, c2) = (aux.fresh_lit(), aux.fresh_lit());
        merger_basic(sink, c1, c2, a[0], b[0]);
        return vec![c1, c2];
    }

    let d = s_merger(sink, aux, &even_half(a), &even_half(b));
    let e = s_merger(sink, aux, &odd_half(a), &odd_half(b));
    let c: Vec<Lit> = (0..len + 1).map(|_| aux.fresh_lit()).collect();
    merger_recursive(sink, &d, &e, &c, len / 2);

    let mut merged = Vec::with_capacity(len + 1);
    merged.push(d[0]);
    merged.extend_from_slice(&c[1..]);
    merged
}

/// Sorts the top k outputs of a sequence whose length is a multiple of
/// the power-of-two block size k.
fn network(sink: &mut impl ClauseSink, aux: &mut AuxAllocator, vars: &[Lit], k: usize) -> Vec<Lit> {
    assert!(vars.len() >= k, "input must not be shorter than the block size");

    if vars.len() == k {
        return half_sorter(sink, aux, vars);
    }
    let fst = network(sink, aux, &vars[..k], k);
    let snd = network(sink, aux, &vars[k..], k);
    let mut merged = s_merger(sink, aux, &fst, &snd);
    merged.truncate(k);
    merged
}

/// Rounds the bound up to the next power of two strictly above it and pads
/// the input with fresh auxiliaries to a multiple of that block size, then
/// returns the sorted output prefix.
fn sorted_outputs(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    lits: &[Lit],
    bound: usize,
) -> Vec<Lit> {
    let k = if bound < 1 {
        2
    } else {
        1 << (usize::BITS - bound.leading_zeros())
    };

    let mut padded = lits.to_vec();
    if padded.len() % k != 0 {
        let target = k * (padded.len() / k + 1);
        padded.resize_with(target, || aux.fresh_lit());
    }
    network(sink, aux, &padded, k)
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
    let outputs = sorted_outputs(sink, aux, lits, bound);
    let condition = !outputs[bound];
    match eq {
        None => sink.add_clause(&[condition]),
        Some(eq) => reify_clause(sink, &[condition], eq),
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
    assert!(bound <= lits.len(), "bound exceeds the number of literals");
    let negated: Vec<Lit> = lits.iter().map(|&l| !l).collect();
    at_most(sink, aux, &negated, lits.len() - bound, eq);
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
    at_most(sink, aux, lits, bound, eq);
    at_least(sink, aux, lits, bound, eq);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::test_util::{all_assignments, count_ones, sat_under, var_lits};

    #[test]
    fn at_most_matches_semantics() {
        for len in 2..=5 {
            let lits = var_lits(len);
            for bound in 0..=len {
                let mut clauses = Vec::new();
                let mut aux = AuxAllocator::new();
                at_most(&mut clauses, &mut aux, &lits, bound, None);
                for mask in all_assignments(len) {
                    let expected = count_ones(mask) <= bound;
                    assert_eq!(
                        sat_under(&clauses, &lits, mask, &[]),
                        expected,
                        "at_most({}, {}) under {:b}",
                        len,
                        bound,
                        mask
                    );
                }
            }
        }
    }

    #[test]
    fn at_least_matches_semantics() {
        for len in 2..=5 {
            let lits = var_lits(len);
            for bound in 0..=len {
                let mut clauses = Vec::new();
                let mut aux = AuxAllocator::new();
                at_least(&mut clauses, &mut aux, &lits, bound, None);
                for mask in all_assignments(len) {
                    let expected = count_ones(mask) >= bound;
                    assert_eq!(
                        sat_under(&clauses, &lits, mask, &[]),
                        expected,
                        "at_least({}, {}) under {:b}",
                        len,
                        bound,
                        mask
                    );
                }
            }
        }
    }

    #[test]
    fn equals_matches_semantics() {
        let lits = var_lits(4);
        for bound in 0..=4 {
            let mut clauses = Vec::new();
            let mut aux = AuxAllocator::new();
            equals(&mut clauses, &mut aux, &lits, bound, None);
            for mask in all_assignments(4) {
                let expected = count_ones(mask) == bound;
                assert_eq!(sat_under(&clauses, &lits, mask, &[]), expected);
            }
        }
    }

    #[test]
    fn reified_equals_is_two_sided() {
        let lits = var_lits(3);
        let mut clauses = Vec::new();
        let mut aux = AuxAllocator::new();
        let eq = aux.fresh_lit();
        equals(&mut clauses, &mut aux, &lits, 2, Some(eq));
        for mask in all_assignments(3) {
            let holds = count_ones(mask) == 2;
            // asserting the equivalence literal enforces the constraint
            assert_eq!(sat_under(&clauses, &lits, mask, &[eq]), holds);
            // the negated equivalence literal never causes a contradiction
            assert!(sat_under(&clauses, &lits, mask, &[!eq]) || holds);
        }
    }
}
