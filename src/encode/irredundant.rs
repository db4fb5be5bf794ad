//! Lattice validity through explicit path variables.
//!
//! A positive path enters at one top cell, leaves at one bottom cell and
//! is 4-connected; a blocking path crosses from the left to the right
//! column and is 8-connected. Interior path cells are forced to have
//! exactly two active neighbours, which makes every path irredundant.

use super::{
    cell_assignment, cell_supports, implied_by_function, Antecedent, Encoding, Frame,
};
use crate::cnf::{cardinality, cardnet, AuxAllocator, ClauseSink, Lit, VarName};
use crate::function::Assignment;

pub(crate) struct Irredundant;

fn path(tag: Option<u32>) -> impl Fn(u32, u32) -> VarName {
    move |i, j| VarName::Path { i, j, tag }
}

fn blocking_path(tag: Option<u32>) -> impl Fn(u32, u32) -> VarName {
    move |i, j| VarName::NegPath { i, j, tag }
}

fn bottom_row(frame: &Frame<'_>, path: &dyn Fn(u32, u32) -> VarName) -> Vec<Lit> {
    (1..=frame.n).map(|j| Lit::pos(path(frame.m, j))).collect()
}

fn right_column(frame: &Frame<'_>, path: &dyn Fn(u32, u32) -> VarName) -> Vec<Lit> {
    (1..=frame.m).map(|i| Lit::pos(path(i, frame.n))).collect()
}

/// Shape of the conducting top-to-bottom path.
fn positive_shape<S: ClauseSink>(
    frame: &Frame<'_>,
    aux: &mut AuxAllocator,
    sink: &mut S,
    path: &dyn Fn(u32, u32) -> VarName,
) {
    let (m, n) = (frame.m, frame.n);
    let top: Vec<Lit> = (1..=n).map(|j| Lit::pos(path(1, j))).collect();
    let bottom: Vec<Lit> = (1..=n).map(|j| Lit::pos(path(m, j))).collect();
    cardinality::at_most(sink, aux, &top, 1, None);
    cardinality::at_most(sink, aux, &bottom, 1, None);

    if m == 1 {
        // a single-row path is a single cell, fixed by the terminal clause
    } else if n == 1 {
        for i in 1..m {
            sink.add_clause(&[Lit::neg(path(i + 1, 1)), Lit::pos(path(i, 1))]);
        }
    } else {
        for j in 1..=n {
            sink.add_clause(&[Lit::neg(path(1, j)), Lit::pos(path(2, j))]);
            sink.add_clause(&[Lit::neg(path(m, j)), Lit::pos(path(m - 1, j))]);
        }
        for i in 2..m {
            for j in 1..=n {
                let neighbours: Vec<Lit> = frame
                    .adjacent4(i, j)
                    .into_iter()
                    .map(|(r, c)| Lit::pos(path(r, c)))
                    .collect();
                let two_active = aux.fresh_lit();
                cardinality::equals(sink, aux, &neighbours, 2, Some(two_active));
                sink.add_clause(&[Lit::neg(path(i, j)), two_active]);
            }
        }
    }
}

/// Shape of the blocking left-to-right path.
fn blocking_shape<S: ClauseSink>(
    frame: &Frame<'_>,
    aux: &mut AuxAllocator,
    sink: &mut S,
    path: &dyn Fn(u32, u32) -> VarName,
) {
    let (m, n) = (frame.m, frame.n);
    let left: Vec<Lit> = (1..=m).map(|i| Lit::pos(path(i, 1))).collect();
    let right: Vec<Lit> = (1..=m).map(|i| Lit::pos(path(i, n))).collect();
    cardinality::at_most(sink, aux, &left, 1, None);
    cardinality::at_most(sink, aux, &right, 1, None);

    if n == 1 {
        // a single-column path is a single cell, fixed by the terminal clause
    } else if m == 1 {
        for j in 1..n {
            sink.add_clause(&[Lit::neg(path(1, j + 1)), Lit::pos(path(1, j))]);
        }
    } else {
        for i in 1..=m {
            let mut rows = Vec::with_capacity(3);
            if i > 1 {
                rows.push(i - 1);
            }
            rows.push(i);
            if i < m {
                rows.push(i + 1);
            }

            for &(j, next) in &[(1, 2), (n, n - 1)] {
                let entries: Vec<Lit> = rows.iter().map(|&r| Lit::pos(path(r, next))).collect();
                let one_active = aux.fresh_lit();
                cardnet::equals(sink, aux, &entries, 1, Some(one_active));
                sink.add_clause(&[Lit::neg(path(i, j)), one_active]);
            }
            for j in 2..n {
                let neighbours: Vec<Lit> = frame
                    .adjacent8(i, j)
                    .into_iter()
                    .map(|(r, c)| Lit::pos(path(r, c)))
                    .collect();
                let two_active = aux.fresh_lit();
                cardinality::equals(sink, aux, &neighbours, 2, Some(two_active));
                sink.add_clause(&[Lit::neg(path(i, j)), two_active]);
            }
        }
    }
}

impl Encoding for Irredundant {
    fn universal<S: ClauseSink>(frame: &Frame<'_>, aux: &mut AuxAllocator, sink: &mut S) {
        let conducting = path(None);
        cell_supports(frame, aux, sink, true, &conducting);
        positive_shape(frame, aux, sink, &conducting);
        implied_by_function(
            frame,
            sink,
            Antecedent::FunctionTrue,
            &bottom_row(frame, &conducting),
        );

        let blocking = blocking_path(None);
        cell_supports(frame, aux, sink, false, &blocking);
        blocking_shape(frame, aux, sink, &blocking);
        implied_by_function(
            frame,
            sink,
            Antecedent::FunctionFalse,
            &right_column(frame, &blocking),
        );
    }

    fn counterexample<S: ClauseSink>(frame: &Frame<'_>, aux: &mut AuxAllocator, sink: &mut S) {
        let conducting = path(None);
        cell_supports(frame, aux, sink, true, &conducting);
        positive_shape(frame, aux, sink, &conducting);

        let blocking = blocking_path(None);
        cell_supports(frame, aux, sink, false, &blocking);
        blocking_shape(frame, aux, sink, &blocking);

        // a model is an input where the lattice answers incorrectly
        implied_by_function(
            frame,
            sink,
            Antecedent::FunctionTrue,
            &right_column(frame, &blocking),
        );
        implied_by_function(
            frame,
            sink,
            Antecedent::FunctionFalse,
            &bottom_row(frame, &conducting),
        );
    }

    fn assignment<S: ClauseSink>(
        frame: &Frame<'_>,
        assignment: Assignment,
        tag: u32,
        aux: &mut AuxAllocator,
        sink: &mut S,
    ) {
        if frame.function.eval(assignment) {
            let conducting = path(Some(tag));
            cell_assignment(frame, assignment, sink, true, &conducting);
            positive_shape(frame, aux, sink, &conducting);
            sink.add_clause(&bottom_row(frame, &conducting));
        } else {
            let blocking = blocking_path(Some(tag));
            cell_assignment(frame, assignment, sink, false, &blocking);
            blocking_shape(frame, aux, sink, &blocking);
            sink.add_clause(&right_column(frame, &blocking));
        }
    }
}
