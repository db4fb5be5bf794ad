//! Lattice validity through round-indexed reachability.
//!
//! Instead of constraining the shape of a path, each cell carries a switch
//! variable and per-round reachability variables: a cell is reachable in
//! round r if it was reachable before or an adjacent closed switch was.
//! The round bound covers every path the encoding needs to witness.

use super::{
    cell_assignment, cell_supports, implied_by_function, Antecedent, Encoding, Frame,
};
use crate::cnf::{imply, AuxAllocator, ClauseSink, Lit, VarName};
use crate::function::Assignment;

pub(crate) struct Reachability;

fn switch(tag: Option<u32>) -> impl Fn(u32, u32) -> VarName {
    move |i, j| VarName::Switch { i, j, tag }
}

fn blocking_switch(tag: Option<u32>) -> impl Fn(u32, u32) -> VarName {
    move |i, j| VarName::NegSwitch { i, j, tag }
}

fn reach(tag: Option<u32>) -> impl Fn(u32, u32, u32) -> VarName {
    move |i, j, round| VarName::Reach { i, j, round, tag }
}

fn blocking_reach(tag: Option<u32>) -> impl Fn(u32, u32, u32) -> VarName {
    move |i, j, round| VarName::NegReach { i, j, round, tag }
}

fn round_bound(frame: &Frame<'_>) -> u32 {
    frame.m * frame.n / 2
}

/// Reachability propagation from the entry border to the exit border.
fn reach_steps<S: ClauseSink>(
    frame: &Frame<'_>,
    aux: &mut AuxAllocator,
    sink: &mut S,
    conducting: bool,
    switch: &dyn Fn(u32, u32) -> VarName,
    reach: &dyn Fn(u32, u32, u32) -> VarName,
) {
    let (m, n) = (frame.m, frame.n);
    let bound = round_bound(frame);

    if m == 1 || n == 1 {
        // degenerate grids collapse to direct reachability at the bound
        for (i, j) in frame.cells() {
            sink.add_clause(&[Lit::neg(reach(i, j, bound)), Lit::pos(switch(i, j))]);
        }
        if conducting && n == 1 {
            for i in 1..m {
                sink.add_clause(&[
                    Lit::neg(reach(i + 1, 1, bound)),
                    Lit::pos(reach(i, 1, bound)),
                ]);
            }
        }
        if !conducting && m == 1 {
            for j in 1..n {
                sink.add_clause(&[
                    Lit::neg(reach(1, j + 1, bound)),
                    Lit::pos(reach(1, j, bound)),
                ]);
            }
        }
        return;
    }

    for (i, j) in frame.cells() {
        let source = if conducting { i == 1 } else { j == 1 };
        let start = reach(i, j, 0);
        sink.add_clause(&[if source {
            Lit::pos(start)
        } else {
            Lit::neg(start)
        }]);
    }

    for round in 1..=bound {
        for (i, j) in frame.cells() {
            let neighbours = if conducting {
                frame.adjacent4(i, j)
            } else {
                frame.adjacent8(i, j)
            };
            let mut origins = Vec::with_capacity(1 + neighbours.len());
            origins.push(Lit::pos(reach(i, j, round - 1)));
            for (r, c) in neighbours {
                let through = aux.fresh_lit();
                sink.add_clause(&[!through, Lit::pos(reach(r, c, round - 1))]);
                sink.add_clause(&[!through, Lit::pos(switch(r, c))]);
                origins.push(through);
            }
            imply(sink, Lit::pos(reach(i, j, round)), &origins);
        }
    }
}

/// One literal per exit cell asserting that its switch is closed and the
/// cell is reached at the round bound.
fn exit_lits<S: ClauseSink>(
    frame: &Frame<'_>,
    aux: &mut AuxAllocator,
    sink: &mut S,
    conducting: bool,
    switch: &dyn Fn(u32, u32) -> VarName,
    reach: &dyn Fn(u32, u32, u32) -> VarName,
) -> Vec<Lit> {
    let bound = round_bound(frame);
    let exits: Vec<(u32, u32)> = if conducting {
        (1..=frame.n).map(|j| (frame.m, j)).collect()
    } else {
        (1..=frame.m).map(|i| (i, frame.n)).collect()
    };
    exits
        .into_iter()
        .map(|(i, j)| {
            let exit = aux.fresh_lit();
            sink.add_clause(&[!exit, Lit::pos(switch(i, j))]);
            sink.add_clause(&[!exit, Lit::pos(reach(i, j, bound))]);
            exit
        })
        .collect()
}

impl Encoding for Reachability {
    fn universal<S: ClauseSink>(frame: &Frame<'_>, aux: &mut AuxAllocator, sink: &mut S) {
        let closed = switch(None);
        let reached = reach(None);
        cell_supports(frame, aux, sink, true, &closed);
        reach_steps(frame, aux, sink, true, &closed, &reached);
        let exits = exit_lits(frame, aux, sink, true, &closed, &reached);
        implied_by_function(frame, sink, Antecedent::FunctionTrue, &exits);

        let open = blocking_switch(None);
        let blocked = blocking_reach(None);
        cell_supports(frame, aux, sink, false, &open);
        reach_steps(frame, aux, sink, false, &open, &blocked);
        let exits = exit_lits(frame, aux, sink, false, &open, &blocked);
        implied_by_function(frame, sink, Antecedent::FunctionFalse, &exits);
    }

    fn counterexample<S: ClauseSink>(frame: &Frame<'_>, aux: &mut AuxAllocator, sink: &mut S) {
        let closed = switch(None);
        let reached = reach(None);
        cell_supports(frame, aux, sink, true, &closed);
        reach_steps(frame, aux, sink, true, &closed, &reached);

        let open = blocking_switch(None);
        let blocked = blocking_reach(None);
        cell_supports(frame, aux, sink, false, &open);
        reach_steps(frame, aux, sink, false, &open, &blocked);

        // a model is an input where the lattice answers incorrectly
        let exits = exit_lits(frame, aux, sink, false, &open, &blocked);
        implied_by_function(frame, sink, Antecedent::FunctionTrue, &exits);
        let exits = exit_lits(frame, aux, sink, true, &closed, &reached);
        implied_by_function(frame, sink, Antecedent::FunctionFalse, &exits);
    }

    fn assignment<S: ClauseSink>(
        frame: &Frame<'_>,
        assignment: Assignment,
        tag: u32,
        aux: &mut AuxAllocator,
        sink: &mut S,
    ) {
        if frame.function.eval(assignment) {
            let closed = switch(Some(tag));
            let reached = reach(Some(tag));
            cell_assignment(frame, assignment, sink, true, &closed);
            reach_steps(frame, aux, sink, true, &closed, &reached);
            let exits = exit_lits(frame, aux, sink, true, &closed, &reached);
            sink.add_clause(&exits);
        } else {
            let open = blocking_switch(Some(tag));
            let blocked = blocking_reach(Some(tag));
            cell_assignment(frame, assignment, sink, false, &open);
            reach_steps(frame, aux, sink, false, &open, &blocked);
            let exits = exit_lits(frame, aux, sink, false, &open, &blocked);
            sink.add_clause(&exits);
        }
    }
}
