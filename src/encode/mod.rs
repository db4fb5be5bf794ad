//! Constraint generation for candidate lattices.
//!
//! The frame owns the variable algebra shared by all encodings: the cell
//! label variables, adjacency, the one-label-per-cell constraint and the
//! decoding of solver models back into lattices. The encoding submodules
//! contribute the path-validity constraints in three flavours each:
//! universal (symbolic inputs), per-assignment (unfolded), and the swapped
//! counterexample form used by the refinement loop.

pub(crate) mod irredundant;
pub(crate) mod reachability;

use crate::cnf::{
    cardinality, imply, AuxAllocator, CellLiteral, ClauseSink, LabelTarget, Lit, VarName,
};
use crate::function::{Assignment, Function};
use crate::lattice::{Cell, Lattice};
use crate::solver::ConstraintSolver;

/// A family of lattice-validity constraints.
pub(crate) trait Encoding {
    /// Constraints for symbolic inputs: the lattice must compute the
    /// function on every assignment.
    fn universal<S: ClauseSink>(frame: &Frame<'_>, aux: &mut AuxAllocator, sink: &mut S);

    /// Constraints for symbolic inputs with swapped terminals: a model is
    /// an input on which the candidate labelling computes the wrong value.
    fn counterexample<S: ClauseSink>(frame: &Frame<'_>, aux: &mut AuxAllocator, sink: &mut S);

    /// Constraints specialised to a single input assignment, with fresh
    /// variable families selected by the tag.
    fn assignment<S: ClauseSink>(
        frame: &Frame<'_>,
        assignment: Assignment,
        tag: u32,
        aux: &mut AuxAllocator,
        sink: &mut S,
    );
}

/// The lattice-variable algebra for one candidate size.
pub(crate) struct Frame<'f> {
    pub(crate) function: &'f Function,
    pub(crate) m: u32,
    pub(crate) n: u32,
}

/// The lattice cell a label variable stands for.
pub(crate) fn cell_from_label(literal: CellLiteral) -> Cell {
    match literal.target {
        LabelTarget::Constant => Cell::Const(!literal.negated),
        LabelTarget::Input(var) => Cell::Literal {
            var,
            negated: literal.negated,
        },
    }
}

fn target_lit(target: LabelTarget) -> Lit {
    Lit::pos(match target {
        LabelTarget::Input(var) => VarName::Input(var),
        LabelTarget::Constant => VarName::Constant,
    })
}

/// The truth value of a label under a fixed input assignment.
fn literal_value(literal: CellLiteral, assignment: Assignment) -> bool {
    let target = match literal.target {
        LabelTarget::Input(var) => assignment.value(var),
        LabelTarget::Constant => true,
    };
    target != literal.negated
}

impl<'f> Frame<'f> {
    pub(crate) fn new(function: &'f Function, m: usize, n: usize) -> Self {
        assert!(m >= 1, "lattice height must be at least 1");
        assert!(n >= 1, "lattice width must be at least 1");
        Self {
            function,
            m: m as u32,
            n: n as u32,
        }
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let n = self.n;
        (1..=self.m).flat_map(move |i| (1..=n).map(move |j| (i, j)))
    }

    /// The input variables together with the distinguished constant.
    fn targets(&self) -> Vec<LabelTarget> {
        let mut targets: Vec<LabelTarget> =
            self.function.variables().map(LabelTarget::Input).collect();
        targets.push(LabelTarget::Constant);
        targets
    }

    /// Every candidate label, positive and negated.
    fn cell_literals(&self) -> Vec<CellLiteral> {
        let mut literals = Vec::new();
        for target in self.targets() {
            literals.push(CellLiteral {
                target,
                negated: false,
            });
            literals.push(CellLiteral {
                target,
                negated: true,
            });
        }
        literals
    }

    pub(crate) fn label(&self, i: u32, j: u32, literal: CellLiteral) -> VarName {
        debug_assert!(1 <= i && i <= self.m);
        debug_assert!(1 <= j && j <= self.n);
        VarName::Label { i, j, literal }
    }

    /// All label variables in a stable order.
    pub(crate) fn label_vars(&self) -> Vec<VarName> {
        let literals = self.cell_literals();
        self.cells()
            .flat_map(|(i, j)| literals.iter().map(move |&l| self.label(i, j, l)))
            .collect()
    }

    pub(crate) fn input_vars(&self) -> Vec<VarName> {
        self.function.variables().map(VarName::Input).collect()
    }

    /// 4-connected orthogonal neighbours, clipped to the grid.
    pub(crate) fn adjacent4(&self, i: u32, j: u32) -> Vec<(u32, u32)> {
        let mut neighbours = Vec::with_capacity(4);
        if i > 1 {
            neighbours.push((i - 1, j));
        }
        if j > 1 {
            neighbours.push((i, j - 1));
        }
        if j < self.n {
            neighbours.push((i, j + 1));
        }
        if i < self.m {
            neighbours.push((i + 1, j));
        }
        neighbours
    }

    /// 8-connected king-move neighbours, clipped to the grid.
    pub(crate) fn adjacent8(&self, i: u32, j: u32) -> Vec<(u32, u32)> {
        let mut neighbours = Vec::with_capacity(8);
        for row in i.saturating_sub(1)..=(i + 1).min(self.m) {
            for column in j.saturating_sub(1)..=(j + 1).min(self.n) {
                if row >= 1 && column >= 1 && (row, column) != (i, j) {
                    neighbours.push((row, column));
                }
            }
        }
        neighbours
    }

    /// The constraints every encoding shares: the constant variable is
    /// set, and each cell carries exactly one label.
    pub(crate) fn emit_base<S: ClauseSink>(&self, aux: &mut AuxAllocator, sink: &mut S) {
        sink.add_clause(&[Lit::pos(VarName::Constant)]);
        let literals = self.cell_literals();
        for (i, j) in self.cells() {
            let labels: Vec<Lit> = literals
                .iter()
                .map(|&l| Lit::pos(self.label(i, j, l)))
                .collect();
            cardinality::equals(sink, aux, &labels, 1, None);
        }
    }

    /// Reads the labelling out of the solver model.
    ///
    /// Cells whose label variables are all absent from the model (which
    /// can happen with partial certificates) stay permanent opens.
    pub(crate) fn decode<S: ConstraintSolver>(&self, solver: &S) -> Lattice {
        let mut lattice = Lattice::filled(
            self.m as usize,
            self.n as usize,
            self.function.names().to_vec(),
        );
        for (i, j) in self.cells() {
            for literal in self.cell_literals() {
                if solver.value(&self.label(i, j, literal)) == Some(true) {
                    lattice.set(i as usize - 1, j as usize - 1, cell_from_label(literal));
                }
            }
        }
        lattice
    }

    /// The full labelling of the current model as assumption literals.
    pub(crate) fn label_assumptions<S: ConstraintSolver>(&self, solver: &S) -> Vec<Lit> {
        self.label_vars()
            .into_iter()
            .map(|var| {
                if solver.value(&var) == Some(true) {
                    Lit::pos(var)
                } else {
                    Lit::neg(var)
                }
            })
            .collect()
    }

    /// The input assignment of the current model.
    pub(crate) fn model_assignment<S: ConstraintSolver>(&self, solver: &S) -> Assignment {
        let mut mask = 0u64;
        for var in self.function.variables() {
            if solver.value(&VarName::Input(var)) == Some(true) {
                mask |= 1 << var.index();
            }
        }
        Assignment::new(mask)
    }
}

/// Ties a per-cell variable family to the cell labels under symbolic
/// inputs: the cell variable implies that some label of the wanted
/// polarity is placed and evaluates accordingly.
fn cell_supports<S: ClauseSink>(
    frame: &Frame<'_>,
    aux: &mut AuxAllocator,
    sink: &mut S,
    polarity: bool,
    cell_var: &dyn Fn(u32, u32) -> VarName,
) {
    let targets = frame.targets();
    for (i, j) in frame.cells() {
        let mut supports = Vec::with_capacity(targets.len());
        for &target in &targets {
            let chosen = aux.fresh_lit();
            let positive = Lit::pos(frame.label(
                i,
                j,
                CellLiteral {
                    target,
                    negated: false,
                },
            ));
            let negative = Lit::pos(frame.label(
                i,
                j,
                CellLiteral {
                    target,
                    negated: true,
                },
            ));
            let input = target_lit(target);
            // chosen => (positive & input) | (negative & !input), with the
            // input side flipped for the blocking polarity
            sink.add_clause(&[!chosen, positive, negative]);
            if polarity {
                sink.add_clause(&[!chosen, positive, !input]);
                sink.add_clause(&[!chosen, input, negative]);
            } else {
                sink.add_clause(&[!chosen, positive, input]);
                sink.add_clause(&[!chosen, !input, negative]);
            }
            supports.push(chosen);
        }
        imply(sink, Lit::pos(cell_var(i, j)), &supports);
    }
}

/// Ties a per-cell variable family to the cell labels under a fixed
/// assignment: the cell variable implies one of the labels evaluating to
/// the wanted value.
fn cell_assignment<S: ClauseSink>(
    frame: &Frame<'_>,
    assignment: Assignment,
    sink: &mut S,
    value: bool,
    cell_var: &dyn Fn(u32, u32) -> VarName,
) {
    for (i, j) in frame.cells() {
        let labels: Vec<Lit> = frame
            .cell_literals()
            .into_iter()
            .filter(|&l| literal_value(l, assignment) == value)
            .map(|l| Lit::pos(frame.label(i, j, l)))
            .collect();
        debug_assert!(!labels.is_empty(), "every cell has labels of both values");
        imply(sink, Lit::pos(cell_var(i, j)), &labels);
    }
}

/// Antecedent of a terminal constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Antecedent {
    /// The consequent holds unconditionally.
    Always,
    /// The consequent holds whenever the function is true.
    FunctionTrue,
    /// The consequent holds whenever the function is false.
    FunctionFalse,
}

/// Emits `antecedent => (c_1 | ... | c_k)` as CNF.
///
/// The function antecedents expand linearly: !f is a clause per product of
/// the cover with negated literals, and f is a clause per product of the
/// dual cover with its literals kept.
fn implied_by_function<S: ClauseSink>(
    frame: &Frame<'_>,
    sink: &mut S,
    antecedent: Antecedent,
    consequent: &[Lit],
) {
    match antecedent {
        Antecedent::Always => sink.add_clause(consequent),
        Antecedent::FunctionTrue => {
            for product in frame.function.products() {
                let mut clause: Vec<Lit> = product
                    .literals()
                    .map(|(var, negated)| Lit {
                        var: VarName::Input(var),
                        negated: !negated,
                    })
                    .collect();
                clause.extend_from_slice(consequent);
                sink.add_clause(&clause);
            }
        }
        Antecedent::FunctionFalse => {
            for product in frame.function.dual_products() {
                let mut clause: Vec<Lit> = product
                    .literals()
                    .map(|(var, negated)| Lit {
                        var: VarName::Input(var),
                        negated,
                    })
                    .collect();
                clause.extend_from_slice(consequent);
                sink.add_clause(&clause);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{ConstraintSolver as _, VarisatSolver};
    use crate::timing::Timer;

    #[test]
    fn labels_round_trip_into_cells() {
        let function = Function::parse("(a & b) | c").unwrap();
        let frame = Frame::new(&function, 2, 3);
        for (i, j) in frame.cells() {
            for literal in frame.cell_literals() {
                match frame.label(i, j, literal) {
                    VarName::Label {
                        i: pi,
                        j: pj,
                        literal: parsed,
                    } => {
                        assert_eq!((pi, pj), (i, j));
                        assert_eq!(cell_from_label(parsed), cell_from_label(literal));
                    }
                    other => panic!("unexpected variable {:?}", other),
                }
            }
        }
    }

    #[test]
    fn adjacency_is_clipped_to_the_grid() {
        let function = Function::parse("a & b").unwrap();
        let frame = Frame::new(&function, 3, 3);
        assert_eq!(frame.adjacent4(1, 1), vec![(1, 2), (2, 1)]);
        assert_eq!(
            frame.adjacent4(2, 2),
            vec![(1, 2), (2, 1), (2, 3), (3, 2)]
        );
        assert_eq!(frame.adjacent8(1, 1), vec![(1, 2), (2, 1), (2, 2)]);
        assert_eq!(frame.adjacent8(2, 2).len(), 8);
        assert_eq!(frame.adjacent8(3, 3), vec![(2, 2), (2, 3), (3, 2)]);
    }

    #[test]
    fn base_constraints_pick_one_label_per_cell() {
        let function = Function::parse("a & b").unwrap();
        let frame = Frame::new(&function, 2, 2);
        let mut aux = AuxAllocator::new();
        let mut solver = VarisatSolver::new();
        frame.emit_base(&mut aux, &mut solver);

        let mut timer = Timer::new();
        assert!(solver.solve(&[], &mut timer).unwrap());
        for (i, j) in frame.cells() {
            let chosen = frame
                .cell_literals()
                .into_iter()
                .filter(|&l| solver.value(&frame.label(i, j, l)) == Some(true))
                .count();
            assert_eq!(chosen, 1);
        }
        // the decoded grid reproduces exactly the labels of the model
        let lattice = frame.decode(&solver);
        for (i, j) in frame.cells() {
            let cell = lattice.get(i as usize - 1, j as usize - 1);
            let matching = frame
                .cell_literals()
                .into_iter()
                .find(|&l| solver.value(&frame.label(i, j, l)) == Some(true))
                .unwrap();
            assert_eq!(cell, cell_from_label(matching));
        }
    }
}
