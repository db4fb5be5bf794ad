//! Switching lattices: rectangular grids of labelled cells and their
//! evaluation under the two-path semantics.

use std::fmt;

use fixedbitset::FixedBitSet;

use crate::function::{Assignment, Function, VarId};

/// The label of a single lattice cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// A permanent short (constant true) or open (constant false).
    Const(bool),
    /// An input literal.
    Literal { var: VarId, negated: bool },
}

impl Cell {
    /// The truth value of the cell label under the given assignment.
    pub fn eval(self, assignment: Assignment) -> bool {
        match self {
            Cell::Const(value) => value,
            Cell::Literal { var, negated } => assignment.value(var) != negated,
        }
    }
}

/// A labelled m x n switching lattice.
///
/// The lattice computes a function f iff for every input assignment a
/// top-to-bottom 4-connected path through true cells exists exactly when
/// f is 1, and a left-to-right 8-connected path through false cells
/// exists exactly when f is 0.
#[derive(Debug, Clone)]
pub struct Lattice {
    height: usize,
    width: usize,
    cells: Vec<Cell>,
    names: Vec<String>,
}

impl Lattice {
    /// Creates a lattice with every cell labelled as a permanent open.
    pub fn filled(height: usize, width: usize, names: Vec<String>) -> Self {
        Self {
            height,
            width,
            cells: vec![Cell::Const(false); height * width],
            names,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn area(&self) -> usize {
        self.height * self.width
    }

    pub fn get(&self, row: usize, column: usize) -> Cell {
        self.cells[row * self.width + column]
    }

    pub fn set(&mut self, row: usize, column: usize, cell: Cell) {
        self.cells[row * self.width + column] = cell;
    }

    fn active_cells(&self, assignment: Assignment, polarity: bool) -> FixedBitSet {
        let mut active = FixedBitSet::with_capacity(self.cells.len());
        for (index, cell) in self.cells.iter().enumerate() {
            active.set(index, cell.eval(assignment) == polarity);
        }
        active
    }

    fn path_exists(
        &self,
        active: &FixedBitSet,
        sources: impl Iterator<Item = usize>,
        is_target: impl Fn(usize) -> bool,
        king_moves: bool,
    ) -> bool {
        let mut visited = FixedBitSet::with_capacity(self.cells.len());
        let mut stack: Vec<usize> = sources.filter(|&index| active.contains(index)).collect();
        for &index in &stack {
            visited.insert(index);
        }

        while let Some(index) = stack.pop() {
            if is_target(index) {
                return true;
            }
            let row = (index / self.width) as isize;
            let column = (index % self.width) as isize;
            for dr in -1..=1isize {
                for dc in -1..=1isize {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    if !king_moves && dr != 0 && dc != 0 {
                        continue;
                    }
                    let (r, c) = (row + dr, column + dc);
                    if r < 0 || c < 0 || r >= self.height as isize || c >= self.width as isize {
                        continue;
                    }
                    let next = r as usize * self.width + c as usize;
                    if active.contains(next) && !visited.contains(next) {
                        visited.insert(next);
                        stack.push(next);
                    }
                }
            }
        }
        false
    }

    /// Whether a top-to-bottom 4-connected path of true cells exists.
    pub fn top_bottom_path(&self, assignment: Assignment) -> bool {
        let active = self.active_cells(assignment, true);
        let width = self.width;
        let height = self.height;
        self.path_exists(
            &active,
            0..width,
            |index| index / width == height - 1,
            false,
        )
    }

    /// Whether a left-to-right 8-connected path of false cells exists.
    pub fn left_right_path(&self, assignment: Assignment) -> bool {
        let active = self.active_cells(assignment, false);
        let width = self.width;
        self.path_exists(
            &active,
            (0..self.height).map(|row| row * width),
            |index| index % width == width - 1,
            true,
        )
    }

    /// Whether the lattice computes the given function on every input.
    pub fn equivalent(&self, function: &Function) -> bool {
        function.assignments().all(|assignment| {
            let value = function.eval(assignment);
            self.top_bottom_path(assignment) == value
                && self.left_right_path(assignment) == !value
        })
    }

    fn cell_name(&self, cell: Cell) -> String {
        match cell {
            Cell::Const(true) => "1".to_string(),
            Cell::Const(false) => "0".to_string(),
            Cell::Literal { var, negated } => {
                let name = &self.names[var.index()];
                if negated {
                    format!("~{}", name)
                } else {
                    name.clone()
                }
            }
        }
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = (0..self.width)
            .map(|column| {
                (0..self.height)
                    .map(|row| self.cell_name(self.get(row, column)).len())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        for row in 0..self.height {
            for column in 0..self.width {
                if column > 0 {
                    write!(f, " ")?;
                }
                write!(
                    f,
                    "{:width$}",
                    self.cell_name(self.get(row, column)),
                    width = widths[column]
                )?;
            }
            if row + 1 < self.height {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_lattice() -> (Function, Lattice) {
        let function = Function::parse("(a & ~b) | (~a & b)").unwrap();
        let vars: Vec<_> = function.variables().collect();
        let mut lattice = Lattice::filled(2, 2, function.names().to_vec());
        lattice.set(0, 0, Cell::Literal { var: vars[0], negated: false });
        lattice.set(0, 1, Cell::Literal { var: vars[0], negated: true });
        lattice.set(1, 0, Cell::Literal { var: vars[1], negated: true });
        lattice.set(1, 1, Cell::Literal { var: vars[1], negated: false });
        (function, lattice)
    }

    #[test]
    fn xor_lattice_is_equivalent() {
        let (function, lattice) = xor_lattice();
        assert!(lattice.equivalent(&function));
    }

    #[test]
    fn perturbed_xor_lattice_is_not_equivalent() {
        let (function, mut lattice) = xor_lattice();
        let var = function.variables().nth(1).unwrap();
        lattice.set(1, 0, Cell::Literal { var, negated: false });
        assert!(!lattice.equivalent(&function));
    }

    #[test]
    fn single_row_computes_a_disjunction() {
        let function = Function::parse("a | b").unwrap();
        let vars: Vec<_> = function.variables().collect();
        let mut lattice = Lattice::filled(1, 2, function.names().to_vec());
        lattice.set(0, 0, Cell::Literal { var: vars[0], negated: false });
        lattice.set(0, 1, Cell::Literal { var: vars[1], negated: false });
        assert!(lattice.equivalent(&function));
    }

    #[test]
    fn single_column_computes_a_conjunction() {
        let function = Function::parse("a & b").unwrap();
        let vars: Vec<_> = function.variables().collect();
        let mut lattice = Lattice::filled(2, 1, function.names().to_vec());
        lattice.set(0, 0, Cell::Literal { var: vars[0], negated: false });
        lattice.set(1, 0, Cell::Literal { var: vars[1], negated: false });
        assert!(lattice.equivalent(&function));
    }

    #[test]
    fn display_uses_tilde_for_negation() {
        let (_, lattice) = xor_lattice();
        assert_eq!(format!("{}", lattice), "a  ~a\n~b b ");
    }
}
