//! Boolean functions with their irredundant covers and lattice bounds.

mod expr;
mod pla;
mod table;

use std::fmt;

pub use expr::{Expr, ParseError, VarId};
pub(crate) use table::{isop, Cube, TruthTable};

/// Maximum supported number of input variables.
///
/// The minimiser and the unfolded encodings enumerate the full input
/// domain, so the support size bounds everything downstream.
pub const MAX_INPUTS: usize = 24;

/// An error which can be returned when building a function from its
/// textual description.
#[derive(Debug)]
pub enum InputError {
    /// The expression could not be parsed.
    Expr(ParseError),
    /// The PLA description could not be parsed.
    Pla { line: usize, message: String },
    /// The function simplifies to a constant and has no useful support.
    ConstantFunction,
    /// The support exceeds [`MAX_INPUTS`].
    TooManyInputs(usize),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Expr(e) => write!(f, "invalid expression: {}", e),
            InputError::Pla { line, message } => {
                write!(f, "invalid PLA input (line {}): {}", line, message)
            }
            InputError::ConstantFunction => {
                write!(f, "function is constant and has no support")
            }
            InputError::TooManyInputs(n) => {
                write!(f, "function has {} inputs, at most {} are supported", n, MAX_INPUTS)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Expr(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for InputError {
    fn from(error: ParseError) -> Self {
        InputError::Expr(error)
    }
}

/// A complete assignment to the inputs of a function, encoded as a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    mask: u64,
}

impl Assignment {
    pub fn new(mask: u64) -> Self {
        Self { mask }
    }

    pub fn mask(self) -> u64 {
        self.mask
    }

    pub fn value(self, var: VarId) -> bool {
        self.mask & (1 << var.index()) != 0
    }
}

/// A Boolean function together with the derived data the synthesis needs:
/// its truth table, the irredundant cover of the function and the
/// irredundant cover of its dual.
#[derive(Debug)]
pub struct Function {
    path: String,
    text: String,
    names: Vec<String>,
    table: TruthTable,
    cover: Vec<Cube>,
    dual_cover: Vec<Cube>,
}

impl Function {
    /// Builds a function from an expression string.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let (expr, names) = expr::parse(text)?;
        Self::build(String::new(), text.to_string(), expr, names)
    }

    /// Builds a function from the contents of a PLA file.
    pub fn parse_pla(text: &str, path: &str) -> Result<Self, InputError> {
        let (expr, names) = pla::parse(text)?;
        Self::build(path.to_string(), String::new(), expr, names)
    }

    fn build(
        path: String,
        text: String,
        expr: Expr,
        names: Vec<String>,
    ) -> Result<Self, InputError> {
        if names.len() > MAX_INPUTS {
            return Err(InputError::TooManyInputs(names.len()));
        }

        let mut table = TruthTable::zeros(names.len());
        for mask in 0..table.len() as u64 {
            table.set(mask, expr.eval(mask));
        }
        if names.is_empty() || table.is_zero() || table.is_one() {
            return Err(InputError::ConstantFunction);
        }

        let cover = isop(&table);
        let dual_cover = isop(&table.dual());
        Ok(Self {
            path,
            text,
            names,
            table,
            cover,
            dual_cover,
        })
    }

    /// The path of the PLA file this function was read from, if any.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The source of the function: the PLA path or the expression text.
    pub fn source(&self) -> &str {
        if self.path.is_empty() {
            &self.text
        } else {
            &self.path
        }
    }

    /// Number of input variables.
    pub fn inputs(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn variables(&self) -> impl Iterator<Item = VarId> {
        (0..self.names.len() as u32).map(VarId::new)
    }

    pub fn eval(&self, assignment: Assignment) -> bool {
        self.table.get(assignment.mask())
    }

    /// Iterates over the full input domain.
    pub fn assignments(&self) -> impl Iterator<Item = Assignment> {
        (0..1u64 << self.names.len()).map(Assignment::new)
    }

    pub(crate) fn products(&self) -> &[Cube] {
        &self.cover
    }

    pub(crate) fn dual_products(&self) -> &[Cube] {
        &self.dual_cover
    }

    /// Upper bound on the lattice dimensions: the dual-product
    /// construction uses one row per dual product and one column per
    /// function product.
    pub fn naive_lattice_bounds(&self) -> (usize, usize) {
        (self.dual_cover.len(), self.cover.len())
    }

    /// Upper bound on the lattice area.
    pub fn upper_bound(&self) -> usize {
        let (rows, columns) = self.naive_lattice_bounds();
        rows * columns
    }

    /// Smallest area m * n within the upper bound for which the degree
    /// inequality system admits a lattice, defaulting to 1.
    pub fn lower_bound(&self) -> usize {
        let degree = self.cover.iter().map(Cube::len).max().unwrap_or(0);
        let dual_degree = self.dual_cover.iter().map(Cube::len).max().unwrap_or(0);
        let area = self.upper_bound();

        let mut best: Option<usize> = None;
        for m in 1..=area {
            for n in 1..=area / m {
                if satisfies_degree_bounds(degree, dual_degree, m, n) {
                    let candidate = m * n;
                    if best.map_or(true, |b| candidate < b) {
                        best = Some(candidate);
                    }
                }
            }
        }
        best.unwrap_or(1)
    }
}

fn ceil_div(a: usize, b: usize) -> i64 {
    ((a + b - 1) / b) as i64
}

fn parity_sign(x: usize) -> i64 {
    if x % 2 == 0 {
        1
    } else {
        -1
    }
}

/// Whether an m x n lattice can accommodate the maximum product sizes of
/// the function and its dual.
fn satisfies_degree_bounds(degree: usize, dual_degree: usize, m: usize, n: usize) -> bool {
    let shared = (2 + parity_sign(m) + parity_sign(n)) / 2;

    let degree_bound = if m <= 2 || n <= 1 {
        m as i64
    } else {
        3 * ceil_div(m - 2, 2) * ceil_div(n, 2) + shared
    };
    let dual_degree_bound = if m <= 3 || n <= 2 {
        n as i64
    } else {
        2 * ceil_div(n - 2, 2) * ceil_div(m, 2) + shared
    };

    degree as i64 <= degree_bound && dual_degree as i64 <= dual_degree_bound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_constants_and_empty_support() {
        assert!(matches!(
            Function::parse("1"),
            Err(InputError::ConstantFunction)
        ));
        assert!(matches!(
            Function::parse("a & ~a"),
            Err(InputError::ConstantFunction)
        ));
    }

    #[test]
    fn bounds_of_simple_functions() {
        let single = Function::parse("a").unwrap();
        assert_eq!(single.naive_lattice_bounds(), (1, 1));
        assert_eq!(single.lower_bound(), 1);

        let conjunction = Function::parse("a & b").unwrap();
        assert_eq!(conjunction.naive_lattice_bounds(), (2, 1));

        let disjunction = Function::parse("a | b").unwrap();
        assert_eq!(disjunction.naive_lattice_bounds(), (1, 2));
    }

    #[test]
    fn xor_needs_area_four() {
        let xor = Function::parse("(a & ~b) | (~a & b)").unwrap();
        assert_eq!(xor.naive_lattice_bounds(), (2, 2));
        assert_eq!(xor.lower_bound(), 4);
    }

    #[test]
    fn two_products_need_area_four() {
        let f = Function::parse("(a & b) | (c & d)").unwrap();
        assert_eq!(f.naive_lattice_bounds(), (4, 2));
        assert_eq!(f.lower_bound(), 4);
    }

    #[test]
    fn evaluation_matches_the_expression() {
        let f = Function::parse("(a & b) | (c & d)").unwrap();
        assert!(f.eval(Assignment::new(0b0011)));
        assert!(f.eval(Assignment::new(0b1100)));
        assert!(!f.eval(Assignment::new(0b1001)));
        assert_eq!(f.assignments().count(), 16);
    }
}
