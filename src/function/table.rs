//! Truth tables and irredundant sum-of-products covers.

use fixedbitset::FixedBitSet;

use super::expr::VarId;

/// Truth table of a Boolean function over a fixed number of variables.
///
/// Position `mask` holds the function value under the assignment where
/// variable v is true iff bit v of `mask` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TruthTable {
    bits: FixedBitSet,
    vars: usize,
}

impl TruthTable {
    pub(crate) fn zeros(vars: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(1 << vars),
            vars,
        }
    }

    pub(crate) fn len(&self) -> usize {
        1 << self.vars
    }

    pub(crate) fn get(&self, mask: u64) -> bool {
        self.bits.contains(mask as usize)
    }

    pub(crate) fn set(&mut self, mask: u64, value: bool) {
        self.bits.set(mask as usize, value);
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.bits.count_ones(..) == 0
    }

    pub(crate) fn is_one(&self) -> bool {
        self.bits.count_ones(..) == self.len()
    }

    pub(crate) fn complement(&self) -> Self {
        let mut result = self.clone();
        result.bits.toggle_range(..);
        result
    }

    pub(crate) fn and(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.bits.intersect_with(&other.bits);
        result
    }

    pub(crate) fn or(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.bits.union_with(&other.bits);
        result
    }

    /// Restricts the given variable to a fixed value; the result no longer
    /// depends on it.
    pub(crate) fn cofactor(&self, var: VarId, value: bool) -> Self {
        let bit = 1u64 << var.index();
        let mut result = Self::zeros(self.vars);
        for mask in 0..self.len() as u64 {
            let source = if value { mask | bit } else { mask & !bit };
            result.set(mask, self.get(source));
        }
        result
    }

    pub(crate) fn depends_on(&self, var: VarId) -> bool {
        self.cofactor(var, false) != self.cofactor(var, true)
    }

    /// The dual function: dual(x) = !f(!x).
    pub(crate) fn dual(&self) -> Self {
        let full = (self.len() - 1) as u64;
        let mut result = Self::zeros(self.vars);
        for mask in 0..self.len() as u64 {
            result.set(mask, !self.get(mask ^ full));
        }
        result
    }
}

/// A product of literals as positive/negative variable masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cube {
    pos: u64,
    neg: u64,
}

impl Cube {
    /// The empty product, the constant 1.
    pub(crate) fn one() -> Self {
        Self { pos: 0, neg: 0 }
    }

    pub(crate) fn with_literal(mut self, var: VarId, negated: bool) -> Self {
        if negated {
            self.neg |= 1 << var.index();
        } else {
            self.pos |= 1 << var.index();
        }
        self
    }

    pub(crate) fn len(&self) -> usize {
        (self.pos.count_ones() + self.neg.count_ones()) as usize
    }

    /// Literals of the product in variable order.
    pub(crate) fn literals(&self) -> impl Iterator<Item = (VarId, bool)> + '_ {
        let cube = *self;
        (0..64u32).filter_map(move |v| {
            if cube.pos & (1 << v) != 0 {
                Some((VarId::new(v), false))
            } else if cube.neg & (1 << v) != 0 {
                Some((VarId::new(v), true))
            } else {
                None
            }
        })
    }

    pub(crate) fn contains(&self, var: VarId, negated: bool) -> bool {
        let bit = 1u64 << var.index();
        if negated {
            self.neg & bit != 0
        } else {
            self.pos & bit != 0
        }
    }

    pub(crate) fn eval(&self, mask: u64) -> bool {
        mask & self.pos == self.pos && mask & self.neg == 0
    }

    pub(crate) fn table(&self, vars: usize) -> TruthTable {
        let mut result = TruthTable::zeros(vars);
        for mask in 0..result.len() as u64 {
            result.set(mask, self.eval(mask));
        }
        result
    }
}

/// The function covered by a set of cubes.
pub(crate) fn cover_table(cubes: &[Cube], vars: usize) -> TruthTable {
    let mut result = TruthTable::zeros(vars);
    for cube in cubes {
        result = result.or(&cube.table(vars));
    }
    result
}

/// Computes an irredundant sum-of-products cover of the given function
/// with the Minato-Morreale interval algorithm.
pub(crate) fn isop(table: &TruthTable) -> Vec<Cube> {
    isop_interval(table, table)
}

/// An irredundant cover C with lower <= C <= upper.
fn isop_interval(lower: &TruthTable, upper: &TruthTable) -> Vec<Cube> {
    if lower.is_zero() {
        return Vec::new();
    }
    if upper.is_one() {
        return vec![Cube::one()];
    }

    let var = (0..lower.len().trailing_zeros())
        .map(|v| VarId::new(v))
        .find(|&v| lower.depends_on(v) || upper.depends_on(v))
        .expect("non-constant interval must depend on a variable");

    let lower0 = lower.cofactor(var, false);
    let lower1 = lower.cofactor(var, true);
    let upper0 = upper.cofactor(var, false);
    let upper1 = upper.cofactor(var, true);

    let cover0 = isop_interval(&lower0.and(&upper1.complement()), &upper0);
    let cover1 = isop_interval(&lower1.and(&upper0.complement()), &upper1);

    let vars = lower.len().trailing_zeros() as usize;
    let covered0 = cover_table(&cover0, vars);
    let covered1 = cover_table(&cover1, vars);
    let remainder = lower0
        .and(&covered0.complement())
        .or(&lower1.and(&covered1.complement()));
    let cover_star = isop_interval(&remainder, &upper0.and(&upper1));

    let mut result = Vec::with_capacity(cover0.len() + cover1.len() + cover_star.len());
    result.extend(cover0.into_iter().map(|c| c.with_literal(var, true)));
    result.extend(cover1.into_iter().map(|c| c.with_literal(var, false)));
    result.extend(cover_star);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::expr::parse;

    fn table_of(text: &str) -> TruthTable {
        let (expr, names) = parse(text).unwrap();
        let mut table = TruthTable::zeros(names.len());
        for mask in 0..table.len() as u64 {
            table.set(mask, expr.eval(mask));
        }
        table
    }

    #[test]
    fn isop_covers_its_function() {
        for text in &[
            "a",
            "a & b",
            "a | b",
            "(a & b) | (c & d)",
            "(a & ~b) | (~a & b)",
            "(a | b) & (c | d)",
            "(a & b) | (b & c) | (a & c)",
        ] {
            let table = table_of(text);
            let cover = isop(&table);
            assert_eq!(cover_table(&cover, table.len().trailing_zeros() as usize), table);
        }
    }

    #[test]
    fn isop_is_irredundant() {
        for text in &["(a & b) | (c & d)", "(a & ~b) | (~a & b)", "a | (b & c)"] {
            let table = table_of(text);
            let vars = table.len().trailing_zeros() as usize;
            let cover = isop(&table);
            for skip in 0..cover.len() {
                let rest: Vec<Cube> = cover
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, c)| *c)
                    .collect();
                assert_ne!(cover_table(&rest, vars), table);
            }
        }
    }

    #[test]
    fn dual_is_an_involution() {
        for text in &["a & b", "(a & b) | (c & d)", "(a & ~b) | (~a & b)"] {
            let table = table_of(text);
            assert_eq!(table.dual().dual(), table);
        }
    }

    #[test]
    fn dual_of_conjunction_is_disjunction() {
        let conjunction = table_of("a & b");
        let disjunction = table_of("a | b");
        assert_eq!(conjunction.dual(), disjunction);
    }

    #[test]
    fn dual_of_xor_is_xnor() {
        let xor = table_of("(a & ~b) | (~a & b)");
        let xnor = table_of("(a & b) | (~a & ~b)");
        assert_eq!(xor.dual(), xnor);
    }
}
