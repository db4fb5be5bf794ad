//! Reference lattice from the dual-product construction.
//!
//! The grid has one row per product of the dual cover and one column per
//! product of the function cover; each cell is labelled with a literal
//! the two products share. This gives a (generally non-minimal) valid
//! lattice whose dimensions bound the search.

use crate::function::Function;
use crate::lattice::{Cell, Lattice};

/// Builds the dual-product lattice, or None when some product pair
/// shares no literal.
pub(crate) fn dual_product(function: &Function) -> Option<Lattice> {
    let rows = function.dual_products();
    let columns = function.products();
    if rows.is_empty() || columns.is_empty() {
        return None;
    }

    let mut lattice = Lattice::filled(rows.len(), columns.len(), function.names().to_vec());
    for (i, row) in rows.iter().enumerate() {
        for (j, column) in columns.iter().enumerate() {
            let (var, negated) = row
                .literals()
                .find(|&(var, negated)| column.contains(var, negated))?;
            lattice.set(i, j, Cell::Literal { var, negated });
        }
    }
    Some(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_is_valid_for_small_functions() {
        for text in &[
            "a",
            "a & b",
            "a | b",
            "(a & b) | (c & d)",
            "(a & ~b) | (~a & b)",
            "(a & b) | (b & c) | (a & c)",
            "a & (b | c)",
        ] {
            let function = Function::parse(text).unwrap();
            let lattice = dual_product(&function).expect("construction exists");
            let (rows, columns) = function.naive_lattice_bounds();
            assert_eq!((lattice.height(), lattice.width()), (rows, columns));
            assert!(lattice.equivalent(&function), "invalid lattice for {}", text);
        }
    }

    #[test]
    fn conjunction_becomes_a_column() {
        let function = Function::parse("a & b").unwrap();
        let lattice = dual_product(&function).unwrap();
        assert_eq!((lattice.height(), lattice.width()), (2, 1));
    }
}
