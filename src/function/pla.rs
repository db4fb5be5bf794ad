//! Reader for single-output functions in Berkeley PLA format.

use super::expr::{Expr, VarId};
use super::InputError;

fn error(line: usize, message: impl Into<String>) -> InputError {
    InputError::Pla {
        line,
        message: message.into(),
    }
}

/// Parses a PLA description into a sum of the cover rows whose output is 1.
///
/// Returns the expression together with the input variable names, taken
/// from `.ilb` when present and generated as `x0..` otherwise.
pub(crate) fn parse(text: &str) -> Result<(Expr, Vec<String>), InputError> {
    let mut num_inputs: Option<usize> = None;
    let mut names: Option<Vec<String>> = None;
    let mut products: Vec<Expr> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(directive) = line.strip_prefix('.') {
            let mut fields = directive.split_whitespace();
            let keyword = fields.next().unwrap_or("");
            match keyword {
                "i" => {
                    let value = fields
                        .next()
                        .and_then(|v| v.parse::<usize>().ok())
                        .ok_or_else(|| error(number, "invalid .i directive"))?;
                    num_inputs = Some(value);
                }
                "o" => {
                    let value = fields
                        .next()
                        .and_then(|v| v.parse::<usize>().ok())
                        .ok_or_else(|| error(number, "invalid .o directive"))?;
                    if value != 1 {
                        return Err(error(number, "only single-output functions are supported"));
                    }
                }
                "ilb" => names = Some(fields.map(str::to_string).collect()),
                "ob" | "p" | "type" => {}
                "e" | "end" => break,
                _ => return Err(error(number, format!("unknown directive .{}", keyword))),
            }
            continue;
        }

        let mut fields = line.split_whitespace();
        let inputs = fields
            .next()
            .ok_or_else(|| error(number, "missing input plane"))?;
        let outputs = fields
            .next()
            .ok_or_else(|| error(number, "missing output plane"))?;

        let expected = *num_inputs.get_or_insert(inputs.len());
        if inputs.len() != expected {
            return Err(error(
                number,
                format!("expected {} input columns, found {}", expected, inputs.len()),
            ));
        }
        if outputs.len() != 1 {
            return Err(error(number, "only single-output functions are supported"));
        }

        let mut literals = Vec::new();
        for (column, value) in inputs.chars().enumerate() {
            let var = VarId::new(column as u32);
            match value {
                '1' => literals.push(Expr::Lit(var, false)),
                '0' => literals.push(Expr::Lit(var, true)),
                '-' => {}
                other => {
                    return Err(error(number, format!("invalid input value '{}'", other)))
                }
            }
        }

        match outputs.chars().next().unwrap() {
            '1' => products.push(if literals.is_empty() {
                Expr::Const(true)
            } else {
                Expr::And(literals)
            }),
            '0' | '-' => {}
            other => return Err(error(number, format!("invalid output value '{}'", other))),
        }
    }

    let inputs = num_inputs.unwrap_or(0);
    let names = match names {
        Some(names) => {
            if names.len() != inputs {
                return Err(error(0, "mismatch between .ilb names and input columns"));
            }
            names
        }
        None => (0..inputs).map(|i| format!("x{}", i)).collect(),
    };

    let expr = match products.len() {
        0 => Expr::Const(false),
        1 => products.pop().unwrap(),
        _ => Expr::Or(products),
    };
    Ok((expr, names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_cover() {
        let text = "\
# two products
.i 3
.o 1
.ilb a b c
.ob f
11- 1
0-1 1
.e
";
        let (expr, names) = parse(text).unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(expr.eval(0b011));
        assert!(expr.eval(0b100));
        assert!(expr.eval(0b110));
        assert!(!expr.eval(0b101));
        assert!(!expr.eval(0b001));
    }

    #[test]
    fn rejects_multiple_outputs() {
        assert!(parse(".i 2\n.o 2\n11 10\n").is_err());
        assert!(parse(".i 2\n.o 1\n11 10\n").is_err());
    }

    #[test]
    fn zero_rows_yield_the_constant_zero() {
        let (expr, names) = parse(".i 2\n.o 1\n11 0\n.e\n").unwrap();
        assert_eq!(expr, Expr::Const(false));
        assert_eq!(names, vec!["x0", "x1"]);
    }
}
