//! Boolean gadgets over binary expressions.
//!
//! The plain gadgets return an expression whose value is the boolean
//! function of its inputs. The `*_const` gadgets return a named constraint
//! which is 0 iff the inputs satisfy the relation, and positive otherwise.

use crate::expr::Expr;

/// `1 - a`
pub fn not(a: Expr) -> Expr {
	Expr::user_defined("Not", 1 - a)
}

/// `a * b`
pub fn and(a: Expr, b: Expr) -> Expr {
	Expr::user_defined("And", a * b)
}

/// `not(and(not(a), not(b)))`
pub fn or(a: Expr, b: Expr) -> Expr {
	Expr::user_defined("Or", not(and(not(a), not(b))))
}

/// `a + b - 2ab`
pub fn xor(a: Expr, b: Expr) -> Expr {
	Expr::user_defined("Xor", a.clone() + b.clone() - a * b * 2)
}

/// Constraint `a != b`.
pub fn not_const<S: Into<String>>(a: Expr, b: Expr, label: S) -> Expr {
	Expr::constraint(a.clone() * b.clone() * 2 - a - b + 1, label)
}

/// Constraint `c = a and b`.
pub fn and_const<S: Into<String>>(a: Expr, b: Expr, c: Expr, label: S) -> Expr {
	Expr::constraint(
		a.clone() * b.clone() - (a + b) * c.clone() * 2 + c * 3,
		label,
	)
}

/// Constraint `c = a or b`.
pub fn or_const<S: Into<String>>(a: Expr, b: Expr, c: Expr, label: S) -> Expr {
	Expr::constraint(
		a.clone() * b.clone() + (a + b) * (1 - c.clone() * 2) + c,
		label,
	)
}

/// Constraint `c = a xor b`.
///
/// Needs the auxiliary binary variable `aux_<label>`; the constraint is 0
/// for one of its values iff the relation holds.
pub fn xor_const<S: Into<String>>(a: Expr, b: Expr, c: Expr, label: S) -> Expr {
	let label = label.into();
	let aux = Expr::binary(format!("aux_{}", label));
	let sum = a.clone() + b.clone();
	Expr::constraint(
		a * b * 2 - sum.clone() * c.clone() * 2 - sum.clone() * aux.clone() * 4
			+ aux.clone() * c.clone() * 4
			+ sum + c + aux * 4,
		label,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::FeedDict;
	use std::collections::HashMap;

	fn eval(e: &Expr, values: &[(&str, bool)]) -> f64 {
		let bits: HashMap<String, bool> = values.iter().map(|(k, v)| (k.to_string(), *v)).collect();
		e.calculate(&bits, &FeedDict::new()).unwrap()
	}

	const BOOLS: [bool; 2] = [false, true];

	#[test]
	fn gates() {
		let (a, b) = (Expr::binary("a"), Expr::binary("b"));
		let gates: Vec<(Expr, fn(bool, bool) -> bool)> = vec![
			(and(a.clone(), b.clone()), |x, y| x && y),
			(or(a.clone(), b.clone()), |x, y| x || y),
			(xor(a.clone(), b.clone()), |x, y| x != y),
			(not(a.clone()), |x, _| !x),
		];
		for (gate, f) in gates.iter() {
			for &x in BOOLS.iter() {
				for &y in BOOLS.iter() {
					let expected = if f(x, y) { 1.0 } else { 0.0 };
					assert_eq!(eval(gate, &[("a", x), ("b", y)]), expected, "{}", gate);
				}
			}
		}
	}

	#[test]
	fn not_constraint() {
		let c = not_const(Expr::binary("a"), Expr::binary("b"), "not");
		assert_eq!(eval(&c, &[("a", true), ("b", false)]), 0.0);
		assert_eq!(eval(&c, &[("a", false), ("b", true)]), 0.0);
		assert!(eval(&c, &[("a", true), ("b", true)]) > 0.0);
		assert!(eval(&c, &[("a", false), ("b", false)]) > 0.0);
	}

	#[test]
	fn three_input_constraints() {
		let (a, b, c) = (Expr::binary("a"), Expr::binary("b"), Expr::binary("c"));
		let cases: Vec<(Expr, fn(bool, bool) -> bool)> = vec![
			(and_const(a.clone(), b.clone(), c.clone(), "and"), |x, y| x && y),
			(or_const(a.clone(), b.clone(), c.clone(), "or"), |x, y| x || y),
		];
		for (constraint, f) in cases.iter() {
			for &x in BOOLS.iter() {
				for &y in BOOLS.iter() {
					for &z in BOOLS.iter() {
						let e = eval(constraint, &[("a", x), ("b", y), ("c", z)]);
						if f(x, y) == z {
							assert_eq!(e, 0.0);
						} else {
							assert!(e > 0.0);
						}
					}
				}
			}
		}
	}

	#[test]
	fn xor_constraint() {
		let (a, b, c) = (Expr::binary("a"), Expr::binary("b"), Expr::binary("c"));
		let constraint = xor_const(a, b, c, "xor");
		for &x in BOOLS.iter() {
			for &y in BOOLS.iter() {
				for &z in BOOLS.iter() {
					let min = BOOLS
						.iter()
						.map(|&aux| eval(&constraint, &[("a", x), ("b", y), ("c", z), ("aux_xor", aux)]))
						.fold(f64::INFINITY, f64::min);
					if (x != y) == z {
						assert_eq!(min, 0.0);
					} else {
						assert!(min > 0.0);
					}
				}
			}
		}
	}
}
