use crate::coeff::Value;
use crate::error::Result;
use crate::expanded::{Constraints, Polynomial};
use crate::prod::{BinaryProd, JOINT_SYMBOL};
use crate::FeedDict;
use log::trace;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Label of the auxiliary variable standing for a product. The factors are
/// split on `*` and sorted, so the label only depends on the set of
/// original variables the auxiliary represents.
pub(crate) fn normalize_label(label: &str) -> String {
	let mut keys: Vec<&str> = label.split(JOINT_SYMBOL).collect();
	keys.sort_unstable();
	keys.join(JOINT_SYMBOL)
}

/// Penalty which is 0 iff `product = multiplier * multiplicand`, and at
/// least `strength` otherwise.
fn binary_product(multiplier: &str, multiplicand: &str, product: &str, strength: &Value) -> Polynomial {
	vec![
		(BinaryProd::new(vec![product]), strength.clone() * 3.0),
		(BinaryProd::new(vec![multiplicand, product]), strength.clone() * -2.0),
		(BinaryProd::new(vec![multiplier, product]), strength.clone() * -2.0),
		(BinaryProd::new(vec![multiplier, multiplicand]), strength.clone()),
	]
	.into_iter()
	.collect()
}

/// Pair of variables occurring together in the most terms of degree > 2.
/// Ties go to the smallest pair.
fn find_most_common(polynomial: &Polynomial) -> Option<((String, String), usize)> {
	let mut counter: BTreeMap<(&str, &str), usize> = BTreeMap::new();
	for (prod, _) in polynomial.iter().filter(|(prod, _)| prod.degree() > 2) {
		let keys: Vec<&str> = prod.keys().collect();
		for i in 0..keys.len() {
			for j in i + 1..keys.len() {
				*counter.entry((keys[i], keys[j])).or_insert(0) += 1;
			}
		}
	}
	counter
		.into_iter()
		.fold(None, |best, (pair, count)| match best {
			Some((_, c)) if c >= count => best,
			_ => Some((pair, count)),
		})
		.map(|((a, b), count)| ((a.to_owned(), b.to_owned()), count))
}

/// Reduces `polynomial` to degree <= 2.
///
/// While a term of degree > 2 remains, the most common pair `(a, b)` is
/// replaced by an auxiliary variable `p` in every term containing both,
/// and the penalty `strength * (3p - 2ap - 2bp + ab)` is added. Each
/// penalty is also returned as the constraint `AND(a,b)=p`.
pub(crate) fn reduce_order(mut polynomial: Polynomial, strength: &Value) -> (Polynomial, Constraints) {
	let mut products = Constraints::new();
	while polynomial.degree() > 2 {
		let ((a, b), count) = match find_most_common(&polynomial) {
			Some(found) => found,
			None => break,
		};
		let product = normalize_label(&[a.as_str(), b.as_str()].join(JOINT_SYMBOL));
		trace!("reducing {} and {} into {} ({} terms)", a, b, product, count);
		polynomial = polynomial
			.into_iter()
			.map(|(prod, value)| {
				if prod.contains(&a) && prod.contains(&b) {
					(prod.substitute(&a, &b, &product), value)
				} else {
					(prod, value)
				}
			})
			.collect();
		let penalty = binary_product(&a, &b, &product, strength);
		polynomial += penalty.clone();
		products.insert(format!("AND({},{})={}", a, b, product), penalty);
	}
	(polynomial, products)
}

/// Quadratic form of a compiled expression whose entries may still depend
/// on placeholders.
///
/// Keys are label pairs `(i, j)` with `i <= j`; `(i, i)` holds the linear
/// term of `i`. Every variable has a diagonal entry.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQubo {
	qubo: BTreeMap<(String, String), Value>,
	offset: Value,
}

impl CompiledQubo {
	pub fn new(qubo: BTreeMap<(String, String), Value>, offset: Value) -> Self {
		Self { qubo, offset }
	}

	/// Builds the QUBO of a polynomial of degree <= 2.
	pub(crate) fn from_polynomial(polynomial: Polynomial) -> Self {
		let mut qubo: BTreeMap<(String, String), Value> = BTreeMap::new();
		let mut offset = Value::Number(0.0);
		for (prod, value) in polynomial {
			let keys: Vec<&str> = prod.keys().collect();
			let key = match keys.as_slice() {
				[] => {
					offset += &value;
					continue;
				}
				[a] => (a.to_string(), a.to_string()),
				[a, b] => (a.to_string(), b.to_string()),
				_ => unreachable!("term {} is above degree 2", prod),
			};
			match qubo.get_mut(&key) {
				Some(v) => *v += &value,
				None => {
					qubo.insert(key, value);
				}
			}
		}
		let labels: BTreeSet<String> = qubo
			.keys()
			.flat_map(|(i, j)| vec![i.clone(), j.clone()])
			.collect();
		for label in labels {
			qubo.entry((label.clone(), label))
				.or_insert(Value::Number(0.0));
		}
		Self { qubo, offset }
	}

	pub fn qubo(&self) -> &BTreeMap<(String, String), Value> {
		&self.qubo
	}

	pub fn offset(&self) -> &Value {
		&self.offset
	}

	pub fn len(&self) -> usize {
		self.qubo.len()
	}

	pub fn is_empty(&self) -> bool {
		self.qubo.is_empty()
	}

	/// Sorted labels of all variables.
	pub fn variables(&self) -> Vec<&str> {
		self.qubo
			.keys()
			.filter(|(i, j)| i == j)
			.map(|(i, _)| i.as_str())
			.collect()
	}

	/// Numeric QUBO and offset for the given placeholder values.
	pub fn evaluate(&self, feed_dict: &FeedDict) -> Result<(BTreeMap<(String, String), f64>, f64)> {
		let qubo = self
			.qubo
			.iter()
			.map(|(k, v)| Ok((k.clone(), v.evaluate(feed_dict)?)))
			.collect::<Result<_>>()?;
		Ok((qubo, self.offset.evaluate(feed_dict)?))
	}
}

impl fmt::Display for CompiledQubo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let entries: Vec<String> = self
			.qubo
			.iter()
			.map(|((i, j), v)| format!("({}, {}): {}", i, j, v))
			.collect();
		write!(f, "CompiledQubo({{{}}}, offset={})", entries.join(", "), self.offset)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::Expr;

	fn number(qubo: &CompiledQubo, i: &str, j: &str) -> Option<f64> {
		qubo.qubo()
			.get(&(i.to_owned(), j.to_owned()))
			.and_then(Value::get_number)
	}

	#[test]
	fn normalize() {
		assert_eq!(normalize_label("b*a"), "a*b");
		assert_eq!(normalize_label("c*a*b"), "a*b*c");
		assert_eq!(normalize_label("x"), "x");
	}

	#[test]
	fn reduce_most_common_pair() {
		let (a, b, c, d) = (
			Expr::binary("a"),
			Expr::binary("b"),
			Expr::binary("c"),
			Expr::binary("d"),
		);
		let (poly, _) = (a * b.clone() * c.clone() + b * c * d).expand();
		let (reduced, products) = reduce_order(poly, &Value::Number(5.0));
		assert_eq!(reduced.degree(), 2);
		assert_eq!(products.len(), 1);
		assert!(products.contains_key("AND(b,c)=b*c"));

		let qubo = CompiledQubo::from_polynomial(reduced);
		let expected = vec![
			(("a", "a"), 0.0),
			(("a", "b*c"), 1.0),
			(("b", "b"), 0.0),
			(("b", "b*c"), -10.0),
			(("b", "c"), 5.0),
			(("b*c", "b*c"), 15.0),
			(("b*c", "c"), -10.0),
			(("b*c", "d"), 1.0),
			(("c", "c"), 0.0),
			(("d", "d"), 0.0),
		];
		assert_eq!(qubo.len(), expected.len());
		for ((i, j), v) in expected {
			assert_eq!(number(&qubo, i, j), Some(v), "entry ({}, {})", i, j);
		}
		assert_eq!(qubo.offset(), &Value::Number(0.0));
		assert_eq!(qubo.variables(), vec!["a", "b", "b*c", "c", "d"]);
	}

	#[test]
	fn reduce_reuses_auxiliary() {
		let x: Vec<Expr> = (0..4).map(|i| Expr::binary(format!("x{}", i))).collect();
		let e = x[0].clone() * x[1].clone() * x[2].clone() + x[0].clone() * x[1].clone() * x[3].clone();
		let (poly, _) = e.expand();
		let (reduced, products) = reduce_order(poly, &Value::Number(5.0));
		assert_eq!(products.len(), 1);
		assert_eq!(
			reduced.get(&BinaryProd::new(vec!["x0*x1"])),
			Some(&Value::Number(15.0))
		);
		assert!(reduced.get(&BinaryProd::new(vec!["x0*x1", "x2"])).is_some());
		assert!(reduced.get(&BinaryProd::new(vec!["x0*x1", "x3"])).is_some());
	}

	#[test]
	fn reduce_fourth_order() {
		let e: Expr = Expr::binary("a") * Expr::binary("b") * Expr::binary("c") * Expr::binary("d");
		let (poly, _) = e.expand();
		let (reduced, products) = reduce_order(poly, &Value::Number(5.0));
		assert!(reduced.degree() <= 2);
		assert_eq!(products.len(), 2);
		assert!(products.contains_key("AND(a,b)=a*b"));
		assert!(products.contains_key("AND(a*b,c)=a*b*c"));
		assert!(reduced.get(&BinaryProd::new(vec!["a*b*c", "d"])).is_some());
	}

	#[test]
	fn symbolic_strength() {
		let e = Expr::binary("a") * Expr::binary("b") * Expr::binary("c");
		let (poly, _) = e.expand();
		let (reduced, _) = reduce_order(poly, &Value::placeholder("s"));
		let qubo = CompiledQubo::from_polynomial(reduced);
		let feed: FeedDict = Some(("s".to_owned(), 2.0)).into_iter().collect();
		let (q, offset) = qubo.evaluate(&feed).unwrap();
		assert_eq!(q[&("a*b".to_owned(), "a*b".to_owned())], 6.0);
		assert_eq!(q[&("a".to_owned(), "b".to_owned())], 2.0);
		assert_eq!(offset, 0.0);
		assert_eq!(
			qubo.evaluate(&FeedDict::new()),
			Err(crate::Error::EmptyFeedDict)
		);
	}

	#[test]
	fn display() {
		let qubo = (Expr::binary("a") * Expr::binary("b") + 1).compile();
		assert_eq!(
			qubo.compiled_qubo().to_string(),
			"CompiledQubo({(a, a): 0.0, (a, b): 1.0, (b, b): 0.0}, offset=1.0)"
		);
	}
}
