use crate::coeff::Value;
use crate::error::Result;
use crate::expr::Expr;
use crate::prod::BinaryProd;
use crate::FeedDict;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::iter::FromIterator;
use std::ops::{AddAssign, Mul};

/// A multilinear polynomial over binary variables, keyed by monomial.
///
/// Terms are ordered, so sums over them round the same way every time.
///
/// Terms whose coefficient cancels to zero are kept, so every monomial that
/// was produced during expansion stays visible in the compiled model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polynomial {
	terms: BTreeMap<BinaryProd, Value>,
}

/// Polynomials of the named constraints, by label.
pub type Constraints = BTreeMap<String, Polynomial>;

impl Polynomial {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn constant<V: Into<Value>>(value: V) -> Self {
		Self::from_term(BinaryProd::constant(), value)
	}

	pub fn from_term<V: Into<Value>>(key: BinaryProd, value: V) -> Self {
		let mut ret = Self::new();
		ret.add_term(key, value.into());
		ret
	}

	/// Adds `value` to the coefficient of `key`.
	pub fn add_term(&mut self, key: BinaryProd, value: Value) {
		match self.terms.get_mut(&key) {
			Some(v) => *v += &value,
			None => {
				self.terms.insert(key, value);
			}
		}
	}

	pub fn get(&self, key: &BinaryProd) -> Option<&Value> {
		self.terms.get(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&BinaryProd, &Value)> {
		self.terms.iter()
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.terms.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	/// Highest degree among the monomials.
	pub fn degree(&self) -> usize {
		self.terms.keys().map(BinaryProd::degree).max().unwrap_or(0)
	}

	pub fn variables(&self) -> BTreeSet<&str> {
		self.terms.keys().flat_map(|k| k.keys()).collect()
	}

	/// Value of the polynomial for the given bits.
	pub fn energy(&self, bits: &HashMap<String, f64>, feed_dict: &FeedDict) -> Result<f64> {
		self.terms.iter().try_fold(0.0, |sum, (prod, value)| {
			Ok(sum + prod.calc_product(bits)? * value.evaluate(feed_dict)?)
		})
	}
}

impl AddAssign<Polynomial> for Polynomial {
	fn add_assign(&mut self, other: Polynomial) {
		if self.terms.len() < other.terms.len() {
			let small = std::mem::replace(self, other);
			*self += small;
		} else {
			for (k, v) in other.terms {
				self.add_term(k, v);
			}
		}
	}
}

impl Mul<&Polynomial> for &Polynomial {
	type Output = Polynomial;
	fn mul(self, other: &Polynomial) -> Polynomial {
		let mut ret = Polynomial::new();
		for (k1, v1) in self.terms.iter() {
			for (k2, v2) in other.terms.iter() {
				ret.add_term(k1.merge(k2), v1 * v2);
			}
		}
		ret
	}
}

impl FromIterator<(BinaryProd, Value)> for Polynomial {
	fn from_iter<I: IntoIterator<Item = (BinaryProd, Value)>>(iter: I) -> Self {
		let mut ret = Self::new();
		for (k, v) in iter {
			ret.add_term(k, v);
		}
		ret
	}
}

impl IntoIterator for Polynomial {
	type Item = (BinaryProd, Value);
	type IntoIter = std::collections::btree_map::IntoIter<BinaryProd, Value>;
	fn into_iter(self) -> Self::IntoIter {
		self.terms.into_iter()
	}
}

/// Walks an expression tree and folds it into a [`Polynomial`].
///
/// The named constraints met on the way are collected into an accumulator
/// owned by the caller.
pub(crate) struct Expander {
	parallel_threshold: usize,
}

impl Expander {
	pub(crate) fn new(parallel_threshold: usize) -> Self {
		Self { parallel_threshold }
	}

	pub(crate) fn expand(&self, expr: &Expr) -> (Polynomial, Constraints) {
		let mut constraints = Constraints::new();
		let polynomial = self.expand_into(expr, &mut constraints);
		(polynomial, constraints)
	}

	fn expand_into(&self, expr: &Expr, constraints: &mut Constraints) -> Polynomial {
		match expr {
			Expr::Num(n) => Polynomial::constant(*n),
			Expr::Binary(v) => Polynomial::from_term(BinaryProd::new(Some(v.label())), 1.0),
			// spin = 2 * binary - 1
			Expr::Spin(v) => {
				let mut ret = Polynomial::from_term(BinaryProd::new(Some(v.label())), 2.0);
				ret.add_term(BinaryProd::constant(), Value::Number(-1.0));
				ret
			}
			Expr::Placeholder(p) => Polynomial::constant(Value::placeholder(p.as_str())),
			Expr::Add(terms) if terms.len() >= self.parallel_threshold => {
				// collect keeps the term order, so merging is identical to the
				// sequential fold
				let parts: Vec<(Polynomial, Constraints)> =
					terms.par_iter().map(|e| self.expand(e)).collect();
				let mut ret = Polynomial::new();
				for (polynomial, inner) in parts {
					ret += polynomial;
					constraints.extend(inner);
				}
				ret
			}
			Expr::Add(terms) => terms.iter().fold(Polynomial::new(), |mut ret, e| {
				ret += self.expand_into(e, constraints);
				ret
			}),
			Expr::Mul(lhs, rhs) => {
				let lhs = self.expand_into(lhs, constraints);
				let rhs = self.expand_into(rhs, constraints);
				&lhs * &rhs
			}
			Expr::Constraint { label, expr } => {
				let ret = self.expand_into(expr, constraints);
				constraints.insert(label.clone(), ret.clone());
				ret
			}
			Expr::UserDefined { expr, .. } => self.expand_into(expr, constraints),
			Expr::WithPenalty {
				label,
				expr,
				penalty,
			} => {
				let mut ret = self.expand_into(expr, constraints);
				let penalty = self.expand_into(penalty, constraints);
				constraints.insert(label.clone(), penalty.clone());
				ret += penalty;
				ret
			}
		}
	}
}
