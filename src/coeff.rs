use crate::error::{Error, Result};
use crate::prod::ParamProd;
use crate::FeedDict;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg};

/// A QUBO coefficient written as a polynomial over placeholders,
/// `sum(value * prod(placeholder ^ exponent))`.
///
/// The numeric value is only known once the placeholders are fed, see
/// [`Coefficient::evaluate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coefficient {
	terms: BTreeMap<ParamProd, f64>,
}

impl Coefficient {
	pub fn new<I>(terms: I) -> Self
	where
		I: IntoIterator<Item = (ParamProd, f64)>,
	{
		let mut ret = Self::default();
		for (k, v) in terms {
			ret.add_term(k, v);
		}
		ret
	}

	pub fn placeholder<S: Into<String>>(label: S) -> Self {
		Self::new(Some((ParamProd::placeholder(label), 1.0)))
	}

	pub fn terms(&self) -> impl Iterator<Item = (&ParamProd, f64)> {
		self.terms.iter().map(|(k, v)| (k, *v))
	}

	/// True when no term depends on a placeholder.
	pub fn is_constant(&self) -> bool {
		self.terms.keys().all(ParamProd::is_constant)
	}

	fn add_term(&mut self, key: ParamProd, value: f64) {
		*self.terms.entry(key).or_insert(0.0) += value;
	}

	fn scale(mut self, f: f64) -> Self {
		self.terms.values_mut().for_each(|v| *v *= f);
		self
	}

	pub fn evaluate(&self, feed_dict: &FeedDict) -> Result<f64> {
		if feed_dict.is_empty() && !self.is_constant() {
			return Err(Error::EmptyFeedDict);
		}
		self.terms
			.iter()
			.try_fold(0.0, |sum, (prod, value)| Ok(sum + value * prod.calc_product(feed_dict)?))
	}
}

impl AddAssign<&Coefficient> for Coefficient {
	fn add_assign(&mut self, other: &Coefficient) {
		for (k, v) in other.terms.iter() {
			self.add_term(k.clone(), *v);
		}
	}
}

impl Mul<&Coefficient> for &Coefficient {
	type Output = Coefficient;
	fn mul(self, other: &Coefficient) -> Coefficient {
		let mut ret = Coefficient::default();
		for (k1, v1) in self.terms.iter() {
			for (k2, v2) in other.terms.iter() {
				ret.add_term(k1.merge(k2), v1 * v2);
			}
		}
		ret
	}
}

impl From<f64> for Coefficient {
	fn from(f: f64) -> Self {
		Self::new(Some((ParamProd::constant(), f)))
	}
}

impl fmt::Display for Coefficient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let terms: Vec<String> = self
			.terms()
			.map(|(k, v)| format!("{}*{}", v, k))
			.collect();
		write!(f, "Coefficient({})", terms.join(" + "))
	}
}

/// Value of a polynomial or QUBO entry: a plain number, or a coefficient
/// that still depends on placeholders.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Number(f64),
	Param(Coefficient),
}

impl Value {
	pub fn placeholder<S: Into<String>>(label: S) -> Self {
		Value::Param(Coefficient::placeholder(label))
	}

	pub fn get_number(&self) -> Option<f64> {
		match self {
			Value::Number(n) => Some(*n),
			Value::Param(_) => None,
		}
	}

	pub fn evaluate(&self, feed_dict: &FeedDict) -> Result<f64> {
		match self {
			Value::Number(n) => Ok(*n),
			Value::Param(c) => c.evaluate(feed_dict),
		}
	}

	fn into_coefficient(self) -> Coefficient {
		match self {
			Value::Number(n) => Coefficient::from(n),
			Value::Param(c) => c,
		}
	}
}

impl Default for Value {
	fn default() -> Self {
		Value::Number(0.0)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Number(f)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Value::Number(i as f64)
	}
}

impl From<Coefficient> for Value {
	fn from(c: Coefficient) -> Self {
		Value::Param(c)
	}
}

impl AddAssign<&Value> for Value {
	fn add_assign(&mut self, other: &Value) {
		match (self, other) {
			(Value::Number(a), Value::Number(b)) => *a += b,
			(this, other) => {
				let mut c = std::mem::take(this).into_coefficient();
				match other {
					Value::Number(b) => c += &Coefficient::from(*b),
					Value::Param(b) => c += b,
				}
				*this = Value::Param(c);
			}
		}
	}
}

impl Add<&Value> for Value {
	type Output = Value;
	fn add(mut self, other: &Value) -> Value {
		self += other;
		self
	}
}

impl Mul<&Value> for &Value {
	type Output = Value;
	fn mul(self, other: &Value) -> Value {
		match (self, other) {
			(Value::Number(a), Value::Number(b)) => Value::Number(a * b),
			(Value::Param(c), Value::Number(n)) | (Value::Number(n), Value::Param(c)) => {
				Value::Param(c.clone().scale(*n))
			}
			(Value::Param(a), Value::Param(b)) => Value::Param(a * b),
		}
	}
}

impl Mul<f64> for Value {
	type Output = Value;
	fn mul(self, f: f64) -> Value {
		match self {
			Value::Number(n) => Value::Number(n * f),
			o => Value::Param(o.into_coefficient().scale(f)),
		}
	}
}

impl Neg for Value {
	type Output = Value;
	fn neg(self) -> Value {
		self * -1.0
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Number(n) => write!(f, "{:?}", n),
			Value::Param(c) => write!(f, "{}", c),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn feed(items: &[(&str, f64)]) -> FeedDict {
		items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
	}

	#[test]
	fn coefficient_evaluate() {
		let coeff = Coefficient::new(vec![
			(ParamProd::new(vec![("a", 1), ("b", 1)]), 2.0),
			(ParamProd::constant(), 2.0),
		]);
		assert_eq!(coeff.evaluate(&feed(&[("a", 2.0), ("b", 3.0)])), Ok(14.0));
	}

	#[test]
	fn coefficient_errors() {
		let coeff = Coefficient::new(vec![
			(ParamProd::new(vec![("a", 1), ("b", 1)]), 2.0),
			(ParamProd::constant(), 2.0),
		]);
		assert_eq!(coeff.evaluate(&FeedDict::new()), Err(Error::EmptyFeedDict));
		assert_eq!(
			coeff.evaluate(&feed(&[("a", 1.0)])),
			Err(Error::MissingPlaceholder("b".into()))
		);
		// a constant coefficient needs no placeholder values at all
		assert_eq!(Coefficient::from(3.0).evaluate(&FeedDict::new()), Ok(3.0));
	}

	#[test]
	fn first_missing_placeholder_is_stable() {
		for _ in 0..50 {
			let coeff = Coefficient::new(vec![
				(ParamProd::placeholder("q"), 1.0),
				(ParamProd::placeholder("p"), 1.0),
			]);
			assert_eq!(
				coeff.evaluate(&feed(&[("z", 1.0)])),
				Err(Error::MissingPlaceholder("p".into()))
			);
		}
	}

	#[test]
	fn value_arithmetic() {
		let w = Value::placeholder("w");
		let two = Value::Number(2.0);
		let v = &(&w * &two) * &w + &Value::Number(1.0);
		assert_eq!(v.evaluate(&feed(&[("w", 3.0)])), Ok(19.0));
		assert_eq!((&two * &two).get_number(), Some(4.0));
		assert_eq!((-w).evaluate(&feed(&[("w", 3.0)])), Ok(-3.0));
	}
}
