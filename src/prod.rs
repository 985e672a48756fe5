use crate::error::{Error, Result};
use crate::FeedDict;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

pub(crate) const JOINT_SYMBOL: &str = "*";
const CONST_STRING: &str = "const";

/// A product of binary variables, used as the key of a polynomial term.
///
/// Binary variables are idempotent (`x = x^2 = x^3 ...`), so a product is a
/// set of labels. The empty set is the constant monomial. Labels are kept
/// sorted, which makes both the equality and the hash independent of the
/// order the factors were multiplied in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinaryProd {
	keys: BTreeSet<String>,
}

impl BinaryProd {
	pub fn new<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			keys: keys.into_iter().map(Into::into).collect(),
		}
	}

	#[inline]
	pub fn constant() -> Self {
		Self::default()
	}

	#[inline]
	pub fn is_constant(&self) -> bool {
		self.keys.is_empty()
	}

	/// Number of distinct variables in the product.
	#[inline]
	pub fn degree(&self) -> usize {
		self.keys.len()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.keys.iter().map(String::as_str)
	}

	#[inline]
	pub fn contains(&self, label: &str) -> bool {
		self.keys.contains(label)
	}

	pub fn merge(&self, other: &Self) -> Self {
		Self {
			keys: self.keys.union(&other.keys).cloned().collect(),
		}
	}

	/// Replaces the factors `a` and `b` by the single factor `product`.
	pub(crate) fn substitute(&self, a: &str, b: &str, product: &str) -> Self {
		let mut keys: BTreeSet<String> = self
			.keys
			.iter()
			.filter(|k| k.as_str() != a && k.as_str() != b)
			.cloned()
			.collect();
		keys.insert(product.to_owned());
		Self { keys }
	}

	/// Value of the product under the given variable values.
	pub fn calc_product(&self, values: &HashMap<String, f64>) -> Result<f64> {
		self.keys.iter().try_fold(1.0, |prod, key| {
			values
				.get(key)
				.map(|v| prod * v)
				.ok_or_else(|| Error::MissingVariable(key.clone()))
		})
	}
}

impl fmt::Display for BinaryProd {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_constant() {
			f.write_str(CONST_STRING)
		} else {
			let keys: Vec<&str> = self.keys().collect();
			f.write_str(&keys.join(JOINT_SYMBOL))
		}
	}
}

/// A product of placeholders with integer exponents, e.g. `a^2 * b`.
///
/// The empty product is the constant monomial.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamProd {
	keys: BTreeMap<String, u32>,
}

impl ParamProd {
	/// Builds a product from `(placeholder, exponent)` pairs. Zero exponents
	/// are dropped and repeated placeholders accumulate.
	pub fn new<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = (S, u32)>,
		S: Into<String>,
	{
		let mut ret = Self::constant();
		for (k, p) in keys {
			if p > 0 {
				*ret.keys.entry(k.into()).or_insert(0) += p;
			}
		}
		ret
	}

	#[inline]
	pub fn constant() -> Self {
		Self::default()
	}

	pub fn placeholder<S: Into<String>>(label: S) -> Self {
		Self::new(Some((label, 1)))
	}

	#[inline]
	pub fn is_constant(&self) -> bool {
		self.keys.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = (&str, u32)> {
		self.keys.iter().map(|(k, p)| (k.as_str(), *p))
	}

	pub fn merge(&self, other: &Self) -> Self {
		let mut keys = self.keys.clone();
		for (k, p) in other.keys.iter() {
			*keys.entry(k.clone()).or_insert(0) += p;
		}
		Self { keys }
	}

	pub fn calc_product(&self, feed_dict: &FeedDict) -> Result<f64> {
		self.keys.iter().try_fold(1.0, |prod, (key, p)| {
			feed_dict
				.get(key)
				.map(|v| prod * v.powi(*p as i32))
				.ok_or_else(|| Error::MissingPlaceholder(key.clone()))
		})
	}
}

impl fmt::Display for ParamProd {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_constant() {
			f.write_str(CONST_STRING)
		} else {
			let keys: Vec<String> = self.keys().map(|(k, p)| format!("{}^{}", k, p)).collect();
			f.write_str(&keys.join(JOINT_SYMBOL))
		}
	}
}
