use crate::error::{Error, Result};
use crate::wrapper::{PathKey, Vartype};
use std::collections::{BTreeMap, HashMap};
use std::ops::Index;

/// An assignment of values to the variables of a model, as returned by a
/// solver.
#[derive(Clone, Debug, PartialEq)]
pub enum Solution {
	/// Values aligned with `Model::variable_order`.
	List(Vec<f64>),
	Labels(HashMap<String, f64>),
	/// Values keyed by the position in `Model::variable_order`.
	Indices(HashMap<usize, f64>),
}

impl From<Vec<f64>> for Solution {
	fn from(v: Vec<f64>) -> Self {
		Solution::List(v)
	}
}

impl From<HashMap<String, f64>> for Solution {
	fn from(m: HashMap<String, f64>) -> Self {
		Solution::Labels(m)
	}
}

impl From<HashMap<usize, f64>> for Solution {
	fn from(m: HashMap<usize, f64>) -> Self {
		Solution::Indices(m)
	}
}

impl Solution {
	/// Converts the assignment into bits keyed by label.
	///
	/// Every variable in `order` must be assigned. A label-keyed solution
	/// may also assign the labels accepted by `extra`, e.g. cells of a
	/// structure the objective never touches.
	pub(crate) fn to_binary<F>(&self, order: &[String], vartype: Vartype, extra: F) -> Result<HashMap<String, f64>>
	where
		F: Fn(&str) -> bool,
	{
		let entries: Vec<(&str, f64)> = match self {
			Solution::List(values) => {
				if values.len() != order.len() {
					return Err(Error::SolutionLengthMismatch {
						expected: order.len(),
						got: values.len(),
					});
				}
				order.iter().map(String::as_str).zip(values.iter().copied()).collect()
			}
			Solution::Labels(map) => map
				.iter()
				.map(|(label, value)| {
					if order.binary_search(label).is_ok() || extra(label) {
						Ok((label.as_str(), *value))
					} else {
						Err(Error::UnknownVariableInSolution(label.clone()))
					}
				})
				.collect::<Result<_>>()?,
			Solution::Indices(map) => map
				.iter()
				.map(|(i, value)| {
					order
						.get(*i)
						.map(|label| (label.as_str(), *value))
						.ok_or_else(|| Error::UnknownVariableInSolution(i.to_string()))
				})
				.collect::<Result<_>>()?,
		};
		let bits: HashMap<String, f64> = entries
			.into_iter()
			.map(|(label, value)| {
				vartype
					.to_binary(value)
					.map(|bit| (label.to_owned(), bit))
					.ok_or_else(|| Error::InvalidSolutionType {
						label: label.to_owned(),
						value,
					})
			})
			.collect::<Result<_>>()?;
		let assigned = order.iter().filter(|l| bits.contains_key(*l)).count();
		if assigned != order.len() {
			return Err(Error::SolutionLengthMismatch {
				expected: order.len(),
				got: assigned,
			});
		}
		Ok(bits)
	}
}

/// Nested container a solution is decoded into, following the paths of
/// the model's structure.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
	Value(f64),
	Map(BTreeMap<PathKey, Decoded>),
}

impl Default for Decoded {
	fn default() -> Self {
		Decoded::Map(BTreeMap::new())
	}
}

impl Decoded {
	pub(crate) fn insert(&mut self, path: &[PathKey], value: f64) {
		match path.split_first() {
			None => *self = Decoded::Value(value),
			Some((head, rest)) => {
				if let Decoded::Value(_) = self {
					*self = Decoded::default();
				}
				if let Decoded::Map(m) = self {
					m.entry(head.clone()).or_default().insert(rest, value);
				}
			}
		}
	}

	pub fn get<K: Into<PathKey>>(&self, key: K) -> Option<&Decoded> {
		match self {
			Decoded::Map(m) => m.get(&key.into()),
			Decoded::Value(_) => None,
		}
	}

	pub fn get_path(&self, path: &[PathKey]) -> Option<&Decoded> {
		path.iter().try_fold(self, |d, k| d.get(k.clone()))
	}

	pub fn value(&self) -> Option<f64> {
		match self {
			Decoded::Value(v) => Some(*v),
			Decoded::Map(_) => None,
		}
	}
}

impl Index<&str> for Decoded {
	type Output = Decoded;

	fn index(&self, key: &str) -> &Self::Output {
		match self.get(key) {
			Some(d) => d,
			None => panic!("no entry {:?} in decoded solution", key),
		}
	}
}

impl Index<usize> for Decoded {
	type Output = Decoded;

	fn index(&self, key: usize) -> &Self::Output {
		match self.get(key) {
			Some(d) => d,
			None => panic!("no entry {} in decoded solution", key),
		}
	}
}

/// A named constraint whose penalty is positive under a solution.
#[derive(Clone, Debug, PartialEq)]
pub struct BrokenConstraint {
	/// Bits of the variables the constraint depends on.
	pub result: BTreeMap<String, f64>,
	pub penalty: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedSolution {
	pub solution: Decoded,
	pub broken: BTreeMap<String, BrokenConstraint>,
	pub energy: f64,
}

/// A solver sample with the energy the solver reported for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
	pub solution: Solution,
	pub energy: f64,
}

impl Sample {
	pub fn new<S: Into<Solution>>(solution: S, energy: f64) -> Self {
		Self {
			solution: solution.into(),
			energy,
		}
	}
}
