use crate::compiled::CompiledQubo;
use crate::error::{Error, Result};
use crate::expanded::Constraints;
use crate::solution::{BrokenConstraint, Decoded, DecodedSolution, Sample, Solution};
use crate::wrapper::{Structure, Vartype};
use crate::FeedDict;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Constraint energies within this distance of 0 are rounding noise.
const CONSTRAINT_TOLERANCE: f64 = 1.0e-9;

/// Linear terms, quadratic terms and offset of an Ising model.
pub type Ising<K> = (HashMap<K, f64>, HashMap<(K, K), f64>, f64);

/// A compiled expression, ready to be exported to a solver and to decode
/// the solver's answers.
#[derive(Clone, Debug)]
pub struct Model {
	compiled_qubo: CompiledQubo,
	variable_order: Vec<String>,
	label2index: HashMap<String, usize>,
	structure: Structure,
	constraints: Constraints,
}

impl Model {
	pub(crate) fn new(compiled_qubo: CompiledQubo, structure: Structure, constraints: Constraints) -> Self {
		let variable_order: Vec<String> = compiled_qubo
			.variables()
			.into_iter()
			.map(str::to_owned)
			.collect();
		let label2index = variable_order
			.iter()
			.enumerate()
			.map(|(i, l)| (l.clone(), i))
			.collect();
		Self {
			compiled_qubo,
			variable_order,
			label2index,
			structure,
			constraints,
		}
	}

	/// Sorted labels of the variables of the QUBO, auxiliary variables
	/// included. The position of a label is its index.
	pub fn variable_order(&self) -> &[String] {
		&self.variable_order
	}

	pub fn index_of(&self, label: &str) -> Option<usize> {
		self.label2index.get(label).copied()
	}

	pub fn compiled_qubo(&self) -> &CompiledQubo {
		&self.compiled_qubo
	}

	pub fn structure(&self) -> &Structure {
		&self.structure
	}

	/// Named constraints and the AND constraints of the auxiliary variables.
	pub fn constraints(&self) -> &Constraints {
		&self.constraints
	}

	/// QUBO keyed by label pairs `(i, j)` with `i <= j`, and its offset.
	pub fn to_qubo(&self, feed_dict: &FeedDict) -> Result<(HashMap<(String, String), f64>, f64)> {
		let (qubo, offset) = self.compiled_qubo.evaluate(feed_dict)?;
		Ok((qubo.into_iter().collect(), offset))
	}

	/// QUBO keyed by index pairs `(i, j)` with `i <= j`, and its offset.
	pub fn to_qubo_index(&self, feed_dict: &FeedDict) -> Result<(HashMap<(usize, usize), f64>, f64)> {
		let (qubo, offset) = self.compiled_qubo.evaluate(feed_dict)?;
		Ok((
			qubo.into_iter()
				.map(|((i, j), v)| ((self.label2index[&i], self.label2index[&j]), v))
				.collect(),
			offset,
		))
	}

	pub fn to_ising(&self, feed_dict: &FeedDict) -> Result<Ising<String>> {
		let (qubo, offset) = self.compiled_qubo.evaluate(feed_dict)?;
		Ok(qubo_to_ising(qubo, offset))
	}

	pub fn to_ising_index(&self, feed_dict: &FeedDict) -> Result<Ising<usize>> {
		let (qubo, offset) = self.compiled_qubo.evaluate(feed_dict)?;
		let qubo = qubo
			.into_iter()
			.map(|((i, j), v)| ((self.label2index[&i], self.label2index[&j]), v))
			.collect();
		Ok(qubo_to_ising(qubo, offset))
	}

	fn to_binary(&self, solution: &Solution, vartype: Vartype) -> Result<HashMap<String, f64>> {
		solution.to_binary(&self.variable_order, vartype, |label| {
			self.structure.contains_key(label)
		})
	}

	fn qubo_energy(&self, bits: &HashMap<String, f64>, feed_dict: &FeedDict) -> Result<f64> {
		let (qubo, offset) = self.compiled_qubo.evaluate(feed_dict)?;
		Ok(qubo
			.iter()
			.fold(offset, |sum, ((i, j), v)| sum + v * bits[i] * bits[j]))
	}

	/// Energy of a solution given in `vartype`.
	pub fn energy<S: Into<Solution>>(&self, solution: S, vartype: Vartype, feed_dict: &FeedDict) -> Result<f64> {
		let bits = self.to_binary(&solution.into(), vartype)?;
		self.qubo_energy(&bits, feed_dict)
	}

	/// Decodes a solution into the structure of the variables, and reports
	/// the constraints it breaks.
	///
	/// A constraint is broken when its polynomial is positive. A negative
	/// value can only come from a constraint that is not a penalty, and is
	/// returned as [`Error::NegativeConstraintEnergy`]. Values within
	/// `1e-9` of 0 count as 0.
	pub fn decode_solution<S: Into<Solution>>(
		&self,
		solution: S,
		vartype: Vartype,
		feed_dict: &FeedDict,
	) -> Result<DecodedSolution> {
		let bits = self.to_binary(&solution.into(), vartype)?;
		let mut decoded = Decoded::default();
		for (label, path) in self.structure.iter() {
			if let Some(bit) = bits.get(label) {
				decoded.insert(path, vartype.from_binary(*bit));
			}
		}
		let mut broken = BTreeMap::new();
		for (label, polynomial) in self.constraints.iter() {
			let penalty = polynomial.energy(&bits, feed_dict)?;
			if penalty < -CONSTRAINT_TOLERANCE {
				return Err(Error::NegativeConstraintEnergy {
					label: label.clone(),
					energy: penalty,
				});
			}
			if penalty > CONSTRAINT_TOLERANCE {
				debug!("constraint {} is broken (penalty {})", label, penalty);
				let result = polynomial
					.variables()
					.into_iter()
					.map(|v| (v.to_owned(), bits[v]))
					.collect();
				broken.insert(label.clone(), BrokenConstraint { result, penalty });
			}
		}
		Ok(DecodedSolution {
			solution: decoded,
			broken,
			energy: self.qubo_energy(&bits, feed_dict)?,
		})
	}

	/// Decodes the `topk` samples of lowest reported energy, all of them
	/// when `topk` is `None`.
	pub fn decode_samples(
		&self,
		samples: &[Sample],
		vartype: Vartype,
		topk: Option<usize>,
		feed_dict: &FeedDict,
	) -> Result<Vec<DecodedSolution>> {
		let mut sorted: Vec<&Sample> = samples.iter().collect();
		sorted.sort_by(|a, b| a.energy.total_cmp(&b.energy));
		sorted
			.into_iter()
			.take(topk.unwrap_or(samples.len()))
			.map(|s| self.decode_solution(s.solution.clone(), vartype, feed_dict))
			.collect()
	}
}

/// Rewrites `x = (s + 1) / 2`. Entries are visited in key order.
fn qubo_to_ising<K>(qubo: BTreeMap<(K, K), f64>, offset: f64) -> Ising<K>
where
	K: Clone + Eq + Hash + Ord,
{
	let mut linear: HashMap<K, f64> = HashMap::new();
	let mut quadratic = HashMap::new();
	let mut offset = offset;
	for ((i, j), v) in qubo {
		if i == j {
			*linear.entry(i).or_insert(0.0) += v / 2.0;
			offset += v / 2.0;
		} else {
			*linear.entry(i.clone()).or_insert(0.0) += v / 4.0;
			*linear.entry(j.clone()).or_insert(0.0) += v / 4.0;
			quadratic.insert((i, j), v / 4.0);
			offset += v / 4.0;
		}
	}
	(linear, quadratic, offset)
}
