use crate::coeff::Value;

/// Settings of a compile run.
#[derive(Clone, Debug)]
pub struct CompileOptions {
	/// Weight of the AND penalty introduced for every auxiliary variable.
	/// It has to be large enough that breaking `aux = a * b` never lowers the
	/// minimum of the objective; choosing it is up to the caller. It may be
	/// a placeholder, in which case it is fed at `to_qubo` time.
	pub strength: Value,
	/// Sums with at least this many terms are expanded in parallel.
	pub parallel_threshold: usize,
}

impl CompileOptions {
	pub fn new() -> Self {
		Self {
			strength: Value::Number(5.0),
			parallel_threshold: 64,
		}
	}

	pub fn with_strength<V: Into<Value>>(mut self, strength: V) -> Self {
		self.strength = strength.into();
		self
	}

	pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
		self.parallel_threshold = threshold.max(1);
		self
	}
}

impl Default for CompileOptions {
	fn default() -> Self {
		Self::new()
	}
}
