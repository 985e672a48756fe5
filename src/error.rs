use thiserror::Error;

/// Errors raised while building, evaluating or decoding a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
	#[error("power of {0} cannot be taken, the exponent must be an integer >= 1")]
	InvalidPower(f64),

	#[error("expression cannot be divided by {0}")]
	NotDivisible(String),

	#[error("placeholder `{0}` is not specified in the feed dict")]
	MissingPlaceholder(String),

	#[error("no placeholder values are given, but the coefficient depends on placeholders")]
	EmptyFeedDict,

	#[error("variable `{0}` is not part of the model")]
	UnknownVariableInSolution(String),

	#[error("solution has {got} variables, but the model has {expected}")]
	SolutionLengthMismatch { expected: usize, got: usize },

	#[error("value {value} of `{label}` is outside the domain of the variable type")]
	InvalidSolutionType { label: String, value: f64 },

	#[error("variable `{0}` is not assigned")]
	MissingVariable(String),

	/// Constraint polynomials are non-negative by construction. Seeing this
	/// means the model or the compiler is broken.
	#[error("energy of constraint `{label}` is {energy}, but constraint energies must not be negative")]
	NegativeConstraintEnergy { label: String, energy: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
