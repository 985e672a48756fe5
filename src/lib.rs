//! qubogen compiles polynomial expressions over binary and spin variables,
//! with constraints and placeholders, into QUBO and Ising models.
//!
//! An expression is expanded into a polynomial, reduced to degree 2 with
//! auxiliary variables, and wrapped in a [`Model`] which exports the
//! QUBO/Ising form for a solver and decodes the solver's answers.
//!
//! # Examples
//!
//! ## Simple example
//! ```
//! # use qubogen::{Expr, FeedDict};
//! let (a, b) = (Expr::binary("a"), Expr::binary("b"));
//! let model = (a.clone() * b + a - 1).compile();
//! let (qubo, offset) = model.to_qubo(&FeedDict::new()).unwrap();
//! assert_eq!(qubo[&("a".to_string(), "a".to_string())], 1.0);
//! assert_eq!(qubo[&("a".to_string(), "b".to_string())], 1.0);
//! assert_eq!(offset, -1.0);
//! ```
//!
//! ## Example with constraints and placeholders
//! ```
//! # use qubogen::{Expr, FeedDict, Vartype};
//! # use std::collections::HashMap;
//! let (a, b) = (Expr::binary("a"), Expr::binary("b"));
//! let one_hot = Expr::constraint((a.clone() + b.clone() - 1) ^ 2, "one_hot");
//! let model = (one_hot * Expr::placeholder("w") + a * 2).compile();
//!
//! let feed: FeedDict = vec![("w".to_string(), 5.0)].into_iter().collect();
//! let solution: HashMap<String, f64> = vec![("a".to_string(), 1.0), ("b".to_string(), 1.0)]
//! 	.into_iter()
//! 	.collect();
//! let decoded = model.decode_solution(solution, Vartype::Binary, &feed).unwrap();
//! // displays 7.0, ["one_hot"]
//! println!("{}, {:?}", decoded.energy, decoded.broken.keys().collect::<Vec<_>>());
//! # assert_eq!(decoded.energy, 7.0);
//! # assert_eq!(decoded.solution["a"].value(), Some(1.0));
//! # assert_eq!(decoded.broken["one_hot"].penalty, 1.0);
//! ```
use std::collections::HashMap;

mod coeff;
mod compiled;
mod error;
mod expanded;
mod expr;
pub mod logic;
mod model;
mod options;
mod prod;
mod solution;
mod wrapper;

pub use coeff::{Coefficient, Value};
pub use compiled::CompiledQubo;
pub use error::{Error, Result};
pub use expanded::{Constraints, Polynomial};
pub use expr::Expr;
pub use model::{Ising, Model};
pub use options::CompileOptions;
pub use prod::{BinaryProd, ParamProd};
pub use solution::{BrokenConstraint, Decoded, DecodedSolution, Sample, Solution};
pub use wrapper::{Path, PathKey, Structure, Variable, Vartype};

/// Values of the placeholders, by label.
pub type FeedDict = HashMap<String, f64>;

#[test]
fn expr_test() {
	let e = 2 * Expr::binary("a") * 3;
	let (p, _) = e.expand();
	assert_eq!(
		p.get(&BinaryProd::new(vec!["a"])).and_then(Value::get_number),
		Some(6.0)
	);
}
