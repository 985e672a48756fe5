use crate::compiled::{reduce_order, CompiledQubo};
use crate::error::{Error, Result};
use crate::expanded::{Constraints, Expander, Polynomial};
use crate::model::Model;
use crate::options::CompileOptions;
use crate::wrapper::{Structure, Variable};
use crate::FeedDict;
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Sum;
use std::ops::{Add, AddAssign, BitXor, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::Arc;

/// An algebraic expression over binary/spin variables and placeholders.
///
/// Trees are immutable values: operators consume their operands and build a
/// new node. Sums are kept as one flat `Add` list, so `a + b + c + ...` does
/// not nest.
///
/// Equality is structural, but `Mul` is compared commutatively and `Add` as a
/// set of terms, so `a * b == b * a` and both hash alike.
#[derive(Clone, Debug)]
pub enum Expr {
	Num(f64),
	Binary(Variable), // Qubit represented with +1, 0
	Spin(Variable),   // Qubit represented with +1, -1
	Placeholder(String),
	Mul(Box<Self>, Box<Self>),
	Add(Vec<Self>),
	/// A sub-expression which must evaluate to 0 in a valid solution.
	Constraint {
		label: String,
		expr: Box<Self>,
	},
	/// A named gadget; every structural operation sees through to `expr`.
	UserDefined {
		name: String,
		expr: Box<Self>,
	},
	/// Contributes `expr` to the objective, and `penalty` both to the
	/// objective and to the constraint named `label`.
	WithPenalty {
		label: String,
		expr: Box<Self>,
		penalty: Box<Self>,
	},
}

impl Expr {
	pub fn binary<S: Into<String>>(label: S) -> Self {
		Expr::Binary(Variable::new(label))
	}

	pub fn spin<S: Into<String>>(label: S) -> Self {
		Expr::Spin(Variable::new(label))
	}

	/// A binary variable which is a member of a larger family described by
	/// `structure`.
	pub fn binary_with_structure<S: Into<String>>(label: S, structure: Arc<Structure>) -> Self {
		Expr::Binary(Variable::with_structure(label, structure))
	}

	pub fn spin_with_structure<S: Into<String>>(label: S, structure: Arc<Structure>) -> Self {
		Expr::Spin(Variable::with_structure(label, structure))
	}

	pub fn placeholder<S: Into<String>>(label: S) -> Self {
		Expr::Placeholder(label.into())
	}

	pub fn constraint<S: Into<String>>(expr: Self, label: S) -> Self {
		Expr::Constraint {
			label: label.into(),
			expr: Box::new(expr),
		}
	}

	pub fn user_defined<S: Into<String>>(name: S, expr: Self) -> Self {
		Expr::UserDefined {
			name: name.into(),
			expr: Box::new(expr),
		}
	}

	pub fn with_penalty<S: Into<String>>(expr: Self, penalty: Self, label: S) -> Self {
		Expr::WithPenalty {
			label: label.into(),
			expr: Box::new(expr),
			penalty: Box::new(penalty),
		}
	}

	#[inline]
	fn add(self, other: Self) -> Self {
		match (self, other) {
			(Expr::Num(a), Expr::Num(b)) => Expr::Num(a + b),
			(Expr::Num(z), o) | (o, Expr::Num(z)) if z == 0.0 => o,
			(Expr::Add(mut v), Expr::Add(w)) => {
				v.extend(w);
				Expr::Add(v)
			}
			(Expr::Add(mut v), o) | (o, Expr::Add(mut v)) => {
				v.push(o);
				Expr::Add(v)
			}
			(a, b) => Expr::Add(vec![a, b]),
		}
	}

	#[inline]
	fn sub(self, other: Self) -> Self {
		self.add(Expr::Num(-1.0).mul(other))
	}

	#[inline]
	fn mul(self, other: Self) -> Self {
		match (self, other) {
			(Expr::Num(a), Expr::Num(b)) => Expr::Num(a * b),
			(a, b) => Expr::Mul(Box::new(a), Box::new(b)),
		}
	}

	#[inline]
	fn div(self, n: f64) -> Self {
		self.mul(Expr::Num(1.0 / n))
	}

	/// `self ^ exponent`, failing unless `exponent` is an integer >= 1.
	pub fn try_pow(self, exponent: f64) -> Result<Self> {
		if exponent.fract() == 0.0 && exponent >= 1.0 && exponent <= u32::MAX as f64 {
			Ok(self ^ exponent as u32)
		} else {
			Err(Error::InvalidPower(exponent))
		}
	}

	/// Divides by a non-zero number. Division by any other expression fails.
	pub fn try_div(self, other: Self) -> Result<Self> {
		match other {
			Expr::Num(n) if n != 0.0 => Ok(self.div(n)),
			o => Err(Error::NotDivisible(o.to_string())),
		}
	}

	/// Evaluates the expression by substituting `bits` for the variables
	/// (`true` is 1 for a binary variable and +1 for a spin) and `feed_dict`
	/// for the placeholders.
	pub fn calculate(&self, bits: &HashMap<String, bool>, feed_dict: &FeedDict) -> Result<f64> {
		match self {
			Expr::Num(n) => Ok(*n),
			Expr::Binary(v) | Expr::Spin(v) => {
				let b = *bits
					.get(v.label())
					.ok_or_else(|| Error::MissingVariable(v.label().to_owned()))?;
				Ok(match (self, b) {
					(_, true) => 1.0,
					(Expr::Spin(_), false) => -1.0,
					_ => 0.0,
				})
			}
			Expr::Placeholder(p) => feed_dict
				.get(p)
				.copied()
				.ok_or_else(|| Error::MissingPlaceholder(p.clone())),
			Expr::Mul(lhs, rhs) => Ok(lhs.calculate(bits, feed_dict)? * rhs.calculate(bits, feed_dict)?),
			Expr::Add(v) => v
				.iter()
				.try_fold(0.0, |sum, e| Ok(sum + e.calculate(bits, feed_dict)?)),
			Expr::Constraint { expr, .. } | Expr::UserDefined { expr, .. } => {
				expr.calculate(bits, feed_dict)
			}
			Expr::WithPenalty { expr, penalty, .. } => {
				Ok(expr.calculate(bits, feed_dict)? + penalty.calculate(bits, feed_dict)?)
			}
		}
	}

	/// Flattens the expression into a polynomial and the polynomials of its
	/// named constraints.
	pub fn expand(&self) -> (Polynomial, Constraints) {
		Expander::new(CompileOptions::default().parallel_threshold).expand(self)
	}

	pub fn compile(&self) -> Model {
		self.compile_with(&CompileOptions::default())
	}

	/// Expands the expression, reduces it to a quadratic form and wraps the
	/// result in a [`Model`].
	pub fn compile_with(&self, options: &CompileOptions) -> Model {
		let (polynomial, mut constraints) = Expander::new(options.parallel_threshold).expand(self);
		debug!(
			"expanded into {} terms of degree <= {}, {} named constraints",
			polynomial.len(),
			polynomial.degree(),
			constraints.len()
		);
		let (quadratic, products) = reduce_order(polynomial, &options.strength);
		constraints.extend(products);
		let compiled = CompiledQubo::from_polynomial(quadratic);
		debug!("compiled QUBO has {} entries", compiled.len());
		Model::new(compiled, self.structure(), constraints)
	}

	/// Union of the structures of every variable in the tree.
	pub(crate) fn structure(&self) -> Structure {
		fn collect(e: &Expr, seen: &mut HashSet<*const Structure>, out: &mut Structure) {
			match e {
				Expr::Binary(v) | Expr::Spin(v) => {
					let s = v.structure();
					if seen.insert(s as *const Structure) {
						out.extend(s.iter().map(|(k, p)| (k.clone(), p.clone())));
					}
				}
				Expr::Mul(lhs, rhs) => {
					collect(lhs, seen, out);
					collect(rhs, seen, out);
				}
				Expr::Add(v) => v.iter().for_each(|e| collect(e, seen, out)),
				Expr::Constraint { expr, .. } | Expr::UserDefined { expr, .. } => {
					collect(expr, seen, out)
				}
				Expr::WithPenalty { expr, penalty, .. } => {
					collect(expr, seen, out);
					collect(penalty, seen, out);
				}
				Expr::Num(_) | Expr::Placeholder(_) => {}
			}
		}
		let mut out = Structure::new();
		collect(self, &mut HashSet::new(), &mut out);
		out
	}
}

fn hash_of(e: &Expr) -> u64 {
	let mut h = DefaultHasher::new();
	e.hash(&mut h);
	h.finish()
}

impl PartialEq for Expr {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Expr::Num(a), Expr::Num(b)) => a == b,
			(Expr::Binary(a), Expr::Binary(b)) | (Expr::Spin(a), Expr::Spin(b)) => a == b,
			(Expr::Placeholder(a), Expr::Placeholder(b)) => a == b,
			(Expr::Mul(l1, r1), Expr::Mul(l2, r2)) => (l1 == l2 && r1 == r2) || (l1 == r2 && r1 == l2),
			(Expr::Add(v), Expr::Add(w)) => {
				v.iter().all(|t| w.contains(t)) && w.iter().all(|t| v.contains(t))
			}
			(
				Expr::Constraint { label: l1, expr: e1 },
				Expr::Constraint { label: l2, expr: e2 },
			) => l1 == l2 && e1 == e2,
			(
				Expr::UserDefined { name: n1, expr: e1 },
				Expr::UserDefined { name: n2, expr: e2 },
			) => n1 == n2 && e1 == e2,
			(
				Expr::WithPenalty {
					label: l1,
					expr: e1,
					penalty: p1,
				},
				Expr::WithPenalty {
					label: l2,
					expr: e2,
					penalty: p2,
				},
			) => l1 == l2 && e1 == e2 && p1 == p2,
			_ => false,
		}
	}
}

// NaN numbers break reflexivity, as they do for f64 itself.
impl Eq for Expr {}

impl Hash for Expr {
	fn hash<H: Hasher>(&self, state: &mut H) {
		match self {
			Expr::Num(n) => {
				0u8.hash(state);
				// 0.0 == -0.0
				let n = if *n == 0.0 { 0.0f64 } else { *n };
				n.to_bits().hash(state);
			}
			Expr::Binary(v) | Expr::Spin(v) => v.hash(state),
			Expr::Placeholder(p) => {
				2u8.hash(state);
				p.hash(state);
			}
			Expr::Mul(lhs, rhs) => {
				let (a, b) = (hash_of(lhs), hash_of(rhs));
				3u8.hash(state);
				a.min(b).hash(state);
				a.max(b).hash(state);
			}
			Expr::Add(v) => {
				let mut hashes: Vec<u64> = v.iter().map(hash_of).collect();
				hashes.sort_unstable();
				hashes.dedup();
				4u8.hash(state);
				hashes.hash(state);
			}
			Expr::Constraint { label, expr } => {
				5u8.hash(state);
				label.hash(state);
				expr.hash(state);
			}
			Expr::UserDefined { name, expr } => {
				6u8.hash(state);
				name.hash(state);
				expr.hash(state);
			}
			Expr::WithPenalty {
				label,
				expr,
				penalty,
			} => {
				7u8.hash(state);
				label.hash(state);
				expr.hash(state);
				penalty.hash(state);
			}
		}
	}
}

impl fmt::Display for Expr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expr::Num(n) => write!(f, "Num({})", n),
			Expr::Binary(v) => write!(f, "Binary({})", v.label()),
			Expr::Spin(v) => write!(f, "Spin({})", v.label()),
			Expr::Placeholder(p) => write!(f, "Placeholder({})", p),
			Expr::Mul(lhs, rhs) => write!(f, "({}*{})", lhs, rhs),
			Expr::Add(v) => {
				let terms: Vec<String> = v.iter().map(|e| e.to_string()).collect();
				write!(f, "({})", terms.join("+"))
			}
			Expr::Constraint { label, expr } => write!(f, "Constraint({}, {})", label, expr),
			Expr::UserDefined { name, expr } => write!(f, "{}({})", name, expr),
			Expr::WithPenalty {
				label,
				expr,
				penalty,
			} => write!(f, "WithPenalty({}, {}, {})", expr, penalty, label),
		}
	}
}

impl From<f64> for Expr {
	#[inline]
	fn from(f: f64) -> Self {
		Expr::Num(f)
	}
}

impl From<i32> for Expr {
	#[inline]
	fn from(i: i32) -> Self {
		Expr::Num(i as f64)
	}
}

impl Neg for Expr {
	type Output = Self;
	#[inline]
	fn neg(self) -> Self::Output {
		self.mul(Expr::Num(-1.0))
	}
}

macro_rules! impl_binary_op_inner {
	($trait:ident, $fun:ident, $lhs:ty, $rhs:ty) => {
		impl $trait<$rhs> for $lhs {
			type Output = Expr;
			#[inline]
			fn $fun(self, other: $rhs) -> Self::Output {
				Expr::$fun(
					<$lhs as Into<Self::Output>>::into(self),
					<$rhs as Into<Self::Output>>::into(other),
				)
			}
		}
	};
}

macro_rules! impl_binary_op {
	($trait:ident, $fun:ident) => {
		impl_binary_op_inner!($trait, $fun, Expr, Expr);
		impl_binary_op_inner!($trait, $fun, Expr, i32);
		impl_binary_op_inner!($trait, $fun, Expr, f64);
		impl_binary_op_inner!($trait, $fun, i32, Expr);
		impl_binary_op_inner!($trait, $fun, f64, Expr);
	};
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
/// Dividing by zero gives an infinite coefficient; `try_div` rejects it.
impl Div<f64> for Expr {
	type Output = Expr;
	#[inline]
	fn div(self, other: f64) -> Self::Output {
		Expr::div(self, other)
	}
}

impl Div<i32> for Expr {
	type Output = Expr;
	#[inline]
	fn div(self, other: i32) -> Self::Output {
		Expr::div(self, other as f64)
	}
}

/// `x ^ n` multiplies `n` copies of `x`; `x ^ 0` is `Num(1)`.
impl BitXor<u32> for Expr {
	type Output = Self;
	#[inline]
	fn bitxor(self, other: u32) -> Self {
		match other {
			0 => Expr::Num(1.0),
			n => (1..n).fold(self.clone(), |hmlt, _| hmlt.mul(self.clone())),
		}
	}
}

macro_rules! impl_assign_op_inner {
	($trait:ident, $fun:ident, $fun_inner:ident, $rhs:ty) => {
		impl $trait<$rhs> for Expr {
			#[inline]
			fn $fun(&mut self, other: $rhs) {
				let inner = std::mem::replace(self, Expr::Num(0.0));
				*self = Expr::$fun_inner(inner, <$rhs as Into<Expr>>::into(other));
			}
		}
	};
}

macro_rules! impl_assign_op {
	($trait:ident, $fun:ident, $fun_inner:ident) => {
		impl_assign_op_inner!($trait, $fun, $fun_inner, Expr);
		impl_assign_op_inner!($trait, $fun, $fun_inner, i32);
		impl_assign_op_inner!($trait, $fun, $fun_inner, f64);
	};
}

impl_assign_op!(AddAssign, add_assign, add);
impl_assign_op!(SubAssign, sub_assign, sub);
impl_assign_op!(MulAssign, mul_assign, mul);

impl Sum for Expr {
	fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.fold(Expr::Num(0.0), Expr::add)
	}
}
