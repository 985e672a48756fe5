use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Domain of a variable, or of the values in a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vartype {
	/// {0, 1}
	Binary,
	/// {-1, 1}
	Spin,
}

impl Vartype {
	/// Converts a value of this vartype into a bit, `None` if the value is
	/// outside the domain.
	pub(crate) fn to_binary(self, value: f64) -> Option<f64> {
		match self {
			Vartype::Binary if value == 0.0 || value == 1.0 => Some(value),
			Vartype::Spin if value == -1.0 || value == 1.0 => Some((value + 1.0) / 2.0),
			_ => None,
		}
	}

	pub(crate) fn from_binary(self, bit: f64) -> f64 {
		match self {
			Vartype::Binary => bit,
			Vartype::Spin => 2.0 * bit - 1.0,
		}
	}
}

/// One step of the path a decoded value is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathKey {
	Name(String),
	Index(usize),
}

impl From<&str> for PathKey {
	fn from(s: &str) -> Self {
		PathKey::Name(s.to_owned())
	}
}

impl From<String> for PathKey {
	fn from(s: String) -> Self {
		PathKey::Name(s)
	}
}

impl From<usize> for PathKey {
	fn from(i: usize) -> Self {
		PathKey::Index(i)
	}
}

impl fmt::Display for PathKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PathKey::Name(s) => write!(f, "{:?}", s),
			PathKey::Index(i) => write!(f, "{}", i),
		}
	}
}

pub type Path = Vec<PathKey>;

/// Maps variable labels to the path their value is decoded into.
pub type Structure = BTreeMap<String, Path>;

/// A labelled decision variable together with the structure it belongs to.
///
/// Variables created as a family (e.g. the cells of a matrix) share one
/// structure, so the compiled model knows every member of the family.
/// Equality and hashing only look at the label.
#[derive(Clone)]
pub struct Variable {
	label: String,
	structure: Arc<Structure>,
}

impl Variable {
	pub fn new<S: Into<String>>(label: S) -> Self {
		let label = label.into();
		let structure = Some((label.clone(), vec![PathKey::Name(label.clone())]))
			.into_iter()
			.collect();
		Self {
			label,
			structure: Arc::new(structure),
		}
	}

	pub fn with_structure<S: Into<String>>(label: S, structure: Arc<Structure>) -> Self {
		Self {
			label: label.into(),
			structure,
		}
	}

	#[inline]
	pub fn label(&self) -> &str {
		&self.label
	}

	#[inline]
	pub fn structure(&self) -> &Structure {
		&self.structure
	}
}

impl PartialEq for Variable {
	fn eq(&self, other: &Self) -> bool {
		self.label == other.label
	}
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.label.hash(state);
	}
}

impl fmt::Debug for Variable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.label)
	}
}

#[test]
fn vartype_conversion() {
	assert_eq!(Vartype::Spin.to_binary(-1.0), Some(0.0));
	assert_eq!(Vartype::Spin.to_binary(1.0), Some(1.0));
	assert_eq!(Vartype::Spin.to_binary(0.0), None);
	assert_eq!(Vartype::Binary.to_binary(2.0), None);
	assert_eq!(Vartype::Spin.from_binary(0.0), -1.0);
}

#[test]
fn variable_default_structure() {
	let v = Variable::new("a");
	assert_eq!(v.structure()["a"], vec![PathKey::Name("a".into())]);
	assert_eq!(v, Variable::with_structure("a", Arc::new(Structure::new())));
}
