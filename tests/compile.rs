use qubogen::logic::not_const;
use qubogen::{CompileOptions, Expr, FeedDict, Model, Value, Vartype};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn key(i: &str, j: &str) -> (String, String) {
	(i.to_owned(), j.to_owned())
}

fn feed(items: &[(&str, f64)]) -> FeedDict {
	items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn compile_reduce_degree() {
	let (a, b, c, d) = (
		Expr::binary("a"),
		Expr::binary("b"),
		Expr::binary("c"),
		Expr::binary("d"),
	);
	let model = (a * b.clone() * c.clone() + b * c * d).compile();
	let (qubo, offset) = model.to_qubo(&FeedDict::new()).unwrap();
	let expected: HashMap<(String, String), f64> = vec![
		(key("a", "a"), 0.0),
		(key("a", "b*c"), 1.0),
		(key("b", "b"), 0.0),
		(key("b", "b*c"), -10.0),
		(key("b", "c"), 5.0),
		(key("b*c", "b*c"), 15.0),
		(key("b*c", "c"), -10.0),
		(key("b*c", "d"), 1.0),
		(key("c", "c"), 0.0),
		(key("d", "d"), 0.0),
	]
	.into_iter()
	.collect();
	assert_eq!(qubo, expected);
	assert_eq!(offset, 0.0);
	assert!(model.constraints().contains_key("AND(b,c)=b*c"));
}

#[test]
fn compile_keeps_zero_terms() {
	let (a, b) = (Expr::binary("a"), Expr::binary("b"));
	let (qubo, offset) = ((a.clone() + b.clone()) * (a - b))
		.compile()
		.to_qubo(&FeedDict::new())
		.unwrap();
	assert_eq!(qubo.len(), 3);
	assert_eq!(qubo[&key("a", "a")], 1.0);
	assert_eq!(qubo[&key("a", "b")], 0.0);
	assert_eq!(qubo[&key("b", "b")], -1.0);
	assert_eq!(offset, 0.0);
}

#[test]
fn compile_placeholders() {
	let (a, b) = (Expr::binary("a"), Expr::binary("b"));
	let (w, v) = (Expr::placeholder("w"), Expr::placeholder("v"));
	let model = (v.clone() * w * (a + b - 2) + v).compile();
	let (qubo, offset) = model.to_qubo(&feed(&[("w", 3.0), ("v", 5.0)])).unwrap();
	assert_eq!(qubo[&key("a", "a")], 15.0);
	assert_eq!(qubo[&key("b", "b")], 15.0);
	assert_eq!(offset, -25.0);
}

#[test]
fn compile_symbolic_strength() {
	let e = Expr::binary("a") * Expr::binary("b") * Expr::binary("c");
	let numeric = e.compile_with(&CompileOptions::default().with_strength(7.0));
	let symbolic = e.compile_with(&CompileOptions::default().with_strength(Value::placeholder("s")));
	let (expected, _) = numeric.to_qubo(&FeedDict::new()).unwrap();
	assert_eq!(expected[&key("a*b", "a*b")], 21.0);
	let (qubo, _) = symbolic.to_qubo(&feed(&[("s", 7.0)])).unwrap();
	assert_eq!(qubo, expected);
}

#[test_log::test]
fn quadratization_soundness() {
	let x: Vec<Expr> = (0..3).map(|i| Expr::binary(format!("x{}", i))).collect();
	let model = (x[0].clone() * x[1].clone() * x[2].clone()).compile();
	assert_eq!(model.variable_order(), &["x0", "x0*x1", "x1", "x2"]);

	let decoded = model
		.decode_solution(vec![1.0, 1.0, 1.0, 1.0], Vartype::Binary, &FeedDict::new())
		.unwrap();
	assert_eq!(decoded.energy, 1.0);
	assert!(decoded.broken.is_empty());

	let decoded = model
		.decode_solution(vec![1.0, 0.0, 1.0, 1.0], Vartype::Binary, &FeedDict::new())
		.unwrap();
	assert_eq!(decoded.broken["AND(x0,x1)=x0*x1"].penalty, 5.0);
	assert_eq!(decoded.energy, 5.0);
}

#[test]
fn not_const_constraint() {
	let model = not_const(Expr::binary("a"), Expr::binary("b"), "not").compile();
	let energy = |a: f64, b: f64| model.energy(vec![a, b], Vartype::Binary, &FeedDict::new()).unwrap();
	assert_eq!(energy(1.0, 0.0), 0.0);
	assert_eq!(energy(0.0, 1.0), 0.0);
	assert!(energy(1.0, 1.0) > 0.0);
	assert!(energy(0.0, 0.0) > 0.0);
}

#[test]
fn invalid_operations() {
	let a = Expr::binary("a");
	assert!(a.clone().try_pow(-1.0).is_err());
	assert!(a.clone().try_pow(1.5).is_err());
	assert!(a.clone().try_div(Expr::binary("b")).is_err());
	assert_eq!(a.clone().try_div(Expr::Num(2.0)), Ok(a / 2));
}

const LABELS: [&str; 6] = ["a", "b", "c", "d", "s", "t"];

fn leaf(label: &str) -> Expr {
	if label == "s" || label == "t" {
		Expr::spin(label)
	} else {
		Expr::binary(label)
	}
}

fn random_expr(rng: &mut SmallRng) -> Expr {
	(0..rng.gen_range(1, 8))
		.map(|_| {
			let degree = rng.gen_range(0, 5);
			let coeff = rng.gen_range(-4, 5) as f64;
			(0..degree).fold(Expr::Num(coeff), |e, _| e * leaf(LABELS[rng.gen_range(0, LABELS.len())]))
		})
		.sum()
}

/// Bits of the model variables: the random ones, plus the auxiliaries set
/// to the product they stand for.
fn assignment(model: &Model, bits: &HashMap<String, bool>) -> HashMap<String, f64> {
	model
		.variable_order()
		.iter()
		.map(|label| {
			let v = label.split('*').all(|factor| bits[factor]);
			(label.clone(), if v { 1.0 } else { 0.0 })
		})
		.collect()
}

#[test_log::test]
fn round_trip_energy() {
	let mut rng = SmallRng::seed_from_u64(0x5eed);
	for _ in 0..50 {
		let e = random_expr(&mut rng);
		let model = e.compile();
		for _ in 0..8 {
			let bits: HashMap<String, bool> =
				LABELS.iter().map(|l| (l.to_string(), rng.gen::<bool>())).collect();
			let expected = e.calculate(&bits, &FeedDict::new()).unwrap();
			let energy = model
				.energy(assignment(&model, &bits), Vartype::Binary, &FeedDict::new())
				.unwrap();
			assert_eq!(energy, expected, "{}", e);
		}
	}
}

#[test]
fn parallel_compile_is_deterministic() {
	let mut rng = SmallRng::seed_from_u64(42);
	let e: Expr = (0..200).map(|_| random_expr(&mut rng)).sum();
	let sequential = e.compile_with(&CompileOptions::default().with_parallel_threshold(usize::MAX));
	let parallel = e.compile_with(&CompileOptions::default().with_parallel_threshold(2));
	assert_eq!(sequential.compiled_qubo(), parallel.compiled_qubo());
	assert_eq!(sequential.constraints(), parallel.constraints());
}
