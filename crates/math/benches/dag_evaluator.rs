// Copyright 2024 Irreducible Inc.

use ark_bn254::Fr;
use ark_std::UniformRand;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use placeholder_math::{
	dag::{ColumnOracle, DagEvaluator, DagExpressionBuilder, ShiftedColumn},
	ArithExpr,
};
use rand::{rngs::StdRng, SeedableRng};

type Expr = ArithExpr<Fr, (usize, usize)>;

struct Columns(Vec<Vec<Fr>>);

impl ColumnOracle<Fr, (usize, usize)> for Columns {
	fn column(&self, var: &(usize, usize)) -> ShiftedColumn<'_, Fr> {
		ShiftedColumn::with_shift(&self.0[var.0], var.1)
	}
}

/// Gate-like constraints: products of neighbouring columns, a rotated column and a cube.
fn constraints(n_columns: usize) -> Vec<Expr> {
	(0..n_columns)
		.map(|i| {
			let a = Expr::Var((i, 0));
			let b = Expr::Var(((i + 1) % n_columns, 0));
			let c = Expr::Var(((i + 2) % n_columns, 0));
			let next = Expr::Var((i, 1));
			a.clone() * b.clone() + c.pow(3) - next + a * b * Expr::Const(Fr::from(7u64))
		})
		.collect()
}

fn bench_dag_evaluator(c: &mut Criterion) {
	let mut group = c.benchmark_group("dag_evaluator");
	let mut rng = StdRng::seed_from_u64(0);
	let n_columns = 32;

	let mut builder = DagExpressionBuilder::new();
	let roots = constraints(n_columns)
		.iter()
		.map(|expr| builder.add_expression(expr))
		.collect::<Vec<_>>();
	let dag = builder.build();
	let evaluator = DagEvaluator::new(&dag, &roots).unwrap();

	for log_size in [12, 16] {
		let size = 1 << log_size;
		let columns = Columns(
			(0..n_columns)
				.map(|_| (0..size).map(|_| Fr::rand(&mut rng)).collect())
				.collect(),
		);

		group.throughput(Throughput::Elements((size * n_columns) as u64));
		group.bench_function(BenchmarkId::from_parameter(log_size), |bench| {
			bench.iter(|| evaluator.evaluate(size, &columns).unwrap())
		});
	}

	group.finish()
}

fn bench_dag_build(c: &mut Criterion) {
	let exprs = constraints(256);
	c.bench_function("dag_build", |bench| {
		bench.iter(|| {
			let mut builder = DagExpressionBuilder::new();
			for expr in &exprs {
				builder.add_expression(expr);
			}
			builder.build()
		})
	});
}

criterion_group!(dag, bench_dag_evaluator, bench_dag_build);
criterion_main!(dag);
