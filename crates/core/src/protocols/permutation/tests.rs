// Copyright 2024 Irreducible Inc.

use std::collections::BTreeSet;

use ark_bn254::Fr;
use ark_ff::{FftField, Field, UniformRand};
use placeholder_math::EvaluationDomain;
use rand::{rngs::StdRng, SeedableRng};

use super::*;
use crate::constraint_system::{Cell, Column, Oracle, OracleVar, PermutationLayout};

const ROWS: usize = 8;
const USABLE: usize = 6;

fn domain() -> EvaluationDomain<Fr> {
	EvaluationDomain::with_size(ROWS).unwrap()
}

fn random_columns(n_columns: usize, rng: &mut StdRng) -> Vec<Vec<Fr>> {
	(0..n_columns)
		.map(|_| (0..ROWS).map(|_| Fr::rand(rng)).collect())
		.collect()
}

/// Makes every class hold the value of its first cell.
fn enforce_copies(columns: &mut [Vec<Fr>], permuted: &[Column], classes: &[Vec<Cell>]) {
	for class in merge_copy_classes(classes) {
		let position = |cell: &Cell| permuted.iter().position(|c| *c == cell.column).unwrap();
		let value = columns[position(&class[0])][class[0].row];
		for cell in &class {
			columns[position(cell)][cell.row] = value;
		}
	}
}

/// Evaluates the constraints on every row of the table.
fn constraint_rows(
	constraints: &[ConstraintExpr<Fr>],
	permuted: &[Column],
	columns: &[Vec<Fr>],
	identities: &[Vec<Fr>],
	sigmas: &[Vec<Fr>],
	products: &[Vec<Fr>],
) -> Vec<Vec<Fr>> {
	(0..ROWS)
		.map(|row| {
			let value_of = |var: &OracleVar| {
				let at = (row as i64 + i64::from(var.rotation)).rem_euclid(ROWS as i64) as usize;
				let indicator = |set: bool| if set { Fr::ONE } else { Fr::ZERO };
				match var.oracle {
					Oracle::Column(column) => {
						columns[permuted.iter().position(|c| *c == column).unwrap()][at]
					}
					Oracle::FirstRow => indicator(at == 0),
					Oracle::LastRow => indicator(at == USABLE),
					Oracle::BlindRows => indicator(at > USABLE),
					Oracle::Identity(j) => identities[j][at],
					Oracle::Sigma(j) => sigmas[j][at],
					Oracle::Permutation(k) => products[k][at],
					Oracle::Count(_) => unreachable!(),
				}
			};
			constraints
				.iter()
				.map(|constraint| constraint.evaluate(&value_of))
				.collect()
		})
		.collect()
}

#[test]
fn test_identities_are_distinct() {
	let identities = identity_values(&domain(), 3);
	let distinct = identities.iter().flatten().collect::<BTreeSet<_>>();
	assert_eq!(distinct.len(), 3 * ROWS);
	assert_eq!(identities[0], domain().elements());
	assert_eq!(identities[1][0], Fr::GENERATOR);
}

#[test]
fn test_overlapping_classes_are_merged() {
	let a = Column::witness(0);
	let b = Column::witness(1);
	let classes = vec![
		vec![b.cell(2), a.cell(0)],
		vec![a.cell(3)],
		vec![a.cell(0), b.cell(1), b.cell(1)],
		vec![a.cell(4), a.cell(5)],
	];
	let merged = merge_copy_classes(&classes);
	assert_eq!(
		merged,
		vec![
			vec![a.cell(0), b.cell(1), b.cell(2)],
			vec![a.cell(3)],
			vec![a.cell(4), a.cell(5)],
		]
	);
}

#[test]
fn test_sigma_rotates_three_cycle() {
	let columns = [Column::witness(0), Column::witness(1), Column::witness(2)];
	let identities = identity_values(&domain(), 3);
	let class = vec![columns[0].cell(0), columns[1].cell(0), columns[2].cell(0)];
	let sigmas = sigma_values(&identities, &columns, &[class]);

	assert_eq!(sigmas[0][0], identities[1][0]);
	assert_eq!(sigmas[1][0], identities[2][0]);
	assert_eq!(sigmas[2][0], identities[0][0]);
	for j in 0..3 {
		assert_eq!(sigmas[j][1..], identities[j][1..]);
	}

	let permuted_multiset = sigmas.iter().flatten().collect::<BTreeSet<_>>();
	let identity_multiset = identities.iter().flatten().collect::<BTreeSet<_>>();
	assert_eq!(permuted_multiset, identity_multiset);
}

#[test]
fn test_grand_product_closes_on_satisfied_copies() {
	let mut rng = StdRng::seed_from_u64(0);
	let permuted = [Column::witness(0), Column::witness(1), Column::constant(0)];
	let classes = vec![
		vec![permuted[0].cell(0), permuted[1].cell(3), permuted[2].cell(5)],
		vec![permuted[1].cell(1), permuted[1].cell(2)],
	];
	let mut columns = random_columns(3, &mut rng);
	enforce_copies(&mut columns, &permuted, &classes);

	let identities = identity_values(&domain(), 3);
	let sigmas = sigma_values(&identities, &permuted, &classes);
	let (beta, gamma) = (Fr::rand(&mut rng), Fr::rand(&mut rng));
	let column_refs = columns.iter().map(Vec::as_slice).collect::<Vec<_>>();

	let products =
		grand_product_values(&column_refs, &identities, &sigmas, beta, gamma, USABLE, 5, &mut rng)
			.unwrap();
	assert_eq!(products.len(), 1);
	let z = &products[0];
	assert_eq!(z[0], Fr::ONE);
	assert_eq!(z[USABLE], Fr::ONE);

	for row in 0..USABLE {
		let numerator = (0..3)
			.map(|j| columns[j][row] + beta * identities[j][row] + gamma)
			.product::<Fr>();
		let denominator = (0..3)
			.map(|j| columns[j][row] + beta * sigmas[j][row] + gamma)
			.product::<Fr>();
		assert_eq!(z[row + 1] * denominator, z[row] * numerator);
	}
}

#[test]
fn test_broken_copy_does_not_close() {
	let mut rng = StdRng::seed_from_u64(1);
	let permuted = [Column::witness(0), Column::witness(1)];
	let classes = vec![vec![permuted[0].cell(0), permuted[1].cell(0)]];
	let mut columns = random_columns(2, &mut rng);
	enforce_copies(&mut columns, &permuted, &classes);
	columns[1][0] += Fr::ONE;

	let identities = identity_values(&domain(), 2);
	let sigmas = sigma_values(&identities, &permuted, &classes);
	let column_refs = columns.iter().map(Vec::as_slice).collect::<Vec<_>>();
	let products = grand_product_values(
		&column_refs,
		&identities,
		&sigmas,
		Fr::rand(&mut rng),
		Fr::rand(&mut rng),
		USABLE,
		3,
		&mut rng,
	)
	.unwrap();
	assert_ne!(products[0][USABLE], Fr::ONE);
}

#[test]
fn test_chunked_constraints_vanish_on_every_row() {
	let mut rng = StdRng::seed_from_u64(2);
	let permuted = (0..5).map(Column::witness).collect::<Vec<_>>();
	let classes = vec![
		vec![permuted[0].cell(0), permuted[4].cell(2), permuted[2].cell(5)],
		vec![permuted[1].cell(4), permuted[3].cell(4)],
	];
	let mut columns = random_columns(5, &mut rng);
	enforce_copies(&mut columns, &permuted, &classes);

	let identities = identity_values(&domain(), 5);
	let sigmas = sigma_values(&identities, &permuted, &classes);
	let (beta, gamma) = (Fr::rand(&mut rng), Fr::rand(&mut rng));
	let column_refs = columns.iter().map(Vec::as_slice).collect::<Vec<_>>();

	// Chunks of two columns.
	let max_degree = 4;
	let products = grand_product_values(
		&column_refs,
		&identities,
		&sigmas,
		beta,
		gamma,
		USABLE,
		max_degree,
		&mut rng,
	)
	.unwrap();
	assert_eq!(products.len(), n_chunks(5, max_degree));

	let layout = PermutationLayout {
		chunks: 3,
		lookup_inputs: 0,
		table_options: 0,
	};
	let constraints = permutation_constraints(&permuted, &layout, max_degree, beta, gamma);
	assert_eq!(constraints.len(), 5);
	assert!(constraints.iter().all(|c| c.degree() <= max_degree));

	let rows = constraint_rows(&constraints, &permuted, &columns, &identities, &sigmas, &products);
	for values in rows {
		assert!(values.iter().all(|value| *value == Fr::ZERO));
	}

	// A wrong copy breaks the last-row constraint.
	let mut broken = columns.clone();
	broken[3][4] += Fr::ONE;
	let broken_refs = broken.iter().map(Vec::as_slice).collect::<Vec<_>>();
	let products = grand_product_values(
		&broken_refs,
		&identities,
		&sigmas,
		beta,
		gamma,
		USABLE,
		max_degree,
		&mut rng,
	)
	.unwrap();
	let rows = constraint_rows(&constraints, &permuted, &broken, &identities, &sigmas, &products);
	assert_ne!(rows[USABLE][4], Fr::ZERO);
}

#[test]
fn test_no_copy_constraints_give_no_constraints() {
	let layout = PermutationLayout {
		chunks: 0,
		lookup_inputs: 0,
		table_options: 0,
	};
	let constraints = permutation_constraints::<Fr>(&[], &layout, 3, Fr::ONE, Fr::ONE);
	assert!(constraints.is_empty());
}

mod properties {
	use proptest::prelude::*;

	use super::*;

	fn cell() -> impl Strategy<Value = Cell> {
		(0..3usize, 0..USABLE).prop_map(|(column, row)| Column::witness(column).cell(row))
	}

	proptest! {
		#[test]
		fn test_sigma_permutes_each_class(
			classes in prop::collection::vec(prop::collection::vec(cell(), 1..4), 0..4),
		) {
			let permuted = (0..3).map(Column::witness).collect::<Vec<_>>();
			let identities = identity_values(&domain(), permuted.len());
			let sigmas = sigma_values(&identities, &permuted, &classes);
			let at = |values: &[Vec<Fr>], cell: &Cell| values[cell.column.index][cell.row];

			let merged = merge_copy_classes(&classes);
			for class in &merged {
				let expected = class.iter().map(|cell| at(&identities, cell)).collect::<BTreeSet<_>>();
				let actual = class.iter().map(|cell| at(&sigmas, cell)).collect::<BTreeSet<_>>();
				prop_assert_eq!(actual, expected);
			}

			let constrained = merged.iter().flatten().copied().collect::<BTreeSet<_>>();
			for column in 0..3 {
				for row in 0..ROWS {
					let cell = Column::witness(column).cell(row);
					if !constrained.contains(&cell) {
						prop_assert_eq!(at(&sigmas, &cell), at(&identities, &cell));
					}
				}
			}
		}
	}
}
