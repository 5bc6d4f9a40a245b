// Copyright 2024 Irreducible Inc.

use std::{collections::BTreeMap, iter::repeat_with, sync::Arc};

use ark_bn254::Fr;
use ark_ff::{FftField, Field, UniformRand};
use assert_matches::assert_matches;
use placeholder_hash::Sha256Compression;
use placeholder_math::Polynomial;
use placeholder_utils::{DeserializeBytes, SerializeBytes};
use rand::{rngs::StdRng, SeedableRng};
use sha2::Sha256;

use super::*;
use crate::{
	merkle_tree::{BinaryMerkleTreeProver, MerkleTreeProver, ProverDigest},
	protocols::fri::{self, FRIParams},
	transcript::Transcript,
};

type TestMerkleProver = BinaryMerkleTreeProver<Fr, Sha256, Sha256Compression>;
type Digest = ProverDigest<Fr, TestMerkleProver>;

fn merkle_prover() -> TestMerkleProver {
	BinaryMerkleTreeProver::new(Sha256Compression::default())
}

fn poly(coeffs: &[u64]) -> Polynomial<Fr> {
	Polynomial::new(coeffs.iter().copied().map(Fr::from).collect())
}

fn random_polys(n: usize, degree: usize, rng: &mut StdRng) -> Vec<Polynomial<Fr>> {
	repeat_with(|| Polynomial::random(degree, &mut *rng))
		.take(n)
		.collect()
}

/// Commits every batch, requests every polynomial at every point and proves.
fn prove_batches(
	params: &FRIParams<Fr>,
	batches: &[Vec<Polynomial<Fr>>],
	points: &[Fr],
) -> (Vec<Digest>, LpcProof<Fr, Digest>) {
	let merkle_prover = merkle_prover();
	let mut transcript = Transcript::new();
	let mut prover = LpcProver::new(params, &merkle_prover);

	let mut roots = Vec::new();
	for (batch, polys) in batches.iter().enumerate() {
		let root = prover.commit_batch(batch, polys.clone()).unwrap();
		transcript.observe(&root);
		roots.push(root);
		for &point in points {
			prover.append_eval_point_to_batch(batch, point).unwrap();
		}
	}
	let proof = prover.prove(&mut transcript).unwrap();
	(roots, proof)
}

fn verify_batches(
	params: &FRIParams<Fr>,
	batch_sizes: &[usize],
	roots: &[Digest],
	points: &[Fr],
	proof: &LpcProof<Fr, Digest>,
) -> Result<(), Error> {
	let merkle_prover = merkle_prover();
	let mut transcript = Transcript::new();
	let mut verifier = LpcVerifier::new(params, merkle_prover.scheme());

	for (batch, (root, &n_polys)) in roots.iter().zip(batch_sizes).enumerate() {
		verifier.add_batch(batch, root.clone(), n_polys).unwrap();
		transcript.observe(root);
		for &point in points {
			verifier.append_eval_point_to_batch(batch, point).unwrap();
		}
	}
	verifier.verify(proof, &mut transcript)
}

fn generator_point_batches(rng: &mut StdRng, degree: usize) -> Vec<Vec<Polynomial<Fr>>> {
	vec![
		random_polys(1, degree, rng),
		vec![poly(&[0, 1]), poly(&[1, 1, 2, 3]), poly(&[1, 1, 3, 4])],
		vec![Polynomial::zero()],
		random_polys(2, degree, rng),
	]
}

#[test]
fn test_batched_opening_at_generator() {
	let mut rng = StdRng::seed_from_u64(0);
	let params = FRIParams::new(4, 1, vec![2, 2], 10, 8).unwrap();
	let batches = generator_point_batches(&mut rng, 15);
	let xi = Fr::GENERATOR;

	let (roots, proof) = prove_batches(&params, &batches, &[xi]);
	assert_eq!(proof.evaluations[&1][0], vec![xi]);
	let expected = Fr::from(1u64) + xi + xi.square().double() + xi.pow([3u64]) * Fr::from(3u64);
	assert_eq!(proof.evaluations[&1][1], vec![expected]);
	assert_eq!(proof.evaluations[&2][0], vec![Fr::from(0u64)]);

	verify_batches(&params, &[1, 3, 1, 2], &roots, &[xi], &proof).unwrap();
}

#[test]
fn test_fri_with_skipped_layers() {
	let mut rng = StdRng::seed_from_u64(1);
	let params = FRIParams::new(11, 1, vec![5, 5], 6, 4).unwrap();
	let batches = generator_point_batches(&mut rng, 2047);
	let xi = Fr::GENERATOR;

	let (roots, proof) = prove_batches(&params, &batches, &[xi]);
	assert_eq!(proof.fri_proof.round_commitments.len(), 2);
	assert!(proof.fri_proof.final_polynomial.len() <= 1 << 1);

	verify_batches(&params, &[1, 3, 1, 2], &roots, &[xi], &proof).unwrap();
}

#[test]
fn test_rotations_and_degree_zero() {
	let mut rng = StdRng::seed_from_u64(2);
	let params = FRIParams::new(5, 2, vec![3, 2], 8, 0).unwrap();
	let xi = Fr::rand(&mut rng);
	let omega = params.domains().base().generator();
	let points = [xi, xi * omega];

	let batches = vec![
		vec![Polynomial::constant(Fr::from(9u64))],
		random_polys(3, 31, &mut rng),
	];
	let (roots, proof) = prove_batches(&params, &batches, &points);
	assert_eq!(proof.evaluations[&0][0], vec![Fr::from(9u64); 2]);

	verify_batches(&params, &[1, 3], &roots, &points, &proof).unwrap();
}

#[test]
fn test_degree_bound() {
	let mut rng = StdRng::seed_from_u64(3);
	let params = FRIParams::new(4, 2, vec![2, 2], 8, 0).unwrap();
	let xi = Fr::rand(&mut rng);

	// the quotient of a degree-16 polynomial by (x - ξ) still fits the FRI bound
	let at_bound = vec![random_polys(1, 16, &mut rng)];
	let (roots, proof) = prove_batches(&params, &at_bound, &[xi]);
	verify_batches(&params, &[1], &roots, &[xi], &proof).unwrap();

	let above_bound = vec![random_polys(1, 17, &mut rng)];
	let (roots, proof) = prove_batches(&params, &above_bound, &[xi]);
	let err = verify_batches(&params, &[1], &roots, &[xi], &proof).unwrap_err();
	assert!(err.is_invalid_proof());
	assert_matches!(
		err,
		Error::Fri(fri::Error::Verification(fri::VerificationError::IncorrectFold { .. }))
	);
}

#[test]
fn test_wrong_evaluation_is_rejected() {
	let mut rng = StdRng::seed_from_u64(4);
	let params = FRIParams::new(4, 1, vec![2, 2], 8, 0).unwrap();
	let xi = Fr::rand(&mut rng);
	let batches = vec![random_polys(2, 15, &mut rng)];

	let (roots, mut proof) = prove_batches(&params, &batches, &[xi]);
	proof.evaluations.get_mut(&0).unwrap()[1][0] += Fr::from(1u64);

	let err = verify_batches(&params, &[2], &roots, &[xi], &proof).unwrap_err();
	assert!(err.is_invalid_proof());
}

#[test]
fn test_malformed_proofs_are_rejected() {
	let mut rng = StdRng::seed_from_u64(5);
	let params = FRIParams::new(4, 1, vec![2, 2], 4, 0).unwrap();
	let xi = Fr::rand(&mut rng);
	let batches = vec![random_polys(1, 15, &mut rng), random_polys(2, 15, &mut rng)];
	let (roots, proof) = prove_batches(&params, &batches, &[xi]);

	let mut missing_evaluation = proof.clone();
	missing_evaluation.evaluations.get_mut(&1).unwrap()[0].clear();
	assert_matches!(
		verify_batches(&params, &[1, 2], &roots, &[xi], &missing_evaluation),
		Err(Error::Verification(VerificationError::IncorrectEvaluationsShape { batch: 1 }))
	);

	let mut missing_batch = proof.clone();
	missing_batch.initial_proofs[0].pop();
	assert_matches!(
		verify_batches(&params, &[1, 2], &roots, &[xi], &missing_batch),
		Err(Error::Verification(VerificationError::IncorrectBatchCount {
			query: 0,
			expected: 2
		}))
	);

	let mut tampered_leaf = proof;
	tampered_leaf.initial_proofs[1][0].values[0] += Fr::from(1u64);
	assert_matches!(
		verify_batches(&params, &[1, 2], &roots, &[xi], &tampered_leaf),
		Err(Error::Verification(VerificationError::InvalidInitialOpening { query: 1, batch: 0 }))
	);
}

#[test]
fn test_fixed_batch_opened_at_eta() {
	let mut rng = StdRng::seed_from_u64(6);
	let params = FRIParams::new(4, 1, vec![2, 1], 8, 0).unwrap();
	let merkle_prover = merkle_prover();

	let fixed_batch = Arc::new(
		CommittedBatch::commit(&params, &merkle_prover, 0, random_polys(3, 15, &mut rng)).unwrap(),
	);
	let fixed_root = fixed_batch.root().clone();
	let fixed = Arc::new(setup_fixed_batches(
		&BTreeMap::from([(0, fixed_batch.clone())]),
		&mut Transcript::new(),
	));
	assert_eq!(fixed.evals[&0].len(), 3);
	assert_eq!(fixed.evals[&0][1], fixed_batch.polys()[1].evaluate(fixed.eta));

	let xi = Fr::rand(&mut rng);
	let mut transcript = Transcript::new();
	let mut prover = LpcProver::new(&params, &merkle_prover);
	prover.add_committed_batch(0, fixed_batch).unwrap();
	prover.set_fixed_data(fixed.clone());
	transcript.observe(&fixed_root);
	let variable_root = prover
		.commit_batch(1, random_polys(2, 15, &mut rng))
		.unwrap();
	transcript.observe(&variable_root);
	prover.append_eval_point(1, 0, xi).unwrap();
	prover.append_eval_point(1, 1, xi).unwrap();
	prover.append_eval_point(0, 2, xi).unwrap();
	assert_eq!(prover.n_opening_terms(), 3 + 3);
	let proof = prover.prove(&mut transcript).unwrap();

	let verify = |fixed: Arc<LpcFixedData<Fr>>| {
		let mut transcript = Transcript::new();
		let mut verifier = LpcVerifier::new(&params, merkle_prover.scheme());
		verifier.add_batch(0, fixed_root.clone(), 3).unwrap();
		verifier.add_batch(1, variable_root.clone(), 2).unwrap();
		verifier.set_fixed_data(fixed);
		transcript.observe(&fixed_root);
		transcript.observe(&variable_root);
		verifier.append_eval_point(1, 0, xi).unwrap();
		verifier.append_eval_point(1, 1, xi).unwrap();
		verifier.append_eval_point(0, 2, xi).unwrap();
		verifier.verify(&proof, &mut transcript)
	};
	verify(fixed.clone()).unwrap();

	let mut wrong_fixed = (*fixed).clone();
	wrong_fixed.evals.get_mut(&0).unwrap()[0] += Fr::from(1u64);
	assert!(verify(Arc::new(wrong_fixed)).unwrap_err().is_invalid_proof());
}

#[test]
fn test_point_enumeration_order() {
	let (a, b) = (Fr::from(10u64), Fr::from(20u64));
	let theta = Fr::from(3u64);
	let points = BTreeMap::from([(0, vec![vec![a], vec![b, a]]), (1, vec![vec![b]])]);
	let evaluations = BTreeMap::from([
		(0, vec![vec![Fr::from(1u64)], vec![Fr::from(2u64), Fr::from(3u64)]]),
		(1, vec![vec![Fr::from(4u64)]]),
	]);

	let groups = combine_openings(&points, &evaluations, None, theta, 2).unwrap();
	assert_eq!(groups.len(), 2);

	assert_eq!(groups[0].point, a);
	let terms = groups[0]
		.terms
		.iter()
		.map(|term| (term.batch, term.poly, term.weight))
		.collect::<Vec<_>>();
	assert_eq!(terms, vec![(0, 0, theta.pow([2u64])), (0, 1, theta.pow([3u64]))]);
	assert_eq!(
		groups[0].claimed,
		theta.pow([2u64]) * Fr::from(1u64) + theta.pow([3u64]) * Fr::from(3u64)
	);

	assert_eq!(groups[1].point, b);
	let terms = groups[1]
		.terms
		.iter()
		.map(|term| (term.batch, term.poly, term.weight))
		.collect::<Vec<_>>();
	assert_eq!(terms, vec![(0, 1, theta.pow([4u64])), (1, 0, theta.pow([5u64]))]);

	assert_eq!(count_opening_terms(&points, None), 4);
}

#[test]
fn test_reconstructed_quotient_matches_prover() {
	let mut rng = StdRng::seed_from_u64(7);
	let params = FRIParams::new(4, 1, vec![2, 2], 1, 0).unwrap();
	let merkle_prover = merkle_prover();
	let xi = Fr::rand(&mut rng);
	let theta = Fr::rand(&mut rng);

	let mut prover = LpcProver::new(&params, &merkle_prover);
	let root = prover
		.commit_batch(0, random_polys(3, 15, &mut rng))
		.unwrap();
	prover.append_eval_point_to_batch(0, xi).unwrap();
	let evaluations = prover.evaluate();
	let quotient = prover.combined_quotient(&evaluations, theta, 0).unwrap();
	let codeword = quotient.evaluate_on(params.domains().base()).unwrap();

	let mut verifier = LpcVerifier::new(&params, merkle_prover.scheme());
	verifier.add_batch(0, root, 3).unwrap();
	verifier.append_eval_point_to_batch(0, xi).unwrap();
	let groups = verifier.combine(&evaluations, theta, 0).unwrap();

	let log_n_cosets = params.round_log_n_cosets(0);
	for index in [0, 3, 7] {
		let initial = prover.prove_initial(&[index]).unwrap();
		let values = verifier
			.reconstruct_quotient(0, index, &initial[0], &groups)
			.unwrap();
		assert_eq!(values, fri::coset_values(&codeword, index, log_n_cosets, 2));
	}
}

#[test]
fn test_proof_serialization_round_trip() {
	let mut rng = StdRng::seed_from_u64(8);
	let params = FRIParams::new(4, 1, vec![2, 2], 4, 2).unwrap();
	let xi = Fr::rand(&mut rng);
	let batches = vec![random_polys(2, 15, &mut rng)];
	let (roots, proof) = prove_batches(&params, &batches, &[xi]);

	let mut bytes = Vec::new();
	proof.serialize(&mut bytes).unwrap();
	let decoded = LpcProof::<Fr, Digest>::deserialize(bytes.as_slice()).unwrap();
	assert_eq!(decoded, proof);

	let mut bytes_again = Vec::new();
	decoded.serialize(&mut bytes_again).unwrap();
	assert_eq!(bytes, bytes_again);

	verify_batches(&params, &[2], &roots, &[xi], &decoded).unwrap();
}

#[test]
fn test_starting_powers_are_disjoint() {
	assert_eq!(starting_powers([3, 5, 2]), vec![0, 3, 8]);
	assert!(starting_powers(Vec::new()).is_empty());
}

/// Two independent provers, each with its own batches and points.
fn aggregated_setup<'a>(
	params: &'a FRIParams<Fr>,
	merkle_prover: &'a TestMerkleProver,
	rng: &mut StdRng,
) -> (Vec<LpcProver<'a, Fr, TestMerkleProver>>, Vec<Vec<(usize, Vec<Fr>)>>) {
	let mut provers = Vec::new();
	let mut layouts = Vec::new();
	for n_batches in [1, 2] {
		let mut prover = LpcProver::new(params, merkle_prover);
		let mut layout = Vec::new();
		for batch in 0..n_batches {
			let n_polys = batch + 2;
			prover
				.commit_batch(batch, random_polys(n_polys, 15, rng))
				.unwrap();
			let points = repeat_with(|| Fr::rand(rng))
				.take(batch + 1)
				.collect::<Vec<_>>();
			for &point in &points {
				prover.append_eval_point_to_batch(batch, point).unwrap();
			}
			layout.push((n_polys, points));
		}
		provers.push(prover);
		layouts.push(layout);
	}
	(provers, layouts)
}

fn aggregated_verifiers<'a>(
	params: &'a FRIParams<Fr>,
	merkle_prover: &'a TestMerkleProver,
	provers: &[LpcProver<'_, Fr, TestMerkleProver>],
	layouts: &[Vec<(usize, Vec<Fr>)>],
) -> Vec<LpcVerifier<'a, Fr, <TestMerkleProver as MerkleTreeProver<Fr>>::Scheme>> {
	provers
		.iter()
		.zip(layouts)
		.map(|(prover, layout)| {
			let mut verifier = LpcVerifier::new(params, merkle_prover.scheme());
			for ((batch, root), (n_polys, points)) in prover.roots().zip(layout) {
				verifier.add_batch(batch, root.clone(), *n_polys).unwrap();
				for &point in points {
					verifier.append_eval_point_to_batch(batch, point).unwrap();
				}
			}
			verifier
		})
		.collect()
}

#[test]
fn test_aggregated_fri_across_two_provers() {
	let mut rng = StdRng::seed_from_u64(9);
	let params = FRIParams::new(4, 1, vec![2, 2], 8, 4).unwrap();
	let merkle_prover = merkle_prover();
	let (provers, layouts) = aggregated_setup(&params, &merkle_prover, &mut rng);
	assert_eq!(provers[0].n_opening_terms(), 2);
	assert_eq!(provers[1].n_opening_terms(), 2 + 3 * 2);

	let prover_refs = provers.iter().collect::<Vec<_>>();
	let proof = AggregatedFriProver::new(&params, &merkle_prover)
		.prove(&prover_refs, &mut Transcript::new())
		.unwrap();
	assert_eq!(proof.provers.len(), 2);

	let verifiers = aggregated_verifiers(&params, &merkle_prover, &provers, &layouts);
	let verifier_refs = verifiers.iter().collect::<Vec<_>>();
	let coordinator = AggregatedFriVerifier::new(&params, merkle_prover.scheme());
	coordinator
		.verify(&verifier_refs, &proof, &mut Transcript::new())
		.unwrap();

	let mut bytes = Vec::new();
	proof.serialize(&mut bytes).unwrap();
	let decoded = AggregatedProof::<Fr, Digest>::deserialize(bytes.as_slice()).unwrap();
	assert_eq!(decoded, proof);

	// both ranges starting at θ^0 no longer match what the provers used
	let err = coordinator
		.verify_with_starting_powers(&verifier_refs, &[0, 0], &proof, &mut Transcript::new())
		.unwrap_err();
	assert!(err.is_invalid_proof());
}

#[test]
fn test_aggregated_parameter_mismatch() {
	let mut rng = StdRng::seed_from_u64(10);
	let params = FRIParams::new(4, 1, vec![2, 2], 8, 0).unwrap();
	let merkle_prover = merkle_prover();
	let (provers, layouts) = aggregated_setup(&params, &merkle_prover, &mut rng);
	let prover_refs = provers.iter().collect::<Vec<_>>();

	// Same domain, different coset size in the first round.
	let other_steps = FRIParams::new(4, 1, vec![1, 3], 8, 0).unwrap();
	assert_eq!(other_steps.domains().base(), params.domains().base());
	let other_domain = FRIParams::new(4, 2, vec![2, 2], 8, 0).unwrap();
	let other_queries = FRIParams::new(4, 1, vec![2, 2], 9, 0).unwrap();
	for other in [&other_steps, &other_domain, &other_queries] {
		assert_matches!(
			AggregatedFriProver::new(other, &merkle_prover)
				.prove(&prover_refs, &mut Transcript::new()),
			Err(Error::ParameterMismatch { participant: 0 })
		);
	}
	assert_matches!(
		AggregatedFriProver::new(&params, &merkle_prover).prove_with_starting_powers(
			&prover_refs,
			&[0],
			&mut Transcript::new()
		),
		Err(Error::IncorrectStartingPowerCount { expected: 2 })
	);

	let proof = AggregatedFriProver::new(&params, &merkle_prover)
		.prove(&prover_refs, &mut Transcript::new())
		.unwrap();
	let verifiers = aggregated_verifiers(&params, &merkle_prover, &provers, &layouts);
	let verifier_refs = verifiers.iter().collect::<Vec<_>>();
	assert_matches!(
		AggregatedFriVerifier::new(&other_steps, merkle_prover.scheme()).verify(
			&verifier_refs,
			&proof,
			&mut Transcript::new()
		),
		Err(Error::ParameterMismatch { participant: 0 })
	);
}
