// Copyright 2024 Irreducible Inc.

//! One FRI proof for the openings of several independent LPC provers.
//!
//! Every prover builds its own combined quotient `Q_i` with a θ-power range disjoint from the
//! others, so that `Σ Q_i` uses each power exactly once. A coordinator transcript absorbs all batch
//! roots and claimed evaluations before θ is drawn, runs FRI on the sum, and each prover opens its
//! own batch trees at the shared query indices.

use ark_ff::{FftField, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bytes::{Buf, BufMut};
use placeholder_math::Polynomial;
use placeholder_utils::{
	bail, serialization::read_length_prefix, DeserializeBytes, SerializationError,
	SerializeBytes,
};
use tracing::instrument;

use super::{
	common::{
		deserialize_batch_points, deserialize_openings, observe_evaluations,
		serialize_batch_points, serialize_openings, BatchPoints, InitialProof,
	},
	error::{Error, VerificationError},
	prove::LpcProver,
	verify::LpcVerifier,
};
use crate::{
	fiat_shamir::{CanSample, Challenger},
	merkle_tree::{MerkleTreeProver, MerkleTreeScheme, ProverDigest},
	protocols::fri::{self, FRIParams, FRIProof, FRIVerifier},
	transcript::Transcript,
};

/// The contribution of one prover to an [`AggregatedProof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedProverProof<F, Digest> {
	pub evaluations: BatchPoints<F>,
	/// Per query, the opening of every batch tree of this prover.
	pub initial_proofs: Vec<Vec<InitialProof<F, Digest>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedProof<F, Digest> {
	pub provers: Vec<AggregatedProverProof<F, Digest>>,
	pub fri_proof: FRIProof<F, Digest>,
}

/// Returns the first θ power of every prover, given how many powers each consumes.
pub fn starting_powers(n_terms: impl IntoIterator<Item = usize>) -> Vec<u64> {
	n_terms
		.into_iter()
		.scan(0u64, |next, count| {
			let start = *next;
			*next += count as u64;
			Some(start)
		})
		.collect()
}

/// Every participant must share the coordinator's FRI parameters and own exactly one starting
/// power.
fn check_participants<'p, F: FftField + 'p>(
	params: &FRIParams<F>,
	participants: impl ExactSizeIterator<Item = &'p FRIParams<F>>,
	starting_powers: &[u64],
) -> Result<(), Error> {
	if starting_powers.len() != participants.len() {
		bail!(Error::IncorrectStartingPowerCount {
			expected: participants.len(),
		});
	}
	for (participant, participant_params) in participants.enumerate() {
		if participant_params != params {
			bail!(Error::ParameterMismatch { participant });
		}
	}
	Ok(())
}

/// Coordinates the aggregated FRI on the prover side.
pub struct AggregatedFriProver<'a, F, MerkleProver>
where
	F: FftField,
	MerkleProver: MerkleTreeProver<F>,
{
	params: &'a FRIParams<F>,
	merkle_prover: &'a MerkleProver,
}

impl<'a, F, MerkleProver> AggregatedFriProver<'a, F, MerkleProver>
where
	F: FftField + PrimeField,
	MerkleProver: MerkleTreeProver<F>,
{
	pub fn new(params: &'a FRIParams<F>, merkle_prover: &'a MerkleProver) -> Self {
		Self {
			params,
			merkle_prover,
		}
	}

	/// Proves the openings of all provers with consecutive θ-power ranges.
	pub fn prove<C: Challenger>(
		&self,
		provers: &[&LpcProver<'_, F, MerkleProver>],
		transcript: &mut Transcript<C>,
	) -> Result<AggregatedProof<F, ProverDigest<F, MerkleProver>>, Error> {
		let powers = starting_powers(provers.iter().map(|prover| prover.n_opening_terms()));
		self.prove_with_starting_powers(provers, &powers, transcript)
	}

	#[instrument(skip_all, name = "lpc::aggregated::prove", level = "debug")]
	pub fn prove_with_starting_powers<C: Challenger>(
		&self,
		provers: &[&LpcProver<'_, F, MerkleProver>],
		starting_powers: &[u64],
		transcript: &mut Transcript<C>,
	) -> Result<AggregatedProof<F, ProverDigest<F, MerkleProver>>, Error> {
		check_participants(
			self.params,
			provers.iter().map(|prover| prover.params()),
			starting_powers,
		)?;

		let evaluations = provers
			.iter()
			.map(|prover| prover.evaluate())
			.collect::<Vec<_>>();
		for (prover, evals) in provers.iter().zip(&evaluations) {
			for (batch, root) in prover.roots() {
				transcript.observe(&batch);
				transcript.observe(root);
			}
			observe_evaluations(transcript, evals);
		}
		let theta: F = transcript.sample();

		let mut quotient = Polynomial::zero();
		for ((prover, evals), &starting_power) in provers.iter().zip(&evaluations).zip(starting_powers)
		{
			quotient += &prover.combined_quotient(evals, theta, starting_power)?;
		}

		let codeword = quotient.evaluate_on(self.params.domains().base())?;
		let (fri_proof, query_indices) =
			fri::prove(self.params, self.merkle_prover, codeword, transcript)?;

		let provers = provers
			.iter()
			.zip(evaluations)
			.map(|(prover, evaluations)| {
				Ok(AggregatedProverProof {
					evaluations,
					initial_proofs: prover.prove_initial(&query_indices)?,
				})
			})
			.collect::<Result<Vec<_>, Error>>()?;

		Ok(AggregatedProof {
			provers,
			fri_proof,
		})
	}
}

/// Coordinates the aggregated FRI on the verifier side.
pub struct AggregatedFriVerifier<'a, F, VCS>
where
	F: FftField,
	VCS: MerkleTreeScheme<F>,
{
	params: &'a FRIParams<F>,
	vcs: &'a VCS,
}

impl<'a, F, VCS> AggregatedFriVerifier<'a, F, VCS>
where
	F: FftField + PrimeField,
	VCS: MerkleTreeScheme<F>,
{
	pub fn new(params: &'a FRIParams<F>, vcs: &'a VCS) -> Self {
		Self { params, vcs }
	}

	pub fn verify<C: Challenger>(
		&self,
		verifiers: &[&LpcVerifier<'_, F, VCS>],
		proof: &AggregatedProof<F, VCS::Digest>,
		transcript: &mut Transcript<C>,
	) -> Result<(), Error> {
		let powers = starting_powers(verifiers.iter().map(|verifier| verifier.n_opening_terms()));
		self.verify_with_starting_powers(verifiers, &powers, proof, transcript)
	}

	#[instrument(skip_all, name = "lpc::aggregated::verify", level = "debug")]
	pub fn verify_with_starting_powers<C: Challenger>(
		&self,
		verifiers: &[&LpcVerifier<'_, F, VCS>],
		starting_powers: &[u64],
		proof: &AggregatedProof<F, VCS::Digest>,
		transcript: &mut Transcript<C>,
	) -> Result<(), Error> {
		check_participants(
			self.params,
			verifiers.iter().map(|verifier| verifier.params()),
			starting_powers,
		)?;
		if proof.provers.len() != verifiers.len() {
			bail!(VerificationError::IncorrectProverCount {
				expected: verifiers.len(),
			});
		}

		for (verifier, prover_proof) in verifiers.iter().zip(&proof.provers) {
			for (batch, root) in verifier.roots() {
				transcript.observe(batch);
				transcript.observe(root);
			}
			observe_evaluations(transcript, &prover_proof.evaluations);
		}
		let theta: F = transcript.sample();

		let groups = verifiers
			.iter()
			.zip(&proof.provers)
			.zip(starting_powers)
			.map(|((verifier, prover_proof), &starting_power)| {
				verifier.combine(&prover_proof.evaluations, theta, starting_power)
			})
			.collect::<Result<Vec<_>, _>>()?;

		let fri_proof = &proof.fri_proof;
		let (fri_verifier, query_indices) = FRIVerifier::verify_commit_phase(
			self.params,
			self.vcs,
			&fri_proof.round_commitments,
			&fri_proof.final_polynomial,
			fri_proof.nonce,
			transcript,
		)?;

		if fri_proof.query_proofs.len() != query_indices.len() {
			bail!(fri::Error::from(fri::VerificationError::IncorrectQueryCount {
				expected: query_indices.len(),
			}));
		}
		if proof
			.provers
			.iter()
			.any(|prover_proof| prover_proof.initial_proofs.len() != query_indices.len())
		{
			bail!(VerificationError::IncorrectInitialProofCount {
				expected: query_indices.len(),
			});
		}

		let coset_size = 1 << self.params.step_list()[0];
		for (query, (&index, query_proof)) in
			query_indices.iter().zip(&fri_proof.query_proofs).enumerate()
		{
			let mut quotient = vec![F::zero(); coset_size];
			for ((verifier, prover_proof), groups) in
				verifiers.iter().zip(&proof.provers).zip(&groups)
			{
				let partial = verifier.reconstruct_quotient(
					query,
					index,
					&prover_proof.initial_proofs[query],
					groups,
				)?;
				for (acc, value) in quotient.iter_mut().zip(partial) {
					*acc += value;
				}
			}
			fri_verifier.verify_query(index, query_proof, Some(&quotient))?;
		}
		Ok(())
	}
}

impl<F, Digest> SerializeBytes for AggregatedProof<F, Digest>
where
	F: CanonicalSerialize,
	Digest: SerializeBytes,
{
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), SerializationError> {
		self.provers.len().serialize(&mut write_buf)?;
		for prover in &self.provers {
			serialize_batch_points(&prover.evaluations, &mut write_buf)?;
			prover.initial_proofs.serialize(&mut write_buf)?;
		}
		serialize_openings(&self.fri_proof, &[], &mut write_buf)
	}
}

impl<F, Digest> DeserializeBytes for AggregatedProof<F, Digest>
where
	F: CanonicalDeserialize,
	Digest: DeserializeBytes,
{
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, SerializationError> {
		let n_provers = read_length_prefix(&mut read_buf)?;
		let provers = (0..n_provers)
			.map(|_| {
				Ok(AggregatedProverProof {
					evaluations: deserialize_batch_points(&mut read_buf)?,
					initial_proofs: Vec::deserialize(&mut read_buf)?,
				})
			})
			.collect::<Result<Vec<_>, SerializationError>>()?;
		let (fri_proof, _) = deserialize_openings(&mut read_buf)?;
		Ok(Self {
			provers,
			fri_proof,
		})
	}
}
