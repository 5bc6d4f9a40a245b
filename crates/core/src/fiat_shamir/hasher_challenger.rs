// Copyright 2024 Irreducible Inc.

use std::{cmp::min, mem};

use bytes::{buf::UninitSlice, Buf, BufMut};
use digest::{
	core_api::{Block, BlockSizeUser},
	Digest, FixedOutputReset, Output,
};

use super::Challenger;

/// Challenger interface over hashes that implement the [`Digest`] trait.
///
/// Observed bytes are absorbed into a running hasher. Sampling finalizes the hasher and feeds the
/// digest forward into the reset state, so every sampled block depends on everything observed and
/// sampled before it. Unread bytes of a sampled block are discarded as soon as new data is
/// observed.
#[derive(Debug, Clone)]
pub struct HasherChallenger<H: Digest + BlockSizeUser> {
	sampler: HasherSampler<H>,
	observer: HasherObserver<H>,
	sampling: bool,
}

impl<H> Default for HasherChallenger<H>
where
	H: Digest + BlockSizeUser + Default,
{
	fn default() -> Self {
		Self {
			sampler: HasherSampler {
				index: 0,
				buffer: Output::<H>::default(),
				hasher: H::default(),
			},
			observer: HasherObserver {
				index: 0,
				block: Block::<H>::default(),
				hasher: H::default(),
			},
			sampling: false,
		}
	}
}

impl<H> Challenger for HasherChallenger<H>
where
	H: Digest + BlockSizeUser + FixedOutputReset + Default,
{
	fn sampler(&mut self) -> &mut impl Buf {
		if !self.sampling {
			self.observer.flush();
			self.sampler.hasher = mem::take(&mut self.observer.hasher);
			self.sampler.fill_buffer();
			self.sampling = true;
		}
		&mut self.sampler
	}

	fn observer(&mut self) -> &mut impl BufMut {
		if self.sampling {
			self.observer.hasher = mem::take(&mut self.sampler.hasher);
			self.sampling = false;
		}
		&mut self.observer
	}
}

#[derive(Debug, Clone)]
struct HasherSampler<H: Digest> {
	/// Invariant: `index` is always strictly less than the digest size.
	index: usize,
	buffer: Output<H>,
	hasher: H,
}

impl<H: Digest + FixedOutputReset> HasherSampler<H> {
	fn fill_buffer(&mut self) {
		let digest = Digest::finalize_reset(&mut self.hasher);

		// feed forward to the empty state
		Digest::update(&mut self.hasher, &digest);

		self.buffer = digest;
		self.index = 0;
	}
}

impl<H: Digest + FixedOutputReset> Buf for HasherSampler<H> {
	fn remaining(&self) -> usize {
		usize::MAX
	}

	fn chunk(&self) -> &[u8] {
		&self.buffer[self.index..]
	}

	fn advance(&mut self, mut cnt: usize) {
		while cnt > 0 {
			let step = min(self.buffer.len() - self.index, cnt);
			self.index += step;
			cnt -= step;
			if self.index == self.buffer.len() {
				self.fill_buffer();
			}
		}
	}
}

#[derive(Debug, Clone)]
struct HasherObserver<H: Digest + BlockSizeUser> {
	/// Invariant: `index` is always strictly less than the block size.
	index: usize,
	block: Block<H>,
	hasher: H,
}

impl<H: Digest + BlockSizeUser> HasherObserver<H> {
	fn flush(&mut self) {
		Digest::update(&mut self.hasher, &self.block[..self.index]);
		self.index = 0;
	}
}

unsafe impl<H: Digest + BlockSizeUser> BufMut for HasherObserver<H> {
	fn remaining_mut(&self) -> usize {
		usize::MAX
	}

	unsafe fn advance_mut(&mut self, mut cnt: usize) {
		while cnt > 0 {
			let step = min(<H as BlockSizeUser>::block_size() - self.index, cnt);
			cnt -= step;
			self.index += step;
			if self.index == <H as BlockSizeUser>::block_size() {
				self.flush();
			}
		}
	}

	fn chunk_mut(&mut self) -> &mut UninitSlice {
		let buffer = &mut self.block[self.index..];
		buffer.into()
	}
}
