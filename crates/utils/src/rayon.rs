// Copyright 2024 Irreducible Inc.

use std::{env, sync::OnceLock};

/// Configures the global rayon thread pool from `RAYON_NUM_THREADS`.
///
/// The requested thread count is rounded down to a power of two, since the parallel loops of the
/// prover split their work into power-of-two sized chunks. With a single thread the pool runs on
/// the current thread, which keeps profiles and debugging sessions free of scheduler noise.
///
/// NOTE: rayon doesn't allow initializing global thread pool several times, so
/// in case when it was initialized before this function returns an error.
/// The typical usage of the function is to place it's call in the beginning of the `main`.
/// The function returns reference to the result because `ThreadPoolBuildError`
/// doesn't implement `Clone`.
pub fn adjust_thread_pool() -> &'static Result<(), rayon::ThreadPoolBuildError> {
	static ONCE_GUARD: OnceLock<Result<(), rayon::ThreadPoolBuildError>> = OnceLock::new();

	ONCE_GUARD.get_or_init(|| {
		// We cannot use `rayon::get_current_threads` because it would force the global thread pool
		// to initialize, so we won't be able to override it.
		match env::var("RAYON_NUM_THREADS")
			.ok()
			.and_then(|v| v.parse::<usize>().ok())
		{
			Some(1) => rayon::ThreadPoolBuilder::new()
				.num_threads(1)
				.use_current_thread()
				.build_global(),
			Some(n) if n > 1 => rayon::ThreadPoolBuilder::new()
				.num_threads(1 << n.ilog2())
				.build_global(),
			_ => Ok(()),
		}
	})
}

/// Returns the base-2 logarithm of the number of threads that should be used for the task
pub fn get_log_max_threads() -> usize {
	(2 * rayon::current_num_threads() - 1).ilog2() as _
}

/// Chooses a power-of-two chunk length for splitting `len` items between the pool threads.
///
/// Each thread gets a few chunks to balance uneven work, and no chunk is shorter than
/// `min_chunk_len` unless `len` itself is shorter.
pub fn parallel_chunk_len(len: usize, min_chunk_len: usize) -> usize {
	let n_chunks = 1usize << (get_log_max_threads() + 2);
	len.div_ceil(n_chunks)
		.max(min_chunk_len)
		.min(len)
		.max(1)
		.next_power_of_two()
}
