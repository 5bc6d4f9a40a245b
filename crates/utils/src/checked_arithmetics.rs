// Copyright 2024 Irreducible Inc.

/// Computes `log2(n)` for a power of two `n`, returning `None` otherwise.
pub const fn log2_strict_usize(n: usize) -> Option<usize> {
	if n.is_power_of_two() {
		Some(n.trailing_zeros() as usize)
	} else {
		None
	}
}

/// Computes `ceil(log2(n))`, with `log2_ceil_usize(0) == 0`.
pub const fn log2_ceil_usize(n: usize) -> usize {
	if n <= 1 {
		0
	} else {
		(usize::BITS - (n - 1).leading_zeros()) as usize
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_log2_strict_and_ceil() {
		assert_eq!(log2_strict_usize(1), Some(0));
		assert_eq!(log2_strict_usize(1024), Some(10));
		assert_eq!(log2_strict_usize(12), None);
		assert_eq!(log2_strict_usize(0), None);

		assert_eq!(log2_ceil_usize(0), 0);
		assert_eq!(log2_ceil_usize(1), 0);
		assert_eq!(log2_ceil_usize(2), 1);
		assert_eq!(log2_ceil_usize(3), 2);
		assert_eq!(log2_ceil_usize(4), 2);
		assert_eq!(log2_ceil_usize(5), 3);
	}
}
