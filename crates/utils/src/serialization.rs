// Copyright 2024-2025 Irreducible Inc.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bytes::{Buf, BufMut};
use generic_array::{ArrayLength, GenericArray};

#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
	#[error("Write buffer is full")]
	WriteBufferFull,
	#[error("Not enough data in read buffer to deserialize")]
	NotEnoughBytes,
	#[error("Length prefix {len} exceeds the remaining {remaining} bytes")]
	LengthOverflow { len: u64, remaining: usize },
	#[error("Invalid canonical encoding of a field element")]
	InvalidFieldEncoding,
}

/// Represents type that can be serialized to a byte buffer.
pub trait SerializeBytes {
	fn serialize(&self, write_buf: impl BufMut) -> Result<(), Error>;
}

/// Represents type that can be deserialized from a byte buffer.
pub trait DeserializeBytes {
	fn deserialize(read_buf: impl Buf) -> Result<Self, Error>
	where
		Self: Sized;
}

impl<N: ArrayLength<u8>> SerializeBytes for GenericArray<u8, N> {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		if write_buf.remaining_mut() < N::USIZE {
			return Err(Error::WriteBufferFull);
		}
		write_buf.put_slice(self);
		Ok(())
	}
}

impl<N: ArrayLength<u8>> DeserializeBytes for GenericArray<u8, N> {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		if read_buf.remaining() < N::USIZE {
			return Err(Error::NotEnoughBytes);
		}

		let mut ret = Self::default();
		read_buf.copy_to_slice(&mut ret);
		Ok(ret)
	}
}

impl SerializeBytes for u64 {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		if write_buf.remaining_mut() < 8 {
			return Err(Error::WriteBufferFull);
		}
		write_buf.put_u64_le(*self);
		Ok(())
	}
}

impl DeserializeBytes for u64 {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		if read_buf.remaining() < 8 {
			return Err(Error::NotEnoughBytes);
		}
		Ok(read_buf.get_u64_le())
	}
}

impl SerializeBytes for u32 {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		if write_buf.remaining_mut() < 4 {
			return Err(Error::WriteBufferFull);
		}
		write_buf.put_u32_le(*self);
		Ok(())
	}
}

impl DeserializeBytes for u32 {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		if read_buf.remaining() < 4 {
			return Err(Error::NotEnoughBytes);
		}
		Ok(read_buf.get_u32_le())
	}
}

/// `usize` goes over the wire as a little-endian `u64`.
impl SerializeBytes for usize {
	fn serialize(&self, write_buf: impl BufMut) -> Result<(), Error> {
		(*self as u64).serialize(write_buf)
	}
}

impl DeserializeBytes for usize {
	fn deserialize(read_buf: impl Buf) -> Result<Self, Error> {
		let value = u64::deserialize(read_buf)?;
		usize::try_from(value).map_err(|_| Error::LengthOverflow {
			len: value,
			remaining: 0,
		})
	}
}

impl<T: SerializeBytes> SerializeBytes for Vec<T> {
	fn serialize(&self, mut write_buf: impl BufMut) -> Result<(), Error> {
		self.len().serialize(&mut write_buf)?;
		for item in self {
			item.serialize(&mut write_buf)?;
		}
		Ok(())
	}
}

impl<T: DeserializeBytes> DeserializeBytes for Vec<T> {
	fn deserialize(mut read_buf: impl Buf) -> Result<Self, Error> {
		let len = read_length_prefix(&mut read_buf)?;
		(0..len).map(|_| T::deserialize(&mut read_buf)).collect()
	}
}

/// Reads a `u64` length prefix, rejecting lengths that cannot fit into the rest of the buffer.
///
/// Every serialized item takes at least one byte, so a prefix larger than the number of remaining
/// bytes is malformed and is rejected before any allocation happens.
pub fn read_length_prefix(mut read_buf: impl Buf) -> Result<usize, Error> {
	let len = u64::deserialize(&mut read_buf)?;
	if len > read_buf.remaining() as u64 {
		return Err(Error::LengthOverflow {
			len,
			remaining: read_buf.remaining(),
		});
	}
	Ok(len as usize)
}

/// Writes a value in its arkworks canonical (compressed) encoding.
pub fn serialize_canonical<T: CanonicalSerialize>(
	value: &T,
	mut write_buf: impl BufMut,
) -> Result<(), Error> {
	if write_buf.remaining_mut() < value.compressed_size() {
		return Err(Error::WriteBufferFull);
	}
	value
		.serialize_compressed((&mut write_buf).writer())
		.map_err(|_| Error::WriteBufferFull)
}

/// Reads a value from its arkworks canonical (compressed) encoding.
pub fn deserialize_canonical<T: CanonicalDeserialize>(mut read_buf: impl Buf) -> Result<T, Error> {
	if !read_buf.has_remaining() {
		return Err(Error::NotEnoughBytes);
	}
	T::deserialize_compressed((&mut read_buf).reader()).map_err(|err| match err {
		ark_serialize::SerializationError::IoError(_) => Error::NotEnoughBytes,
		_ => Error::InvalidFieldEncoding,
	})
}

/// Writes a length-prefixed slice of canonically encoded values.
pub fn serialize_canonical_slice<T: CanonicalSerialize>(
	values: &[T],
	mut write_buf: impl BufMut,
) -> Result<(), Error> {
	values.len().serialize(&mut write_buf)?;
	for value in values {
		serialize_canonical(value, &mut write_buf)?;
	}
	Ok(())
}

/// Reads a length-prefixed vector of canonically encoded values.
pub fn deserialize_canonical_vec<T: CanonicalDeserialize>(
	mut read_buf: impl Buf,
) -> Result<Vec<T>, Error> {
	let len = read_length_prefix(&mut read_buf)?;
	(0..len)
		.map(|_| deserialize_canonical(&mut read_buf))
		.collect()
}
