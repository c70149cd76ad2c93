//! Byte-level codec shared by types, constants, expressions and the tree container.
//!
//! Every structure in this crate is written front to back with [`SigmaWriter`] and read
//! back with the cursor-based [`SigmaReader`]. Integers use the VLQ / zig-zag scheme
//! from [`integer`].
use smallvec::SmallVec;

use crate::utils::Error;

pub mod integer;
pub mod magic;
mod reader;
mod writer;

pub use reader::SigmaReader;
pub use writer::SigmaWriter;

/// A small, stack-allocated-first buffer used by the encoder.
///
/// Backed by `smallvec`, this stores up to 32 bytes inline before spilling to the heap.
pub type DynBuf = SmallVec<[u8; 32]>;

/// Structures with a byte encoding that cannot fail.
pub trait SigmaEncode {
    /// Append the encoding of `self` to `w`.
    fn encode(&self, w: &mut SigmaWriter);

    /// Encode into a fresh byte vector.
    fn to_bytes(&self) -> Vec<u8> {
        let mut w = SigmaWriter::new();
        self.encode(&mut w);
        w.into_bytes()
    }
}

/// Structures that can be decoded from a [`SigmaReader`] without outside context.
pub trait SigmaDecode: Sized {
    /// Decode one value, advancing the reader.
    fn decode(r: &mut SigmaReader<'_>) -> Result<Self, Error>;
}

impl<T: SigmaEncode> SigmaEncode for &T {
    #[inline]
    fn encode(&self, w: &mut SigmaWriter) {
        (*self).encode(w)
    }
}

impl<T: SigmaEncode> SigmaEncode for Box<T> {
    #[inline]
    fn encode(&self, w: &mut SigmaWriter) {
        self.as_ref().encode(w)
    }
}
