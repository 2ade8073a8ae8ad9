//! Digest generation for table keys.
//!
//! Every key is addressed by two 32-bit digests. Both are taken from a single
//! 64-bit hash produced by the table's [`BuildHasher`]: the low half becomes
//! `h1` and the high half `h2`.

use core::hash::BuildHasher;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is given explicitly.
        ///
        /// A fixed-seed foldhash, so that a given sequence of operations
        /// always produces the same table layout.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is given explicitly.
        pub type DefaultHashBuilder = std::hash::RandomState;
    }
}

/// The two digests that address a key.
///
/// `h1` and `h2` never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digests {
    /// Digest addressing the first candidate bin.
    pub h1: u32,
    /// Digest addressing the second candidate bin.
    pub h2: u32,
}

impl Digests {
    /// Builds a digest pair, inverting `h2` if it coincides with `h1`.
    #[inline]
    pub fn new(h1: u32, h2: u32) -> Self {
        if h1 == h2 {
            Digests { h1, h2: !h2 }
        } else {
            Digests { h1, h2 }
        }
    }

    /// Splits a 64-bit hash into a digest pair.
    #[inline]
    pub fn from_hash(hash: u64) -> Self {
        Self::new(hash as u32, (hash >> 32) as u32)
    }

    /// Hashes `key` with a hasher from `hash_builder`.
    ///
    /// Only the key bytes are written, without a length prefix.
    #[inline]
    pub fn compute<S: BuildHasher>(hash_builder: &S, key: &[u8]) -> Self {
        let mut hasher = hash_builder.build_hasher();
        hasher.write(key);
        Self::from_hash(hasher.finish())
    }
}
