#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Digest pairs and the default hasher builder.
pub mod digest;

mod error;

pub mod hash_table;

/// Instrumentation hooks.
pub mod probe;

mod slot;

/// Insert-depth statistics and occupancy snapshots.
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
pub mod stats;

mod storage;

#[cfg(any(feature = "std", feature = "foldhash"))]
pub use digest::DefaultHashBuilder;
pub use digest::Digests;
pub use error::AllocError;
pub use hash_table::Handle;
pub use hash_table::HashTable;
pub use probe::NoProbe;
pub use probe::Phase;
pub use probe::Probe;
pub use probe::Shape;
