#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod slot;

/// Hash function objects and the default hasher selection.
pub mod hash;

/// A growable hash table using linear probing with tombstone deletion.
///
/// This module provides [`HashTable`] along with its entry API, iterators
/// and cursors.
pub mod hash_table;

/// A linear-probing hash table with a fixed number of inline slots.
pub mod static_hash_table;

/// A vector with a fixed, inline capacity.
pub mod static_vec;

pub use error::CapacityError;
pub use error::Error;
pub use hash::DefaultHashBuilder;
pub use hash::FnHasher;
pub use hash::KeyHasher;
pub use hash::XorShiftState;
#[cfg(any(test, feature = "stats"))]
pub use hash_table::DebugStats;
pub use hash_table::Entry;
pub use hash_table::HashTable;
pub use static_hash_table::StaticHashTable;
pub use static_vec::StaticVec;
