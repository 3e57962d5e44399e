use core::fmt::Debug;

/// Errors reported by the tables and the fixed-capacity vector.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested key is not present in the table.
    #[error("key not found")]
    KeyNotFound,

    /// Every slot of a fixed-capacity container is already in use.
    #[error("capacity of {capacity} exceeded")]
    CapacityExceeded {
        /// The fixed capacity of the container.
        capacity: usize,
    },

    /// A resize was requested that cannot hold the live entries.
    ///
    /// Returned by [`HashTable::resize`](crate::HashTable::resize) when the
    /// requested slot count is smaller than the number of entries.
    #[error("cannot resize to {requested} slots while holding {len} entries")]
    InvalidResize {
        /// The slot count that was requested.
        requested: usize,
        /// The number of entries in the table at the time of the request.
        len: usize,
    },
}

/// The error returned by [`StaticVec::try_push`](crate::StaticVec::try_push)
/// and [`StaticVec::try_insert`](crate::StaticVec::try_insert) when the vector
/// is full.
///
/// The rejected element is handed back so the caller keeps ownership of it.
#[derive(thiserror::Error, Clone, Copy, PartialEq, Eq)]
#[error("static vector is full (capacity {capacity})")]
pub struct CapacityError<T> {
    capacity: usize,
    element: T,
}

impl<T> CapacityError<T> {
    pub(crate) const fn new(capacity: usize, element: T) -> Self {
        Self { capacity, element }
    }

    /// Returns the capacity of the vector that rejected the element.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a reference to the rejected element.
    pub fn element(&self) -> &T {
        &self.element
    }

    /// Extracts the rejected element.
    pub fn into_element(self) -> T {
        self.element
    }
}

impl<T> Debug for CapacityError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CapacityError")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
