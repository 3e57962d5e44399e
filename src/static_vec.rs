use core::fmt::Debug;
use core::hash::Hash;
use core::hash::Hasher;
use core::iter::FusedIterator;
use core::mem::ManuallyDrop;
use core::mem::MaybeUninit;
use core::ops::Bound;
use core::ops::Deref;
use core::ops::DerefMut;
use core::ops::RangeBounds;
use core::ptr;
use core::slice;

use crate::error::CapacityError;
use crate::error::Error;

/// A vector with a fixed, inline capacity of `N` elements.
///
/// Elements live directly inside the value; nothing is ever allocated or
/// reallocated. Slice methods (indexing, `first`, `last`, `iter`,
/// `get_unchecked`, sorting) come through `Deref<Target = [T]>`.
///
/// Methods that cannot fail by construction panic when the vector is full,
/// like indexing out of bounds would. Each has a `try_` counterpart that
/// reports the overflow instead.
///
/// # Examples
///
/// ```rust
/// use linprobe::StaticVec;
///
/// let mut v: StaticVec<u32, 4> = StaticVec::new();
/// v.push(1);
/// v.push(2);
/// v.push(3);
/// assert_eq!(v.remaining_capacity(), 1);
///
/// v.erase(..1);
/// assert_eq!(v.as_slice(), &[2, 3]);
///
/// v.push(4);
/// v.push(5);
/// let err = v.try_push(6).unwrap_err();
/// assert_eq!(err.into_element(), 6);
/// ```
pub struct StaticVec<T, const N: usize> {
    data: [MaybeUninit<T>; N],
    len: usize,
}

impl<T, const N: usize> StaticVec<T, N> {
    /// Creates an empty vector.
    pub const fn new() -> Self {
        Self {
            data: [const { MaybeUninit::uninit() }; N],
            len: 0,
        }
    }

    /// Returns the number of elements.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns `true` if no more elements fit.
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Returns how many more elements fit.
    pub const fn remaining_capacity(&self) -> usize {
        N - self.len
    }

    /// Returns the elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` elements are initialized.
        unsafe { slice::from_raw_parts(self.data.as_ptr().cast::<T>(), self.len) }
    }

    /// Returns the elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: The first `len` elements are initialized.
        unsafe { slice::from_raw_parts_mut(self.data.as_mut_ptr().cast::<T>(), self.len) }
    }

    /// Appends `value` and returns a reference to it.
    ///
    /// # Panics
    ///
    /// Panics if the vector is full.
    pub fn push(&mut self, value: T) -> &mut T {
        match self.try_push(value) {
            Ok(value) => value,
            Err(err) => panic!("StaticVec capacity of {} exceeded", err.capacity()),
        }
    }

    /// Appends `value`, or hands it back inside the error if the vector is
    /// full.
    pub fn try_push(&mut self, value: T) -> Result<&mut T, CapacityError<T>> {
        if self.len == N {
            return Err(CapacityError::new(N, value));
        }

        let slot = &mut self.data[self.len];
        self.len += 1;
        Ok(slot.write(value))
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        // SAFETY: The element at the old `len - 1` was initialized and is now
        // outside the live range.
        Some(unsafe { self.data[self.len].assume_init_read() })
    }

    /// Inserts `value` at `index`, shifting later elements right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len` or if the vector is full.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        match self.try_insert(index, value) {
            Ok(value) => value,
            Err(err) => panic!("StaticVec capacity of {} exceeded", err.capacity()),
        }
    }

    /// Inserts `value` at `index`, or hands it back inside the error if the
    /// vector is full.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<&mut T, CapacityError<T>> {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );
        if self.len == N {
            return Err(CapacityError::new(N, value));
        }

        // SAFETY: `index <= len < N`, so both ranges of the shift stay inside the
        // array, and slot `index` is overwritten right after.
        unsafe {
            let base = self.data.as_mut_ptr().cast::<T>();
            ptr::copy(base.add(index), base.add(index + 1), self.len - index);
        }
        self.len += 1;
        Ok(self.data[index].write(value))
    }

    /// Removes and returns the element at `index`, shifting later elements
    /// left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index (is {index}) should be < len (is {})",
            self.len
        );

        // SAFETY: `index < len`, so the element is initialized; the tail is
        // shifted over it before `len` shrinks.
        unsafe {
            let base = self.data.as_mut_ptr().cast::<T>();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(index + 1), base.add(index), self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Removes and returns the element at `index`, moving the last element
    /// into its place.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "swap_remove index (is {index}) should be < len (is {})",
            self.len
        );

        let last = self.len - 1;
        self.as_mut_slice().swap(index, last);
        self.len = last;
        // SAFETY: The element was initialized and is now outside the live range.
        unsafe { self.data[last].assume_init_read() }
    }

    /// Drops the elements in `range` and shifts the tail left to close the
    /// gap. Order is preserved and the length shrinks by the range length.
    ///
    /// # Panics
    ///
    /// Panics if the range is decreasing or extends past `len`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::StaticVec;
    ///
    /// let mut v: StaticVec<char, 8> = "abcdef".chars().collect();
    /// v.erase(1..3);
    /// assert_eq!(v.as_slice(), &['a', 'd', 'e', 'f']);
    /// ```
    pub fn erase(&mut self, range: impl RangeBounds<usize>) {
        let len = self.len;
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end + 1,
            Bound::Excluded(&end) => end,
            Bound::Unbounded => len,
        };
        assert!(start <= end, "erase range starts at {start} but ends at {end}");
        assert!(end <= len, "erase range end {end} out of range for length {len}");

        // A panicking destructor leaks the tail instead of exposing dropped
        // elements.
        self.len = start;
        // SAFETY: `start..end` is initialized and dropped exactly once; the tail
        // `end..len` is moved down over it.
        unsafe {
            let base = self.data.as_mut_ptr().cast::<T>();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(start), end - start));
            ptr::copy(base.add(end), base.add(start), len - end);
        }
        self.len = len - (end - start);
    }

    /// Drops every element past the first `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let old_len = self.len;
        self.len = len;
        // SAFETY: `len..old_len` is initialized and now outside the live range.
        unsafe {
            let base = self.data.as_mut_ptr().cast::<T>();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(len), old_len - len));
        }
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        self.truncate(0);
    }
}

impl<T: Default, const N: usize> StaticVec<T, N> {
    /// Creates a vector holding `len` default values.
    ///
    /// # Panics
    ///
    /// Panics if `len > N`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::StaticVec;
    ///
    /// let v: StaticVec<u8, 8> = StaticVec::with_len(3);
    /// assert_eq!(v.as_slice(), &[0, 0, 0]);
    /// assert_eq!(v.remaining_capacity(), 5);
    /// ```
    pub fn with_len(len: usize) -> Self {
        assert!(len <= N, "StaticVec capacity of {N} exceeded");
        let mut vec = Self::new();
        for _ in 0..len {
            vec.push(T::default());
        }
        vec
    }
}

impl<T: Clone, const N: usize> StaticVec<T, N> {
    /// Creates a vector holding `count` clones of `elem`.
    ///
    /// # Panics
    ///
    /// Panics if `count > N`.
    pub fn from_elem(elem: T, count: usize) -> Self {
        assert!(count <= N, "StaticVec capacity of {N} exceeded");
        let mut vec = Self::new();
        for _ in 0..count {
            vec.push(elem.clone());
        }
        vec
    }

    /// Appends clones of every element of `other`.
    ///
    /// Fails with [`Error::CapacityExceeded`] without appending anything if
    /// they do not all fit.
    pub fn try_extend_from_slice(&mut self, other: &[T]) -> Result<(), Error> {
        if other.len() > self.remaining_capacity() {
            return Err(Error::CapacityExceeded { capacity: N });
        }

        for value in other {
            self.push(value.clone());
        }
        Ok(())
    }
}

impl<T, const N: usize> Drop for StaticVec<T, N> {
    fn drop(&mut self) {
        // SAFETY: The live elements are dropped once; the array itself has no
        // drop glue.
        unsafe { ptr::drop_in_place(self.as_mut_slice()) };
    }
}

impl<T, const N: usize> Default for StaticVec<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for StaticVec<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for StaticVec<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> AsRef<[T]> for StaticVec<T, N> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Clone, const N: usize> Clone for StaticVec<T, N> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: Debug, const N: usize> Debug for StaticVec<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, const N: usize, const M: usize> PartialEq<StaticVec<U, M>> for StaticVec<T, N>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &StaticVec<U, M>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, const N: usize> PartialEq<[U]> for StaticVec<T, N>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, const N: usize> Eq for StaticVec<T, N> {}

impl<T: Hash, const N: usize> Hash for StaticVec<T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T, const N: usize> From<[T; N]> for StaticVec<T, N> {
    fn from(values: [T; N]) -> Self {
        let values = ManuallyDrop::new(values);
        // SAFETY: `[T; N]` and `[MaybeUninit<T>; N]` have the same layout, and
        // `values` is never dropped, so every element has exactly one owner.
        let data = unsafe { ptr::read(ptr::from_ref(&*values).cast::<[MaybeUninit<T>; N]>()) };
        Self { data, len: N }
    }
}

impl<T, const N: usize> FromIterator<T> for StaticVec<T, N> {
    /// Collects into a new vector.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields more than `N` elements.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::new();
        vec.extend(iter);
        vec
    }
}

impl<T, const N: usize> Extend<T> for StaticVec<T, N> {
    /// # Panics
    ///
    /// Panics if the vector fills up before the iterator is exhausted.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a StaticVec<T, N> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a mut StaticVec<T, N> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, const N: usize> IntoIterator for StaticVec<T, N> {
    type Item = T;
    type IntoIter = IntoIter<T, N>;

    fn into_iter(self) -> Self::IntoIter {
        let vec = ManuallyDrop::new(self);
        // SAFETY: `vec` is never dropped, so ownership of the live elements moves
        // into the iterator exactly once.
        let data = unsafe { ptr::read(&vec.data) };
        IntoIter {
            data,
            start: 0,
            end: vec.len,
        }
    }
}

/// An owning iterator over the elements of a [`StaticVec`].
pub struct IntoIter<T, const N: usize> {
    data: [MaybeUninit<T>; N],
    start: usize,
    end: usize,
}

impl<T, const N: usize> IntoIter<T, N> {
    /// Returns the elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `start..end` holds the initialized, not yet yielded elements.
        unsafe {
            slice::from_raw_parts(
                self.data.as_ptr().cast::<T>().add(self.start),
                self.end - self.start,
            )
        }
    }
}

impl<T, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }

        let index = self.start;
        self.start += 1;
        // SAFETY: `index` was in the live range and no longer is.
        Some(unsafe { self.data[index].assume_init_read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }
}

impl<T, const N: usize> DoubleEndedIterator for IntoIter<T, N> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }

        self.end -= 1;
        // SAFETY: `end` was in the live range and no longer is.
        Some(unsafe { self.data[self.end].assume_init_read() })
    }
}

impl<T, const N: usize> ExactSizeIterator for IntoIter<T, N> {}

impl<T, const N: usize> FusedIterator for IntoIter<T, N> {}

impl<T, const N: usize> Drop for IntoIter<T, N> {
    fn drop(&mut self) {
        // SAFETY: `start..end` holds the elements not yet yielded.
        unsafe {
            let base = self.data.as_mut_ptr().cast::<T>();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                base.add(self.start),
                self.end - self.start,
            ));
        }
    }
}

impl<T: Debug, const N: usize> Debug for IntoIter<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
