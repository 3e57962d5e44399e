use core::borrow::Borrow;
use core::fmt::Debug;
use core::mem::MaybeUninit;

use crate::error::Error;
use crate::hash::DefaultHashBuilder;
use crate::hash::KeyHasher;
use crate::hash_table::Iter;
use crate::hash_table::IterMut;
use crate::hash_table::Keys;
use crate::hash_table::Values;
use crate::slot;
use crate::slot::Probe;
use crate::slot::SlotState;

/// A linear-probing hash table with `N` inline slots.
///
/// `StaticHashTable` follows the same probing and tombstone rules as
/// [`HashTable`](crate::HashTable), but its slots live inside the value and
/// it never grows. Every slot may hold an entry, so an insertion of a new key
/// fails with [`Error::CapacityExceeded`] only when all `N` slots are active.
/// Tombstones are reused by later insertions and reset by
/// [`clear`](Self::clear).
///
/// `N` must be greater than zero; this is checked at compile time.
///
/// # Examples
///
/// ```rust
/// use linprobe::Error;
/// use linprobe::StaticHashTable;
///
/// let mut table: StaticHashTable<i32, i32, 2> = StaticHashTable::new();
/// *table.get_or_insert_default(2)? = 0;
/// *table.get_or_insert_default(4)? = 0;
/// assert_eq!(table.insert(8, 0), Err(Error::CapacityExceeded { capacity: 2 }));
///
/// table.remove(&2);
/// *table.get_or_insert_default(1)? = 1;
/// assert_eq!(table.at(&1), Ok(&1));
/// # Ok::<(), Error>(())
/// ```
pub struct StaticHashTable<K, V, const N: usize, S = DefaultHashBuilder> {
    states: [SlotState; N],
    slots: [MaybeUninit<(K, V)>; N],
    len: usize,
    tombstones: usize,
    hash_builder: S,
}

impl<K, V, const N: usize> StaticHashTable<K, V, N, DefaultHashBuilder> {
    /// Creates an empty table using the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, const N: usize, S> StaticHashTable<K, V, N, S> {
    /// Creates an empty table that hashes keys with `hash_builder`.
    pub const fn with_hasher(hash_builder: S) -> Self {
        const { assert!(N > 0, "StaticHashTable needs at least one slot") };
        Self {
            states: [SlotState::Inactive; N],
            slots: [const { MaybeUninit::uninit() }; N],
            len: 0,
            tombstones: 0,
            hash_builder,
        }
    }

    /// Returns `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of tombstoned slots.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns a reference to the table's hasher.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over the entries in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.states, &self.slots, self.len)
    }

    /// Returns an iterator over the entries in slot order, with mutable
    /// references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&self.states, &mut self.slots, self.len)
    }

    /// Returns an iterator over the keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Removes every entry and resets all tombstones.
    pub fn clear(&mut self) {
        for (state, slot) in self.states.iter_mut().zip(self.slots.iter_mut()) {
            if core::mem::replace(state, SlotState::Inactive) == SlotState::Active {
                // SAFETY: The slot was active, hence initialized, and is now
                // inactive.
                unsafe { slot.assume_init_drop() };
            }
        }

        self.len = 0;
        self.tombstones = 0;
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        if self.len == 0 {
            return None;
        }

        let home = slot::home_index(self.hash_builder.hash_key(key), N);
        // SAFETY: Both arrays hold `N > 0` slots and `home < N`.
        unsafe { slot::find_index(&self.states, &self.slots, home, key) }
    }

    /// # Safety
    ///
    /// `index` must refer to an active slot.
    unsafe fn pair_mut(&mut self, index: usize) -> &mut (K, V) {
        debug_assert_eq!(self.states[index], SlotState::Active);
        // SAFETY: Caller guarantees the slot is active, hence initialized.
        unsafe { self.slots.get_unchecked_mut(index).assume_init_mut() }
    }

    /// Returns a reference to the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        let index = self.find_index(key)?;
        // SAFETY: `find_index` only reports active slots.
        Some(unsafe { &mut self.pair_mut(index).1 })
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        let index = self.find_index(key)?;
        // SAFETY: `find_index` only reports active slots.
        let (key, value) = unsafe { self.slots[index].assume_init_ref() };
        Some((key, value))
    }

    /// Returns the value stored for `key`, or [`Error::KeyNotFound`].
    pub fn at<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value stored for `key`, or
    /// [`Error::KeyNotFound`].
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns `true` if the table holds an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        self.find_index(key).is_some()
    }

    /// Removes the entry for `key` and returns its value, leaving a
    /// tombstone behind.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the entry for `key` and returns the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        let index = self.find_index(key)?;
        self.states[index] = SlotState::Tombstone;
        self.len -= 1;
        self.tombstones += 1;
        // SAFETY: The slot was active and is now a tombstone, so the pair is read
        // exactly once.
        Some(unsafe { self.slots[index].assume_init_read() })
    }
}

impl<K, V, const N: usize, S> StaticHashTable<K, V, N, S>
where
    K: Eq,
    S: KeyHasher<K>,
{
    fn probe(&self, key: &K) -> Probe {
        let home = slot::home_index(self.hash_builder.hash_key(key), N);
        // SAFETY: Both arrays hold `N > 0` slots and `home < N`.
        unsafe { slot::probe_insert(&self.states, &self.slots, home, key) }
    }

    fn occupy(&mut self, index: usize, key: K, value: V) -> &mut V {
        debug_assert_ne!(self.states[index], SlotState::Active);
        if self.states[index] == SlotState::Tombstone {
            self.tombstones -= 1;
        }
        self.states[index] = SlotState::Active;
        self.len += 1;
        let (_, value) = self.slots[index].write((key, value));
        value
    }

    /// Inserts `value` for `key`, returning the value it replaced.
    ///
    /// Fails with [`Error::CapacityExceeded`] if `key` is absent and every
    /// slot is active; the table is unchanged in that case.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, Error> {
        match self.probe(&key) {
            Probe::Occupied(index) => {
                // SAFETY: The probe reported an active slot.
                let stored = unsafe { &mut self.pair_mut(index).1 };
                Ok(Some(core::mem::replace(stored, value)))
            }
            Probe::Vacant(index) => {
                self.occupy(index, key, value);
                Ok(None)
            }
            Probe::Exhausted => Err(Error::CapacityExceeded { capacity: N }),
        }
    }

    /// Inserts `value` for `key` unless the key is already present, and
    /// returns a reference to the stored value. The first write wins.
    pub fn emplace(&mut self, key: K, value: V) -> Result<&mut V, Error> {
        self.emplace_with(key, || value)
    }

    /// Like [`emplace`](Self::emplace), but only builds the value when the
    /// key is absent.
    pub fn emplace_with(&mut self, key: K, make: impl FnOnce() -> V) -> Result<&mut V, Error> {
        match self.probe(&key) {
            // SAFETY: The probe reported an active slot.
            Probe::Occupied(index) => Ok(unsafe { &mut self.pair_mut(index).1 }),
            Probe::Vacant(index) => Ok(self.occupy(index, key, make())),
            Probe::Exhausted => Err(Error::CapacityExceeded { capacity: N }),
        }
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key
    /// is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V, Error>
    where
        V: Default,
    {
        self.emplace_with(key, V::default)
    }

    /// Inserts every pair from `iter` in order. A repeated key keeps its last
    /// value.
    ///
    /// Stops at the first new key that does not fit and returns
    /// [`Error::CapacityExceeded`]; the pairs inserted before it stay.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value)?;
        }
        Ok(())
    }
}

impl<K, V, const N: usize, S> Drop for StaticHashTable<K, V, N, S> {
    fn drop(&mut self) {
        if core::mem::needs_drop::<(K, V)>() {
            for (state, slot) in self.states.iter().zip(self.slots.iter_mut()) {
                if *state == SlotState::Active {
                    // SAFETY: Active slots are initialized.
                    unsafe { slot.assume_init_drop() };
                }
            }
        }
    }
}

impl<K, V, const N: usize, S> Clone for StaticHashTable<K, V, N, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        let mut table = Self::with_hasher(self.hash_builder.clone());
        for index in 0..N {
            match self.states[index] {
                SlotState::Active => {
                    // SAFETY: Active slots are initialized.
                    let (key, value) = unsafe { self.slots[index].assume_init_ref() };
                    table.slots[index].write((key.clone(), value.clone()));
                    table.states[index] = SlotState::Active;
                    table.len += 1;
                }
                SlotState::Tombstone => {
                    table.states[index] = SlotState::Tombstone;
                    table.tombstones += 1;
                }
                SlotState::Inactive => {}
            }
        }

        table
    }
}

impl<K, V, const N: usize, S> Debug for StaticHashTable<K, V, N, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, const N: usize, const M: usize, S1, S2> PartialEq<StaticHashTable<K, V, M, S2>>
    for StaticHashTable<K, V, N, S1>
where
    K: Eq,
    V: PartialEq,
    S2: KeyHasher<K>,
{
    fn eq(&self, other: &StaticHashTable<K, V, M, S2>) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, const N: usize, S> Eq for StaticHashTable<K, V, N, S>
where
    K: Eq,
    V: Eq,
    S: KeyHasher<K>,
{
}

impl<K, V, const N: usize, S> Default for StaticHashTable<K, V, N, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, const N: usize, const M: usize, S> TryFrom<[(K, V); M]> for StaticHashTable<K, V, N, S>
where
    K: Eq,
    S: KeyHasher<K> + Default,
{
    type Error = Error;

    /// Builds a table from an array of pairs. A repeated key keeps its last
    /// value, so `M` may exceed `N` as long as the distinct keys fit.
    fn try_from(pairs: [(K, V); M]) -> Result<Self, Error> {
        let mut table = Self::default();
        table.try_extend(pairs)?;
        Ok(table)
    }
}

impl<K, V, const N: usize, S> FromIterator<(K, V)> for StaticHashTable<K, V, N, S>
where
    K: Eq,
    S: KeyHasher<K> + Default,
{
    /// # Panics
    ///
    /// Panics if the iterator yields more than `N` distinct keys.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<K, V, const N: usize, S> Extend<(K, V)> for StaticHashTable<K, V, N, S>
where
    K: Eq,
    S: KeyHasher<K>,
{
    /// # Panics
    ///
    /// Panics if a new key does not fit.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        if self.try_extend(iter).is_err() {
            panic!("StaticHashTable capacity of {N} exceeded");
        }
    }
}

impl<'a, K, V, const N: usize, S> IntoIterator for &'a StaticHashTable<K, V, N, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, const N: usize, S> IntoIterator for &'a mut StaticHashTable<K, V, N, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
