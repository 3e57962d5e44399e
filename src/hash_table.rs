use alloc::alloc::handle_alloc_error;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::iter::Zip;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;
use core::slice;

use crate::error::Error;
use crate::hash::DefaultHashBuilder;
use crate::hash::KeyHasher;
use crate::slot;
use crate::slot::Probe;
use crate::slot::SlotState;

/// Slot count of the first allocation made by an unallocated table.
const DEFAULT_CAPACITY: usize = 16;

/// Tables below this many slots grow by [`SMALL_GROWTH_FACTOR`], larger ones
/// by [`LARGE_GROWTH_FACTOR`].
const LARGE_TABLE_THRESHOLD: usize = 4096;

const SMALL_GROWTH_FACTOR: usize = 8;

const LARGE_GROWTH_FACTOR: usize = 2;

/// Picks the slot count for the next growth step.
///
/// A table whose live entries would still fit in a quarter of its slots is
/// full of tombstones, not entries, and is rehashed at the same size.
fn grown_capacity(capacity: usize, len: usize) -> usize {
    if capacity == 0 {
        return DEFAULT_CAPACITY;
    }

    if (len + 1).saturating_mul(4) <= capacity {
        return capacity;
    }

    let base = capacity.next_power_of_two();
    let factor = if base < LARGE_TABLE_THRESHOLD {
        SMALL_GROWTH_FACTOR
    } else {
        LARGE_GROWTH_FACTOR
    };
    base.checked_mul(factor).expect("capacity overflow")
}

/// Offsets of the state array and the slot array inside one allocation.
#[derive(Debug)]
struct DataLayout {
    layout: Layout,
    states_offset: usize,
    slots_offset: usize,
}

impl DataLayout {
    const fn empty() -> Self {
        DataLayout {
            layout: Layout::new::<()>(),
            states_offset: 0,
            slots_offset: 0,
        }
    }

    fn new<K, V>(capacity: usize) -> Self {
        let states_layout =
            Layout::array::<SlotState>(capacity).expect("allocation size overflow");
        let slots_layout =
            Layout::array::<MaybeUninit<(K, V)>>(capacity).expect("allocation size overflow");

        let (layout, states_offset) = Layout::new::<()>()
            .extend(states_layout)
            .expect("allocation size overflow");
        let (layout, slots_offset) = layout
            .extend(slots_layout)
            .expect("allocation size overflow");

        DataLayout {
            layout,
            states_offset,
            slots_offset,
        }
    }
}

/// Owner of the parallel state and slot arrays.
///
/// Both arrays live in a single allocation and are always `capacity` long.
/// Dropping a `RawSlots` drops every active pair and releases the
/// allocation.
struct RawSlots<K, V> {
    layout: DataLayout,
    alloc: NonNull<u8>,
    capacity: usize,
    _phantom: PhantomData<(K, V)>,
}

// SAFETY: `RawSlots` owns its `(K, V)` pairs exclusively, like a `Vec<(K, V)>`
// would.
unsafe impl<K: Send, V: Send> Send for RawSlots<K, V> {}
// SAFETY: Shared access only ever hands out shared references to the pairs.
unsafe impl<K: Sync, V: Sync> Sync for RawSlots<K, V> {}

impl<K, V> RawSlots<K, V> {
    const fn new() -> Self {
        Self {
            layout: DataLayout::empty(),
            alloc: NonNull::dangling(),
            capacity: 0,
            _phantom: PhantomData,
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }

        let layout = DataLayout::new::<K, V>(capacity);
        debug_assert!(layout.layout.size() != 0);
        // SAFETY: The layout holds `capacity > 0` state bytes, so its size is
        // non-zero. Allocation failure is routed to `handle_alloc_error`. Zeroed
        // states are `SlotState::Inactive`.
        let alloc = unsafe {
            let raw_alloc = alloc::alloc::alloc(layout.layout);
            if raw_alloc.is_null() {
                handle_alloc_error(layout.layout);
            }

            core::ptr::write_bytes(raw_alloc.add(layout.states_offset), 0x0, capacity);

            NonNull::new_unchecked(raw_alloc)
        };

        Self {
            layout,
            alloc,
            capacity,
            _phantom: PhantomData,
        }
    }

    fn states(&self) -> &[SlotState] {
        if self.capacity == 0 {
            return &[];
        }

        // SAFETY: The allocation holds `capacity` initialized states at
        // `states_offset`.
        unsafe {
            slice::from_raw_parts(
                self.alloc
                    .add(self.layout.states_offset)
                    .cast::<SlotState>()
                    .as_ptr(),
                self.capacity,
            )
        }
    }

    fn slots(&self) -> &[MaybeUninit<(K, V)>] {
        if self.capacity == 0 {
            return &[];
        }

        // SAFETY: The allocation holds `capacity` slots at `slots_offset`,
        // aligned by `DataLayout`.
        unsafe {
            slice::from_raw_parts(
                self.alloc
                    .add(self.layout.slots_offset)
                    .cast::<MaybeUninit<(K, V)>>()
                    .as_ptr(),
                self.capacity,
            )
        }
    }

    fn parts_mut(&mut self) -> (&mut [SlotState], &mut [MaybeUninit<(K, V)>]) {
        if self.capacity == 0 {
            return (&mut [], &mut []);
        }

        // SAFETY: Both regions are in bounds of the allocation and do not
        // overlap, see `DataLayout::new`.
        unsafe {
            (
                slice::from_raw_parts_mut(
                    self.alloc
                        .add(self.layout.states_offset)
                        .cast::<SlotState>()
                        .as_ptr(),
                    self.capacity,
                ),
                slice::from_raw_parts_mut(
                    self.alloc
                        .add(self.layout.slots_offset)
                        .cast::<MaybeUninit<(K, V)>>()
                        .as_ptr(),
                    self.capacity,
                ),
            )
        }
    }
}

impl<K, V> Drop for RawSlots<K, V> {
    fn drop(&mut self) {
        if core::mem::needs_drop::<(K, V)>() {
            let (states, slots) = self.parts_mut();
            for (state, slot) in states.iter().zip(slots.iter_mut()) {
                if *state == SlotState::Active {
                    // SAFETY: Active slots are initialized.
                    unsafe { slot.assume_init_drop() };
                }
            }
        }

        if self.layout.layout.size() != 0 {
            // SAFETY: The allocation was made with this exact layout.
            unsafe { alloc::alloc::dealloc(self.alloc.as_ptr(), self.layout.layout) };
        }
    }
}

/// Debug statistics for hash table analysis.
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries in the table
    pub len: usize,
    /// Number of tombstoned slots
    pub tombstones: usize,
    /// Total number of slots allocated
    pub capacity: usize,
    /// Load factor (len / capacity)
    pub load_factor: f64,
    /// Fraction of slots that are active or tombstoned
    pub occupancy: f64,
    /// Longest distance between an entry and its home slot
    pub max_probe_length: usize,
    /// Mean distance between an entry and its home slot
    pub mean_probe_length: f64,
    /// Total memory in bytes used by the slot allocation
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.len,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Tombstones: {} ({:.2}% of slots in use)",
            self.tombstones,
            self.occupancy * 100.0
        );
        println!(
            "Probe length: max {}, mean {:.3}",
            self.max_probe_length, self.mean_probe_length
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// An open-addressing hash table with linear probing.
///
/// `HashTable<K, V, S>` owns `(K, V)` pairs in a flat slot array with a
/// parallel array of slot states. Collisions are resolved by walking forward
/// one slot at a time, removals leave tombstones behind so that the probe
/// sequences of other keys stay intact, and tombstones are discarded whenever
/// the table is rehashed.
///
/// The hasher `S` is any [`KeyHasher`]: every [`BuildHasher`] qualifies, and
/// [`FnHasher`](crate::FnHasher) adapts a closure.
///
/// ## Growth
///
/// An unallocated table allocates 16 slots on its first insertion. Before
/// every insertion the table makes sure that at least half of its slots stay
/// unused afterwards, counting tombstones as used. When that would fail the
/// table is rehashed into a new allocation: eight times larger below 4096
/// slots, twice as large above, or the same size when most of the used slots
/// are tombstones.
///
/// The bound is inclusive: after an insertion `(len + tombstones) * 2` may
/// equal the capacity, so a 16-slot table holds 8 entries before it grows.
///
/// Growing moves every entry, so any insertion may relocate the values of
/// other keys. Removal never moves anything.
///
/// ## Example
///
/// ```rust
/// use linprobe::HashTable;
///
/// let mut table = HashTable::new();
/// table.insert("apples", 3);
/// table.insert("pears", 5);
///
/// *table.get_or_insert_default("plums") += 2;
/// assert_eq!(table.at("plums"), Ok(&2));
///
/// assert_eq!(table.remove("apples"), Some(3));
/// assert!(!table.contains_key("apples"));
/// assert_eq!(table.len(), 2);
/// ```
///
/// [`BuildHasher`]: core::hash::BuildHasher
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    slots: RawSlots<K, V>,
    len: usize,
    tombstones: usize,
    hash_builder: S,
}

impl<K, V, S> Debug for HashTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Clone for HashTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Copies the table slot for slot, tombstones included, without
    /// rehashing.
    fn clone(&self) -> Self {
        let mut slots = RawSlots::with_capacity(self.slots.capacity);

        {
            let (dst_states, dst_slots) = slots.parts_mut();
            let src_states = self.slots.states();
            let src_slots = self.slots.slots();

            for index in 0..src_states.len() {
                match src_states[index] {
                    SlotState::Active => {
                        // SAFETY: Active slots are initialized.
                        let (key, value) = unsafe { src_slots[index].assume_init_ref() };
                        dst_slots[index].write((key.clone(), value.clone()));
                        dst_states[index] = SlotState::Active;
                    }
                    SlotState::Tombstone => dst_states[index] = SlotState::Tombstone,
                    SlotState::Inactive => {}
                }
            }
        }

        Self {
            slots,
            len: self.len,
            tombstones: self.tombstones,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S1, S2> PartialEq<HashTable<K, V, S2>> for HashTable<K, V, S1>
where
    K: Eq,
    V: PartialEq,
    S2: KeyHasher<K>,
{
    /// Two tables are equal when they hold the same keys mapped to equal
    /// values, regardless of slot layout or hasher.
    fn eq(&self, other: &HashTable<K, V, S2>) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S> Eq for HashTable<K, V, S>
where
    K: Eq,
    V: Eq,
    S: KeyHasher<K>,
{
}

impl<K, V, S> Default for HashTable<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V> HashTable<K, V, DefaultHashBuilder> {
    /// Creates an empty, unallocated table using the default hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let table: HashTable<u32, String> = HashTable::new();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 0);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty table with exactly `capacity` slots, using the
    /// default hasher.
    ///
    /// Because the table keeps at least half of its slots free, it holds
    /// `capacity / 2` entries before growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let table: HashTable<u32, u32> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashTable<K, V, S> {
    /// Creates an empty, unallocated table that hashes keys with
    /// `hash_builder`.
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self {
            slots: RawSlots::new(),
            len: 0,
            tombstones: 0,
            hash_builder,
        }
    }

    /// Creates an empty table with exactly `capacity` slots that hashes keys
    /// with `hash_builder`.
    ///
    /// A capacity of zero does not allocate.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            slots: RawSlots::with_capacity(capacity),
            len: 0,
            tombstones: 0,
            hash_builder,
        }
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots, active or not.
    ///
    /// Zero means the table has not allocated yet.
    pub fn capacity(&self) -> usize {
        self.slots.capacity
    }

    /// Returns the number of tombstoned slots left behind by removals since
    /// the last rehash or clear.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.insert(1, "one");
    /// table.insert(2, "two");
    /// table.remove(&1);
    /// assert_eq!(table.tombstones(), 1);
    ///
    /// table.clear();
    /// assert_eq!(table.tombstones(), 0);
    /// ```
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns a reference to the table's hasher.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over the entries in slot order.
    ///
    /// Slot order is unrelated to insertion order and changes whenever the
    /// table is rehashed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let table = HashTable::from([(1, 10), (2, 20), (3, 30)]);
    /// let mut sum = 0;
    /// for (key, value) in table.iter() {
    ///     sum += key * value;
    /// }
    /// assert_eq!(sum, 140);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.slots.states(), self.slots.slots(), self.len)
    }

    /// Returns an iterator over the entries in slot order, with mutable
    /// references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.len;
        let (states, slots) = self.slots.parts_mut();
        IterMut::new(states, slots, len)
    }

    /// Returns an iterator over the keys in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values in slot
    /// order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes every entry, yielding them in slot order.
    ///
    /// The allocation is kept. Entries not consumed by the time the iterator
    /// is dropped are dropped with it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::from([("a", 1), ("b", 2)]);
    /// let capacity = table.capacity();
    ///
    /// let mut drained: Vec<_> = table.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, [("a", 1), ("b", 2)]);
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V, S> {
        Drain {
            table: self,
            index: 0,
        }
    }

    /// Removes every entry, keeping the allocation.
    ///
    /// All slots, tombstones included, return to the unused state.
    pub fn clear(&mut self) {
        let (states, slots) = self.slots.parts_mut();
        for (state, slot) in states.iter_mut().zip(slots.iter_mut()) {
            if core::mem::replace(state, SlotState::Inactive) == SlotState::Active {
                self.len -= 1;
                // SAFETY: The slot was active, so it is initialized. Its state is
                // already inactive, so it cannot be dropped twice.
                unsafe { slot.assume_init_drop() };
            }
        }

        debug_assert_eq!(self.len, 0);
        self.len = 0;
        self.tombstones = 0;
    }

    /// Returns a cursor at the first entry in slot order, or at the end
    /// position if the table is empty.
    pub fn cursor_front(&self) -> Cursor<'_, K, V, S> {
        Cursor {
            index: slot::next_active(self.slots.states(), 0),
            table: self,
        }
    }

    /// Returns a cursor at the last entry in slot order, or at the end
    /// position if the table is empty.
    pub fn cursor_back(&self) -> Cursor<'_, K, V, S> {
        let states = self.slots.states();
        Cursor {
            index: slot::prev_active(states, states.len()).unwrap_or(states.len()),
            table: self,
        }
    }

    /// Returns a mutable cursor at the first entry in slot order, or at the
    /// end position if the table is empty.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V, S> {
        CursorMut {
            index: slot::next_active(self.slots.states(), 0),
            table: self,
        }
    }

    /// # Safety
    ///
    /// `index` must refer to an active slot.
    #[inline]
    unsafe fn pair(&self, index: usize) -> &(K, V) {
        debug_assert_eq!(self.slots.states()[index], SlotState::Active);
        // SAFETY: Caller guarantees the slot is active, hence initialized.
        unsafe { self.slots.slots().get_unchecked(index).assume_init_ref() }
    }

    /// # Safety
    ///
    /// `index` must refer to an active slot.
    #[inline]
    unsafe fn pair_mut(&mut self, index: usize) -> &mut (K, V) {
        let (states, slots) = self.slots.parts_mut();
        debug_assert_eq!(states[index], SlotState::Active);
        // SAFETY: Caller guarantees the slot is active, hence initialized.
        unsafe { slots.get_unchecked_mut(index).assume_init_mut() }
    }

    /// Moves the pair out of an active slot and tombstones the slot.
    ///
    /// # Safety
    ///
    /// `index` must refer to an active slot.
    #[inline]
    unsafe fn take(&mut self, index: usize) -> (K, V) {
        let (states, slots) = self.slots.parts_mut();
        debug_assert_eq!(states[index], SlotState::Active);
        states[index] = SlotState::Tombstone;
        self.len -= 1;
        self.tombstones += 1;
        // SAFETY: The slot was active, so it is initialized, and it is now a
        // tombstone, so it will not be read or dropped again.
        unsafe { slots.get_unchecked(index).assume_init_read() }
    }

    #[inline]
    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        if self.len == 0 {
            return None;
        }

        let home = slot::home_index(self.hash_builder.hash_key(key), self.slots.capacity);
        // SAFETY: A non-empty table is allocated, `home` is below its capacity
        // and `RawSlots` keeps both arrays the same length.
        unsafe { slot::find_index(self.slots.states(), self.slots.slots(), home, key) }
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.insert(1, "a");
    /// assert_eq!(table.get(&1), Some(&"a"));
    /// assert_eq!(table.get(&2), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        let index = self.find_index(key)?;
        // SAFETY: `find_index` only reports active slots.
        Some(unsafe { &self.pair(index).1 })
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
        let (key, value) = unsafe { self.pair(index) };
        Some((key, value))
    }

    /// Returns the value stored for `key`, or [`Error::KeyNotFound`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::Error;
    /// use linprobe::HashTable;
    ///
    /// let table = HashTable::from([(7, "seven")]);
    /// assert_eq!(table.at(&7), Ok(&"seven"));
    /// assert_eq!(table.at(&8), Err(Error::KeyNotFound));
    /// ```
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

    /// Removes the entry for `key` and returns its value.
    ///
    /// The slot becomes a tombstone; nothing else moves. Removing an absent
    /// key does nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::from([(42, "answer")]);
    /// assert_eq!(table.remove(&42), Some("answer"));
    /// assert_eq!(table.remove(&42), None);
    /// assert!(table.is_empty());
    /// ```
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
        // SAFETY: `find_index` only reports active slots.
        Some(unsafe { self.take(index) })
    }

    /// Returns a cursor at the entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let table = HashTable::from([(1, 'a'), (2, 'b')]);
    /// let cursor = table.find(&2).unwrap();
    /// assert_eq!(cursor.get(), Some((&2, &'b')));
    /// assert!(table.find(&3).is_none());
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Option<Cursor<'_, K, V, S>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        let index = self.find_index(key)?;
        Some(Cursor { table: self, index })
    }

    /// Returns a mutable cursor at the entry for `key`.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<CursorMut<'_, K, V, S>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        S: KeyHasher<Q>,
    {
        let index = self.find_index(key)?;
        Some(CursorMut { table: self, index })
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq,
    S: KeyHasher<K>,
{
    /// Inserts `value` for `key`, returning the value it replaced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// assert_eq!(table.insert(37, "a"), None);
    /// assert_eq!(table.insert(37, "b"), Some("a"));
    /// assert_eq!(table.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Inserts `value` for `key` unless the key is already present, and
    /// returns a reference to the stored value.
    ///
    /// The first write wins: an existing value is returned untouched and
    /// `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// assert_eq!(*table.emplace("k", 1), 1);
    /// assert_eq!(*table.emplace("k", 2), 1);
    /// ```
    pub fn emplace(&mut self, key: K, value: V) -> &mut V {
        self.entry(key).or_insert(value)
    }

    /// Like [`emplace`](Self::emplace), but only builds the value when the
    /// key is absent.
    pub fn emplace_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        self.entry(key).or_insert_with(make)
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key
    /// is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut counts = HashTable::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.get_or_insert_default(word) += 1;
    /// }
    /// assert_eq!(counts.get("a"), Some(&2));
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// A vacant entry already has room reserved, so inserting through it
    /// never rehashes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    /// use linprobe::hash_table::Entry;
    ///
    /// let mut table = HashTable::new();
    /// match table.entry("hello") {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert(1);
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         *entry.get_mut() += 1;
    ///     }
    /// }
    ///
    /// table.entry("hello").and_modify(|v| *v += 10).or_insert(0);
    /// assert_eq!(table.get("hello"), Some(&11));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S> {
        let hash = self.hash_builder.hash_key(&key);
        let mut probe = self.probe(hash, &key);

        if !matches!(probe, Probe::Occupied(_)) && self.needs_growth() {
            self.grow();
            probe = self.probe(hash, &key);
        }

        match probe {
            Probe::Occupied(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            Probe::Vacant(index) => Entry::Vacant(VacantEntry {
                table: self,
                index,
                key,
            }),
            Probe::Exhausted => unreachable!("growth leaves at least half of the slots unused"),
        }
    }

    /// Rehashes the table into exactly `new_capacity` slots.
    ///
    /// Every entry is re-inserted and all tombstones are discarded. Resizing
    /// an empty table to zero releases its allocation. Fails with
    /// [`Error::InvalidResize`] if `new_capacity` is smaller than
    /// [`len`](Self::len).
    ///
    /// If the hasher panics, the table is left exactly as it was.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::Error;
    /// use linprobe::HashTable;
    ///
    /// let mut table: HashTable<u32, u32> = (0..10).map(|i| (i, i)).collect();
    /// assert_eq!(
    ///     table.resize(4),
    ///     Err(Error::InvalidResize {
    ///         requested: 4,
    ///         len: 10
    ///     })
    /// );
    ///
    /// table.resize(20).unwrap();
    /// assert_eq!(table.capacity(), 20);
    /// assert_eq!(table.get(&9), Some(&9));
    /// ```
    pub fn resize(&mut self, new_capacity: usize) -> Result<(), Error> {
        if new_capacity < self.len {
            return Err(Error::InvalidResize {
                requested: new_capacity,
                len: self.len,
            });
        }

        #[cfg(feature = "logging")]
        log::debug!(
            "resizing hash table from {} to {} slots ({} entries, {} tombstones)",
            self.slots.capacity,
            new_capacity,
            self.len,
            self.tombstones
        );

        self.rehash(new_capacity);
        Ok(())
    }

    /// Reserves room for at least `additional` more entries.
    ///
    /// After this call, inserting `additional` new keys does not rehash.
    ///
    /// # Panics
    ///
    /// Panics if the slot count needed overflows `usize`. The table is left
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::new();
    /// table.reserve(100);
    /// let capacity = table.capacity();
    /// for i in 0..100 {
    ///     table.insert(i, i);
    /// }
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let used = self.len + self.tombstones;
        if used.saturating_add(additional).saturating_mul(2) <= self.slots.capacity {
            return;
        }

        let capacity = self
            .len
            .checked_add(additional)
            .and_then(|wanted| wanted.checked_mul(2))
            .and_then(usize::checked_next_power_of_two)
            .expect("capacity overflow")
            .max(DEFAULT_CAPACITY);
        self.rehash(capacity);
    }

    /// Shrinks the table to the smallest power-of-two slot count that keeps
    /// at least half of the slots unused.
    ///
    /// An empty table releases its allocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use linprobe::HashTable;
    ///
    /// let mut table = HashTable::with_capacity(1000);
    /// table.insert(1, "one");
    /// table.insert(2, "two");
    ///
    /// table.shrink_to_fit();
    /// assert_eq!(table.capacity(), 4);
    /// assert_eq!(table.get(&2), Some(&"two"));
    /// ```
    pub fn shrink_to_fit(&mut self) {
        if self.len == 0 {
            self.slots = RawSlots::new();
            self.tombstones = 0;
            return;
        }

        let capacity = (self.len * 2).next_power_of_two();
        if capacity < self.slots.capacity {
            self.rehash(capacity);
        }
    }

    #[inline]
    fn probe(&self, hash: u64, key: &K) -> Probe {
        if self.slots.capacity == 0 {
            return Probe::Exhausted;
        }

        let home = slot::home_index(hash, self.slots.capacity);
        // SAFETY: The table is allocated, `home` is below its capacity and
        // `RawSlots` keeps both arrays the same length.
        unsafe { slot::probe_insert(self.slots.states(), self.slots.slots(), home, key) }
    }

    #[inline]
    fn needs_growth(&self) -> bool {
        (self.len + self.tombstones + 1).saturating_mul(2) > self.slots.capacity
    }

    #[inline(never)]
    #[cold]
    fn grow(&mut self) {
        let capacity = grown_capacity(self.slots.capacity, self.len);

        #[cfg(feature = "logging")]
        log::trace!(
            "growing hash table from {} to {} slots ({} entries, {} tombstones)",
            self.slots.capacity,
            capacity,
            self.len,
            self.tombstones
        );

        self.rehash(capacity);
    }

    /// Moves every entry into a fresh allocation of `capacity` slots.
    fn rehash(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.len);

        // Every key is hashed before anything moves, so a panicking hasher
        // leaves the table untouched.
        let mut moves = Vec::with_capacity(self.len);
        if capacity != 0 {
            let slots = self.slots.slots();
            for (index, state) in self.slots.states().iter().enumerate() {
                if *state == SlotState::Active {
                    // SAFETY: Active slots are initialized.
                    let (key, _) = unsafe { slots.get_unchecked(index).assume_init_ref() };
                    let hash = self.hash_builder.hash_key(key);
                    moves.push((index, slot::home_index(hash, capacity)));
                }
            }
        }

        let mut new_slots = RawSlots::<K, V>::with_capacity(capacity);
        {
            let (old_states, old_slots) = self.slots.parts_mut();
            let (new_states, new_pairs) = new_slots.parts_mut();

            for (old_index, home) in moves {
                let Some(new_index) = slot::find_vacant(new_states, home) else {
                    unreachable!("rehash target is smaller than the table");
                };

                // SAFETY: `old_index` is active and `new_index` is unused. The old
                // slot is marked inactive right after, so the pair has exactly one
                // owner.
                unsafe {
                    core::ptr::copy_nonoverlapping(
                        old_slots.get_unchecked(old_index).as_ptr(),
                        new_pairs.get_unchecked_mut(new_index).as_mut_ptr(),
                        1,
                    );
                }
                new_states[new_index] = SlotState::Active;
                old_states[old_index] = SlotState::Inactive;
            }
        }

        self.slots = new_slots;
        self.tombstones = 0;
    }

    /// Computes a histogram of probe distances for the current table state.
    ///
    /// Index `d` of the result counts the entries stored `d` slots past their
    /// home slot. The result is empty for an empty table.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mut hist = Vec::new();
        let capacity = self.slots.capacity;

        for (key, index) in self.active_keys() {
            let home = slot::home_index(self.hash_builder.hash_key(key), capacity);
            let distance = slot::probe_distance(home, index, capacity);
            if hist.len() <= distance {
                hist.resize(distance + 1, 0);
            }
            hist[distance] += 1;
        }

        hist
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let hist = self.probe_histogram();
        let total_distance: usize = hist.iter().enumerate().map(|(d, n)| d * n).sum();
        let capacity = self.slots.capacity;

        DebugStats {
            len: self.len,
            tombstones: self.tombstones,
            capacity,
            load_factor: if capacity == 0 {
                0.0
            } else {
                self.len as f64 / capacity as f64
            },
            occupancy: if capacity == 0 {
                0.0
            } else {
                (self.len + self.tombstones) as f64 / capacity as f64
            },
            max_probe_length: hist.len().saturating_sub(1),
            mean_probe_length: if self.len == 0 {
                0.0
            } else {
                total_distance as f64 / self.len as f64
            },
            total_bytes: self.slots.layout.layout.size(),
        }
    }

    #[cfg(any(test, feature = "stats"))]
    fn active_keys(&self) -> impl Iterator<Item = (&K, usize)> {
        let slots = self.slots.slots();
        self.slots
            .states()
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == SlotState::Active)
            // SAFETY: Active slots are initialized.
            .map(move |(index, _)| (unsafe { &slots.get_unchecked(index).assume_init_ref().0 }, index))
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HashTable<K, V, DefaultHashBuilder>
where
    K: Eq,
    DefaultHashBuilder: KeyHasher<K>,
{
    /// Builds a table from an array of pairs. A repeated key keeps its last
    /// value.
    fn from(pairs: [(K, V); N]) -> Self {
        let mut table = Self::default();
        table.extend(pairs);
        table
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Eq,
    S: KeyHasher<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Eq,
    S: KeyHasher<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for HashTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.len,
            slots: self.slots,
            index: 0,
        }
    }
}

/// A view into a single entry of a [`HashTable`], which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, K, V, S> {
    /// The key is not present in the table.
    Vacant(VacantEntry<'a, K, V, S>),
    /// The key is present in the table.
    Occupied(OccupiedEntry<'a, K, V, S>),
}

impl<'a, K, V, S> Entry<'a, K, V, S> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Like [`or_insert_with`](Self::or_insert_with), passing the key to the
    /// closure.
    pub fn or_insert_with_key(self, default: impl FnOnce(&K) -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(&entry.key);
                entry.insert(value)
            }
        }
    }

    /// Modifies an occupied entry in place and hands the entry back.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns the key of this entry.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, S> Entry<'a, K, V, S>
where
    V: Default,
{
    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(V::default)
    }
}

/// A vacant entry in a [`HashTable`]. Room for it is already reserved.
pub struct VacantEntry<'a, K, V, S> {
    table: &'a mut HashTable<K, V, S>,
    index: usize,
    key: K,
}

impl<'a, K, V, S> VacantEntry<'a, K, V, S> {
    /// Returns the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Gives back the key without inserting anything.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Stores `value` under the entry's key and returns a mutable reference
    /// to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { table, index, key } = self;

        if table.slots.states()[index] == SlotState::Tombstone {
            table.tombstones -= 1;
        }
        table.len += 1;

        let (states, slots) = table.slots.parts_mut();
        debug_assert_ne!(states[index], SlotState::Active);
        states[index] = SlotState::Active;
        let (_, value) = slots[index].write((key, value));
        value
    }
}

/// An occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, K, V, S> {
    table: &'a mut HashTable<K, V, S>,
    index: usize,
}

impl<'a, K, V, S> OccupiedEntry<'a, K, V, S> {
    /// Returns the stored key.
    pub fn key(&self) -> &K {
        // SAFETY: An occupied entry always points at an active slot.
        unsafe { &self.table.pair(self.index).0 }
    }

    /// Returns the stored value.
    pub fn get(&self) -> &V {
        // SAFETY: An occupied entry always points at an active slot.
        unsafe { &self.table.pair(self.index).1 }
    }

    /// Returns the stored value mutably.
    pub fn get_mut(&mut self) -> &mut V {
        // SAFETY: An occupied entry always points at an active slot.
        unsafe { &mut self.table.pair_mut(self.index).1 }
    }

    /// Converts the entry into a mutable reference to its value that lives
    /// as long as the table borrow.
    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { table, index } = self;
        // SAFETY: An occupied entry always points at an active slot.
        unsafe { &mut table.pair_mut(index).1 }
    }

    /// Replaces the stored value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        // SAFETY: An occupied entry always points at an active slot.
        unsafe { self.table.take(self.index) }
    }
}

/// An iterator over the entries of a [`HashTable`] in slot order.
///
/// This struct is created by [`HashTable::iter`].
pub struct Iter<'a, K, V> {
    inner: Zip<slice::Iter<'a, SlotState>, slice::Iter<'a, MaybeUninit<(K, V)>>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    /// `len` must be the number of active slots in `states`, and every
    /// active slot of `slots` must be initialized.
    pub(crate) fn new(
        states: &'a [SlotState],
        slots: &'a [MaybeUninit<(K, V)>],
        len: usize,
    ) -> Self {
        Self {
            inner: states.iter().zip(slots.iter()),
            remaining: len,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (state, slot) in self.inner.by_ref() {
            if *state == SlotState::Active {
                self.remaining -= 1;
                // SAFETY: Active slots are initialized.
                let (key, value) = unsafe { slot.assume_init_ref() };
                return Some((key, value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some((state, slot)) = self.inner.next_back() {
            if *state == SlotState::Active {
                self.remaining -= 1;
                // SAFETY: Active slots are initialized.
                let (key, value) = unsafe { slot.assume_init_ref() };
                return Some((key, value));
            }
        }

        None
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a [`HashTable`] in slot order.
///
/// This struct is created by [`HashTable::iter_mut`].
pub struct IterMut<'a, K, V> {
    inner: Zip<slice::Iter<'a, SlotState>, slice::IterMut<'a, MaybeUninit<(K, V)>>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    /// `len` must be the number of active slots in `states`, and every
    /// active slot of `slots` must be initialized.
    pub(crate) fn new(
        states: &'a [SlotState],
        slots: &'a mut [MaybeUninit<(K, V)>],
        len: usize,
    ) -> Self {
        Self {
            inner: states.iter().zip(slots.iter_mut()),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for (state, slot) in self.inner.by_ref() {
            if *state == SlotState::Active {
                self.remaining -= 1;
                // SAFETY: Active slots are initialized.
                let (key, value) = unsafe { slot.assume_init_mut() };
                return Some((&*key, value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some((state, slot)) = self.inner.next_back() {
            if *state == SlotState::Active {
                self.remaining -= 1;
                // SAFETY: Active slots are initialized.
                let (key, value) = unsafe { slot.assume_init_mut() };
                return Some((&*key, value));
            }
        }

        None
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`HashTable`].
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`HashTable`].
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// An iterator over mutable references to the values of a [`HashTable`].
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the entries of a [`HashTable`].
///
/// This struct is created by [`HashTable::drain`]. Dropping it clears the
/// table.
pub struct Drain<'a, K, V, S> {
    table: &'a mut HashTable<K, V, S>,
    index: usize,
}

impl<K, V, S> Drop for Drain<'_, K, V, S> {
    fn drop(&mut self) {
        self.table.clear();
    }
}

impl<K, V, S> Iterator for Drain<'_, K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let states = self.table.slots.states();
        let index = slot::next_active(states, self.index);
        if index == states.len() {
            self.index = index;
            return None;
        }

        self.index = index + 1;
        // SAFETY: `next_active` only reports active slots.
        Some(unsafe { self.table.take(index) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.len, Some(self.table.len))
    }
}

impl<K, V, S> ExactSizeIterator for Drain<'_, K, V, S> {}

/// An owning iterator over the entries of a [`HashTable`].
///
/// This struct is created by the `into_iter` method on [`HashTable`].
pub struct IntoIter<K, V> {
    slots: RawSlots<K, V>,
    index: usize,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (states, slots) = self.slots.parts_mut();
        let index = slot::next_active(states, self.index);
        if index == states.len() {
            self.index = index;
            return None;
        }

        states[index] = SlotState::Inactive;
        self.index = index + 1;
        self.remaining -= 1;
        // SAFETY: The slot was active and is now inactive, so the pair is read
        // exactly once.
        Some(unsafe { slots.get_unchecked(index).assume_init_read() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

/// A read-only cursor over the entries of a [`HashTable`].
///
/// A cursor sits either on an entry or on the end position, which lies
/// between the last and the first entry in slot order: moving forward from
/// the last entry reaches it, and moving forward again wraps to the first.
/// Two cursors are equal when they point into the same table at the same
/// position.
pub struct Cursor<'a, K, V, S> {
    table: &'a HashTable<K, V, S>,
    index: usize,
}

impl<K, V, S> Clone for Cursor<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for Cursor<'_, K, V, S> {}

impl<K, V, S> PartialEq for Cursor<'_, K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.table, other.table) && self.index == other.index
    }
}

impl<K, V, S> Eq for Cursor<'_, K, V, S> {}

impl<K, V, S> Debug for Cursor<'_, K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Cursor").field(&self.index()).finish()
    }
}

impl<'a, K, V, S> Cursor<'a, K, V, S> {
    /// Returns the slot index of the current entry, or `None` at the end
    /// position.
    pub fn index(&self) -> Option<usize> {
        (self.index < self.table.slots.capacity).then_some(self.index)
    }

    /// Returns the current entry, or `None` at the end position.
    pub fn get(&self) -> Option<(&'a K, &'a V)> {
        self.index()?;
        // SAFETY: A cursor not at the end position points at an active slot.
        let (key, value) = unsafe { self.table.pair(self.index) };
        Some((key, value))
    }

    /// Moves to the next entry in slot order.
    pub fn move_next(&mut self) {
        self.index = step_forward(self.table.slots.states(), self.index);
    }

    /// Moves to the previous entry in slot order.
    pub fn move_prev(&mut self) {
        self.index = step_back(self.table.slots.states(), self.index);
    }
}

/// A cursor over the entries of a [`HashTable`] that can modify values and
/// remove entries.
///
/// Removing through the cursor leaves a tombstone and moves nothing, so the
/// walk carries on from the same position.
///
/// # Examples
///
/// ```rust
/// use linprobe::HashTable;
///
/// let mut table: HashTable<u32, u32> = (0..10).map(|i| (i, i)).collect();
/// let mut cursor = table.cursor_front_mut();
/// while let Some((key, _)) = cursor.get() {
///     if key % 2 == 0 {
///         cursor.remove_current();
///     } else {
///         cursor.move_next();
///     }
/// }
/// assert_eq!(table.len(), 5);
/// assert!(table.keys().all(|k| k % 2 == 1));
/// ```
pub struct CursorMut<'a, K, V, S> {
    table: &'a mut HashTable<K, V, S>,
    index: usize,
}

impl<K, V, S> Debug for CursorMut<'_, K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("CursorMut").field(&self.index()).finish()
    }
}

impl<K, V, S> CursorMut<'_, K, V, S> {
    /// Returns the slot index of the current entry, or `None` at the end
    /// position.
    pub fn index(&self) -> Option<usize> {
        (self.index < self.table.slots.capacity).then_some(self.index)
    }

    /// Returns the current entry, or `None` at the end position.
    pub fn get(&self) -> Option<(&K, &V)> {
        self.index()?;
        // SAFETY: A cursor not at the end position points at an active slot.
        let (key, value) = unsafe { self.table.pair(self.index) };
        Some((key, value))
    }

    /// Returns the current entry with a mutable value, or `None` at the end
    /// position.
    pub fn get_mut(&mut self) -> Option<(&K, &mut V)> {
        self.index()?;
        // SAFETY: A cursor not at the end position points at an active slot.
        let (key, value) = unsafe { self.table.pair_mut(self.index) };
        Some((&*key, value))
    }

    /// Removes the current entry and moves to the next one.
    ///
    /// Returns `None` and does nothing at the end position.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        self.index()?;
        // SAFETY: A cursor not at the end position points at an active slot.
        let pair = unsafe { self.table.take(self.index) };
        self.index = slot::next_active(self.table.slots.states(), self.index + 1);
        Some(pair)
    }

    /// Moves to the next entry in slot order.
    pub fn move_next(&mut self) {
        self.index = step_forward(self.table.slots.states(), self.index);
    }

    /// Moves to the previous entry in slot order.
    pub fn move_prev(&mut self) {
        self.index = step_back(self.table.slots.states(), self.index);
    }

    /// Returns a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V, S> {
        Cursor {
            table: &*self.table,
            index: self.index,
        }
    }
}

#[inline]
fn step_forward(states: &[SlotState], index: usize) -> usize {
    if index >= states.len() {
        slot::next_active(states, 0)
    } else {
        slot::next_active(states, index + 1)
    }
}

#[inline]
fn step_back(states: &[SlotState], index: usize) -> usize {
    slot::prev_active(states, index).unwrap_or(states.len())
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::BuildHasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::hash::FnHasher;

    #[derive(Clone)]
    struct SipHashBuilder {
        k0: u64,
        k1: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }
    }

    type Table<K, V> = HashTable<K, V, SipHashBuilder>;

    #[test]
    fn insert_and_find() {
        let mut table: Table<u64, i32> = Table::default();
        for k in 0..32u64 {
            assert_eq!(table.insert(k, (k as i32) * 2), None);
            assert_eq!(table.get(&k), Some(&((k as i32) * 2)), "{:#?}", table);
        }

        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            assert_eq!(table.at(&k), Ok(&((k as i32) * 2)));
        }
        assert_eq!(table.get(&32), None);
    }

    #[test]
    fn last_insert_wins() {
        let mut table: Table<u64, u64> = Table::default();
        for round in 0..4u64 {
            for k in 0..100u64 {
                table.insert(k, k * 10 + round);
            }
        }

        assert_eq!(table.len(), 100);
        for k in 0..100u64 {
            assert_eq!(table.at(&k), Ok(&(k * 10 + 3)));
        }
    }

    #[test]
    fn emplace_keeps_first_value() {
        let mut table: Table<&str, i32> = Table::default();
        assert_eq!(*table.emplace("a", 1), 1);
        assert_eq!(*table.emplace("a", 2), 1);
        assert_eq!(*table.emplace_with("a", || unreachable!()), 1);
        assert_eq!(*table.emplace_with("b", || 5), 5);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let mut table: Table<u64, u64> = Table::default();
        table.insert(7, 70);

        match table.entry(7) {
            Entry::Occupied(entry) => {
                assert_eq!(entry.key(), &7);
                assert_eq!(entry.get(), &70);
            }
            Entry::Vacant(_) => panic!("expected occupied entry"),
        }

        match table.entry(8) {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), 8),
            Entry::Occupied(_) => panic!("expected vacant entry"),
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn entry_api() {
        let mut table: Table<i32, String> = Table::default();

        let value = table.entry(1).or_insert("hello".to_string());
        assert_eq!(value, "hello");

        table.entry(1).or_insert("ignored".to_string()).push_str(" world");
        assert_eq!(table.get(&1).map(String::as_str), Some("hello world"));

        table.entry(2).or_insert_with_key(|k| format!("key {k}"));
        assert_eq!(table.get(&2).map(String::as_str), Some("key 2"));

        table
            .entry(3)
            .and_modify(|_| panic!("vacant entries are not modified"))
            .or_default();
        assert_eq!(table.get(&3).map(String::as_str), Some(""));

        match table.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.insert("new".to_string()), "hello world");
                assert_eq!(entry.remove_entry(), (1, "new".to_string()));
            }
            Entry::Vacant(_) => panic!("expected occupied entry"),
        }
        assert!(!table.contains_key(&1));
        assert_eq!(table.entry(9).key(), &9);
    }

    #[test]
    fn entry_into_mut() {
        let mut table: Table<u64, Vec<u64>> = Table::default();
        table.get_or_insert_default(1).push(1);

        if let Entry::Occupied(entry) = table.entry(1) {
            entry.into_mut().push(2);
        }

        assert_eq!(table.get(&1), Some(&vec![1, 2]));
    }

    #[test]
    fn find_mut_and_modify() {
        let mut table: Table<u64, i32> = Table::default();
        for k in 0..10u64 {
            table.insert(k, 0);
        }

        for k in 0..10u64 {
            *table.get_mut(&k).unwrap() += k as i32;
            *table.at_mut(&k).unwrap() += 1;
        }

        for k in 0..10u64 {
            assert_eq!(table.get(&k), Some(&(k as i32 + 1)));
        }
        assert_eq!(table.at_mut(&10), Err(Error::KeyNotFound));
    }

    #[test]
    fn remove_items() {
        let mut table: Table<u64, u64> = Table::default();
        for k in 0..64u64 {
            table.insert(k, k);
        }

        for k in (0..64u64).step_by(2) {
            assert_eq!(table.remove(&k), Some(k));
            assert!(!table.contains_key(&k));
        }

        assert_eq!(table.len(), 32);
        assert_eq!(table.tombstones(), 32);
        assert_eq!(table.remove(&0), None);
        for k in (1..64u64).step_by(2) {
            assert_eq!(table.get(&k), Some(&k));
        }

        assert_eq!(table.insert(4, 400), None);
        assert_eq!(table.at(&4), Ok(&400));
    }

    #[test]
    fn remove_entry_returns_key() {
        let mut table: Table<String, u32> = Table::default();
        table.insert("alpha".to_string(), 1);
        assert_eq!(table.remove_entry("alpha"), Some(("alpha".to_string(), 1)));
        assert_eq!(table.remove_entry("alpha"), None);
    }

    #[test]
    fn odd_sum_after_removing_evens() {
        let mut table: Table<i32, i32> = Table::default();
        for i in 0..1024 {
            *table.get_or_insert_default(i) = i;
        }
        for i in (0..1024).step_by(2) {
            table.remove(&i);
        }

        let sum: i32 = (0..1024).map(|i| *table.get_or_insert_default(i)).sum();
        assert_eq!(sum, 512 * 512);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let mut table: Table<u64, u64> = Table::default();
        for k in 0..10_000u64 {
            table.insert(k, !k);
        }

        assert_eq!(table.len(), 10_000);
        for k in 0..10_000u64 {
            assert_eq!(table.get(&k), Some(&!k));
        }
        assert!(table.capacity() >= 20_000);
    }

    #[test]
    fn growth_schedule() {
        let mut table: Table<u32, ()> = Table::default();
        assert_eq!(table.capacity(), 0);

        let expected = [
            (1, 16),
            (8, 16),
            (9, 128),
            (64, 128),
            (65, 1024),
            (512, 1024),
            (513, 8192),
            (4096, 8192),
            (4097, 16384),
        ];

        let mut inserted = 0;
        for (count, capacity) in expected {
            while inserted < count {
                table.insert(inserted, ());
                inserted += 1;
            }
            assert_eq!(table.capacity(), capacity, "after {count} inserts");
        }
    }

    #[test]
    fn tombstone_heavy_growth_rehashes_in_place() {
        let mut table: Table<u32, u32> = HashTable::with_capacity_and_hasher(64, Default::default());
        for k in 0..32 {
            table.insert(k, k);
        }
        assert_eq!(table.capacity(), 64);

        for k in 0..30 {
            table.remove(&k);
        }
        assert_eq!(table.tombstones(), 30);

        table.insert(100, 100);
        assert_eq!(table.capacity(), 64);
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.len(), 3);
        for k in [30, 31, 100] {
            assert_eq!(table.get(&k), Some(&k));
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn load_stays_at_most_half() {
        let mut rng = SmallRng::seed_from_u64(0xA11CE);
        let mut table: Table<u32, u32> = Table::default();
        for _ in 0..20_000 {
            let key = rng.random_range(0..2048u32);
            if rng.random_range(0..3) == 0 {
                table.remove(&key);
            } else {
                table.insert(key, key);
                assert!((table.len() + table.tombstones()) * 2 <= table.capacity());
            }
        }
    }

    #[test]
    fn explicit_collision() {
        let mut table = HashTable::with_hasher(FnHasher(|_: &u64| 0));
        for k in 0..100u64 {
            table.insert(k, k);
        }

        for k in (0..100u64).step_by(2) {
            assert_eq!(table.remove(&k), Some(k));
        }

        for k in 0..100u64 {
            assert_eq!(table.get(&k), if k % 2 == 0 { None } else { Some(&k) });
        }

        for k in (0..100u64).step_by(2) {
            assert_eq!(table.insert(k, k + 1), None);
        }
        assert_eq!(table.len(), 100);
        for k in (0..100u64).step_by(2) {
            assert_eq!(table.get(&k), Some(&(k + 1)));
        }
    }

    #[test]
    fn custom_hash_function() {
        let mut table = HashTable::with_hasher(FnHasher(|k: &i64| (k * k) as u64));
        for i in 0..1024i64 {
            table.insert(i, i);
        }

        for (key, value) in &table {
            assert_eq!(key, value);
        }
        assert_eq!(table.len(), 1024);
    }

    #[test]
    fn no_duplicate_behind_tombstone() {
        // Keys 0, 1 and 2 share a home slot, so 2 sits behind two earlier
        // entries on the probe sequence.
        let mut table = HashTable::with_capacity_and_hasher(16, FnHasher(|_: &u32| 3));
        table.insert(0, 'a');
        table.insert(1, 'b');
        table.insert(2, 'c');
        table.remove(&0);

        assert_eq!(table.insert(2, 'C'), Some('c'));
        assert_eq!(table.len(), 2);
        assert_eq!(table.iter().filter(|(k, _)| **k == 2).count(), 1);

        table.insert(5, 'f');
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.find(&5).and_then(|c| c.index()), Some(3));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn matches_reference_map() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        let mut table: Table<u32, u32> = Table::default();
        let mut reference = hashbrown::HashMap::new();

        for step in 0..50_000 {
            let key = rng.random_range(0..1024u32);
            let value = rng.random::<u32>();
            match rng.random_range(0..6) {
                0..=2 => {
                    assert_eq!(table.insert(key, value), reference.insert(key, value));
                }
                3 | 4 => {
                    assert_eq!(table.remove(&key), reference.remove(&key));
                }
                _ => {
                    let expected = *reference.entry(key).or_insert(value);
                    assert_eq!(*table.emplace(key, value), expected);
                }
            }

            if step % 1000 == 0 {
                assert_eq!(table.len(), reference.len());
            }
        }

        assert_eq!(table.len(), reference.len());
        for (key, value) in table.iter() {
            assert_eq!(reference.get(key), Some(value));
        }
        for (key, value) in reference.iter() {
            assert_eq!(table.at(key), Ok(value));
        }
        for key in 0..1024u32 {
            assert_eq!(table.contains_key(&key), reference.contains_key(&key));
        }
    }

    #[test]
    fn resize_preserves_entries() {
        let mut table: Table<u64, u64> = Table::default();
        for k in 0..5u64 {
            table.insert(k, k * k);
        }
        table.remove(&0);

        assert_eq!(
            table.resize(3),
            Err(Error::InvalidResize {
                requested: 3,
                len: 4
            })
        );

        table.resize(4).unwrap();
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.tombstones(), 0);
        for k in 1..5u64 {
            assert_eq!(table.get(&k), Some(&(k * k)));
        }
        assert_eq!(table.get(&0), None);

        table.insert(10, 100);
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.len(), 5);

        table.resize(1000).unwrap();
        assert_eq!(table.capacity(), 1000);
        for k in 1..5u64 {
            assert_eq!(table.get(&k), Some(&(k * k)));
        }
        assert_eq!(table.get(&10), Some(&100));
    }

    #[test]
    fn resize_empty_to_zero_deallocates() {
        let mut table: Table<u64, u64> = HashTable::with_capacity_and_hasher(32, Default::default());
        table.resize(0).unwrap();
        assert_eq!(table.capacity(), 0);
        table.insert(1, 1);
        assert_eq!(table.capacity(), 16);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_hasher_leaves_table_intact() {
        use core::cell::Cell;
        use std::panic::AssertUnwindSafe;
        use std::panic::catch_unwind;

        let armed = Cell::new(false);
        let mut table = HashTable::with_hasher(FnHasher(|k: &u32| {
            if armed.get() && *k == 7 {
                panic!("hasher failure");
            }
            *k as u64
        }));
        for k in 0..8u32 {
            table.insert(k, k);
        }

        armed.set(true);
        let capacity = table.capacity();
        let result = catch_unwind(AssertUnwindSafe(|| table.resize(64)));
        assert!(result.is_err());

        armed.set(false);
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.len(), 8);
        for k in 0..8u32 {
            assert_eq!(table.get(&k), Some(&k));
        }
    }

    #[test]
    fn reserve_and_shrink() {
        let mut table: Table<u32, u32> = Table::default();
        table.reserve(100);
        let capacity = table.capacity();
        assert!(capacity >= 200);
        for k in 0..100 {
            table.insert(k, k);
        }
        assert_eq!(table.capacity(), capacity);

        for k in 10..100 {
            table.remove(&k);
        }
        table.shrink_to_fit();
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.tombstones(), 0);
        for k in 0..10 {
            assert_eq!(table.get(&k), Some(&k));
        }

        table.clear();
        table.shrink_to_fit();
        assert_eq!(table.capacity(), 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn reserve_overflow_leaves_table_intact() {
        use std::panic::AssertUnwindSafe;
        use std::panic::catch_unwind;

        let mut table: Table<u32, u32> = Table::default();
        for k in 0..100 {
            table.insert(k, k);
        }
        let capacity = table.capacity();

        let result = catch_unwind(AssertUnwindSafe(|| table.reserve(usize::MAX / 2)));
        assert!(result.is_err());

        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.len(), 100);
        assert_eq!(table.iter().count(), 100);
        for k in 0..100 {
            assert_eq!(table.get(&k), Some(&k));
        }
    }

    #[test]
    fn from_array_infers_default_hasher() {
        let table = HashTable::from([(1, 'a'), (2, 'b')]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&2), Some(&'b'));
    }

    #[test]
    fn clear_keeps_allocation() {
        let mut table: Table<u32, String> = Table::default();
        for k in 0..50 {
            table.insert(k, k.to_string());
        }
        table.remove(&3);
        let capacity = table.capacity();

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.iter().count(), 0);

        table.insert(3, "three".to_string());
        assert_eq!(table.get(&3).map(String::as_str), Some("three"));
    }

    #[test]
    fn iter_and_drain() {
        let mut table: Table<u64, u64> = Table::default();
        for k in 0..100u64 {
            table.insert(k, k + 1);
        }

        let mut keys: Vec<u64> = table.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());

        let forward: Vec<_> = table.iter().collect();
        let mut backward: Vec<_> = table.iter().rev().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(table.iter().len(), 100);
        assert_eq!(table.values().sum::<u64>(), (1..=100).sum());

        for value in table.values_mut() {
            *value *= 2;
        }
        for (key, value) in table.iter_mut() {
            assert_eq!(*value, (key + 1) * 2);
            *value = *key;
        }

        let capacity = table.capacity();
        let mut drained: Vec<_> = table.drain().collect();
        drained.sort_unstable();
        assert_eq!(drained, (0..100).map(|k| (k, k)).collect::<Vec<_>>());
        assert!(table.is_empty());
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.capacity(), capacity);
    }

    #[test]
    fn partial_drain_clears_table() {
        let mut table: Table<u32, String> = Table::default();
        for k in 0..20 {
            table.insert(k, k.to_string());
        }

        let taken: Vec<_> = table.drain().take(5).collect();
        assert_eq!(taken.len(), 5);
        assert!(table.is_empty());
        assert_eq!(table.tombstones(), 0);
    }

    #[test]
    fn into_iter_yields_everything() {
        let table: Table<String, usize> = (0..40)
            .map(|i| (format!("key{i}"), i))
            .collect();

        let mut pairs: Vec<_> = table.into_iter().collect();
        pairs.sort_by_key(|(_, v)| *v);
        assert_eq!(pairs.len(), 40);
        assert_eq!(pairs[17], ("key17".to_string(), 17));
    }

    #[test]
    fn values_are_dropped_exactly_once() {
        let marker = Rc::new(());
        {
            let mut table: Table<u32, Rc<()>> = Table::default();
            for k in 0..200 {
                table.insert(k, marker.clone());
            }
            assert_eq!(Rc::strong_count(&marker), 201);

            for k in 0..50 {
                table.remove(&k);
            }
            assert_eq!(Rc::strong_count(&marker), 151);

            table.insert(0, marker.clone());
            assert!(table.insert(0, marker.clone()).is_some());
            assert_eq!(Rc::strong_count(&marker), 152);

            let cloned = table.clone();
            assert_eq!(Rc::strong_count(&marker), 303);
            drop(cloned);

            table.resize(4096).unwrap();
            assert_eq!(Rc::strong_count(&marker), 152);

            let mut iter = table.into_iter();
            let _first = iter.next();
            drop(iter);
            assert_eq!(Rc::strong_count(&marker), 2);
        }
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn string_keys() {
        let mut table: Table<String, u32> = Table::default();
        for (i, word) in ["apple", "banana", "cherry", "date"].iter().enumerate() {
            table.insert(word.to_string(), i as u32);
        }

        assert_eq!(table.get("banana"), Some(&1));
        assert_eq!(table.get_key_value("cherry"), Some((&"cherry".to_string(), &2)));
        assert!(table.contains_key("date"));
        assert!(!table.contains_key("elderberry"));
        assert_eq!(table.remove("apple"), Some(0));
        assert_eq!(table.at("apple"), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_clone() {
        let mut table: Table<u64, String> = Table::default();
        for k in 0..64u64 {
            table.insert(k, format!("value_{k}"));
        }
        for k in 0..16u64 {
            table.remove(&k);
        }

        let cloned = table.clone();
        assert_eq!(cloned.len(), table.len());
        assert_eq!(cloned.capacity(), table.capacity());
        assert_eq!(cloned.tombstones(), table.tombstones());
        assert_eq!(
            cloned.iter().collect::<Vec<_>>(),
            table.iter().collect::<Vec<_>>()
        );
        assert!(cloned == table);

        for k in 16..64u64 {
            assert_eq!(cloned.get(&k), Some(&format!("value_{k}")));
        }
        for k in 0..16u64 {
            assert_eq!(cloned.get(&k), None);
        }
    }

    #[test]
    fn test_clone_empty_table() {
        let table: Table<u64, u64> = Table::default();
        let cloned = table.clone();
        assert!(cloned.is_empty());
        assert_eq!(cloned.capacity(), 0);
    }

    #[test]
    fn equality_ignores_layout_and_hasher() {
        let mut a: Table<u32, u32> = Table::default();
        let mut b = HashTable::with_hasher(FnHasher(|k: &u32| *k as u64));
        for k in 0..100 {
            a.insert(k, k * 3);
        }
        for k in (0..100).rev() {
            b.insert(k, k * 3);
        }
        assert!(a == b);

        b.insert(5, 0);
        assert!(a != b);

        b.insert(5, 15);
        b.insert(1000, 0);
        assert!(a != b);

        b.remove(&1000);
        assert!(a == b);
    }

    #[test]
    fn from_array_keeps_last_duplicate() {
        let table: HashTable<&str, i32> = HashTable::from([("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(&3));
    }

    #[test]
    fn cursor_walks_active_slots() {
        let mut table = HashTable::with_capacity_and_hasher(16, FnHasher(|k: &usize| *k as u64));
        for k in [1usize, 4, 9, 12] {
            table.insert(k, k * 10);
        }
        table.remove(&9);

        let mut cursor = table.cursor_front();
        let mut seen = Vec::new();
        while let Some((key, _)) = cursor.get() {
            seen.push(*key);
            cursor.move_next();
        }
        assert_eq!(seen, [1, 4, 12]);
        assert_eq!(cursor.index(), None);

        cursor.move_next();
        assert_eq!(cursor.get(), Some((&1, &10)));

        cursor.move_prev();
        assert_eq!(cursor.index(), None);
        cursor.move_prev();
        assert_eq!(cursor.get(), Some((&12, &120)));
        assert_eq!(cursor, table.cursor_back());

        let found = table.find(&4).unwrap();
        assert_eq!(found.index(), Some(4));
        let mut from_front = table.cursor_front();
        from_front.move_next();
        assert_eq!(found, from_front);

        let other = table.clone();
        assert_ne!(other.find(&4).unwrap(), found);
    }

    #[test]
    fn cursor_on_empty_table() {
        let table: Table<u32, u32> = Table::default();
        let mut cursor = table.cursor_front();
        assert_eq!(cursor.get(), None);
        cursor.move_next();
        cursor.move_prev();
        assert_eq!(cursor.get(), None);
        assert_eq!(table.cursor_front(), table.cursor_back());
    }

    #[test]
    fn cursor_mut_edits_and_removes() {
        let mut table: Table<u32, u32> = (0..32).map(|k| (k, k)).collect();

        let mut cursor = table.find_mut(&5).unwrap();
        if let Some((_, value)) = cursor.get_mut() {
            *value = 500;
        }
        assert_eq!(cursor.remove_current(), Some((5, 500)));
        assert!(cursor.as_cursor().get().is_none_or(|(k, _)| *k != 5));

        let mut cursor = table.cursor_front_mut();
        let mut removed = 0;
        while cursor.get().is_some() {
            if cursor.get().is_some_and(|(k, _)| k % 4 == 0) {
                cursor.remove_current();
                removed += 1;
            } else {
                cursor.move_next();
            }
        }
        assert_eq!(cursor.remove_current(), None);
        assert_eq!(removed, 8);
        assert_eq!(table.len(), 32 - 1 - 8);
        assert!(table.keys().all(|k| k % 4 != 0 && *k != 5));
    }

    #[test]
    fn histogram_output() {
        let mut table: Table<u64, u64> = Table::default();
        for k in 0..1000u64 {
            table.insert(k, k);
        }

        let hist = table.probe_histogram();
        assert_eq!(hist.iter().sum::<usize>(), 1000);

        let stats = table.debug_stats();
        assert_eq!(stats.len, 1000);
        assert_eq!(stats.capacity, table.capacity());
        assert_eq!(stats.max_probe_length + 1, hist.len());
        assert!(stats.load_factor <= 0.5);
        assert!(stats.mean_probe_length >= 0.0);
        #[cfg(feature = "std")]
        stats.print();
    }

    #[test]
    fn debug_renders_map() {
        let mut table = HashTable::with_capacity_and_hasher(8, FnHasher(|k: &u8| *k as u64));
        table.insert(2u8, "two");
        table.insert(1u8, "one");
        assert_eq!(format!("{table:?}"), r#"{1: "one", 2: "two"}"#);
    }
}
