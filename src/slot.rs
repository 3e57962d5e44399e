use core::borrow::Borrow;
use core::mem::MaybeUninit;

/// The state of a single slot.
///
/// `Inactive` must stay zero: fresh state arrays are produced by zeroing the
/// allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum SlotState {
    /// Never used since the last rehash or clear. Terminates probes.
    #[default]
    Inactive = 0,
    /// Holds an initialized `(K, V)` pair.
    Active = 1,
    /// Held a pair that was removed. Probes continue past it; inserts may
    /// reuse it.
    Tombstone = 2,
}

/// Outcome of [`probe_insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The key is stored at this index.
    Occupied(usize),
    /// The key is absent and may be written at this index.
    Vacant(usize),
    /// The key is absent and every slot is active.
    Exhausted,
}

/// Maps a hash onto its home slot.
///
/// Power-of-two capacities use a mask, everything else a modulo; both give
/// the same index.
#[inline(always)]
pub(crate) fn home_index(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    if capacity.is_power_of_two() {
        hash as usize & (capacity - 1)
    } else {
        (hash % capacity as u64) as usize
    }
}

#[inline(always)]
pub(crate) fn next_index(index: usize, capacity: usize) -> usize {
    if index + 1 == capacity { 0 } else { index + 1 }
}

/// Walks the probe sequence looking for `key`.
///
/// Tombstones and active slots holding other keys are skipped. The walk
/// stops at the first inactive slot or after visiting every slot once.
///
/// # Safety
///
/// - `states` and `slots` must have the same length.
/// - `home` must be less than that length, or the length must be zero.
/// - Every slot whose state is [`SlotState::Active`] must be initialized.
#[inline]
pub(crate) unsafe fn find_index<K, V, Q>(
    states: &[SlotState],
    slots: &[MaybeUninit<(K, V)>],
    home: usize,
    key: &Q,
) -> Option<usize>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    debug_assert_eq!(states.len(), slots.len());
    let capacity = states.len();
    let mut index = home;
    for _ in 0..capacity {
        // SAFETY: `index` starts at `home < capacity` and `next_index` keeps it
        // below `capacity`; both slices have `capacity` elements.
        unsafe {
            match *states.get_unchecked(index) {
                SlotState::Inactive => return None,
                SlotState::Active => {
                    let (k, _) = slots.get_unchecked(index).assume_init_ref();
                    if k.borrow() == key {
                        return Some(index);
                    }
                }
                SlotState::Tombstone => {}
            }
        }
        index = next_index(index, capacity);
    }

    None
}

/// Walks the probe sequence for `key`, remembering the first reusable slot.
///
/// This is the read probe of [`find_index`] fused with the write probe: the
/// key is only reported vacant once the read probe has proven it absent, so
/// an entry sitting behind a tombstone is never duplicated.
///
/// # Safety
///
/// Same requirements as [`find_index`].
#[inline]
pub(crate) unsafe fn probe_insert<K, V>(
    states: &[SlotState],
    slots: &[MaybeUninit<(K, V)>],
    home: usize,
    key: &K,
) -> Probe
where
    K: Eq,
{
    debug_assert_eq!(states.len(), slots.len());
    let capacity = states.len();
    let mut reusable = None;
    let mut index = home;
    for _ in 0..capacity {
        // SAFETY: `index` stays below `capacity`, see `find_index`.
        unsafe {
            match *states.get_unchecked(index) {
                SlotState::Inactive => return Probe::Vacant(reusable.unwrap_or(index)),
                SlotState::Active => {
                    let (k, _) = slots.get_unchecked(index).assume_init_ref();
                    if k == key {
                        return Probe::Occupied(index);
                    }
                }
                SlotState::Tombstone => {
                    if reusable.is_none() {
                        reusable = Some(index);
                    }
                }
            }
        }
        index = next_index(index, capacity);
    }

    match reusable {
        Some(index) => Probe::Vacant(index),
        None => Probe::Exhausted,
    }
}

/// Finds the first non-active slot on the probe sequence starting at `home`.
///
/// Only valid when the key being placed is known to be absent, as during a
/// rehash.
#[inline]
pub(crate) fn find_vacant(states: &[SlotState], home: usize) -> Option<usize> {
    let capacity = states.len();
    let mut index = home;
    for _ in 0..capacity {
        if states[index] != SlotState::Active {
            return Some(index);
        }
        index = next_index(index, capacity);
    }

    None
}

/// Returns the first active index in `from..`, or `states.len()`.
#[inline]
pub(crate) fn next_active(states: &[SlotState], from: usize) -> usize {
    states
        .iter()
        .skip(from)
        .position(|&s| s == SlotState::Active)
        .map_or(states.len(), |offset| from + offset)
}

/// Returns the last active index in `..until`, if any.
#[inline]
pub(crate) fn prev_active(states: &[SlotState], until: usize) -> Option<usize> {
    states[..until.min(states.len())]
        .iter()
        .rposition(|&s| s == SlotState::Active)
}

/// Distance travelled along the probe sequence from `home` to `index`.
#[cfg(any(test, feature = "stats"))]
#[inline]
pub(crate) fn probe_distance(home: usize, index: usize, capacity: usize) -> usize {
    if index >= home {
        index - home
    } else {
        capacity - home + index
    }
}
