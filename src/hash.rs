use core::hash::BuildHasher;
use core::hash::Hash;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when a table is created without one.
        ///
        /// With the `foldhash` feature this is `foldhash::fast::RandomState`.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when a table is created without one.
        ///
        /// Without the `foldhash` feature this is the standard library's
        /// randomly seeded SipHash builder.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// The hasher builder used when a table is created without one.
        ///
        /// Without `foldhash` or `std` this is the deterministic
        /// [`XorShiftState`].
        pub type DefaultHashBuilder = XorShiftState;
    }
}

/// A hash function object mapping keys to 64-bit hashes.
///
/// Tables store their `KeyHasher` by value and clone it along with the table.
/// Every [`BuildHasher`] is a `KeyHasher` for every [`Hash`] key, and
/// [`FnHasher`] turns a plain closure into one.
///
/// Implementations must be consistent: equal keys must produce equal hashes
/// for the lifetime of the table. When lookups go through a borrowed form `Q`
/// of the key, hashing `Q` must agree with hashing `K`, as with
/// [`core::borrow::Borrow`].
pub trait KeyHasher<K: ?Sized> {
    /// Hashes a single key.
    fn hash_key(&self, key: &K) -> u64;
}

impl<K, S> KeyHasher<K> for S
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.hash_one(key)
    }
}

/// Adapts a closure `Fn(&K) -> u64` into a [`KeyHasher`].
///
/// # Examples
///
/// ```rust
/// use linprobe::FnHasher;
/// use linprobe::HashTable;
///
/// let mut table = HashTable::with_hasher(FnHasher(|k: &u64| k.wrapping_mul(*k)));
/// for i in 0..64u64 {
///     table.insert(i, i);
/// }
/// assert_eq!(table.get(&7), Some(&7));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FnHasher<F>(pub F);

impl<K, F> KeyHasher<K> for FnHasher<F>
where
    K: ?Sized,
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        (self.0)(key)
    }
}

/// A deterministic, unseeded hasher builder based on xorshift mixing.
///
/// Integers are mixed with the shift triple of Marsaglia's xorshift
/// generators; other inputs are folded in eight bytes at a time. It is cheap
/// and reproducible, but offers no protection against adversarial keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XorShiftState;

impl BuildHasher for XorShiftState {
    type Hasher = XorShiftHasher;

    fn build_hasher(&self) -> Self::Hasher {
        XorShiftHasher { state: 0 }
    }
}

/// The [`Hasher`] produced by [`XorShiftState`].
#[derive(Clone, Copy, Debug)]
pub struct XorShiftHasher {
    state: u64,
}

impl XorShiftHasher {
    #[inline(always)]
    fn mix(&mut self, word: u64) {
        let mut x = self.state ^ word;
        x ^= x << 16;
        x ^= x >> 5;
        x ^= x << 1;
        self.state = x;
    }
}

impl Hasher for XorShiftHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut chunks = bytes.chunks_exact(8);
        for chunk in &mut chunks {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            self.mix(u64::from_le_bytes(word));
        }

        let rest = chunks.remainder();
        if !rest.is_empty() {
            let mut word = [0u8; 8];
            word[..rest.len()].copy_from_slice(rest);
            self.mix(u64::from_le_bytes(word) ^ ((rest.len() as u64) << 56));
        }
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.mix(i as u64);
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.mix(i as u64);
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.mix(i as u64);
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.mix(i);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.mix(i as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_hasher_is_a_key_hasher() {
        let state = XorShiftState;
        assert_eq!(state.hash_key(&42u64), state.hash_one(42u64));
        assert_eq!(state.hash_key("abc"), state.hash_one("abc"));
    }

    #[test]
    fn xorshift_is_deterministic() {
        let a = XorShiftState.hash_key(&12345u32);
        let b = XorShiftState.hash_key(&12345u32);
        assert_eq!(a, b);
        assert_ne!(a, XorShiftState.hash_key(&12346u32));
    }

    #[test]
    fn xorshift_distinguishes_trailing_bytes() {
        let mut a = XorShiftState.build_hasher();
        a.write(&[1, 2, 3]);
        let mut b = XorShiftState.build_hasher();
        b.write(&[1, 2, 3, 0]);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn fn_hasher_calls_closure() {
        let hasher = FnHasher(|k: &i32| (*k as u64) * 3);
        assert_eq!(hasher.hash_key(&5), 15);
    }
}
