//! Fast hash map and hash set type aliases.
//!
//! The allowlist is probed once per detected match, with short string keys and
//! no untrusted hash-flooding concern, which is the workload `FxHash` suits.
//!
//! # Examples
//!
//! ```
//! use el_core::{FxHashSet, fx_hash_set};
//!
//! let mut set: FxHashSet<&str> = fx_hash_set();
//! set.insert("✅");
//! assert!(set.contains("✅"));
//! ```

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashSet`].
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}

/// Creates a new [`FxHashSet`] with the specified capacity.
///
/// # Examples
///
/// ```
/// use el_core::fx_hash_set_with_capacity;
///
/// let set: el_core::FxHashSet<String> = fx_hash_set_with_capacity(16);
/// assert!(set.capacity() >= 16);
/// ```
#[inline]
#[must_use]
pub fn fx_hash_set_with_capacity<V>(capacity: usize) -> FxHashSet<V> {
    FxHashSet::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_hash_set_operations() {
        let mut set: FxHashSet<String> = fx_hash_set();
        set.insert("😀".to_owned());
        assert!(set.contains("😀"));
        assert!(!set.contains("😃"));
    }

    #[test]
    fn test_fx_hash_set_with_capacity() {
        let set: FxHashSet<String> = fx_hash_set_with_capacity(100);
        assert!(set.capacity() >= 100);
    }
}
