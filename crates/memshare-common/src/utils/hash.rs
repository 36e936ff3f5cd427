//! Fast hashing aliases.
//!
//! All internal tables use ahash via hashbrown; these aliases keep the
//! choice in one place.

/// Hash map with a fast, DoS-resistant hasher.
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// Hash set counterpart of [`FxHashMap`].
pub type FxHashSet<T> = hashbrown::HashSet<T, ahash::RandomState>;
