//! Collision-resolution policies and the probe sequence they generate.

use std::hash::{BuildHasher, BuildHasherDefault, Hasher};

use ahash::AHasher;

/// Signature of a key hash. Must be deterministic for the table's lifetime.
pub type HashFn = fn(&str) -> u64;

/// Step base for double hashing: the stride is `DOUBLE_HASH_PRIME - hash % DOUBLE_HASH_PRIME`.
const DOUBLE_HASH_PRIME: u64 = 11;

/// Collision-resolution policy of a table.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ProbePolicy {
    /// Home slot only. A collision fails the operation.
    None,
    /// `home + i^2`
    #[default]
    Quadratic,
    /// `home + i * (11 - hash % 11)`
    DoubleHash,
}

/// Slot index for probe `i` of a key with hash `hash` in a table of
/// `capacity` slots.
///
/// Returns `None` once the policy has no further probe to offer, which for
/// [`ProbePolicy::None`] is any `i > 0`.
#[inline]
pub fn next_probe(policy: ProbePolicy, hash: u64, i: usize, capacity: usize) -> Option<usize> {
    debug_assert!(capacity > 0);
    let cap = capacity as u64;
    let home = hash % cap;
    let i = i as u64;
    let idx = match policy {
        ProbePolicy::None if i > 0 => return None,
        ProbePolicy::None => home,
        // i < capacity <= MAXPRIME, so i * i stays far below u64::MAX.
        ProbePolicy::Quadratic => (home + (i * i) % cap) % cap,
        ProbePolicy::DoubleHash => {
            let mut stride = DOUBLE_HASH_PRIME - hash % DOUBLE_HASH_PRIME;
            // A stride that is a multiple of the capacity would pin every
            // probe to the home slot.
            if stride % cap == 0 {
                stride = 1;
            }
            (home + (i * stride) % cap) % cap
        }
    };
    Some(idx as usize)
}

/// Default key hash: a default-keyed `AHasher`, stable for the life of the
/// process.
pub fn default_hash(key: &str) -> u64 {
    let mut h = BuildHasherDefault::<AHasher>::default().build_hasher();
    h.write(key.as_bytes());
    h.finish()
}
