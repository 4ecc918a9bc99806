use ahash::AHasher;
use alloc::{boxed::Box, vec::Vec};
use core::{
    any::TypeId,
    hash::{Hash, Hasher as _},
};

use crate::any::TypeInfo;

/// Identifies a registration: the service type plus an optional
/// disambiguating key for multiple registrations of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ServiceKey {
    pub(crate) type_id: TypeId,
    pub(crate) name: Option<&'static str>,
}

impl ServiceKey {
    #[inline]
    #[must_use]
    pub(crate) fn of<T: ?Sized + 'static>(name: Option<&'static str>) -> Self {
        Self {
            type_id: TypeInfo::of::<T>().id,
            name,
        }
    }
}

/// Multiplier used to fold the key hash into the type hash, so that a named
/// registration never lands on the slot computed for the bare type.
const KEY_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

fn combined_hash(key: &ServiceKey) -> u64 {
    let mut hasher = AHasher::default();
    key.type_id.hash(&mut hasher);
    let type_hash = hasher.finish();

    match key.name {
        None => type_hash,
        Some(name) => {
            let mut hasher = AHasher::default();
            name.hash(&mut hasher);
            type_hash.wrapping_mul(KEY_MIX) ^ hasher.finish()
        }
    }
}

/// Immutable hash table for the container's hot resolution path.
///
/// Built once from the final registration list; capacity is the next power
/// of two above `entries / 0.75` and never changes, so lookups are a single
/// masked index plus a scan of a short per-bucket vector. Read-only after
/// build, hence safe to share between resolving threads without locking.
pub(crate) struct TypeKeyedMap<V> {
    buckets: Box<[Vec<(ServiceKey, V)>]>,
    mask: u64,
}

impl<V> TypeKeyedMap<V> {
    #[must_use]
    pub(crate) fn build(entries: Vec<(ServiceKey, V)>) -> Self {
        let capacity = core::cmp::max(1, (entries.len() * 4).div_ceil(3)).next_power_of_two();

        let mut buckets: Vec<Vec<(ServiceKey, V)>> = (0..capacity).map(|_| Vec::new()).collect();
        for (key, value) in entries {
            let slot = (combined_hash(&key) & (capacity as u64 - 1)) as usize;
            let bucket = &mut buckets[slot];
            match bucket.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, existing_value)) => *existing_value = value,
                None => bucket.push((key, value)),
            }
        }

        Self {
            buckets: buckets.into_boxed_slice(),
            mask: capacity as u64 - 1,
        }
    }

    #[must_use]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<&V> {
        let slot = (combined_hash(key) & self.mask) as usize;
        self.buckets[slot].iter().find(|(existing, _)| existing == key).map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{ServiceKey, TypeKeyedMap};

    struct A;
    struct B;

    #[test]
    fn test_empty() {
        let map = TypeKeyedMap::<u8>::build(Vec::new());
        assert!(map.get(&ServiceKey::of::<A>(None)).is_none());
    }

    #[test]
    fn test_get_by_type_and_key() {
        let map = TypeKeyedMap::build(Vec::from([
            (ServiceKey::of::<A>(None), 1u8),
            (ServiceKey::of::<A>(Some("fallback")), 2u8),
            (ServiceKey::of::<B>(None), 3u8),
        ]));

        assert_eq!(map.get(&ServiceKey::of::<A>(None)), Some(&1));
        assert_eq!(map.get(&ServiceKey::of::<A>(Some("fallback"))), Some(&2));
        assert_eq!(map.get(&ServiceKey::of::<B>(None)), Some(&3));
        assert_eq!(map.get(&ServiceKey::of::<B>(Some("fallback"))), None);
    }

    #[test]
    fn test_last_registration_wins() {
        let map = TypeKeyedMap::build(Vec::from([
            (ServiceKey::of::<A>(None), 1u8),
            (ServiceKey::of::<A>(None), 2u8),
        ]));

        assert_eq!(map.get(&ServiceKey::of::<A>(None)), Some(&2));
    }

    #[test]
    fn test_many_entries_survive_collisions() {
        let keys = [
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t",
        ];
        let entries: Vec<_> = keys
            .iter()
            .enumerate()
            .map(|(index, name)| (ServiceKey::of::<A>(Some(name)), index))
            .collect();
        let map = TypeKeyedMap::build(entries);

        for (index, name) in keys.iter().enumerate() {
            assert_eq!(map.get(&ServiceKey::of::<A>(Some(name))), Some(&index));
        }
    }
}
