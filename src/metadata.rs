//! Process-wide cache of resolved injection metadata.
//!
//! Every registration carries a [`TypeMetadata`] describing the dependencies
//! its instantiator and member injectors declared. The first time a type's
//! metadata is published it is memoized here, so diagnostics and repeated
//! builder runs read the computed shape instead of recomputing it.

use ahash::AHasher;
use alloc::{boxed::Box, collections::BTreeMap, sync::Arc};
use core::{
    any::TypeId,
    hash::{Hash, Hasher as _},
};
use parking_lot::{Mutex, RwLock};

use crate::any::TypeInfo;

/// Cached injection shape of a single service type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMetadata {
    pub type_info: TypeInfo,
    pub constructor_dependencies: Box<[TypeInfo]>,
    pub member_dependencies: Box<[TypeInfo]>,
}

static CACHE: RwLock<BTreeMap<TypeId, Arc<TypeMetadata>>> = RwLock::new(BTreeMap::new());

const STRIPES: usize = 16;

/// Per-type publication locks, striped by a hash of the [`TypeId`].
/// Two threads publishing the same type serialize on one stripe; threads
/// publishing unrelated types almost always take different stripes.
static PUBLISH_LOCKS: [Mutex<()>; STRIPES] = [const { Mutex::new(()) }; STRIPES];

fn stripe_of(type_id: TypeId) -> usize {
    let mut hasher = AHasher::default();
    type_id.hash(&mut hasher);
    (hasher.finish() % STRIPES as u64) as usize
}

/// Memoizes `metadata`, returning the cached [`Arc`] shared by every
/// registration of the type.
///
/// The fast path is a shared read of the map. On a miss (or a shape
/// change, which happens when a type is re-registered with different
/// dependencies) the caller takes the type's stripe lock, re-checks, and
/// publishes, so concurrent first publications of one type install a
/// single entry.
pub(crate) fn publish(metadata: TypeMetadata) -> Arc<TypeMetadata> {
    let type_id = metadata.type_info.id;

    if let Some(existing) = CACHE.read().get(&type_id) {
        if **existing == metadata {
            return Arc::clone(existing);
        }
    }

    let _guard = PUBLISH_LOCKS[stripe_of(type_id)].lock();

    let mut cache = CACHE.write();
    if let Some(existing) = cache.get(&type_id) {
        if **existing == metadata {
            return Arc::clone(existing);
        }
    }

    let shared = Arc::new(metadata);
    cache.insert(type_id, Arc::clone(&shared));
    shared
}

/// Returns the cached injection metadata for `T`, if any container builder
/// has published it in this process.
#[must_use]
pub fn injection_info<T: ?Sized + 'static>() -> Option<Arc<TypeMetadata>> {
    CACHE.read().get(&TypeId::of::<T>()).cloned()
}

/// Drops every cached entry. Subsequent publications recompute from the
/// builder's declarations.
pub fn clear() {
    CACHE.write().clear();
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, vec::Vec};

    use super::{clear, injection_info, publish, TypeMetadata};
    use crate::any::TypeInfo;

    // The cache is process-wide, so tests touching it must not interleave.
    static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

    struct Database;
    struct Repository;

    fn repository_metadata() -> TypeMetadata {
        TypeMetadata {
            type_info: TypeInfo::of::<Repository>(),
            constructor_dependencies: Box::from([TypeInfo::of::<Database>()]),
            member_dependencies: Box::from([]),
        }
    }

    #[test]
    fn test_publish_memoizes() {
        let _guard = TEST_LOCK.lock();
        clear();

        let first = publish(repository_metadata());
        let second = publish(repository_metadata());
        assert!(alloc::sync::Arc::ptr_eq(&first, &second));

        let info = injection_info::<Repository>().unwrap();
        assert_eq!(
            info.constructor_dependencies.iter().collect::<Vec<_>>(),
            [&TypeInfo::of::<Database>()],
        );
    }

    #[test]
    fn test_republish_with_new_shape_replaces() {
        let _guard = TEST_LOCK.lock();
        clear();

        publish(repository_metadata());
        let changed = publish(TypeMetadata {
            type_info: TypeInfo::of::<Repository>(),
            constructor_dependencies: Box::from([]),
            member_dependencies: Box::from([TypeInfo::of::<Database>()]),
        });

        let info = injection_info::<Repository>().unwrap();
        assert_eq!(*info, *changed);
    }

    #[test]
    fn test_clear_forgets() {
        let _guard = TEST_LOCK.lock();
        publish(repository_metadata());
        clear();
        assert!(injection_info::<Repository>().is_none());
    }
}
