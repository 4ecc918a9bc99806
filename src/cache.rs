use alloc::{collections::BTreeMap, sync::Arc};
use core::any::Any;

use crate::lookup::ServiceKey;

/// Instance storage owned by one container level.
///
/// The root container's partition holds singletons, each scope's partition
/// holds its scoped instances. Transients never enter a partition.
#[derive(Default)]
pub(crate) struct CachePartition {
    map: BTreeMap<ServiceKey, Arc<dyn Any + Send + Sync>>,
}

impl CachePartition {
    #[must_use]
    pub(crate) fn get<T: Send + Sync + 'static>(&self, key: &ServiceKey) -> Option<Arc<T>> {
        self.map
            .get(key)
            .cloned()
            .and_then(|untyped| untyped.downcast().ok())
    }

    pub(crate) fn insert(&mut self, key: ServiceKey, instance: Arc<dyn Any + Send + Sync>) {
        self.map.insert(key, instance);
    }

    pub(crate) fn remove(&mut self, key: &ServiceKey) {
        self.map.remove(key);
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::CachePartition;
    use crate::lookup::ServiceKey;

    #[test]
    fn test_insert_get_remove() {
        let mut cache = CachePartition::default();
        let key = ServiceKey::of::<u32>(None);

        assert!(cache.get::<u32>(&key).is_none());

        cache.insert(key, Arc::new(7u32));
        assert_eq!(*cache.get::<u32>(&key).unwrap(), 7);

        cache.remove(&key);
        assert!(cache.get::<u32>(&key).is_none());
    }

    #[test]
    fn test_get_wrong_type_is_none() {
        let mut cache = CachePartition::default();
        let key = ServiceKey::of::<u32>(None);
        cache.insert(key, Arc::new(7u32));

        assert!(cache.get::<i64>(&key).is_none());
    }
}
