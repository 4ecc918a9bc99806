use alloc::{sync::Arc, vec::Vec};
use core::any::Any;
use tracing::{debug, error};

use crate::{
    any::TypeInfo,
    errors::DisposalError,
    finalizer::BoxedCloneFinalizer,
    lifetime::Lifetime,
    lookup::ServiceKey,
};

pub(crate) struct DisposalRecord {
    key: ServiceKey,
    type_info: TypeInfo,
    lifetime: Lifetime,
    seq: u64,
    instance: Arc<dyn Any + Send + Sync>,
    finalizer: BoxedCloneFinalizer,
}

/// Records instances with finalizers in creation order and runs the
/// finalizers in reverse on disposal, so a service is always finalized
/// before the dependencies it was built from.
#[derive(Default)]
pub(crate) struct DisposalTracker {
    records: Vec<DisposalRecord>,
    errors: Vec<DisposalError>,
    next_seq: u64,
    disposed: bool,
}

impl DisposalTracker {
    pub(crate) fn track(
        &mut self,
        key: ServiceKey,
        type_info: TypeInfo,
        lifetime: Lifetime,
        instance: Arc<dyn Any + Send + Sync>,
        finalizer: BoxedCloneFinalizer,
    ) {
        let identity = Arc::as_ptr(&instance) as *const () as usize;
        if self
            .records
            .iter()
            .any(|record| Arc::as_ptr(&record.instance) as *const () as usize == identity)
        {
            return;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        // A record arriving after a sweep re-arms the tracker, so instances
        // created after close() are still released by a later sweep or drop.
        self.disposed = false;
        debug!(service = type_info.name, seq, "Tracked for disposal");
        self.records.push(DisposalRecord {
            key,
            type_info,
            lifetime,
            seq,
            instance,
            finalizer,
        });
    }

    /// Finalizes every tracked instance, newest first. Repeated calls are
    /// no-ops; failures are collected rather than aborting the sweep.
    pub(crate) fn dispose_all(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        while let Some(record) = self.records.pop() {
            self.finalize(record);
        }
    }

    /// Finalizes only instances with `lifetime`, newest first, keeping the
    /// rest tracked. Returns the cache keys of the disposed instances.
    pub(crate) fn dispose_by_lifetime(&mut self, lifetime: Lifetime) -> Vec<ServiceKey> {
        let mut kept = Vec::with_capacity(self.records.len());
        let mut disposed_keys = Vec::new();

        while let Some(record) = self.records.pop() {
            if record.lifetime == lifetime {
                disposed_keys.push(record.key);
                self.finalize(record);
            } else {
                kept.push(record);
            }
        }
        kept.reverse();
        self.records = kept;

        disposed_keys
    }

    fn finalize(&mut self, mut record: DisposalRecord) {
        debug!(service = record.type_info.name, seq = record.seq, "Finalizing");
        if let Err(source) = record.finalizer.finalize(record.instance) {
            error!(
                service = record.type_info.name,
                "Finalizer failed: {source}"
            );
            self.errors.push(DisposalError {
                type_info: record.type_info,
                lifetime: record.lifetime,
                source,
            });
        }
    }

    #[must_use]
    pub(crate) fn take_errors(&mut self) -> Vec<DisposalError> {
        core::mem::take(&mut self.errors)
    }
}
