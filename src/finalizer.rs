use alloc::{boxed::Box, sync::Arc};
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
};

/// Cleanup hook run when the instance it was attached to is disposed.
pub trait Finalizer<Dep>: Clone + 'static {
    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error>;
}

impl<F, Dep> Finalizer<Dep> for F
where
    F: FnMut(Arc<Dep>) -> Result<(), anyhow::Error> + Clone + 'static,
{
    #[inline]
    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error> {
        self(dependency)
    }
}

pub(crate) trait CloneFinalize: Send + Sync {
    fn finalize(&mut self, dependency: Arc<dyn Any + Send + Sync>) -> Result<(), anyhow::Error>;

    fn clone_box(&self) -> Box<dyn CloneFinalize>;
}

impl<F> CloneFinalize for F
where
    F: FnMut(Arc<dyn Any + Send + Sync>) -> Result<(), anyhow::Error> + Clone + Send + Sync + 'static,
{
    fn finalize(&mut self, dependency: Arc<dyn Any + Send + Sync>) -> Result<(), anyhow::Error> {
        self(dependency)
    }

    fn clone_box(&self) -> Box<dyn CloneFinalize> {
        Box::new(self.clone())
    }
}

/// Type-erased [`Finalizer`] stored alongside a registration.
pub(crate) struct BoxedCloneFinalizer(Box<dyn CloneFinalize>);

impl BoxedCloneFinalizer {
    #[must_use]
    pub(crate) fn new<F>(finalizer: F) -> Self
    where
        F: FnMut(Arc<dyn Any + Send + Sync>) -> Result<(), anyhow::Error> + Clone + Send + Sync + 'static,
    {
        Self(Box::new(finalizer))
    }

    pub(crate) fn finalize(&mut self, dependency: Arc<dyn Any + Send + Sync>) -> Result<(), anyhow::Error> {
        self.0.finalize(dependency)
    }
}

impl Clone for BoxedCloneFinalizer {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl Debug for BoxedCloneFinalizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedCloneFinalizer").finish_non_exhaustive()
    }
}

/// Erases a typed [`Finalizer`] into the [`Arc<dyn Any>`] form the disposal
/// tracker works with.
#[must_use]
pub(crate) fn boxed_finalizer<Dep, F>(mut finalizer: F) -> BoxedCloneFinalizer
where
    Dep: Send + Sync + 'static,
    F: Finalizer<Dep> + Send + Sync,
{
    BoxedCloneFinalizer::new(move |dependency: Arc<dyn Any + Send + Sync>| {
        // The tracker only hands back the instance stored for this
        // registration, so the downcast cannot fail.
        let dependency = dependency
            .downcast::<Dep>()
            .expect("Failed to downcast finalized dependency");
        finalizer.finalize(dependency)
    })
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{string::ToString, sync::Arc};
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::boxed_finalizer;

    struct Connection;

    #[test]
    fn test_boxed_finalizer_calls_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut finalizer = boxed_finalizer(move |_: Arc<Connection>| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        finalizer.finalize(Arc::new(Connection)).unwrap();
        let mut cloned = finalizer.clone();
        cloned.finalize(Arc::new(Connection)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_boxed_finalizer_propagates_error() {
        let mut finalizer =
            boxed_finalizer(|_: Arc<Connection>| Err(anyhow::anyhow!("socket already closed")));
        let err = finalizer.finalize(Arc::new(Connection)).unwrap_err();
        assert_eq!(err.to_string(), "socket already closed");
    }
}
