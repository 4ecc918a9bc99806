use alloc::{sync::Arc, vec::Vec};

use crate::{
    any::TypeInfo,
    container::Container,
    errors::ResolveErrorKind,
    generic::OpenGeneric,
    lifetime::Lifetime,
    lookup::ServiceKey,
};

/// The registration on whose behalf a nested resolution runs. Used to
/// attribute captive-dependency violations to the right consumer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConsumerInfo {
    pub(crate) type_info: TypeInfo,
    pub(crate) lifetime: Lifetime,
}

/// Handed to instantiators and member injectors while the container builds
/// an instance. Nested resolutions go through [`ResolveContext::resolve`]
/// or [`ResolveContext::resolve_generic`] so the container can validate
/// the edge being traversed.
pub struct ResolveContext {
    pub(crate) container: Container,
    pub(crate) consumer: Option<ConsumerInfo>,
    /// Keys under construction on this call chain, outermost first.
    pub(crate) path: Vec<ServiceKey>,
}

impl ResolveContext {
    /// The container the current resolution runs in. Scoped dependencies
    /// resolved through it come from the same scope as the consumer.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn resolve<Dep: Send + Sync + 'static>(
        &self,
        name: Option<&'static str>,
    ) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.container
            .get_with_consumer(name, self.consumer.as_ref(), &self.path)
    }

    /// Resolves a closing of an open generic family. The traversed edge is
    /// attributed to the consumer and validated like any other.
    pub fn resolve_generic<F, A>(&self) -> Result<Arc<F::Closed<A>>, ResolveErrorKind>
    where
        F: OpenGeneric,
        A: Send + Sync + 'static,
    {
        self.container
            .get_generic_with_consumer::<F, A>(self.consumer.as_ref(), &self.path)
    }
}
