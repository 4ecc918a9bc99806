use alloc::{sync::Arc, vec::Vec};
use core::marker::PhantomData;

use crate::{
    any::TypeInfo,
    container::Container,
    context::ResolveContext,
    dependency_resolver::DependencyResolver,
    errors::ResolveErrorKind,
};

/// Marker that makes an instantiator parameter a resolved dependency.
///
/// `Inject(db): Inject<Database>` resolves the default `Database`
/// registration before the instantiator runs.
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(cx: &ResolveContext) -> Result<Self, Self::Error> {
        cx.resolve(None).map(Self)
    }

    #[inline]
    fn collect_dependencies(dst: &mut Vec<TypeInfo>) {
        dst.push(TypeInfo::of::<Dep>());
    }
}

/// A dependency resolved on demand instead of at construction time.
///
/// Holds the consuming container rather than an instance, so it introduces
/// no edge in the dependency graph: two services may depend on each other
/// as long as one of them takes the other as `Deferred`. Resolutions made
/// through it are not attributed to the declaring consumer.
pub struct Deferred<Dep: ?Sized> {
    container: Container,
    _marker: PhantomData<fn() -> Dep>,
}

impl<Dep: Send + Sync + 'static> Deferred<Dep> {
    pub fn get(&self) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.container.get()
    }

    pub fn get_named(&self, name: &'static str) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.container.get_named(name)
    }
}

impl<Dep: Send + Sync + 'static> DependencyResolver for Deferred<Dep> {
    type Error = ResolveErrorKind;

    #[inline]
    fn resolve(cx: &ResolveContext) -> Result<Self, Self::Error> {
        Ok(Self {
            container: cx.container.clone(),
            _marker: PhantomData,
        })
    }

    #[inline]
    fn collect_dependencies(_dst: &mut Vec<TypeInfo>) {}
}
