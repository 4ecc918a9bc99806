use alloc::boxed::Box;
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
};
use tracing::debug;

use crate::{
    context::ResolveContext,
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind},
    member::MemberInject,
};

/// Constructor of a service. Implemented for closures taking dependency
/// resolvers, so `|Inject(db): Inject<Database>| Ok(Repository::new(db))`
/// is an instantiator for `Repository`.
pub trait Instantiator<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + 'static,
            Response: 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            #[inline]
            #[allow(non_snake_case)]
            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

/// Instantiator that hands out clones of an existing value. Used by
/// [`RegistryBuilder::provide_instance`](crate::RegistryBuilder::provide_instance).
#[must_use]
pub fn instance<T: Clone + 'static>(value: T) -> impl Instantiator<(), Provides = T, Error = InstantiateErrorKind> {
    move || Ok(value.clone())
}

pub(crate) type InstantiateError = InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>;

pub(crate) trait CloneInstantiate: Send + Sync {
    fn call(&mut self, cx: &ResolveContext) -> Result<Box<dyn Any + Send + Sync>, InstantiateError>;

    fn clone_box(&self) -> Box<dyn CloneInstantiate>;
}

impl<F> CloneInstantiate for F
where
    F: FnMut(&ResolveContext) -> Result<Box<dyn Any + Send + Sync>, InstantiateError>
        + Clone
        + Send
        + Sync
        + 'static,
{
    fn call(&mut self, cx: &ResolveContext) -> Result<Box<dyn Any + Send + Sync>, InstantiateError> {
        self(cx)
    }

    fn clone_box(&self) -> Box<dyn CloneInstantiate> {
        Box::new(self.clone())
    }
}

/// Type-erased [`Instantiator`] stored in a registration: resolves its
/// dependencies from a [`ResolveContext`] and yields the built instance as
/// [`Box<dyn Any>`].
pub(crate) struct BoxedCloneInstantiator(Box<dyn CloneInstantiate>);

impl BoxedCloneInstantiator {
    #[must_use]
    pub(crate) fn new<F>(instantiate: F) -> Self
    where
        F: FnMut(&ResolveContext) -> Result<Box<dyn Any + Send + Sync>, InstantiateError>
            + Clone
            + Send
            + Sync
            + 'static,
    {
        Self(Box::new(instantiate))
    }

    pub(crate) fn call(&mut self, cx: &ResolveContext) -> Result<Box<dyn Any + Send + Sync>, InstantiateError> {
        self.0.call(cx)
    }
}

impl Clone for BoxedCloneInstantiator {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl Debug for BoxedCloneInstantiator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedCloneInstantiator").finish_non_exhaustive()
    }
}

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    BoxedCloneInstantiator::new(move |cx: &ResolveContext| {
        let dependencies = Deps::resolve(cx).map_err(InstantiatorErrorKind::Deps)?;
        let instance = instantiator
            .clone()
            .instantiate(dependencies)
            .map_err(InstantiatorErrorKind::Factory)?;

        debug!("Instantiated");

        Ok(Box::new(instance) as _)
    })
}

/// Like [`boxed_instantiator`], but runs the instance's
/// [`MemberInject::inject_members`] before handing it out.
#[must_use]
pub(crate) fn boxed_injecting_instantiator<Inst, Deps>(instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator<Deps, Error = InstantiateErrorKind> + Send + Sync,
    Inst::Provides: MemberInject + Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    BoxedCloneInstantiator::new(move |cx: &ResolveContext| {
        let dependencies = Deps::resolve(cx).map_err(InstantiatorErrorKind::Deps)?;
        let mut instance = instantiator
            .clone()
            .instantiate(dependencies)
            .map_err(InstantiatorErrorKind::Factory)?;
        instance
            .inject_members(cx)
            .map_err(InstantiatorErrorKind::Deps)?;

        debug!("Instantiated with members");

        Ok(Box::new(instance) as _)
    })
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{instance, Instantiator as _};

    #[derive(Clone, PartialEq, Debug)]
    struct Config {
        workers: usize,
    }

    #[test]
    fn test_instance_hands_out_clones() {
        let mut instantiator = instance(Config { workers: 4 });
        let first = instantiator.instantiate(()).unwrap();
        let second = instantiator.instantiate(()).unwrap();
        assert_eq!(first, second);
    }
}
