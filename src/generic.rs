use alloc::boxed::Box;

use crate::{
    context::ResolveContext,
    errors::{InstantiateErrorKind, InstantiatorErrorKind},
    instantiator::BoxedCloneInstantiator,
};

/// A family of services parameterized over one type argument, registered
/// once and closed per argument on first request.
///
/// ```
/// use std::sync::Arc;
/// use canister::{OpenGeneric, InstantiateErrorKind, ResolveContext};
///
/// struct Database;
/// struct Repository<T> { db: Arc<Database>, _marker: std::marker::PhantomData<T> }
///
/// struct RepositoryFamily;
///
/// impl OpenGeneric for RepositoryFamily {
///     type Closed<A: Send + Sync + 'static> = Repository<A>;
///
///     fn close<A: Send + Sync + 'static>(
///         cx: &ResolveContext,
///     ) -> Result<Self::Closed<A>, InstantiateErrorKind> {
///         Ok(Repository { db: cx.resolve(None).map_err(anyhow::Error::from)?, _marker: std::marker::PhantomData })
///     }
/// }
/// ```
pub trait OpenGeneric: 'static {
    type Closed<A: Send + Sync + 'static>: Send + Sync + 'static;

    fn close<A: Send + Sync + 'static>(cx: &ResolveContext) -> Result<Self::Closed<A>, InstantiateErrorKind>;
}

/// Builds the erased instantiator for one closing of `F` at argument `A`.
#[must_use]
pub(crate) fn closed_instantiator<F, A>() -> BoxedCloneInstantiator
where
    F: OpenGeneric,
    A: Send + Sync + 'static,
{
    BoxedCloneInstantiator::new(move |cx: &ResolveContext| {
        let instance = F::close::<A>(cx).map_err(InstantiatorErrorKind::Factory)?;
        Ok(Box::new(instance) as _)
    })
}

