use alloc::vec::Vec;

use crate::{any::TypeInfo, context::ResolveContext, errors::ResolveErrorKind};

/// A set of dependencies an instantiator takes, resolved as one unit.
///
/// Implemented for [`Inject`](crate::Inject), [`Deferred`](crate::Deferred)
/// and tuples of resolvers up to arity 12, so a plain closure over those
/// types is a complete constructor declaration.
pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    fn resolve(cx: &ResolveContext) -> Result<Self, Self::Error>;

    /// Appends the dependency edges this resolver introduces, for metadata
    /// publication and graph analysis.
    fn collect_dependencies(dst: &mut Vec<TypeInfo>);
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(cx: &ResolveContext) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(cx).map_err(Into::into)?,)*))
            }

            #[inline]
            #[allow(unused_variables)]
            fn collect_dependencies(dst: &mut Vec<TypeInfo>) {
                $( $ty::collect_dependencies(dst); )*
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
