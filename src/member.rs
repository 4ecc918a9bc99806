use alloc::vec::Vec;

use crate::{any::TypeInfo, context::ResolveContext, errors::ResolveErrorKind};

/// Post-construction injection for services that take some dependencies
/// through setters instead of their constructor.
///
/// Registered with
/// [`RegistryBuilder::provide_with_members`](crate::RegistryBuilder::provide_with_members);
/// the container calls [`inject_members`](Self::inject_members) after the
/// instantiator returns and before the instance is cached or handed out.
pub trait MemberInject: 'static {
    fn inject_members(&mut self, cx: &ResolveContext) -> Result<(), ResolveErrorKind>;

    /// The types [`inject_members`](Self::inject_members) resolves. These
    /// are graph edges like constructor dependencies, so they take part in
    /// cycle detection and captivity validation.
    fn member_dependencies(dst: &mut Vec<TypeInfo>) {
        let _ = dst;
    }
}
