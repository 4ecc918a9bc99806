use alloc::{boxed::Box, fmt};
use core::fmt::{Display, Formatter};

use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum BuildErrorKind {
    /// The registration set contains a construction-time cycle.
    /// The path is a closed walk: the first and last entries name the same type.
    CyclicDependency { cycle: Box<[TypeInfo]> },
    /// A finalizer was added for a transient registration, which is never
    /// cached and therefore has no lifetime to finalize.
    TransientFinalizer { service: TypeInfo },
}

impl Display for BuildErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BuildErrorKind::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: ")?;
                let mut first = true;
                for type_info in cycle {
                    if !first {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{}", type_info.short_name())?;
                    first = false;
                }
                Ok(())
            }
            BuildErrorKind::TransientFinalizer { service } => {
                write!(f, "Finalizer added for transient registration {}", service.name)
            }
        }
    }
}
