use alloc::boxed::Box;
use core::any::TypeId;

use super::{instantiate::InstantiateErrorKind, instantiator::InstantiatorErrorKind};
use crate::{any::TypeInfo, lifetime::Lifetime};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Registration not found for service {} (key: {name:?})", service.name)]
    NoRegistration { service: TypeInfo, name: Option<&'static str> },
    #[error("Incorrect instantiator provides type. Expected: {expected:?}, actual: {actual:?}")]
    IncorrectType { expected: TypeInfo, actual: TypeId },
    #[error(
        "Captive dependency: {} ({}) holds {} ({}), which cannot outlive its scope",
        consumer.name, consumer_lifetime.name(),
        dependency.name, dependency_lifetime.name(),
    )]
    CaptiveDependency {
        consumer: TypeInfo,
        consumer_lifetime: Lifetime,
        dependency: TypeInfo,
        dependency_lifetime: Lifetime,
    },
    /// A registration recursively required itself during construction.
    /// Registered constructor cycles are rejected at build time; this
    /// covers lazily closed generics, whose edges only appear at resolve
    /// time.
    #[error("Cyclic resolution detected for service {}", service.name)]
    CyclicResolution { service: TypeInfo },
    #[error(transparent)]
    Instantiator(InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>),
}
