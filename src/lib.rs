#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod dependency_resolver;
pub(crate) mod disposal;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod generic;
pub(crate) mod graph;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod lifetime;
pub(crate) mod lookup;
pub(crate) mod member;
pub(crate) mod registry;
pub(crate) mod validation;

pub mod metadata;

pub use any::TypeInfo;
pub use container::Container;
pub use context::ResolveContext;
pub use dependency_resolver::DependencyResolver;
pub use errors::{BuildErrorKind, DisposalError, InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind};
pub use finalizer::Finalizer;
pub use generic::OpenGeneric;
pub use inject::{Deferred, Inject};
pub use instantiator::{instance, Instantiator};
pub use lifetime::Lifetime;
pub use member::MemberInject;
pub use metadata::TypeMetadata;
pub use registry::RegistryBuilder;
pub use validation::{ValidationMode, Violation, ViolationLevel};
